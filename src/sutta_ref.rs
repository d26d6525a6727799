//! Parsing of sutta citations into canonical uids.
//!
//! Two citation styles are recognized. Book citations name the collection
//! and the sutta or verse number (`MN 1`, `AN 4.10`, `Sn 4:2`, `Dhp 182`).
//! PTS citations name the collection, a volume in roman numerals and a page
//! of the Pali Text Society edition (`Vin.ii.40`, `D iii 264`).

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::warn;

use crate::verse_ranges;

static BOOK_SUTTA_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(DN|MN|SN|AN|Pv|Vv|Vism|iti|kp|khp|snp|th|thag|thig|ud|uda|dhp)[ \.]*(\d[\d\.:]*)\b",
    )
    .unwrap()
});

static PTS_VOL_SUTTA_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(D|DN|M|MN|S|SN|A|AN|Pv|Vv|Vin|Vism|iti|kp|khp|snp|th|thag|thig|ud|uda|dhp)[ \.]+([ivx]+)[ \.]+(\d[\d\.]*)\b",
    )
    .unwrap()
});

static UD_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bud *(\d)").unwrap());
static KHP_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bkhp *(\d)").unwrap());
static TH_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bth *(\d)").unwrap());
static ROMAN_VOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\. ]*\b([ivx]+)\b[\. ]*").unwrap());
static SINGLE_LETTER_NIKAYA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([dmsa]) ").unwrap());
static SUFFIX_A: Lazy<Regex> = Lazy::new(|| Regex::new(r"_a$").unwrap());
static SUFFIX_PARALLEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_[as]n.*$").unwrap());
static ATTHAKATHA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z-]+)([0-9-]+)-a").unwrap());
static GROUP_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z-]+)([0-9-]+)").unwrap());
static ANY_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]").unwrap());

/// A sutta or a numbered range of suttas within a group, as encoded in a
/// uid. `sn30.7-16` is the range 7..=16 of group `sn30`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuttaRange {
    pub group: String,
    pub start: Option<u32>,
    pub end: Option<u32>,
}

impl SuttaRange {
    pub fn contains(&self, num: u32) -> bool {
        match (self.start, self.end) {
            (Some(a), Some(b)) => (a..=b).contains(&num),
            _ => false,
        }
    }
}

/// A page reference into the PTS edition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtsRef {
    /// Lowercase collection abbreviation, with single letters expanded
    /// (`d` → `dn`).
    pub nikaya: String,
    pub volume: u32,
    pub page: u32,
}

impl PtsRef {
    /// The normalized textual form, as stored in multi-reference rows:
    /// `dn ii 40`.
    pub fn to_ref_string(&self) -> String {
        format!("{} {} {}", self.nikaya, to_roman(self.volume), self.page)
    }
}

/// Normalize a citation for comparison against stored references.
pub fn normalize_sutta_ref(text: &str) -> String {
    let s = text.to_lowercase();
    let s = UD_NUM.replace_all(&s, "uda $1");
    let s = KHP_NUM.replace_all(&s, "kp $1");
    let s = TH_NUM.replace_all(&s, "thag $1");
    let s = ROMAN_VOL.replace_all(&s, " $1 ");
    let s = SINGLE_LETTER_NIKAYA.replace(&s, |caps: &Captures| {
        format!("{}n ", &caps[1])
    });
    s.trim().to_string()
}

/// Like [`normalize_sutta_ref`], but without spaces, as used in uids.
pub fn normalize_sutta_uid(uid: &str) -> String {
    normalize_sutta_ref(uid).replace(' ', "")
}

/// Determine the group and numeric range a uid or reference covers.
///
/// Returns `None` (with a warning) when the numeric part can't be parsed.
pub fn sutta_range_from_ref(text: &str) -> Option<SuttaRange> {
    let mut s = text.split('/').next().unwrap_or(text).replace("--", "-");

    // sn22.57_a → sn22.57, an2.19_an3.29 → an2.19
    s = SUFFIX_A.replace(&s, "").into_owned();
    s = SUFFIX_PARALLEL.replace(&s, "").into_owned();

    if s == "snp1.2(33-34)" {
        s = "snp1.2".to_string();
    }

    // Commentaries: dn2-a → dn-a2
    if s.ends_with("-a") {
        s = ATTHAKATHA.replace(&s, "${1}-a${2}").into_owned();
    }

    if !ANY_DIGIT.is_match(&s) {
        return Some(SuttaRange {
            group: s,
            start: None,
            end: None,
        });
    }

    let (group, numeric) = if let Some((group, numeric)) = s.split_once('.') {
        // sn30.7-16.x keeps only the first numeric part
        let numeric = numeric.split('.').next().unwrap_or(numeric);
        (group.to_string(), numeric.to_string())
    } else {
        let Some(caps) = GROUP_NUMERIC.captures(&s) else {
            warn!(reference = %text, "cannot determine sutta range");
            return None;
        };
        (caps[1].to_string(), caps[2].to_string())
    };

    let parsed = match numeric.split_once('-') {
        Some((a, b)) => a.parse::<u32>().ok().zip(b.parse::<u32>().ok()),
        None => numeric.parse::<u32>().ok().map(|n| (n, n)),
    };

    match parsed {
        Some((start, end)) => Some(SuttaRange {
            group,
            start: Some(start),
            end: Some(end),
        }),
        None => {
            warn!(reference = %text, "cannot determine sutta range");
            None
        }
    }
}

/// Matches of `re` that are not part of a URL path, i.e. not preceded by
/// a `/`.
fn matches_outside_paths<'t>(
    re: &'t Regex,
    text: &'t str,
) -> impl Iterator<Item = Captures<'t>> + 't {
    re.captures_iter(text).filter(move |caps| {
        caps.get(0)
            .is_some_and(|m| !text[..m.start()].ends_with('/'))
    })
}

pub fn is_book_sutta_ref(text: &str) -> bool {
    matches_outside_paths(&BOOK_SUTTA_REF, text).next().is_some()
}

pub fn is_pts_sutta_ref(text: &str) -> bool {
    matches_outside_paths(&PTS_VOL_SUTTA_REF, text).next().is_some()
}

/// The canonical uid of a book citation's collection abbreviation.
fn book_abbrev(abbrev: &str) -> String {
    match abbrev.to_lowercase().as_str() {
        "th" => "thag".to_string(),
        "ud" => "uda".to_string(),
        "khp" => "kp".to_string(),
        other => other.to_string(),
    }
}

fn book_caps_to_uid(caps: &Captures) -> String {
    let nikaya = book_abbrev(&caps[1]);
    let number = caps[2].trim_end_matches(['.', ':']).replace(':', ".");
    let uid = format!("{nikaya}{number}");

    verse_ranges::verse_citation_to_uid(&uid).unwrap_or(uid)
}

/// Convert the first book citation in `text` to a sutta uid.
///
/// Verse-numbered collections are mapped to the text containing the verse:
/// `Dhp 182` → `dhp179-196`, `Thag 1207` → `thag20.1`.
pub fn book_ref_to_uid(text: &str) -> Option<String> {
    matches_outside_paths(&BOOK_SUTTA_REF, text)
        .next()
        .map(|caps| book_caps_to_uid(&caps))
}

/// Parse the first PTS citation in `text`.
pub fn parse_pts_ref(text: &str) -> Option<PtsRef> {
    let caps = matches_outside_paths(&PTS_VOL_SUTTA_REF, text).next()?;

    let nikaya = match caps[1].to_lowercase().as_str() {
        "d" => "dn".to_string(),
        "m" => "mn".to_string(),
        "s" => "sn".to_string(),
        "a" => "an".to_string(),
        other => book_abbrev(other),
    };

    let volume = from_roman(&caps[2])?;
    let page = caps[3]
        .split('.')
        .next()
        .and_then(|p| p.parse::<u32>().ok())?;

    Some(PtsRef {
        nikaya,
        volume,
        page,
    })
}

/// Replace book citations in a search query with `uid:` field queries, so
/// that `SN 56.11` finds the sutta itself.
pub fn query_text_to_uid_field_query(text: &str) -> String {
    if text.contains("uid:") {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len());
    let mut last = 0;

    for caps in matches_outside_paths(&BOOK_SUTTA_REF, text) {
        let Some(m) = caps.get(0) else { continue };
        result.push_str(&text[last..m.start()]);
        result.push_str("uid:");
        result.push_str(&book_caps_to_uid(&caps));
        last = m.end();
    }

    result.push_str(&text[last..]);
    result
}

pub fn from_roman(text: &str) -> Option<u32> {
    let mut total = 0u32;
    let mut prev = 0u32;

    for c in text.to_lowercase().chars().rev() {
        let v = match c {
            'i' => 1,
            'v' => 5,
            'x' => 10,
            'l' => 50,
            'c' => 100,
            _ => return None,
        };
        if v < prev {
            total = total.checked_sub(v)?;
        } else {
            total += v;
            prev = v;
        }
    }

    (total > 0).then_some(total)
}

pub fn to_roman(mut num: u32) -> String {
    const NUMERALS: &[(u32, &str)] = &[
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];

    let mut s = String::new();
    for &(value, numeral) in NUMERALS {
        while num >= value {
            s.push_str(numeral);
            num -= value;
        }
    }
    s
}
