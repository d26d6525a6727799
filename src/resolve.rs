//! Resolution of citations, partial uids and links to a single sutta.
//!
//! Lookups narrow before they widen: an exact or partial uid match wins,
//! and only when nothing matches is the search widened to the whole
//! collection or the whole corpus, as the [`QuoteScope`] allows. When a
//! quote is given, the candidate containing it is preferred.

use std::{fmt, str::FromStr};

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    corpus::{Corpus, MultiRef, Sutta},
    error::Result,
    sutta_ref::{self, PtsRef},
    text_util,
    verse_ranges,
};

pub const SUTTA_URL_PREFIX: &str = "ssp://suttas/";

static TRAILING_NUMBERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9\.-]+$").unwrap());
static PTS_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"pts *").unwrap());
static PTS_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[a-z-]+ )?([ivx]+) (\d+)(?:\.\d+)?(?: *- *(?:([ivx]+) )?(\d+)(?:\.\d+)?)?$",
    )
    .unwrap()
});

/// A passage to find within a sutta, e.g. from a bookmark or a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuttaQuote {
    pub quote: String,
    pub selection_range: Option<String>,
}

impl SuttaQuote {
    pub fn new(quote: impl Into<String>) -> Self {
        Self {
            quote: quote.into(),
            selection_range: None,
        }
    }
}

/// How far to look for a quote when the uid itself doesn't match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QuoteScope {
    /// Only the requested sutta.
    #[default]
    Sutta,
    /// Any sutta in the same collection.
    Nikaya,
    /// The whole corpus.
    All,
}

impl QuoteScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sutta => "sutta",
            Self::Nikaya => "nikaya",
            Self::All => "all",
        }
    }
}

impl fmt::Display for QuoteScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "sutta" => Ok(Self::Sutta),
            "nikaya" => Ok(Self::Nikaya),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unknown quote scope '{other}', expected sutta, nikaya or all"
            )),
        }
    }
}

/// A parsed `ssp://suttas/<uid>?quote=..&sel=..&quote_scope=..` link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuttaUrl {
    pub uid: String,
    pub quote: Option<SuttaQuote>,
    pub scope: QuoteScope,
}

impl SuttaUrl {
    pub fn parse(url: &str) -> Option<Self> {
        let rest = url.strip_prefix(SUTTA_URL_PREFIX)?;
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));

        let mut quote = None;
        let mut selection_range = None;
        let mut scope = QuoteScope::Sutta;

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode_query_value(value);
            match key {
                "q" | "quote" if !value.is_empty() => quote = Some(value),
                "sel" | "selection_range" => selection_range = Some(value),
                "quote_scope" => {
                    if let Ok(s) = value.parse() {
                        scope = s;
                    }
                }
                _ => {}
            }
        }

        Some(Self {
            uid: decode_query_value(path.trim_matches('/')),
            quote: quote.map(|quote| SuttaQuote {
                quote,
                selection_range,
            }),
            scope,
        })
    }
}

fn decode_query_value(value: &str) -> String {
    let value = value.replace('+', " ");
    percent_decode_str(&value).decode_utf8_lossy().into_owned()
}

/// A uid naming one text: `ref/language/source`.
pub fn is_complete_uid(uid: &str) -> bool {
    let uid = uid.trim_matches('/');
    uid.contains('/') && uid.split('/').count() == 3
}

fn normalize_quote(quote: &str) -> String {
    let q = text_util::remove_punct(&quote.to_lowercase());
    text_util::consistent_nasal_m(&q).trim().to_string()
}

fn normalized_content(sutta: &Sutta) -> String {
    match (&sutta.content_plain, &sutta.content_html) {
        (Some(plain), _) if !plain.is_empty() => text_util::compact_plain_text(plain),
        (_, Some(html)) => text_util::compact_rich_text(html),
        _ => String::new(),
    }
}

/// The first sutta containing the quote, tolerating differences in case,
/// punctuation and spelling.
pub fn find_quote_in_suttas<'s>(suttas: &'s [Sutta], quote: &str) -> Option<&'s Sutta> {
    if quote.is_empty() || suttas.is_empty() {
        return None;
    }

    let quote = normalize_quote(quote);
    let pattern = text_util::expand_quote_to_pattern(&quote).ok();

    suttas.iter().find(|sutta| {
        let content = normalized_content(sutta);
        content.contains(&quote)
            || pattern.as_ref().is_some_and(|p| p.is_match(&content))
    })
}

/// Whether a comma-separated PTS reference list, e.g. `dn i 1-46` or
/// `an i 77.1 - i 80.1`, covers the given page.
pub fn pts_ref_list_contains(ref_text: &str, pts: &PtsRef) -> bool {
    ref_text.split(',').any(|entry| {
        let Some(caps) = PTS_ENTRY.captures(entry.trim()) else {
            return false;
        };
        let Some(start_vol) = sutta_ref::from_roman(&caps[1]) else {
            return false;
        };
        let Ok(start_page) = caps[2].parse::<u32>() else {
            return false;
        };
        let end_vol = caps
            .get(3)
            .and_then(|m| sutta_ref::from_roman(m.as_str()))
            .unwrap_or(start_vol);
        let end_page = caps
            .get(4)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(start_page);

        let target = (pts.volume, pts.page);
        (start_vol, start_page) <= target && target <= (end_vol, end_page)
    })
}

/// Whether one of the comma-separated entries of a stored reference list is
/// exactly `entry`.
fn ref_list_has_entry(ref_text: &str, entry: &str) -> bool {
    ref_text.split(',').any(|e| e.trim() == entry)
}

/// Sutta lookups against a corpus.
pub struct SuttaResolver<'c> {
    corpus: &'c Corpus,
}

impl<'c> SuttaResolver<'c> {
    pub fn new(corpus: &'c Corpus) -> Self {
        Self { corpus }
    }

    /// Pick the result: the candidate with the quote if there is one,
    /// otherwise the first.
    fn choose(candidates: Vec<Sutta>, quote: Option<&SuttaQuote>) -> Option<Sutta> {
        if let Some(q) = quote
            && let Some(found) = find_quote_in_suttas(&candidates, &q.quote)
        {
            return Some(found.clone());
        }
        candidates.into_iter().next()
    }

    /// Candidates outside the requested text, as far as the scope allows.
    fn widen(
        &self,
        uid_ref: &str,
        quote: Option<&SuttaQuote>,
        scope: QuoteScope,
    ) -> Result<Vec<Sutta>> {
        match scope {
            QuoteScope::Sutta => Ok(Vec::new()),
            QuoteScope::Nikaya => {
                let nikaya = TRAILING_NUMBERS.replace(uid_ref, "");
                if nikaya.is_empty() {
                    return Ok(Vec::new());
                }
                debug!(nikaya = %nikaya, "widening to collection");
                self.corpus.suttas_by_uid_prefix(&nikaya)
            }
            QuoteScope::All => match quote {
                Some(q) => {
                    debug!("widening to all suttas");
                    self.get_suttas_by_quote(&q.quote)
                }
                None => Ok(Vec::new()),
            },
        }
    }

    pub fn get_sutta_by_uid(
        &self,
        uid: &str,
        quote: Option<&SuttaQuote>,
        scope: QuoteScope,
    ) -> Result<Option<Sutta>> {
        info!(uid, quote = ?quote.map(|q| &q.quote), %scope, "get_sutta_by_uid");

        if uid.is_empty() {
            return match quote {
                Some(q) => Ok(self.get_suttas_by_quote(&q.quote)?.into_iter().next()),
                None => Ok(None),
            };
        }

        let uid = sutta_ref::normalize_sutta_uid(uid);

        if !is_complete_uid(&uid) {
            return self.get_sutta_by_partial_uid(&uid, quote, scope);
        }

        let uid = uid.trim_matches('/');
        let mut results = self.corpus.suttas_by_uid(uid)?;

        if results.is_empty() {
            let uid_ref = uid.split('/').next().unwrap_or(uid);
            results = self.widen(uid_ref, quote, scope)?;
        }

        Ok(Self::choose(results, quote))
    }

    /// Resolve a uid missing its language or source, e.g. `mn1` or
    /// `mn1/en`. Verse citations (`dhp182`) are mapped to their text first.
    pub fn get_sutta_by_partial_uid(
        &self,
        part_uid: &str,
        quote: Option<&SuttaQuote>,
        scope: QuoteScope,
    ) -> Result<Option<Sutta>> {
        info!(part_uid, "get_sutta_by_partial_uid");

        let part_uid = part_uid.trim_matches('/');
        let mut parts = part_uid.splitn(2, '/');
        let first = parts.next().unwrap_or_default();
        let rest = parts.next();

        let uid_ref =
            verse_ranges::verse_citation_to_uid(first).unwrap_or_else(|| first.to_string());

        let prefix = match rest {
            Some(rest) if !rest.is_empty() => format!("{uid_ref}/{rest}/"),
            _ => format!("{uid_ref}/"),
        };

        let mut results = self.corpus.suttas_by_uid_prefix(&prefix)?;

        if results.is_empty() {
            results = self.widen(&uid_ref, quote, scope)?;
        }

        Ok(Self::choose(results, quote))
    }

    /// Resolve a citation through the cross-reference table, e.g.
    /// `PTS D i 12` or `SN v 420`.
    pub fn get_sutta_by_ref(&self, text: &str) -> Result<Option<Sutta>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let normalized = sutta_ref::normalize_sutta_ref(text);
        let normalized = PTS_WORD.replace_all(&normalized, "");
        let normalized = normalized.trim();

        if let Some(pts) = sutta_ref::parse_pts_ref(text) {
            let refs: Vec<MultiRef> = self
                .corpus
                .multi_refs_by_collection(&pts.nikaya)?
                .into_iter()
                .filter(|r| pts_ref_list_contains(&r.ref_text, &pts))
                .collect();
            if let Some(sutta) = self.first_sutta_of_refs(&refs)? {
                return Ok(Some(sutta));
            }
        }

        // LIKE narrows the rows, entries must still match whole.
        let refs: Vec<MultiRef> = self
            .corpus
            .multi_refs_like(normalized)?
            .into_iter()
            .filter(|r| ref_list_has_entry(&r.ref_text, normalized))
            .collect();

        self.first_sutta_of_refs(&refs)
    }

    fn first_sutta_of_refs(&self, refs: &[MultiRef]) -> Result<Option<Sutta>> {
        for multi_ref in refs {
            if let Some(sutta) =
                self.corpus.suttas_for_multi_ref(multi_ref)?.into_iter().next()
            {
                return Ok(Some(sutta));
            }
        }
        Ok(None)
    }

    /// Resolve an `ssp://suttas/...` link. The path is tried as a uid, then
    /// as a citation.
    pub fn get_sutta_by_url(&self, url: &str) -> Result<Option<Sutta>> {
        let Some(parsed) = SuttaUrl::parse(url) else {
            return Ok(None);
        };

        if let Some(sutta) =
            self.get_sutta_by_uid(&parsed.uid, parsed.quote.as_ref(), parsed.scope)?
        {
            return Ok(Some(sutta));
        }

        self.get_sutta_by_ref(&parsed.uid)
    }

    /// Suttas containing the text: a plain substring match first, then an
    /// expanded pattern tolerating punctuation and spelling variants.
    pub fn get_suttas_by_quote(&self, text: &str) -> Result<Vec<Sutta>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let results = self.corpus.suttas_content_like(text)?;
        if !results.is_empty() {
            return Ok(results);
        }

        let quote = normalize_quote(text);
        if quote.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = text_util::expand_quote_to_pattern(&quote)?;

        Ok(self
            .corpus
            .all_suttas(None)?
            .into_iter()
            .filter(|s| pattern.is_match(&normalized_content(s)))
            .collect())
    }

    /// Resolve free-form input: a link, a book or PTS citation, or a
    /// (partial) uid.
    pub fn resolve_query(
        &self,
        text: &str,
        quote: Option<&SuttaQuote>,
        scope: QuoteScope,
    ) -> Result<Option<Sutta>> {
        let text = text.trim();

        if text.starts_with(SUTTA_URL_PREFIX) {
            return self.get_sutta_by_url(text);
        }

        if !text.contains('/')
            && sutta_ref::is_pts_sutta_ref(text)
            && !sutta_ref::is_book_sutta_ref(text)
        {
            return self.get_sutta_by_ref(text);
        }

        if !text.contains('/')
            && let Some(uid) = sutta_ref::book_ref_to_uid(text)
            && let Some(sutta) = self.get_sutta_by_uid(&uid, quote, scope)?
        {
            return Ok(Some(sutta));
        }

        if let Some(sutta) = self.get_sutta_by_uid(text, quote, scope)? {
            return Ok(Some(sutta));
        }

        self.get_sutta_by_ref(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{
        SchemaName,
        tests::{sutta, test_corpus},
    };

    fn uid_of(s: Option<Sutta>) -> Option<String> {
        s.map(|s| s.uid)
    }

    #[test]
    fn complete_uids() {
        assert!(is_complete_uid("mn1/pli/ms"));
        assert!(is_complete_uid("/mn1/pli/ms/"));
        assert!(!is_complete_uid("mn1"));
        assert!(!is_complete_uid("mn1/pli"));
    }

    #[test]
    fn quote_scope_parsing() {
        assert_eq!("nikaya".parse::<QuoteScope>(), Ok(QuoteScope::Nikaya));
        assert_eq!("all".parse::<QuoteScope>(), Ok(QuoteScope::All));
        assert!("everything".parse::<QuoteScope>().is_err());
        assert_eq!(QuoteScope::default(), QuoteScope::Sutta);
    }

    #[test]
    fn exact_uid() {
        let corpus = test_corpus();
        let r = SuttaResolver::new(&corpus);
        let s = r.get_sutta_by_uid("mn1/en/sujato", None, QuoteScope::Sutta).unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("mn1/en/sujato"));
    }

    #[test]
    fn partial_uid_takes_first() {
        let corpus = test_corpus();
        let r = SuttaResolver::new(&corpus);
        let s = r.get_sutta_by_uid("MN 1", None, QuoteScope::Sutta).unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("mn1/pli/ms"));

        let s = r.get_sutta_by_uid("mn1/en", None, QuoteScope::Sutta).unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("mn1/en/sujato"));
    }

    #[test]
    fn partial_uid_prefers_quote() {
        let corpus = test_corpus();
        let r = SuttaResolver::new(&corpus);
        let quote = SuttaQuote::new("the Blessed One was staying");
        let s = r.get_sutta_by_uid("mn1", Some(&quote), QuoteScope::Sutta).unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("mn1/en/thanissaro"));
    }

    #[test]
    fn quote_matching_ignores_punctuation_and_nasal_spelling() {
        let corpus = test_corpus();
        let r = SuttaResolver::new(&corpus);
        let quote = SuttaQuote::new("evaṃ me sutaṃ ekaṃ samayaṃ");
        let s = r.get_sutta_by_uid("mn1", Some(&quote), QuoteScope::Sutta).unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("mn1/pli/ms"));
    }

    #[test]
    fn verse_citation_maps_to_chapter() {
        let corpus = test_corpus();
        let r = SuttaResolver::new(&corpus);
        let s = r.get_sutta_by_uid("dhp182", None, QuoteScope::Sutta).unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("dhp179-196/en/sujato"));
    }

    #[test]
    fn missing_sutta_with_sutta_scope() {
        let corpus = test_corpus();
        let r = SuttaResolver::new(&corpus);
        let quote = SuttaQuote::new("noble truth of suffering");
        let s = r.get_sutta_by_uid("sn56.99", Some(&quote), QuoteScope::Sutta).unwrap();
        assert!(s.is_none());
    }

    #[test]
    fn nikaya_scope_widens_to_collection() {
        let corpus = test_corpus();
        let r = SuttaResolver::new(&corpus);
        let quote = SuttaQuote::new("noble truth of suffering");
        let s = r
            .get_sutta_by_uid("sn56.99", Some(&quote), QuoteScope::Nikaya)
            .unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("sn56.12/en/sujato"));
    }

    #[test]
    fn all_scope_searches_corpus() {
        let corpus = test_corpus();
        let r = SuttaResolver::new(&corpus);
        let quote = SuttaQuote::new("Rare is birth as a human being");
        let s = r.get_sutta_by_uid("an1.1", Some(&quote), QuoteScope::All).unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("dhp179-196/en/sujato"));

        let s = r.get_sutta_by_uid("an1.1", None, QuoteScope::All).unwrap();
        assert!(s.is_none());
    }

    #[test]
    fn partial_uid_resolution_is_final() {
        let corpus = test_corpus();
        let r = SuttaResolver::new(&corpus);
        let quote = SuttaQuote::new("Rare is birth as a human being");

        for (uid, scope) in [
            ("an1.1", QuoteScope::All),
            ("sn56.99/en", QuoteScope::Nikaya),
            ("mn1/en", QuoteScope::Sutta),
        ] {
            let full = r.get_sutta_by_uid(uid, Some(&quote), scope).unwrap();
            let partial = r.get_sutta_by_partial_uid(uid, Some(&quote), scope).unwrap();
            assert_eq!(uid_of(full), uid_of(partial), "{uid}");
        }
    }

    #[test]
    fn empty_uid_uses_quote() {
        let corpus = test_corpus();
        let r = SuttaResolver::new(&corpus);
        let quote = SuttaQuote::new("two extremes");
        let s = r.get_sutta_by_uid("", Some(&quote), QuoteScope::Sutta).unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("sn56.11/en/sujato"));
        assert!(r.get_sutta_by_uid("", None, QuoteScope::Sutta).unwrap().is_none());
    }

    #[test]
    fn quote_search_falls_back_to_pattern() {
        let corpus = test_corpus();
        let r = SuttaResolver::new(&corpus);
        let hits = r.get_suttas_by_quote("Evam me sutam, ekam samayam").unwrap();
        assert!(hits.is_empty());

        let hits = r.get_suttas_by_quote("Evaṃ me sutaṃ, ekaṃ samayaṃ").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].uid, "mn1/pli/ms");
    }

    #[test]
    fn ref_through_multi_refs() {
        let corpus = test_corpus();
        let r = SuttaResolver::new(&corpus);
        let s = r.get_sutta_by_ref("PTS SN v 420").unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("sn56.11/en/sujato"));
    }

    #[test]
    fn pts_page_within_range() {
        let corpus = test_corpus();
        let r = SuttaResolver::new(&corpus);
        let s = r.get_sutta_by_ref("M i 4").unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("mn1/pli/ms"));
        assert!(r.get_sutta_by_ref("M i 7").unwrap().is_none());
    }

    #[test]
    fn pts_page_picks_containing_range() {
        let mut corpus = test_corpus();
        let w = corpus.writer(SchemaName::AppData).unwrap();
        for uid in ["dn1/en/sujato", "dn4/en/sujato"] {
            w.insert_sutta(&sutta(uid, "Dīgha", "So I have heard.")).unwrap();
        }
        for (ref_text, uid) in [("dn i 1-46", "dn1"), ("dn i 127-149", "dn4")] {
            w.insert_multi_ref(&MultiRef {
                collection: "dn".into(),
                ref_type: "pts".into(),
                ref_text: ref_text.into(),
                sutta_uid: Some(uid.into()),
                ..Default::default()
            })
            .unwrap();
        }
        w.commit().unwrap();

        let r = SuttaResolver::new(&corpus);
        let s = r.get_sutta_by_ref("D i 12").unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("dn1/en/sujato"));
        let s = r.get_sutta_by_ref("PTS D i 130").unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("dn4/en/sujato"));
    }

    #[test]
    fn ref_entries_match_whole() {
        let corpus = test_corpus();
        let r = SuttaResolver::new(&corpus);
        assert!(r.get_sutta_by_ref("SN v 42").unwrap().is_none());
        assert!(ref_list_has_entry("sn v 420, sn v 421", "sn v 421"));
        assert!(!ref_list_has_entry("sn v 420, sn v 421", "sn v 42"));
    }

    #[test]
    fn pts_ranges() {
        let pts = PtsRef {
            nikaya: "an".into(),
            volume: 1,
            page: 79,
        };
        assert!(pts_ref_list_contains("an i 77.1 - i 80.1", &pts));
        assert!(pts_ref_list_contains("an i 60, an i 79", &pts));
        assert!(!pts_ref_list_contains("an ii 77-80", &pts));
        assert!(!pts_ref_list_contains("garbage", &pts));
    }

    #[test]
    fn url_parsing() {
        let url = SuttaUrl::parse(
            "ssp://suttas/mn44/en/sujato?quote=the%20noble+truth&sel=1-2&quote_scope=nikaya",
        )
        .unwrap();
        assert_eq!(url.uid, "mn44/en/sujato");
        assert_eq!(url.scope, QuoteScope::Nikaya);
        let quote = url.quote.unwrap();
        assert_eq!(quote.quote, "the noble truth");
        assert_eq!(quote.selection_range.as_deref(), Some("1-2"));

        let url = SuttaUrl::parse("ssp://suttas/mn44").unwrap();
        assert_eq!(url.quote, None);
        assert_eq!(url.scope, QuoteScope::Sutta);

        assert!(SuttaUrl::parse("https://suttacentral.net/mn44").is_none());
    }

    #[test]
    fn url_resolution() {
        let corpus = test_corpus();
        let r = SuttaResolver::new(&corpus);
        let s = r
            .get_sutta_by_url("ssp://suttas/sn56?q=Such%20was%20the%20vision&quote_scope=nikaya")
            .unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("sn56.12/en/sujato"));
    }

    #[test]
    fn resolve_free_form_input() {
        let corpus = test_corpus();
        let r = SuttaResolver::new(&corpus);

        let s = r.resolve_query("SN 56.11", None, QuoteScope::Sutta).unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("sn56.11/en/sujato"));

        let s = r.resolve_query("Dhp 182", None, QuoteScope::Sutta).unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("dhp179-196/en/sujato"));

        let s = r.resolve_query("M. I. 3.", None, QuoteScope::Sutta).unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("mn1/pli/ms"));

        let s = r.resolve_query("mn2/en/sujato", None, QuoteScope::Sutta).unwrap();
        assert_eq!(uid_of(s).as_deref(), Some("mn2/en/sujato"));

        let s = r.resolve_query("MN 99", None, QuoteScope::Sutta).unwrap();
        assert!(s.is_none());
    }
}
