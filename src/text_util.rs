//! Text normalization shared by indexing, querying and quote matching.
//!
//! Sutta sources disagree on punctuation, quote marks and the spelling of the
//! niggahīta, so content and queries both pass through the same functions
//! before they are compared.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters before a match kept in a snippet fragment.
pub const FRAGMENT_CHARS_BEFORE: usize = 20;

/// Characters after the fragment start kept in a snippet fragment.
pub const FRAGMENT_CHARS_AFTER: usize = 500;

static PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\.,;\?\!“”‘’…—\-'"\n\t]"#).unwrap());
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"  +").unwrap());
static REF_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<a class=.ref\b[^>]+>[^<]*</a>").unwrap());
static INLINE_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\w*)<(b|strong|i|em)(\s[^>]*)?>(\w*)").unwrap()
});
static INLINE_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w*)</*(b|strong|i|em)>(\w*)").unwrap());
static DOCTYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<!doctype html>").unwrap());
static HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<head(.*?)</head>").unwrap());
static STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<style(.*?)</style>").unwrap());
static SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<script(.*?)</script>").unwrap());
static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--(.*?)-->").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</*\w[^>]*>").unwrap());
static NOINDEX_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<([a-zA-Z][a-zA-Z0-9]*)\b[^>]*\bclass\s*=\s*["'][^"']*\bnoindex\b[^"']*["'][^>]*>"#,
    )
    .unwrap()
});
static UID_SANITIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\.,;:\(\)\s]").unwrap());
static MULTI_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());
static SNIPPET_NUMBERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9\.–-]+").unwrap());
static SNIPPET_BOOK_OF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Book of the [\w ]+[0-9\.]+").unwrap());
static SNIPPET_DISCOURSES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+ Discourses on [\w ]+[0-9\.]+").unwrap());
static SNIPPET_VAGGA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w -]+vagga").unwrap());
static SNIPPET_NIKAYA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+ Nikāya +[0-9\.]*").unwrap());
static SNIPPET_SC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"SC [0-9]+").unwrap());

/// Use only `ṁ`, both in content and query strings.
///
/// CST4, SuttaCentral and most modern translations write `ṁ`, while PTS
/// editions and several dictionaries write `ṃ`.
pub fn consistent_nasal_m(text: &str) -> String {
    text.replace('ṃ', "ṁ")
}

/// Replace punctuation and quote marks with a space.
///
/// Removing them outright could join words: `nibbāpethā'ti` should still
/// match a query for `nibbāpethā`.
pub fn remove_punct(text: &str) -> String {
    let s = PUNCT.replace_all(text, " ");
    MULTI_SPACE.replace_all(&s, " ").into_owned()
}

/// Lowercase, punctuation-free, single-spaced text used for matching.
pub fn compact_plain_text(text: &str) -> String {
    let s = MULTI_SPACE.replace_all(text, " ");
    let s = s.replace(['{', '}'], "");
    let s = remove_punct(&s.to_lowercase());
    consistent_nasal_m(&s).trim().to_string()
}

/// Flatten sutta or dictionary HTML into compact plain text.
pub fn compact_rich_text(html: &str) -> String {
    let s = html.replace('\n', " ");
    let s = REF_LINK.replace_all(&s, "");
    let s = s.replace("<br>", " ").replace("<br/>", " ");

    // dhamm<b>āya</b> becomes dhammāya, not dhamm āya.
    let s = INLINE_OPEN.replace_all(&s, "${1}${4}");
    let s = INLINE_CLOSE.replace_all(&s, "${1}${3}");

    // <td>dhammassa</td><td>dhammāya</td> becomes dhammassa dhammāya.
    let s = s
        .replace('<', " <")
        .replace("</", " </")
        .replace('>', "> ");

    compact_plain_text(&strip_html(&s))
}

/// Remove markup, leaving the text content.
pub fn strip_html(html: &str) -> String {
    let s = unescape_entities(html);
    let s = s.replace(['\u{1f44d}', '\u{1f44e}'], "");
    let s = DOCTYPE.replace_all(&s, "");
    let s = HEAD.replace_all(&s, "");
    let s = STYLE.replace_all(&s, "");
    let s = SCRIPT.replace_all(&s, "");
    let s = COMMENT.replace_all(&s, "");
    let s = TAG.replace_all(&s, "");
    MULTI_SPACE.replace_all(&s, " ").trim().to_string()
}

/// Decode character references, named (`&ntilde;`) and numeric. A
/// non-breaking space becomes a plain one.
fn unescape_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).replace('\u{a0}', " ")
}

/// Remove every element whose class list contains `noindex`, such as
/// SuttaCentral footers.
pub fn remove_noindex(html: &str) -> String {
    let mut s = html.to_string();

    while let Some(caps) = NOINDEX_OPEN.captures(&s) {
        let Some(whole) = caps.get(0) else { break };
        let start = whole.start();
        let open_end = whole.end();

        if whole.as_str().ends_with("/>") {
            s.replace_range(start..open_end, "");
            continue;
        }

        let tag = caps[1].to_lowercase();
        let end = matching_close(&s, open_end, &tag).unwrap_or(s.len());
        s.replace_range(start..end, "");
    }

    s
}

/// Byte offset just past the close tag balancing an element opened before
/// `from`.
fn matching_close(s: &str, from: usize, tag: &str) -> Option<usize> {
    let pattern = format!(r"(?i)<(/?){}\b[^>]*>", regex::escape(tag));
    let re = Regex::new(&pattern).ok()?;
    let mut depth = 1usize;

    for caps in re.captures_iter(&s[from..]) {
        let m = caps.get(0)?;
        if caps[1].is_empty() {
            if !m.as_str().ends_with("/>") {
                depth += 1;
            }
        } else {
            depth -= 1;
            if depth == 0 {
                return Some(from + m.end());
            }
        }
    }

    None
}

fn ascii_char(c: char) -> Option<char> {
    let r = match c {
        'ā' => 'a',
        'ī' => 'i',
        'ū' => 'u',
        'ṃ' | 'ṁ' => 'm',
        'ṅ' | 'ñ' | 'ṇ' => 'n',
        'ṭ' => 't',
        'ḍ' => 'd',
        'ḷ' => 'l',
        'ṛ' => 'r',
        'ṣ' | 'ś' => 's',
        'Ā' => 'A',
        'Ī' => 'I',
        'Ū' => 'U',
        'Ṃ' | 'Ṁ' => 'M',
        'Ṅ' | 'Ñ' | 'Ṇ' => 'N',
        'Ṭ' => 'T',
        'Ḍ' => 'D',
        'Ḷ' => 'L',
        'Ṛ' => 'R',
        'Ṣ' | 'Ś' => 'S',
        _ => return None,
    };
    Some(r)
}

/// Lowercase and replace Pāli diacritics with plain Latin letters.
pub fn latinize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| ascii_char(c).unwrap_or(c))
        .collect()
}

/// Case-preserving ASCII form of a Pāli word, as used in `word_ascii`
/// columns. Root signs and surrounding whitespace are dropped.
pub fn pali_to_ascii(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };

    text.replace('√', "")
        .trim()
        .chars()
        .map(|c| ascii_char(c).unwrap_or(c))
        .collect()
}

pub fn word_uid_sanitize(word: &str) -> String {
    let s = word.replace(['\'', '"'], "");
    let s = UID_SANITIZE.replace_all(&s, "-");
    MULTI_DASH.replace_all(&s, "-").into_owned()
}

/// Dictionary word identifier, e.g. `kammavācā/pts`.
pub fn word_uid(word: &str, dict_label: &str) -> String {
    format!("{}/{}", word, dict_label.to_lowercase())
}

const QUOTE_CLASS: &str = r#"['"“”‘’]*"#;
const SEPARATOR_CLASS: &str = r#"[ \n'"“”‘’.,;?!…—-]*"#;

/// Expand a quote into a pattern that tolerates the variations between
/// sources: any or no quote mark, punctuation in place of spaces, and
/// `i` / `ī` spellings.
pub fn expand_quote_to_pattern_str(text: &str) -> String {
    let text = MULTI_SPACE.replace_all(text, " ");
    let mut pattern = String::with_capacity(text.len() * 4);

    for c in text.chars() {
        match c {
            '"' | '\'' | '“' | '”' | '‘' | '’' => pattern.push_str(QUOTE_CLASS),
            'i' | 'ī' => pattern.push_str("[iī]"),
            ' ' | '.' | ',' | ';' | '?' | '!' | '…' | '—' | '-' => {
                pattern.push_str(SEPARATOR_CLASS)
            }
            c => pattern.push_str(&regex::escape(&c.to_string())),
        }
    }

    pattern
}

pub fn expand_quote_to_pattern(text: &str) -> Result<Regex, regex::Error> {
    Regex::new(&expand_quote_to_pattern_str(text))
}

fn case_insensitive(query: &str) -> Option<Regex> {
    if query.is_empty() {
        return None;
    }
    Regex::new(&format!("(?i){}", regex::escape(query))).ok()
}

/// Wrap every occurrence of `query` in a match span.
pub fn highlight_query(query: &str, content: &str) -> String {
    match case_insensitive(query) {
        Some(re) => re
            .replace_all(content, "<span class='match'>$0</span>")
            .into_owned(),
        None => content.to_string(),
    }
}

/// Cut a window of the content around the first occurrence of `query`.
///
/// Returns the whole content when the query doesn't occur in it.
pub fn fragment_around_query(query: &str, content: &str) -> String {
    let Some(m) = case_insensitive(query).and_then(|re| re.find(content))
    else {
        return content.to_string();
    };

    let chars: Vec<char> = content.chars().collect();
    let n = content[..m.start()].chars().count();

    let (a, prefix) = if n <= FRAGMENT_CHARS_BEFORE {
        (0, "")
    } else {
        (n - FRAGMENT_CHARS_BEFORE, "... ")
    };

    let (b, postfix) = if chars.len() <= a + FRAGMENT_CHARS_AFTER {
        (chars.len(), "")
    } else {
        (a + FRAGMENT_CHARS_AFTER, " ...")
    };

    let body: String = chars[a..b].iter().collect();
    format!("{prefix}{body}{postfix}")
}

/// Remove the boilerplate that the indexer prepends or that sources repeat
/// at the top of each text, so the plain snippet starts with real content.
pub fn compact_plain_snippet(
    content: &str,
    title: Option<&str>,
    sutta_ref: Option<&str>,
) -> String {
    let mut s = content.to_string();

    if let (Some(r), Some(t)) = (sutta_ref, title) {
        s = s.replace(&format!("{r} {t}"), "");
    }

    s = SNIPPET_NUMBERS.replace_all(&s, "").into_owned();
    s = SNIPPET_BOOK_OF.replace_all(&s, "").into_owned();
    s = SNIPPET_DISCOURSES.replace_all(&s, "").into_owned();
    s = SNIPPET_VAGGA.replace_all(&s, "").into_owned();
    s = SNIPPET_NIKAYA.replace_all(&s, "").into_owned();
    s = SNIPPET_SC.replace_all(&s, "").into_owned();

    // Only the first instance, a title like 'kamma' is also a common word.
    if let Some(t) = title
        && !t.is_empty()
    {
        s = s.replacen(t, "", 1);
    }

    s
}

/// All text on one line with single spaces.
pub fn oneline(content: &str) -> String {
    let s = content.replace('\n', " ");
    MULTI_SPACE.replace_all(&s, " ").into_owned()
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_punct_replaces_with_space() {
        assert_eq!(
            remove_punct("Hello, world! How are you? …"),
            "Hello world How are you "
        );
        assert_eq!(remove_punct("Line1.\nLine2;"), "Line1 Line2 ");
        assert_eq!(remove_punct("nibbāpethā'ti"), "nibbāpethā ti");
        assert_eq!(remove_punct("  Multiple   spaces.  "), " Multiple spaces ");
        assert_eq!(remove_punct(""), "");
    }

    #[test]
    fn compact_plain_text_normalizes() {
        assert_eq!(
            compact_plain_text("  HELLO, World! ṃ {test}  "),
            "hello world ṁ test"
        );
        assert_eq!(compact_plain_text("Saṃsāra."), "saṁsāra");
    }

    #[test]
    fn strip_html_removes_markup() {
        assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(
            strip_html("Text with &amp; entity."),
            "Text with & entity."
        );
        assert_eq!(
            strip_html("<head><title>T</title></head><body>Text</body>"),
            "Text"
        );
        assert_eq!(strip_html("\u{1f44d} Text \u{1f44e}"), "Text");
        assert_eq!(strip_html("&#257;&#x1e41;"), "āṁ");
    }

    #[test]
    fn strip_html_decodes_named_entities() {
        assert_eq!(strip_html("<p>&ntilde;a&ntilde;a &eacute;</p>"), "ñaña é");
        assert_eq!(strip_html("&Uuml;ber&nbsp;&auml;ll"), "Über äll");
        assert_eq!(
            compact_rich_text("<p>Pa&ntilde;&ntilde;&amacr;</p>"),
            "paññā"
        );
    }

    #[test]
    fn compact_rich_text_joins_inline_tags() {
        assert_eq!(
            compact_rich_text(
                "<p>Hello, <b>W</b>orld! ṃ</p>\n<a class=\"ref\">ref</a>"
            ),
            "hello world ṁ"
        );
        assert_eq!(compact_rich_text("dhamm<b>āya</b>"), "dhammāya");
        assert_eq!(compact_rich_text("<i>italic</i> test"), "italic test");
        assert_eq!(
            compact_rich_text("<td>dhammassa</td><td>dhammāya</td>"),
            "dhammassa dhammāya"
        );
    }

    #[test]
    fn remove_noindex_handles_nesting() {
        let html = "<p>keep</p><footer class=\"noindex\"><div>a</div><footer>b</footer></footer><p>also</p>";
        assert_eq!(remove_noindex(html), "<p>keep</p><p>also</p>");
    }

    #[test]
    fn remove_noindex_unclosed_drops_tail() {
        let html = "<p>keep</p><div class='x noindex'>footer";
        assert_eq!(remove_noindex(html), "<p>keep</p>");
    }

    #[test]
    fn latinize_and_ascii() {
        assert_eq!(latinize("dhammāya"), "dhammaya");
        assert_eq!(latinize("saṁsāra"), "samsara");
        assert_eq!(latinize("Ñāṇa"), "nana");

        assert_eq!(pali_to_ascii(Some("dhammāya")), "dhammaya");
        assert_eq!(pali_to_ascii(Some("saṁsāra")), "samsara");
        assert_eq!(pali_to_ascii(Some("Ñāṇa")), "Nana");
        assert_eq!(pali_to_ascii(Some("  √muc  ")), "muc");
        assert_eq!(pali_to_ascii(None), "");
    }

    #[test]
    fn word_uid_helpers() {
        assert_eq!(word_uid_sanitize("word.with,punct;"), "word-with-punct-");
        assert_eq!(word_uid_sanitize("word (bracket)"), "word-bracket-");
        assert_eq!(word_uid_sanitize("word's quote\""), "words-quote");
        assert_eq!(word_uid_sanitize("word--with---dashes"), "word-with-dashes");
        assert_eq!(word_uid_sanitize("  leading space  "), "-leading-space-");

        assert_eq!(word_uid("kammavācā", "PTS"), "kammavācā/pts");
        assert_eq!(word_uid("paṭisallāna", "dpd"), "paṭisallāna/dpd");
    }

    #[test]
    fn consistent_nasal() {
        assert_eq!(consistent_nasal_m("saṃsāra"), "saṁsāra");
        assert_eq!(consistent_nasal_m("dhammaṁ"), "dhammaṁ");
    }

    #[test]
    fn quote_pattern_tolerates_punctuation() {
        let re = expand_quote_to_pattern("evam me sutam ekam samayam").unwrap();
        assert!(re.is_match("evam me sutam. ekam samayam bhagavā"));

        let re = expand_quote_to_pattern("nibbapetha'ti").unwrap();
        assert!(re.is_match("nibbapetha”ti"));
        assert!(re.is_match("nibbapethati"));

        let re = expand_quote_to_pattern("bhikkhu").unwrap();
        assert!(!re.is_match("bhikkhū"));
        assert!(expand_quote_to_pattern("ti").unwrap().is_match("tī"));
    }

    #[test]
    fn quote_pattern_escapes_metacharacters() {
        let re = expand_quote_to_pattern("a (b)*").unwrap();
        assert!(re.is_match("a (b)*"));
        assert!(!re.is_match("a bbb"));
    }

    #[test]
    fn highlight_is_case_insensitive() {
        assert_eq!(
            highlight_query("dhamma", "Dhamma and dhamma"),
            "<span class='match'>Dhamma</span> and <span class='match'>dhamma</span>"
        );
        assert_eq!(highlight_query("", "text"), "text");
    }

    #[test]
    fn fragment_short_content_is_whole() {
        let content = "the dhamma is well taught";
        assert_eq!(fragment_around_query("dhamma", content), content);
        assert_eq!(fragment_around_query("absent", content), content);
    }

    #[test]
    fn fragment_long_content_is_cut() {
        let content = format!("{} dhamma {}", "a".repeat(100), "b".repeat(1000));
        let fragment = fragment_around_query("dhamma", &content);
        assert!(fragment.starts_with("... "));
        assert!(fragment.ends_with(" ..."));
        assert!(fragment.contains("dhamma"));
        assert_eq!(fragment.chars().count(), 4 + FRAGMENT_CHARS_AFTER + 4);
    }

    #[test]
    fn plain_snippet_drops_boilerplate() {
        let content =
            "SN 12.55 Mahārukkhasutta Saṁyutta Nikāya 12.55 Dukkhavagga The great tree";
        let s = compact_plain_snippet(
            content,
            Some("Mahārukkhasutta"),
            Some("SN 12.55"),
        );
        assert!(!s.contains("Mahārukkhasutta"));
        assert!(!s.contains("Nikāya"));
        assert!(!s.contains("vagga"));
        assert!(s.contains("The great tree"));
    }

    #[test]
    fn oneline_folds_whitespace() {
        assert_eq!(oneline("a\nb   c"), "a b c");
    }

    #[test]
    fn truncate_on_char_boundary() {
        assert_eq!(truncate_chars("āāāā", 2), "āā");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }
}
