use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

pub use crate::search_index::SearchResult;
use crate::{
    corpus::{Corpus, DictWord, Sutta, like_escape},
    error::{Error, Result},
    indexer::Indexes,
    search_index::{IndexKind, IndexQuery, QueryOptions},
    text_util::{consistent_nasal_m, expand_quote_to_pattern_str, fragment_around_query, highlight_query},
};

static TRAILING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ 0-9]+$").unwrap());

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Ranked search over the full-text index.
    #[default]
    FulltextMatch,
    /// Literal phrase, tolerant of punctuation and quote marks.
    ExactMatch,
    /// Regular expression over the content.
    RegexMatch,
    /// Sutta titles starting with, then containing, the query.
    TitleMatch,
    /// Dictionary headwords starting with, then containing, the query.
    HeadwordMatch,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SearchArea {
    #[default]
    Suttas,
    DictWords,
}

impl SearchArea {
    pub fn index_kind(&self) -> IndexKind {
        match self {
            Self::Suttas => IndexKind::Suttas,
            Self::DictWords => IndexKind::DictWords,
        }
    }
}

/// Parameters of one search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub mode: SearchMode,
    pub area: SearchArea,
    pub page_len: usize,
    /// Language to search in, or to leave out when `lang_include` is false.
    pub lang: Option<String>,
    pub lang_include: bool,
    /// Source uid to search in, or to leave out when `source_include` is
    /// false.
    pub source: Option<String>,
    pub source_include: bool,
    pub enable_regex: bool,
    pub fuzzy_distance: u8,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            mode: SearchMode::default(),
            area: SearchArea::default(),
            page_len: 20,
            lang: None,
            lang_include: true,
            source: None,
            source_include: true,
            enable_regex: false,
            fuzzy_distance: 0,
        }
    }
}

impl SearchParams {
    fn query_options(&self) -> QueryOptions {
        QueryOptions {
            page_len: self.page_len.max(1),
            source: self.source.clone(),
            source_include: self.source_include,
            enable_regex: self.enable_regex,
            fuzzy_distance: self.fuzzy_distance,
        }
    }

    fn lang_matches(&self, lang: &str) -> bool {
        match &self.lang {
            Some(l) => l.eq_ignore_ascii_case(lang) == self.lang_include,
            None => true,
        }
    }

    fn source_matches(&self, uid: &str) -> bool {
        match &self.source {
            Some(source) => {
                let suffix = format!("/{}", source.to_lowercase());
                uid.to_lowercase().ends_with(&suffix) == self.source_include
            }
            None => true,
        }
    }
}

/// Drop results repeating an earlier title, schema and uid.
pub fn unique_search_results(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut keys = HashSet::new();
    results
        .into_iter()
        .filter(|r| keys.insert(format!("{} {} {}", r.title, r.schema_name, r.uid)))
        .collect()
}

/// A search over one area, read page by page.
///
/// Full-text searches query the language indexes. The other modes scan the
/// databases and keep every result in memory.
pub struct SearchQueryTask<'a> {
    corpus: &'a Corpus,
    query_text: String,
    params: SearchParams,
    index_queries: Vec<IndexQuery<'a>>,
    all_results: Vec<SearchResult>,
    pages: HashMap<usize, Vec<SearchResult>>,
}

impl<'a> SearchQueryTask<'a> {
    pub fn new(
        corpus: &'a Corpus,
        indexes: &'a Indexes,
        query_text: &str,
        params: SearchParams,
    ) -> Result<Self> {
        let query_text = consistent_nasal_m(query_text.trim());
        if query_text.is_empty() {
            return Err(Error::InvalidQuery("empty query".into()));
        }

        let mut index_queries = Vec::new();
        if params.mode == SearchMode::FulltextMatch {
            let options = params.query_options();
            for index in indexes.indexes(params.area.index_kind()) {
                if params.lang_matches(index.lang()) {
                    index_queries.push(index.new_query(&query_text, &options)?);
                }
            }
        }

        Ok(Self {
            corpus,
            query_text,
            params,
            index_queries,
            all_results: Vec::new(),
            pages: HashMap::new(),
        })
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Run the search and fill the first page.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!(
            query = %self.query_text,
            mode = ?self.params.mode,
            area = ?self.params.area,
            "Running search"
        );

        self.all_results.clear();
        self.pages.clear();

        match (self.params.mode, self.params.area) {
            (SearchMode::FulltextMatch, _) => {
                let first = self.fulltext_page(0)?;
                self.pages.insert(0, first);
            }
            (SearchMode::ExactMatch | SearchMode::RegexMatch, SearchArea::Suttas) => {
                self.all_results = self.match_suttas_content()?;
            }
            (SearchMode::ExactMatch | SearchMode::RegexMatch, SearchArea::DictWords) => {
                self.all_results = self.match_dict_words_definition()?;
            }
            (SearchMode::TitleMatch, SearchArea::Suttas) => {
                self.all_results = self.match_sutta_titles()?;
            }
            (SearchMode::HeadwordMatch, SearchArea::DictWords) => {
                self.all_results = self.match_headwords()?;
            }
            (mode, area) => {
                return Err(Error::InvalidQuery(format!(
                    "{mode:?} does not apply to {area:?}"
                )));
            }
        }

        Ok(())
    }

    /// Total number of hits. Zero for a full-text search whose total is not
    /// known yet.
    pub fn query_hits(&self) -> usize {
        if self.params.mode == SearchMode::FulltextMatch {
            self.index_queries
                .iter()
                .filter_map(|q| q.hits_count())
                .sum()
        } else {
            self.all_results.len()
        }
    }

    /// One page of highlighted results. Pages start at 0.
    pub fn results_page(&mut self, page: usize) -> Result<Vec<SearchResult>> {
        if let Some(results) = self.pages.get(&page) {
            return Ok(results.clone());
        }

        let results = if self.params.mode == SearchMode::FulltextMatch {
            self.fulltext_page(page)?
        } else {
            let page_len = self.params.page_len.max(1);
            self.all_results
                .iter()
                .skip(page * page_len)
                .take(page_len)
                .cloned()
                .map(|mut r| {
                    r.snippet = highlight_query(&self.query_text, &r.snippet);
                    r
                })
                .collect()
        };

        self.pages.insert(page, results.clone());
        Ok(results)
    }

    /// Every result, without highlighting for the database modes.
    pub fn all_results(&mut self) -> Result<Vec<SearchResult>> {
        if self.params.mode != SearchMode::FulltextMatch {
            return Ok(self.all_results.clone());
        }

        let mut results = Vec::new();
        for query in &mut self.index_queries {
            results.extend(query.get_all_results()?);
        }
        sort_by_score(&mut results);
        Ok(results)
    }

    /// Page `page` of the ranking merged across language indexes. Every
    /// index contributes its top `(page + 1) * page_len` hits, so the merged
    /// prefix is complete up to the end of the page.
    fn fulltext_page(&mut self, page: usize) -> Result<Vec<SearchResult>> {
        if let [query] = self.index_queries.as_mut_slice() {
            return query.highlighted_results_page(page);
        }

        let page_len = self.params.page_len.max(1);
        let mut results = Vec::new();
        for query in &mut self.index_queries {
            for index_page in 0..=page {
                let batch = query.highlighted_results_page(index_page)?;
                let short = batch.len() < page_len;
                results.extend(batch);
                if short {
                    break;
                }
            }
        }
        sort_by_score(&mut results);

        Ok(results
            .into_iter()
            .enumerate()
            .skip(page * page_len)
            .take(page_len)
            .map(|(rank, mut r)| {
                r.rank = Some(rank);
                r
            })
            .collect())
    }

    /// Exact and regex modes: content matching every `AND`-separated term.
    fn match_suttas_content(&self) -> Result<Vec<SearchResult>> {
        let patterns = self.term_patterns()?;

        let suttas: Vec<Sutta> = self
            .corpus
            .all_suttas(None)?
            .into_iter()
            .filter(|s| self.params.lang_matches(&s.language))
            .filter(|s| self.params.source_matches(&s.uid))
            .filter(|s| {
                let content = sutta_content(s);
                patterns.iter().all(|p| p.is_match(content))
            })
            .collect();

        Ok(suttas.iter().map(|s| self.sutta_result(s)).collect())
    }

    fn match_dict_words_definition(&self) -> Result<Vec<SearchResult>> {
        let terms = self.and_terms();
        let regexes = if self.params.mode == SearchMode::RegexMatch {
            self.term_patterns()?
        } else {
            Vec::new()
        };

        let words: Vec<DictWord> = self
            .corpus
            .all_dict_words(None)?
            .into_iter()
            .filter(|w| self.params.lang_matches(&w.language))
            .filter(|w| self.params.source_matches(&w.uid))
            .filter(|w| {
                let definition = w.definition_plain.as_deref().unwrap_or("");
                if self.params.mode == SearchMode::RegexMatch {
                    regexes.iter().all(|p| p.is_match(definition))
                } else {
                    let definition = definition.to_lowercase();
                    terms.iter().all(|t| definition.contains(&t.to_lowercase()))
                }
            })
            .collect();

        Ok(words.iter().map(|w| self.dict_word_result(w)).collect())
    }

    fn match_sutta_titles(&self) -> Result<Vec<SearchResult>> {
        let escaped = like_escape(&self.query_text);

        let mut suttas = self.corpus.suttas_title_like(&format!("{escaped}%"))?;
        let seen: HashSet<_> = suttas.iter().map(|s| (s.schema, s.id)).collect();

        suttas.extend(
            self.corpus
                .suttas_title_like(&format!("%{escaped}%"))?
                .into_iter()
                .filter(|s| !seen.contains(&(s.schema, s.id))),
        );

        Ok(suttas
            .iter()
            .filter(|s| self.params.lang_matches(&s.language))
            .filter(|s| self.params.source_matches(&s.uid))
            .map(|s| self.sutta_result(s))
            .collect())
    }

    fn match_headwords(&self) -> Result<Vec<SearchResult>> {
        let escaped = like_escape(&self.query_text);

        let mut words = self
            .corpus
            .dict_words_headword_like(&format!("{escaped}%"))?;
        // 'dhamma 1' and 'dhamma 2' sort together with 'dhamma'.
        words.sort_by_cached_key(|w| {
            TRAILING_NUMBER
                .replace(&w.word.to_lowercase(), "")
                .into_owned()
        });
        let seen: HashSet<_> = words.iter().map(|w| (w.schema, w.id)).collect();

        words.extend(
            self.corpus
                .dict_words_headword_like(&format!("%{escaped}%"))?
                .into_iter()
                .filter(|w| !seen.contains(&(w.schema, w.id))),
        );

        Ok(words
            .iter()
            .filter(|w| self.params.lang_matches(&w.language))
            .filter(|w| self.params.source_matches(&w.uid))
            .map(|w| self.dict_word_result(w))
            .collect())
    }

    fn and_terms(&self) -> Vec<&str> {
        self.query_text
            .split("AND")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    fn term_patterns(&self) -> Result<Vec<Regex>> {
        self.and_terms()
            .into_iter()
            .map(|term| {
                let pattern = match self.params.mode {
                    SearchMode::ExactMatch => expand_quote_to_pattern_str(term),
                    _ => term.to_string(),
                };
                Ok(RegexBuilder::new(&pattern).case_insensitive(true).build()?)
            })
            .collect()
    }

    fn sutta_result(&self, sutta: &Sutta) -> SearchResult {
        SearchResult {
            schema_name: sutta.schema.as_str().to_string(),
            table_name: IndexKind::Suttas.table_name().to_string(),
            db_id: sutta.id,
            uid: sutta.uid.clone(),
            source_uid: sutta.source_uid.clone(),
            language: sutta.language.clone(),
            title: sutta.title.clone().unwrap_or_default(),
            sutta_ref: Some(sutta.sutta_ref.clone()),
            nikaya: Some(sutta.nikaya.clone()),
            snippet: fragment_around_query(&self.query_text, sutta_content(sutta)),
            score: None,
            rank: None,
        }
    }

    fn dict_word_result(&self, word: &DictWord) -> SearchResult {
        let content = [&word.summary, &word.definition_plain, &word.definition_html]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or("");

        SearchResult {
            schema_name: word.schema.as_str().to_string(),
            table_name: IndexKind::DictWords.table_name().to_string(),
            db_id: word.id,
            uid: word.uid.clone(),
            source_uid: word.source_uid.clone(),
            language: word.language.clone(),
            title: word.word.clone(),
            sutta_ref: None,
            nikaya: None,
            snippet: fragment_around_query(&self.query_text, content),
            score: None,
            rank: None,
        }
    }
}

impl std::fmt::Debug for SearchQueryTask<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchQueryTask")
            .field("query_text", &self.query_text)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

fn sutta_content(sutta: &Sutta) -> &str {
    [&sutta.content_plain, &sutta.content_html]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .map(String::as_str)
        .unwrap_or("")
}

fn sort_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.score
            .unwrap_or(0.0)
            .total_cmp(&a.score.unwrap_or(0.0))
    });
}

/// Format results for human-readable terminal output.
pub fn format_human(results: &[SearchResult], hits: usize) {
    if results.is_empty() {
        println!("No results found.");
        return;
    }

    for (i, r) in results.iter().enumerate() {
        let rank = r.rank.unwrap_or(i) + 1;
        match r.score {
            Some(score) => println!("{rank:>3}. [{score:.3}] {}", r.uid),
            None => println!("{rank:>3}. {}", r.uid),
        }
        let heading = match &r.sutta_ref {
            Some(sutta_ref) if !sutta_ref.is_empty() => format!("{sutta_ref} {}", r.title),
            _ => r.title.clone(),
        };
        if !heading.trim().is_empty() {
            println!("     {}", heading.trim());
        }
        let snippet = crate::text_util::strip_html(&r.snippet);
        if !snippet.is_empty() {
            println!("     {}", crate::text_util::truncate_chars(&snippet, 160));
        }
    }
    println!("\n{} of {hits} result(s)", results.len());
}

/// Format results as JSON output.
pub fn format_json(results: &[SearchResult], query: &str, hits: usize) -> Result<()> {
    let out = serde_json::json!({
        "query": query,
        "hits": hits,
        "result_count": results.len(),
        "results": results,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::tests::test_corpus;

    fn indexed() -> (Corpus, Indexes) {
        let corpus = test_corpus();
        let mut indexes = Indexes::open_in_ram(&corpus).unwrap();
        indexes.index_all(&corpus, false).unwrap();
        (corpus, indexes)
    }

    fn uids(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.uid.as_str()).collect()
    }

    fn run(
        corpus: &Corpus,
        indexes: &Indexes,
        query: &str,
        params: SearchParams,
    ) -> Vec<SearchResult> {
        let mut task = SearchQueryTask::new(corpus, indexes, query, params).unwrap();
        task.run().unwrap();
        task.results_page(0).unwrap()
    }

    #[test]
    fn fulltext_over_all_languages() {
        let (corpus, indexes) = indexed();
        let results = run(&corpus, &indexes, "Ukkaṭṭhā", SearchParams::default());

        let found = uids(&results);
        assert!(found.contains(&"mn1/en/sujato"));
        assert!(found.contains(&"mn1/en/thanissaro"));
        assert!(found.contains(&"mn1/pli/ms"));
    }

    #[test]
    fn fulltext_pages_hold_page_len_across_languages() {
        let (corpus, indexes) = indexed();
        let params = SearchParams {
            page_len: 1,
            ..Default::default()
        };
        let mut task = SearchQueryTask::new(&corpus, &indexes, "Ukkaṭṭhā", params).unwrap();
        task.run().unwrap();

        let mut seen = Vec::new();
        for page in 0..3 {
            let results = task.results_page(page).unwrap();
            assert_eq!(results.len(), 1, "page {page}");
            assert_eq!(results[0].rank, Some(page));
            seen.push(results[0].uid.clone());
        }
        assert!(task.results_page(3).unwrap().is_empty());

        seen.sort();
        assert_eq!(seen, vec!["mn1/en/sujato", "mn1/en/thanissaro", "mn1/pli/ms"]);
    }

    #[test]
    fn fulltext_language_filter() {
        let (corpus, indexes) = indexed();

        let params = SearchParams {
            lang: Some("en".into()),
            ..Default::default()
        };
        let results = run(&corpus, &indexes, "Ukkaṭṭhā", params);
        assert!(results.iter().all(|r| r.language == "en"));
        assert_eq!(results.len(), 2);

        let params = SearchParams {
            lang: Some("en".into()),
            lang_include: false,
            ..Default::default()
        };
        let results = run(&corpus, &indexes, "Ukkaṭṭhā", params);
        assert_eq!(uids(&results), vec!["mn1/pli/ms"]);
    }

    #[test]
    fn fulltext_hits_and_all_results() {
        let (corpus, indexes) = indexed();
        let params = SearchParams {
            page_len: 1,
            lang: Some("en".into()),
            ..Default::default()
        };
        let mut task = SearchQueryTask::new(&corpus, &indexes, "heard", params).unwrap();
        task.run().unwrap();

        assert_eq!(task.results_page(0).unwrap().len(), 1);
        assert_eq!(task.query_hits(), 3);
        assert_eq!(task.all_results().unwrap().len(), 3);
    }

    #[test]
    fn exact_match_tolerates_punctuation() {
        let (corpus, indexes) = indexed();
        let params = SearchParams {
            mode: SearchMode::ExactMatch,
            ..Default::default()
        };
        let results = run(&corpus, &indexes, "one time", params);

        assert_eq!(uids(&results), vec!["mn1/en/sujato", "mn2/en/sujato"]);
        assert!(results[0].snippet.contains("<span class='match'>"));
    }

    #[test]
    fn exact_match_and_terms_with_source() {
        let (corpus, indexes) = indexed();
        let params = SearchParams {
            mode: SearchMode::ExactMatch,
            source: Some("thanissaro".into()),
            ..Default::default()
        };
        let results = run(&corpus, &indexes, "heard AND Ukkaṭṭhā", params);
        assert_eq!(uids(&results), vec!["mn1/en/thanissaro"]);
    }

    #[test]
    fn regex_match_on_content() {
        let (corpus, indexes) = indexed();
        let params = SearchParams {
            mode: SearchMode::RegexMatch,
            ..Default::default()
        };
        let results = run(&corpus, &indexes, r"rare is (birth|the arising)", params);
        assert_eq!(uids(&results), vec!["dhp179-196/en/sujato"]);
    }

    #[test]
    fn title_match_prefix_first() {
        let (corpus, indexes) = indexed();
        let params = SearchParams {
            mode: SearchMode::TitleMatch,
            ..Default::default()
        };
        let results = run(&corpus, &indexes, "the r", params);
        let found = uids(&results);

        // The Root of All Things, The Realized One, The Root Sequence
        assert_eq!(found.len(), 3);
        let results = run(
            &corpus,
            &indexes,
            "wheel",
            SearchParams {
                mode: SearchMode::TitleMatch,
                ..Default::default()
            },
        );
        assert_eq!(uids(&results), vec!["sn56.11/en/sujato"]);
    }

    #[test]
    fn headword_match_sorts_numbered_words() {
        let (corpus, indexes) = indexed();
        let params = SearchParams {
            mode: SearchMode::HeadwordMatch,
            area: SearchArea::DictWords,
            ..Default::default()
        };
        let results = run(&corpus, &indexes, "dhamma", params);
        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["dhamma 1", "dhamma 2", "dhammakāya", "sadhamma"]);
    }

    #[test]
    fn dict_fulltext_puts_headword_first() {
        let (corpus, indexes) = indexed();
        let params = SearchParams {
            area: SearchArea::DictWords,
            ..Default::default()
        };
        let results = run(&corpus, &indexes, "dhammakāya", params);
        assert_eq!(results[0].title, "dhammakāya");
    }

    #[test]
    fn mode_must_fit_area() {
        let (corpus, indexes) = indexed();
        let params = SearchParams {
            mode: SearchMode::HeadwordMatch,
            area: SearchArea::Suttas,
            ..Default::default()
        };
        let mut task = SearchQueryTask::new(&corpus, &indexes, "dhamma", params).unwrap();
        assert!(task.run().is_err());
    }

    #[test]
    fn empty_query_is_rejected() {
        let (corpus, indexes) = indexed();
        assert!(SearchQueryTask::new(&corpus, &indexes, "  ", SearchParams::default()).is_err());
    }

    #[test]
    fn unique_results() {
        let (corpus, indexes) = indexed();
        let results = run(
            &corpus,
            &indexes,
            "heard",
            SearchParams {
                mode: SearchMode::ExactMatch,
                ..Default::default()
            },
        );
        let mut doubled = results.clone();
        doubled.extend(results.clone());
        assert_eq!(unique_search_results(doubled).len(), results.len());
    }
}
