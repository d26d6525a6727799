use std::path::Path;

use serde::{Deserialize, Serialize};
use tantivy::{
    DocAddress,
    Index,
    IndexReader,
    IndexWriter,
    Searcher,
    snippet::SnippetGenerator,
    TantivyDocument,
    Term,
    collector::{Count, TopDocs},
    doc,
    query::{BooleanQuery, FuzzyTermQuery, Occur, Query, QueryParser, RegexQuery},
    schema::*,
    tokenizer::{
        AsciiFoldingFilter,
        Language,
        LowerCaser,
        RemoveLongFilter,
        SimpleTokenizer,
        Stemmer,
        TextAnalyzer,
        TokenStream,
    },
};

use crate::{
    corpus::{DictWord, SchemaName, Sutta},
    error::Result,
    pali_stemmer::PaliStemmer,
    sutta_ref::query_text_to_uid_field_query,
    text_util::{compact_plain_snippet, consistent_nasal_m, oneline, truncate_chars},
};

/// Field names used in the schemas.
pub mod fields {
    pub const DB_ID: &str = "db_id";
    pub const INDEX_KEY: &str = "index_key";
    pub const SCHEMA_NAME: &str = "schema_name";
    pub const UID: &str = "uid";
    pub const LANGUAGE: &str = "language";
    pub const SOURCE_UID: &str = "source_uid";
    pub const REF: &str = "ref";
    pub const NIKAYA: &str = "nikaya";
    pub const TITLE: &str = "title";
    pub const TITLE_PALI: &str = "title_pali";
    pub const TITLE_TRANS: &str = "title_trans";
    pub const CONTENT: &str = "content";
    pub const WORD: &str = "word";
    pub const SYNONYMS: &str = "synonyms";
}

pub const SIMPLE_FOLD: &str = "simple_fold";
pub const PLI_STEM_FOLD: &str = "pli_stem_fold";
pub const DEFAULT_STEM_FOLD: &str = "en_stem_fold";

/// Maximum snippet length in characters.
pub const SNIPPET_MAX_CHARS: usize = 200;

const LANG_STEMMERS: &[(&str, Language)] = &[
    ("ar", Language::Arabic),
    ("da", Language::Danish),
    ("de", Language::German),
    ("el", Language::Greek),
    ("en", Language::English),
    ("es", Language::Spanish),
    ("fi", Language::Finnish),
    ("fr", Language::French),
    ("hu", Language::Hungarian),
    ("it", Language::Italian),
    ("nl", Language::Dutch),
    ("no", Language::Norwegian),
    ("pt", Language::Portuguese),
    ("ro", Language::Romanian),
    ("ru", Language::Russian),
    ("sv", Language::Swedish),
    ("ta", Language::Tamil),
    ("tr", Language::Turkish),
];

/// Languages stemmed with the Pāli stemmer.
const PALI_STEM_LANGS: &[&str] = &["pli", "san"];

/// Name of the tokenizer used for text in `lang`.
pub fn tokenizer_for_lang(lang: &str) -> String {
    if PALI_STEM_LANGS.contains(&lang) {
        return PLI_STEM_FOLD.to_string();
    }
    if LANG_STEMMERS.iter().any(|(code, _)| *code == lang) {
        return format!("{lang}_stem_fold");
    }
    DEFAULT_STEM_FOLD.to_string()
}

/// What kind of records an index holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Suttas,
    DictWords,
}

impl IndexKind {
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Suttas => "suttas",
            Self::DictWords => "dict_words",
        }
    }
}

/// A search hit, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub schema_name: String,
    pub table_name: String,
    pub db_id: i64,
    pub uid: String,
    pub source_uid: String,
    pub language: String,
    pub title: String,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub sutta_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nikaya: Option<String>,
    /// Html fragment with matches wrapped in `<span class='match'>`.
    pub snippet: String,
    pub score: Option<f32>,
    pub rank: Option<usize>,
}

fn text_opts(tokenizer: &str) -> TextOptions {
    TextOptions::default()
        .set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(tokenizer)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        )
        .set_stored()
}

fn build_schema(kind: IndexKind, lang: &str) -> Schema {
    let mut builder = Schema::builder();

    builder.add_i64_field(fields::DB_ID, STORED | FAST);
    builder.add_text_field(fields::INDEX_KEY, STRING | STORED);
    builder.add_text_field(fields::SCHEMA_NAME, STRING | STORED);
    builder.add_text_field(fields::UID, text_opts(SIMPLE_FOLD));
    builder.add_text_field(fields::LANGUAGE, STRING | STORED);
    builder.add_text_field(fields::SOURCE_UID, STRING | STORED);

    match kind {
        IndexKind::Suttas => {
            let lang_tok = tokenizer_for_lang(lang);
            builder.add_text_field(fields::REF, text_opts(SIMPLE_FOLD));
            builder.add_text_field(fields::NIKAYA, STRING | STORED);
            builder.add_text_field(fields::TITLE, text_opts(&lang_tok));
            builder.add_text_field(fields::TITLE_PALI, text_opts(PLI_STEM_FOLD));
            builder.add_text_field(fields::TITLE_TRANS, text_opts(&lang_tok));
            builder.add_text_field(fields::CONTENT, text_opts(&lang_tok));
        }
        IndexKind::DictWords => {
            builder.add_text_field(fields::WORD, text_opts(SIMPLE_FOLD));
            builder.add_text_field(fields::SYNONYMS, text_opts(SIMPLE_FOLD));
            builder.add_text_field(fields::CONTENT, text_opts(PLI_STEM_FOLD));
        }
    }

    builder.build()
}

fn register_tokenizers(index: &Index) {
    let tokenizers = index.tokenizers();

    let simple_fold = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .build();
    tokenizers.register(SIMPLE_FOLD, simple_fold);

    for (code, language) in LANG_STEMMERS {
        let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(40))
            .filter(LowerCaser)
            .filter(Stemmer::new(*language))
            .filter(AsciiFoldingFilter)
            .build();
        tokenizers.register(&format!("{code}_stem_fold"), analyzer);
    }

    // The stemmer matches on diacritics, so folding comes after it.
    let pli_stem_fold = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(PaliStemmer)
        .filter(AsciiFoldingFilter)
        .build();
    tokenizers.register(PLI_STEM_FOLD, pli_stem_fold);
}

fn index_key(schema: SchemaName, kind: IndexKind, uid: &str) -> String {
    format!("{}:{}:{uid}", schema.as_str(), kind.table_name())
}

/// A tantivy index of suttas or dictionary words in one language.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    schema: Schema,
    kind: IndexKind,
    lang: String,
}

impl SearchIndex {
    /// Open or create the index at the given directory.
    pub fn open(dir: &Path, kind: IndexKind, lang: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let schema = build_schema(kind, lang);

        let mmap_dir = tantivy::directory::MmapDirectory::open(dir)
            .map_err(|e| tantivy::TantivyError::SystemError(e.to_string()))?;
        let index = if Index::exists(&mmap_dir)
            .map_err(|e| tantivy::TantivyError::SystemError(e.to_string()))?
        {
            Index::open(mmap_dir)?
        } else {
            Index::create(mmap_dir, schema, tantivy::IndexSettings::default())?
        };

        Self::from_index(index, kind, lang)
    }

    pub fn open_in_ram(kind: IndexKind, lang: &str) -> Result<Self> {
        let index = Index::create_in_ram(build_schema(kind, lang));
        Self::from_index(index, kind, lang)
    }

    fn from_index(index: Index, kind: IndexKind, lang: &str) -> Result<Self> {
        register_tokenizers(&index);
        let reader = index.reader()?;
        let schema = index.schema();

        Ok(Self {
            index,
            reader,
            schema,
            kind,
            lang: lang.to_string(),
        })
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    fn field(&self, name: &str) -> Result<Field> {
        Ok(self.schema.get_field(name)?)
    }

    /// Create a writer with the given memory budget (in bytes).
    pub fn writer(&self, memory_budget: usize) -> Result<IndexWriter> {
        Ok(self.index.writer(memory_budget)?)
    }

    /// Add a sutta, replacing any earlier document for the same record.
    /// `content` is the prepared text to index.
    pub fn add_sutta(
        &self,
        writer: &IndexWriter,
        sutta: &Sutta,
        content: &str,
    ) -> Result<()> {
        let key = index_key(sutta.schema, IndexKind::Suttas, &sutta.uid);
        let key_field = self.field(fields::INDEX_KEY)?;
        writer.delete_term(Term::from_field_text(key_field, &key));

        writer.add_document(doc!(
            self.field(fields::DB_ID)? => sutta.id,
            key_field => key,
            self.field(fields::SCHEMA_NAME)? => sutta.schema.as_str(),
            self.field(fields::UID)? => sutta.uid.as_str(),
            self.field(fields::LANGUAGE)? => sutta.language.as_str(),
            self.field(fields::SOURCE_UID)? => sutta.source_uid.to_lowercase(),
            self.field(fields::REF)? => sutta.sutta_ref.as_str(),
            self.field(fields::NIKAYA)? => sutta.nikaya.as_str(),
            self.field(fields::TITLE)? => sutta.title.as_deref().unwrap_or(""),
            self.field(fields::TITLE_PALI)? => sutta.title_pali.as_deref().unwrap_or(""),
            self.field(fields::TITLE_TRANS)? => sutta.title_trans.as_deref().unwrap_or(""),
            self.field(fields::CONTENT)? => content,
        ))?;

        Ok(())
    }

    /// Add a dictionary word, replacing any earlier document for the same
    /// record.
    pub fn add_dict_word(
        &self,
        writer: &IndexWriter,
        word: &DictWord,
        content: &str,
    ) -> Result<()> {
        let key = index_key(word.schema, IndexKind::DictWords, &word.uid);
        let key_field = self.field(fields::INDEX_KEY)?;
        writer.delete_term(Term::from_field_text(key_field, &key));

        writer.add_document(doc!(
            self.field(fields::DB_ID)? => word.id,
            key_field => key,
            self.field(fields::SCHEMA_NAME)? => word.schema.as_str(),
            self.field(fields::UID)? => word.uid.as_str(),
            self.field(fields::LANGUAGE)? => word.language.as_str(),
            self.field(fields::SOURCE_UID)? => word.source_uid.to_lowercase(),
            self.field(fields::WORD)? => word.word.as_str(),
            self.field(fields::SYNONYMS)? => word.synonyms.as_deref().unwrap_or(""),
            self.field(fields::CONTENT)? => content,
        ))?;

        Ok(())
    }

    /// Delete every document that came from one database.
    pub fn delete_schema(
        &self,
        writer: &IndexWriter,
        schema: SchemaName,
    ) -> Result<()> {
        let field = self.field(fields::SCHEMA_NAME)?;
        writer.delete_term(Term::from_field_text(field, schema.as_str()));
        Ok(())
    }

    pub fn num_docs(&self) -> Result<u64> {
        self.reader.reload()?;
        Ok(self.reader.searcher().num_docs())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.num_docs()? == 0)
    }

    fn default_fields(&self) -> Result<Vec<Field>> {
        let content = self.field(fields::CONTENT)?;
        match self.kind {
            IndexKind::Suttas => Ok(vec![content]),
            IndexKind::DictWords => Ok(vec![content, self.field(fields::WORD)?]),
        }
    }

    /// Parse `text` with the query syntax, without searching.
    pub fn check_query_syntax(&self, text: &str) -> Result<()> {
        let parser = QueryParser::for_index(&self.index, self.default_fields()?);
        parser.parse_query(text)?;
        Ok(())
    }

    /// Lowercased terms of `text` as the field's tokenizer produces them.
    fn analyze(&self, field: Field, text: &str) -> Result<Vec<String>> {
        let mut analyzer = self.index.tokenizer_for_field(field)?;
        let mut stream = analyzer.token_stream(text);
        let mut terms = Vec::new();
        stream.process(&mut |token| terms.push(token.text.clone()));
        Ok(terms)
    }

    /// Every whitespace-separated term of `text` as a required regex over
    /// `field`.
    fn regex_query(&self, text: &str, field: Field) -> Result<Box<dyn Query>> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for term in text.split_whitespace() {
            let regex = RegexQuery::from_pattern(&term.to_lowercase(), field)?;
            clauses.push((Occur::Must, Box::new(regex)));
        }
        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    /// Every analyzed term of `text` as a required fuzzy match over `field`.
    fn fuzzy_query(
        &self,
        text: &str,
        field: Field,
        distance: u8,
    ) -> Result<Box<dyn Query>> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for term in self.analyze(field, text)? {
            let term = Term::from_field_text(field, &term);
            clauses.push((
                Occur::Must,
                Box::new(FuzzyTermQuery::new(term, distance, true)),
            ));
        }
        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    /// Prepare a query against this index.
    pub fn new_query(
        &self,
        text: &str,
        options: &QueryOptions,
    ) -> Result<IndexQuery<'_>> {
        self.reader.reload()?;
        let searcher = self.reader.searcher();

        let query_text_orig = consistent_nasal_m(text.trim());
        let mut query_text = query_text_orig.replace("source:", "source_uid:");

        if !query_text.contains("uid:") && !query_text.contains("ref:") {
            query_text = query_text_to_uid_field_query(&query_text);
        }

        let is_single_word =
            !query_text.contains([' ', '"', '\'', '+', ':']);
        let term_query = options.enable_regex || options.fuzzy_distance > 0;

        if let Some(source) = &options.source
            && !term_query
        {
            let sign = if options.source_include { '+' } else { '-' };
            query_text.push_str(&format!(
                " {sign}{}:{}",
                fields::SOURCE_UID,
                source.to_lowercase()
            ));
        }

        let content = self.field(fields::CONTENT)?;
        let (query, snippet_field) = match self.kind {
            IndexKind::Suttas => {
                if options.enable_regex {
                    (self.regex_query(&query_text, content)?, content)
                } else if options.fuzzy_distance > 0 {
                    (
                        self.fuzzy_query(&query_text, content, options.fuzzy_distance)?,
                        content,
                    )
                } else {
                    if is_single_word {
                        query_text = format!("+{query_text}");
                    }
                    let parser =
                        QueryParser::for_index(&self.index, self.default_fields()?);
                    (parser.parse_query(&query_text)?, content)
                }
            }
            IndexKind::DictWords => {
                let word = self.field(fields::WORD)?;
                if options.enable_regex {
                    (self.regex_query(&query_text, word)?, content)
                } else if options.fuzzy_distance > 0 {
                    (
                        self.fuzzy_query(&query_text, word, options.fuzzy_distance)?,
                        content,
                    )
                } else {
                    if is_single_word {
                        query_text =
                            format!("+{query_text} {}:{query_text_orig}", fields::WORD);
                    }
                    let parser =
                        QueryParser::for_index(&self.index, self.default_fields()?);
                    (parser.parse_query(&query_text)?, content)
                }
            }
        };

        tracing::debug!(
            kind = ?self.kind,
            lang = %self.lang,
            query = %query_text,
            "Parsed index query"
        );

        let mut snippet_generator =
            SnippetGenerator::create(&searcher, &*query, snippet_field)?;
        snippet_generator.set_max_num_chars(SNIPPET_MAX_CHARS);

        Ok(IndexQuery {
            index: self,
            searcher,
            query,
            snippet_generator,
            query_text_orig,
            page_len: options.page_len.max(1),
            source: options.source.as_ref().map(|s| s.to_lowercase()),
            source_include: options.source_include,
            post_filter_source: options.source.is_some() && term_query,
            hits_count: None,
        })
    }
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("kind", &self.kind)
            .field("lang", &self.lang)
            .finish_non_exhaustive()
    }
}

/// Options shared by every index a search task queries.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub page_len: usize,
    /// Source uid to include or exclude, e.g. `sujato`.
    pub source: Option<String>,
    pub source_include: bool,
    pub enable_regex: bool,
    /// Edit distance for fuzzy matching, 0 disables it.
    pub fuzzy_distance: u8,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            page_len: 20,
            source: None,
            source_include: true,
            enable_regex: false,
            fuzzy_distance: 0,
        }
    }
}

/// A parsed query bound to one index, read page by page.
pub struct IndexQuery<'i> {
    index: &'i SearchIndex,
    searcher: Searcher,
    query: Box<dyn Query>,
    snippet_generator: SnippetGenerator,
    query_text_orig: String,
    page_len: usize,
    source: Option<String>,
    source_include: bool,
    /// Regex and fuzzy queries are built directly from terms, so the source
    /// filter is applied to the hits instead.
    post_filter_source: bool,
    hits_count: Option<usize>,
}

impl IndexQuery<'_> {
    /// Total hits, if known. Unknown while a post-filtered search hasn't
    /// been read to the end.
    pub fn hits_count(&self) -> Option<usize> {
        self.hits_count
    }

    pub fn query_text(&self) -> &str {
        &self.query_text_orig
    }

    fn source_matches(&self, doc: &TantivyDocument) -> Result<bool> {
        let Some(source) = &self.source else {
            return Ok(true);
        };
        let field = self.index.field(fields::SOURCE_UID)?;
        let is_source = extract_text(doc, field) == *source;
        Ok(is_source == self.source_include)
    }

    fn filtered_page(
        &mut self,
        page: usize,
    ) -> Result<Vec<(f32, DocAddress, TantivyDocument)>> {
        let window = self.page_len * 10;
        let wanted = (page + 1) * self.page_len;

        let mut filtered = Vec::new();
        let mut offset = 0;
        let mut total = 0;

        loop {
            let (top_docs, count) = self.searcher.search(
                &*self.query,
                &(TopDocs::with_limit(window).and_offset(offset), Count),
            )?;
            total = count.max(total);

            for (score, address) in top_docs {
                let doc: TantivyDocument = self.searcher.doc(address)?;
                if self.source_matches(&doc)? {
                    filtered.push((score, address, doc));
                }
            }

            offset += window;
            if filtered.len() >= wanted || offset >= total {
                break;
            }
        }

        if offset >= total {
            self.hits_count = Some(filtered.len());
        }

        Ok(filtered
            .into_iter()
            .skip(page * self.page_len)
            .take(self.page_len)
            .collect())
    }

    fn unfiltered_page(
        &mut self,
        page: usize,
    ) -> Result<Vec<(f32, DocAddress, TantivyDocument)>> {
        let collector = (
            TopDocs::with_limit(self.page_len).and_offset(page * self.page_len),
            Count,
        );
        let (top_docs, count) = self.searcher.search(&*self.query, &collector)?;
        self.hits_count = Some(count);

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = self.searcher.doc(address)?;
            hits.push((score, address, doc));
        }
        Ok(hits)
    }

    /// One page of results with highlighted snippets. Pages start at 0.
    pub fn highlighted_results_page(
        &mut self,
        page: usize,
    ) -> Result<Vec<SearchResult>> {
        let hits = if self.post_filter_source {
            self.filtered_page(page)?
        } else {
            self.unfiltered_page(page)?
        };

        let mut results = Vec::with_capacity(hits.len());
        for (rank, (score, _, doc)) in hits.into_iter().enumerate() {
            let mut result = self.result_from_doc(&doc, score)?;
            result.rank = Some(page * self.page_len + rank);
            results.push(result);
        }

        if self.index.kind == IndexKind::DictWords
            && !self.query_text_orig.contains(['+', '-', ':'])
        {
            results = boost_by_headword(&self.query_text_orig, results);
        }

        Ok(results)
    }

    fn result_from_doc(
        &self,
        doc: &TantivyDocument,
        score: f32,
    ) -> Result<SearchResult> {
        let idx = self.index;
        let content = extract_text(doc, idx.field(fields::CONTENT)?);

        let (title, sutta_ref, nikaya) = match idx.kind {
            IndexKind::Suttas => (
                extract_text(doc, idx.field(fields::TITLE)?),
                Some(extract_text(doc, idx.field(fields::REF)?)),
                Some(extract_text(doc, idx.field(fields::NIKAYA)?)),
            ),
            IndexKind::DictWords => {
                (extract_text(doc, idx.field(fields::WORD)?), None, None)
            }
        };

        let snippet = self.snippet_generator.snippet_from_doc(doc);
        let snippet = if snippet.highlighted().is_empty() {
            plain_snippet(&content, &title, sutta_ref.as_deref())
        } else {
            snippet
                .to_html()
                .replace("<b>", "<span class='match'>")
                .replace("</b>", "</span>")
        };

        Ok(SearchResult {
            schema_name: extract_text(doc, idx.field(fields::SCHEMA_NAME)?),
            table_name: idx.kind.table_name().to_string(),
            db_id: doc
                .get_first(idx.field(fields::DB_ID)?)
                .and_then(|v| v.as_i64())
                .unwrap_or(0),
            uid: extract_text(doc, idx.field(fields::UID)?),
            source_uid: extract_text(doc, idx.field(fields::SOURCE_UID)?),
            language: extract_text(doc, idx.field(fields::LANGUAGE)?),
            title,
            sutta_ref,
            nikaya,
            snippet,
            score: Some(score),
            rank: None,
        })
    }

    /// Read every page. Stops at the first empty page when the total isn't
    /// known up front.
    pub fn get_all_results(&mut self) -> Result<Vec<SearchResult>> {
        let mut results = self.highlighted_results_page(0)?;

        match self.hits_count {
            Some(hits) => {
                let pages = hits.div_ceil(self.page_len);
                for page in 1..pages {
                    results.extend(self.highlighted_results_page(page)?);
                }
            }
            None => {
                let mut page = 1;
                loop {
                    let batch = self.highlighted_results_page(page)?;
                    if batch.is_empty() {
                        break;
                    }
                    results.extend(batch);
                    page += 1;
                }
            }
        }

        Ok(results)
    }
}

impl std::fmt::Debug for IndexQuery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexQuery")
            .field("index", self.index)
            .field("query_text", &self.query_text_orig)
            .field("hits_count", &self.hits_count)
            .finish_non_exhaustive()
    }
}

/// Start of the content with the indexer's boilerplate removed, used when
/// the snippet generator found nothing to highlight.
fn plain_snippet(content: &str, title: &str, sutta_ref: Option<&str>) -> String {
    let head = truncate_chars(content, 500);
    let title = (!title.is_empty()).then_some(title);
    let snippet = oneline(&compact_plain_snippet(head, title, sutta_ref));
    format!("{} ...", truncate_chars(snippet.trim(), 250))
}

/// Move dictionary words whose headword is the query, or starts with it, to
/// the top.
fn boost_by_headword(
    headword: &str,
    results: Vec<SearchResult>,
) -> Vec<SearchResult> {
    let mut boosted = Vec::with_capacity(results.len());
    let mut starts_with = Vec::new();

    for mut result in results {
        if result.title == headword {
            result.score = Some(result.score.unwrap_or(0.0) + 1000.0);
            boosted.push(result);
        } else if result.title.starts_with(headword) {
            result.score = Some(result.score.unwrap_or(0.0) + 100.0);
            starts_with.push(result);
        } else {
            boosted.push(result);
        }
    }

    starts_with.sort_by(|a, b| b.title.cmp(&a.title));
    for (idx, result) in starts_with.iter_mut().enumerate() {
        result.score = result.score.map(|s| s + idx as f32 * 10.0);
    }

    boosted.extend(starts_with);
    boosted.sort_by(|a, b| {
        b.score
            .unwrap_or(0.0)
            .total_cmp(&a.score.unwrap_or(0.0))
    });
    boosted
}

fn extract_text(doc: &TantivyDocument, field: Field) -> String {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}
