//! Building the full-text indexes from the text databases.
//!
//! There is one sutta index and one dictionary index per language. Records
//! from both databases go into the same index, told apart by their
//! `schema_name` field.

use std::collections::{BTreeMap, BTreeSet};

use kdam::{BarExt, tqdm};
use rayon::prelude::*;

use crate::{
    corpus::{Corpus, DictWord, SchemaName, Sutta},
    data_dir::DataDir,
    error::{Error, Result},
    search_index::{IndexKind, SearchIndex},
    text_util::{compact_plain_text, compact_rich_text, remove_noindex},
};

/// Writer memory budget in bytes.
pub const WRITER_MEMORY_BUDGET: usize = 50_000_000;

/// Sutta languages which always get an index.
const REQUIRED_SUTTA_LANGS: &[&str] = &["en", "pli"];

/// Dictionary languages which always get an index.
const REQUIRED_DICT_LANGS: &[&str] = &["en"];

/// Text to index for a sutta: the citation and titles followed by the
/// content. Html is preferred over plain text. `None` when the sutta has no
/// content at all.
pub fn sutta_index_content(sutta: &Sutta) -> Option<String> {
    let body = match (&sutta.content_html, &sutta.content_plain) {
        (Some(html), _) if !html.trim().is_empty() => {
            compact_rich_text(&remove_noindex(html))
        }
        (_, Some(plain)) if !plain.trim().is_empty() => compact_plain_text(plain),
        _ => return None,
    };

    let mut parts: Vec<&str> = [
        Some(sutta.sutta_ref.as_str()),
        sutta.title.as_deref(),
        sutta.title_pali.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.is_empty())
    .collect();
    parts.push(&body);

    Some(parts.join(" "))
}

/// Text to index for a dictionary word: headword, definition, synonyms.
pub fn dict_word_index_content(word: &DictWord) -> Option<String> {
    let body = match (&word.definition_html, &word.definition_plain) {
        (Some(html), _) if !html.trim().is_empty() => compact_rich_text(html),
        (_, Some(plain)) if !plain.trim().is_empty() => compact_plain_text(plain),
        _ => return None,
    };

    let mut content = format!("{} {body}", word.word);
    if let Some(synonyms) = &word.synonyms
        && !synonyms.is_empty()
    {
        content.push(' ');
        content.push_str(synonyms);
    }

    Some(content)
}

/// Counts from an indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub suttas: usize,
    pub dict_words: usize,
}

/// The sutta and dictionary indexes of every language.
pub struct Indexes {
    suttas: BTreeMap<String, SearchIndex>,
    dict_words: BTreeMap<String, SearchIndex>,
    data_dir: Option<DataDir>,
    show_progress: bool,
}

fn index_subdirs(data_dir: &DataDir, kind: IndexKind) -> Vec<String> {
    let dir = data_dir.index_dir().join(kind.table_name());
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect()
}

fn langs_with(required: &[&str], found: Vec<String>) -> BTreeSet<String> {
    let mut langs: BTreeSet<String> =
        required.iter().map(|s| s.to_string()).collect();
    langs.extend(found.into_iter().filter(|l| !l.is_empty()));
    langs
}

impl Indexes {
    /// Open the index of every language found in the corpus or on disk,
    /// creating missing ones.
    pub fn open_all(data_dir: &DataDir, corpus: &Corpus) -> Result<Self> {
        let mut sutta_langs = corpus.sutta_languages()?;
        sutta_langs.extend(index_subdirs(data_dir, IndexKind::Suttas));
        let mut dict_langs = corpus.dict_word_languages()?;
        dict_langs.extend(index_subdirs(data_dir, IndexKind::DictWords));

        let mut suttas = BTreeMap::new();
        for lang in langs_with(REQUIRED_SUTTA_LANGS, sutta_langs) {
            let dir = data_dir.suttas_index_dir(&lang)?;
            let index = SearchIndex::open(&dir, IndexKind::Suttas, &lang)?;
            suttas.insert(lang, index);
        }

        let mut dict_words = BTreeMap::new();
        for lang in langs_with(REQUIRED_DICT_LANGS, dict_langs) {
            let dir = data_dir.dict_words_index_dir(&lang)?;
            let index = SearchIndex::open(&dir, IndexKind::DictWords, &lang)?;
            dict_words.insert(lang, index);
        }

        tracing::debug!(
            suttas = suttas.len(),
            dict_words = dict_words.len(),
            "Opened indexes"
        );

        Ok(Self {
            suttas,
            dict_words,
            data_dir: Some(data_dir.clone()),
            show_progress: false,
        })
    }

    /// In-memory indexes for the languages of the corpus.
    pub fn open_in_ram(corpus: &Corpus) -> Result<Self> {
        let mut suttas = BTreeMap::new();
        for lang in langs_with(REQUIRED_SUTTA_LANGS, corpus.sutta_languages()?) {
            let index = SearchIndex::open_in_ram(IndexKind::Suttas, &lang)?;
            suttas.insert(lang, index);
        }

        let mut dict_words = BTreeMap::new();
        for lang in langs_with(REQUIRED_DICT_LANGS, corpus.dict_word_languages()?)
        {
            let index = SearchIndex::open_in_ram(IndexKind::DictWords, &lang)?;
            dict_words.insert(lang, index);
        }

        Ok(Self {
            suttas,
            dict_words,
            data_dir: None,
            show_progress: false,
        })
    }

    /// Show a progress bar on stderr while indexing.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn sutta_index(&self, lang: &str) -> Option<&SearchIndex> {
        self.suttas.get(lang)
    }

    pub fn dict_words_index(&self, lang: &str) -> Option<&SearchIndex> {
        self.dict_words.get(lang)
    }

    /// All indexes of one kind, ordered by language.
    pub fn indexes(&self, kind: IndexKind) -> impl Iterator<Item = &SearchIndex> {
        match kind {
            IndexKind::Suttas => self.suttas.values(),
            IndexKind::DictWords => self.dict_words.values(),
        }
    }

    pub fn langs(&self, kind: IndexKind) -> Vec<&str> {
        let map = match kind {
            IndexKind::Suttas => &self.suttas,
            IndexKind::DictWords => &self.dict_words,
        };
        map.keys().map(String::as_str).collect()
    }

    /// Sutta index for `lang`, opening or creating it when missing.
    fn sutta_index_or_open(&mut self, lang: &str) -> Result<&SearchIndex> {
        if !self.suttas.contains_key(lang) {
            let index = match &self.data_dir {
                Some(dd) => SearchIndex::open(
                    &dd.suttas_index_dir(lang)?,
                    IndexKind::Suttas,
                    lang,
                )?,
                None => SearchIndex::open_in_ram(IndexKind::Suttas, lang)?,
            };
            self.suttas.insert(lang.to_string(), index);
        }
        self.suttas.get(lang).ok_or_else(|| Error::NotFound {
            kind: "sutta index",
            name: lang.to_string(),
        })
    }

    fn dict_words_index_or_open(&mut self, lang: &str) -> Result<&SearchIndex> {
        if !self.dict_words.contains_key(lang) {
            let index = match &self.data_dir {
                Some(dd) => SearchIndex::open(
                    &dd.dict_words_index_dir(lang)?,
                    IndexKind::DictWords,
                    lang,
                )?,
                None => SearchIndex::open_in_ram(IndexKind::DictWords, lang)?,
            };
            self.dict_words.insert(lang.to_string(), index);
        }
        self.dict_words.get(lang).ok_or_else(|| Error::NotFound {
            kind: "dictionary index",
            name: lang.to_string(),
        })
    }

    /// True when one of the indexes searched by default has no documents
    /// although the corpus has records in its language.
    pub fn has_empty_index(&self, corpus: &Corpus) -> Result<bool> {
        let sutta_langs = corpus.sutta_languages()?;
        for lang in REQUIRED_SUTTA_LANGS {
            if !sutta_langs.iter().any(|l| l == lang) {
                continue;
            }
            match self.suttas.get(*lang) {
                Some(index) if !index.is_empty()? => {}
                _ => return Ok(true),
            }
        }

        let dict_langs = corpus.dict_word_languages()?;
        for lang in REQUIRED_DICT_LANGS {
            if !dict_langs.iter().any(|l| l == lang) {
                continue;
            }
            match self.dict_words.get(*lang) {
                Some(index) if !index.is_empty()? => {}
                _ => return Ok(true),
            }
        }
        Ok(false)
    }

    /// Check `text` against the query syntax of one area.
    pub fn test_correct_query_syntax(
        &self,
        kind: IndexKind,
        text: &str,
    ) -> Result<()> {
        let index = self.indexes(kind).next().ok_or_else(|| Error::NotFound {
            kind: "index",
            name: kind.table_name().to_string(),
        })?;
        index.check_query_syntax(text)
    }

    /// Index every language of the corpus. With `only_if_empty`, nothing is
    /// done unless [`Self::has_empty_index`] is true.
    pub fn index_all(
        &mut self,
        corpus: &Corpus,
        only_if_empty: bool,
    ) -> Result<IndexStats> {
        if only_if_empty && !self.has_empty_index(corpus)? {
            tracing::info!("Indexes are not empty, skipping");
            return Ok(IndexStats::default());
        }

        let mut stats = IndexStats::default();
        for lang in corpus.sutta_languages()? {
            stats.suttas += self.index_suttas_lang(corpus, &lang)?;
        }
        for lang in corpus.dict_word_languages()? {
            stats.dict_words += self.index_dict_words_lang(corpus, &lang)?;
        }

        tracing::info!(
            suttas = stats.suttas,
            dict_words = stats.dict_words,
            "Indexing complete"
        );
        Ok(stats)
    }

    /// Rebuild the sutta index of one language from both databases.
    pub fn index_suttas_lang(&mut self, corpus: &Corpus, lang: &str) -> Result<usize> {
        let show_progress = self.show_progress;
        let index = self.sutta_index_or_open(lang)?;
        let suttas = corpus.suttas_by_language(lang)?;

        let prepared: Vec<(&Sutta, String)> = suttas
            .par_iter()
            .filter_map(|sutta| match sutta_index_content(sutta) {
                Some(content) => Some((sutta, content)),
                None => {
                    tracing::warn!(uid = %sutta.uid, "Sutta has no content, skipping");
                    None
                }
            })
            .collect();

        let mut writer = index.writer(WRITER_MEMORY_BUDGET)?;
        writer.delete_all_documents()?;

        let mut pb = tqdm!(
            total = prepared.len(),
            desc = format!("Indexing {lang} suttas"),
            disable = !show_progress
        );
        for (sutta, content) in &prepared {
            index.add_sutta(&writer, sutta, content)?;
            pb.update(1)?;
        }
        writer.commit()?;

        for schema in corpus.schemas() {
            let ids = ids_in_schema(prepared.iter().map(|(s, _)| (s.schema, s.id)), schema);
            corpus.set_suttas_indexed(schema, &ids)?;
        }

        tracing::info!(lang, count = prepared.len(), "Indexed suttas");
        Ok(prepared.len())
    }

    /// Rebuild the dictionary index of one language from both databases.
    pub fn index_dict_words_lang(
        &mut self,
        corpus: &Corpus,
        lang: &str,
    ) -> Result<usize> {
        let show_progress = self.show_progress;
        let index = self.dict_words_index_or_open(lang)?;
        let words = corpus.dict_words_by_language(lang)?;

        let prepared: Vec<(&DictWord, String)> = words
            .par_iter()
            .filter_map(|word| match dict_word_index_content(word) {
                Some(content) => Some((word, content)),
                None => {
                    tracing::warn!(uid = %word.uid, "Word has no definition, skipping");
                    None
                }
            })
            .collect();

        let mut writer = index.writer(WRITER_MEMORY_BUDGET)?;
        writer.delete_all_documents()?;

        let mut pb = tqdm!(
            total = prepared.len(),
            desc = format!("Indexing {lang} dictionary words"),
            disable = !show_progress
        );
        for (word, content) in &prepared {
            index.add_dict_word(&writer, word, content)?;
            pb.update(1)?;
        }
        writer.commit()?;

        for schema in corpus.schemas() {
            let ids = ids_in_schema(prepared.iter().map(|(w, _)| (w.schema, w.id)), schema);
            corpus.set_dict_words_indexed(schema, &ids)?;
        }

        tracing::info!(lang, count = prepared.len(), "Indexed dictionary words");
        Ok(prepared.len())
    }
}

fn ids_in_schema(
    records: impl Iterator<Item = (SchemaName, i64)>,
    schema: SchemaName,
) -> Vec<i64> {
    records
        .filter(|(s, _)| *s == schema)
        .map(|(_, id)| id)
        .collect()
}

impl std::fmt::Debug for Indexes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indexes")
            .field("suttas", &self.suttas.keys().collect::<Vec<_>>())
            .field("dict_words", &self.dict_words.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
