//! Loading texts and dictionaries from JSON files into a database.
//!
//! An import file holds any of the record lists below. Records that already
//! exist, by uid or label, are replaced.
//!
//! ```json
//! {
//!   "authors": [{ "uid": "sujato", "full_name": "Bhikkhu Sujato" }],
//!   "suttas": [{ "uid": "mn1/en/sujato", "sutta_ref": "MN 1", "title": "...",
//!                "content_html": "..." }],
//!   "dictionaries": [{ "label": "pts", "title": "PTS Pali-English Dictionary" }],
//!   "dict_words": [{ "source_uid": "pts", "word": "dhamma",
//!                    "definition_plain": "..." }],
//!   "multi_refs": [{ "collection": "mn", "ref_type": "pts", "ref": "M i 1",
//!                    "sutta_uid": "mn1" }]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    corpus::{Author, Corpus, DictWord, Dictionary, MultiRef, SchemaName, Sutta},
    error::Result,
};

/// The contents of one import file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportFile {
    pub authors: Vec<Author>,
    pub suttas: Vec<Sutta>,
    pub dictionaries: Vec<Dictionary>,
    pub dict_words: Vec<DictWord>,
    pub multi_refs: Vec<MultiRef>,
}

impl ImportFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Counts of imported records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub files: usize,
    pub authors: usize,
    pub suttas: usize,
    pub dictionaries: usize,
    pub dict_words: usize,
    pub multi_refs: usize,
}

impl ImportStats {
    fn add(&mut self, other: ImportStats) {
        self.files += other.files;
        self.authors += other.authors;
        self.suttas += other.suttas;
        self.dictionaries += other.dictionaries;
        self.dict_words += other.dict_words;
        self.multi_refs += other.multi_refs;
    }
}

/// Write the records of one file in a single transaction. Dictionaries go
/// in before their words.
pub fn import_records(
    corpus: &mut Corpus,
    schema: SchemaName,
    records: &ImportFile,
) -> Result<ImportStats> {
    let writer = corpus.writer(schema)?;

    for author in &records.authors {
        writer.insert_author(author)?;
    }
    for sutta in &records.suttas {
        writer.insert_sutta(sutta)?;
    }
    for dictionary in &records.dictionaries {
        writer.insert_dictionary(dictionary)?;
    }
    for word in &records.dict_words {
        writer.insert_dict_word(word)?;
    }
    for multi_ref in &records.multi_refs {
        writer.insert_multi_ref(multi_ref)?;
    }

    writer.commit()?;

    Ok(ImportStats {
        files: 1,
        authors: records.authors.len(),
        suttas: records.suttas.len(),
        dictionaries: records.dictionaries.len(),
        dict_words: records.dict_words.len(),
        multi_refs: records.multi_refs.len(),
    })
}

/// JSON files to import: the path itself, or the `.json` files found under
/// a directory, sorted by path.
pub fn discover_import_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut results = Vec::new();
    walk_dir(path, &mut results)?;
    results.sort();
    Ok(results)
}

fn walk_dir(current: &Path, results: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk_dir(&path, results)?;
        } else if path.extension().is_some_and(|e| e == "json") {
            results.push(path);
        }
    }
    Ok(())
}

/// Import a file or a directory of files. Each file is its own
/// transaction, so a bad file leaves the earlier ones in place.
pub fn import_path(
    corpus: &mut Corpus,
    schema: SchemaName,
    path: &Path,
) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    for file in discover_import_files(path)? {
        tracing::info!(path = %file.display(), %schema, "Importing");
        let records = ImportFile::from_path(&file)?;
        stats.add(import_records(corpus, schema, &records)?);
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "authors": [{ "uid": "sujato", "full_name": "Bhikkhu Sujato" }],
        "suttas": [{
            "uid": "mn1/en/sujato",
            "sutta_ref": "MN 1",
            "title": "The Root of All Things",
            "content_plain": "So I have heard."
        }],
        "dictionaries": [{ "label": "PTS", "title": "PTS Pali-English Dictionary" }],
        "dict_words": [{
            "source_uid": "pts",
            "word": "dhamma",
            "definition_plain": "nature, norm"
        }],
        "multi_refs": [{
            "collection": "mn",
            "ref_type": "pts",
            "ref": "M i 1",
            "sutta_uid": "mn1"
        }]
    }"#;

    #[test]
    fn import_sample_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sample.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let mut corpus = Corpus::open_in_memory().unwrap();
        let stats = import_path(&mut corpus, SchemaName::AppData, &path).unwrap();

        assert_eq!(stats.files, 1);
        assert_eq!(stats.suttas, 1);
        assert_eq!(stats.dict_words, 1);

        let suttas = corpus.suttas_by_uid("mn1/en/sujato").unwrap();
        assert_eq!(suttas.len(), 1);
        assert_eq!(suttas[0].source_uid, "sujato");
        assert_eq!(suttas[0].nikaya, "mn");

        let words = corpus.dict_words_by_language("en").unwrap();
        assert_eq!(words[0].word, "dhamma");
        assert_eq!(corpus.dictionary_labels().unwrap(), vec!["pts"]);
        assert_eq!(corpus.authors().unwrap()[0].uid, "sujato");
        assert_eq!(corpus.multi_refs_by_collection("mn").unwrap().len(), 1);
    }

    #[test]
    fn reimport_replaces() {
        let mut corpus = Corpus::open_in_memory().unwrap();
        let mut records: ImportFile = serde_json::from_str(SAMPLE).unwrap();
        import_records(&mut corpus, SchemaName::UserData, &records).unwrap();

        records.suttas[0].title = Some("The Root Sequence".into());
        records.multi_refs.clear();
        import_records(&mut corpus, SchemaName::UserData, &records).unwrap();

        let suttas = corpus.suttas_by_uid("mn1/en/sujato").unwrap();
        assert_eq!(suttas.len(), 1);
        assert_eq!(suttas[0].title.as_deref(), Some("The Root Sequence"));
        assert_eq!(suttas[0].schema, SchemaName::UserData);
    }

    #[test]
    fn word_without_dictionary_fails() {
        let mut corpus = Corpus::open_in_memory().unwrap();
        let records = ImportFile {
            dict_words: vec![DictWord {
                source_uid: "nope".into(),
                word: "dhamma".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(import_records(&mut corpus, SchemaName::AppData, &records).is_err());
        assert_eq!(corpus.count_dict_words(None).unwrap(), 0);
    }

    #[test]
    fn directory_files_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        std::fs::write(tmp.path().join("b.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("sub/a.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "").unwrap();
        std::fs::write(tmp.path().join(".hidden.json"), "{}").unwrap();

        let files = discover_import_files(tmp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("b.json"), PathBuf::from("sub/a.json")]);
    }
}
