//! SQLite storage for suttas, dictionaries and cross references.
//!
//! The corpus is split across two database files with the same schema:
//! `appdata` holds the bundled texts and `userdata` holds texts imported by
//! the user. Every read runs against each attached schema in turn, appdata
//! first, and concatenates the results.

use std::{fmt, path::Path, str::FromStr};

use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    sutta_ref,
};

pub const SCHEMA_VERSION: i32 = 1;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS authors (
    id INTEGER PRIMARY KEY,
    uid TEXT NOT NULL UNIQUE,
    full_name TEXT,
    description TEXT
);

CREATE TABLE IF NOT EXISTS suttas (
    id INTEGER PRIMARY KEY,
    uid TEXT NOT NULL UNIQUE,
    sutta_ref TEXT NOT NULL DEFAULT '',
    nikaya TEXT NOT NULL DEFAULT '',
    language TEXT NOT NULL,
    source_uid TEXT NOT NULL DEFAULT '',
    title TEXT,
    title_pali TEXT,
    title_trans TEXT,
    description TEXT,
    content_plain TEXT,
    content_html TEXT,
    sutta_range_group TEXT,
    sutta_range_start INTEGER,
    sutta_range_end INTEGER,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    indexed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_suttas_language ON suttas(language);

CREATE TABLE IF NOT EXISTS dictionaries (
    id INTEGER PRIMARY KEY,
    label TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    creator TEXT,
    description TEXT
);

CREATE TABLE IF NOT EXISTS dict_words (
    id INTEGER PRIMARY KEY,
    dictionary_id INTEGER NOT NULL REFERENCES dictionaries(id) ON DELETE CASCADE,
    uid TEXT NOT NULL UNIQUE,
    source_uid TEXT NOT NULL DEFAULT '',
    language TEXT NOT NULL DEFAULT 'en',
    word TEXT NOT NULL,
    word_ascii TEXT NOT NULL DEFAULT '',
    definition_plain TEXT,
    definition_html TEXT,
    summary TEXT,
    synonyms TEXT,
    antonyms TEXT,
    see_also TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    indexed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_dict_words_language ON dict_words(language);

CREATE TABLE IF NOT EXISTS multi_refs (
    id INTEGER PRIMARY KEY,
    collection TEXT NOT NULL,
    ref_type TEXT NOT NULL DEFAULT '',
    ref TEXT NOT NULL,
    sutta_uid TEXT,
    edition TEXT
);

CREATE INDEX IF NOT EXISTS idx_multi_refs_sutta_uid ON multi_refs(sutta_uid);
";

const SUTTA_COLUMNS: &str = "id, uid, sutta_ref, nikaya, language, source_uid, \
    title, title_pali, title_trans, description, content_plain, content_html";

const DICT_WORD_COLUMNS: &str = "id, dictionary_id, uid, source_uid, language, \
    word, word_ascii, definition_plain, definition_html, summary, synonyms, \
    antonyms, see_also";

const MULTI_REF_COLUMNS: &str =
    "id, collection, ref_type, ref, sutta_uid, edition";

/// Which database file a record lives in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SchemaName {
    #[default]
    AppData,
    UserData,
}

impl SchemaName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppData => "appdata",
            Self::UserData => "userdata",
        }
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "appdata" => Ok(Self::AppData),
            "userdata" => Ok(Self::UserData),
            other => Err(Error::Config(format!("unknown schema: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    #[serde(skip)]
    pub id: i64,
    pub uid: String,
    pub full_name: Option<String>,
    pub description: Option<String>,
}

/// A discourse text in one language and translation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sutta {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub schema: SchemaName,
    /// `ref/language/source`, e.g. `mn44/en/sujato`.
    pub uid: String,
    /// Display citation, e.g. `MN 44`.
    pub sutta_ref: String,
    pub nikaya: String,
    pub language: String,
    pub source_uid: String,
    pub title: Option<String>,
    pub title_pali: Option<String>,
    pub title_trans: Option<String>,
    pub description: Option<String>,
    pub content_plain: Option<String>,
    pub content_html: Option<String>,
}

impl Sutta {
    /// The reference part of the uid, `mn44` for `mn44/en/sujato`.
    pub fn uid_ref(&self) -> &str {
        self.uid.split('/').next().unwrap_or(&self.uid)
    }

    /// The content as plain text, from the HTML when there is no plain
    /// version.
    pub fn plain_content(&self) -> String {
        match (&self.content_plain, &self.content_html) {
            (Some(plain), _) if !plain.trim().is_empty() => plain.trim().to_string(),
            (_, Some(html)) => crate::text_util::strip_html(html),
            _ => String::new(),
        }
    }

    /// Fill in the fields derived from the uid when an import left them
    /// empty.
    pub fn fill_derived(&mut self) {
        let parts: Vec<&str> = self.uid.split('/').collect();
        if self.language.is_empty()
            && let Some(lang) = parts.get(1)
        {
            self.language = (*lang).to_string();
        }
        if self.source_uid.is_empty()
            && let Some(source) = parts.get(2)
        {
            self.source_uid = (*source).to_string();
        }
        if self.nikaya.is_empty() {
            self.nikaya = nikaya_of(self.uid_ref());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dictionary {
    #[serde(skip)]
    pub id: i64,
    /// Short lowercase name used in word uids, e.g. `pts`.
    pub label: String,
    pub title: String,
    pub creator: Option<String>,
    pub description: Option<String>,
}

/// A dictionary entry. `source_uid` is the label of its dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictWord {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub schema: SchemaName,
    #[serde(skip)]
    pub dictionary_id: i64,
    pub uid: String,
    pub source_uid: String,
    pub language: String,
    pub word: String,
    pub word_ascii: String,
    pub definition_plain: Option<String>,
    pub definition_html: Option<String>,
    pub summary: Option<String>,
    pub synonyms: Option<String>,
    pub antonyms: Option<String>,
    pub see_also: Option<String>,
}

/// A citation of a sutta in another edition or numbering system.
///
/// `ref_text` may hold several comma-separated references, and PTS
/// references may be page ranges: `dn i 1-46`, `an i 77.1 - i 80.1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiRef {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub schema: SchemaName,
    pub collection: String,
    pub ref_type: String,
    #[serde(rename = "ref")]
    pub ref_text: String,
    pub sutta_uid: Option<String>,
    pub edition: Option<String>,
}

/// Collection prefix of a uid ref: `sn` for `sn12.55`, `pli-tv-bu-vb-pj` for
/// `pli-tv-bu-vb-pj1`.
pub fn nikaya_of(uid_ref: &str) -> String {
    uid_ref
        .chars()
        .take_while(|c| c.is_ascii_alphabetic() || *c == '-')
        .collect::<String>()
        .trim_end_matches('-')
        .to_string()
}

/// Escape a literal for use in a `LIKE ... ESCAPE '\'` pattern.
pub fn like_escape(text: &str) -> String {
    let mut s = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            s.push('\\');
        }
        s.push(c);
    }
    s
}

fn sutta_from_row(row: &Row<'_>, schema: SchemaName) -> rusqlite::Result<Sutta> {
    Ok(Sutta {
        id: row.get(0)?,
        schema,
        uid: row.get(1)?,
        sutta_ref: row.get(2)?,
        nikaya: row.get(3)?,
        language: row.get(4)?,
        source_uid: row.get(5)?,
        title: row.get(6)?,
        title_pali: row.get(7)?,
        title_trans: row.get(8)?,
        description: row.get(9)?,
        content_plain: row.get(10)?,
        content_html: row.get(11)?,
    })
}

fn dict_word_from_row(
    row: &Row<'_>,
    schema: SchemaName,
) -> rusqlite::Result<DictWord> {
    Ok(DictWord {
        id: row.get(0)?,
        schema,
        dictionary_id: row.get(1)?,
        uid: row.get(2)?,
        source_uid: row.get(3)?,
        language: row.get(4)?,
        word: row.get(5)?,
        word_ascii: row.get(6)?,
        definition_plain: row.get(7)?,
        definition_html: row.get(8)?,
        summary: row.get(9)?,
        synonyms: row.get(10)?,
        antonyms: row.get(11)?,
        see_also: row.get(12)?,
    })
}

fn multi_ref_from_row(
    row: &Row<'_>,
    schema: SchemaName,
) -> rusqlite::Result<MultiRef> {
    Ok(MultiRef {
        id: row.get(0)?,
        schema,
        collection: row.get(1)?,
        ref_type: row.get(2)?,
        ref_text: row.get(3)?,
        sutta_uid: row.get(4)?,
        edition: row.get(5)?,
    })
}

fn initialize_schema(conn: &Connection, schema: SchemaName) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    let has_version: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    let version: i32 = if has_version {
        conn.query_row("SELECT version FROM schema_version WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()?
        .unwrap_or(0)
    } else {
        0
    };

    if version < SCHEMA_VERSION {
        info!(%schema, version = SCHEMA_VERSION, "initializing corpus schema");
        conn.execute_batch(SCHEMA_SQL)?;
        conn.execute(
            "INSERT OR REPLACE INTO schema_version (id, version, updated_at) \
             VALUES (1, ?1, datetime('now'))",
            [SCHEMA_VERSION],
        )?;
    } else {
        debug!(%schema, version, "corpus schema is up to date");
    }

    Ok(())
}

/// The attached corpus databases.
pub struct Corpus {
    dbs: Vec<(SchemaName, Connection)>,
}

impl Corpus {
    /// Open (creating if needed) the given database files. Schemas are
    /// queried in the order given.
    pub fn open(files: &[(SchemaName, &Path)]) -> Result<Self> {
        let mut dbs = Vec::with_capacity(files.len());
        for (schema, path) in files {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            debug!(%schema, path = %path.display(), "opening corpus database");
            let conn = Connection::open(path)?;
            initialize_schema(&conn, *schema)?;
            dbs.push((*schema, conn));
        }
        Ok(Self { dbs })
    }

    /// Open the appdata and userdata databases of a data directory.
    pub fn open_data_dir(data_dir: &crate::data_dir::DataDir) -> Result<Self> {
        Self::open(&[
            (SchemaName::AppData, data_dir.appdata_db().as_path()),
            (SchemaName::UserData, data_dir.userdata_db().as_path()),
        ])
    }

    /// Both schemas in memory, for tests.
    pub fn open_in_memory() -> Result<Self> {
        let mut dbs = Vec::new();
        for schema in [SchemaName::AppData, SchemaName::UserData] {
            let conn = Connection::open_in_memory()?;
            initialize_schema(&conn, schema)?;
            dbs.push((schema, conn));
        }
        Ok(Self { dbs })
    }

    pub fn schemas(&self) -> impl Iterator<Item = SchemaName> + '_ {
        self.dbs.iter().map(|(schema, _)| *schema)
    }

    fn conn(&self, schema: SchemaName) -> Result<&Connection> {
        self.dbs
            .iter()
            .find(|(s, _)| *s == schema)
            .map(|(_, conn)| conn)
            .ok_or_else(|| Error::NotFound {
                kind: "schema",
                name: schema.to_string(),
            })
    }

    /// Start a write transaction on one schema.
    pub fn writer(&mut self, schema: SchemaName) -> Result<CorpusWriter<'_>> {
        let conn = self
            .dbs
            .iter_mut()
            .find(|(s, _)| *s == schema)
            .map(|(_, conn)| conn)
            .ok_or_else(|| Error::NotFound {
                kind: "schema",
                name: schema.to_string(),
            })?;
        Ok(CorpusWriter {
            tx: conn.transaction()?,
            schema,
        })
    }

    fn query_suttas(
        &self,
        where_clause: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Sutta>> {
        let sql = format!(
            "SELECT {SUTTA_COLUMNS} FROM suttas WHERE {where_clause} ORDER BY id"
        );
        let mut result = Vec::new();
        for (schema, conn) in &self.dbs {
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params, |row| sutta_from_row(row, *schema))?;
            for row in rows {
                result.push(row?);
            }
        }
        Ok(result)
    }

    fn query_dict_words(
        &self,
        where_clause: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<DictWord>> {
        let sql = format!(
            "SELECT {DICT_WORD_COLUMNS} FROM dict_words WHERE {where_clause} ORDER BY id"
        );
        let mut result = Vec::new();
        for (schema, conn) in &self.dbs {
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows =
                stmt.query_map(params, |row| dict_word_from_row(row, *schema))?;
            for row in rows {
                result.push(row?);
            }
        }
        Ok(result)
    }

    fn query_multi_refs(
        &self,
        where_clause: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<MultiRef>> {
        let sql = format!(
            "SELECT {MULTI_REF_COLUMNS} FROM multi_refs WHERE {where_clause} ORDER BY id"
        );
        let mut result = Vec::new();
        for (schema, conn) in &self.dbs {
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows =
                stmt.query_map(params, |row| multi_ref_from_row(row, *schema))?;
            for row in rows {
                result.push(row?);
            }
        }
        Ok(result)
    }

    fn distinct_strings(&self, sql: &str) -> Result<Vec<String>> {
        let mut result: Vec<String> = Vec::new();
        for (_, conn) in &self.dbs {
            let mut stmt = conn.prepare_cached(sql)?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            for row in rows {
                let value = row?;
                if !value.is_empty() && !result.contains(&value) {
                    result.push(value);
                }
            }
        }
        result.sort();
        Ok(result)
    }

    // -- Suttas --

    pub fn suttas_by_uid(&self, uid: &str) -> Result<Vec<Sutta>> {
        self.query_suttas("uid = ?1", &[&uid])
    }

    /// Suttas whose uid starts with `prefix`.
    pub fn suttas_by_uid_prefix(&self, prefix: &str) -> Result<Vec<Sutta>> {
        let pattern = format!("{}%", like_escape(prefix));
        self.query_suttas("uid LIKE ?1 ESCAPE '\\'", &[&pattern])
    }

    /// Suttas whose uid matches a raw `LIKE` pattern.
    pub fn suttas_by_uid_like(&self, pattern: &str) -> Result<Vec<Sutta>> {
        self.query_suttas("uid LIKE ?1", &[&pattern])
    }

    pub fn suttas_content_like(&self, text: &str) -> Result<Vec<Sutta>> {
        let pattern = format!("%{}%", like_escape(text));
        self.query_suttas(
            "content_plain LIKE ?1 ESCAPE '\\' OR content_html LIKE ?1 ESCAPE '\\'",
            &[&pattern],
        )
    }

    pub fn suttas_title_like(&self, pattern: &str) -> Result<Vec<Sutta>> {
        self.query_suttas(
            "title LIKE ?1 ESCAPE '\\' OR title_pali LIKE ?1 ESCAPE '\\' \
             OR title_trans LIKE ?1 ESCAPE '\\'",
            &[&pattern],
        )
    }

    pub fn suttas_by_language(&self, lang: &str) -> Result<Vec<Sutta>> {
        self.query_suttas("language = ?1", &[&lang])
    }

    /// Every sutta, optionally limited to one language.
    pub fn all_suttas(&self, lang: Option<&str>) -> Result<Vec<Sutta>> {
        match lang {
            Some(lang) => self.suttas_by_language(lang),
            None => self.query_suttas("1 = 1", &[]),
        }
    }

    pub fn sutta_by_id(&self, schema: SchemaName, id: i64) -> Result<Option<Sutta>> {
        let sql = format!("SELECT {SUTTA_COLUMNS} FROM suttas WHERE id = ?1");
        let conn = self.conn(schema)?;
        Ok(conn
            .query_row(&sql, [id], |row| sutta_from_row(row, schema))
            .optional()?)
    }

    pub fn set_suttas_indexed(&self, schema: SchemaName, ids: &[i64]) -> Result<()> {
        self.set_indexed_at(schema, "suttas", ids)
    }

    pub fn set_dict_words_indexed(
        &self,
        schema: SchemaName,
        ids: &[i64],
    ) -> Result<()> {
        self.set_indexed_at(schema, "dict_words", ids)
    }

    fn set_indexed_at(
        &self,
        schema: SchemaName,
        table: &str,
        ids: &[i64],
    ) -> Result<()> {
        let conn = self.conn(schema)?;
        let tx = conn.unchecked_transaction()?;
        {
            let sql =
                format!("UPDATE {table} SET indexed_at = datetime('now') WHERE id = ?1");
            let mut stmt = tx.prepare(&sql)?;
            for id in ids {
                stmt.execute([id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // -- Multi refs --

    pub fn multi_refs_like(&self, ref_text: &str) -> Result<Vec<MultiRef>> {
        let pattern = format!("%{}%", like_escape(ref_text));
        self.query_multi_refs("ref LIKE ?1 ESCAPE '\\'", &[&pattern])
    }

    pub fn multi_refs_by_collection(
        &self,
        collection: &str,
    ) -> Result<Vec<MultiRef>> {
        self.query_multi_refs("collection = ?1", &[&collection])
    }

    /// The suttas a cross reference points at, in every language.
    pub fn suttas_for_multi_ref(&self, multi_ref: &MultiRef) -> Result<Vec<Sutta>> {
        match &multi_ref.sutta_uid {
            Some(uid) if !uid.is_empty() => {
                self.suttas_by_uid_prefix(&format!("{uid}/"))
            }
            _ => Ok(Vec::new()),
        }
    }

    // -- Dictionary words --

    pub fn dict_words_by_language(&self, lang: &str) -> Result<Vec<DictWord>> {
        self.query_dict_words("language = ?1", &[&lang])
    }

    pub fn all_dict_words(&self, lang: Option<&str>) -> Result<Vec<DictWord>> {
        match lang {
            Some(lang) => self.dict_words_by_language(lang),
            None => self.query_dict_words("1 = 1", &[]),
        }
    }

    pub fn dict_words_by_uid(&self, uid: &str) -> Result<Vec<DictWord>> {
        self.query_dict_words("uid = ?1", &[&uid])
    }

    /// Words whose headword (or its ASCII form) matches a `LIKE` pattern.
    pub fn dict_words_headword_like(&self, pattern: &str) -> Result<Vec<DictWord>> {
        self.query_dict_words(
            "word LIKE ?1 ESCAPE '\\' OR word_ascii LIKE ?1 ESCAPE '\\'",
            &[&pattern],
        )
    }

    pub fn dict_words_definition_like(&self, text: &str) -> Result<Vec<DictWord>> {
        let pattern = format!("%{}%", like_escape(text));
        self.query_dict_words(
            "definition_plain LIKE ?1 ESCAPE '\\' OR definition_html LIKE ?1 ESCAPE '\\'",
            &[&pattern],
        )
    }

    pub fn dict_word_by_id(
        &self,
        schema: SchemaName,
        id: i64,
    ) -> Result<Option<DictWord>> {
        let sql = format!("SELECT {DICT_WORD_COLUMNS} FROM dict_words WHERE id = ?1");
        let conn = self.conn(schema)?;
        Ok(conn
            .query_row(&sql, [id], |row| dict_word_from_row(row, schema))
            .optional()?)
    }

    // -- Listings --

    pub fn sutta_languages(&self) -> Result<Vec<String>> {
        self.distinct_strings("SELECT DISTINCT language FROM suttas")
    }

    pub fn dict_word_languages(&self) -> Result<Vec<String>> {
        self.distinct_strings("SELECT DISTINCT language FROM dict_words")
    }

    pub fn sutta_source_labels(&self) -> Result<Vec<String>> {
        self.distinct_strings("SELECT DISTINCT source_uid FROM suttas")
    }

    pub fn dictionary_labels(&self) -> Result<Vec<String>> {
        self.distinct_strings("SELECT label FROM dictionaries")
    }

    pub fn authors(&self) -> Result<Vec<Author>> {
        let mut result = Vec::new();
        for (_, conn) in &self.dbs {
            let mut stmt = conn.prepare_cached(
                "SELECT id, uid, full_name, description FROM authors ORDER BY uid",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Author {
                    id: row.get(0)?,
                    uid: row.get(1)?,
                    full_name: row.get(2)?,
                    description: row.get(3)?,
                })
            })?;
            for row in rows {
                result.push(row?);
            }
        }
        Ok(result)
    }

    fn count(&self, table: &str, lang: Option<&str>) -> Result<u64> {
        let mut total = 0u64;
        for (_, conn) in &self.dbs {
            let n: i64 = match lang {
                Some(lang) => conn.query_row(
                    &format!("SELECT COUNT(*) FROM {table} WHERE language = ?1"),
                    [lang],
                    |row| row.get(0),
                )?,
                None => conn.query_row(
                    &format!("SELECT COUNT(*) FROM {table}"),
                    [],
                    |row| row.get(0),
                )?,
            };
            total += n.max(0) as u64;
        }
        Ok(total)
    }

    pub fn count_suttas(&self, lang: Option<&str>) -> Result<u64> {
        self.count("suttas", lang)
    }

    pub fn count_dict_words(&self, lang: Option<&str>) -> Result<u64> {
        self.count("dict_words", lang)
    }
}

impl fmt::Debug for Corpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Corpus")
            .field("schemas", &self.schemas().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// A write transaction on one schema. Nothing is visible to readers until
/// [`CorpusWriter::commit`].
pub struct CorpusWriter<'c> {
    tx: Transaction<'c>,
    schema: SchemaName,
}

impl CorpusWriter<'_> {
    pub fn schema(&self) -> SchemaName {
        self.schema
    }

    pub fn insert_author(&self, author: &Author) -> Result<i64> {
        let id = self.tx.query_row(
            "INSERT INTO authors (uid, full_name, description) VALUES (?1, ?2, ?3)
             ON CONFLICT(uid) DO UPDATE SET
                full_name = excluded.full_name,
                description = excluded.description
             RETURNING id",
            params![author.uid, author.full_name, author.description],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Insert or replace a sutta by uid. Returns its row id.
    pub fn insert_sutta(&self, sutta: &Sutta) -> Result<i64> {
        let mut sutta = sutta.clone();
        sutta.fill_derived();

        if sutta.uid.split('/').count() != 3 || sutta.language.is_empty() {
            return Err(Error::Config(format!(
                "sutta uid must be ref/language/source: {}",
                sutta.uid
            )));
        }

        let range = sutta_ref::sutta_range_from_ref(sutta.uid_ref());

        let id = self.tx.query_row(
            "INSERT INTO suttas (uid, sutta_ref, nikaya, language, source_uid,
                title, title_pali, title_trans, description, content_plain,
                content_html, sutta_range_group, sutta_range_start, sutta_range_end)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(uid) DO UPDATE SET
                sutta_ref = excluded.sutta_ref,
                nikaya = excluded.nikaya,
                language = excluded.language,
                source_uid = excluded.source_uid,
                title = excluded.title,
                title_pali = excluded.title_pali,
                title_trans = excluded.title_trans,
                description = excluded.description,
                content_plain = excluded.content_plain,
                content_html = excluded.content_html,
                sutta_range_group = excluded.sutta_range_group,
                sutta_range_start = excluded.sutta_range_start,
                sutta_range_end = excluded.sutta_range_end,
                indexed_at = NULL
             RETURNING id",
            params![
                sutta.uid,
                sutta.sutta_ref,
                sutta.nikaya,
                sutta.language,
                sutta.source_uid,
                sutta.title,
                sutta.title_pali,
                sutta.title_trans,
                sutta.description,
                sutta.content_plain,
                sutta.content_html,
                range.as_ref().map(|r| r.group.clone()),
                range.as_ref().and_then(|r| r.start),
                range.as_ref().and_then(|r| r.end),
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn insert_dictionary(&self, dictionary: &Dictionary) -> Result<i64> {
        let id = self.tx.query_row(
            "INSERT INTO dictionaries (label, title, creator, description)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(label) DO UPDATE SET
                title = excluded.title,
                creator = excluded.creator,
                description = excluded.description
             RETURNING id",
            params![
                dictionary.label.to_lowercase(),
                dictionary.title,
                dictionary.creator,
                dictionary.description
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Insert or replace a word by uid. Its dictionary is looked up by
    /// `source_uid` and must already exist in this schema.
    pub fn insert_dict_word(&self, word: &DictWord) -> Result<i64> {
        let label = word.source_uid.to_lowercase();
        let dictionary_id: i64 = self
            .tx
            .query_row(
                "SELECT id FROM dictionaries WHERE label = ?1",
                [&label],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| Error::NotFound {
                kind: "dictionary",
                name: label.clone(),
            })?;

        let uid = if word.uid.is_empty() {
            crate::text_util::word_uid(
                &crate::text_util::word_uid_sanitize(&word.word),
                &label,
            )
        } else {
            word.uid.clone()
        };
        let word_ascii = if word.word_ascii.is_empty() {
            crate::text_util::pali_to_ascii(Some(&word.word))
        } else {
            word.word_ascii.clone()
        };
        let language = if word.language.is_empty() {
            "en".to_string()
        } else {
            word.language.clone()
        };

        let id = self.tx.query_row(
            "INSERT INTO dict_words (dictionary_id, uid, source_uid, language,
                word, word_ascii, definition_plain, definition_html, summary,
                synonyms, antonyms, see_also)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(uid) DO UPDATE SET
                dictionary_id = excluded.dictionary_id,
                source_uid = excluded.source_uid,
                language = excluded.language,
                word = excluded.word,
                word_ascii = excluded.word_ascii,
                definition_plain = excluded.definition_plain,
                definition_html = excluded.definition_html,
                summary = excluded.summary,
                synonyms = excluded.synonyms,
                antonyms = excluded.antonyms,
                see_also = excluded.see_also,
                indexed_at = NULL
             RETURNING id",
            params![
                dictionary_id,
                uid,
                label,
                language,
                word.word,
                word_ascii,
                word.definition_plain,
                word.definition_html,
                word.summary,
                word.synonyms,
                word.antonyms,
                word.see_also,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn insert_multi_ref(&self, multi_ref: &MultiRef) -> Result<i64> {
        self.tx.execute(
            "INSERT INTO multi_refs (collection, ref_type, ref, sutta_uid, edition)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                multi_ref.collection.to_lowercase(),
                multi_ref.ref_type,
                sutta_ref::normalize_sutta_ref(&multi_ref.ref_text),
                multi_ref.sutta_uid,
                multi_ref.edition,
            ],
        )?;
        Ok(self.tx.last_insert_rowid())
    }

    pub fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sutta(uid: &str, title: &str, content: &str) -> Sutta {
        Sutta {
            uid: uid.to_string(),
            sutta_ref: uid
                .split('/')
                .next()
                .unwrap_or_default()
                .to_uppercase(),
            title: Some(title.to_string()),
            content_plain: Some(content.to_string()),
            ..Default::default()
        }
    }

    /// A small corpus used across module tests.
    pub(crate) fn test_corpus() -> Corpus {
        let mut corpus = Corpus::open_in_memory().unwrap();
        let w = corpus.writer(SchemaName::AppData).unwrap();
        for s in [
            sutta(
                "mn1/pli/ms",
                "Mūlapariyāyasutta",
                "Evaṁ me sutaṁ. Ekaṁ samayaṁ bhagavā ukkaṭṭhāyaṁ viharati.",
            ),
            sutta(
                "mn1/en/sujato",
                "The Root of All Things",
                "So I have heard. At one time the Buddha was staying near Ukkaṭṭhā.",
            ),
            sutta(
                "mn2/en/sujato",
                "All the Defilements",
                "So I have heard. At one time the Buddha was staying near Sāvatthī.",
            ),
            sutta(
                "sn56.11/en/sujato",
                "Rolling Forth the Wheel of Dhamma",
                "These two extremes should not be cultivated by one who has gone forth.",
            ),
            sutta(
                "sn56.12/en/sujato",
                "The Realized One",
                "This is the noble truth of suffering. Such was the vision that arose.",
            ),
            sutta(
                "dhp179-196/en/sujato",
                "Buddhas",
                "Rare is birth as a human being. Rare is the arising of Buddhas.",
            ),
        ] {
            w.insert_sutta(&s).unwrap();
        }

        w.insert_dictionary(&Dictionary {
            label: "pts".into(),
            title: "PTS Pali-English Dictionary".into(),
            ..Default::default()
        })
        .unwrap();
        for (word, def) in [
            ("dhamma 1", "nature, condition, quality"),
            ("dhamma 2", "the teaching of the Buddha"),
            ("dhammakāya", "the body of the teaching"),
            ("sadhamma", "the true teaching"),
        ] {
            w.insert_dict_word(&DictWord {
                word: word.into(),
                source_uid: "pts".into(),
                definition_plain: Some(def.into()),
                ..Default::default()
            })
            .unwrap();
        }

        w.insert_multi_ref(&MultiRef {
            collection: "mn".into(),
            ref_type: "pts".into(),
            ref_text: "mn i 1-6".into(),
            sutta_uid: Some("mn1".into()),
            ..Default::default()
        })
        .unwrap();
        w.insert_multi_ref(&MultiRef {
            collection: "sn".into(),
            ref_type: "pts".into(),
            ref_text: "sn v 420, sn v 421".into(),
            sutta_uid: Some("sn56.11".into()),
            ..Default::default()
        })
        .unwrap();
        w.commit().unwrap();

        let w = corpus.writer(SchemaName::UserData).unwrap();
        w.insert_sutta(&sutta(
            "mn1/en/thanissaro",
            "The Root Sequence",
            "I have heard that on one occasion the Blessed One was staying in Ukkaṭṭhā.",
        ))
        .unwrap();
        w.commit().unwrap();

        corpus
    }

    #[test]
    fn reads_span_schemas_in_order() {
        let corpus = test_corpus();
        let suttas = corpus.suttas_by_uid_prefix("mn1/").unwrap();
        let uids: Vec<_> = suttas.iter().map(|s| s.uid.as_str()).collect();
        assert_eq!(uids, ["mn1/pli/ms", "mn1/en/sujato", "mn1/en/thanissaro"]);
        assert_eq!(suttas[2].schema, SchemaName::UserData);
    }

    #[test]
    fn derived_fields_are_filled() {
        let corpus = test_corpus();
        let s = &corpus.suttas_by_uid("sn56.11/en/sujato").unwrap()[0];
        assert_eq!(s.language, "en");
        assert_eq!(s.source_uid, "sujato");
        assert_eq!(s.nikaya, "sn");
        assert_eq!(s.uid_ref(), "sn56.11");
    }

    #[test]
    fn insert_replaces_by_uid() {
        let mut corpus = test_corpus();
        let before = corpus.count_suttas(None).unwrap();

        let w = corpus.writer(SchemaName::AppData).unwrap();
        w.insert_sutta(&sutta("mn2/en/sujato", "All the Defilements", "updated"))
            .unwrap();
        w.commit().unwrap();

        assert_eq!(corpus.count_suttas(None).unwrap(), before);
        let s = &corpus.suttas_by_uid("mn2/en/sujato").unwrap()[0];
        assert_eq!(s.content_plain.as_deref(), Some("updated"));
    }

    #[test]
    fn incomplete_uid_is_rejected() {
        let mut corpus = Corpus::open_in_memory().unwrap();
        let w = corpus.writer(SchemaName::AppData).unwrap();
        assert!(w.insert_sutta(&sutta("mn1", "x", "y")).is_err());
    }

    #[test]
    fn prefix_match_escapes_like_wildcards() {
        let corpus = test_corpus();
        assert!(corpus.suttas_by_uid_prefix("mn_/").unwrap().is_empty());
        assert_eq!(corpus.suttas_by_uid_like("mn_/%").unwrap().len(), 4);
    }

    #[test]
    fn content_and_title_like() {
        let corpus = test_corpus();
        let hits = corpus.suttas_content_like("two extremes").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].uid, "sn56.11/en/sujato");

        let hits = corpus.suttas_title_like("%wheel%").unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn dict_words_get_uids_and_ascii() {
        let corpus = test_corpus();
        let words = corpus.dict_words_headword_like("dhammakaya").unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].uid, "dhammakāya/pts");
        assert_eq!(words[0].word_ascii, "dhammakaya");

        let words = corpus.dict_words_by_uid("dhamma-1/pts").unwrap();
        assert_eq!(words.len(), 1);
    }

    #[test]
    fn dict_word_needs_dictionary() {
        let mut corpus = Corpus::open_in_memory().unwrap();
        let w = corpus.writer(SchemaName::AppData).unwrap();
        let err = w
            .insert_dict_word(&DictWord {
                word: "x".into(),
                source_uid: "nope".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "dictionary", .. }));
    }

    #[test]
    fn multi_refs_point_at_suttas() {
        let corpus = test_corpus();
        let refs = corpus.multi_refs_like("sn v 420").unwrap();
        assert_eq!(refs.len(), 1);
        let suttas = corpus.suttas_for_multi_ref(&refs[0]).unwrap();
        assert_eq!(suttas.len(), 1);
        assert_eq!(suttas[0].uid, "sn56.11/en/sujato");
    }

    #[test]
    fn plain_content_falls_back_to_html() {
        let mut s = sutta("mn1/en/sujato", "The Root of All Things", "");
        s.content_plain = None;
        s.content_html = Some("<p>So I have <b>heard</b>.</p>".into());
        assert_eq!(s.plain_content(), "So I have heard.");

        s.content_plain = Some("  Plain text. ".into());
        assert_eq!(s.plain_content(), "Plain text.");

        s.content_html = None;
        s.content_plain = None;
        assert_eq!(s.plain_content(), "");
    }

    #[test]
    fn listings_and_counts() {
        let corpus = test_corpus();
        assert_eq!(corpus.sutta_languages().unwrap(), ["en", "pli"]);
        assert_eq!(corpus.dict_word_languages().unwrap(), ["en"]);
        assert_eq!(
            corpus.sutta_source_labels().unwrap(),
            ["ms", "sujato", "thanissaro"]
        );
        assert_eq!(corpus.dictionary_labels().unwrap(), ["pts"]);
        assert_eq!(corpus.count_suttas(None).unwrap(), 7);
        assert_eq!(corpus.count_suttas(Some("pli")).unwrap(), 1);
        assert_eq!(corpus.count_dict_words(None).unwrap(), 4);
    }

    #[test]
    fn indexed_at_is_set() {
        let corpus = test_corpus();
        let s = &corpus.suttas_by_uid("mn1/pli/ms").unwrap()[0];
        corpus.set_suttas_indexed(SchemaName::AppData, &[s.id]).unwrap();

        let conn = corpus.conn(SchemaName::AppData).unwrap();
        let indexed: Option<String> = conn
            .query_row("SELECT indexed_at FROM suttas WHERE id = ?1", [s.id], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(indexed.is_some());
    }

    #[test]
    fn by_id_lookup() {
        let corpus = test_corpus();
        let s = corpus.suttas_by_uid("mn1/en/thanissaro").unwrap().remove(0);
        let found = corpus.sutta_by_id(SchemaName::UserData, s.id).unwrap();
        assert_eq!(found.map(|f| f.uid), Some(s.uid));
        assert!(corpus.sutta_by_id(SchemaName::AppData, 9999).unwrap().is_none());
    }

    #[test]
    fn nikaya_prefixes() {
        assert_eq!(nikaya_of("sn12.55"), "sn");
        assert_eq!(nikaya_of("pli-tv-bu-vb-pj1"), "pli-tv-bu-vb-pj");
        assert_eq!(nikaya_of("dhp179-196"), "dhp");
    }
}
