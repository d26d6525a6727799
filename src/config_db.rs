use std::{
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::{
    corpus::Sutta,
    error::{Error, Result},
    resolve::{QuoteScope, SuttaQuote, SuttaResolver},
};

const SETTINGS: TableDefinition<&str, &str> = TableDefinition::new("settings");
const BOOKMARKS: TableDefinition<&str, &str> = TableDefinition::new("bookmarks");

/// Setting keys.
pub mod settings {
    /// Results per search page.
    pub const PAGE_LEN: &str = "page_len";
    /// Language searched when none is given.
    pub const SEARCH_LANG: &str = "search_lang";
}

pub const DEFAULT_PAGE_LEN: usize = 20;

/// A saved position in a sutta, optionally pinned to a quoted passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub name: String,
    pub sutta_uid: String,
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub selection_range: Option<String>,
    /// Unix time in seconds.
    #[serde(default)]
    pub created_at: u64,
}

impl Bookmark {
    pub fn new(name: &str, sutta_uid: &str, quote: Option<&str>) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            name: name.to_string(),
            sutta_uid: sutta_uid.to_string(),
            quote: quote.map(str::to_string),
            selection_range: None,
            created_at,
        }
    }

    pub fn sutta_quote(&self) -> Option<SuttaQuote> {
        self.quote.as_ref().map(|q| SuttaQuote {
            quote: q.clone(),
            selection_range: self.selection_range.clone(),
        })
    }

    /// The bookmarked sutta. A uid which no longer exists is looked up by
    /// the quote within its collection.
    pub fn resolve(&self, resolver: &SuttaResolver<'_>) -> Result<Option<Sutta>> {
        let quote = self.sutta_quote();
        let scope = if quote.is_some() {
            QuoteScope::Nikaya
        } else {
            QuoteScope::Sutta
        };
        resolver.get_sutta_by_uid(&self.sutta_uid, quote.as_ref(), scope)
    }
}

/// User settings and bookmarks.
pub struct ConfigDb {
    db: Database,
}

impl ConfigDb {
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)?;

        // Ensure all tables exist by opening them in a write transaction.
        let txn = db.begin_write()?;
        txn.open_table(SETTINGS)?;
        txn.open_table(BOOKMARKS)?;
        txn.commit()?;

        Ok(Self { db })
    }

    // -- Settings --

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SETTINGS)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SETTINGS)?;
        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }

    /// Get a setting, returning the default if not set.
    pub fn get_setting_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self
            .get_setting(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    pub fn remove_setting(&self, key: &str) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(SETTINGS)?;
            table.remove(key)?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }

    pub fn list_settings(&self) -> Result<Vec<(String, String)>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SETTINGS)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (k, v) = entry?;
            result.push((k.value().to_string(), v.value().to_string()));
        }
        Ok(result)
    }

    /// Results per page, falling back to the default when unset or invalid.
    pub fn page_len(&self) -> Result<usize> {
        let value = self.get_setting(settings::PAGE_LEN)?;
        Ok(value
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_PAGE_LEN))
    }

    // -- Bookmarks --

    /// Add or replace the bookmark with the same name.
    pub fn set_bookmark(&self, bookmark: &Bookmark) -> Result<()> {
        if bookmark.name.trim().is_empty() {
            return Err(Error::Config("bookmark name is empty".into()));
        }
        let json = serde_json::to_string(bookmark)?;

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(BOOKMARKS)?;
            table.insert(bookmark.name.as_str(), json.as_str())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_bookmark(&self, name: &str) -> Result<Option<Bookmark>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(BOOKMARKS)?;
        match table.get(name)? {
            Some(v) => Ok(Some(serde_json::from_str(v.value())?)),
            None => Ok(None),
        }
    }

    pub fn remove_bookmark(&self, name: &str) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(BOOKMARKS)?;
            table.remove(name)?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }

    /// All bookmarks, ordered by name.
    pub fn list_bookmarks(&self) -> Result<Vec<Bookmark>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(BOOKMARKS)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (_, v) = entry?;
            result.push(serde_json::from_str(v.value())?);
        }
        Ok(result)
    }
}

impl std::fmt::Debug for ConfigDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigDb").finish_non_exhaustive()
    }
}
