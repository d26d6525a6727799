//! simsapa - sutta lookup and full-text search over the Pāli canon.
//!
//! Texts and dictionaries live in two SQLite databases, one shipped with the
//! application and one for the user's own imports. Citations such as
//! `MN 1`, `Dhp 182`, `D ii 20` or `ssp://suttas/sn56.11/en/sujato` are
//! resolved to texts, and per-language [Tantivy](https://github.com/quickwit-oss/tantivy)
//! indexes provide ranked search with Pāli-aware stemming.
//!
//! # Quick start
//!
//! ```no_run
//! use simsapa::{Corpus, DataDir, Indexes, QuoteScope, SuttaResolver};
//! use simsapa::search::{SearchParams, SearchQueryTask};
//!
//! let data_dir = DataDir::resolve(None).unwrap();
//! let corpus = Corpus::open_data_dir(&data_dir).unwrap();
//!
//! let resolver = SuttaResolver::new(&corpus);
//! if let Some(sutta) = resolver.resolve_query("SN 56.11", None, QuoteScope::Sutta).unwrap() {
//!     println!("{} {}", sutta.uid, sutta.title.unwrap_or_default());
//! }
//!
//! let indexes = Indexes::open_all(&data_dir, &corpus).unwrap();
//! let params = SearchParams {
//!     lang: Some("en".to_string()),
//!     ..Default::default()
//! };
//! let mut task = SearchQueryTask::new(&corpus, &indexes, "two extremes", params).unwrap();
//! task.run().unwrap();
//! for r in task.results_page(0).unwrap() {
//!     println!("{} (score: {:.3})", r.uid, r.score.unwrap_or_default());
//! }
//! ```

pub mod cli;
pub mod config_db;
pub mod corpus;
pub mod data_dir;
pub mod error;
pub mod import;
pub mod indexer;
pub mod mcp;
pub mod pali_stemmer;
pub mod resolve;
pub mod search;
pub mod search_index;
pub mod sutta_ref;
pub mod text_util;
pub mod verse_ranges;

pub use config_db::ConfigDb;
pub use corpus::{Corpus, SchemaName};
pub use data_dir::DataDir;
pub use error::{Error, Result};
pub use indexer::Indexes;
pub use resolve::{QuoteScope, SuttaQuote, SuttaResolver};
pub use search_index::SearchIndex;
