use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::{
    resolve::QuoteScope,
    search::{SearchArea, SearchMode},
};

#[derive(Debug, Parser)]
#[command(
    name = "simsapa",
    about = "Look up suttas by citation and search the Pāli canon"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import suttas, dictionaries and references from JSON files
    Import(ImportArgs),
    /// Build the full-text indexes from the databases
    Index(IndexArgs),
    /// Search suttas or dictionary words
    Search(SearchArgs),
    /// Show a sutta by citation, uid or ssp:// link
    Get(GetArgs),
    /// Parse a citation and show its canonical forms
    Ref(RefArgs),
    /// Manage bookmarks
    Bookmark {
        #[command(subcommand)]
        action: BookmarkAction,
    },
    /// Show database and index statistics
    Status(StatusArgs),
    /// Start MCP server for AI agent integration
    Mcp,
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Import --

#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// A JSON file, or a directory searched for JSON files
    pub path: PathBuf,

    /// Import into the user database instead of the application database
    #[arg(long)]
    pub userdata: bool,

    /// Rebuild the search indexes afterwards
    #[arg(long)]
    pub index: bool,
}

// -- Index --

#[derive(Debug, Parser)]
pub struct IndexArgs {
    /// Index only this language
    #[arg(long)]
    pub lang: Option<String>,

    /// Only index when one of the default indexes is empty
    #[arg(long)]
    pub only_if_empty: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// How the query is matched
    #[arg(short, long, value_enum, default_value_t = SearchMode::FulltextMatch)]
    pub mode: SearchMode,

    /// What to search
    #[arg(short, long, value_enum, default_value_t = SearchArea::Suttas)]
    pub area: SearchArea,

    /// Search only this language (e.g. en, pli)
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Leave out this language instead
    #[arg(long, requires = "lang")]
    pub exclude_lang: bool,

    /// Search only this source (translator or dictionary)
    #[arg(short, long)]
    pub source: Option<String>,

    /// Leave out the source instead
    #[arg(long, requires = "source")]
    pub exclude_source: bool,

    /// Treat each query term as a regular expression
    #[arg(long)]
    pub regex: bool,

    /// Edit distance for fuzzy term matching
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=2), default_value_t = 0)]
    pub fuzzy: u8,

    /// Results per page (defaults to the page_len setting)
    #[arg(short = 'n', long)]
    pub page_len: Option<usize>,

    /// Page number, starting at 1
    #[arg(short, long, default_value_t = 1)]
    pub page: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Get --

#[derive(Debug, Parser)]
pub struct GetArgs {
    /// Citation (MN 1, Dhp 182, D ii 20), uid (mn1/en/sujato) or
    /// ssp://suttas/ link
    pub reference: String,

    /// A passage the sutta should contain
    #[arg(long)]
    pub quote: Option<String>,

    /// Where to look for the quote when the sutta doesn't contain it
    #[arg(long, default_value_t = QuoteScope::Sutta)]
    pub scope: QuoteScope,

    /// Output as JSON with metadata
    #[arg(long)]
    pub json: bool,

    /// Print the HTML content instead of plain text
    #[arg(long, conflicts_with = "json")]
    pub html: bool,
}

// -- Ref --

#[derive(Debug, Parser)]
pub struct RefArgs {
    /// Citation text
    pub text: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Bookmarks --

#[derive(Debug, Subcommand)]
pub enum BookmarkAction {
    /// Bookmark a sutta, optionally at a quoted passage
    Add {
        /// Bookmark name
        name: String,
        /// Citation, uid or link of the sutta
        reference: String,
        /// A passage to pin the bookmark to
        #[arg(long)]
        quote: Option<String>,
    },
    /// Remove a bookmark
    Remove {
        /// Bookmark name
        name: String,
    },
    /// List all bookmarks
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the bookmarked sutta
    Open {
        /// Bookmark name
        name: String,
        /// Output as JSON with metadata
        #[arg(long)]
        json: bool,
    },
}

// -- Status --

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "simsapa",
            &mut std::io::stdout(),
        );
    }
}
