use std::io::IsTerminal;

use clap::Parser;
use serde::Serialize;
use serde_json::json;
use simsapa::{
    ConfigDb,
    Corpus,
    DataDir,
    Error,
    Indexes,
    Result,
    cli::{self, BookmarkAction, Cli, Command},
    config_db::{Bookmark, settings},
    corpus::{SchemaName, Sutta},
    import,
    mcp,
    resolve::{QuoteScope, SuttaQuote, SuttaResolver},
    search::{self, SearchParams, SearchQueryTask},
    search_index::IndexKind,
    sutta_ref,
    verse_ranges,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("SIMSAPA_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Command::Completions(args) = &cli.command {
        args.generate();
        return Ok(());
    }

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    let mut corpus = Corpus::open_data_dir(&data_dir)?;

    match cli.command {
        Command::Import(args) => {
            cmd_import(&data_dir, &mut corpus, &args)?;
        }
        Command::Index(args) => {
            cmd_index(&data_dir, &corpus, &args)?;
        }
        Command::Search(args) => {
            let config_db = ConfigDb::open(&data_dir.config_db())?;
            cmd_search(&data_dir, &corpus, &config_db, &args)?;
        }
        Command::Get(args) => {
            let quote = args.quote.as_deref().map(SuttaQuote::new);
            let resolver = SuttaResolver::new(&corpus);
            let sutta = resolver
                .resolve_query(&args.reference, quote.as_ref(), args.scope)?
                .ok_or_else(|| Error::NotFound {
                    kind: "sutta",
                    name: args.reference.clone(),
                })?;
            print_sutta(&sutta, args.json, args.html)?;
        }
        Command::Ref(args) => {
            cmd_ref(&corpus, &args)?;
        }
        Command::Bookmark { action } => {
            let config_db = ConfigDb::open(&data_dir.config_db())?;
            cmd_bookmark(&corpus, &config_db, action)?;
        }
        Command::Status(args) => {
            let config_db = ConfigDb::open(&data_dir.config_db())?;
            cmd_status(&data_dir, &corpus, &config_db, args.json)?;
        }
        Command::Mcp => {
            mcp::run_mcp(data_dir, corpus)?;
        }
        Command::Completions(_) => {}
    }

    Ok(())
}

fn cmd_import(
    data_dir: &DataDir,
    corpus: &mut Corpus,
    args: &cli::ImportArgs,
) -> Result<()> {
    if !args.path.exists() {
        return Err(Error::NotFound {
            kind: "path",
            name: args.path.display().to_string(),
        });
    }

    let schema = if args.userdata {
        SchemaName::UserData
    } else {
        SchemaName::AppData
    };

    let stats = import::import_path(corpus, schema, &args.path)?;
    eprintln!(
        "Imported {} file(s): {} suttas, {} dictionaries, {} words, {} references, {} authors",
        stats.files,
        stats.suttas,
        stats.dictionaries,
        stats.dict_words,
        stats.multi_refs,
        stats.authors
    );

    if args.index {
        let mut indexes = Indexes::open_all(data_dir, corpus)?
            .with_progress(std::io::stderr().is_terminal());
        let stats = indexes.index_all(corpus, false)?;
        eprintln!(
            "Indexed {} suttas and {} dictionary words",
            stats.suttas, stats.dict_words
        );
    }

    Ok(())
}

fn cmd_index(
    data_dir: &DataDir,
    corpus: &Corpus,
    args: &cli::IndexArgs,
) -> Result<()> {
    let show_progress = !args.no_progress && std::io::stderr().is_terminal();
    let mut indexes =
        Indexes::open_all(data_dir, corpus)?.with_progress(show_progress);

    let Some(lang) = &args.lang else {
        let stats = indexes.index_all(corpus, args.only_if_empty)?;
        eprintln!(
            "Indexed {} suttas and {} dictionary words",
            stats.suttas, stats.dict_words
        );
        return Ok(());
    };

    let has_suttas = corpus.sutta_languages()?.contains(lang);
    let has_words = corpus.dict_word_languages()?.contains(lang);
    if !has_suttas && !has_words {
        return Err(Error::NotFound {
            kind: "language",
            name: lang.clone(),
        });
    }

    if has_suttas {
        let count = indexes.index_suttas_lang(corpus, lang)?;
        eprintln!("Indexed {count} suttas ({lang})");
    }
    if has_words {
        let count = indexes.index_dict_words_lang(corpus, lang)?;
        eprintln!("Indexed {count} dictionary words ({lang})");
    }
    Ok(())
}

fn cmd_search(
    data_dir: &DataDir,
    corpus: &Corpus,
    config_db: &ConfigDb,
    args: &cli::SearchArgs,
) -> Result<()> {
    if args.page == 0 {
        return Err(Error::InvalidQuery("pages start at 1".into()));
    }

    let page_len = match args.page_len {
        Some(n) if n > 0 => n,
        _ => config_db.page_len()?,
    };
    let lang = match &args.lang {
        Some(lang) => Some(lang.clone()),
        None => config_db.get_setting(settings::SEARCH_LANG)?,
    };

    let params = SearchParams {
        mode: args.mode,
        area: args.area,
        page_len,
        lang,
        lang_include: !args.exclude_lang,
        source: args.source.clone(),
        source_include: !args.exclude_source,
        enable_regex: args.regex,
        fuzzy_distance: args.fuzzy,
    };

    let indexes = Indexes::open_all(data_dir, corpus)?;
    if params.mode == search::SearchMode::FulltextMatch && indexes.has_empty_index(corpus)? {
        tracing::warn!("Search indexes are empty, run `simsapa index` first");
    }

    let mut task = SearchQueryTask::new(corpus, &indexes, &args.query, params)?;
    task.run()?;
    let results = task.results_page(args.page - 1)?;
    let hits = task.query_hits();

    if args.json {
        search::format_json(&results, &args.query, hits)?;
    } else {
        search::format_human(&results, hits);
    }
    Ok(())
}

fn print_sutta(sutta: &Sutta, json: bool, html: bool) -> Result<()> {
    if json {
        let out = json!({
            "schema": sutta.schema.as_str(),
            "uid": sutta.uid,
            "ref": sutta.sutta_ref,
            "nikaya": sutta.nikaya,
            "language": sutta.language,
            "source_uid": sutta.source_uid,
            "title": sutta.title,
            "title_pali": sutta.title_pali,
            "content": sutta.plain_content(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let title = sutta.title.as_deref().unwrap_or_default();
    println!("{} {}", sutta.sutta_ref, title);
    println!("{}\n", sutta.uid);
    match (&sutta.content_html, html) {
        (Some(content), true) => println!("{content}"),
        _ => println!("{}", sutta.plain_content()),
    }
    Ok(())
}

/// What a citation parses to.
#[derive(Debug, Serialize)]
struct RefInfo {
    text: String,
    normalized: String,
    kind: &'static str,
    uid: Option<String>,
    pts: Option<String>,
    sutta: Option<String>,
}

fn cmd_ref(corpus: &Corpus, args: &cli::RefArgs) -> Result<()> {
    let text = args.text.trim();
    let normalized = sutta_ref::normalize_sutta_ref(text);
    let pts = sutta_ref::parse_pts_ref(text);
    let book_uid = sutta_ref::book_ref_to_uid(text);

    let (kind, uid) = if text.starts_with(simsapa::resolve::SUTTA_URL_PREFIX) {
        ("link", None)
    } else if let Some(uid) = book_uid {
        ("book", Some(uid))
    } else if pts.is_some() {
        ("pts", None)
    } else {
        let uid = sutta_ref::normalize_sutta_uid(text);
        let uid_ref = uid.split('/').next().unwrap_or_default();
        let uid = verse_ranges::verse_citation_to_uid(uid_ref)
            .map(|mapped| uid.replacen(uid_ref, &mapped, 1))
            .unwrap_or(uid);
        ("uid", Some(uid))
    };

    let resolver = SuttaResolver::new(corpus);
    let sutta = resolver
        .resolve_query(text, None, QuoteScope::Sutta)?
        .map(|s| s.uid);

    let info = RefInfo {
        text: text.to_string(),
        normalized,
        kind,
        uid,
        pts: pts.map(|p| p.to_ref_string()),
        sutta,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Citation:   {}", info.text);
    println!("Normalized: {}", info.normalized);
    println!("Kind:       {}", info.kind);
    if let Some(uid) = &info.uid {
        println!("Uid:        {uid}");
    }
    if let Some(pts) = &info.pts {
        println!("PTS:        {pts}");
    }
    match &info.sutta {
        Some(uid) => println!("Sutta:      {uid}"),
        None => println!("Sutta:      (not found)"),
    }
    Ok(())
}

fn cmd_bookmark(
    corpus: &Corpus,
    config_db: &ConfigDb,
    action: BookmarkAction,
) -> Result<()> {
    let resolver = SuttaResolver::new(corpus);

    match action {
        BookmarkAction::Add {
            name,
            reference,
            quote,
        } => {
            let sutta_quote = quote.as_deref().map(SuttaQuote::new);
            let sutta = resolver
                .resolve_query(&reference, sutta_quote.as_ref(), QuoteScope::Sutta)?
                .ok_or_else(|| Error::NotFound {
                    kind: "sutta",
                    name: reference.clone(),
                })?;
            config_db.set_bookmark(&Bookmark::new(&name, &sutta.uid, quote.as_deref()))?;
            println!("Added bookmark '{name}' -> {}", sutta.uid);
        }
        BookmarkAction::Remove { name } => {
            if !config_db.remove_bookmark(&name)? {
                return Err(Error::NotFound {
                    kind: "bookmark",
                    name,
                });
            }
            println!("Removed bookmark '{name}'");
        }
        BookmarkAction::List { json } => {
            let bookmarks = config_db.list_bookmarks()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&bookmarks)?);
            } else if bookmarks.is_empty() {
                println!("No bookmarks.");
            } else {
                for b in &bookmarks {
                    match &b.quote {
                        Some(q) => println!("{}\t{}\t\"{q}\"", b.name, b.sutta_uid),
                        None => println!("{}\t{}", b.name, b.sutta_uid),
                    }
                }
            }
        }
        BookmarkAction::Open { name, json } => {
            let bookmark = config_db.get_bookmark(&name)?.ok_or_else(|| {
                Error::NotFound {
                    kind: "bookmark",
                    name: name.clone(),
                }
            })?;
            let sutta = bookmark.resolve(&resolver)?.ok_or_else(|| Error::NotFound {
                kind: "sutta",
                name: bookmark.sutta_uid.clone(),
            })?;
            print_sutta(&sutta, json, false)?;
        }
    }
    Ok(())
}

fn cmd_status(
    data_dir: &DataDir,
    corpus: &Corpus,
    config_db: &ConfigDb,
    json: bool,
) -> Result<()> {
    let indexes = Indexes::open_all(data_dir, corpus)?;

    let mut sutta_langs = Vec::new();
    for lang in corpus.sutta_languages()? {
        let indexed = match indexes.sutta_index(&lang) {
            Some(index) => index.num_docs()?,
            None => 0,
        };
        let count = corpus.count_suttas(Some(&lang))?;
        sutta_langs.push((lang, count, indexed));
    }

    let mut word_langs = Vec::new();
    for lang in corpus.dict_word_languages()? {
        let indexed = match indexes.dict_words_index(&lang) {
            Some(index) => index.num_docs()?,
            None => 0,
        };
        let count = corpus.count_dict_words(Some(&lang))?;
        word_langs.push((lang, count, indexed));
    }

    let dictionaries = corpus.dictionary_labels()?;
    let bookmarks = config_db.list_bookmarks()?.len();
    let page_len = config_db.page_len()?;
    let stale = indexes.has_empty_index(corpus)?;

    if json {
        let langs = |rows: &[(String, u64, u64)]| {
            rows.iter()
                .map(|(lang, count, indexed)| {
                    json!({ "lang": lang, "count": count, "indexed": indexed })
                })
                .collect::<Vec<_>>()
        };
        let out = json!({
            "data_dir": data_dir.root().display().to_string(),
            "suttas": corpus.count_suttas(None)?,
            "dict_words": corpus.count_dict_words(None)?,
            "sutta_languages": langs(&sutta_langs),
            "dict_word_languages": langs(&word_langs),
            "dictionaries": dictionaries,
            "index_languages": indexes.langs(IndexKind::Suttas),
            "needs_indexing": stale,
            "bookmarks": bookmarks,
            "page_len": page_len,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Data directory: {}", data_dir.root().display());
    println!("Suttas: {}", corpus.count_suttas(None)?);
    for (lang, count, indexed) in &sutta_langs {
        println!("  {lang}: {count} ({indexed} indexed)");
    }
    println!("Dictionary words: {}", corpus.count_dict_words(None)?);
    for (lang, count, indexed) in &word_langs {
        println!("  {lang}: {count} ({indexed} indexed)");
    }
    if !dictionaries.is_empty() {
        println!("Dictionaries: {}", dictionaries.join(", "));
    }
    println!("Bookmarks: {bookmarks}");
    println!("Page length: {page_len}");
    if stale {
        println!("Indexes need rebuilding: run `simsapa index`");
    }
    Ok(())
}
