use std::sync::{Arc, Mutex};

use rmcp::{
    ServerHandler,
    ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult,
        Content,
        Implementation,
        ServerCapabilities,
        ServerInfo,
    },
    tool,
    tool_handler,
    tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    corpus::{Corpus, Sutta},
    data_dir::DataDir,
    error,
    indexer::Indexes,
    resolve::{QuoteScope, SuttaQuote, SuttaResolver},
    search::{
        SearchArea,
        SearchMode,
        SearchParams,
        SearchQueryTask,
        SearchResult,
        unique_search_results,
    },
    text_util::{strip_html, truncate_chars},
};

const DEFAULT_SEARCH_LIMIT: usize = 10;
const DEFAULT_CONTENT_MAX_CHARS: usize = 20_000;

struct SimsapaState {
    corpus: Mutex<Corpus>,
    indexes: Indexes,
}

#[derive(Clone)]
pub struct SimsapaMcpServer {
    state: Arc<SimsapaState>,
    tool_router: ToolRouter<Self>,
}

impl SimsapaMcpServer {
    fn new(state: SimsapaState) -> Self {
        Self {
            state: Arc::new(state),
            tool_router: Self::tool_router(),
        }
    }

    fn search(
        &self,
        query: &str,
        params: SearchParams,
        limit: usize,
    ) -> Result<(Vec<SearchResult>, usize), rmcp::ErrorData> {
        let corpus = self.state.corpus.lock().map_err(|_| {
            rmcp::ErrorData::internal_error("corpus lock poisoned", None)
        })?;

        let mut task =
            SearchQueryTask::new(&corpus, &self.state.indexes, query, params)
                .map_err(|e| mcp_error("search failed", e))?;
        task.run().map_err(|e| mcp_error("search failed", e))?;

        let mut results =
            task.results_page(0).map_err(|e| mcp_error("search failed", e))?;
        results.truncate(limit);
        Ok((results, task.query_hits()))
    }
}

#[tool_router(router = tool_router)]
impl SimsapaMcpServer {
    /// Full-text search over sutta translations and root texts.
    #[tool(
        name = "sutta_search",
        description = "Search suttas by content. Supports language and translator (source) filters. Citations like 'SN 56.11' match the sutta's uid."
    )]
    pub async fn sutta_search(
        &self,
        params: Parameters<SuttaSearchParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).max(1);

        let search_params = SearchParams {
            mode: SearchMode::FulltextMatch,
            area: SearchArea::Suttas,
            page_len: limit,
            lang: params.lang.clone(),
            source: params.source.clone(),
            source_include: !params.exclude_source.unwrap_or(false),
            fuzzy_distance: params.fuzzy_distance.unwrap_or(0).min(2),
            ..Default::default()
        };

        let (results, hits) = self.search(&params.query, search_params, limit)?;
        search_response(&params.query, results, hits)
    }

    /// Look up one sutta by citation, uid or link.
    #[tool(
        name = "sutta_get",
        description = "Get the text of a sutta by citation ('MN 1', 'Dhp 182', 'D ii 20'), uid ('mn1/en/sujato') or ssp:// link. A quote picks among candidates and finds moved texts."
    )]
    pub async fn sutta_get(
        &self,
        params: Parameters<SuttaGetParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;

        let scope = match params.scope.as_deref() {
            Some(s) => s.parse::<QuoteScope>().map_err(|e| {
                rmcp::ErrorData::invalid_params(e, None)
            })?,
            None => QuoteScope::Sutta,
        };
        let quote = params
            .quote
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .map(SuttaQuote::new);

        let corpus = self.state.corpus.lock().map_err(|_| {
            rmcp::ErrorData::internal_error("corpus lock poisoned", None)
        })?;
        let resolver = SuttaResolver::new(&corpus);
        let sutta = resolver
            .resolve_query(&params.reference, quote.as_ref(), scope)
            .map_err(|e| mcp_error("lookup failed", e))?;

        let Some(sutta) = sutta else {
            return Ok(CallToolResult::error(vec![Content::text(format!(
                "No sutta found for \"{}\"",
                params.reference
            ))]));
        };

        let max_chars = params.max_chars.unwrap_or(DEFAULT_CONTENT_MAX_CHARS);
        let item = SuttaItem::from_sutta(&sutta, max_chars);
        let text = format!(
            "{} {}\n{}\n\n{}",
            item.sutta_ref, item.title, item.uid, item.content
        );
        let structured = serde_json::to_value(&item)
            .map_err(|e| mcp_error("failed to serialize sutta", e))?;

        let mut result = CallToolResult::success(vec![Content::text(text)]);
        result.structured_content = Some(structured);
        Ok(result)
    }

    /// Dictionary lookup: matching headwords first, then definitions.
    #[tool(
        name = "dict_search",
        description = "Look up Pāli words in the dictionaries. Headwords starting with or containing the query come first, followed by full-text matches in definitions."
    )]
    pub async fn dict_search(
        &self,
        params: Parameters<DictSearchParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).max(1);

        let headword_params = SearchParams {
            mode: SearchMode::HeadwordMatch,
            area: SearchArea::DictWords,
            page_len: limit,
            lang: params.lang.clone(),
            ..Default::default()
        };
        let (mut results, headword_hits) =
            self.search(&params.query, headword_params, limit)?;

        let fulltext_params = SearchParams {
            mode: SearchMode::FulltextMatch,
            area: SearchArea::DictWords,
            page_len: limit,
            lang: params.lang.clone(),
            ..Default::default()
        };
        // Headword matches stand on their own when the query is not valid
        // index syntax.
        match self.search(&params.query, fulltext_params, limit) {
            Ok((fulltext, _)) => results.extend(fulltext),
            Err(e) => tracing::debug!(error = %e.message, "dict full-text search skipped"),
        }

        let mut results = unique_search_results(results);
        results.truncate(limit);
        let hits = headword_hits.max(results.len());
        search_response(&params.query, results, hits)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for SimsapaMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_server_info(
                Implementation::new("simsapa", env!("CARGO_PKG_VERSION"))
                    .with_title("Simsapa MCP"),
            )
            .with_instructions(
                "Use sutta_search to find passages, sutta_get to read a sutta by citation, and dict_search to look up Pāli words.",
            )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuttaSearchParams {
    /// Search query. Supports `+must`, `-not`, `"phrases"` and
    /// `source:sujato`.
    pub query: String,
    /// Maximum number of results (default: 10).
    pub limit: Option<usize>,
    /// Language code, e.g. `en` or `pli`.
    pub lang: Option<String>,
    /// Translator or edition, e.g. `sujato`.
    pub source: Option<String>,
    /// Leave out the source instead of restricting to it.
    pub exclude_source: Option<bool>,
    /// Edit distance for fuzzy matching, 0 to 2.
    pub fuzzy_distance: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuttaGetParams {
    /// Citation, uid or `ssp://suttas/` link.
    pub reference: String,
    /// Text the sutta should contain.
    pub quote: Option<String>,
    /// Where to look for the quote if the sutta doesn't have it: `sutta`,
    /// `nikaya` or `all`.
    pub scope: Option<String>,
    /// Truncate the content to this many characters (default: 20000).
    pub max_chars: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DictSearchParams {
    /// Word or query.
    pub query: String,
    /// Maximum number of results (default: 10).
    pub limit: Option<usize>,
    /// Language of the dictionaries, e.g. `en`.
    pub lang: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    query: String,
    hits: usize,
    result_count: usize,
    results: Vec<SearchResultItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResultItem {
    uid: String,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    sutta_ref: Option<String>,
    title: String,
    language: String,
    source_uid: String,
    score: Option<f32>,
    snippet: String,
}

impl From<SearchResult> for SearchResultItem {
    fn from(r: SearchResult) -> Self {
        Self {
            uid: r.uid,
            sutta_ref: r.sutta_ref,
            title: r.title,
            language: r.language,
            source_uid: r.source_uid,
            score: r.score,
            snippet: strip_html(&r.snippet),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SuttaItem {
    uid: String,
    #[serde(rename = "ref")]
    sutta_ref: String,
    title: String,
    language: String,
    source_uid: String,
    content: String,
    truncated: bool,
}

impl SuttaItem {
    fn from_sutta(sutta: &Sutta, max_chars: usize) -> Self {
        let content = sutta.plain_content();
        let shown = truncate_chars(&content, max_chars);
        Self {
            uid: sutta.uid.clone(),
            sutta_ref: sutta.sutta_ref.clone(),
            title: sutta.title.clone().unwrap_or_default(),
            language: sutta.language.clone(),
            source_uid: sutta.source_uid.clone(),
            truncated: shown.len() < content.len(),
            content: shown.to_string(),
        }
    }
}

fn search_response(
    query: &str,
    results: Vec<SearchResult>,
    hits: usize,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let items: Vec<SearchResultItem> =
        results.into_iter().map(SearchResultItem::from).collect();

    let summary = format_search_summary(&items, query);
    let structured = serde_json::to_value(SearchResponse {
        query: query.to_string(),
        hits,
        result_count: items.len(),
        results: items,
    })
    .map_err(|e| mcp_error("failed to serialize search results", e))?;

    let mut result = CallToolResult::success(vec![Content::text(summary)]);
    result.structured_content = Some(structured);
    Ok(result)
}

fn format_search_summary(results: &[SearchResultItem], query: &str) -> String {
    if results.is_empty() {
        return format!("No results found for \"{query}\"");
    }

    let mut lines = Vec::with_capacity(results.len() + 1);
    let suffix = if results.len() == 1 { "" } else { "s" };
    lines.push(format!(
        "Found {} result{} for \"{query}\":",
        results.len(),
        suffix
    ));

    for item in results {
        let heading = match &item.sutta_ref {
            Some(r) if !r.is_empty() => format!("{r} {}", item.title),
            _ => item.title.clone(),
        };
        lines.push(format!("{} | {}", item.uid, heading.trim()));
        if !item.snippet.is_empty() {
            lines.push(format!("  {}", item.snippet));
        }
    }

    lines.join("\n")
}

fn mcp_error(message: &str, error: impl std::fmt::Display) -> rmcp::ErrorData {
    rmcp::ErrorData::internal_error(
        message.to_string(),
        Some(json!({ "error": error.to_string() })),
    )
}

pub fn run_mcp(data_dir: DataDir, corpus: Corpus) -> error::Result<()> {
    let indexes = Indexes::open_all(&data_dir, &corpus)?;
    if indexes.has_empty_index(&corpus)? {
        tracing::warn!("Search indexes are empty, run `simsapa index` first");
    }

    let server = SimsapaMcpServer::new(SimsapaState {
        corpus: Mutex::new(corpus),
        indexes,
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            error::Error::Config(format!("failed to start tokio runtime: {e}"))
        })?;

    runtime.block_on(async move {
        let transport = rmcp::transport::stdio();
        let running = server.serve(transport).await.map_err(|e| {
            error::Error::Config(format!(
                "MCP server initialization failed: {e}"
            ))
        })?;
        running.waiting().await.map_err(|e| {
            error::Error::Config(format!("MCP server error: {e}"))
        })?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::tests::test_corpus;

    fn server() -> SimsapaMcpServer {
        let corpus = test_corpus();
        let mut indexes = Indexes::open_in_ram(&corpus).unwrap();
        indexes.index_all(&corpus, false).unwrap();
        SimsapaMcpServer::new(SimsapaState {
            corpus: Mutex::new(corpus),
            indexes,
        })
    }

    fn summary(result: &CallToolResult) -> String {
        result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    fn result_uids(result: &CallToolResult) -> Vec<String> {
        result
            .structured_content
            .as_ref()
            .and_then(|s| s.get("results"))
            .and_then(|v| v.as_array())
            .expect("results array")
            .iter()
            .filter_map(|r| r.get("uid").and_then(|v| v.as_str()))
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn sutta_search_returns_structured_results() {
        let server = server();
        let params = SuttaSearchParams {
            query: "extremes".to_string(),
            limit: Some(5),
            lang: Some("en".to_string()),
            source: None,
            exclude_source: None,
            fuzzy_distance: None,
        };

        let result = server.sutta_search(Parameters(params)).await.unwrap();
        assert_eq!(result_uids(&result), vec!["sn56.11/en/sujato"]);

        let structured = result.structured_content.as_ref().unwrap();
        assert_eq!(structured.get("resultCount").and_then(|v| v.as_u64()), Some(1));
        let first = &structured["results"][0];
        assert_eq!(first.get("ref").and_then(|v| v.as_str()), Some("SN56.11"));
        let snippet = first.get("snippet").and_then(|v| v.as_str()).unwrap();
        assert!(!snippet.contains("<span"));

        assert!(summary(&result).contains("Found 1 result"));
    }

    #[tokio::test]
    async fn sutta_search_excludes_source() {
        let server = server();
        let params = SuttaSearchParams {
            query: "heard".to_string(),
            limit: None,
            lang: Some("en".to_string()),
            source: Some("sujato".to_string()),
            exclude_source: Some(true),
            fuzzy_distance: None,
        };

        let result = server.sutta_search(Parameters(params)).await.unwrap();
        assert_eq!(result_uids(&result), vec!["mn1/en/thanissaro"]);
    }

    #[tokio::test]
    async fn sutta_get_resolves_citation() {
        let server = server();
        let params = SuttaGetParams {
            reference: "SN 56.11".to_string(),
            quote: None,
            scope: None,
            max_chars: None,
        };

        let result = server.sutta_get(Parameters(params)).await.unwrap();
        assert_eq!(result.is_error, Some(false));
        let structured = result.structured_content.as_ref().unwrap();
        assert_eq!(
            structured.get("uid").and_then(|v| v.as_str()),
            Some("sn56.11/en/sujato")
        );
        assert!(summary(&result).contains("These two extremes"));
    }

    #[tokio::test]
    async fn sutta_get_uses_quote_scope() {
        let server = server();
        let params = SuttaGetParams {
            reference: "sn56.99".to_string(),
            quote: Some("Such was the vision".to_string()),
            scope: Some("nikaya".to_string()),
            max_chars: Some(10),
        };

        let result = server.sutta_get(Parameters(params)).await.unwrap();
        let structured = result.structured_content.as_ref().unwrap();
        assert_eq!(
            structured.get("uid").and_then(|v| v.as_str()),
            Some("sn56.12/en/sujato")
        );
        assert_eq!(structured.get("truncated").and_then(|v| v.as_bool()), Some(true));
    }

    #[tokio::test]
    async fn sutta_get_reports_missing() {
        let server = server();
        let params = SuttaGetParams {
            reference: "MN 99".to_string(),
            quote: None,
            scope: None,
            max_chars: None,
        };

        let result = server.sutta_get(Parameters(params)).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(summary(&result).contains("No sutta found"));
    }

    #[tokio::test]
    async fn sutta_get_rejects_bad_scope() {
        let server = server();
        let params = SuttaGetParams {
            reference: "MN 1".to_string(),
            quote: Some("heard".to_string()),
            scope: Some("everywhere".to_string()),
            max_chars: None,
        };

        assert!(server.sutta_get(Parameters(params)).await.is_err());
    }

    #[tokio::test]
    async fn dict_search_lists_headwords_first() {
        let server = server();
        let params = DictSearchParams {
            query: "dhamma".to_string(),
            limit: Some(10),
            lang: None,
        };

        let result = server.dict_search(Parameters(params)).await.unwrap();
        let structured = result.structured_content.as_ref().unwrap();
        let titles: Vec<&str> = structured["results"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|r| r.get("title").and_then(|v| v.as_str()))
            .collect();
        assert_eq!(&titles[..4], &["dhamma 1", "dhamma 2", "dhammakāya", "sadhamma"]);
        assert_eq!(titles.len(), 4);
    }
}
