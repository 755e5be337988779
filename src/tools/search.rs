//! Search handler for ranked documentation lookups.

use crate::search::ScoredDocument;
use crate::state::IndexState;
use rmcp::schemars;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Instant;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Free-text search query
    pub query: String,
    /// Maximum number of results to return (default: server configuration, usually 5)
    #[serde(default)]
    pub top_k: Option<usize>,
    /// Exact-match filters on keyword fields, e.g. {"filename": "docs/servers/tools.mdx"}
    #[serde(default)]
    pub filters: Option<BTreeMap<String, String>>,
}

/// Execute a search against the shared index.
pub async fn handle_search(state: &IndexState, request: SearchRequest) -> Result<String, String> {
    let index = state
        .index()
        .await
        .map_err(|e| format!("Search index unavailable: {:#}", e))?;

    let top_k = request.top_k.unwrap_or(state.config().default_top_k);
    let filters = request.filters.unwrap_or_default();

    let start = Instant::now();
    let results = index
        .search(&request.query, &filters, top_k)
        .map_err(|e| e.to_string())?;
    tracing::debug!(
        "Search for '{}' returned {} results in {:?}",
        request.query,
        results.len(),
        start.elapsed()
    );

    Ok(format_search_results(
        &request.query,
        &results,
        state.config().snippet_chars,
    ))
}

/// Format ranked results as numbered entries with a content snippet each.
pub fn format_search_results(
    query: &str,
    results: &[ScoredDocument<'_>],
    snippet_chars: usize,
) -> String {
    let mut output = format!("Found {} results for '{}':\n\n", results.len(), query);

    for (idx, result) in results.iter().enumerate() {
        let filename = match result.document.filename() {
            "" => "unknown",
            name => name,
        };
        output.push_str(&format!(
            "{}. {} (score: {:.3})\n",
            idx + 1,
            filename,
            result.score
        ));
        output.push_str(&format!(
            "   Snippet: {}\n\n",
            snippet(result.document.content(), snippet_chars)
        ));
    }

    output
}

/// The first `max_chars` characters of `content`, with line breaks flattened to spaces.
pub fn snippet(content: &str, max_chars: usize) -> String {
    content
        .chars()
        .take(max_chars)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}
