//! Rebuild handler: refits the index from the corpus and swaps it in.

use crate::state::IndexState;
use std::time::Instant;

/// Rebuild the index from the configured corpus directory.
pub async fn handle_rebuild(state: &IndexState) -> Result<String, String> {
    let start = Instant::now();
    let index = state
        .rebuild()
        .await
        .map_err(|e| format!("Failed to rebuild search index: {:#}", e))?;

    Ok(format!(
        "Rebuilt search index from {}: {} documents, {} terms in {:.2?}",
        state.config().corpus_dir.display(),
        index.len(),
        index.term_count(),
        start.elapsed()
    ))
}
