use mdsearch::config::Config;
use mdsearch::server::SearchServer;
use mdsearch::state::IndexState;
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interfere with the MCP protocol on stdout
    mdsearch::logging::init();

    let config = Config::from_env()?;
    tracing::info!(
        "Starting mdsearch MCP server (corpus: {}, cache: {})",
        config.corpus_dir.display(),
        config.cache_path.display()
    );

    let state = Arc::new(IndexState::new(config));

    // Warm the index in the background so the first search doesn't pay for the build
    let warmup = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = warmup.index().await {
            tracing::warn!("Failed to prepare search index: {:#}", e);
        }
    });

    let server = SearchServer::new(state);
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;

    service.waiting().await?;

    Ok(())
}
