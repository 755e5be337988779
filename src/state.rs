//! Shared index state for the search service.
//!
//! [`IndexState`] owns the current [`BuiltIndex`] behind an `Arc`. Readers clone the
//! `Arc` and search without holding any lock; a rebuild produces a new index and
//! swaps the reference, so a reader never observes a half-built index.

use crate::cache;
use crate::config::Config;
use crate::corpus;
use crate::error::{CacheError, Result};
use crate::schema::{Document, FieldSchema};
use crate::search::{BuiltIndex, corpus_fingerprint};
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Owner of the currently published index.
pub struct IndexState {
    config: Config,
    /// Currently published index, if one has been loaded or built
    current: RwLock<Option<Arc<BuiltIndex>>>,
    /// Serializes builds so concurrent first callers build only once
    build_lock: Mutex<()>,
}

impl std::fmt::Debug for IndexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let documents = self
            .current
            .try_read()
            .ok()
            .and_then(|current| current.as_ref().map(|index| index.len()));
        f.debug_struct("IndexState")
            .field("corpus_dir", &self.config.corpus_dir)
            .field("cache_path", &self.config.cache_path)
            .field("documents", &documents)
            .finish()
    }
}

impl IndexState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            current: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The published index, without triggering a load.
    pub async fn current(&self) -> Option<Arc<BuiltIndex>> {
        self.current.read().await.clone()
    }

    /// Returns the published index, loading the cache or building it on first use.
    pub async fn index(&self) -> Result<Arc<BuiltIndex>> {
        if let Some(index) = self.current().await {
            return Ok(index);
        }

        let _guard = self.build_lock.lock().await;
        // Another caller may have finished while we waited for the lock
        if let Some(index) = self.current().await {
            return Ok(index);
        }

        let corpus_dir = self.config.corpus_dir.clone();
        let cache_path = self.config.cache_path.clone();
        let index = tokio::task::spawn_blocking(move || load_or_build(&corpus_dir, &cache_path))
            .await
            .context("Index loading task panicked")??;

        let index = Arc::new(index);
        self.replace(Arc::clone(&index)).await;
        Ok(index)
    }

    /// Re-reads the corpus, builds a fresh index, caches it, and publishes it.
    ///
    /// Readers holding the previous index keep using it until they drop it.
    pub async fn rebuild(&self) -> Result<Arc<BuiltIndex>> {
        let _guard = self.build_lock.lock().await;

        let corpus_dir = self.config.corpus_dir.clone();
        let cache_path = self.config.cache_path.clone();
        let index = tokio::task::spawn_blocking(move || build_and_store(&corpus_dir, &cache_path))
            .await
            .context("Index rebuild task panicked")??;

        let index = Arc::new(index);
        self.replace(Arc::clone(&index)).await;
        Ok(index)
    }

    /// Publishes `index`, returning the previously published one.
    pub async fn replace(&self, index: Arc<BuiltIndex>) -> Option<Arc<BuiltIndex>> {
        let documents = index.len();
        let previous = self.current.write().await.replace(index);
        tracing::info!(
            "Published search index ({} documents, replaced existing: {})",
            documents,
            previous.is_some()
        );
        previous
    }
}

/// Loads the cached index if it matches the corpus, otherwise builds and caches a new one.
///
/// When the corpus cannot be read, a valid snapshot is served as-is.
pub fn load_or_build(corpus_dir: &Path, cache_path: &Path) -> Result<BuiltIndex> {
    let schema = FieldSchema::markdown();
    let documents = read_corpus(corpus_dir);

    match cache::load_from_path(cache_path) {
        Ok(index) => match &documents {
            Ok(documents) if corpus_fingerprint(&schema, documents) == index.fingerprint() => {
                tracing::debug!(
                    "Loaded cached search index from {} ({} terms, {} docs)",
                    cache_path.display(),
                    index.term_count(),
                    index.len()
                );
                return Ok(index);
            }
            Ok(_) => {
                tracing::info!(
                    "Cached index at {} is stale, will rebuild",
                    cache_path.display()
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Corpus unavailable ({:#}), serving cached index from {}",
                    e,
                    cache_path.display()
                );
                return Ok(index);
            }
        },
        Err(CacheError::Miss { path }) => {
            tracing::debug!("No cached index at {}, building", path.display());
        }
        Err(e) => {
            tracing::warn!("Ignoring cached index at {}: {}", cache_path.display(), e);
        }
    }

    let documents = documents.context("Cannot build search index")?;
    let index = BuiltIndex::fit(schema, documents);
    store(&index, cache_path);
    Ok(index)
}

/// Builds from the corpus unconditionally and caches the result.
pub fn build_and_store(corpus_dir: &Path, cache_path: &Path) -> Result<BuiltIndex> {
    let documents = read_corpus(corpus_dir).context("Cannot rebuild search index")?;
    let index = BuiltIndex::fit(FieldSchema::markdown(), documents);
    store(&index, cache_path);
    Ok(index)
}

fn read_corpus(corpus_dir: &Path) -> Result<Vec<Document>> {
    let sources = corpus::load_markdown_dir(corpus_dir)
        .with_context(|| format!("Failed to load corpus from {}", corpus_dir.display()))?;
    tracing::info!("Found {} markdown documents", sources.len());
    Ok(sources.into_iter().map(Document::from).collect())
}

/// A failed cache write only costs a rebuild on the next start.
fn store(index: &BuiltIndex, cache_path: &Path) {
    if let Err(e) = cache::save_to_path(index, cache_path) {
        tracing::warn!(
            "Failed to write search index to {}: {}",
            cache_path.display(),
            e
        );
    }
}
