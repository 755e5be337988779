//! Shared test fixtures and utilities for integration tests.
//!
//! # Test Isolation Strategy
//!
//! Every test gets its own temporary directory holding both the markdown corpus and
//! the index snapshot, so tests never share a cache file and can run in parallel.
//!
//! # Available Fixtures
//!
//! - `corpus_workspace`: A small markdown corpus with a cold cache (recommended)
//! - `empty_workspace`: A corpus directory with no documents in it
//!
//! # Shared Infrastructure
//!
//! [`TempWorkspace`] provides a reusable temp directory abstraction for any test
//! that needs filesystem isolation.

use mdsearch::schema::{Document, FieldSchema};
use mdsearch::search::BuiltIndex;
use mdsearch::{Config, IndexState};
use rstest::fixture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A temporary workspace directory for test isolation.
///
/// Provides basic filesystem operations within a temp directory that is
/// automatically cleaned up when dropped.
///
/// # Example
///
/// ```ignore
/// let workspace = TempWorkspace::new();
/// workspace.create_file("docs/intro.md", "# Intro");
/// assert!(workspace.path().join("docs/intro.md").exists());
/// ```
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    /// Creates a new empty temporary workspace.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    /// Returns the root path of this workspace.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a directory (and all parent directories) within this workspace.
    ///
    /// # Panics
    /// Panics if directory creation fails.
    pub fn create_dir(&self, path: &str) {
        let full_path = self.root.join(path);
        std::fs::create_dir_all(&full_path)
            .unwrap_or_else(|e| panic!("Failed to create directory '{}': {}", path, e));
    }

    /// Creates a file with the given content within this workspace.
    ///
    /// Parent directories are created automatically if they don't exist.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &[u8]) {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
    }

    /// Removes a directory and everything below it.
    ///
    /// # Panics
    /// Panics if removal fails.
    pub fn remove_dir(&self, path: &str) {
        std::fs::remove_dir_all(self.root.join(path))
            .unwrap_or_else(|e| panic!("Failed to remove directory '{}': {}", path, e));
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// A corpus directory plus a snapshot location, wired into a [`Config`].
///
/// Layout: `docs/` holds the markdown files, `cache/index.bin` is the snapshot.
#[allow(dead_code)] // Fields used across different integration test crates
pub struct CorpusWorkspace {
    pub workspace: TempWorkspace,
    pub config: Config,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl CorpusWorkspace {
    /// Creates a workspace with an empty `docs/` directory.
    pub fn empty() -> Self {
        mdsearch::logging::init();
        let workspace = TempWorkspace::new();
        workspace.create_dir("docs");

        let config = Config {
            corpus_dir: workspace.path().join("docs"),
            cache_path: workspace.path().join("cache").join("index.bin"),
            ..Config::default()
        };

        Self { workspace, config }
    }

    /// Creates a workspace with [`SAMPLE_CORPUS`] in `docs/`.
    pub fn with_sample_corpus() -> Self {
        let corpus = Self::empty();
        for (name, content) in SAMPLE_CORPUS {
            corpus.create_doc(name, content);
        }
        corpus
    }

    /// Writes a markdown file relative to the corpus directory.
    pub fn create_doc(&self, name: &str, content: &str) {
        self.workspace
            .create_file(&format!("docs/{}", name), content.as_bytes());
    }

    /// Fresh state over this workspace's configuration.
    pub fn state(&self) -> Arc<IndexState> {
        Arc::new(IndexState::new(self.config.clone()))
    }

    pub fn cache_path(&self) -> &Path {
        &self.config.cache_path
    }
}

/// A few markdown pages about an MCP documentation site, in sorted filename order.
pub const SAMPLE_CORPUS: &[(&str, &str)] = &[
    (
        "clients/overview.md",
        "# Clients\n\nClients connect to a server and call tools.\n",
    ),
    (
        "getting-started.md",
        "# Getting started\n\nInstall the server and run it over stdio.\n",
    ),
    (
        "servers/resources.md",
        "# Resources\n\nResources expose read-only data to clients.\n",
    ),
    (
        "servers/tools.mdx",
        "# Tools\n\nTools let a server expose functions. Each tool has a name and a tool schema.\n",
    ),
];

/// The two-document index used throughout the ranking tests.
#[allow(dead_code)] // Used by some integration test crates only
pub fn alpha_beta_index() -> BuiltIndex {
    BuiltIndex::fit(
        FieldSchema::markdown(),
        [
            Document::new()
                .with("filename", "a.md")
                .with("content", "alpha beta beta"),
            Document::new()
                .with("filename", "b.md")
                .with("content", "beta gamma"),
        ],
    )
}

/// Creates a workspace with the sample corpus and a cold cache.
///
/// This is the **recommended fixture** for most tests.
#[fixture]
pub fn corpus_workspace() -> CorpusWorkspace {
    CorpusWorkspace::with_sample_corpus()
}

/// Creates a workspace whose corpus directory exists but holds no documents.
#[fixture]
pub fn empty_workspace() -> CorpusWorkspace {
    CorpusWorkspace::empty()
}
