//! Error handling types and utilities.

use std::path::PathBuf;

/// A specialized Result type for service-level operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the corpus, state, and server layers.
pub type Result<T> = anyhow::Result<T>;

/// Errors raised by the search engine itself.
///
/// Both variants are programmer errors: callers should fail fast rather than retry.
/// Neither leaves a built index partially mutated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The field schema is structurally invalid (e.g. a field declared both text and keyword).
    #[error("invalid field schema: {0}")]
    Configuration(String),
    /// A single call received an argument outside its contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Errors raised by the cache adapter.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// No snapshot exists at the source.
    #[error("no cached index at {}", path.display())]
    Miss { path: PathBuf },
    /// A snapshot exists but could not be read or failed validation.
    #[error("cached index is corrupt: {reason}")]
    Corrupt { reason: String },
    /// Writing a snapshot failed.
    #[error("failed to write cached index: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::Corrupt {
            reason: reason.into(),
        }
    }

    /// Whether the caller should fall back to rebuilding the index.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Miss { .. } | Self::Corrupt { .. })
    }
}
