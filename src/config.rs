//! Environment-driven configuration.

use crate::error::Result;
use anyhow::Context;
use std::borrow::Cow;
use std::path::PathBuf;

pub const CORPUS_DIR_VAR: &str = "MDSEARCH_CORPUS_DIR";
pub const CACHE_PATH_VAR: &str = "MDSEARCH_CACHE_PATH";
pub const TOP_K_VAR: &str = "MDSEARCH_TOP_K";
pub const SNIPPET_CHARS_VAR: &str = "MDSEARCH_SNIPPET_CHARS";

const DEFAULT_CORPUS_DIR: &str = "./docs";
const DEFAULT_TOP_K: usize = 5;
const DEFAULT_SNIPPET_CHARS: usize = 300;

/// Runtime settings for the search service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory walked for markdown documents
    pub corpus_dir: PathBuf,
    /// Snapshot file used to skip rebuilding across restarts
    pub cache_path: PathBuf,
    /// Result count when a request does not specify one
    pub default_top_k: usize,
    /// Maximum characters of content shown per result
    pub snippet_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from(DEFAULT_CORPUS_DIR),
            cache_path: default_cache_path(),
            default_top_k: DEFAULT_TOP_K,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(CORPUS_DIR_VAR) {
            config.corpus_dir = PathBuf::from(&*expand_tilde(&dir));
        }
        if let Some(path) = lookup(CACHE_PATH_VAR) {
            config.cache_path = PathBuf::from(&*expand_tilde(&path));
        }
        if let Some(value) = lookup(TOP_K_VAR) {
            config.default_top_k = parse_positive(TOP_K_VAR, &value)?;
        }
        if let Some(value) = lookup(SNIPPET_CHARS_VAR) {
            config.snippet_chars = parse_positive(SNIPPET_CHARS_VAR, &value)?;
        }

        Ok(config)
    }
}

fn parse_positive(key: &str, value: &str) -> Result<usize> {
    let parsed: usize = value
        .trim()
        .parse()
        .with_context(|| format!("{} must be a positive integer, got '{}'", key, value))?;
    if parsed == 0 {
        anyhow::bail!("{} must be at least 1", key);
    }
    Ok(parsed)
}

/// `<user cache dir>/mdsearch/index.bin`, or `./.mdsearch/index.bin` without one.
fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("mdsearch"))
        .unwrap_or_else(|| PathBuf::from(".mdsearch"))
        .join("index.bin")
}

/// Expands tilde (`~`) in a path to the user's home directory.
///
/// - `~/foo` becomes `/home/user/foo`
/// - `~` becomes `/home/user`
/// - Other paths are returned unchanged
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}
