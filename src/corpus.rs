//! Markdown corpus loading.
//!
//! Walks a local directory for `.md` / `.mdx` files and yields
//! `{filename, content}` records ready to be ingested by the index.

use crate::error::Result;
use crate::schema::{CONTENT_FIELD, Document, FILENAME_FIELD};
use ignore::WalkBuilder;
use std::path::Path;

/// Extensions (lower-case) treated as markdown.
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "mdx"];

/// A raw document as supplied by the corpus: a label and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub filename: String,
    pub content: String,
}

impl From<SourceDocument> for Document {
    fn from(source: SourceDocument) -> Self {
        Self::new()
            .with(FILENAME_FIELD, source.filename)
            .with(CONTENT_FIELD, source.content)
    }
}

/// Loads every markdown file under `root`, sorted by relative path.
///
/// Filenames are relative to `root` and always use `/` as the separator. Every
/// markdown file is included: hidden directories and ignore files (in `root` or
/// any parent) do not filter the corpus. Files that are not valid UTF-8 are decoded
/// as Latin-1 rather than rejected, and a file that cannot be read is skipped with
/// a warning.
pub fn load_markdown_dir(root: &Path) -> Result<Vec<SourceDocument>> {
    if !root.is_dir() {
        anyhow::bail!("Corpus directory does not exist: {}", root.display());
    }

    let start = std::time::Instant::now();
    let mut documents = Vec::new();

    for entry in WalkBuilder::new(root).standard_filters(false).build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable corpus entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) || !is_markdown(path) {
            continue;
        }

        if let Some(document) = read_document(root, path) {
            documents.push(document);
        }
    }

    documents.sort_by(|a, b| a.filename.cmp(&b.filename));

    tracing::debug!(
        "Loaded {} markdown documents from {} in {:?}",
        documents.len(),
        root.display(),
        start.elapsed()
    );

    Ok(documents)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|md| ext.eq_ignore_ascii_case(md))
        })
}

fn read_document(root: &Path, path: &Path) -> Option<SourceDocument> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Skipping unreadable corpus file {}: {}", path.display(), e);
            return None;
        }
    };
    let relative = path.strip_prefix(root).unwrap_or(path);

    Some(SourceDocument {
        filename: relative_label(relative),
        content: decode_text(bytes),
    })
}

fn relative_label(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// UTF-8 when valid, otherwise Latin-1 (every byte maps to one char).
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| char::from(b)).collect(),
    }
}
