//! Full-text search engine for documents with text and keyword fields.
//!
//! This module provides tokenization, the inverted index and its builder,
//! TF-IDF scoring, and ranked top-k retrieval with exact-match filters.

// Module declarations
pub mod index;
pub mod query;
pub mod scoring;
pub mod tokenize;

// Public re-exports (used via lib.rs)
pub use index::{BuiltIndex, DocId, FieldStats, IndexBuilder, Posting, corpus_fingerprint};
pub use query::{Filters, ScoredDocument};
pub use tokenize::{query_terms, tokenize};
