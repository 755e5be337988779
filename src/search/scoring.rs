//! Relevance scoring.
//!
//! Each (term, field) pair contributes `tf * idf` to a document's score, where
//!
//! ```text
//! idf(term, field) = ln((N - df + 0.5) / (df + 0.5) + 1)
//! ```
//!
//! - N = number of documents in the field
//! - df = number of documents whose field contains the term
//!
//! The `+ 1` inside the logarithm keeps idf strictly positive even for terms that
//! appear in every document, so a match never lowers a score.

/// Smoothed inverse document frequency.
///
/// Returns 0.0 for a term that appears nowhere (`df == 0`) so callers can skip it.
pub fn idf(doc_count: usize, doc_freq: usize) -> f32 {
    if doc_freq == 0 {
        return 0.0;
    }
    let n = doc_count as f32;
    let df = doc_freq as f32;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// Contribution of one term in one field of one document.
pub fn tf_idf(term_freq: u32, idf: f32) -> f32 {
    term_freq as f32 * idf
}
