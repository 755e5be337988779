//! Text tokenization for search indexing.
//!
//! Tokens are produced by lower-casing the input and splitting on every run of
//! non-alphanumeric characters. There is no stemming or stop-word removal, so the
//! same input always yields the same terms regardless of language.

use ahash::{AHashMap, AHashSet};

/// Splits text into lower-cased alphanumeric terms, in order of appearance.
///
/// - `"Hello, World"` → `["hello", "world"]`
/// - `"snake_case-words"` → `["snake", "case", "words"]`
/// - `"HTTP2Server"` → `["http2server"]` (digits are alphanumeric)
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Tokenizes a query and drops repeated terms, keeping first-occurrence order.
///
/// A fixed term order keeps floating-point score accumulation reproducible.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut seen = AHashSet::new();
    tokenize(query)
        .into_iter()
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

/// Counts term occurrences in a token stream.
pub(crate) fn term_frequencies(tokens: Vec<String>) -> AHashMap<String, u32> {
    let mut counts: AHashMap<String, u32> = AHashMap::with_capacity(tokens.len());
    for token in tokens {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}
