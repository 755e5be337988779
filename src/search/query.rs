//! Ranked top-k retrieval over a [`BuiltIndex`].

use crate::error::SearchError;
use crate::schema::Document;
use ahash::AHashMap;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::index::{BuiltIndex, DocId};
use super::scoring::{idf, tf_idf};
use super::tokenize::query_terms;

/// Exact-match constraints: keyword field name → required value.
pub type Filters = BTreeMap<String, String>;

/// A ranked hit. `document` always carries the fields as originally ingested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDocument<'a> {
    pub id: DocId,
    pub document: &'a Document,
    pub score: f32,
}

impl BuiltIndex {
    /// Returns up to `top_k` documents matching `query`, best first.
    ///
    /// Only documents containing at least one query term are candidates. Every
    /// filter must match the document's keyword value exactly. Ties are broken by
    /// ascending document id, so identical calls return identical results.
    pub fn search(
        &self,
        query: &str,
        filters: &Filters,
        top_k: usize,
    ) -> Result<Vec<ScoredDocument<'_>>, SearchError> {
        if top_k < 1 {
            return Err(SearchError::InvalidArgument(
                "top_k must be at least 1".to_string(),
            ));
        }
        let constraints = self.resolve_filters(filters)?;

        let terms = query_terms(query);
        if terms.is_empty() {
            return Ok(vec![]);
        }

        // Fields outer, terms inner, both in a fixed order: per-document sums are
        // accumulated in the same sequence on every call.
        let mut scores: AHashMap<DocId, f32> = AHashMap::new();
        for field in self.text_indexes() {
            for term in &terms {
                let Some(postings) = field.postings.get(term) else {
                    continue;
                };
                let weight = idf(field.stats.doc_count, postings.len());
                for posting in postings {
                    *scores.entry(posting.doc).or_insert(0.0) += tf_idf(posting.term_freq, weight);
                }
            }
        }

        let mut ranked: Vec<(DocId, f32)> = scores
            .into_iter()
            .filter(|(doc, _)| {
                constraints
                    .iter()
                    .all(|(position, value)| self.keyword_index(*position).contains(value, *doc))
            })
            .collect();

        if ranked.len() > top_k {
            ranked.select_nth_unstable_by(top_k - 1, rank_order);
            ranked.truncate(top_k);
        }
        ranked.sort_unstable_by(rank_order);

        tracing::trace!(
            "Query {:?} matched {} documents (top_k = {})",
            query,
            ranked.len(),
            top_k
        );

        Ok(ranked
            .into_iter()
            .map(|(id, score)| ScoredDocument {
                id,
                document: &self.documents()[id],
                score,
            })
            .collect())
    }

    /// Maps filter keys to keyword field positions, rejecting undeclared keys.
    fn resolve_filters<'f>(
        &self,
        filters: &'f Filters,
    ) -> Result<Vec<(usize, &'f str)>, SearchError> {
        filters
            .iter()
            .map(|(field, value)| {
                self.schema()
                    .keyword_position(field)
                    .map(|position| (position, value.as_str()))
                    .ok_or_else(|| {
                        let reason = if self.schema().is_text_field(field) {
                            "is a text field, not a keyword field"
                        } else {
                            "is not declared in the schema"
                        };
                        SearchError::InvalidArgument(format!("filter key '{}' {}", field, reason))
                    })
            })
            .collect()
    }
}

/// Score descending, then document id ascending.
fn rank_order(a: &(DocId, f32), b: &(DocId, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}
