//! Inverted index store and builder.
//!
//! [`IndexBuilder`] accumulates postings document by document, then
//! [`IndexBuilder::finalize`] computes corpus statistics in one final pass and
//! produces an immutable [`BuiltIndex`].

use crate::error::SearchError;
use crate::schema::{Document, FieldSchema};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use xxhash_rust::xxh3::Xxh3;

use super::tokenize::{term_frequencies, tokenize};

/// Dense, zero-based document identifier assigned in ingestion order.
pub type DocId = usize;

/// One term's occurrence count in one document's field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc: DocId,
    pub term_freq: u32,
}

/// Corpus statistics for a single text field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    /// Number of documents in the field (every document, including empty ones)
    pub doc_count: usize,
    /// Mean token count across all documents; 0 for an empty corpus
    pub avg_length: f32,
    /// Map from term to the number of documents containing it
    pub doc_freq: HashMap<String, usize>,
}

impl FieldStats {
    fn compute(postings: &HashMap<String, Vec<Posting>>, lengths: &[u32]) -> Self {
        let doc_count = lengths.len();
        let total: u64 = lengths.iter().map(|&len| u64::from(len)).sum();
        let avg_length = if doc_count == 0 {
            0.0
        } else {
            total as f32 / doc_count as f32
        };
        let doc_freq = postings
            .iter()
            .map(|(term, list)| (term.clone(), list.len()))
            .collect();

        Self {
            doc_count,
            avg_length,
            doc_freq,
        }
    }
}

/// Postings, field lengths, and statistics for one text field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct TextFieldIndex {
    /// Map from term to postings, ordered by ascending document id
    pub(crate) postings: HashMap<String, Vec<Posting>>,
    /// Token count of this field per document, indexed by document id
    pub(crate) lengths: Vec<u32>,
    pub(crate) stats: FieldStats,
}

/// Exact value → documents map for one keyword field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct KeywordFieldIndex {
    /// Map from verbatim value to document ids in ascending order
    pub(crate) values: HashMap<String, Vec<DocId>>,
}

impl KeywordFieldIndex {
    pub(crate) fn contains(&self, value: &str, doc: DocId) -> bool {
        self.values
            .get(value)
            .is_some_and(|docs| docs.binary_search(&doc).is_ok())
    }
}

/// A complete, immutable search index.
///
/// Created by [`BuiltIndex::fit`] and read-only afterwards, so a single instance
/// can be shared across threads (e.g. behind an `Arc`) and searched concurrently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltIndex {
    schema: FieldSchema,
    /// One entry per `schema.text_fields()`, same order
    text: Vec<TextFieldIndex>,
    /// One entry per `schema.keyword_fields()`, same order
    keywords: Vec<KeywordFieldIndex>,
    /// Original payloads, indexed by document id
    documents: Vec<Document>,
    /// xxh3 over schema and documents, used to detect stale snapshots
    fingerprint: u64,
}

impl BuiltIndex {
    /// Builds an index from a sequence of documents.
    ///
    /// Document ids are assigned in input order starting at 0. Fields missing from a
    /// document are indexed as empty values.
    pub fn fit<I>(schema: FieldSchema, documents: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        let mut builder = IndexBuilder::new(schema);
        for document in documents {
            builder.add(document);
        }
        builder.finalize()
    }

    /// Validates a schema from raw field names, then builds.
    ///
    /// A configuration error is reported before any document is consumed.
    pub fn fit_with_fields<T, K, I>(
        text_fields: T,
        keyword_fields: K,
        documents: I,
    ) -> Result<Self, SearchError>
    where
        T: IntoIterator,
        T::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
        I: IntoIterator<Item = Document>,
    {
        let schema = FieldSchema::new(text_fields, keyword_fields)?;
        Ok(Self::fit(schema, documents))
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Number of documents in the index.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Number of distinct (field, term) entries across all text fields.
    pub fn term_count(&self) -> usize {
        self.text.iter().map(|field| field.postings.len()).sum()
    }

    pub fn field_stats(&self, field: &str) -> Option<&FieldStats> {
        self.text_field(field).map(|index| &index.stats)
    }

    /// Postings for a term in a text field; empty if either is unknown.
    pub fn postings(&self, field: &str, term: &str) -> &[Posting] {
        self.text_field(field)
            .and_then(|index| index.postings.get(term))
            .map_or(&[], Vec::as_slice)
    }

    /// Documents whose keyword field equals `value` exactly.
    pub fn keyword_documents(&self, field: &str, value: &str) -> &[DocId] {
        self.schema
            .keyword_position(field)
            .and_then(|pos| self.keywords[pos].values.get(value))
            .map_or(&[], Vec::as_slice)
    }

    fn text_field(&self, field: &str) -> Option<&TextFieldIndex> {
        self.schema
            .text_fields()
            .iter()
            .position(|f| f == field)
            .map(|pos| &self.text[pos])
    }

    pub(crate) fn text_indexes(&self) -> &[TextFieldIndex] {
        &self.text
    }

    pub(crate) fn keyword_index(&self, position: usize) -> &KeywordFieldIndex {
        &self.keywords[position]
    }

    /// Verifies that postings, statistics, and payloads agree with each other.
    ///
    /// Used when loading a snapshot; an index built by [`BuiltIndex::fit`] always passes.
    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        let doc_count = self.documents.len();

        if self.text.len() != self.schema.text_fields().len() {
            return Err(format!(
                "{} text field indexes for {} declared text fields",
                self.text.len(),
                self.schema.text_fields().len()
            ));
        }
        if self.keywords.len() != self.schema.keyword_fields().len() {
            return Err(format!(
                "{} keyword field indexes for {} declared keyword fields",
                self.keywords.len(),
                self.schema.keyword_fields().len()
            ));
        }

        for (name, field) in self.schema.text_fields().iter().zip(&self.text) {
            if field.lengths.len() != doc_count || field.stats.doc_count != doc_count {
                return Err(format!("field '{}' does not cover every document", name));
            }
            if field.stats.doc_freq.len() != field.postings.len() {
                return Err(format!("field '{}' has stale document frequencies", name));
            }
            for (term, postings) in &field.postings {
                if field.stats.doc_freq.get(term) != Some(&postings.len()) {
                    return Err(format!(
                        "document frequency of '{}' in '{}' disagrees with its postings",
                        term, name
                    ));
                }
                if postings
                    .iter()
                    .any(|p| p.doc >= doc_count || p.term_freq == 0)
                {
                    return Err(format!("invalid posting for '{}' in '{}'", term, name));
                }
                if !strictly_ascending(postings.iter().map(|p| p.doc)) {
                    return Err(format!(
                        "postings for '{}' in '{}' are unsorted or repeat a document",
                        term, name
                    ));
                }
            }
            let expected = FieldStats::compute(&HashMap::new(), &field.lengths).avg_length;
            if (expected - field.stats.avg_length).abs() > 1e-3 * expected.max(1.0) {
                return Err(format!("field '{}' has a stale average length", name));
            }
        }

        // Every document sits under exactly one value of each keyword field
        for (name, field) in self.schema.keyword_fields().iter().zip(&self.keywords) {
            let mut covered = vec![false; doc_count];
            for docs in field.values.values() {
                if !strictly_ascending(docs.iter().copied()) {
                    return Err(format!(
                        "keyword field '{}' has an unsorted or repeated document list",
                        name
                    ));
                }
                for &doc in docs {
                    match covered.get_mut(doc) {
                        None => {
                            return Err(format!(
                                "keyword field '{}' references a missing document",
                                name
                            ));
                        }
                        Some(true) => {
                            return Err(format!(
                                "document {} has several values for keyword field '{}'",
                                doc, name
                            ));
                        }
                        Some(seen) => *seen = true,
                    }
                }
            }
            if let Some(doc) = covered.iter().position(|&seen| !seen) {
                return Err(format!(
                    "document {} has no value for keyword field '{}'",
                    doc, name
                ));
            }
        }

        if corpus_fingerprint(&self.schema, &self.documents) != self.fingerprint {
            return Err("fingerprint does not match stored documents".to_string());
        }

        Ok(())
    }
}

/// Accumulates postings before statistics are finalized.
pub struct IndexBuilder {
    schema: FieldSchema,
    text: Vec<TextFieldIndex>,
    keywords: Vec<KeywordFieldIndex>,
    documents: Vec<Document>,
    hasher: Xxh3,
}

impl IndexBuilder {
    pub fn new(schema: FieldSchema) -> Self {
        let mut hasher = Xxh3::new();
        hash_schema(&mut hasher, &schema);

        Self {
            text: vec![TextFieldIndex::default(); schema.text_fields().len()],
            keywords: vec![KeywordFieldIndex::default(); schema.keyword_fields().len()],
            documents: Vec::new(),
            hasher,
            schema,
        }
    }

    /// Ingests one document and returns its id.
    pub fn add(&mut self, document: Document) -> DocId {
        let doc = self.documents.len();

        for (name, field) in self.schema.text_fields().iter().zip(&mut self.text) {
            let tokens = tokenize(document.get(name));
            field.lengths.push(tokens.len() as u32);

            for (term, term_freq) in term_frequencies(tokens) {
                field
                    .postings
                    .entry(term)
                    .or_default()
                    .push(Posting { doc, term_freq });
            }
        }

        for (name, field) in self.schema.keyword_fields().iter().zip(&mut self.keywords) {
            field
                .values
                .entry(document.get(name).to_string())
                .or_default()
                .push(doc);
        }

        hash_document(&mut self.hasher, &document);
        self.documents.push(document);
        doc
    }

    /// Computes corpus statistics and produces the searchable index.
    pub fn finalize(self) -> BuiltIndex {
        let start = std::time::Instant::now();
        let mut text = self.text;

        for field in &mut text {
            field.stats = FieldStats::compute(&field.postings, &field.lengths);
        }

        let index = BuiltIndex {
            schema: self.schema,
            text,
            keywords: self.keywords,
            documents: self.documents,
            fingerprint: self.hasher.digest(),
        };

        tracing::info!(
            "Built search index: {} unique terms, {} documents in {:?}",
            index.term_count(),
            index.len(),
            start.elapsed()
        );

        index
    }
}

/// Fingerprint of a schema and an ordered document sequence.
///
/// Equal to [`BuiltIndex::fingerprint`] of the index `fit` would build from the same
/// input, so a cached snapshot can be checked against a corpus without rebuilding.
pub fn corpus_fingerprint<'a, I>(schema: &FieldSchema, documents: I) -> u64
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut hasher = Xxh3::new();
    hash_schema(&mut hasher, schema);
    for document in documents {
        hash_document(&mut hasher, document);
    }
    hasher.digest()
}

fn strictly_ascending(mut docs: impl Iterator<Item = DocId>) -> bool {
    let Some(mut previous) = docs.next() else {
        return true;
    };
    docs.all(|doc| {
        let ascending = doc > previous;
        previous = doc;
        ascending
    })
}

fn hash_str(hasher: &mut Xxh3, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn hash_schema(hasher: &mut Xxh3, schema: &FieldSchema) {
    for fields in [schema.text_fields(), schema.keyword_fields()] {
        hasher.update(&(fields.len() as u64).to_le_bytes());
        for name in fields {
            hash_str(hasher, name);
        }
    }
}

fn hash_document(hasher: &mut Xxh3, document: &Document) {
    let fields: Vec<_> = document.fields().collect();
    hasher.update(&(fields.len() as u64).to_le_bytes());
    for (name, value) in fields {
        hash_str(hasher, name);
        hash_str(hasher, value);
    }
}
