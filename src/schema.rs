//! Field schema and document payloads.
//!
//! A [`FieldSchema`] declares which document fields are free text (tokenized and
//! scored) and which are keywords (matched exactly, used only for filtering). The
//! schema is validated once at construction and shared by every document in an index.

use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Field name holding the document label in markdown corpora.
pub const FILENAME_FIELD: &str = "filename";
/// Field name holding the document body in markdown corpora.
pub const CONTENT_FIELD: &str = "content";

/// Validated declaration of text and keyword fields.
///
/// Deserialization goes through the same validation as [`FieldSchema::new`], so a
/// snapshot can never smuggle in an overlapping schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFieldSchema")]
pub struct FieldSchema {
    text_fields: Vec<String>,
    keyword_fields: Vec<String>,
}

#[derive(Deserialize)]
struct RawFieldSchema {
    text_fields: Vec<String>,
    keyword_fields: Vec<String>,
}

impl TryFrom<RawFieldSchema> for FieldSchema {
    type Error = SearchError;

    fn try_from(raw: RawFieldSchema) -> Result<Self, Self::Error> {
        Self::new(raw.text_fields, raw.keyword_fields)
    }
}

impl FieldSchema {
    /// Creates a schema, rejecting empty names, duplicates, and names declared in both sets.
    pub fn new<T, K>(text_fields: T, keyword_fields: K) -> Result<Self, SearchError>
    where
        T: IntoIterator,
        T::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        let text_fields: Vec<String> = text_fields.into_iter().map(Into::into).collect();
        let keyword_fields: Vec<String> = keyword_fields.into_iter().map(Into::into).collect();

        let mut seen = HashSet::new();
        for name in &text_fields {
            if name.is_empty() {
                return Err(SearchError::Configuration(
                    "field names must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(SearchError::Configuration(format!(
                    "text field '{}' is declared more than once",
                    name
                )));
            }
        }

        let mut seen_keywords = HashSet::new();
        for name in &keyword_fields {
            if name.is_empty() {
                return Err(SearchError::Configuration(
                    "field names must not be empty".to_string(),
                ));
            }
            if seen.contains(name.as_str()) {
                return Err(SearchError::Configuration(format!(
                    "field '{}' is declared as both text and keyword",
                    name
                )));
            }
            if !seen_keywords.insert(name.as_str()) {
                return Err(SearchError::Configuration(format!(
                    "keyword field '{}' is declared more than once",
                    name
                )));
            }
        }

        Ok(Self {
            text_fields,
            keyword_fields,
        })
    }

    /// Schema for markdown corpora: `content` is searched, `filename` is filterable.
    pub fn markdown() -> Self {
        Self {
            text_fields: vec![CONTENT_FIELD.to_string()],
            keyword_fields: vec![FILENAME_FIELD.to_string()],
        }
    }

    pub fn text_fields(&self) -> &[String] {
        &self.text_fields
    }

    pub fn keyword_fields(&self) -> &[String] {
        &self.keyword_fields
    }

    /// Position of a keyword field, if declared.
    pub fn keyword_position(&self, name: &str) -> Option<usize> {
        self.keyword_fields.iter().position(|f| f == name)
    }

    pub fn is_text_field(&self, name: &str) -> bool {
        self.text_fields.iter().any(|f| f == name)
    }
}

/// An ingested document: a mapping from field name to value.
///
/// Values are stored verbatim. Whether a value is tokenized or matched exactly is
/// decided by the schema, not the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    fields: BTreeMap<String, String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Value of a field; a missing field reads as the empty string.
    pub fn get(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn filename(&self) -> &str {
        self.get(FILENAME_FIELD)
    }

    pub fn content(&self) -> &str {
        self.get(CONTENT_FIELD)
    }
}

impl<K, V> FromIterator<(K, V)> for Document
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
