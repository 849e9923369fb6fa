// Document store seam: the MongoDB driver in production, an in-memory store in tests.

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use regex::{Regex, RegexBuilder};

use super::fields;
use crate::error::{AppError, AppResult};

/// Result of a single-document update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

impl UpdateOutcome {
    pub fn found(&self) -> bool {
        self.matched > 0
    }
}

/// Case-insensitive comment search pattern.
///
/// The raw text is handed to the engine as-is, so it is compiled here first:
/// the `regex` crate has no backtracking and rejects constructs such as
/// backreferences, and the compiled size is capped.
#[derive(Debug, Clone)]
pub struct CommentPattern {
    raw: String,
    regex: Regex,
}

impl CommentPattern {
    pub const SIZE_LIMIT: usize = 1 << 20;

    pub fn new(raw: &str) -> AppResult<Self> {
        let regex = RegexBuilder::new(raw)
            .case_insensitive(true)
            .size_limit(Self::SIZE_LIMIT)
            .build()
            .map_err(|e| AppError::InvalidPattern(format!("'{}': {}", raw, e)))?;

        Ok(Self {
            raw: raw.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Exact match on one metadata field plus membership in a metadata array.
/// Both paths are relative to the metadata object.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataFilter {
    pub field: String,
    pub equals: Bson,
    pub array_field: String,
    pub contains: Bson,
}

impl MetadataFilter {
    pub fn field_path(&self) -> String {
        format!("{}.{}", fields::METADATA, self.field)
    }

    pub fn array_path(&self) -> String {
        format!("{}.{}", fields::METADATA, self.array_field)
    }
}

/// Operations the demonstrations need from a document database.
///
/// Title lookups target the posts collection and affect the first match only.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn database_name(&self) -> &str;

    async fn database_exists(&self) -> AppResult<bool>;
    async fn drop_database(&self) -> AppResult<()>;

    /// Inserts in order and returns how many documents were written.
    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> AppResult<usize>;
    async fn count(&self, collection: &str) -> AppResult<u64>;
    async fn find_all(&self, collection: &str) -> AppResult<Vec<Document>>;

    async fn find_by_title(&self, title: &str) -> AppResult<Option<Document>>;
    async fn set_field(&self, title: &str, path: &str, value: Bson) -> AppResult<UpdateOutcome>;
    async fn push_to_array(&self, title: &str, path: &str, value: Bson)
        -> AppResult<UpdateOutcome>;

    /// Posts with at least one matching comment, projected to title, author,
    /// rating and the matching comments only.
    async fn search_comments(&self, pattern: &CommentPattern) -> AppResult<Vec<Document>>;

    /// Posts passing the metadata filter, projected to title, author name,
    /// rating and metadata.
    async fn find_by_metadata(&self, filter: &MetadataFilter) -> AppResult<Vec<Document>>;
}
