// In-memory document store with the update and projection semantics the
// demonstrations rely on. Used wherever a live MongoDB is not wanted.

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::fields;
use super::store::{CommentPattern, DocumentStore, MetadataFilter, UpdateOutcome};
use super::POSTS_COLLECTION;
use crate::error::{AppError, AppResult};

const SEARCH_PROJECTION: [&str; 3] = [fields::TITLE, fields::AUTHOR, fields::RATING];
const METADATA_PROJECTION: [&str; 4] = [fields::TITLE, "auteur.nom", fields::RATING, fields::METADATA];

pub struct MemoryDocumentStore {
    name: String,
    /// `None` until the first insert, like a database that was never created.
    collections: RwLock<Option<HashMap<String, Vec<Document>>>>,
}

impl MemoryDocumentStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collections: RwLock::new(None),
        }
    }

    async fn update_first<F>(&self, title: &str, apply: F) -> AppResult<UpdateOutcome>
    where
        F: FnOnce(&mut Document) -> AppResult<bool> + Send,
    {
        let mut guard = self.collections.write().await;
        let target = guard
            .as_mut()
            .and_then(|collections| collections.get_mut(POSTS_COLLECTION))
            .and_then(|posts| posts.iter_mut().find(|post| has_title(post, title)));

        match target {
            None => Ok(UpdateOutcome::default()),
            Some(post) => {
                let modified = apply(post)?;
                Ok(UpdateOutcome {
                    matched: 1,
                    modified: u64::from(modified),
                })
            }
        }
    }

    async fn posts(&self) -> Vec<Document> {
        self.collections
            .read()
            .await
            .as_ref()
            .and_then(|collections| collections.get(POSTS_COLLECTION))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn database_name(&self) -> &str {
        &self.name
    }

    async fn database_exists(&self) -> AppResult<bool> {
        Ok(self.collections.read().await.is_some())
    }

    async fn drop_database(&self) -> AppResult<()> {
        *self.collections.write().await = None;
        Ok(())
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> AppResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let inserted = documents.len();
        let mut guard = self.collections.write().await;
        let target = guard
            .get_or_insert_with(HashMap::new)
            .entry(collection.to_string())
            .or_default();

        for document in documents {
            if document.contains_key("_id") {
                target.push(document);
            } else {
                let mut with_id = Document::new();
                with_id.insert("_id", ObjectId::new());
                with_id.extend(document);
                target.push(with_id);
            }
        }
        Ok(inserted)
    }

    async fn count(&self, collection: &str) -> AppResult<u64> {
        Ok(self.find_all(collection).await?.len() as u64)
    }

    async fn find_all(&self, collection: &str) -> AppResult<Vec<Document>> {
        Ok(self
            .collections
            .read()
            .await
            .as_ref()
            .and_then(|collections| collections.get(collection))
            .cloned()
            .unwrap_or_default())
    }

    async fn find_by_title(&self, title: &str) -> AppResult<Option<Document>> {
        Ok(self
            .posts()
            .await
            .into_iter()
            .find(|post| has_title(post, title)))
    }

    async fn set_field(&self, title: &str, path: &str, value: Bson) -> AppResult<UpdateOutcome> {
        self.update_first(title, |post| set_path(post, path, value))
            .await
    }

    async fn push_to_array(
        &self,
        title: &str,
        path: &str,
        value: Bson,
    ) -> AppResult<UpdateOutcome> {
        self.update_first(title, |post| push_path(post, path, value).map(|_| true))
            .await
    }

    async fn search_comments(&self, pattern: &CommentPattern) -> AppResult<Vec<Document>> {
        let mut results = Vec::new();

        for post in self.posts().await {
            let matching: Vec<Bson> = match post.get(fields::COMMENTS) {
                Some(Bson::Array(comments)) => comments
                    .iter()
                    .filter(|comment| comment_matches(comment, pattern))
                    .cloned()
                    .collect(),
                _ => continue,
            };
            if matching.is_empty() {
                continue;
            }

            let mut projected = project(&post, &SEARCH_PROJECTION)?;
            projected.insert(fields::COMMENTS, Bson::Array(matching));
            results.push(projected);
        }

        Ok(results)
    }

    async fn find_by_metadata(&self, filter: &MetadataFilter) -> AppResult<Vec<Document>> {
        let mut results = Vec::new();

        for post in self.posts().await {
            if value_matches(get_path(&post, &filter.field_path()), &filter.equals)
                && value_matches(get_path(&post, &filter.array_path()), &filter.contains)
            {
                results.push(project(&post, &METADATA_PROJECTION)?);
            }
        }

        Ok(results)
    }
}

fn has_title(post: &Document, title: &str) -> bool {
    matches!(post.get(fields::TITLE), Some(Bson::String(value)) if value == title)
}

fn comment_matches(comment: &Bson, pattern: &CommentPattern) -> bool {
    match comment {
        Bson::Document(comment) => match comment.get(fields::CONTENT) {
            Some(Bson::String(content)) => pattern.is_match(content),
            _ => false,
        },
        _ => false,
    }
}

/// Equality, or membership when the stored value is an array.
fn value_matches(candidate: Option<&Bson>, expected: &Bson) -> bool {
    match candidate {
        Some(Bson::Array(items)) => {
            items.contains(expected) || matches!(expected, Bson::Array(e) if e == items)
        }
        Some(value) => value == expected,
        None => false,
    }
}

pub(crate) fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Walks to the parent of a dotted path, creating empty documents on the way.
fn descend_mut<'a>(document: &'a mut Document, path: &str) -> AppResult<&'a mut Document> {
    let mut current = document;
    for segment in path.split('.') {
        if !current.contains_key(segment) {
            current.insert(segment, Document::new());
        }
        current = match current.get_mut(segment) {
            Some(Bson::Document(inner)) => inner,
            _ => {
                return Err(AppError::Statement(format!(
                    "Cannot create field inside non-document element '{}'",
                    segment
                )))
            }
        };
    }
    Ok(current)
}

fn split_leaf(path: &str) -> (Option<&str>, &str) {
    match path.rsplit_once('.') {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, path),
    }
}

/// Returns whether the stored value changed.
fn set_path(document: &mut Document, path: &str, value: Bson) -> AppResult<bool> {
    let (parent, leaf) = split_leaf(path);
    let target = match parent {
        Some(parent) => descend_mut(document, parent)?,
        None => document,
    };

    let changed = target.get(leaf) != Some(&value);
    target.insert(leaf, value);
    Ok(changed)
}

fn push_path(document: &mut Document, path: &str, value: Bson) -> AppResult<()> {
    let (parent, leaf) = split_leaf(path);
    let target = match parent {
        Some(parent) => descend_mut(document, parent)?,
        None => document,
    };

    if !target.contains_key(leaf) {
        target.insert(leaf, Bson::Array(Vec::new()));
    }
    match target.get_mut(leaf) {
        Some(Bson::Array(items)) => {
            items.push(value);
            Ok(())
        }
        _ => Err(AppError::Statement(format!(
            "The field '{}' must be an array",
            path
        ))),
    }
}

/// Inclusion projection; missing paths are left out.
fn project(document: &Document, paths: &[&str]) -> AppResult<Document> {
    let mut projected = Document::new();
    for path in paths {
        if let Some(value) = get_path(document, path) {
            set_path(&mut projected, path, value.clone())?;
        }
    }
    Ok(projected)
}
