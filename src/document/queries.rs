// Document-model demonstrations: schema evolution without migrations and
// searches inside embedded arrays.

use chrono::{DateTime, SecondsFormat, Utc};
use mongodb::bson::{doc, Bson, Document};
use tracing::{info, warn};
use uuid::Uuid;

use super::fields;
use super::store::{CommentPattern, DocumentStore, MetadataFilter, UpdateOutcome};
use crate::error::{AppError, AppResult};

pub const DEMO_TITLE: &str = "Pourquoi MongoDB est idéal pour les blogs modernes";

/// A comment to append. The id is generated when not given.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub id: Option<String>,
    pub author: Document,
    pub content: String,
}

impl NewComment {
    pub fn to_document(&self, now: DateTime<Utc>) -> Document {
        let id = self
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut comment = Document::new();
        comment.insert(fields::COMMENT_ID, id);
        comment.insert(fields::AUTHOR, self.author.clone());
        comment.insert(fields::CONTENT, self.content.as_str());
        comment.insert(fields::DATE, now.to_rfc3339_opts(SecondsFormat::Millis, true));
        comment.insert(fields::REPLIES, Bson::Array(Vec::new()));
        comment
    }
}

/// Literals for one run of the document demonstrations.
#[derive(Debug, Clone)]
pub struct DocumentDemo {
    pub title: String,
    pub rating: f64,
    pub comment: NewComment,
    pub search_pattern: String,
    pub metadata: Document,
    pub metadata_filter: MetadataFilter,
}

impl Default for DocumentDemo {
    fn default() -> Self {
        Self {
            title: DEMO_TITLE.to_string(),
            rating: 4.5,
            comment: NewComment {
                id: None,
                author: doc! {
                    "nom": "Claire Martin",
                    "email": "claire.martin@example.com",
                    "role": "lecteur"
                },
                content: "Très clair ! Le pipeline d'agrégation avec $filter m'a fait gagner un temps fou."
                    .to_string(),
            },
            search_pattern: "agrégation".to_string(),
            metadata: doc! {
                "langue": "fr",
                "temps_lecture_min": 7,
                "seo": {
                    "description": "Les atouts d'un modèle document pour un blog",
                    "mots_cles": ["mongodb", "nosql", "schema"]
                },
                "source": { "type": "interne", "relu": true },
                "revisions": [
                    { "date": "2024-03-02", "par": "alice.dupont@example.com" }
                ]
            },
            metadata_filter: MetadataFilter {
                field: "langue".to_string(),
                equals: Bson::String("fr".to_string()),
                array_field: "seo.mots_cles".to_string(),
                contains: Bson::String("nosql".to_string()),
            },
        }
    }
}

fn log_outcome(operation: &str, title: &str, outcome: &UpdateOutcome) {
    if outcome.found() {
        info!(operation, title, modified = outcome.modified, "post updated");
    } else {
        warn!(operation, title, "no post with this title");
    }
}

/// Sets a rating on one post. No schema change is needed for the new field.
pub async fn add_rating(
    store: &dyn DocumentStore,
    title: &str,
    rating: f64,
) -> AppResult<UpdateOutcome> {
    let outcome = store
        .set_field(title, fields::RATING, Bson::Double(rating))
        .await?;
    log_outcome("add_rating", title, &outcome);
    Ok(outcome)
}

/// Pushes a comment onto a post and returns the stored comment.
pub async fn append_comment(
    store: &dyn DocumentStore,
    title: &str,
    comment: &NewComment,
    now: DateTime<Utc>,
) -> AppResult<Document> {
    let document = comment.to_document(now);
    let outcome = store
        .push_to_array(title, fields::COMMENTS, Bson::Document(document.clone()))
        .await?;
    log_outcome("append_comment", title, &outcome);

    if !outcome.found() {
        return Err(AppError::NotFound(format!("post titled '{}'", title)));
    }
    Ok(document)
}

pub async fn search_comments(store: &dyn DocumentStore, pattern: &str) -> AppResult<Vec<Document>> {
    let pattern = CommentPattern::new(pattern)?;
    let results = store.search_comments(&pattern).await?;
    info!(pattern = pattern.as_str(), posts = results.len(), "comment search");
    Ok(results)
}

/// Replaces the free-form metadata object of one post.
pub async fn attach_metadata(
    store: &dyn DocumentStore,
    title: &str,
    metadata: Document,
) -> AppResult<UpdateOutcome> {
    let outcome = store
        .set_field(title, fields::METADATA, Bson::Document(metadata))
        .await?;
    log_outcome("attach_metadata", title, &outcome);
    Ok(outcome)
}

pub async fn find_by_metadata(
    store: &dyn DocumentStore,
    filter: &MetadataFilter,
) -> AppResult<Vec<Document>> {
    let results = store.find_by_metadata(filter).await?;
    info!(
        field = %filter.field_path(),
        array_field = %filter.array_path(),
        posts = results.len(),
        "metadata search"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::memory::MemoryDocumentStore;
    use crate::document::POSTS_COLLECTION;
    use chrono::TimeZone;

    async fn store_with(titles: &[&str]) -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new("test");
        let posts = titles
            .iter()
            .map(|title| doc! { "titre": *title, "commentaires": [] })
            .collect();
        store.insert_many(POSTS_COLLECTION, posts).await.unwrap();
        store
    }

    #[test]
    fn test_new_comment_document_shape() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let comment = NewComment {
            id: Some("c-42".into()),
            author: doc! { "nom": "User1" },
            content: "Bonjour".into(),
        };
        let document = comment.to_document(now);

        assert_eq!(document.get_str("id_commentaire").unwrap(), "c-42");
        assert_eq!(document.get_document("auteur").unwrap().get_str("nom").unwrap(), "User1");
        assert_eq!(document.get_str("contenu").unwrap(), "Bonjour");
        assert_eq!(document.get_str("date").unwrap(), "2024-05-01T12:30:00.000Z");
        assert!(document.get_array("reponses").unwrap().is_empty());
    }

    #[test]
    fn test_generated_comment_ids_are_unique() {
        let comment = DocumentDemo::default().comment;
        let now = Utc::now();
        let a = comment.to_document(now);
        let b = comment.to_document(now);
        assert_ne!(a.get_str("id_commentaire").unwrap(), b.get_str("id_commentaire").unwrap());
    }

    #[test]
    fn test_default_comment_matches_default_search() {
        let demo = DocumentDemo::default();
        let pattern = CommentPattern::new(&demo.search_pattern).unwrap();
        assert!(pattern.is_match(&demo.comment.content));
    }

    #[tokio::test]
    async fn test_add_rating_touches_only_target() {
        let store = store_with(&["A", "B"]).await;

        let outcome = add_rating(&store, "A", 4.5).await.unwrap();
        assert!(outcome.found());

        let a = store.find_by_title("A").await.unwrap().unwrap();
        let b = store.find_by_title("B").await.unwrap().unwrap();
        assert_eq!(a.get_f64("note").unwrap(), 4.5);
        assert!(!b.contains_key("note"));
    }

    #[tokio::test]
    async fn test_append_comment_to_missing_post_is_not_found() {
        let store = store_with(&["A"]).await;
        let comment = DocumentDemo::default().comment;

        let err = append_comment(&store, "missing", &comment, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_search_rejects_invalid_pattern() {
        let store = store_with(&["A"]).await;
        let err = search_comments(&store, "[").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPattern(_)));
    }

    #[tokio::test]
    async fn test_metadata_round_trip_through_search() {
        let store = store_with(&["A", "B"]).await;
        let demo = DocumentDemo::default();

        attach_metadata(&store, "A", demo.metadata.clone()).await.unwrap();
        let results = find_by_metadata(&store, &demo.metadata_filter).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].get_str("titre").unwrap(), "A");
        let metadata = results[0].get_document("metadonnees").unwrap();
        assert_eq!(metadata.get_i32("temps_lecture_min").unwrap(), 7);
        assert!(metadata.get_document("source").unwrap().get_bool("relu").unwrap());
    }
}
