// MongoDB implementation of the document store.

use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Collection, Database};
use tracing::{debug, info};

use super::fields;
use super::store::{CommentPattern, DocumentStore, MetadataFilter, UpdateOutcome};
use super::POSTS_COLLECTION;
use crate::config::MongoConfig;
use crate::error::{AppError, AppResult};

pub struct MongoDocumentStore {
    client: Client,
    database: Database,
}

impl MongoDocumentStore {
    /// Connects and pings the server, so an unreachable server surfaces as a
    /// connection error here rather than on the first statement.
    pub async fn connect(config: &MongoConfig) -> AppResult<Self> {
        let client = Client::with_uri_str(config.connection_string())
            .await
            .map_err(|e| AppError::Connection(format!("Failed to connect to MongoDB: {}", e)))?;

        let store = Self::with_client(client, &config.database);
        store.health_check().await?;
        info!(database = %config.database, "connected to MongoDB");
        Ok(store)
    }

    pub fn with_client(client: Client, database: &str) -> Self {
        let database = client.database(database);
        Self { client, database }
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AppError::Connection(format!("MongoDB ping failed: {}", e)))?;
        Ok(())
    }

    pub async fn shutdown(self) {
        self.client.shutdown().await;
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }

    fn posts(&self) -> Collection<Document> {
        self.collection(POSTS_COLLECTION)
    }
}

fn statement(context: &'static str) -> impl FnOnce(mongodb::error::Error) -> AppError {
    move |e| AppError::Statement(format!("{}: {}", context, e))
}

fn title_filter(title: &str) -> Document {
    let mut filter = Document::new();
    filter.insert(fields::TITLE, title);
    filter
}

/// `$match` keeps posts with a matching comment, then `$filter` drops the
/// non-matching siblings from the projected array. Comments whose content is
/// not a string count as non-matching; `$regexMatch` alone would fail on them.
pub fn comment_search_pipeline(pattern: &CommentPattern) -> Vec<Document> {
    vec![
        doc! {
            "$match": {
                "commentaires.contenu": { "$regex": pattern.as_str(), "$options": "i" }
            }
        },
        doc! {
            "$project": {
                "_id": 0,
                "titre": 1,
                "auteur": 1,
                "note": 1,
                "commentaires": {
                    "$filter": {
                        "input": "$commentaires",
                        "as": "commentaire",
                        "cond": {
                            "$and": [
                                { "$eq": [{ "$type": "$$commentaire.contenu" }, "string"] },
                                {
                                    "$regexMatch": {
                                        "input": "$$commentaire.contenu",
                                        "regex": pattern.as_str(),
                                        "options": "i"
                                    }
                                }
                            ]
                        }
                    }
                }
            }
        },
    ]
}

pub fn metadata_filter_document(filter: &MetadataFilter) -> Document {
    let mut query = Document::new();
    query.insert(filter.field_path(), filter.equals.clone());
    // Equality against an array field matches when any element is equal.
    query.insert(filter.array_path(), filter.contains.clone());
    query
}

pub fn metadata_projection() -> Document {
    doc! {
        "_id": 0,
        "titre": 1,
        "auteur.nom": 1,
        "note": 1,
        "metadonnees": 1
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    fn database_name(&self) -> &str {
        self.database.name()
    }

    async fn database_exists(&self) -> AppResult<bool> {
        let names = self
            .client
            .list_database_names()
            .await
            .map_err(statement("Failed to list databases"))?;
        Ok(names.iter().any(|name| name == self.database.name()))
    }

    async fn drop_database(&self) -> AppResult<()> {
        self.database
            .drop()
            .await
            .map_err(statement("Failed to drop database"))
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> AppResult<usize> {
        // The driver rejects an empty batch.
        if documents.is_empty() {
            return Ok(0);
        }

        let result = self
            .collection(collection)
            .insert_many(documents)
            .await
            .map_err(statement("Failed to insert documents"))?;
        debug!(collection, inserted = result.inserted_ids.len(), "insert_many");
        Ok(result.inserted_ids.len())
    }

    async fn count(&self, collection: &str) -> AppResult<u64> {
        self.collection(collection)
            .count_documents(doc! {})
            .await
            .map_err(statement("Failed to count documents"))
    }

    async fn find_all(&self, collection: &str) -> AppResult<Vec<Document>> {
        self.collection(collection)
            .find(doc! {})
            .await
            .map_err(statement("Failed to open cursor"))?
            .try_collect()
            .await
            .map_err(statement("Failed to read cursor"))
    }

    async fn find_by_title(&self, title: &str) -> AppResult<Option<Document>> {
        self.posts()
            .find_one(title_filter(title))
            .await
            .map_err(statement("Failed to find post"))
    }

    async fn set_field(&self, title: &str, path: &str, value: Bson) -> AppResult<UpdateOutcome> {
        let mut set = Document::new();
        set.insert(path, value);

        let result = self
            .posts()
            .update_one(title_filter(title), doc! { "$set": set })
            .await
            .map_err(statement("Failed to update post"))?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn push_to_array(
        &self,
        title: &str,
        path: &str,
        value: Bson,
    ) -> AppResult<UpdateOutcome> {
        let mut push = Document::new();
        push.insert(path, value);

        let result = self
            .posts()
            .update_one(title_filter(title), doc! { "$push": push })
            .await
            .map_err(statement("Failed to push into post"))?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn search_comments(&self, pattern: &CommentPattern) -> AppResult<Vec<Document>> {
        self.posts()
            .aggregate(comment_search_pipeline(pattern))
            .await
            .map_err(statement("Failed to run comment search"))?
            .try_collect()
            .await
            .map_err(statement("Failed to read comment search"))
    }

    async fn find_by_metadata(&self, filter: &MetadataFilter) -> AppResult<Vec<Document>> {
        self.posts()
            .find(metadata_filter_document(filter))
            .projection(metadata_projection())
            .await
            .map_err(statement("Failed to run metadata search"))?
            .try_collect()
            .await
            .map_err(statement("Failed to read metadata search"))
    }
}
