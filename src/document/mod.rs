// Document model: schema-less posts and users seeded from JSON fixtures.

pub mod memory;
pub mod mongo;
pub mod queries;
pub mod report;
pub mod seed;
pub mod store;

pub use memory::MemoryDocumentStore;
pub use mongo::MongoDocumentStore;
pub use queries::{DocumentDemo, NewComment};
pub use seed::{load_fixture, seed_database, seed_documents, SeedSummary};
pub use store::{CommentPattern, DocumentStore, MetadataFilter, UpdateOutcome};

pub const USERS_COLLECTION: &str = "users";
pub const POSTS_COLLECTION: &str = "posts";

/// Field names used by the fixtures and the demonstrations.
pub mod fields {
    pub const TITLE: &str = "titre";
    pub const AUTHOR: &str = "auteur";
    pub const RATING: &str = "note";
    pub const COMMENTS: &str = "commentaires";
    pub const COMMENT_ID: &str = "id_commentaire";
    pub const CONTENT: &str = "contenu";
    pub const DATE: &str = "date";
    pub const REPLIES: &str = "reponses";
    pub const METADATA: &str = "metadonnees";
}
