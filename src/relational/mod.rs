// Relational model: normalized blog tables in PostgreSQL and the timed query suite.

pub mod benchmark;
pub mod comment_tree;
pub mod database;
pub mod queries;
pub mod report;
pub mod suite;

pub use benchmark::{BenchmarkEntry, BenchmarkReport};
pub use comment_tree::{thread_comments, FlatComment, ThreadedComment};
pub use database::{ColumnSpec, PgSession, Timed, ARTICLE_RATING};
pub use queries::RelationalDemo;
pub use suite::run_suite;

/// Script that creates the tables, relative to the SQL directory.
pub const SCHEMA_SCRIPT: &str = "schema.sql";
/// Script that fills an empty database with sample rows.
pub const SEED_SCRIPT: &str = "seed.sql";
