// Blog database - the same blog stored as documents (MongoDB) and as
// normalized tables (PostgreSQL), with demonstration queries for each.

// Environment configuration and logging
pub mod config;
pub mod telemetry;

// Document model
pub mod document;

// Relational model
pub mod relational;

// Common utilities
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
