// Seeds the document database from the JSON fixtures: drop, recreate, bulk insert.

use mongodb::bson::{Bson, Document};
use serde_json::{Map, Number, Value};
use std::path::Path;
use tracing::info;

use super::store::DocumentStore;
use super::{POSTS_COLLECTION, USERS_COLLECTION};
use crate::config::DatasetConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub dropped_existing: bool,
    pub users: usize,
    pub posts: usize,
}

/// Reads a JSON array of objects. Records are kept verbatim, key order included.
pub fn load_fixture(path: &Path) -> AppResult<Vec<Document>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    let records: Vec<Value> = serde_json::from_str(&raw).map_err(|e| {
        AppError::Serialization(format!("{} is not a JSON array: {}", path.display(), e))
    })?;

    records
        .iter()
        .enumerate()
        .map(|(index, record)| match record {
            Value::Object(fields) => object_to_document(fields),
            _ => Err(AppError::Serialization(format!(
                "{} record {} is not a JSON object",
                path.display(),
                index
            ))),
        })
        .collect()
}

/// Integers keep the narrowest BSON width that holds them, as drivers store
/// them: Int32 when the value fits, Int64 otherwise.
fn number_to_bson(number: &Number) -> AppResult<Bson> {
    if let Some(value) = number.as_i64() {
        return Ok(match i32::try_from(value) {
            Ok(narrow) => Bson::Int32(narrow),
            Err(_) => Bson::Int64(value),
        });
    }
    if number.is_u64() {
        return Err(AppError::Serialization(format!(
            "{} does not fit in a signed 64-bit integer",
            number
        )));
    }
    number
        .as_f64()
        .map(Bson::Double)
        .ok_or_else(|| AppError::Serialization(format!("unsupported number {}", number)))
}

fn value_to_bson(value: &Value) -> AppResult<Bson> {
    Ok(match value {
        Value::Null => Bson::Null,
        Value::Bool(flag) => Bson::Boolean(*flag),
        Value::Number(number) => number_to_bson(number)?,
        Value::String(text) => Bson::String(text.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(value_to_bson).collect::<AppResult<_>>()?),
        Value::Object(fields) => Bson::Document(object_to_document(fields)?),
    })
}

fn object_to_document(fields: &Map<String, Value>) -> AppResult<Document> {
    let mut document = Document::new();
    for (key, value) in fields {
        document.insert(key.clone(), value_to_bson(value)?);
    }
    Ok(document)
}

/// Loads both fixtures, then replaces the database with their content.
///
/// Fixtures are parsed before anything is dropped, so a broken file leaves the
/// previous database in place.
pub async fn seed_database(
    store: &dyn DocumentStore,
    datasets: &DatasetConfig,
) -> AppResult<SeedSummary> {
    let users = load_fixture(&datasets.users_path)?;
    let posts = load_fixture(&datasets.posts_path)?;
    seed_documents(store, users, posts).await
}

pub async fn seed_documents(
    store: &dyn DocumentStore,
    users: Vec<Document>,
    posts: Vec<Document>,
) -> AppResult<SeedSummary> {
    let dropped_existing = store.database_exists().await?;
    if dropped_existing {
        info!(database = store.database_name(), "dropping existing database");
        store.drop_database().await?;
    }

    let users = store.insert_many(USERS_COLLECTION, users).await?;
    let posts = store.insert_many(POSTS_COLLECTION, posts).await?;
    info!(users, posts, "database seeded");

    Ok(SeedSummary {
        dropped_existing,
        users,
        posts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fixture(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_fixture_keeps_fields_and_order() {
        let file = fixture(r#"[{"zeta": 1, "alpha": {"nested": [1, 2]}, "titre": "A"}, {"x": null}]"#);
        let documents = load_fixture(file.path()).unwrap();

        assert_eq!(documents.len(), 2);
        let keys: Vec<&str> = documents[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "titre"]);
        assert!(documents[1].contains_key("x"));
    }

    #[test]
    fn test_load_fixture_keeps_integer_widths() {
        let file = fixture(
            r#"[{"vues": 1520, "neg": -3, "note": 4.5, "big": 3000000000, "nested": {"n": [7]}}]"#,
        );
        let documents = load_fixture(file.path()).unwrap();
        let record = &documents[0];

        assert_eq!(record.get("vues"), Some(&Bson::Int32(1520)));
        assert_eq!(record.get("neg"), Some(&Bson::Int32(-3)));
        assert_eq!(record.get("note"), Some(&Bson::Double(4.5)));
        assert_eq!(record.get("big"), Some(&Bson::Int64(3_000_000_000)));
        let nested = record.get_document("nested").unwrap();
        assert_eq!(nested.get_array("n").unwrap(), &vec![Bson::Int32(7)]);
    }

    #[test]
    fn test_load_fixture_rejects_unsigned_overflow() {
        let file = fixture(r#"[{"huge": 18446744073709551615}]"#);
        assert!(matches!(
            load_fixture(file.path()).unwrap_err(),
            AppError::Serialization(_)
        ));
    }

    #[test]
    fn test_load_fixture_rejects_non_objects() {
        let file = fixture(r#"[{"ok": true}, 3]"#);
        let err = load_fixture(file.path()).unwrap_err();
        assert!(matches!(err, AppError::Serialization(msg) if msg.contains("record 1")));
    }

    #[test]
    fn test_load_fixture_missing_file_is_io_error() {
        let err = load_fixture(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn test_load_fixture_rejects_top_level_object() {
        let file = fixture(r#"{"titre": "A"}"#);
        assert!(matches!(
            load_fixture(file.path()).unwrap_err(),
            AppError::Serialization(_)
        ));
    }
}
