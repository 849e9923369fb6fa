// Relational session - one PostgreSQL connection for the lifetime of a binary.
// Reads are timed around execute-and-fetch, writes around execute-and-commit.

use sqlx::postgres::{PgArguments, PgConnection, PgRow};
use sqlx::query::QueryAs;
use sqlx::{Connection, Executor, FromRow, Postgres};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::PostgresConfig;
use crate::error::{AppError, AppResult};

/// Rows (or any value) together with the wall-clock time spent in the database.
#[derive(Debug, Clone)]
pub struct Timed<T> {
    pub value: T,
    pub elapsed: Duration,
}

impl<T> Timed<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Timed<U> {
        Timed {
            value: f(self.value),
            elapsed: self.elapsed,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

/// A column added on demand. Names are unquoted identifiers, so they are
/// stored in the lowercase form PostgreSQL keeps in its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub table: &'static str,
    pub column: &'static str,
    pub definition: &'static str,
}

pub const ARTICLE_RATING: ColumnSpec = ColumnSpec {
    table: "article",
    column: "note",
    definition: "DECIMAL(3,2)",
};

impl ColumnSpec {
    pub fn validate(&self) -> AppResult<()> {
        validate_identifier(self.table)?;
        validate_identifier(self.column)
    }

    pub fn alter_statement(&self) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {}",
            self.table, self.column, self.definition
        )
    }
}

fn validate_identifier(name: &str) -> AppResult<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::Configuration(format!(
            "'{}' is not a lowercase SQL identifier",
            name
        )))
    }
}

fn statement_error(label: &str, err: sqlx::Error) -> AppError {
    AppError::Statement(format!("{}: {}", label, err))
}

pub struct PgSession {
    conn: PgConnection,
}

impl PgSession {
    pub async fn connect(config: &PostgresConfig) -> AppResult<Self> {
        let conn = PgConnection::connect_with(&config.connect_options())
            .await
            .map_err(|e| {
                AppError::Connection(format!(
                    "Failed to connect to PostgreSQL at {}: {}",
                    config.display_target(),
                    e
                ))
            })?;
        info!(server = %config.display_target(), "connected to PostgreSQL");
        Ok(Self { conn })
    }

    /// Health check to verify database connectivity
    pub async fn health_check(&mut self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&mut self.conn)
            .await
            .map_err(|e| AppError::Connection(format!("Database health check failed: {}", e)))?;
        Ok(())
    }

    pub async fn close(self) -> AppResult<()> {
        self.conn
            .close()
            .await
            .map_err(|e| AppError::Connection(format!("Failed to close connection: {}", e)))
    }

    /// Runs a multi-statement script in one transaction.
    pub async fn apply_script(&mut self, label: &str, script: &str) -> AppResult<()> {
        let mut tx = self
            .conn
            .begin()
            .await
            .map_err(|e| statement_error(label, e))?;

        if let Err(e) = (&mut *tx).execute(script).await {
            if let Err(rollback) = tx.rollback().await {
                warn!(label, error = %rollback, "rollback failed");
            }
            return Err(statement_error(label, e));
        }

        tx.commit().await.map_err(|e| statement_error(label, e))?;
        info!(label, "script applied");
        Ok(())
    }

    /// Adds the column unless the catalog already lists it for the current
    /// schema. Returns whether the column was added; reruns are no-ops.
    pub async fn ensure_column(&mut self, spec: &ColumnSpec) -> AppResult<bool> {
        spec.validate()?;
        let label = "ensure_column";

        let mut tx = self
            .conn
            .begin()
            .await
            .map_err(|e| statement_error(label, e))?;

        let exists = match sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.columns
                WHERE table_schema = current_schema()
                  AND table_name = $1
                  AND column_name = $2
            )
            "#,
        )
        .bind(spec.table)
        .bind(spec.column)
        .fetch_one(&mut *tx)
        .await
        {
            Ok(exists) => exists,
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(label, error = %rollback, "rollback failed");
                }
                return Err(statement_error(label, e));
            }
        };

        if !exists {
            let alter = spec.alter_statement();
            if let Err(e) = sqlx::query(&alter).execute(&mut *tx).await {
                if let Err(rollback) = tx.rollback().await {
                    warn!(label, error = %rollback, "rollback failed");
                }
                return Err(statement_error(label, e));
            }
        }

        tx.commit().await.map_err(|e| statement_error(label, e))?;

        if exists {
            debug!(table = spec.table, column = spec.column, "column already present");
        } else {
            info!(table = spec.table, column = spec.column, "column added");
        }
        Ok(!exists)
    }

    pub async fn fetch_all_timed<'q, T>(
        &mut self,
        label: &str,
        query: QueryAs<'q, Postgres, T, PgArguments>,
    ) -> AppResult<Timed<Vec<T>>>
    where
        T: Send + Unpin + for<'r> FromRow<'r, PgRow>,
    {
        let started = Instant::now();
        let rows = query
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| statement_error(label, e))?;
        let elapsed = started.elapsed();

        debug!(label, rows = rows.len(), elapsed_us = elapsed.as_micros() as u64, "query");
        Ok(Timed {
            value: rows,
            elapsed,
        })
    }

    /// Runs a returning write in its own transaction: committed on success,
    /// rolled back on failure.
    pub async fn write_timed<'q, T>(
        &mut self,
        label: &str,
        query: QueryAs<'q, Postgres, T, PgArguments>,
    ) -> AppResult<Timed<Vec<T>>>
    where
        T: Send + Unpin + for<'r> FromRow<'r, PgRow>,
    {
        let mut tx = self
            .conn
            .begin()
            .await
            .map_err(|e| statement_error(label, e))?;

        let started = Instant::now();
        let rows = match query.fetch_all(&mut *tx).await {
            Ok(rows) => rows,
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(label, error = %rollback, "rollback failed");
                }
                return Err(statement_error(label, e));
            }
        };
        tx.commit().await.map_err(|e| statement_error(label, e))?;
        let elapsed = started.elapsed();

        debug!(label, rows = rows.len(), elapsed_us = elapsed.as_micros() as u64, "write");
        Ok(Timed {
            value: rows,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_column_statement() {
        assert!(ARTICLE_RATING.validate().is_ok());
        assert_eq!(
            ARTICLE_RATING.alter_statement(),
            "ALTER TABLE article ADD COLUMN IF NOT EXISTS note DECIMAL(3,2)"
        );
    }

    #[test]
    fn test_identifiers_must_be_plain_lowercase() {
        for bad in ["Article", "note; DROP TABLE x", "1col", "", "col-name"] {
            let spec = ColumnSpec {
                table: "article",
                column: bad,
                definition: "INTEGER",
            };
            assert!(
                matches!(spec.validate(), Err(AppError::Configuration(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_timed_map_keeps_elapsed() {
        let timed = Timed {
            value: vec![1, 2, 3],
            elapsed: Duration::from_millis(12),
        };
        let mapped = timed.map(|rows| rows.len());
        assert_eq!(mapped.value, 3);
        assert_eq!(mapped.elapsed_ms(), 12.0);
    }
}
