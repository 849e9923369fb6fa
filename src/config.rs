use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use std::env;
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

pub const DOCUMENT_DATABASE: &str = "projet-dd";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub mongo: MongoConfig,
    pub postgres: PostgresConfig,
    pub datasets: DatasetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    pub host: String,
    pub port: u16,
    /// Full connection string; wins over host/port when set.
    pub uri: Option<String>,
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub users_path: PathBuf,
    pub posts_path: PathBuf,
    pub sql_dir: PathBuf,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            mongo: MongoConfig {
                host: var("MONGO_HOST", "localhost"),
                port: parse_port("MONGO_PORT", lookup("MONGO_PORT"), 27017)?,
                uri: lookup("MONGODB_URI"),
                database: DOCUMENT_DATABASE.to_string(),
            },
            postgres: PostgresConfig {
                host: var("DB_HOST", "localhost"),
                port: parse_port("DB_PORT", lookup("DB_PORT"), 5432)?,
                database: var("DB_NAME", "blog_db"),
                user: var("DB_USER", "blog_user"),
                password: var("DB_PASSWORD", "postgresql"),
            },
            datasets: DatasetConfig {
                users_path: var("BLOG_USERS_PATH", "datasets/users.json").into(),
                posts_path: var("BLOG_POSTS_PATH", "datasets/posts.json").into(),
                sql_dir: var("BLOG_SQL_DIR", "sql").into(),
            },
        })
    }
}

impl MongoConfig {
    pub fn connection_string(&self) -> String {
        match &self.uri {
            Some(uri) => uri.clone(),
            None => format!("mongodb://{}:{}/", self.host, self.port),
        }
    }
}

impl PostgresConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }

    /// Connection target without the password, for log lines.
    pub fn display_target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

fn parse_port(key: &str, raw: Option<String>, default: u16) -> AppResult<u16> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| {
            AppError::Configuration(format!("{} must be a port number, got '{}'", key, value))
        }),
    }
}
