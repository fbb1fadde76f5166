use std::str::FromStr as _;

use anyhow::Context as _;
use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct DatabaseConfig {
    path: String,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub async fn new_pool(&self) -> anyhow::Result<sqlx::SqlitePool> {
        let options = SqliteConnectOptions::from_str(&self.url())
            .with_context(|| format!("Invalid database path {}", self.path))?
            .create_if_missing(true);

        SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("Error connecting to database {}", self.path))
    }

    //a private in-memory database lives only as long as its single connection
    pub async fn new_in_memory_pool() -> anyhow::Result<sqlx::SqlitePool> {
        SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Error creating in-memory database")
    }

    fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite://{}", self.path)
        }
    }
}
