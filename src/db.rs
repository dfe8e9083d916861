//! SQLite pool for the content store.
//!
//! The database file and its parent directory are created on first use.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::Config;

/// Pool size; the assistant only reads on the hot path.
const MAX_CONNECTIONS: u32 = 5;

pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database: {}", db_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_at(path: &std::path::Path) -> Config {
        toml::from_str(&format!("[db]\npath = {:?}\n", path.display().to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_connect_creates_nested_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("data/nested/assistant.sqlite");
        let pool = connect(&config_at(&path)).await.unwrap();

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_connect_reports_unusable_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = connect(&config_at(&blocker.join("assistant.sqlite")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("database directory"), "{}", err);
    }
}
