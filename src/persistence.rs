//! SQLite-backed key-value store for settings and habits.
//!
//! Reads never fail: anything missing or unreadable falls back to the caller's
//! default. Writes are best effort and only logged on failure.

use directories::ProjectDirs;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key holding the [`TimerSettings`](crate::models::TimerSettings).
pub const SETTINGS_KEY: &str = "focusnest-pomodoro-settings";
/// Key holding the habit list.
pub const HABITS_KEY: &str = "focusnest-habits";

/// Overrides the database location.
pub const DB_PATH_ENV: &str = "FOCUSNEST_DB";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to create database directory")]
    DirectoryCreation,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens the store at the default location, creating it if needed.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(&Self::default_path())
    }

    /// Opens (or creates) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|_| StoreError::DirectoryCreation)?;
        }

        let conn = Connection::open(path)?;
        Self::initialize_tables(&conn)?;
        log::debug!("Opened store at {}", path.display());

        Ok(Self { conn })
    }

    /// Creates an in-memory store (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_tables(&conn)?;
        Ok(Self { conn })
    }

    fn initialize_tables(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(DB_PATH_ENV).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        ProjectDirs::from("com", "focusnest", "FocusNest")
            .map(|dirs| dirs.data_dir().join("focusnest.db"))
            .unwrap_or_else(|| PathBuf::from("focusnest.db"))
    }

    /// Returns the value stored under `key`, or `default` if it is absent or
    /// cannot be decoded.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.read(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                log::warn!("Ignoring unreadable value for {}: {}", key, e);
                default
            }
        }
    }

    /// Stores `value` under `key`. Failures are logged and otherwise ignored.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.write(key, value) {
            log::warn!("Failed to save {}: {}", key, e);
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let json: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;

        match json {
            Some(j) => Ok(Some(serde_json::from_str(&j)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)",
            [key, json.as_str()],
        )?;
        Ok(())
    }

    #[cfg(test)]
    fn write_raw(&self, key: &str, raw: &str) {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)",
                [key, raw],
            )
            .unwrap();
    }
}
