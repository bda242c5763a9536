//! Durable local state.
//!
//! Everything the engine needs to resume without the network is kept in a
//! single `kv` table of JSON values. Each key loads independently; a value
//! that no longer deserializes is logged and treated as absent.

use crate::error::Result;
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
#[cfg(test)]
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

mod writer;

pub use writer::StoreWriter;

pub const CACHED_ASSETS: &str = "cached_assets";
pub const CACHED_USERS: &str = "cached_users";
pub const CACHED_TRADE_LOGS: &str = "cached_trade_logs";
pub const CACHED_GLOBAL_TRADE_LOGS: &str = "cached_global_trade_logs";
pub const CURRENT_SESSION_FILE: &str = "current_session_file";
pub const CACHED_SCANNED_IDS: &str = "cached_scanned_ids";
pub const LAST_MASTER_SYNC: &str = "last_master_sync";
pub const HAS_PENDING_SYNC: &str = "has_pending_sync";
pub const ACCESS_TOKEN: &str = "access_token";

pub struct LocalStore {
    conn: Mutex<Connection>,
}

impl LocalStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave the table half-written.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw: Option<String> = match self
            .conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Could not read \"{}\" from the local store: {}", key, e);
                return None;
            }
        };
        let raw = raw?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring corrupt \"{}\" in the local store: {}", key, e);
                None
            }
        }
    }

    #[cfg(test)]
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.set_raw(key, &serde_json::to_string(value)?)
    }

    /// Stores an already serialized JSON value.
    pub fn set_raw(&self, key: &str, raw: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, raw],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.conn().execute("DELETE FROM kv", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::RemoteFile;

    #[test]
    fn values_survive_reopening() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("inspection.sqlite");
        let file = RemoteFile {
            id: "1abc".into(),
            name: "2024 Q1".into(),
            modified_time: None,
        };

        {
            let store = LocalStore::open(&path).expect("open store");
            store.set(CURRENT_SESSION_FILE, &file).expect("write file");
            store
                .set(CACHED_SCANNED_IDS, &vec!["A1".to_string(), "A2".to_string()])
                .expect("write ids");
            store.set(HAS_PENDING_SYNC, &true).expect("write flag");
        }

        let store = LocalStore::open(&path).expect("reopen store");
        assert_eq!(store.get::<RemoteFile>(CURRENT_SESSION_FILE), Some(file));
        assert_eq!(
            store.get::<Vec<String>>(CACHED_SCANNED_IDS),
            Some(vec!["A1".to_string(), "A2".to_string()])
        );
        assert_eq!(store.get::<bool>(HAS_PENDING_SYNC), Some(true));
    }

    #[test]
    fn set_overwrites_and_remove_clears() {
        let store = LocalStore::in_memory().expect("store");
        store.set(ACCESS_TOKEN, "first").expect("write");
        store.set(ACCESS_TOKEN, "second").expect("overwrite");
        assert_eq!(store.get::<String>(ACCESS_TOKEN).as_deref(), Some("second"));

        store.remove(ACCESS_TOKEN).expect("remove");
        assert_eq!(store.get::<String>(ACCESS_TOKEN), None);
    }

    #[test]
    fn corrupt_value_reads_as_absent() {
        let store = LocalStore::in_memory().expect("store");
        store.set(CACHED_ASSETS, "not a list").expect("write");
        store.set(LAST_MASTER_SYNC, "2024-01-01T06:00:00Z").expect("write");

        assert!(store.get::<Vec<common::model::Asset>>(CACHED_ASSETS).is_none());
        assert!(store
            .get::<chrono::DateTime<chrono::Utc>>(LAST_MASTER_SYNC)
            .is_some());

        store.clear().expect("clear");
        assert!(store.get::<String>(LAST_MASTER_SYNC).is_none());
    }
}
