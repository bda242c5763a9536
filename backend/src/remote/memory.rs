//! In-memory remote store and auth provider for tests.

use crate::error::{Result, SyncError};
use crate::remote::{encode_sheets, AuthProvider, RemoteStore, DEFAULT_SHEET};
use async_trait::async_trait;
use common::model::{RawRecord, RemoteFile};
use common::schema::ingest_sheet;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Network,
    Auth,
    Rejected(u16),
}

impl Failure {
    fn into_error(self) -> SyncError {
        match self {
            Failure::Network => SyncError::NetworkUnavailable("connection reset".into()),
            Failure::Auth => SyncError::AuthExpired,
            Failure::Rejected(status) => SyncError::RemoteRejected {
                status,
                context: "memory store".into(),
            },
        }
    }
}

type Block = Vec<Vec<String>>;

#[derive(Default)]
struct Inner {
    token: Option<String>,
    folders: HashMap<String, Vec<RemoteFile>>,
    sheets: HashMap<String, Vec<(String, Block)>>,
    writes: Vec<String>,
    failures: VecDeque<Failure>,
    next_id: usize,
}

/// Files live in folders; each file is a list of titled blocks, decoded the
/// same way as the real store.
pub struct MemoryRemote {
    inner: Mutex<Inner>,
    backup_folder: String,
    write_delay: Mutex<Option<Duration>>,
    fetch_delay: Mutex<Option<Duration>>,
}

impl MemoryRemote {
    pub fn new(backup_folder: &str) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            backup_folder: backup_folder.to_string(),
            write_delay: Mutex::new(None),
            fetch_delay: Mutex::new(None),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn add_file(&self, folder: &str, id: &str, name: &str, records: &[RawRecord]) {
        let mut inner = self.inner();
        inner.folders.entry(folder.to_string()).or_default().push(RemoteFile {
            id: id.to_string(),
            name: name.to_string(),
            modified_time: None,
        });
        inner.sheets.insert(id.to_string(), encode_sheets(records));
    }

    /// Replaces a file's content in place.
    pub fn set_records(&self, id: &str, records: &[RawRecord]) {
        self.inner()
            .sheets
            .insert(id.to_string(), encode_sheets(records));
    }

    pub fn fail_next(&self, failure: Failure) {
        self.inner().failures.push_back(failure);
    }

    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock().unwrap_or_else(|p| p.into_inner()) = Some(delay);
    }

    /// Fetches read the content at call time and answer after `delay`.
    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap_or_else(|p| p.into_inner()) = Some(delay);
    }

    /// Ids of files written by `write_tabular_data`, in call order.
    pub fn writes(&self) -> Vec<String> {
        self.inner().writes.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner().token.clone()
    }

    pub fn files_in(&self, folder: &str) -> Vec<RemoteFile> {
        self.inner().folders.get(folder).cloned().unwrap_or_default()
    }

    pub fn records(&self, id: &str) -> Vec<RawRecord> {
        self.inner()
            .sheets
            .get(id)
            .map(|sheets| {
                sheets
                    .iter()
                    .flat_map(|(title, block)| ingest_sheet(title, block))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn check(&self) -> Result<()> {
        let mut inner = self.inner();
        if inner.token.is_none() {
            return Err(SyncError::Unauthenticated);
        }
        match inner.failures.pop_front() {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    fn set_token(&self, token: Option<String>) {
        self.inner().token = token;
    }

    async fn list_files(&self, folder_id: &str) -> Result<Vec<RemoteFile>> {
        self.check()?;
        Ok(self.files_in(folder_id))
    }

    async fn fetch_tabular_data(&self, file_id: &str) -> Result<Vec<RawRecord>> {
        self.check()?;
        let records = self.records(file_id);
        let delay = *self.fetch_delay.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(records)
    }

    async fn write_tabular_data(&self, file_id: &str, records: &[RawRecord]) -> Result<()> {
        self.check()?;
        let delay = *self.write_delay.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut inner = self.inner();
        inner.writes.push(file_id.to_string());
        let sheets = inner.sheets.entry(file_id.to_string()).or_default();
        for (title, block) in encode_sheets(records) {
            match sheets.iter_mut().find(|(t, _)| *t == title) {
                Some((_, existing)) => *existing = block,
                None => sheets.push((title, block)),
            }
        }
        Ok(())
    }

    async fn create_file(&self, name: &str, records: &[RawRecord]) -> Result<RemoteFile> {
        self.check()?;
        let id = {
            let mut inner = self.inner();
            inner.next_id += 1;
            format!("created-{}", inner.next_id)
        };
        self.add_file(&self.backup_folder, &id, name, records);
        Ok(RemoteFile {
            id,
            name: name.to_string(),
            modified_time: None,
        })
    }

    async fn append_rows(&self, file_id: &str, rows: Vec<Vec<String>>) -> Result<()> {
        self.check()?;
        let mut inner = self.inner();
        let sheets = inner.sheets.entry(file_id.to_string()).or_default();
        if sheets.is_empty() {
            sheets.push((DEFAULT_SHEET.to_string(), Vec::new()));
        }
        sheets[0].1.extend(rows);
        Ok(())
    }
}

/// Auth provider answering from a script of outcomes; `None` means failure.
pub struct ScriptedAuth {
    outcomes: Mutex<VecDeque<Option<String>>>,
}

impl ScriptedAuth {
    /// Fails every refresh.
    pub fn empty() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
        }
    }

    pub fn new(outcomes: impl IntoIterator<Item = Option<&'static str>>) -> Self {
        Self {
            outcomes: Mutex::new(
                outcomes
                    .into_iter()
                    .map(|o| o.map(str::to_string))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl AuthProvider for ScriptedAuth {
    async fn refresh(&self) -> Result<String> {
        self.outcomes
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
            .flatten()
            .ok_or(SyncError::AuthExpired)
    }
}
