//! The remote spreadsheet store.
//!
//! The engine only talks to [`RemoteStore`] and [`AuthProvider`]; the
//! production implementations are [`sheets::SheetsClient`] and
//! [`auth::OAuthRefresher`], tests use `memory::MemoryRemote`.

pub mod auth;
#[cfg(test)]
pub mod memory;
pub mod sheets;

use crate::error::Result;
use async_trait::async_trait;
use common::model::{RawRecord, RemoteFile};
use common::schema::codec;

/// Title used for records that do not remember which sheet they came from.
pub const DEFAULT_SHEET: &str = "Sheet1";

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Replaces the bearer credential used for every following call.
    fn set_token(&self, token: Option<String>);

    /// Spreadsheets in a folder, most recently modified first.
    async fn list_files(&self, folder_id: &str) -> Result<Vec<RemoteFile>>;

    /// Every classified sheet of a file, decoded into records.
    async fn fetch_tabular_data(&self, file_id: &str) -> Result<Vec<RawRecord>>;

    /// Overwrites each sheet named by the records' titles.
    async fn write_tabular_data(&self, file_id: &str, records: &[RawRecord]) -> Result<()>;

    /// Creates a spreadsheet in the backup folder holding `records`.
    async fn create_file(&self, name: &str, records: &[RawRecord]) -> Result<RemoteFile>;

    /// Appends raw rows after the last row of the file's first sheet.
    async fn append_rows(&self, file_id: &str, rows: Vec<Vec<String>>) -> Result<()>;
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Obtains a fresh access token without user interaction.
    async fn refresh(&self) -> Result<String>;
}

/// Splits records by sheet title, in order of first appearance, and encodes
/// each group as a header row followed by data rows.
pub fn encode_sheets(records: &[RawRecord]) -> Vec<(String, Vec<Vec<String>>)> {
    let mut groups: Vec<(String, Vec<RawRecord>)> = Vec::new();
    for record in records {
        let title = if record.sheet_title.is_empty() {
            DEFAULT_SHEET
        } else {
            record.sheet_title.as_str()
        };
        match groups.iter_mut().find(|(t, _)| t == title) {
            Some((_, group)) => group.push(record.clone()),
            None => groups.push((title.to_string(), vec![record.clone()])),
        }
    }
    groups
        .into_iter()
        .map(|(title, group)| (title, codec::encode(&group)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::RelationTag;

    fn record(title: &str, number: &str) -> RawRecord {
        let mut r = RawRecord::new(title, RelationTag::Assets, 1);
        r.set("no", number);
        r
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let records = [
            record("Assets", "A1"),
            record("", "A2"),
            record("Assets", "A3"),
        ];

        let sheets = encode_sheets(&records);

        let titles: Vec<_> = sheets.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(titles, vec!["Assets", DEFAULT_SHEET]);
        // header + two rows
        assert_eq!(sheets[0].1.len(), 3);
        assert_eq!(sheets[0].1[2][0], "A3");
    }
}
