//! Google Drive / Sheets implementation of [`RemoteStore`].

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::remote::{encode_sheets, RemoteStore};
use async_trait::async_trait;
use common::model::{RawRecord, RemoteFile};
use common::schema::ingest_sheet;
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::RwLock;
use std::time::Duration;

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
/// Column span read from every sheet.
const READ_SPAN: &str = "A:ZZ";

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<RemoteFile>,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub struct SheetsClient {
    client: Client,
    drive_api_url: String,
    sheets_api_url: String,
    backup_folder_id: String,
    token: RwLock<Option<String>>,
}

impl SheetsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SyncError::from_transport(e, "HTTP client setup"))?;
        Ok(Self {
            client,
            drive_api_url: config.drive_api_url.clone(),
            sheets_api_url: config.sheets_api_url.clone(),
            backup_folder_id: config.backup_folder_id.clone(),
            token: RwLock::new(None),
        })
    }

    fn token(&self) -> Result<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(SyncError::Unauthenticated)
    }

    fn url(base: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(base)
            .map_err(|e| SyncError::ConfigurationMissing(format!("API url {base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| SyncError::ConfigurationMissing(format!("API url {base}")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        let token = self.token()?;
        request
            .bearer_auth(token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SyncError::from_transport(e, context))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T> {
        let body = self
            .send(request, context)
            .await?
            .text()
            .await
            .map_err(|e| SyncError::from_transport(e, context))?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn sheet_titles(&self, file_id: &str) -> Result<Vec<String>> {
        let mut url = Self::url(&self.sheets_api_url, &["spreadsheets", file_id])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets(properties(title))");
        let meta: SpreadsheetMeta = self
            .send_json(self.client.get(url), "spreadsheet metadata")
            .await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    async fn sheet_values(&self, file_id: &str, title: &str) -> Result<Vec<Vec<String>>> {
        let range = format!("{title}!{READ_SPAN}");
        let url = Self::url(
            &self.sheets_api_url,
            &["spreadsheets", file_id, "values", &range],
        )?;
        let block: ValueRange = self
            .send_json(self.client.get(url), &format!("{title} sheet read"))
            .await?;
        Ok(block
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn put_values(&self, file_id: &str, title: &str, values: Vec<Vec<String>>) -> Result<()> {
        let range = format!("{title}!A1");
        let mut url = Self::url(
            &self.sheets_api_url,
            &["spreadsheets", file_id, "values", &range],
        )?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        self.send(
            self.client.put(url).json(&json!({ "values": values })),
            &format!("{title} sheet update"),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for SheetsClient {
    fn set_token(&self, token: Option<String>) {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }

    async fn list_files(&self, folder_id: &str) -> Result<Vec<RemoteFile>> {
        if folder_id.is_empty() {
            return Err(SyncError::ConfigurationMissing("folder id".to_string()));
        }
        let mut url = Self::url(&self.drive_api_url, &["files"])?;
        url.query_pairs_mut()
            .append_pair(
                "q",
                &format!(
                    "'{folder_id}' in parents and mimeType='{SPREADSHEET_MIME}' and trashed=false"
                ),
            )
            .append_pair("fields", "files(id,name,modifiedTime)")
            .append_pair("orderBy", "modifiedTime desc");
        let list: FileList = self.send_json(self.client.get(url), "file listing").await?;
        debug!("Folder {} lists {} spreadsheets", folder_id, list.files.len());
        Ok(list.files)
    }

    async fn fetch_tabular_data(&self, file_id: &str) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        for title in self.sheet_titles(file_id).await? {
            match self.sheet_values(file_id, &title).await {
                Ok(values) => records.extend(ingest_sheet(&title, &values)),
                Err(SyncError::AuthExpired) => return Err(SyncError::AuthExpired),
                Err(e) => warn!("Skipping sheet \"{}\" of {}: {}", title, file_id, e),
            }
        }
        info!("Fetched {} records from {}", records.len(), file_id);
        Ok(records)
    }

    async fn write_tabular_data(&self, file_id: &str, records: &[RawRecord]) -> Result<()> {
        for (title, values) in encode_sheets(records) {
            self.put_values(file_id, &title, values).await?;
        }
        Ok(())
    }

    async fn create_file(&self, name: &str, records: &[RawRecord]) -> Result<RemoteFile> {
        if self.backup_folder_id.is_empty() {
            return Err(SyncError::ConfigurationMissing(
                "backup folder id".to_string(),
            ));
        }
        let sheets = encode_sheets(records);
        let tabs: Vec<Value> = sheets
            .iter()
            .map(|(title, _)| json!({ "properties": { "title": title } }))
            .collect();
        let url = Self::url(&self.sheets_api_url, &["spreadsheets"])?;
        let mut body = json!({ "properties": { "title": name } });
        if !tabs.is_empty() {
            body["sheets"] = Value::Array(tabs);
        }
        let created: CreatedSpreadsheet = self
            .send_json(self.client.post(url).json(&body), "spreadsheet creation")
            .await?;

        let mut move_url = Self::url(&self.drive_api_url, &["files", &created.spreadsheet_id])?;
        move_url
            .query_pairs_mut()
            .append_pair("addParents", &self.backup_folder_id)
            .append_pair("removeParents", "root");
        self.send(
            self.client.patch(move_url).json(&json!({})),
            "moving spreadsheet to backup folder",
        )
        .await?;

        for (title, values) in sheets {
            self.put_values(&created.spreadsheet_id, &title, values)
                .await?;
        }
        info!("Created spreadsheet \"{}\" ({})", name, created.spreadsheet_id);
        Ok(RemoteFile {
            id: created.spreadsheet_id,
            name: name.to_string(),
            modified_time: None,
        })
    }

    async fn append_rows(&self, file_id: &str, rows: Vec<Vec<String>>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut url = Self::url(
            &self.sheets_api_url,
            &["spreadsheets", file_id, "values", "A1:append"],
        )?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");
        self.send(
            self.client.post(url).json(&json!({ "values": rows })),
            "row append",
        )
        .await?;
        Ok(())
    }
}
