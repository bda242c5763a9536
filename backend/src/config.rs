//! Runtime configuration.
//!
//! Values come from an optional JSON file named by `INSPECTION_CONFIG`, then
//! individual environment variables override single fields. Everything has a
//! default so the server starts without any configuration; the folder ids are
//! the exception and their absence surfaces as `ConfigurationMissing` when an
//! operation needs them.

use common::model::CanonicalField;
use common::schema::AliasRegistry;
use log::{info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Drive folder holding the master spreadsheets.
    pub master_folder_id: String,
    /// Drive folder receiving session files and backups.
    pub backup_folder_id: String,
    /// Name of the spreadsheet (in the backup folder) accumulating movements.
    pub trade_log_file_name: String,
    pub db_path: String,
    pub debounce_ms: u64,
    /// Local hour after which the master data counts as stale for the day.
    pub master_sync_hour: u32,
    pub reference_limit: usize,
    pub drive_api_url: String,
    pub sheets_api_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Extra header spellings per canonical field.
    pub extra_aliases: HashMap<CanonicalField, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            master_folder_id: String::new(),
            backup_folder_id: String::new(),
            trade_log_file_name: "Global_Trade_Log".to_string(),
            db_path: "inspection.sqlite".to_string(),
            debounce_ms: 3000,
            master_sync_hour: 6,
            reference_limit: common::reconcile::trade_log::DEFAULT_REFERENCE_LIMIT,
            drive_api_url: "https://www.googleapis.com/drive/v3".to_string(),
            sheets_api_url: "https://sheets.googleapis.com/v4".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: String::new(),
            extra_aliases: HashMap::new(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let mut config = match env::var("INSPECTION_CONFIG") {
            Ok(path) => match fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|raw| serde_json::from_str::<Config>(&raw).map_err(|e| e.to_string()))
            {
                Ok(config) => {
                    info!("Loaded configuration from {}", path);
                    config
                }
                Err(e) => {
                    warn!("Ignoring configuration file {}: {}", path, e);
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        };
        config.apply_env(|key| env::var(key).ok());
        config
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let text_fields: [(&str, &mut String); 9] = [
            ("INSPECTION_HOST", &mut self.host),
            ("INSPECTION_MASTER_FOLDER_ID", &mut self.master_folder_id),
            ("INSPECTION_BACKUP_FOLDER_ID", &mut self.backup_folder_id),
            ("INSPECTION_TRADE_LOG_FILE", &mut self.trade_log_file_name),
            ("INSPECTION_DB_PATH", &mut self.db_path),
            ("GOOGLE_CLIENT_ID", &mut self.client_id),
            ("GOOGLE_CLIENT_SECRET", &mut self.client_secret),
            ("GOOGLE_REFRESH_TOKEN", &mut self.refresh_token),
            ("GOOGLE_TOKEN_URL", &mut self.token_url),
        ];
        for (key, slot) in text_fields {
            if let Some(value) = lookup(key) {
                *slot = value;
            }
        }
        if let Some(port) = lookup("INSPECTION_PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Some(ms) = lookup("INSPECTION_DEBOUNCE_MS").and_then(|p| p.parse().ok()) {
            self.debounce_ms = ms;
        }
        if let Some(hour) = lookup("INSPECTION_MASTER_SYNC_HOUR").and_then(|p| p.parse().ok()) {
            self.master_sync_hour = hour;
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Built-in aliases plus the configured extras.
    pub fn alias_registry(&self) -> AliasRegistry {
        let mut registry = AliasRegistry::default();
        for (field, aliases) in &self.extra_aliases {
            for alias in aliases {
                registry.register(*field, alias);
            }
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::{RawRecord, RelationTag};

    #[test]
    fn env_overrides_file_values() {
        let mut config: Config =
            serde_json::from_str(r#"{"port": 9000, "master_folder_id": "from-file"}"#)
                .expect("valid config");
        config.apply_env(|key| match key {
            "INSPECTION_MASTER_FOLDER_ID" => Some("from-env".to_string()),
            "INSPECTION_PORT" => Some("not a number".to_string()),
            _ => None,
        });

        assert_eq!(config.master_folder_id, "from-env");
        assert_eq!(config.port, 9000);
        assert_eq!(config.debounce(), Duration::from_millis(3000));
        assert_eq!(config.master_sync_hour, 6);
    }

    #[test]
    fn extra_aliases_reach_the_registry() {
        let config: Config =
            serde_json::from_str(r#"{"extra_aliases": {"asset_number": ["Asset Tag"]}}"#)
                .expect("valid config");
        let mut record = RawRecord::new("Assets", RelationTag::Assets, 1);
        record.set("asset tag", "T-9");

        let registry = config.alias_registry();

        assert_eq!(
            registry.resolve(&record, CanonicalField::AssetNumber),
            Some("T-9")
        );
    }
}
