use crate::jobs::{Notification, SyncState};
use crate::model::{Progress, RemoteFile};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
/// Credential handed over by the authentication provider after sign-in.
pub struct LoginRequest {
    pub token: String,
}

#[derive(Deserialize, Serialize)]
/// Starts a new round from a master file; the session file gets `session_name`.
pub struct StartSessionRequest {
    pub master_id: String,
    pub session_name: String,
}

#[derive(Deserialize, Serialize)]
pub struct LoadSessionRequest {
    pub file: RemoteFile,
}

#[derive(Deserialize, Serialize)]
/// Targets a single asset (scan, cancel).
pub struct AssetRequest {
    pub asset_number: String,
}

#[derive(Deserialize, Serialize)]
pub struct NoteRequest {
    pub asset_number: String,
    pub note: String,
}

#[derive(Deserialize, Serialize, Default)]
pub struct AssetQuery {
    pub department: Option<String>,
    pub q: Option<String>,
}

#[derive(Deserialize, Serialize, Default)]
pub struct ScannedQuery {
    pub q: Option<String>,
}

#[derive(Deserialize, Serialize, Default)]
pub struct TradeLogQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq)]
/// `force = false` only refreshes when the daily window has passed. Left
/// out, the refresh is unconditional.
pub struct RefreshMasterRequest {
    #[serde(default = "forced")]
    pub force: bool,
}

fn forced() -> bool {
    true
}

impl Default for RefreshMasterRequest {
    fn default() -> Self {
        Self { force: forced() }
    }
}

#[derive(Deserialize, Serialize)]
/// Records that an asset changed hands.
pub struct LogAssetChangeRequest {
    pub asset_number: String,
    pub holder_id: String,
    pub prior_holder_id: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Deserialize, Serialize, Debug)]
/// Snapshot of the session for the UI to render.
pub struct SessionSummary {
    pub authenticated: bool,
    pub file: Option<RemoteFile>,
    pub progress: Progress,
    pub departments: Vec<String>,
    pub scanned_count: usize,
    pub dirty: bool,
    pub sync_state: SyncState,
    pub last_saved_at: Option<String>,
    pub last_master_sync: Option<String>,
    pub notification: Option<Notification>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_refresh_is_forced_unless_asked_otherwise() {
        let empty: RefreshMasterRequest = serde_json::from_str("{}").expect("empty body");
        let daily: RefreshMasterRequest =
            serde_json::from_str(r#"{"force": false}"#).expect("daily check");

        assert!(empty.force);
        assert!(!daily.force);
        assert_eq!(RefreshMasterRequest::default(), empty);
    }
}
