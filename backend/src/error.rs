//! Error taxonomy for remote, local-store and session operations.

use actix_web::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The remote store rejected the bearer credential.
    #[error("[AUTH_EXPIRED] credential rejected by the remote store")]
    AuthExpired,

    /// No credential has been set (not signed in, or purged after a failed
    /// refresh).
    #[error("not authenticated")]
    Unauthenticated,

    /// The request never got a response.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("{context} failed with status {status}")]
    RemoteRejected { status: u16, context: String },

    #[error("no data found: {0}")]
    NoDataFound(String),

    #[error("local store error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    pub fn is_network(&self) -> bool {
        matches!(self, SyncError::NetworkUnavailable(_))
    }

    /// Maps a transport failure. Anything that prevented a response from
    /// arriving counts as the network being unavailable.
    pub fn from_transport(err: reqwest::Error, context: &str) -> Self {
        match err.status() {
            Some(status) if status == reqwest::StatusCode::UNAUTHORIZED => SyncError::AuthExpired,
            Some(status) => SyncError::RemoteRejected {
                status: status.as_u16(),
                context: context.to_string(),
            },
            None => SyncError::NetworkUnavailable(format!("{context}: {err}")),
        }
    }

    /// HTTP status used when the error reaches the action surface.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SyncError::AuthExpired | SyncError::Unauthenticated => StatusCode::UNAUTHORIZED,
            SyncError::NetworkUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SyncError::ConfigurationMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SyncError::RemoteRejected { .. } => StatusCode::BAD_GATEWAY,
            SyncError::NoDataFound(_) => StatusCode::NOT_FOUND,
            SyncError::Storage(_) | SyncError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
