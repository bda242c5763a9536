//! # Session Service Module
//!
//! Routes under `/api/session` drive one inspection round: binding a session
//! file, scanning assets and persisting the result.
//!
//! ## Sub-modules:
//! - `start`: creates a session file from a master and loads it (background job).
//! - `load`: binds an existing session file (background job).
//! - `query`: read-only views over the loaded session.
//! - `mutate`: scan, cancel, note and clearing the scanned list.
//! - `save`: immediate save and timestamped backups.

mod load;
mod mutate;
mod query;
mod save;
mod start;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/session";

/// Configures and returns the Actix `Scope` for all session routes.
///
/// # Registered Routes:
///
/// *   **`GET ""`**: `SessionSummary` for the UI header (progress, sync state,
///     last notification).
/// *   **`POST /start`**, **`POST /load`**: answer with a `job_id` to poll on
///     `/api/jobs/status/{job_id}`.
/// *   **`GET /assets`**, **`GET /scanned`**, **`GET /holders`**: filtered views.
/// *   **`POST /scan`**, **`POST /cancel`**, **`POST /note`**: write-triggering
///     mutations. They answer with the updated asset, or 404 for an unknown
///     asset number.
/// *   **`POST /clear_scanned`**: local only, nothing is written.
/// *   **`POST /save`**, **`POST /backup`**.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(query::summary))
        .route("/start", post().to(start::process))
        .route("/load", post().to(load::process))
        .route("/assets", get().to(query::assets))
        .route("/scanned", get().to(query::scanned))
        .route("/holders", get().to(query::holders))
        .route("/scan", post().to(mutate::scan))
        .route("/cancel", post().to(mutate::cancel))
        .route("/note", post().to(mutate::note))
        .route("/clear_scanned", post().to(mutate::clear_scanned))
        .route("/save", post().to(save::process))
        .route("/backup", post().to(save::backup))
}
