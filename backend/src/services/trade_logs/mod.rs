//! # Trade Log Service Module
//!
//! Asset movement history. Reads aggregate the global trade-log file together
//! with the movement rows of the loaded session; writes append to the global
//! file only.

mod append;
mod list;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/trade_logs";

/// # Registered Routes:
///
/// *   **`GET ""`**: `TradeLogGroup`s, one per asset, most recently moved first.
///     Takes an optional free-text `q` and a `limit` on the number of groups.
/// *   **`POST ""`**: appends a `LogAssetChangeRequest` dated today and answers
///     with the stored entry.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("", post().to(append::process))
}
