//! File lists cached at sign-in: master files from the master folder and
//! session files from the backup folder.

mod list;

use actix_web::web::{get, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/files";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/masters", get().to(list::masters))
        .route("/sessions", get().to(list::sessions))
}
