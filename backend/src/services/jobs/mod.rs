//! Polling endpoint for the background jobs started by the session and
//! master services.

mod get_status;

use actix_web::web::{get, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/jobs";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/status/{job_id}", get().to(get_status::process))
}
