//! Master data refresh.

mod refresh;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/master";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/refresh", post().to(refresh::process))
}
