//! # Authentication Service Module
//!
//! The UI signs in with an external identity provider and hands the resulting
//! access token over to the backend. Everything under `/api/auth` deals with
//! that credential.
//!
//! ## Sub-modules:
//! - `login`: stores the credential and runs the initial data load.
//! - `logout`: forgets the credential together with all cached session data.

mod login;
mod logout;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/auth";

/// Configures and returns the Actix `Scope` for the authentication routes.
///
/// # Registered Routes:
///
/// *   **`POST /login`**: expects a `LoginRequest` and answers with the session
///     summary once the master and session file lists are loaded.
/// *   **`POST /logout`**: cancels pending saves and clears local state.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/login", post().to(login::process))
        .route("/logout", post().to(logout::process))
}
