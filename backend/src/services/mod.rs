pub mod auth;
pub mod files;
pub mod jobs;
pub mod master;
pub mod session;
pub mod trade_logs;

use crate::error::SyncError;
use crate::sync::InspectionEngine;
use actix_web::HttpResponse;

/// Runs the engine's error handling for a failed action and answers with the
/// resulting notification.
pub(crate) async fn error_response(engine: &InspectionEngine, err: SyncError) -> HttpResponse {
    let notification = engine.handle_error(&err).await;
    HttpResponse::build(err.status_code()).json(notification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::job_controller::state::JobsState;
    use crate::remote::memory::{MemoryRemote, ScriptedAuth};
    use crate::store::LocalStore;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use common::requests::SessionSummary;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn engine() -> Arc<InspectionEngine> {
        let (tx, _rx) = mpsc::channel(1);
        Arc::new(InspectionEngine::new(
            Config::default(),
            Arc::new(MemoryRemote::new("backups")),
            Arc::new(ScriptedAuth::empty()),
            LocalStore::in_memory().expect("store"),
            tx,
        ))
    }

    macro_rules! app {
        ($engine:expr) => {{
            let (tx, _rx) = mpsc::channel(1);
            test::init_service(
                App::new()
                    .app_data(web::Data::from($engine))
                    .app_data(web::Data::new(JobsState::new(tx)))
                    .service(auth::configure_routes())
                    .service(session::configure_routes())
                    .service(jobs::configure_routes()),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn summary_reports_signed_out_engine() {
        let app = app!(engine());
        let req = test::TestRequest::get().uri("/api/session").to_request();
        let summary: SessionSummary = test::call_and_read_body_json(&app, req).await;
        assert!(!summary.authenticated);
        assert!(summary.file.is_none());
        assert!(!summary.dirty);
    }

    #[actix_web::test]
    async fn scanning_unknown_asset_is_not_found() {
        let app = app!(engine());
        let req = test::TestRequest::post()
            .uri("/api/session/scan")
            .set_json(json!({ "asset_number": "A-404" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn save_requires_sign_in() {
        let engine = engine();
        let app = app!(engine.clone());
        let req = test::TestRequest::post().uri("/api/session/save").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(engine.summary().await.notification.is_some());
    }

    #[actix_web::test]
    async fn empty_token_is_rejected() {
        let app = app!(engine());
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "token": "  " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unknown_job_is_not_found() {
        let app = app!(engine());
        let req = test::TestRequest::get()
            .uri("/api/jobs/status/missing")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
