use crate::services::error_response;
use crate::sync::InspectionEngine;
use actix_web::{web, HttpResponse, Responder};

/// Handler for `POST /api/session/save`.
///
/// `saved` is false when nothing needed writing or a save was already in
/// flight; in the latter case the running save schedules a follow-up.
pub(crate) async fn process(engine: web::Data<InspectionEngine>) -> impl Responder {
    match engine.save().await {
        Ok(saved) => HttpResponse::Ok().json(serde_json::json!({
            "saved": saved,
            "sync_state": engine.sync_state().await,
        })),
        Err(err) => error_response(&engine, err).await,
    }
}

/// Handler for `POST /api/session/backup`. Answers with the created file.
pub(crate) async fn backup(engine: web::Data<InspectionEngine>) -> impl Responder {
    match engine.backup_and_save().await {
        Ok(file) => HttpResponse::Ok().json(file),
        Err(err) => error_response(&engine, err).await,
    }
}
