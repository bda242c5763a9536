use crate::services::error_response;
use crate::sync::InspectionEngine;
use actix_web::{web, HttpResponse, Responder};
use common::requests::LoginRequest;
use log::info;

/// Handler for `POST /api/auth/login`.
///
/// A failed bootstrap still leaves the credential in place, so the UI can
/// retry individual actions; the error is reported with its notification.
pub(crate) async fn process(
    engine: web::Data<InspectionEngine>,
    payload: web::Json<LoginRequest>,
) -> impl Responder {
    let LoginRequest { token } = payload.into_inner();
    if token.trim().is_empty() {
        return HttpResponse::BadRequest().body("Token must not be empty");
    }
    match engine.sign_in(token).await {
        Ok(()) => {
            info!("Signed in");
            HttpResponse::Ok().json(engine.summary().await)
        }
        Err(err) => error_response(&engine, err).await,
    }
}
