use crate::sync::InspectionEngine;
use actix_web::{web, HttpResponse, Responder};

/// Handler for `POST /api/auth/logout`.
pub(crate) async fn process(engine: web::Data<InspectionEngine>) -> impl Responder {
    engine.sign_out().await;
    HttpResponse::NoContent().finish()
}
