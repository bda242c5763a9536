use crate::sync::InspectionEngine;
use actix_web::{web, HttpResponse, Responder};

/// `GET /api/files/masters`, newest first.
pub(crate) async fn masters(engine: web::Data<InspectionEngine>) -> impl Responder {
    HttpResponse::Ok().json(engine.master_files().await)
}

/// `GET /api/files/sessions`. The global trade-log file is never listed.
pub(crate) async fn sessions(engine: web::Data<InspectionEngine>) -> impl Responder {
    HttpResponse::Ok().json(engine.session_files().await)
}
