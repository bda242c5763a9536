//! Session mutations. Each one updates local state at once and leaves the
//! remote write to the debounced background save.

use crate::sync::InspectionEngine;
use actix_web::{web, HttpResponse, Responder};
use common::model::Asset;
use common::requests::{AssetRequest, NoteRequest};

fn asset_response(asset_number: &str, asset: Option<Asset>) -> HttpResponse {
    match asset {
        Some(asset) => HttpResponse::Ok().json(asset),
        None => HttpResponse::NotFound().body(format!("Asset {asset_number} not found")),
    }
}

/// `POST /api/session/scan`
pub(crate) async fn scan(
    engine: web::Data<InspectionEngine>,
    payload: web::Json<AssetRequest>,
) -> impl Responder {
    let number = payload.asset_number.trim();
    asset_response(number, engine.scan(number).await)
}

/// `POST /api/session/cancel`
pub(crate) async fn cancel(
    engine: web::Data<InspectionEngine>,
    payload: web::Json<AssetRequest>,
) -> impl Responder {
    let number = payload.asset_number.trim();
    asset_response(number, engine.cancel_check(number).await)
}

/// `POST /api/session/note`
pub(crate) async fn note(
    engine: web::Data<InspectionEngine>,
    payload: web::Json<NoteRequest>,
) -> impl Responder {
    let NoteRequest { asset_number, note } = payload.into_inner();
    let number = asset_number.trim();
    asset_response(number, engine.set_note(number, note).await)
}

/// `POST /api/session/clear_scanned`
pub(crate) async fn clear_scanned(engine: web::Data<InspectionEngine>) -> impl Responder {
    engine.clear_scanned().await;
    HttpResponse::NoContent().finish()
}
