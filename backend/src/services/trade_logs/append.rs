use crate::services::error_response;
use crate::sync::InspectionEngine;
use actix_web::{web, HttpResponse, Responder};
use common::requests::LogAssetChangeRequest;

pub(crate) async fn process(
    engine: web::Data<InspectionEngine>,
    payload: web::Json<LogAssetChangeRequest>,
) -> impl Responder {
    let req = payload.into_inner();
    if req.asset_number.trim().is_empty() {
        return HttpResponse::BadRequest().body("Asset number must not be empty");
    }
    match engine.log_asset_change(req).await {
        Ok(entry) => HttpResponse::Ok().json(entry),
        Err(err) => error_response(&engine, err).await,
    }
}
