use crate::sync::InspectionEngine;
use actix_web::{web, HttpResponse, Responder};
use common::requests::{AssetQuery, ScannedQuery};

pub(crate) async fn summary(engine: web::Data<InspectionEngine>) -> impl Responder {
    HttpResponse::Ok().json(engine.summary().await)
}

/// `GET /api/session/assets?department=&q=`
pub(crate) async fn assets(
    engine: web::Data<InspectionEngine>,
    query: web::Query<AssetQuery>,
) -> impl Responder {
    let AssetQuery { department, q } = query.into_inner();
    HttpResponse::Ok().json(engine.assets(department.as_deref(), q.as_deref()).await)
}

/// `GET /api/session/scanned?q=`, most recent scan first.
pub(crate) async fn scanned(
    engine: web::Data<InspectionEngine>,
    query: web::Query<ScannedQuery>,
) -> impl Responder {
    HttpResponse::Ok().json(engine.scanned_assets(query.q.as_deref()).await)
}

pub(crate) async fn holders(engine: web::Data<InspectionEngine>) -> impl Responder {
    HttpResponse::Ok().json(engine.holder_stats().await)
}
