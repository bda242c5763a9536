use crate::sync::InspectionEngine;
use actix_web::{web, HttpResponse, Responder};
use common::requests::TradeLogQuery;

pub(crate) async fn process(
    engine: web::Data<InspectionEngine>,
    query: web::Query<TradeLogQuery>,
) -> impl Responder {
    let TradeLogQuery { q, limit } = query.into_inner();
    HttpResponse::Ok().json(engine.trade_logs(q.as_deref(), limit).await)
}
