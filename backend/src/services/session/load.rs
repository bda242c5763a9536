use crate::job_controller::spawn_job;
use crate::job_controller::state::JobsState;
use crate::sync::InspectionEngine;
use actix_web::{web, HttpResponse, Responder};
use common::requests::LoadSessionRequest;

/// Handler for `POST /api/session/load`. Runs as a background job; the
/// master-refresh check and the global trade-log refresh happen inside it.
pub(crate) async fn process(
    engine: web::Data<InspectionEngine>,
    jobs: web::Data<JobsState>,
    payload: web::Json<LoadSessionRequest>,
) -> impl Responder {
    let LoadSessionRequest { file } = payload.into_inner();
    let job_id = spawn_job(&jobs, engine.into_inner(), move |engine| async move {
        let name = file.name.clone();
        engine.load_session(file).await?;
        Ok(format!("Session \"{}\" loaded", name))
    })
    .await;
    HttpResponse::Ok().json(serde_json::json!({ "job_id": job_id }))
}
