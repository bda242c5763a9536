//! `POST /api/session/start`
//!
//! Reads the chosen master, writes its live asset rows into a new session
//! file in the backup folder and loads that file. Reading and writing whole
//! spreadsheets is slow, so the work runs as a background job and the handler
//! answers with the job id right away.

use crate::job_controller::spawn_job;
use crate::job_controller::state::JobsState;
use crate::sync::InspectionEngine;
use actix_web::{web, HttpResponse, Responder};
use common::requests::StartSessionRequest;

pub(crate) async fn process(
    engine: web::Data<InspectionEngine>,
    jobs: web::Data<JobsState>,
    payload: web::Json<StartSessionRequest>,
) -> impl Responder {
    let StartSessionRequest {
        master_id,
        session_name,
    } = payload.into_inner();
    if session_name.trim().is_empty() {
        return HttpResponse::BadRequest().body("Session name must not be empty");
    }

    let job_id = spawn_job(&jobs, engine.into_inner(), move |engine| async move {
        let file = engine.start_session(&master_id, session_name.trim()).await?;
        Ok(format!("Session \"{}\" started", file.name))
    })
    .await;
    HttpResponse::Ok().json(serde_json::json!({ "job_id": job_id }))
}
