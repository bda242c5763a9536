//! `POST /api/master/refresh`
//!
//! Pulls the newest master file as a background job. A body with
//! `force: false` only refreshes when the daily sync window has passed, the
//! same check a session load runs. Without it the refresh is unconditional.

use crate::job_controller::spawn_job;
use crate::job_controller::state::JobsState;
use crate::sync::InspectionEngine;
use actix_web::{web, HttpResponse, Responder};
use common::requests::RefreshMasterRequest;

pub(crate) async fn process(
    engine: web::Data<InspectionEngine>,
    jobs: web::Data<JobsState>,
    payload: Option<web::Json<RefreshMasterRequest>>,
) -> impl Responder {
    let RefreshMasterRequest { force } = payload.map(|p| p.into_inner()).unwrap_or_default();
    let job_id = spawn_job(&jobs, engine.into_inner(), move |engine| async move {
        if !force {
            let ran = engine.check_and_sync_master().await?;
            return Ok(if ran {
                "Master data refreshed".to_string()
            } else {
                "Master data is up to date".to_string()
            });
        }
        let report = engine.refresh_master().await?;
        Ok(format!(
            "Master refreshed: {} users, {} assets ({} new, {} updated), {} movements forwarded",
            report.users, report.assets, report.inserted, report.updated, report.trade_appended
        ))
    })
    .await;
    HttpResponse::Ok().json(serde_json::json!({ "job_id": job_id }))
}
