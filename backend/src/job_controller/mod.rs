pub mod state;

use crate::error::Result;
use crate::sync::InspectionEngine;
use common::jobs::JobStatus;
use log::info;
use state::{JobUpdate, JobsState};
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

/// Registers a new job as `Pending` and runs `work` on the runtime.
///
/// The returned id is available to the status endpoint immediately. A failure
/// goes through the engine's error handling first, so an expired credential
/// is recovered and the stored status carries the user-facing message.
pub async fn spawn_job<F, Fut>(jobs: &JobsState, engine: Arc<InspectionEngine>, work: F) -> String
where
    F: FnOnce(Arc<InspectionEngine>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    let job_id = Uuid::new_v4().to_string();
    jobs.jobs
        .write()
        .await
        .insert(job_id.clone(), JobStatus::Pending);
    let tx = jobs.tx.clone();
    let id = job_id.clone();

    tokio::spawn(async move {
        let _ = tx
            .send(JobUpdate {
                job_id: id.clone(),
                status: JobStatus::InProgress(0),
            })
            .await;
        let status = match work(engine.clone()).await {
            Ok(message) => {
                info!("Job {} completed: {}", id, message);
                JobStatus::Completed(message)
            }
            Err(err) => JobStatus::Failed(engine.handle_error(&err).await.message),
        };
        let _ = tx.send(JobUpdate { job_id: id, status }).await;
    });

    job_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::SyncError;
    use crate::remote::memory::{MemoryRemote, ScriptedAuth};
    use crate::store::LocalStore;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn engine() -> Arc<InspectionEngine> {
        let (tx, _rx) = mpsc::channel(1);
        Arc::new(InspectionEngine::new(
            Config::default(),
            Arc::new(MemoryRemote::new("backups")),
            Arc::new(ScriptedAuth::empty()),
            LocalStore::in_memory().expect("store"),
            tx,
        ))
    }

    async fn settle(jobs: &JobsState, id: &str) -> Option<JobStatus> {
        for _ in 0..50 {
            let status = jobs.jobs.read().await.get(id).cloned();
            if matches!(status, Some(JobStatus::Completed(_) | JobStatus::Failed(_))) {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        jobs.jobs.read().await.get(id).cloned()
    }

    #[tokio::test]
    async fn job_outcomes_reach_the_status_map() {
        let (tx, rx) = mpsc::channel(16);
        let jobs = JobsState::new(tx);
        tokio::spawn(state::start_job_updater(jobs.clone(), rx));

        let ok = spawn_job(&jobs, engine(), |_| async { Ok("done".to_string()) }).await;
        let failed = spawn_job(&jobs, engine(), |_| async {
            Err(SyncError::NoDataFound("no assets".into()))
        })
        .await;

        assert_eq!(settle(&jobs, &ok).await, Some(JobStatus::Completed("done".into())));
        match settle(&jobs, &failed).await {
            Some(JobStatus::Failed(message)) => assert!(message.contains("no assets")),
            other => panic!("unexpected status {other:?}"),
        }
    }
}
