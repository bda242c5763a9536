//! Tracks the state of long-running background jobs.
//!
//! Starting a session, loading a session and refreshing master data all read
//! whole spreadsheets and can take several seconds, so the HTTP handlers
//! schedule them as jobs and hand back a job id the UI can poll.
//!
//! The main components are:
//! - `JobsState`: a clonable, thread-safe struct holding the status of every job.
//!   It is injected into the Actix application state in `main.rs`.
//! - `JobUpdate`: the message a running job sends to report a status change.
//! - `start_job_updater`: a long-running task that listens for `JobUpdate` messages
//!   on an MPSC channel and applies them to the shared `JobsState`.

use common::jobs::JobStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// A thread-safe, shareable container for the state of all background jobs.
#[derive(Clone)]
pub struct JobsState {
    /// A map from a unique job ID to its current `JobStatus`.
    ///
    /// Read by `GET /api/jobs/status/{job_id}`, written by `start_job_updater`
    /// and by `spawn_job` when it registers a new job.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Sender side of the update channel.
    ///
    /// Running jobs push `JobUpdate` messages here instead of writing the map
    /// themselves.
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    pub fn new(tx: mpsc::Sender<JobUpdate>) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        }
    }
}

/// A status update for a specific background job.
#[derive(Debug)]
pub struct JobUpdate {
    /// The unique identifier of the job being updated.
    pub(crate) job_id: String,
    /// The new status of the job.
    pub(crate) status: JobStatus,
}

/// Starts the central job state updater task.
///
/// Spawned once from `main.rs`. Each received update replaces the stored
/// status for its `job_id`.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        jobs.insert(update.job_id.clone(), update.status);
    }
}
