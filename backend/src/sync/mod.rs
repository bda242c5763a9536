//! Session state and its synchronization with the remote store.
//!
//! - `engine`: the [`InspectionEngine`] every HTTP action goes through.
//! - `scheduler`: the save state machine and the daily master-refresh rule.
//! - `debounce`: the re-armable timer that coalesces writes.
//!
//! The debouncer only emits ticks; [`start_save_worker`] turns them into
//! background saves, the same way the job controller turns `JobUpdate`
//! messages into job state.

pub mod debounce;
pub mod engine;
pub mod scheduler;

pub use engine::{InspectionEngine, MasterRefreshReport};

use std::sync::Arc;
use tokio::sync::mpsc;

/// Runs a background save for every debounce tick. Spawned once from `main`.
pub async fn start_save_worker(engine: Arc<InspectionEngine>, mut rx: mpsc::Receiver<()>) {
    while rx.recv().await.is_some() {
        engine.save_in_background().await;
    }
}
