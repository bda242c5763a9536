use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A cancellable, re-armable one-shot timer.
///
/// Each `arm` replaces the pending firing, so a burst of mutations produces a
/// single tick `delay` after the last one. Ticks go out on an mpsc channel and
/// are consumed by the save worker.
pub struct Debouncer {
    delay: Duration,
    tx: mpsc::Sender<()>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration, tx: mpsc::Sender<()>) -> Self {
        Self {
            delay,
            tx,
            pending: Mutex::new(None),
        }
    }

    fn pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn arm(&self) {
        let mut pending = self.pending();
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        let tx = self.tx.clone();
        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(()).await;
        }));
    }

    /// Drops the pending firing, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match self.pending().take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending().as_ref().is_some_and(|h| !h.is_finished())
    }
}
