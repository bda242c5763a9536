//! Ordered writes to the [`LocalStore`] away from the async runtime.
//!
//! Values are serialized by the caller, usually while it still holds the
//! engine state, and queued. A dedicated thread owns the connection and
//! applies the queue in order, so the last queued value for a key is the one
//! that ends up on disk.

use super::LocalStore;
use log::{debug, warn};
use serde::Serialize;
use std::thread;
use tokio::sync::{mpsc, oneshot};

enum StoreOp {
    Set { key: &'static str, value: String },
    Remove(&'static str),
    Clear,
    Flush(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct StoreWriter {
    tx: mpsc::UnboundedSender<StoreOp>,
}

impl StoreWriter {
    /// Moves `store` onto its own thread. The thread stops once every
    /// `StoreWriter` handle is dropped.
    pub fn spawn(store: LocalStore) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        thread::spawn(move || {
            while let Some(op) = rx.blocking_recv() {
                apply(&store, op);
            }
            debug!("Local store writer stopped");
        });
        Self { tx }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &'static str, value: &T) {
        match serde_json::to_string(value) {
            Ok(value) => self.send(StoreOp::Set { key, value }),
            Err(e) => warn!("Could not serialize \"{}\": {}", key, e),
        }
    }

    pub fn remove(&self, key: &'static str) {
        self.send(StoreOp::Remove(key));
    }

    pub fn clear(&self) {
        self.send(StoreOp::Clear);
    }

    /// Resolves once every write queued before the call has been applied.
    pub async fn flush(&self) {
        let (done, applied) = oneshot::channel();
        self.send(StoreOp::Flush(done));
        let _ = applied.await;
    }

    fn send(&self, op: StoreOp) {
        if self.tx.send(op).is_err() {
            warn!("Local store writer has stopped; write dropped");
        }
    }
}

fn apply(store: &LocalStore, op: StoreOp) {
    let (key, result) = match op {
        StoreOp::Set { key, value } => (key, store.set_raw(key, &value)),
        StoreOp::Remove(key) => (key, store.remove(key)),
        StoreOp::Clear => ("*", store.clear()),
        StoreOp::Flush(done) => {
            let _ = done.send(());
            return;
        }
    };
    if let Err(e) = result {
        warn!("Could not persist \"{}\": {}", key, e);
    }
}
