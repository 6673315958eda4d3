//! Per-job async locks for serializing provider interactions.
//!
//! Status polls have side effects (state transitions, artifact downloads), so
//! two concurrent polls for the same job must not both talk to the provider.
//! Each job gets its own `tokio::sync::Mutex`; the map itself is only held
//! long enough to clone out the per-job lock.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct JobLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl JobLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for one job, creating it on first use. The returned
    /// guard is owned so it can be held across `.await` points.
    pub async fn acquire(&self, job_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(job_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Remove the lock entry for a terminal job. A terminal job takes no
    /// further transitions, so late callers only re-create and drop the entry.
    pub async fn discard(&self, job_id: Uuid) {
        self.inner.lock().await.remove(&job_id);
    }
}
