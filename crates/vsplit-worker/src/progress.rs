//! In-memory job progress store.
//!
//! Holds the latest [`ProgressSnapshot`] per job plus the set of job IDs that
//! currently have a live orchestration. Writers (the orchestrator) and readers
//! (progress streams) share one instance through an `Arc`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

use vsplit_models::{JobId, ProgressSnapshot};

/// Job-keyed table of latest progress snapshots.
#[derive(Debug, Default)]
pub struct ProgressStore {
    snapshots: RwLock<HashMap<JobId, ProgressSnapshot>>,
    active: Mutex<HashSet<JobId>>,
}

impl ProgressStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot for a job (last write wins).
    pub async fn write(&self, job_id: &JobId, snapshot: ProgressSnapshot) {
        self.snapshots.write().await.insert(job_id.clone(), snapshot);
    }

    /// Current snapshot for a job, if any.
    pub async fn read(&self, job_id: &JobId) -> Option<ProgressSnapshot> {
        self.snapshots.read().await.get(job_id).cloned()
    }

    /// Remove a job's snapshot. No-op if absent.
    pub async fn delete(&self, job_id: &JobId) {
        self.snapshots.write().await.remove(job_id);
    }

    /// Number of jobs with a stored snapshot.
    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    /// Whether no snapshots are stored.
    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }

    /// Mark a job as having a live orchestration.
    ///
    /// Returns `false` if the job ID is already claimed. A terminal snapshot
    /// left by an earlier run under the same ID is dropped, so streams opened
    /// for the new run wait for its own progress.
    pub async fn try_claim(&self, job_id: &JobId) -> bool {
        let mut active = self.active.lock().await;
        if !active.insert(job_id.clone()) {
            return false;
        }

        let mut snapshots = self.snapshots.write().await;
        if snapshots.get(job_id).is_some_and(ProgressSnapshot::is_terminal) {
            snapshots.remove(job_id);
            debug!(job_id = %job_id, "Dropped terminal snapshot of previous run");
        }
        true
    }

    /// Drop the live-orchestration mark for a job.
    pub async fn release(&self, job_id: &JobId) {
        self.active.lock().await.remove(job_id);
    }

    /// Whether a job currently has a live orchestration.
    pub async fn is_active(&self, job_id: &JobId) -> bool {
        self.active.lock().await.contains(job_id)
    }

    /// Remove the job's snapshot once `delay` has passed.
    ///
    /// Only the terminal snapshot present now is removed; if the entry was
    /// rewritten in the meantime (the job ID was reused) it is left alone.
    /// Non-terminal entries are never expired.
    pub fn expire_after(self: &Arc<Self>, job_id: JobId, delay: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let Some(expected) = store.read(&job_id).await.filter(|s| s.is_terminal()) else {
                return;
            };

            tokio::time::sleep(delay).await;

            let mut snapshots = store.snapshots.write().await;
            if snapshots.get(&job_id) == Some(&expected) {
                snapshots.remove(&job_id);
                debug!(job_id = %job_id, "Expired progress entry");
            }
        })
    }
}
