//! Keyed in-process task scheduler.
//!
//! [`TaskScheduler`] accepts a task and a future fire instant and runs
//! the task at or after that instant on the tokio runtime. Registration
//! is keyed: scheduling under an existing key replaces the pending timer
//! instead of duplicating it, which is what makes the reminder planner
//! idempotent under re-entry.
//!
//! Delivery is best-effort, at-least-once in spirit: task bodies must be
//! idempotent and re-validate their preconditions at fire time, and
//! nothing downstream may depend on a fire actually happening — the
//! periodic safety sweep (see [`UnlockSweeper`](crate::UnlockSweeper))
//! is the correctness backstop.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use educonnect_core::types::Timestamp;
use tokio::task::JoinHandle;

use crate::error::MessagingError;

struct Entry {
    fire_at: Timestamp,
    generation: u64,
    handle: JoinHandle<()>,
}

/// Keyed timer registry. Cheap to share via `Arc<TaskScheduler>`.
pub struct TaskScheduler {
    tasks: Arc<Mutex<HashMap<String, Entry>>>,
    generation: AtomicU64,
}

impl TaskScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Register `task` to run at or after `fire_at`.
    ///
    /// A `fire_at` in the past runs the task immediately. Scheduling
    /// under a key that already has a pending timer aborts the old timer
    /// and replaces it. Task errors are logged at this boundary and never
    /// propagate; there is no automatic retry.
    pub fn schedule<F>(&self, key: impl Into<String>, fire_at: Timestamp, task: F)
    where
        F: Future<Output = Result<(), MessagingError>> + Send + 'static,
    {
        let key = key.into();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);

        let mut tasks = self.tasks.lock().expect("scheduler lock poisoned");
        if let Some(prev) = tasks.remove(&key) {
            prev.handle.abort();
            tracing::debug!(key = %key, "Superseded previously scheduled task");
        }

        let registry = Arc::clone(&self.tasks);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let delay = fire_at - Utc::now();
            if let Ok(delay) = delay.to_std() {
                tokio::time::sleep(delay).await;
            }

            if let Err(e) = task.await {
                tracing::error!(key = %task_key, error = %e, "Scheduled task failed");
            }

            // Deregister, unless a newer registration replaced this one
            // while it was running.
            let mut tasks = registry.lock().expect("scheduler lock poisoned");
            if tasks.get(&task_key).is_some_and(|e| e.generation == generation) {
                tasks.remove(&task_key);
            }
        });

        tasks.insert(
            key,
            Entry {
                fire_at,
                generation,
                handle,
            },
        );
    }

    /// Keys with a registration still on the books (pending or running).
    pub fn scheduled_keys(&self) -> Vec<String> {
        let tasks = self.tasks.lock().expect("scheduler lock poisoned");
        tasks.keys().cloned().collect()
    }

    /// The registered fire instant for `key`, if present.
    pub fn scheduled_at(&self, key: &str) -> Option<Timestamp> {
        let tasks = self.tasks.lock().expect("scheduler lock poisoned");
        tasks.get(key).map(|e| e.fire_at)
    }

    /// Number of registrations on the books.
    pub fn pending_count(&self) -> usize {
        self.tasks.lock().expect("scheduler lock poisoned").len()
    }

    /// Abort every pending timer and clear the registry.
    ///
    /// Used during graceful shutdown. Tasks already executing are
    /// aborted at their next await point; their effects are idempotent
    /// by contract, so a partial run is corrected by the safety sweep.
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock().expect("scheduler lock poisoned");
        let count = tasks.len();
        for entry in tasks.values() {
            entry.handle.abort();
        }
        tasks.clear();
        if count > 0 {
            tracing::info!(count, "Aborted pending scheduled tasks");
        }
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
