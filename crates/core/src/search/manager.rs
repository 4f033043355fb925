//! Concurrent scheduler for search units.
//!
//! Runs many performers in parallel on a bounded tokio worker pool, with
//! per-unit failure isolation, stop-by-token and graceful drain-on-shutdown.
//! One manager instance is passed explicitly through the call chain; tests
//! run isolated managers side by side.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::performer::SearchPerformer;
use super::types::{SearchToken, SessionListener, SourceError};

/// Default number of concurrently executing units.
const DEFAULT_WORKERS: usize = 6;

struct TaskEntry {
    id: u64,
    token: SearchToken,
    performer: Arc<SearchPerformer>,
}

/// The federated search orchestrator.
///
/// Callers may submit any number of units under any number of tokens; only
/// the number of concurrently *executing* units is bounded. No ordering is
/// guaranteed between units of the same token. An uncaught panic inside one
/// unit is contained to that unit and reported via `on_error`.
pub struct SearchManager {
    semaphore: Arc<Semaphore>,
    listener: Arc<dyn SessionListener>,
    tasks: Arc<Mutex<Vec<TaskEntry>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    next_task_id: AtomicU64,
}

impl SearchManager {
    /// Create a manager with the default worker count.
    pub fn new(listener: Arc<dyn SessionListener>) -> Self {
        Self::with_workers(DEFAULT_WORKERS, listener)
    }

    /// Create a manager with a bounded pool of `workers` units in flight.
    pub fn with_workers(workers: usize, listener: Arc<dyn SessionListener>) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            listener,
            tasks: Arc::new(Mutex::new(Vec::new())),
            handles: Mutex::new(Vec::new()),
            next_task_id: AtomicU64::new(1),
        }
    }

    /// Number of currently tracked (registered, not yet drained) units.
    pub fn pending_units(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// Schedule a unit for execution.
    ///
    /// The unit is registered immediately so that `stop(token)` reaches it
    /// even while it is still waiting for a worker slot.
    pub fn submit(&self, performer: Arc<SearchPerformer>) {
        let id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        let token = performer.token();

        self.tasks.lock().unwrap().push(TaskEntry {
            id,
            token,
            performer: Arc::clone(&performer),
        });

        debug!(
            token = %token,
            source = performer.source_name(),
            "Unit submitted"
        );

        let semaphore = Arc::clone(&self.semaphore);
        let listener = Arc::clone(&self.listener);
        let tasks = Arc::clone(&self.tasks);

        let handle = tokio::spawn(async move {
            // Permit acquisition fails only after the semaphore is closed
            // during shutdown; the unit then drains without running.
            if let Ok(_permit) = semaphore.acquire_owned().await {
                if !performer.is_stopped() {
                    let run = AssertUnwindSafe(performer.perform(Arc::clone(&listener)))
                        .catch_unwind();
                    if let Err(panic) = run.await {
                        warn!(
                            token = %token,
                            source = performer.source_name(),
                            "Unit panicked, contained"
                        );
                        listener.on_error(
                            token,
                            SourceError::contract(
                                performer.source_name(),
                                panic_message(panic.as_ref()),
                            ),
                        );
                    }
                }
            }

            let token_drained = {
                let mut tasks = tasks.lock().unwrap();
                tasks.retain(|t| t.id != id);
                !tasks.iter().any(|t| t.token == token)
            };
            if token_drained {
                debug!(token = %token, "Last unit for token drained");
                listener.on_stopped(token);
            }
        });

        let mut handles = self.handles.lock().unwrap();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Stop every currently tracked unit under `token`.
    ///
    /// Not a barrier: units submitted under the same token after this call
    /// still run. Idempotent.
    pub fn stop(&self, token: SearchToken) {
        let tasks = self.tasks.lock().unwrap();
        for entry in tasks.iter().filter(|t| t.token == token) {
            entry.performer.stop();
        }
    }

    /// Stop every currently tracked unit, all tokens.
    pub fn stop_all(&self) {
        let tasks = self.tasks.lock().unwrap();
        for entry in tasks.iter() {
            entry.performer.stop();
        }
    }

    /// Stop all units, then wait up to `timeout` for in-flight workers to
    /// observe their stop flags and drain.
    ///
    /// Returns whether every task finished within the deadline. This is the
    /// only blocking operation in the public contract.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        info!("Search manager shutting down");
        self.stop_all();
        self.semaphore.close();

        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self.handles.lock().unwrap();
            guard.drain(..).collect()
        };

        let drain = async {
            for handle in handles {
                // A panicking unit is already reported via on_error; the
                // join error itself is not interesting here.
                let _ = handle.await;
            }
        };

        let finished = tokio::time::timeout(timeout, drain).await.is_ok();
        if finished {
            info!("Search manager drained");
        } else {
            warn!("Search manager shutdown timed out with units still in flight");
        }
        finished
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unit panicked".to_string()
    }
}
