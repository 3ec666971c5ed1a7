use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tokio::time::Instant;
use tracing::{debug, info};

use crate::scheduler::dispatcher::Dispatcher;
use crate::scheduler::item::{Command, Payload};
use crate::scheduler::metrics::SchedulerMetrics;
use crate::scheduler::queue::ReadyQueue;
use crate::scheduler::registry::{Callback, CallbackRegistry};
use crate::scheduler::types::SchedulerConfig;

/// The event scheduler. Holds pending work ordered by rank and due time,
/// and dispatches it in gated, capped batches.
///
/// Construct one per host at the composition root and share it as
/// `Arc<Scheduler>`. Every operation takes `&self`; `submit` may race with
/// an in-progress `process` pass.
pub struct Scheduler {
    pub(super) config: SchedulerConfig,
    /// Pending work items.
    pub(super) queue: Mutex<ReadyQueue>,
    /// Named callbacks for tagged commands.
    pub(super) registry: RwLock<CallbackRegistry>,
    pub(super) dispatcher: Dispatcher,
    pub(super) metrics: Arc<RwLock<SchedulerMetrics>>,
    /// Submission counter, the final ordering tie-break.
    pub(super) next_seq: AtomicU64,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let dispatcher = Dispatcher::new(config.resolved_worker_threads());
        Self {
            config,
            queue: Mutex::new(ReadyQueue::new()),
            registry: RwLock::new(CallbackRegistry::new()),
            dispatcher,
            metrics: Arc::new(RwLock::new(SchedulerMetrics::default())),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    // ── Registry ──────────────────────────────────────────────────

    /// Register a named callback. Last write wins.
    pub fn register<F>(&self, name: impl Into<String>, callback: F)
    where
        F: Fn(&Command) -> Payload + Send + Sync + 'static,
    {
        let name = name.into();
        let callback: Callback = Arc::new(callback);
        if self.registry_mut().register(name.clone(), callback) {
            debug!(callback = %name, "replaced registered callback");
        } else {
            info!(callback = %name, "registered callback");
        }
    }

    /// Remove a named callback. Missing names are ignored.
    pub fn unregister(&self, name: &str) {
        if self.registry_mut().unregister(name) {
            info!(callback = %name, "unregistered callback");
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Callback> {
        self.registry_ref().lookup(name)
    }

    /// Names of all registered callbacks, sorted.
    pub fn callback_names(&self) -> Vec<String> {
        self.registry_ref().names()
    }

    // ── Queue observers ───────────────────────────────────────────

    /// Discard every pending item. Registered callbacks are kept.
    /// Returns how many items were discarded.
    pub fn clear(&self) -> usize {
        let discarded = self.queue().clear();
        self.metrics_mut().queue_depth = 0;
        info!(discarded, "cleared pending events");
        discarded
    }

    pub fn queue_depth(&self) -> usize {
        self.queue().len()
    }

    /// Earliest due time among pending items. Scans the whole queue.
    pub fn next_due_at(&self) -> Option<Instant> {
        self.queue().peek_due_at()
    }

    // ── Metrics ───────────────────────────────────────────────────

    /// Get a snapshot of the current scheduler metrics.
    pub fn metrics(&self) -> SchedulerMetrics {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get an Arc to the metrics (for external reads without cloning).
    pub fn metrics_handle(&self) -> Arc<RwLock<SchedulerMetrics>> {
        Arc::clone(&self.metrics)
    }

    // ── Lock helpers ──────────────────────────────────────────────
    // Payloads never run while these guards are held, so a poisoned lock
    // still guards consistent data.

    pub(super) fn queue(&self) -> MutexGuard<'_, ReadyQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn metrics_mut(&self) -> std::sync::RwLockWriteGuard<'_, SchedulerMetrics> {
        self.metrics.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn registry_ref(&self) -> std::sync::RwLockReadGuard<'_, CallbackRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn registry_mut(&self) -> std::sync::RwLockWriteGuard<'_, CallbackRegistry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}
