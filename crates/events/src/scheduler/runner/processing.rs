use std::panic::{AssertUnwindSafe, catch_unwind};

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{DispatchCause, DispatchError};
use crate::scheduler::item::{Job, Payload, WorkItem};
use crate::scheduler::types::{Rank, SystemClass, bucket_for};

use super::Scheduler;

impl Scheduler {
    /// Run one batch pass and return how many items were dispatched.
    ///
    /// The cap is `max_items` when given, else the filter's batch size, else
    /// the queue length at the start of the pass. Items not yet due, or whose
    /// rank differs from the filter's, are skipped without counting toward
    /// the cap and stay in the queue, visible to concurrent passes while a
    /// dispatch is in flight. Failed dispatches count.
    pub async fn process(&self, system: Option<SystemClass>, max_items: Option<usize>) -> usize {
        let now = Instant::now();
        let cap = self.batch_cap(system, max_items);
        let mut processed = 0;

        while processed < cap {
            let Some(item) = self.next_eligible(system, now) else {
                break;
            };
            self.dispatch(item).await;
            processed += 1;
        }

        if processed > 0 {
            debug!(
                system = system.map(SystemClass::name).unwrap_or("all"),
                processed,
                pending = self.queue_depth(),
                cap,
                "batch pass complete"
            );
        }
        processed
    }

    /// Pop the most urgent item that is due by `now` and matches `system`.
    ///
    /// Skipped items go back before the lock is released, so the queue never
    /// appears to lose items between passes.
    fn next_eligible(&self, system: Option<SystemClass>, now: Instant) -> Option<WorkItem> {
        let mut queue = self.queue();
        let mut skipped = Vec::new();
        let mut found = None;

        while let Ok(item) = queue.pop_min() {
            let matches = system.map_or(true, |s| item.rank == s.rank());
            if item.due_at <= now && matches {
                found = Some(item);
                break;
            }
            skipped.push(item);
        }

        for item in skipped {
            queue.push(item);
        }
        found
    }

    /// Effective cap for one pass.
    pub(crate) fn batch_cap(&self, system: Option<SystemClass>, max_items: Option<usize>) -> usize {
        if let Some(max) = max_items {
            return max;
        }
        if let Some(system) = system {
            return system.batch_size();
        }
        let depth = self.queue_depth().max(1);
        match self.config.unfiltered_batch_cap {
            Some(limit) => depth.min(limit),
            None => depth,
        }
    }

    async fn dispatch(&self, item: WorkItem) {
        let started = std::time::Instant::now();
        let WorkItem {
            rank, label, job, ..
        } = item;

        let result = match self.resolve(&label, rank, job) {
            Ok(payload) => self.dispatcher.execute(&label, rank, payload).await,
            Err(e) => Err(e),
        };

        let depth = self.queue_depth();
        {
            let mut m = self.metrics_mut();
            m.record_dispatch(&bucket_for(rank), started.elapsed(), result.is_ok());
            m.queue_depth = depth;
        }
    }

    /// Turn a job into something the dispatcher can run.
    fn resolve(&self, label: &str, rank: Rank, job: Job) -> Result<Payload, DispatchError> {
        let command = match job {
            Job::Payload(payload) => return Ok(payload),
            Job::Command(command) => command,
        };

        let cause = match self.lookup(&command.name) {
            Some(callback) => match catch_unwind(AssertUnwindSafe(|| callback(&command))) {
                Ok(payload) => return Ok(payload),
                Err(_) => DispatchCause::Panicked(format!("callback '{}' panicked", command.name)),
            },
            None => DispatchCause::RegistrationMiss(command.name.clone()),
        };

        let err = DispatchError::new(label, rank, cause);
        warn!(
            item = %err.item,
            system = %bucket_for(rank),
            error = %err.cause,
            "could not resolve command; continuing batch"
        );
        Err(err)
    }
}
