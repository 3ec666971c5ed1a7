use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::debug;

use crate::scheduler::item::{Command, Job, Payload, WorkItem};
use crate::scheduler::types::{Rank, bucket_for};

use super::Scheduler;

/// Same horizon tokio uses for sleeps that overflow `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn due_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE)
}

impl Scheduler {
    /// Schedule `payload` to become eligible after `delay`.
    ///
    /// Pass `Rank::default()` for miscellaneous work. Never blocks on
    /// dispatch and never fails; delays past the clock's range are clamped
    /// to roughly 30 years.
    pub fn submit(&self, payload: Payload, rank: impl Into<Rank>, delay: Duration) {
        self.submit_at(payload, rank, due_after(delay));
    }

    /// Schedule `payload` for an explicit instant. Instants in the past are
    /// eligible immediately.
    pub fn submit_at(&self, payload: Payload, rank: impl Into<Rank>, due_at: Instant) {
        self.enqueue(Job::Payload(payload), rank.into(), due_at);
    }

    /// Schedule a tagged command, resolved through the registry when it is
    /// dispatched.
    pub fn submit_command(&self, command: Command, rank: impl Into<Rank>, delay: Duration) {
        self.enqueue(Job::Command(command), rank.into(), due_after(delay));
    }

    fn enqueue(&self, job: Job, rank: Rank, due_at: Instant) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let label = match &job {
            Job::Command(command) => command.to_string(),
            Job::Payload(_) => format!("{}#{}", bucket_for(rank), seq),
        };

        let item = WorkItem {
            rank,
            due_at,
            seq,
            enqueued_at: Utc::now(),
            label,
            job,
        };
        debug!(item = %item.label, rank = %rank, "submitted");

        let depth = {
            let mut queue = self.queue();
            queue.push(item);
            queue.len()
        };

        self.metrics_mut().record_submission(depth);
    }
}
