//! Work items held by the ready queue.

use std::cmp::Ordering;
use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::types::Rank;

/// Deferred work. The variant is fixed at submission time.
pub enum Payload {
    /// Runs to completion on the blocking pool.
    Immediate(Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>),
    /// Produces a future that the scheduler awaits on the runtime.
    Suspendable(Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<()>> + Send + 'static>),
}

impl Payload {
    pub fn immediate<F>(work: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        Payload::Immediate(Box::new(work))
    }

    pub fn suspendable<F, Fut>(work: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Payload::Suspendable(Box::new(move || Box::pin(work())))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Immediate(_) => "immediate",
            Payload::Suspendable(_) => "suspendable",
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload::{}", self.kind())
    }
}

/// A tagged command resolved through the callback registry at dispatch time.
///
/// Used instead of closures over live objects for work that reschedules
/// itself: the queue only ever holds the name and an optional target id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Command {
    /// Registry key of the callback that produces the payload.
    pub name: String,
    /// Optional id of the object the command acts on (a ship, a station, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{}({})", self.name, target),
            None => f.write_str(&self.name),
        }
    }
}

/// What a work item runs when dispatched.
#[derive(Debug)]
pub enum Job {
    Payload(Payload),
    Command(Command),
}

/// One scheduled unit of work.
///
/// Ordering makes the "greatest" item the most urgent: higher rank first,
/// then earlier due time, then earlier submission.
#[derive(Debug)]
pub struct WorkItem {
    pub(crate) rank: Rank,
    pub(crate) due_at: Instant,
    pub(crate) seq: u64,
    pub(crate) enqueued_at: DateTime<Utc>,
    pub(crate) label: String,
    pub(crate) job: Job,
}

impl WorkItem {
    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn due_at(&self) -> Instant {
        self.due_at
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn job(&self) -> &Job {
        &self.job
    }
}

impl PartialEq for WorkItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for WorkItem {}

impl PartialOrd for WorkItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WorkItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| other.due_at.cmp(&self.due_at))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}
