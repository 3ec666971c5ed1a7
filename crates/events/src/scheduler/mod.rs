//! Priority-ordered, time-aware event scheduler.
//!
//! Subsystems submit [`Payload`]s or tagged [`Command`]s with a [`Rank`] and
//! a delay. A host driver calls [`Scheduler::process`] on a cadence per
//! [`SystemClass`]; each pass pops the most urgent items, skips those not yet
//! due or belonging to another system, dispatches the rest one after
//! another, and puts the skipped items back.

pub mod dispatcher;
pub mod global;
pub mod item;
pub mod metrics;
pub mod periodic;
pub mod queue;
pub mod registry;
pub mod runner;
pub mod types;

pub use dispatcher::Dispatcher;
#[cfg(any(test, feature = "test-utils"))]
pub use global::reset_scheduler;
pub use global::get_scheduler;
pub use item::{Command, Job, Payload, WorkItem};
pub use metrics::SchedulerMetrics;
pub use periodic::Periodic;
pub use queue::ReadyQueue;
pub use registry::{Callback, CallbackRegistry};
pub use runner::Scheduler;
pub use types::{Rank, SchedulerConfig, SystemClass, bucket_for};
