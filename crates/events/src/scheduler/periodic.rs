//! Self-rescheduling periodic ticks.
//!
//! A periodic subsystem registers a named callback once. Each time the
//! callback's command is dispatched, the produced payload runs and then the
//! same command is submitted again with the subsystem's rank and interval.
//! The scheduler itself has no notion of repetition.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tracing::{debug, warn};

use super::item::{Command, Payload};
use super::runner::Scheduler;
use super::types::{Rank, SystemClass};

/// A named tick that resubmits itself after every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Periodic {
    pub name: String,
    pub system: SystemClass,
    /// Delay before the next occurrence. Defaults to the system's interval.
    pub interval: Duration,
}

impl Periodic {
    pub fn new(name: impl Into<String>, system: SystemClass) -> Self {
        Self {
            name: name.into(),
            system,
            interval: system.interval(),
        }
    }

    pub fn every(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Scheduler {
    /// Register `work` as a self-rescheduling callback.
    ///
    /// The next occurrence is submitted when the produced payload finishes,
    /// whether it succeeded, returned an error, or panicked. Nothing is
    /// submitted once the scheduler itself has been dropped.
    pub fn register_periodic<F>(self: &Arc<Self>, periodic: Periodic, work: F)
    where
        F: Fn(&Command) -> Payload + Send + Sync + 'static,
    {
        let scheduler = Arc::downgrade(self);
        let rank = periodic.system.rank();
        let interval = periodic.interval;

        self.register(periodic.name, move |command: &Command| {
            let next = Resubmit {
                scheduler: scheduler.clone(),
                command: command.clone(),
                rank,
                interval,
            };
            match work(command) {
                Payload::Immediate(run) => Payload::Immediate(Box::new(move || {
                    let _next = next;
                    run()
                })),
                Payload::Suspendable(run) => Payload::suspendable(move || async move {
                    let _next = next;
                    run().await
                }),
            }
        });
    }

    /// Submit the first occurrence of a registered callback with zero delay.
    ///
    /// Returns `false` (and logs) when nothing is registered under `name`.
    pub fn start_periodic(&self, name: &str, system: SystemClass) -> bool {
        if self.lookup(name).is_none() {
            warn!(callback = %name, "callback not found; periodic tick not started");
            return false;
        }
        self.submit_command(Command::new(name), system, Duration::ZERO);
        true
    }
}

/// Submits the next occurrence when dropped, so unwinding still reschedules.
struct Resubmit {
    scheduler: Weak<Scheduler>,
    command: Command,
    rank: Rank,
    interval: Duration,
}

impl Drop for Resubmit {
    fn drop(&mut self) {
        match self.scheduler.upgrade() {
            Some(scheduler) => {
                scheduler.submit_command(self.command.clone(), self.rank, self.interval);
            }
            None => debug!(command = %self.command, "scheduler gone; periodic tick stopped"),
        }
    }
}
