//! Host driver: runs batch passes on a fixed cadence.
//!
//! The driver spawns one lane per enabled [`SystemClass`], each calling
//! [`Scheduler::process`] filtered to that system, plus a general lane that
//! processes everything with a small cap. Lanes never cancel a pass that is
//! already running; shutdown is observed between passes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::config::DriverConfig;
use crate::scheduler::{Scheduler, SystemClass};

/// One processing cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lane {
    /// `None` for the general lane.
    pub system: Option<SystemClass>,
    pub period: Duration,
    /// Explicit cap; `None` defers to the scheduler's rule.
    pub cap: Option<usize>,
}

impl Lane {
    fn name(&self) -> &'static str {
        self.system.map(SystemClass::name).unwrap_or("general")
    }
}

/// Shared stop signal for all lanes.
#[derive(Default)]
struct Stop {
    requested: AtomicBool,
    notify: Notify,
}

pub struct Driver {
    scheduler: Arc<Scheduler>,
    config: DriverConfig,
}

impl Driver {
    pub fn new(scheduler: Arc<Scheduler>, config: DriverConfig) -> Self {
        Self { scheduler, config }
    }

    /// Lanes in start order: enabled systems first, general lane last.
    pub fn lanes(&self) -> Vec<Lane> {
        let mut lanes: Vec<Lane> = self
            .config
            .enabled_systems
            .iter()
            .map(|&system| Lane {
                system: Some(system),
                period: self.config.interval_for(system),
                cap: self.config.batch_for(system),
            })
            .collect();
        lanes.push(Lane {
            system: None,
            period: self.config.general_interval(),
            cap: Some(self.config.general_batch),
        });
        lanes
    }

    /// Start every lane on the current tokio runtime.
    pub fn spawn(self) -> DriverHandle {
        let stop = Arc::new(Stop::default());
        let lanes = self.lanes();

        let tasks = lanes
            .into_iter()
            .map(|lane| {
                info!(lane = lane.name(), period = ?lane.period, cap = ?lane.cap, "starting driver lane");
                let scheduler = Arc::clone(&self.scheduler);
                let stop = Arc::clone(&stop);
                tokio::spawn(run_lane(scheduler, lane, stop))
            })
            .collect();

        DriverHandle {
            scheduler: self.scheduler,
            stop,
            tasks,
        }
    }
}

async fn run_lane(scheduler: Arc<Scheduler>, lane: Lane, stop: Arc<Stop>) {
    let mut ticker = tokio::time::interval(lane.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        // Register interest before checking the flag so a concurrent
        // shutdown cannot slip between the two.
        let notified = stop.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if stop.requested.load(Ordering::Acquire) {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut notified => break,
        }

        let processed = scheduler.process(lane.system, lane.cap).await;
        if processed > 0 {
            debug!(lane = lane.name(), processed, "lane pass");
        }
    }

    debug!(lane = lane.name(), "driver lane stopped");
}

/// Handle to running driver lanes.
pub struct DriverHandle {
    scheduler: Arc<Scheduler>,
    stop: Arc<Stop>,
    tasks: Vec<JoinHandle<()>>,
}

impl DriverHandle {
    pub fn lane_count(&self) -> usize {
        self.tasks.len()
    }

    /// True while no shutdown was requested and at least one lane is alive.
    pub fn is_running(&self) -> bool {
        !self.stop.requested.load(Ordering::Acquire) && self.tasks.iter().any(|t| !t.is_finished())
    }

    /// Stop every lane after its current pass, then discard pending events.
    ///
    /// Returns how many pending items were discarded.
    pub async fn shutdown(self) -> usize {
        info!(lanes = self.tasks.len(), "stopping driver");
        self.stop.requested.store(true, Ordering::Release);
        self.stop.notify.notify_waiters();

        for task in self.tasks {
            if let Err(e) = task.await {
                error!(error = %e, "driver lane terminated abnormally");
            }
        }

        let discarded = self.scheduler.clear();
        info!(discarded, "driver stopped");
        discarded
    }
}
