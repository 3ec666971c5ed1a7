use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Scheduler operational metrics, bucketed by system class name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerMetrics {
    /// Items submitted since construction.
    pub submitted: u64,
    /// Items dispatched (successes and failures) by bucket.
    pub dispatched: HashMap<String, u64>,
    /// Items whose dispatch failed, by bucket.
    pub failed: HashMap<String, u64>,
    /// Average dispatch duration by bucket.
    pub avg_dispatch_duration: HashMap<String, Duration>,
    /// Last dispatch time by bucket.
    pub last_dispatch: HashMap<String, DateTime<Utc>>,
    /// Queue depth after the most recent mutation.
    pub queue_depth: usize,
}

impl SchedulerMetrics {
    pub fn record_submission(&mut self, queue_depth: usize) {
        self.submitted += 1;
        self.queue_depth = queue_depth;
    }

    /// Record a dispatch attempt.
    pub fn record_dispatch(&mut self, bucket: &str, duration: Duration, succeeded: bool) {
        *self.dispatched.entry(bucket.to_string()).or_default() += 1;
        if !succeeded {
            *self.failed.entry(bucket.to_string()).or_default() += 1;
        }
        self.last_dispatch.insert(bucket.to_string(), Utc::now());

        let count = self.dispatched[bucket];
        let prev_avg = self
            .avg_dispatch_duration
            .get(bucket)
            .copied()
            .unwrap_or_default();

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        let new_avg = if count == 1 {
            duration
        } else {
            let prev_nanos = prev_avg.as_nanos() as f64;
            let cur_nanos = duration.as_nanos() as f64;
            let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / count as f64;
            Duration::from_nanos(avg_nanos as u64)
        };

        self.avg_dispatch_duration.insert(bucket.to_string(), new_avg);
    }

    pub fn total_dispatched(&self) -> u64 {
        self.dispatched.values().sum()
    }

    pub fn total_failed(&self) -> u64 {
        self.failed.values().sum()
    }
}
