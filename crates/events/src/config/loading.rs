use std::path::Path;

use tracing::info;

use crate::error::SchedulerError;
use crate::scheduler::Periodic;

use super::types::EngineConfig;

impl EngineConfig {
    /// Parse config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, SchedulerError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchedulerError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Cold-start periodic callbacks in name order.
    pub fn periodics(&self) -> Vec<Periodic> {
        self.periodic
            .iter()
            .map(|(name, cfg)| cfg.to_periodic(name))
            .collect()
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        info!("Config loaded:");
        info!(
            "  scheduler:   worker_threads={}, unfiltered_batch_cap={}",
            self.scheduler.resolved_worker_threads(),
            self.scheduler
                .unfiltered_batch_cap
                .map(|c| c.to_string())
                .unwrap_or_else(|| "(none)".into())
        );
        info!(
            "  driver:      general every {}ms (cap {}), lanes={:?}",
            self.driver.general_interval_ms, self.driver.general_batch, self.driver.enabled_systems
        );
        for periodic in self.periodics() {
            info!(
                "  periodic:    {} ({}, every {:?})",
                periodic.name, periodic.system, periodic.interval
            );
        }
    }

    // ── Environment variable overrides ──────────────────────────────

    /// Apply environment variable overrides.
    ///
    /// Convention: `SPACE_SECTION_KEY` overrides `section.key`.
    /// - `SPACE_SCHEDULER_WORKER_THREADS` -> `scheduler.worker_threads`
    /// - `SPACE_SCHEDULER_UNFILTERED_BATCH_CAP` -> `scheduler.unfiltered_batch_cap`
    /// - `SPACE_DRIVER_GENERAL_INTERVAL_MS` -> `driver.general_interval_ms`
    /// - `SPACE_DRIVER_GENERAL_BATCH` -> `driver.general_batch`
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse("SPACE_SCHEDULER_WORKER_THREADS") {
            self.scheduler.worker_threads = v;
        }
        if let Some(v) = env_parse("SPACE_SCHEDULER_UNFILTERED_BATCH_CAP") {
            self.scheduler.unfiltered_batch_cap = Some(v);
        }
        if let Some(v) = env_parse("SPACE_DRIVER_GENERAL_INTERVAL_MS") {
            self.driver.general_interval_ms = v;
        }
        if let Some(v) = env_parse("SPACE_DRIVER_GENERAL_BATCH") {
            self.driver.general_batch = v;
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
