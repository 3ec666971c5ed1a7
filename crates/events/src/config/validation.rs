use crate::error::SchedulerError;
use crate::scheduler::SystemClass;

use super::types::EngineConfig;

impl EngineConfig {
    /// Validate the config: reject zero periods and caps, unknown system names.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        self.validate_scheduler()?;
        self.validate_driver()?;
        self.validate_periodic()?;
        Ok(())
    }

    fn validate_scheduler(&self) -> Result<(), SchedulerError> {
        if self.scheduler.unfiltered_batch_cap == Some(0) {
            return Err(SchedulerError::Config(
                "scheduler.unfiltered_batch_cap must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Interval lanes panic on a zero period, so catch it here.
    fn validate_driver(&self) -> Result<(), SchedulerError> {
        let driver = &self.driver;
        if driver.general_interval_ms == 0 {
            return Err(SchedulerError::Config(
                "driver.general_interval_ms must be greater than 0".into(),
            ));
        }
        if driver.general_batch == 0 {
            return Err(SchedulerError::Config(
                "driver.general_batch must be at least 1".into(),
            ));
        }
        for (name, lane) in &driver.systems {
            let system: SystemClass = name.parse()?;
            if lane.interval_ms == Some(0) {
                return Err(SchedulerError::Config(format!(
                    "driver.systems.{system}.interval_ms must be greater than 0"
                )));
            }
            if lane.batch_size == Some(0) {
                return Err(SchedulerError::Config(format!(
                    "driver.systems.{system}.batch_size must be at least 1"
                )));
            }
        }
        Ok(())
    }

    fn validate_periodic(&self) -> Result<(), SchedulerError> {
        for (name, periodic) in &self.periodic {
            if name.trim().is_empty() {
                return Err(SchedulerError::Config(
                    "periodic callback names must not be empty".into(),
                ));
            }
            if periodic.interval_ms == Some(0) {
                return Err(SchedulerError::Config(format!(
                    "periodic.{name}.interval_ms must be greater than 0"
                )));
            }
        }
        Ok(())
    }
}
