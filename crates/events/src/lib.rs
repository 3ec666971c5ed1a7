pub mod config;
pub mod driver;
pub mod error;
pub mod scheduler;

pub use config::{DriverConfig, EngineConfig, PeriodicConfig};
pub use driver::{Driver, DriverHandle, Lane};
pub use error::{DispatchCause, DispatchError, SchedulerError};
pub use scheduler::{
    Callback, Command, Payload, Periodic, Rank, Scheduler, SchedulerConfig, SchedulerMetrics,
    SystemClass, get_scheduler,
};
