use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scheduler::{Periodic, SchedulerConfig, SystemClass};

// ── Top-level config ────────────────────────────────────────────────

/// Full configuration for the space engine host.
///
/// Parsed from `space-engine.toml` with support for environment variable
/// overrides. Every section is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ready-queue and dispatcher tuning.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Processing cadence of the host driver.
    #[serde(default)]
    pub driver: DriverConfig,

    /// Self-rescheduling callbacks started on cold start, keyed by callback name.
    #[serde(default = "default_periodic")]
    pub periodic: BTreeMap<String, PeriodicConfig>,
}

// ── Section configs ─────────────────────────────────────────────────

/// Driver section: one processing lane per enabled system plus a general lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Period of the unfiltered catch-all pass, in milliseconds.
    #[serde(default = "default_general_interval_ms")]
    pub general_interval_ms: u64,

    /// Cap for the unfiltered catch-all pass.
    #[serde(default = "default_general_batch")]
    pub general_batch: usize,

    /// Systems that get a dedicated filtered lane.
    #[serde(default = "default_enabled_systems")]
    pub enabled_systems: Vec<SystemClass>,

    /// Per-system overrides keyed by system name (e.g. `[driver.systems.power]`).
    #[serde(default)]
    pub systems: HashMap<String, LaneOverride>,
}

/// Override for one system lane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneOverride {
    pub interval_ms: Option<u64>,
    pub batch_size: Option<usize>,
}

/// One cold-start periodic callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicConfig {
    pub system: SystemClass,
    /// Resubmission delay; defaults to the system's interval.
    pub interval_ms: Option<u64>,
}

fn default_general_interval_ms() -> u64 {
    100
}

fn default_general_batch() -> usize {
    10
}

fn default_enabled_systems() -> Vec<SystemClass> {
    vec![
        SystemClass::Movement,
        SystemClass::Combat,
        SystemClass::Power,
        SystemClass::Shields,
        SystemClass::Sensors,
    ]
}

fn default_periodic() -> BTreeMap<String, PeriodicConfig> {
    BTreeMap::from([
        (
            "power_update".to_string(),
            PeriodicConfig {
                system: SystemClass::Power,
                interval_ms: None,
            },
        ),
        (
            "sensor_update".to_string(),
            PeriodicConfig {
                system: SystemClass::Sensors,
                interval_ms: None,
            },
        ),
    ])
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            driver: DriverConfig::default(),
            periodic: default_periodic(),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            general_interval_ms: default_general_interval_ms(),
            general_batch: default_general_batch(),
            enabled_systems: default_enabled_systems(),
            systems: HashMap::new(),
        }
    }
}

impl DriverConfig {
    pub fn general_interval(&self) -> Duration {
        Duration::from_millis(self.general_interval_ms)
    }

    /// Lane period for `system`: the override if present, else the class interval.
    pub fn interval_for(&self, system: SystemClass) -> Duration {
        self.lane_override(system)
            .and_then(|o| o.interval_ms)
            .map(Duration::from_millis)
            .unwrap_or_else(|| system.interval())
    }

    /// Explicit cap for `system`'s lane. `None` lets the scheduler use the
    /// class batch size.
    pub fn batch_for(&self, system: SystemClass) -> Option<usize> {
        self.lane_override(system).and_then(|o| o.batch_size)
    }

    fn lane_override(&self, system: SystemClass) -> Option<&LaneOverride> {
        self.systems
            .iter()
            .find(|(name, _)| name.parse::<SystemClass>().ok() == Some(system))
            .map(|(_, o)| o)
    }
}

impl PeriodicConfig {
    pub fn to_periodic(&self, name: &str) -> Periodic {
        let periodic = Periodic::new(name, self.system);
        match self.interval_ms {
            Some(ms) => periodic.every(Duration::from_millis(ms)),
            None => periodic,
        }
    }
}
