use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Dispatch priority. Higher numeric value = dispatched earlier among
/// eligible items. The default is the miscellaneous baseline.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Rank(pub i32);

impl From<i32> for Rank {
    fn from(value: i32) -> Self {
        Rank(value)
    }
}

impl From<SystemClass> for Rank {
    fn from(system: SystemClass) -> Self {
        system.rank()
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subsystem classes sharing the ready queue.
///
/// Each class carries a fixed rank, the cadence at which the host driver
/// processes it, and how many of its items one pass may dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemClass {
    Movement,
    Combat,
    Power,
    Shields,
    Sensors,
    Misc,
}

impl SystemClass {
    pub const ALL: [SystemClass; 6] = [
        SystemClass::Movement,
        SystemClass::Combat,
        SystemClass::Power,
        SystemClass::Shields,
        SystemClass::Sensors,
        SystemClass::Misc,
    ];

    pub fn rank(self) -> Rank {
        Rank(match self {
            SystemClass::Movement => 100,
            SystemClass::Combat => 90,
            SystemClass::Power => 80,
            SystemClass::Shields => 70,
            SystemClass::Sensors => 60,
            SystemClass::Misc => 0,
        })
    }

    /// How often the host driver runs a pass filtered to this class.
    pub fn interval(self) -> Duration {
        match self {
            SystemClass::Movement => Duration::from_millis(100),
            SystemClass::Combat => Duration::from_millis(200),
            SystemClass::Power => Duration::from_secs(1),
            SystemClass::Shields => Duration::from_millis(500),
            SystemClass::Sensors => Duration::from_secs(1),
            SystemClass::Misc => Duration::from_millis(100),
        }
    }

    /// Items one filtered pass may dispatch.
    pub fn batch_size(self) -> usize {
        match self {
            SystemClass::Movement => 10,
            SystemClass::Combat => 5,
            SystemClass::Power => 1,
            SystemClass::Shields => 2,
            SystemClass::Sensors => 1,
            SystemClass::Misc => 10,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SystemClass::Movement => "movement",
            SystemClass::Combat => "combat",
            SystemClass::Power => "power",
            SystemClass::Shields => "shields",
            SystemClass::Sensors => "sensors",
            SystemClass::Misc => "misc",
        }
    }

    /// The class whose rank is exactly `rank`, if any.
    pub fn from_rank(rank: Rank) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.rank() == rank)
    }
}

impl fmt::Display for SystemClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SystemClass {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|system| system.name() == lower)
            .ok_or_else(|| SchedulerError::UnknownSystem(s.to_string()))
    }
}

/// Metrics/log bucket for a rank: the class name, or `rank <n>` for ranks
/// that match no class.
pub fn bucket_for(rank: Rank) -> String {
    match SystemClass::from_rank(rank) {
        Some(system) => system.name().to_string(),
        None => format!("rank {}", rank),
    }
}

/// Scheduler configuration, typically parsed from the `[scheduler]` TOML section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Concurrent immediate payloads on the blocking pool. 0 = available parallelism.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Upper bound for an unfiltered, uncapped `process` pass.
    /// `None` drains everything eligible.
    #[serde(default)]
    pub unfiltered_batch_cap: Option<usize>,
}

fn default_worker_threads() -> usize {
    0
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            unfiltered_batch_cap: None,
        }
    }
}

impl SchedulerConfig {
    /// Resolve worker thread count (0 means use available parallelism).
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.worker_threads
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_follow_subsystem_urgency() {
        assert!(SystemClass::Movement.rank() > SystemClass::Combat.rank());
        assert!(SystemClass::Combat.rank() > SystemClass::Power.rank());
        assert!(SystemClass::Power.rank() > SystemClass::Shields.rank());
        assert!(SystemClass::Shields.rank() > SystemClass::Sensors.rank());
        assert!(SystemClass::Sensors.rank() > SystemClass::Misc.rank());
        assert_eq!(Rank::default(), SystemClass::Misc.rank());
    }

    #[test]
    fn tuning_values() {
        assert_eq!(SystemClass::Movement.interval(), Duration::from_millis(100));
        assert_eq!(SystemClass::Shields.interval(), Duration::from_millis(500));
        assert_eq!(SystemClass::Movement.batch_size(), 10);
        assert_eq!(SystemClass::Combat.batch_size(), 5);
        assert_eq!(SystemClass::Power.batch_size(), 1);
        assert_eq!(SystemClass::Shields.batch_size(), 2);
    }

    #[test]
    fn parse_and_display_round_trip() {
        for system in SystemClass::ALL {
            assert_eq!(system.to_string().parse::<SystemClass>().unwrap(), system);
        }
        assert_eq!(" Sensors ".parse::<SystemClass>().unwrap(), SystemClass::Sensors);
        assert!(matches!(
            "warp".parse::<SystemClass>(),
            Err(SchedulerError::UnknownSystem(name)) if name == "warp"
        ));
    }

    #[test]
    fn from_rank_matches_exactly() {
        assert_eq!(SystemClass::from_rank(Rank(90)), Some(SystemClass::Combat));
        assert_eq!(SystemClass::from_rank(Rank(91)), None);
        assert_eq!(bucket_for(Rank(70)), "shields");
        assert_eq!(bucket_for(Rank(-3)), "rank -3");
    }

    #[test]
    fn scheduler_config_defaults() {
        let mut config = SchedulerConfig::default();
        assert_eq!(config.worker_threads, 0);
        assert!(config.unfiltered_batch_cap.is_none());
        assert!(config.resolved_worker_threads() > 0);

        config.worker_threads = 3;
        assert_eq!(config.resolved_worker_threads(), 3);
    }
}
