use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::scheduler::types::Rank;

/// Errors raised by the scheduler outside of payload execution.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("ready queue is empty")]
    EmptyQueue,

    #[error("unknown system class: {0}")]
    UnknownSystem(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),
}

/// A unit of work that failed at the dispatch boundary.
///
/// Always logged and swallowed by the scheduler; callers of `process`
/// never see one.
#[derive(Debug, Clone, Error)]
#[error("dispatch of {item} (rank {rank}) failed at {timestamp}: {cause}")]
pub struct DispatchError {
    /// Label of the work item that failed.
    pub item: String,
    /// Rank the item was submitted with.
    pub rank: Rank,
    pub cause: DispatchCause,
    pub timestamp: DateTime<Utc>,
}

impl DispatchError {
    pub fn new(item: impl Into<String>, rank: Rank, cause: DispatchCause) -> Self {
        Self {
            item: item.into(),
            rank,
            cause,
            timestamp: Utc::now(),
        }
    }
}

/// Why a dispatch failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchCause {
    #[error("payload returned an error: {0}")]
    Failed(String),

    #[error("payload panicked: {0}")]
    Panicked(String),

    #[error("payload task was cancelled")]
    Cancelled,

    #[error("no callback registered under '{0}'")]
    RegistrationMiss(String),
}
