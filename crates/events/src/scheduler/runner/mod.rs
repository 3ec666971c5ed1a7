//! Scheduler core -- owns the ready queue and the callback registry.
//!
//! Split into focused submodules:
//! - `core`: Scheduler struct, constructor, registry operations, and observers
//! - `submission`: enqueueing payloads and tagged commands
//! - `processing`: the gated, capped batch pass

mod core;
mod processing;
mod submission;

pub use self::core::Scheduler;
