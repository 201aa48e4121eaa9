//! Safety monitoring
//!
//! Detects fault conditions that end a run.

pub mod monitor;

pub use monitor::{SafetyMonitor, SafetyStatus};
