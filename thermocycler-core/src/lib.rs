//! Board-agnostic core logic for the thermocycler
//!
//! This crate contains the supervisory logic that walks a PCR program
//! against an external Peltier controller:
//!
//! - Program construction (start block, repeated cycle block, end block)
//! - Run state machine (reach temperature, then hold for duration)
//! - Step sequencer driving a line channel
//! - Safety monitoring (telemetry silence, over-temperature)
//! - Run configuration
//! - Reporting trait for operator-visible run events

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod program;
pub mod safety;
pub mod sequencer;
pub mod state;
pub mod traits;

pub use config::{RunConfig, SafetyLimits};
pub use program::{Program, ProgramError, Step};
pub use sequencer::{Sequencer, SequencerError};
pub use state::{AbortReason, Phase, RunState};
pub use traits::{NullReporter, Reporter, RunEvent};
