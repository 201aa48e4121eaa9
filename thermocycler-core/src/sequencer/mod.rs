//! Step sequencer
//!
//! Drives the controller through a program: send a setpoint, wait for the
//! temperature to be reached, hold it, advance.

pub mod error;
pub mod executor;

pub use error::SequencerError;
pub use executor::{Sequencer, LINE_BUFFER_SIZE};
