//! Configuration types
//!
//! Run parameters are passed explicitly to the sequencer; nothing is read
//! from ambient state.

pub mod types;

pub use types::*;
