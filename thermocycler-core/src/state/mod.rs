//! State machine for program execution
//!
//! A run is explicit, finite and deterministic: every phase change is the
//! result of exactly one event, and only the sequencer applies events.

pub mod events;
pub mod machine;
pub mod run;

pub use events::Event;
pub use machine::{AbortReason, Phase};
pub use run::RunState;
