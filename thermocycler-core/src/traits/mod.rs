//! Collaborator traits
//!
//! These traits define the interface between the sequencer and the
//! operator-facing front end.

pub mod reporter;

pub use reporter::{NullReporter, Reporter, RunEvent};
