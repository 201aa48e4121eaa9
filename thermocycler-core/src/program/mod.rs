//! PCR program construction
//!
//! Glues a start block, a cycle block repeated `n` times and an end block
//! into the ordered step list the sequencer executes.

pub mod step;

pub use step::{Program, ProgramError, Step, MAX_PROGRAM_STEPS};
