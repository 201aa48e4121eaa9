//! Program steps

use core::time::Duration;

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum steps in an expanded program
pub const MAX_PROGRAM_STEPS: usize = 512;

/// A single program step
///
/// Steps are the atomic units of execution: drive the controller to the
/// target temperature, then hold it for the given duration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Step {
    target_temperature_c: f32,
    hold: Duration,
}

impl Step {
    /// Create a step
    pub const fn new(target_temperature_c: f32, hold: Duration) -> Self {
        Self {
            target_temperature_c,
            hold,
        }
    }

    /// Create a step with a hold time in whole seconds
    pub const fn from_secs(target_temperature_c: f32, hold_s: u64) -> Self {
        Self::new(target_temperature_c, Duration::from_secs(hold_s))
    }

    /// Target temperature in °C
    pub const fn target_temperature_c(&self) -> f32 {
        self.target_temperature_c
    }

    /// Time to hold the target once reached
    pub const fn hold(&self) -> Duration {
        self.hold
    }

    /// Check whether a measurement counts as reaching this step's target
    ///
    /// The comparison is strict: a deviation of exactly `tolerance_c`
    /// is not reached.
    pub fn is_reached(&self, measured_c: f32, tolerance_c: f32) -> bool {
        let diff = measured_c - self.target_temperature_c;
        let deviation = if diff < 0.0 { -diff } else { diff };
        deviation < tolerance_c
    }
}

/// Errors building a program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProgramError {
    /// Start block has no steps
    EmptyStart,
    /// End block has no steps
    EmptyEnd,
    /// A target temperature is NaN or infinite
    InvalidTemperature,
    /// Expanded program exceeds [`MAX_PROGRAM_STEPS`]
    TooManySteps,
}

/// An expanded, ordered PCR program
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Program {
    steps: Vec<Step, MAX_PROGRAM_STEPS>,
}

impl Program {
    /// Build a program from its blocks
    ///
    /// The result is `start`, then `cycle` repeated `n_cycles` times, then
    /// `end`. Its length is `start.len() + cycle.len() * n_cycles + end.len()`.
    pub fn build(
        start: &[Step],
        cycle: &[Step],
        n_cycles: u16,
        end: &[Step],
    ) -> Result<Self, ProgramError> {
        if start.is_empty() {
            return Err(ProgramError::EmptyStart);
        }
        if end.is_empty() {
            return Err(ProgramError::EmptyEnd);
        }

        let blocks = start
            .iter()
            .chain(cycle.iter().cycle().take(cycle.len() * n_cycles as usize))
            .chain(end.iter());

        let mut steps = Vec::new();
        for step in blocks {
            if !step.target_temperature_c.is_finite() {
                return Err(ProgramError::InvalidTemperature);
            }
            steps.push(*step).map_err(|_| ProgramError::TooManySteps)?;
        }

        Ok(Self { steps })
    }

    /// Steps in execution order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the program has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sum of all hold durations
    ///
    /// A lower bound for the run time; ramping between setpoints adds to it.
    pub fn total_hold(&self) -> Duration {
        self.steps.iter().map(Step::hold).sum()
    }
}
