//! Per-run execution state

use core::time::Duration;

use super::events::Event;
use super::machine::Phase;

/// State of one program execution
///
/// Owned and mutated only by the sequencer. `phase_start` is recorded once
/// per step, when the step enters [`Phase::Holding`]; all hold checks for
/// that step are measured from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunState {
    step_index: usize,
    phase: Phase,
    phase_start: Option<Duration>,
}

impl RunState {
    /// Current step index (0-based, absolute within the program)
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Time the current step entered Holding
    pub fn phase_start(&self) -> Option<Duration> {
        self.phase_start
    }

    /// Begin a run at the given step
    pub fn start(&mut self, first_step: usize) -> Phase {
        let next = self.phase.transition(Event::Start);
        if next != self.phase {
            self.step_index = first_step;
            self.phase_start = None;
            self.phase = next;
        }
        next
    }

    /// Apply an event at time `now`
    ///
    /// Returns the new phase. Events that are not valid in the current
    /// phase leave the state untouched.
    pub fn apply(&mut self, event: Event, now: Duration) -> Phase {
        let next = self.phase.transition(event);

        match (self.phase, next) {
            (Phase::AwaitingTemperature, Phase::Holding) => {
                self.phase_start = Some(now);
            }
            (Phase::Holding, Phase::AwaitingTemperature) => {
                self.step_index += 1;
                self.phase_start = None;
            }
            _ => {}
        }

        self.phase = next;
        next
    }

    /// Time spent holding the current step
    ///
    /// None unless the current phase is Holding.
    pub fn hold_elapsed(&self, now: Duration) -> Option<Duration> {
        match (self.phase, self.phase_start) {
            (Phase::Holding, Some(start)) => Some(now.saturating_sub(start)),
            _ => None,
        }
    }
}
