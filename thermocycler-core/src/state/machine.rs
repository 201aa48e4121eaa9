//! Phase definition
//!
//! Setpoint commands and hold timing are a function of the current phase
//! and an event.

use super::events::Event;

/// Run phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// No run started
    #[default]
    Idle,
    /// Draining the controller's startup banner
    Handshake,
    /// Setpoint sent, waiting for a sample within tolerance
    AwaitingTemperature,
    /// Target reached, holding for the step's duration
    Holding,
    /// All steps completed successfully
    Complete,
    /// Run stopped before completion
    Aborted(AbortReason),
}

/// Why a run stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AbortReason {
    /// Reading from the channel failed
    ChannelRead,
    /// Writing to the channel failed
    ChannelWrite,
    /// No telemetry within the configured timeout
    ChannelTimeout,
    /// Measured temperature exceeded the configured limit
    OverTemperature,
    /// Operator cancelled the run
    Cancelled,
}

impl Phase {
    /// Check if the run has ended (successfully or not)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Complete | Phase::Aborted(_))
    }

    /// Check if a setpoint has been commanded for the current step
    pub fn setpoint_active(&self) -> bool {
        matches!(self, Phase::AwaitingTemperature | Phase::Holding)
    }

    /// Process an event and return the next phase
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use Phase::*;

        match (self, event) {
            (Idle, Start) => Handshake,

            (Handshake, HandshakeComplete) => AwaitingTemperature,

            (AwaitingTemperature, TemperatureReached) => Holding,

            (Holding, NextStep) => AwaitingTemperature,
            (Holding, ProgramFinished) => Complete,

            // Any run in progress can be aborted
            (Handshake | AwaitingTemperature | Holding, Abort(reason)) => Aborted(reason),

            // Finished runs may be restarted
            (Complete | Aborted(_), Start) => Handshake,

            // Default: stay in current phase
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_cycle() {
        let phase = Phase::Idle.transition(Event::Start);
        assert_eq!(phase, Phase::Handshake);

        let phase = phase.transition(Event::HandshakeComplete);
        assert_eq!(phase, Phase::AwaitingTemperature);

        let phase = phase.transition(Event::TemperatureReached);
        assert_eq!(phase, Phase::Holding);

        let phase = phase.transition(Event::NextStep);
        assert_eq!(phase, Phase::AwaitingTemperature);

        let phase = phase
            .transition(Event::TemperatureReached)
            .transition(Event::ProgramFinished);
        assert_eq!(phase, Phase::Complete);
    }

    #[test]
    fn test_hold_cannot_be_skipped() {
        // Holding is only entered on TemperatureReached
        let phase = Phase::AwaitingTemperature;
        assert_eq!(phase.transition(Event::NextStep), phase);
        assert_eq!(phase.transition(Event::ProgramFinished), phase);
    }

    #[test]
    fn test_abort_from_running_phases() {
        let phases = [
            Phase::Handshake,
            Phase::AwaitingTemperature,
            Phase::Holding,
        ];

        for phase in phases {
            let next = phase.transition(Event::Abort(AbortReason::ChannelRead));
            assert_eq!(next, Phase::Aborted(AbortReason::ChannelRead));
        }
    }

    #[test]
    fn test_terminal_phases_ignore_abort() {
        assert_eq!(
            Phase::Complete.transition(Event::Abort(AbortReason::Cancelled)),
            Phase::Complete
        );
        assert_eq!(
            Phase::Idle.transition(Event::Abort(AbortReason::Cancelled)),
            Phase::Idle
        );
    }

    #[test]
    fn test_restart_after_abort() {
        let phase = Phase::Aborted(AbortReason::ChannelTimeout);
        assert_eq!(phase.transition(Event::Start), Phase::Handshake);
    }

    #[test]
    fn test_phase_queries() {
        assert!(Phase::Holding.setpoint_active());
        assert!(!Phase::Handshake.setpoint_active());
        assert!(Phase::Aborted(AbortReason::Cancelled).is_terminal());
        assert!(!Phase::Complete.setpoint_active());
    }
}
