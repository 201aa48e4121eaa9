//! Events that trigger phase transitions

use super::machine::AbortReason;

/// Events that can trigger phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Run accepted, start draining the controller banner
    Start,
    /// Banner lines drained
    HandshakeComplete,
    /// A status sample landed within tolerance of the current target
    TemperatureReached,
    /// Hold finished and more steps remain
    NextStep,
    /// Hold finished on the last step
    ProgramFinished,
    /// Run cannot continue
    Abort(AbortReason),
}
