//! Run-level errors

use crate::state::AbortReason;

/// Errors that end a run
///
/// Decoding problems with individual telemetry lines never appear here;
/// they are reported and skipped. `E` is the channel's error type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerError<E> {
    /// Program has no steps; nothing was read or written
    ProgramEmpty,
    /// Configured start step lies beyond the program
    InvalidStartStep,
    /// A step target or the safe temperature cannot be encoded
    InvalidSetpoint,
    /// Reach tolerance is not a positive finite number
    InvalidTolerance,
    /// Reading from the channel failed
    ChannelRead(E),
    /// Writing to the channel failed
    ChannelWrite(E),
    /// No telemetry within the configured timeout
    ChannelTimeout,
    /// Measured temperature exceeded the configured limit
    OverTemperature,
    /// Run cancelled by the operator
    Cancelled,
}

impl<E> SequencerError<E> {
    /// Reason recorded in the run state, if the run had started
    pub fn abort_reason(&self) -> Option<AbortReason> {
        match self {
            SequencerError::ChannelRead(_) => Some(AbortReason::ChannelRead),
            SequencerError::ChannelWrite(_) => Some(AbortReason::ChannelWrite),
            SequencerError::ChannelTimeout => Some(AbortReason::ChannelTimeout),
            SequencerError::OverTemperature => Some(AbortReason::OverTemperature),
            SequencerError::Cancelled => Some(AbortReason::Cancelled),
            SequencerError::ProgramEmpty
            | SequencerError::InvalidStartStep
            | SequencerError::InvalidSetpoint
            | SequencerError::InvalidTolerance => None,
        }
    }

    /// Check if this is a transport failure
    pub fn is_channel_error(&self) -> bool {
        matches!(
            self,
            SequencerError::ChannelRead(_)
                | SequencerError::ChannelWrite(_)
                | SequencerError::ChannelTimeout
        )
    }
}
