//! Run reporting trait
//!
//! Every line received and every command sent is surfaced as a
//! [`RunEvent`] so an operator can audit the run. Reporting is a side
//! channel: it never influences sequencing.

use core::time::Duration;

use thermocycler_protocol::{StatusSample, TelemetryError};

use crate::state::AbortReason;

/// Observable run events
///
/// Step indices are 0-based and absolute within the program; `total` is
/// the program length.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent<'a> {
    /// Startup banner line drained before the first command
    HandshakeLine {
        /// 1-based position within the handshake
        index: u8,
        /// Raw line bytes
        line: &'a [u8],
    },
    /// Setpoint command written and flushed
    SetpointSent {
        step: usize,
        total: usize,
        target_c: f32,
    },
    /// Status sample while heating or cooling towards the target
    Heating {
        step: usize,
        total: usize,
        target_c: f32,
        sample: &'a StatusSample<'a>,
    },
    /// Target reached, hold timer started
    TemperatureReached {
        step: usize,
        total: usize,
        target_c: f32,
        measured_c: f32,
    },
    /// Status sample while holding
    Holding {
        step: usize,
        total: usize,
        elapsed: Duration,
        hold: Duration,
        sample: &'a StatusSample<'a>,
    },
    /// Diagnostic text from the controller
    StatusMessage { text: &'a str },
    /// Line that could not be decoded; skipped
    MalformedLine {
        line: &'a [u8],
        error: TelemetryError,
    },
    /// Hold finished for a step
    StepComplete { step: usize, total: usize },
    /// Every step finished
    ProgramComplete { total: usize },
    /// Safe setpoint sent while stopping a run
    ShutdownSent { target_c: f32 },
    /// Run stopped before completion
    Aborted {
        step: usize,
        total: usize,
        reason: AbortReason,
    },
}

/// Trait for run reporting
pub trait Reporter {
    /// Handle a run event
    fn report(&mut self, event: &RunEvent<'_>);
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, event: &RunEvent<'_>) {
        (**self).report(event)
    }
}

/// Reporter that discards all events
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _event: &RunEvent<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        events: usize,
    }

    impl Reporter for Counter {
        fn report(&mut self, _event: &RunEvent<'_>) {
            self.events += 1;
        }
    }

    fn report_twice<R: Reporter>(mut reporter: R) {
        reporter.report(&RunEvent::ProgramComplete { total: 3 });
        reporter.report(&RunEvent::StatusMessage { text: "ok" });
    }

    #[test]
    fn test_mut_ref_forwards() {
        let mut counter = Counter::default();
        report_twice(&mut counter);
        assert_eq!(counter.events, 2);
    }
}
