//! Log-backed run reporter
//!
//! Progress lines keep the format operators know from the bench:
//!
//! ```text
//! Step(2/93): Heating/cooling - 1	0.50	255	71.20	0	0	0	0
//! Step(2/93): Waiting...12.5s of 30s. 1	0.50	255	94.10	0	0	0	0
//! ```

use std::time::Duration;

use log::Level;
use thermocycler_core::{Reporter, RunEvent};
use thermocycler_protocol::StatusSample;

/// Reporter that writes every run event through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, event: &RunEvent<'_>) {
        let (level, message) = describe(event);
        log::log!(level, "{message}");
    }
}

/// Render an event as a log level and message
pub fn describe(event: &RunEvent<'_>) -> (Level, String) {
    match event {
        RunEvent::HandshakeLine { index, line } => (
            Level::Debug,
            format!("Controller banner {index}: {}", String::from_utf8_lossy(line)),
        ),
        RunEvent::SetpointSent {
            step,
            total,
            target_c,
        } => (
            Level::Info,
            format!("Step({}/{total}): Setting temperature to {target_c:.1}", step + 1),
        ),
        RunEvent::Heating {
            step,
            total,
            sample,
            ..
        } => (
            Level::Info,
            format!(
                "Step({}/{total}): Heating/cooling - {}",
                step + 1,
                raw_line(sample)
            ),
        ),
        RunEvent::TemperatureReached {
            step,
            total,
            target_c,
            measured_c,
        } => (
            Level::Info,
            format!(
                "Step({}/{total}): Reached {measured_c:.2} (target {target_c:.1})",
                step + 1
            ),
        ),
        RunEvent::Holding {
            step,
            total,
            elapsed,
            hold,
            sample,
        } => (
            Level::Info,
            format!(
                "Step({}/{total}): Waiting...{:.1}s of {}s. {}",
                step + 1,
                elapsed.as_secs_f32(),
                hold.as_secs(),
                raw_line(sample)
            ),
        ),
        RunEvent::StatusMessage { text } => {
            (Level::Info, format!("Status Message from pcr: {text}"))
        }
        RunEvent::MalformedLine { line, error } => (
            Level::Warn,
            format!(
                "Skipping unreadable line ({error:?}): {}",
                String::from_utf8_lossy(line)
            ),
        ),
        RunEvent::StepComplete { step, total } => {
            (Level::Debug, format!("Step({}/{total}): complete", step + 1))
        }
        RunEvent::ProgramComplete { total } => (
            Level::Info,
            format!("Program complete: {total} steps"),
        ),
        RunEvent::ShutdownSent { target_c } => (
            Level::Warn,
            format!("Commanded safe temperature {target_c:.1}"),
        ),
        RunEvent::Aborted {
            step,
            total,
            reason,
        } => (
            Level::Error,
            format!("Run aborted in step {}/{total}: {reason:?}", step + 1),
        ),
    }
}

/// Rejoin a sample's fields as they appeared on the wire
fn raw_line(sample: &StatusSample<'_>) -> String {
    sample.raw_fields.join("\t")
}

/// Format a duration as `1h 02m 03s`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (h, m, s) = (secs / 3600, (secs / 60) % 60, secs % 60);
    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}
