//! Program execution
//!
//! The sequencer is a single blocking loop that alternates writes and
//! reads on one channel. Per step it:
//!
//! 1. writes `t<target>\n` and flushes it,
//! 2. reads lines until a status sample lies within tolerance of the target
//!    (`AwaitingTemperature`),
//! 3. reads lines until the hold duration has elapsed since the target was
//!    reached (`Holding`),
//! 4. advances to the next step.
//!
//! Before the first command, a fixed number of banner lines is drained.
//! Cancellation is checked once per read iteration in every phase.

use core::sync::atomic::{AtomicBool, Ordering};

use thermocycler_hal::{LineChannel, Monotonic};
use thermocycler_protocol::{decode_line, SetpointCommand, Telemetry};

use super::error::SequencerError;
use crate::config::RunConfig;
use crate::program::Step;
use crate::safety::{SafetyMonitor, SafetyStatus};
use crate::state::{Event, RunState};
use crate::traits::{Reporter, RunEvent};

/// Receive buffer size; longer lines are truncated by the channel
pub const LINE_BUFFER_SIZE: usize = 256;

/// Step sequencer
///
/// Owns the channel for the duration of a run and is the only writer of
/// [`RunState`].
#[derive(Debug)]
pub struct Sequencer<C, K, R> {
    /// Line channel to the controller
    channel: C,
    /// Monotonic time source
    clock: K,
    /// Run event sink
    reporter: R,
    /// Run parameters
    config: RunConfig,
    /// State of the current (or last) run
    state: RunState,
    /// Link and temperature watchdog
    safety: SafetyMonitor,
}

impl<C, K, R> Sequencer<C, K, R>
where
    C: LineChannel,
    K: Monotonic,
    R: Reporter,
{
    /// Create a new sequencer
    pub fn new(channel: C, clock: K, reporter: R, config: RunConfig) -> Self {
        let now = clock.now();
        Self {
            channel,
            clock,
            reporter,
            config,
            state: RunState::default(),
            safety: SafetyMonitor::new(config.limits, now),
        }
    }

    /// Get the state of the current or last run
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Get the channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Get the reporter
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Release the collaborators
    pub fn into_parts(self) -> (C, K, R) {
        (self.channel, self.clock, self.reporter)
    }

    /// Execute a program
    ///
    /// Starts at `config.start_step` and returns once the last step's hold
    /// has elapsed. Channel failures end the run immediately; malformed or
    /// diagnostic lines are reported and skipped. Setting `cancel` stops
    /// the run; once a step setpoint has been sent, the safe temperature
    /// is commanded first.
    pub fn run(
        &mut self,
        program: &[Step],
        cancel: &AtomicBool,
    ) -> Result<(), SequencerError<C::Error>> {
        if program.is_empty() {
            return Err(SequencerError::ProgramEmpty);
        }
        if self.config.start_step >= program.len() {
            return Err(SequencerError::InvalidStartStep);
        }
        let setpoints_valid = self.config.safe_temperature_c.is_finite()
            && program
                .iter()
                .all(|step| step.target_temperature_c().is_finite());
        if !setpoints_valid {
            return Err(SequencerError::InvalidSetpoint);
        }
        let tolerance_c = self.config.tolerance_c;
        if !(tolerance_c.is_finite() && tolerance_c > 0.0) {
            return Err(SequencerError::InvalidTolerance);
        }

        let now = self.clock.now();
        self.state.start(self.config.start_step);
        self.safety = SafetyMonitor::new(self.config.limits, now);

        let result = self.execute(program, cancel);

        if let Some(reason) = result.as_ref().err().and_then(SequencerError::abort_reason) {
            let now = self.clock.now();
            self.state.apply(Event::Abort(reason), now);
            self.reporter.report(&RunEvent::Aborted {
                step: self.state.step_index(),
                total: program.len(),
                reason,
            });
        }

        result
    }

    fn execute(
        &mut self,
        program: &[Step],
        cancel: &AtomicBool,
    ) -> Result<(), SequencerError<C::Error>> {
        self.handshake(cancel)?;
        let now = self.clock.now();
        self.state.apply(Event::HandshakeComplete, now);

        let total = program.len();
        while let Some(step) = program.get(self.state.step_index()).copied() {
            let index = self.state.step_index();
            let target_c = step.target_temperature_c();

            self.send_setpoint(target_c)?;
            self.reporter.report(&RunEvent::SetpointSent {
                step: index,
                total,
                target_c,
            });

            self.await_temperature(index, total, &step, cancel)?;
            self.hold(index, total, &step, cancel)?;
            self.reporter.report(&RunEvent::StepComplete { step: index, total });

            let event = if index + 1 < total {
                Event::NextStep
            } else {
                Event::ProgramFinished
            };
            let now = self.clock.now();
            if self.state.apply(event, now).is_terminal() {
                self.reporter.report(&RunEvent::ProgramComplete { total });
                break;
            }
        }

        Ok(())
    }

    /// Drain the controller's startup banner
    fn handshake(&mut self, cancel: &AtomicBool) -> Result<(), SequencerError<C::Error>> {
        let mut buf = [0u8; LINE_BUFFER_SIZE];
        let mut drained = 0u8;

        while drained < self.config.handshake_lines {
            if let Some(line) = self.poll_line(&mut buf, cancel)? {
                drained += 1;
                self.reporter.report(&RunEvent::HandshakeLine {
                    index: drained,
                    line,
                });
            }
        }

        Ok(())
    }

    /// Read lines until a sample lies within tolerance of the target
    fn await_temperature(
        &mut self,
        index: usize,
        total: usize,
        step: &Step,
        cancel: &AtomicBool,
    ) -> Result<(), SequencerError<C::Error>> {
        let target_c = step.target_temperature_c();
        let mut buf = [0u8; LINE_BUFFER_SIZE];

        loop {
            let Some(line) = self.poll_line(&mut buf, cancel)? else {
                continue;
            };

            match decode_line(line) {
                Ok(Telemetry::Status(sample)) => {
                    let measured_c = sample.measured_temperature;
                    self.reporter.report(&RunEvent::Heating {
                        step: index,
                        total,
                        target_c,
                        sample: &sample,
                    });
                    self.check_sample(measured_c)?;

                    if step.is_reached(measured_c, self.config.tolerance_c) {
                        let now = self.clock.now();
                        self.state.apply(Event::TemperatureReached, now);
                        self.reporter.report(&RunEvent::TemperatureReached {
                            step: index,
                            total,
                            target_c,
                            measured_c,
                        });
                        return Ok(());
                    }
                }
                Ok(Telemetry::Info(info)) => {
                    self.reporter
                        .report(&RunEvent::StatusMessage { text: info.text });
                }
                Err(error) => {
                    self.reporter
                        .report(&RunEvent::MalformedLine { line, error });
                }
            }
        }
    }

    /// Read lines until the hold duration has elapsed
    ///
    /// Elapsed time is checked before every read, so a zero hold ends
    /// without reading and the phase ends on the first iteration at or
    /// after the deadline, whatever the last line contained.
    fn hold(
        &mut self,
        index: usize,
        total: usize,
        step: &Step,
        cancel: &AtomicBool,
    ) -> Result<(), SequencerError<C::Error>> {
        let hold = step.hold();
        let mut buf = [0u8; LINE_BUFFER_SIZE];

        loop {
            let elapsed = self.state.hold_elapsed(self.clock.now()).unwrap_or(hold);
            if elapsed >= hold {
                return Ok(());
            }

            let Some(line) = self.poll_line(&mut buf, cancel)? else {
                continue;
            };

            match decode_line(line) {
                Ok(Telemetry::Status(sample)) => {
                    let elapsed = self.state.hold_elapsed(self.clock.now()).unwrap_or(hold);
                    self.reporter.report(&RunEvent::Holding {
                        step: index,
                        total,
                        elapsed,
                        hold,
                        sample: &sample,
                    });
                    self.check_sample(sample.measured_temperature)?;
                }
                Ok(Telemetry::Info(info)) => {
                    self.reporter
                        .report(&RunEvent::StatusMessage { text: info.text });
                }
                Err(error) => {
                    self.reporter
                        .report(&RunEvent::MalformedLine { line, error });
                }
            }
        }
    }

    /// One read iteration: check cancellation, read, check link health
    fn poll_line<'b>(
        &mut self,
        buf: &'b mut [u8],
        cancel: &AtomicBool,
    ) -> Result<Option<&'b [u8]>, SequencerError<C::Error>> {
        if cancel.load(Ordering::Acquire) {
            if self.state.phase().setpoint_active() {
                let safe_c = self.config.safe_temperature_c;
                self.send_setpoint(safe_c)?;
                self.reporter
                    .report(&RunEvent::ShutdownSent { target_c: safe_c });
            }
            return Err(SequencerError::Cancelled);
        }

        match self.channel.read_line(buf) {
            Ok(Some(len)) => {
                self.safety.line_received(self.clock.now());
                let line: &'b [u8] = buf;
                Ok(Some(&line[..len.min(line.len())]))
            }
            Ok(None) => match self.safety.check_link(self.clock.now()) {
                SafetyStatus::Ok => Ok(None),
                SafetyStatus::Fault(_) => Err(self.fault(SequencerError::ChannelTimeout)),
            },
            Err(err) => Err(SequencerError::ChannelRead(err)),
        }
    }

    fn check_sample(&mut self, measured_c: f32) -> Result<(), SequencerError<C::Error>> {
        match self.safety.check_temperature(measured_c) {
            SafetyStatus::Ok => Ok(()),
            SafetyStatus::Fault(_) => Err(self.fault(SequencerError::OverTemperature)),
        }
    }

    /// Command the safe temperature on a safety fault
    ///
    /// Best effort: the link may already be gone, and the fault is
    /// returned either way. Nothing is written before the first step
    /// setpoint, since any setpoint enables the Peltier.
    fn fault(&mut self, error: SequencerError<C::Error>) -> SequencerError<C::Error> {
        let safe_c = self.config.safe_temperature_c;
        if self.state.phase().setpoint_active() && self.send_setpoint(safe_c).is_ok() {
            self.reporter
                .report(&RunEvent::ShutdownSent { target_c: safe_c });
        }
        error
    }

    /// Write a setpoint command and flush it before any further read
    fn send_setpoint(&mut self, target_c: f32) -> Result<(), SequencerError<C::Error>> {
        let line = SetpointCommand::new(target_c)
            .and_then(|cmd| cmd.encode_to_string())
            .map_err(|_| SequencerError::InvalidSetpoint)?;

        self.channel
            .write_blocking(line.as_bytes())
            .map_err(SequencerError::ChannelWrite)?;
        self.channel.flush().map_err(SequencerError::ChannelWrite)?;

        Ok(())
    }
}
