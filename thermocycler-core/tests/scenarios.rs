//! End-to-end runs against a scripted controller

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thermocycler_core::{
    AbortReason, Phase, Program, Reporter, RunConfig, RunEvent, SafetyLimits, Sequencer,
    SequencerError, Step,
};
use thermocycler_hal::{ErrorType, LineRx, LineTx, Monotonic};

// ============================================================================
// Test doubles
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkError {
    Broken,
    Exhausted,
}

#[derive(Debug, Clone)]
enum Entry {
    /// Line delivered at the given time (seconds since start)
    Line(f64, String),
    /// Poll that times out, advancing the clock
    Silence(f64),
    /// Read failure
    Fail,
    /// Raise the cancel flag, then time out
    Cancel,
}

#[derive(Debug, Clone)]
struct ManualClock(Rc<Cell<Duration>>);

impl Monotonic for ManualClock {
    fn now(&self) -> Duration {
        self.0.get()
    }
}

struct ScriptedController {
    script: VecDeque<Entry>,
    now: Rc<Cell<Duration>>,
    cancel: Rc<AtomicBool>,
    written: Vec<String>,
    fail_writes: bool,
}

impl ScriptedController {
    fn remaining(&self) -> usize {
        self.script.len()
    }

    fn advance_to(&self, secs: f64) {
        let at = Duration::from_secs_f64(secs);
        if at > self.now.get() {
            self.now.set(at);
        }
    }
}

impl ErrorType for ScriptedController {
    type Error = LinkError;
}

impl LineTx for ScriptedController {
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), LinkError> {
        if self.fail_writes {
            return Err(LinkError::Broken);
        }
        self.written
            .push(String::from_utf8(data.to_vec()).expect("commands are ASCII"));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LinkError> {
        Ok(())
    }
}

impl LineRx for ScriptedController {
    fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>, LinkError> {
        match self.script.pop_front().ok_or(LinkError::Exhausted)? {
            Entry::Line(at, line) => {
                self.advance_to(at);
                let len = line.len().min(buf.len());
                buf[..len].copy_from_slice(&line.as_bytes()[..len]);
                Ok(Some(len))
            }
            Entry::Silence(at) => {
                self.advance_to(at);
                Ok(None)
            }
            Entry::Fail => Err(LinkError::Broken),
            Entry::Cancel => {
                self.cancel.store(true, Ordering::Release);
                Ok(None)
            }
        }
    }
}

/// Owned copy of the events a run produced
#[derive(Debug, Clone, PartialEq)]
enum Seen {
    Handshake(u8),
    Setpoint(usize, f32),
    Heating(usize, f32),
    Reached(usize, f32),
    Holding(usize, Duration),
    Status(String),
    Malformed(Vec<u8>),
    StepComplete(usize),
    ProgramComplete(usize),
    Shutdown(f32),
    Aborted(usize, usize, AbortReason),
}

#[derive(Default)]
struct Recorder {
    seen: Vec<Seen>,
}

impl Reporter for Recorder {
    fn report(&mut self, event: &RunEvent<'_>) {
        let seen = match event {
            RunEvent::HandshakeLine { index, .. } => Seen::Handshake(*index),
            RunEvent::SetpointSent { step, target_c, .. } => Seen::Setpoint(*step, *target_c),
            RunEvent::Heating { step, sample, .. } => {
                Seen::Heating(*step, sample.measured_temperature)
            }
            RunEvent::TemperatureReached {
                step, measured_c, ..
            } => Seen::Reached(*step, *measured_c),
            RunEvent::Holding { step, elapsed, .. } => Seen::Holding(*step, *elapsed),
            RunEvent::StatusMessage { text } => Seen::Status(text.to_string()),
            RunEvent::MalformedLine { line, .. } => Seen::Malformed(line.to_vec()),
            RunEvent::StepComplete { step, .. } => Seen::StepComplete(*step),
            RunEvent::ProgramComplete { total } => Seen::ProgramComplete(*total),
            RunEvent::ShutdownSent { target_c } => Seen::Shutdown(*target_c),
            RunEvent::Aborted {
                step,
                total,
                reason,
            } => Seen::Aborted(*step, *total, *reason),
        };
        self.seen.push(seen);
    }
}

struct Harness {
    sequencer: Sequencer<ScriptedController, ManualClock, Recorder>,
    cancel: Rc<AtomicBool>,
}

impl Harness {
    fn new(script: Vec<Entry>, config: RunConfig) -> Self {
        let now = Rc::new(Cell::new(Duration::ZERO));
        let cancel = Rc::new(AtomicBool::new(false));
        let controller = ScriptedController {
            script: script.into(),
            now: now.clone(),
            cancel: cancel.clone(),
            written: Vec::new(),
            fail_writes: false,
        };
        let sequencer =
            Sequencer::new(controller, ManualClock(now), Recorder::default(), config);
        Self { sequencer, cancel }
    }

    fn run(&mut self, program: &[Step]) -> Result<(), SequencerError<LinkError>> {
        let cancel = self.cancel.clone();
        self.sequencer.run(program, &cancel)
    }

    fn written(&self) -> Vec<&str> {
        self.sequencer
            .channel()
            .written
            .iter()
            .map(String::as_str)
            .collect()
    }

    fn seen(&self) -> &[Seen] {
        &self.sequencer.reporter().seen
    }
}

/// Status line with the measured temperature in the fourth field
fn status(measured_c: f32) -> String {
    format!("1\t0.50\t255\t{measured_c:.2}\t0\t0\t0\t0")
}

fn line(at: f64, text: &str) -> Entry {
    Entry::Line(at, text.to_string())
}

fn sample(at: f64, measured_c: f32) -> Entry {
    Entry::Line(at, status(measured_c))
}

fn banner() -> Vec<Entry> {
    vec![
        line(0.0, "Thermocycler controller"),
        line(0.0, "PID ready"),
        line(0.0, "Target 25.0"),
    ]
}

fn config() -> RunConfig {
    RunConfig::with_tolerance(1.5)
}

fn quiet_config() -> RunConfig {
    RunConfig {
        handshake_lines: 0,
        ..config()
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_hold_exits_after_deadline_sample() {
    let mut script = banner();
    script.extend([
        sample(0.0, 88.0),
        sample(0.0, 94.2),
        sample(0.5, 94.1),
        sample(1.0, 94.0),
        sample(1.5, 93.9),
        sample(2.0, 94.0),
        sample(2.5, 94.0),
    ]);
    let mut harness = Harness::new(script, config());

    assert_eq!(harness.run(&[Step::from_secs(94.0, 2)]), Ok(()));

    // The sample at t=2.5 is never consumed
    assert_eq!(harness.sequencer.channel().remaining(), 1);
    assert_eq!(harness.written(), vec!["t94.0\n"]);
    assert_eq!(harness.sequencer.state().phase(), Phase::Complete);

    let holding: Vec<Duration> = harness
        .seen()
        .iter()
        .filter_map(|seen| match seen {
            Seen::Holding(_, elapsed) => Some(*elapsed),
            _ => None,
        })
        .collect();
    assert_eq!(
        holding,
        vec![
            Duration::from_millis(500),
            Duration::from_millis(1000),
            Duration::from_millis(1500),
            Duration::from_millis(2000),
        ]
    );
    assert!(harness.seen().contains(&Seen::Heating(0, 88.0)));
    assert!(harness.seen().contains(&Seen::Reached(0, 94.2)));
}

#[test]
fn test_short_line_is_skipped() {
    let mut script = banner();
    script.extend([line(0.0, "x\ty"), sample(1.0, 94.0)]);
    let mut harness = Harness::new(script, config());

    assert_eq!(harness.run(&[Step::from_secs(94.0, 0)]), Ok(()));

    // Two fields is not a status line; it is passed through as a message
    let seen = harness.seen();
    let message = seen
        .iter()
        .position(|s| *s == Seen::Status("x\ty".to_string()))
        .expect("short line reported");
    let reached = seen
        .iter()
        .position(|s| *s == Seen::Reached(0, 94.0))
        .expect("target reached");
    assert!(message < reached);
    assert_eq!(seen.iter().filter(|s| matches!(s, Seen::Reached(..))).count(), 1);
}

#[test]
fn test_unparseable_temperature_is_skipped() {
    let script = vec![
        line(0.0, "1\t0.50\t255\tnan\t0\t0\t0\t0"),
        line(0.5, "1\t0.50\t255\tabc\t0\t0\t0\t0"),
        Entry::Line(1.0, String::new()),
        sample(1.5, 94.0),
    ];
    let mut harness = Harness::new(script, quiet_config());

    assert_eq!(harness.run(&[Step::from_secs(94.0, 0)]), Ok(()));

    let malformed = harness
        .seen()
        .iter()
        .filter(|s| matches!(s, Seen::Malformed(_)))
        .count();
    assert_eq!(malformed, 2);
    assert!(harness.seen().contains(&Seen::Status(String::new())));
    assert!(harness.seen().contains(&Seen::Reached(0, 94.0)));
}

#[test]
fn test_read_failure_during_second_hold() {
    let mut script = banner();
    script.extend([
        sample(0.0, 94.0),
        sample(1.0, 94.0),
        sample(1.0, 60.0),
        sample(1.5, 60.0),
        Entry::Fail,
    ]);
    let mut harness = Harness::new(script, config());

    let program = [
        Step::from_secs(94.0, 1),
        Step::from_secs(60.0, 30),
        Step::from_secs(72.0, 30),
    ];
    assert_eq!(
        harness.run(&program),
        Err(SequencerError::ChannelRead(LinkError::Broken))
    );

    let state = harness.sequencer.state();
    assert_eq!(state.step_index(), 1);
    assert_eq!(state.phase(), Phase::Aborted(AbortReason::ChannelRead));
    assert_eq!(harness.written(), vec!["t94.0\n", "t60.0\n"]);
    assert_eq!(
        harness.seen().last(),
        Some(&Seen::Aborted(1, 3, AbortReason::ChannelRead))
    );
}

#[test]
fn test_tolerance_boundary_is_exclusive() {
    let script = vec![sample(0.0, 95.5), sample(1.0, 95.4)];
    let mut harness = Harness::new(script, quiet_config());

    assert_eq!(harness.run(&[Step::from_secs(94.0, 0)]), Ok(()));

    // 95.5 lies exactly 1.5 away and does not count
    assert!(!harness.seen().contains(&Seen::Reached(0, 95.5)));
    assert!(harness.seen().contains(&Seen::Reached(0, 95.4)));
}

#[test]
fn test_cooling_approach_from_above() {
    let script = vec![sample(0.0, 80.0), sample(5.0, 61.0)];
    let mut harness = Harness::new(script, quiet_config());

    assert_eq!(harness.run(&[Step::from_secs(60.0, 0)]), Ok(()));
    assert!(harness.seen().contains(&Seen::Reached(0, 61.0)));
}

#[test]
fn test_handshake_lines_are_drained_first() {
    let mut script = banner();
    script.push(sample(0.0, 94.0));
    let mut harness = Harness::new(script, config());

    assert_eq!(harness.run(&[Step::from_secs(94.0, 0)]), Ok(()));

    let seen = harness.seen();
    assert_eq!(
        &seen[..4],
        &[
            Seen::Handshake(1),
            Seen::Handshake(2),
            Seen::Handshake(3),
            Seen::Setpoint(0, 94.0),
        ]
    );
}

#[test]
fn test_banner_status_sample_is_not_evaluated() {
    // A status-shaped banner line must not satisfy the first step
    let script = vec![sample(0.0, 94.0), sample(1.0, 30.0), sample(2.0, 93.5)];
    let config = RunConfig {
        handshake_lines: 1,
        ..config()
    };
    let mut harness = Harness::new(script, config);

    assert_eq!(harness.run(&[Step::from_secs(94.0, 0)]), Ok(()));
    assert_eq!(harness.sequencer.channel().remaining(), 0);
    assert!(harness.seen().contains(&Seen::Reached(0, 93.5)));
}

#[test]
fn test_info_lines_are_reported() {
    let script = vec![line(0.0, "Target set"), sample(0.5, 94.0)];
    let mut harness = Harness::new(script, quiet_config());

    assert_eq!(harness.run(&[Step::from_secs(94.0, 0)]), Ok(()));
    assert!(harness.seen().contains(&Seen::Status("Target set".to_string())));
}

#[test]
fn test_zero_hold_advances_without_reading() {
    let script = vec![sample(0.0, 94.0), sample(1.0, 60.0), sample(2.0, 72.0)];
    let mut harness = Harness::new(script, quiet_config());

    let program = [
        Step::from_secs(94.0, 0),
        Step::from_secs(60.0, 0),
        Step::from_secs(72.0, 0),
    ];
    assert_eq!(harness.run(&program), Ok(()));
    assert_eq!(harness.written(), vec!["t94.0\n", "t60.0\n", "t72.0\n"]);
    assert!(!harness
        .seen()
        .iter()
        .any(|seen| matches!(seen, Seen::Holding(..))));
    assert_eq!(harness.seen().last(), Some(&Seen::ProgramComplete(3)));
}

#[test]
fn test_start_step_resumes_mid_program() {
    let script = vec![sample(0.0, 72.0)];
    let config = RunConfig {
        start_step: 2,
        ..quiet_config()
    };
    let mut harness = Harness::new(script, config);

    let program = [
        Step::from_secs(94.0, 0),
        Step::from_secs(60.0, 0),
        Step::from_secs(72.0, 0),
    ];
    assert_eq!(harness.run(&program), Ok(()));
    assert_eq!(harness.written(), vec!["t72.0\n"]);
    assert_eq!(harness.sequencer.state().step_index(), 2);
}

#[test]
fn test_built_program_runs_in_order() {
    let start = [Step::from_secs(94.0, 0)];
    let cycle = [Step::from_secs(60.0, 0), Step::from_secs(72.0, 0)];
    let end = [Step::from_secs(10.0, 0)];
    let program = Program::build(&start, &cycle, 2, &end).unwrap();

    let script = vec![
        sample(0.0, 94.0),
        sample(0.0, 60.0),
        sample(0.0, 72.0),
        sample(0.0, 60.0),
        sample(0.0, 72.0),
        sample(0.0, 10.0),
    ];
    let mut harness = Harness::new(script, quiet_config());

    assert_eq!(harness.run(program.steps()), Ok(()));
    assert_eq!(
        harness.written(),
        vec!["t94.0\n", "t60.0\n", "t72.0\n", "t60.0\n", "t72.0\n", "t10.0\n"]
    );
}

#[test]
fn test_cancel_during_hold_sends_safe_setpoint() {
    let script = vec![sample(0.0, 94.0), sample(1.0, 94.0), Entry::Cancel];
    let mut harness = Harness::new(script, quiet_config());

    assert_eq!(
        harness.run(&[Step::from_secs(94.0, 60)]),
        Err(SequencerError::Cancelled)
    );
    assert_eq!(harness.written(), vec!["t94.0\n", "t25.0\n"]);
    assert_eq!(
        harness.sequencer.state().phase(),
        Phase::Aborted(AbortReason::Cancelled)
    );
    assert!(harness.seen().contains(&Seen::Shutdown(25.0)));
}

#[test]
fn test_silent_link_times_out() {
    let script = vec![
        sample(0.0, 50.0),
        Entry::Silence(5.0),
        Entry::Silence(9.9),
        Entry::Silence(10.0),
    ];
    let config = RunConfig {
        limits: SafetyLimits {
            telemetry_timeout: Some(Duration::from_secs(10)),
            max_temperature_c: None,
        },
        ..quiet_config()
    };
    let mut harness = Harness::new(script, config);

    assert_eq!(
        harness.run(&[Step::from_secs(94.0, 0)]),
        Err(SequencerError::ChannelTimeout)
    );
    assert_eq!(harness.written(), vec!["t94.0\n", "t25.0\n"]);
    assert_eq!(
        harness.sequencer.state().phase(),
        Phase::Aborted(AbortReason::ChannelTimeout)
    );
}

#[test]
fn test_cancel_during_handshake_writes_nothing() {
    let script = vec![line(0.0, "Thermocycler controller"), Entry::Cancel];
    let mut harness = Harness::new(script, config());

    assert_eq!(
        harness.run(&[Step::from_secs(94.0, 10)]),
        Err(SequencerError::Cancelled)
    );

    // Any setpoint would switch the idle Peltier on
    assert!(harness.written().is_empty());
    assert!(!harness.seen().iter().any(|s| matches!(s, Seen::Shutdown(_))));
    assert_eq!(
        harness.sequencer.state().phase(),
        Phase::Aborted(AbortReason::Cancelled)
    );
    assert_eq!(
        harness.seen().last(),
        Some(&Seen::Aborted(0, 1, AbortReason::Cancelled))
    );
}

#[test]
fn test_timeout_during_handshake_writes_nothing() {
    let script = vec![Entry::Silence(31.0)];
    let mut harness = Harness::new(script, config());

    assert_eq!(
        harness.run(&[Step::from_secs(94.0, 10)]),
        Err(SequencerError::ChannelTimeout)
    );
    assert!(harness.written().is_empty());
    assert_eq!(
        harness.sequencer.state().phase(),
        Phase::Aborted(AbortReason::ChannelTimeout)
    );
}

#[test]
fn test_silence_without_timeout_keeps_waiting() {
    let script = vec![
        Entry::Silence(100.0),
        Entry::Silence(10_000.0),
        sample(10_001.0, 94.0),
    ];
    let config = RunConfig {
        limits: SafetyLimits {
            telemetry_timeout: None,
            max_temperature_c: None,
        },
        ..quiet_config()
    };
    let mut harness = Harness::new(script, config);

    assert_eq!(harness.run(&[Step::from_secs(94.0, 0)]), Ok(()));
}

#[test]
fn test_over_temperature_aborts() {
    let script = vec![sample(0.0, 90.0), sample(1.0, 101.0)];
    let config = RunConfig {
        limits: SafetyLimits {
            telemetry_timeout: None,
            max_temperature_c: Some(100.0),
        },
        ..quiet_config()
    };
    let mut harness = Harness::new(script, config);

    assert_eq!(
        harness.run(&[Step::from_secs(94.0, 0)]),
        Err(SequencerError::OverTemperature)
    );
    assert_eq!(harness.written(), vec!["t94.0\n", "t25.0\n"]);
}

#[test]
fn test_write_failure_aborts_before_reading() {
    let now = Rc::new(Cell::new(Duration::ZERO));
    let controller = ScriptedController {
        script: vec![sample(0.0, 94.0)].into(),
        now: now.clone(),
        cancel: Rc::new(AtomicBool::new(false)),
        written: Vec::new(),
        fail_writes: true,
    };
    let mut sequencer =
        Sequencer::new(controller, ManualClock(now), Recorder::default(), quiet_config());
    let cancel = AtomicBool::new(false);

    assert_eq!(
        sequencer.run(&[Step::from_secs(94.0, 0)], &cancel),
        Err(SequencerError::ChannelWrite(LinkError::Broken))
    );
    assert_eq!(
        sequencer.state().phase(),
        Phase::Aborted(AbortReason::ChannelWrite)
    );

    let (controller, _, recorder) = sequencer.into_parts();
    assert_eq!(controller.remaining(), 1);
    assert!(controller.written.is_empty());
    assert_eq!(
        recorder.seen,
        vec![Seen::Aborted(0, 1, AbortReason::ChannelWrite)]
    );
}

#[test]
fn test_rerun_after_completion() {
    let script = vec![sample(0.0, 94.0), sample(1.0, 94.0)];
    let mut harness = Harness::new(script, quiet_config());
    let program = [Step::from_secs(94.0, 0)];

    assert_eq!(harness.run(&program), Ok(()));
    assert_eq!(harness.run(&program), Ok(()));
    assert_eq!(harness.written(), vec!["t94.0\n", "t94.0\n"]);
}
