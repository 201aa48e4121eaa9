//! Host configuration
//!
//! Run parameters and the PCR program are read from a TOML file with
//! `[serial]`, `[run]` and `[program]` sections. Every section and key is
//! optional; missing values fall back to the classic three-temperature
//! protocol on a 115200 baud link.

pub mod toml;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thermocycler_core::config::{
    DEFAULT_HANDSHAKE_LINES, DEFAULT_SAFE_TEMPERATURE_C, DEFAULT_TELEMETRY_TIMEOUT,
    DEFAULT_TOLERANCE_C,
};
use thermocycler_core::{Program, ProgramError, RunConfig, SafetyLimits, Step};
use thermocycler_hal::UartConfig;

pub use self::toml::parse_config;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] ::toml::de::Error),

    #[error("[program] {block}: {temperatures} temperatures but {holds} hold times")]
    BlockLengthMismatch {
        block: &'static str,
        temperatures: usize,
        holds: usize,
    },

    #[error("[program] {block}: temperature {value} is not a finite number")]
    InvalidTemperature { block: &'static str, value: f32 },

    #[error("[program] {0} block needs at least one step")]
    EmptyBlock(&'static str),

    #[error("[program] cannot be built: {0:?}")]
    Program(ProgramError),

    #[error("[run] tolerance must be a positive number, got {0}")]
    InvalidTolerance(f32),

    #[error("[run] {key} must be a finite number, got {value}")]
    InvalidLimit { key: &'static str, value: f32 },

    #[error("[serial] baudrate must be non-zero")]
    InvalidBaudrate,
}

/// Complete host configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub serial: SerialSection,
    pub run: RunSection,
    pub program: ProgramSection,
}

/// `[serial]` section
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialSection {
    /// Port name, e.g. `/dev/ttyACM0` or `COM5`
    pub port: Option<String>,
    pub baudrate: u32,
    /// Maximum time a single read blocks
    pub poll_interval_ms: u64,
}

impl Default for SerialSection {
    fn default() -> Self {
        Self {
            port: None,
            baudrate: UartConfig::default().baudrate,
            poll_interval_ms: 200,
        }
    }
}

impl SerialSection {
    /// Link settings for the port
    pub fn uart(&self) -> UartConfig {
        UartConfig {
            baudrate: self.baudrate,
            ..UartConfig::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// `[run]` section
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    /// Reach tolerance (°C)
    pub tolerance: f32,
    /// Banner lines drained before the first command
    pub handshake_lines: u8,
    /// Setpoint commanded on abort (°C)
    pub safe_temperature: f32,
    /// Maximum telemetry silence in seconds; 0 waits forever
    pub telemetry_timeout_s: u64,
    /// Measured temperature that aborts the run (°C)
    pub max_temperature: Option<f32>,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE_C,
            handshake_lines: DEFAULT_HANDSHAKE_LINES,
            safe_temperature: DEFAULT_SAFE_TEMPERATURE_C,
            telemetry_timeout_s: DEFAULT_TELEMETRY_TIMEOUT.as_secs(),
            max_temperature: None,
        }
    }
}

/// `[program]` section
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgramSection {
    /// Number of cycle block repetitions
    pub cycles: u16,
    pub start: BlockSection,
    pub cycle: BlockSection,
    pub end: BlockSection,
}

impl Default for ProgramSection {
    /// Initial denaturation, 30 cycles of melt/anneal/extend, final
    /// extension and cold storage
    fn default() -> Self {
        Self {
            cycles: 30,
            start: BlockSection::new(&[94.0], &[3 * 60]),
            cycle: BlockSection::new(&[94.0, 48.0, 68.0], &[30, 30, 45]),
            end: BlockSection::new(&[68.0, 10.0], &[5 * 60, 5 * 60 * 60]),
        }
    }
}

/// One block of steps as parallel lists
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockSection {
    /// Target temperatures (°C)
    pub temperatures: Vec<f32>,
    /// Hold durations (s)
    pub hold_s: Vec<u64>,
}

impl BlockSection {
    pub fn new(temperatures: &[f32], hold_s: &[u64]) -> Self {
        Self {
            temperatures: temperatures.to_vec(),
            hold_s: hold_s.to_vec(),
        }
    }

    fn steps(&self, block: &'static str) -> Result<Vec<Step>, ConfigError> {
        if self.temperatures.len() != self.hold_s.len() {
            return Err(ConfigError::BlockLengthMismatch {
                block,
                temperatures: self.temperatures.len(),
                holds: self.hold_s.len(),
            });
        }

        self.temperatures
            .iter()
            .zip(&self.hold_s)
            .map(|(&temperature, &hold_s)| {
                if temperature.is_finite() {
                    Ok(Step::from_secs(temperature, hold_s))
                } else {
                    Err(ConfigError::InvalidTemperature {
                        block,
                        value: temperature,
                    })
                }
            })
            .collect()
    }
}

impl HostConfig {
    /// Check everything that does not depend on the port being present
    pub fn validate(&self) -> Result<(), ConfigError> {
        let run = &self.run;
        if !(run.tolerance.is_finite() && run.tolerance > 0.0) {
            return Err(ConfigError::InvalidTolerance(run.tolerance));
        }
        if !run.safe_temperature.is_finite() {
            return Err(ConfigError::InvalidLimit {
                key: "safe_temperature",
                value: run.safe_temperature,
            });
        }
        if let Some(max) = run.max_temperature.filter(|max| !max.is_finite()) {
            return Err(ConfigError::InvalidLimit {
                key: "max_temperature",
                value: max,
            });
        }
        if self.serial.baudrate == 0 {
            return Err(ConfigError::InvalidBaudrate);
        }

        self.program().map(|_| ())
    }

    /// Build the program from its three blocks
    pub fn program(&self) -> Result<Program, ConfigError> {
        let section = &self.program;
        let start = section.start.steps("start")?;
        let cycle = section.cycle.steps("cycle")?;
        let end = section.end.steps("end")?;

        Program::build(&start, &cycle, section.cycles, &end).map_err(|err| match err {
            ProgramError::EmptyStart => ConfigError::EmptyBlock("start"),
            ProgramError::EmptyEnd => ConfigError::EmptyBlock("end"),
            other => ConfigError::Program(other),
        })
    }

    /// Sequencer parameters
    pub fn run_config(&self) -> RunConfig {
        let telemetry_timeout = match self.run.telemetry_timeout_s {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        RunConfig {
            tolerance_c: self.run.tolerance,
            handshake_lines: self.run.handshake_lines,
            safe_temperature_c: self.run.safe_temperature,
            limits: SafetyLimits {
                telemetry_timeout,
                max_temperature_c: self.run.max_temperature,
            },
            start_step: 0,
        }
    }
}

/// Read and validate a configuration file
pub fn load(path: &Path) -> Result<HostConfig, ConfigError> {
    let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&input)
}
