//! Run configuration definitions

use core::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default reach tolerance (°C)
pub const DEFAULT_TOLERANCE_C: f32 = 1.5;

/// Banner lines the controller prints after the port opens
pub const DEFAULT_HANDSHAKE_LINES: u8 = 3;

/// Setpoint sent when a run is cancelled (°C)
///
/// Matches the controller's power-on target.
pub const DEFAULT_SAFE_TEMPERATURE_C: f32 = 25.0;

/// Default maximum silence on the telemetry link
pub const DEFAULT_TELEMETRY_TIMEOUT: Duration = Duration::from_secs(30);

/// Safety thresholds checked during a run
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SafetyLimits {
    /// Maximum time without any line from the controller (None = wait forever)
    pub telemetry_timeout: Option<Duration>,
    /// Measured temperature that aborts the run (None = no limit)
    pub max_temperature_c: Option<f32>,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            telemetry_timeout: Some(DEFAULT_TELEMETRY_TIMEOUT),
            max_temperature_c: None,
        }
    }
}

/// Parameters for one program execution
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunConfig {
    /// Reach tolerance (°C); a step is reached when |measured - target| < tolerance
    pub tolerance_c: f32,
    /// Lines drained before the first command
    pub handshake_lines: u8,
    /// Setpoint commanded when the run is cancelled or faults
    pub safe_temperature_c: f32,
    /// Safety thresholds
    pub limits: SafetyLimits,
    /// Index of the first step to execute (resume point)
    pub start_step: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tolerance_c: DEFAULT_TOLERANCE_C,
            handshake_lines: DEFAULT_HANDSHAKE_LINES,
            safe_temperature_c: DEFAULT_SAFE_TEMPERATURE_C,
            limits: SafetyLimits::default(),
            start_step: 0,
        }
    }
}

impl RunConfig {
    /// Create a configuration with the given tolerance and defaults otherwise
    pub fn with_tolerance(tolerance_c: f32) -> Self {
        Self {
            tolerance_c,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.tolerance_c, 1.5);
        assert_eq!(config.handshake_lines, 3);
        assert_eq!(config.start_step, 0);
        assert_eq!(config.limits.telemetry_timeout, Some(Duration::from_secs(30)));
        assert!(config.limits.max_temperature_c.is_none());
    }

    #[test]
    fn test_with_tolerance() {
        let config = RunConfig::with_tolerance(0.5);
        assert_eq!(config.tolerance_c, 0.5);
        assert_eq!(config.safe_temperature_c, DEFAULT_SAFE_TEMPERATURE_C);
    }
}
