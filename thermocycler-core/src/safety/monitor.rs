//! Safety monitor implementation
//!
//! Monitors telemetry link health and measured temperature.

use core::time::Duration;

use crate::config::SafetyLimits;
use crate::state::AbortReason;

/// Safety condition status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStatus {
    /// All conditions normal
    Ok,
    /// Safety condition violated
    Fault(AbortReason),
}

/// Safety monitor for fault detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyMonitor {
    /// Configured thresholds
    limits: SafetyLimits,
    /// Time the last line arrived (or monitoring started)
    last_line_at: Duration,
}

impl SafetyMonitor {
    /// Create a new safety monitor, starting the silence timer at `now`
    pub fn new(limits: SafetyLimits, now: Duration) -> Self {
        Self {
            limits,
            last_line_at: now,
        }
    }

    /// Record a line received from the controller
    pub fn line_received(&mut self, now: Duration) {
        self.last_line_at = now;
    }

    /// Time since the last line
    pub fn silence(&self, now: Duration) -> Duration {
        now.saturating_sub(self.last_line_at)
    }

    /// Check telemetry link health
    pub fn check_link(&self, now: Duration) -> SafetyStatus {
        match self.limits.telemetry_timeout {
            Some(timeout) if self.silence(now) >= timeout => {
                SafetyStatus::Fault(AbortReason::ChannelTimeout)
            }
            _ => SafetyStatus::Ok,
        }
    }

    /// Check a measured temperature against the configured limit
    pub fn check_temperature(&self, measured_c: f32) -> SafetyStatus {
        match self.limits.max_temperature_c {
            Some(max) if measured_c > max => SafetyStatus::Fault(AbortReason::OverTemperature),
            _ => SafetyStatus::Ok,
        }
    }
}
