//! Wall-clock time source

use std::time::{Duration, Instant};

use thermocycler_hal::Monotonic;

/// Monotonic clock backed by [`Instant`], with its epoch at creation
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Monotonic for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}
