//! Monotonic time source

use core::time::Duration;

/// Monotonic clock
///
/// Returns time elapsed since an arbitrary, fixed epoch. Only differences
/// between two readings are meaningful.
pub trait Monotonic {
    /// Current time since the clock's epoch
    fn now(&self) -> Duration;

    /// Time elapsed since an earlier reading
    ///
    /// Saturates at zero if `since` lies in the future.
    fn elapsed_since(&self, since: Duration) -> Duration {
        self.now().saturating_sub(since)
    }
}
