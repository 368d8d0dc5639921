//! Time budgets for cooperative work slices.
//!
//! The host decides when the engine may run (typically when it is otherwise
//! idle) and hands [`Engine::work_loop`](crate::Engine::work_loop) a
//! [`Deadline`] describing how long that slice may last. The engine checks it
//! after every unit of work and yields once it runs low.

use core::time::Duration;
use std::time::Instant;

/// Yield once less than this much time is left in a slice.
pub const DEFAULT_YIELD_THRESHOLD: Duration = Duration::from_millis(1);

/// Remaining-time signal for the current work slice.
pub trait Deadline {
    /// Time left before the engine must hand control back.
    fn time_remaining(&self) -> Duration;

    /// Whether the engine should yield now.
    fn should_yield(&self) -> bool {
        self.time_remaining() < DEFAULT_YIELD_THRESHOLD
    }
}

/// A wall-clock slice starting when it is created.
#[derive(Debug, Clone, Copy)]
pub struct TimeSlice {
    started: Instant,
    budget: Duration,
    threshold: Duration,
}

impl TimeSlice {
    /// Starts a slice lasting `budget`.
    #[must_use]
    pub fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
            threshold: DEFAULT_YIELD_THRESHOLD,
        }
    }

    /// Overrides the remaining time below which the slice asks to yield.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    /// The configured budget.
    #[must_use]
    pub const fn budget(&self) -> Duration {
        self.budget
    }
}

impl Deadline for TimeSlice {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.started.elapsed())
    }

    fn should_yield(&self) -> bool {
        self.time_remaining() < self.threshold
    }
}

/// A slice that never runs out. Used to flush all pending work at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }

    fn should_yield(&self) -> bool {
        false
    }
}

impl<D: Deadline + ?Sized> Deadline for &D {
    fn time_remaining(&self) -> Duration {
        (**self).time_remaining()
    }

    fn should_yield(&self) -> bool {
        (**self).should_yield()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_slice_yields() {
        let slice = TimeSlice::new(Duration::ZERO);
        assert_eq!(slice.time_remaining(), Duration::ZERO);
        assert!(slice.should_yield());
    }

    #[test]
    fn generous_slice_keeps_running() {
        let slice = TimeSlice::new(Duration::from_secs(60)).with_threshold(Duration::ZERO);
        assert!(!slice.should_yield());
        assert!(!Unbounded.should_yield());
    }
}
