use std::cell::Cell;
use std::rc::Rc;

/// Monotonic time source in seconds.
///
/// Elapsed-time bookkeeping only ever reads a clock; what advances it (a frame callback, a
/// timer, or an explicit export loop) is up to the host.
pub trait Clock {
    /// Current time in seconds.
    fn now(&self) -> f64;
}

/// Explicitly advanced clock, shareable between the controller and an audio graph.
///
/// Clones observe the same time. Intended for single-threaded batch export and tests.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    /// A clock starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock starting at `secs`.
    pub fn starting_at(secs: f64) -> Self {
        let clock = Self::new();
        clock.set(secs);
        clock
    }

    /// Move the clock forward by `secs` (negative or non-finite steps are ignored).
    pub fn advance(&self, secs: f64) {
        if secs.is_finite() && secs > 0.0 {
            self.now.set(self.now.get() + secs);
        }
    }

    /// Jump to `secs`, never moving backwards.
    pub fn set(&self, secs: f64) {
        if secs.is_finite() && secs > self.now.get() {
            self.now.set(secs);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}
