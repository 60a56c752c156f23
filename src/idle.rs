//! Waiting without locks.
//!
//! Every pipeline thread waits by polling.  Polling starts with a short
//! exponential spin, escalates to yielding, and once the backoff is
//! exhausted settles into microsecond sleeps.  This trades a little
//! latency at the tail of a wait for not burning a core while a slow
//! neighbour catches up.

use crossbeam::utils::Backoff;
use std::thread;
use std::time::Duration;

/// Default sleep once spinning and yielding have not paid off.
pub const DEFAULT_IDLE_SLEEP: Duration = Duration::from_micros(1);

/// Per-thread wait state.  Call [`Idle::wait`] after every fruitless
/// poll and [`Idle::reset`] after every productive one.
pub struct Idle {
    backoff: Backoff,
    sleep: Duration,
}

impl Idle {
    /// A fresh wait state that sleeps for `sleep` once saturated.
    pub fn new(sleep: Duration) -> Idle {
        Idle {
            backoff: Backoff::new(),
            sleep,
        }
    }

    /// Waits a little longer than last time.
    #[inline]
    pub fn wait(&self) {
        if self.backoff.is_completed() {
            thread::sleep(self.sleep);
        } else {
            self.backoff.snooze();
        }
    }

    /// Progress was made; go back to spinning briefly.
    #[inline]
    pub fn reset(&self) {
        self.backoff.reset();
    }
}

impl Default for Idle {
    fn default() -> Idle {
        Idle::new(DEFAULT_IDLE_SLEEP)
    }
}
