//! The feeder hands out every cell index exactly once.

use tracing::debug;

use crate::channel::FeederEnd;
use crate::grid::WorkItem;
use crate::idle::Idle;

/// Streams `0..total` round-robin into the workers' input rings.
///
/// A full ring is skipped, not waited on, so a slow worker only slows
/// down its own share; when every ring is full the feeder idles, which
/// is the pipeline's backpressure.
pub struct Feeder<'a> {
    ends: Vec<FeederEnd<'a>>,
    next: WorkItem,
    total: WorkItem,
}

impl<'a> Feeder<'a> {
    /// A feeder for `total` cells over the given channel ends.
    pub fn new(ends: Vec<FeederEnd<'a>>, total: WorkItem) -> Feeder<'a> {
        assert!(!ends.is_empty(), "feeder needs at least one channel");
        Feeder {
            ends,
            next: 0,
            total,
        }
    }

    /// The next index to hand out.
    pub fn cursor(&self) -> WorkItem {
        self.next
    }

    /// True once every index has been pushed.
    pub fn is_done(&self) -> bool {
        self.next == self.total
    }

    /// One pass over the workers, offering each its next index.
    /// Returns how many indices were pushed; zero means every ring was
    /// full (or there is nothing left).
    pub fn step(&mut self) -> usize {
        let mut pushed = 0;
        for end in self.ends.iter_mut() {
            if self.next == self.total {
                break;
            }
            if end.input.try_push(self.next) {
                self.next += 1;
                pushed += 1;
            }
        }
        pushed
    }

    /// Feeds until every index is out.
    pub fn run(mut self, idle: Idle) {
        debug!(cells = self.total, workers = self.ends.len(), "feeder started");
        while !self.is_done() {
            if self.step() > 0 {
                idle.reset();
            } else {
                idle.wait();
            }
        }
        debug!("feeder finished");
    }
}
