//! The collector is the only thread that writes the image.

use tracing::debug;

use crate::channel::CollectorEnd;
use crate::grid::Image;
use crate::idle::Idle;

/// Drains every worker's output ring, round-robin, into the image.
///
/// Each ring is FIFO and owned by one worker, so the collector only
/// needs a read position per ring; the item itself says which cell it
/// belongs to.
pub struct Collector<'a> {
    ends: Vec<CollectorEnd<'a>>,
    image: Image,
    collected: usize,
    total: usize,
    per_worker: Vec<usize>,
}

impl<'a> Collector<'a> {
    /// A collector that fills `image` from the given channel ends.
    pub fn new(ends: Vec<CollectorEnd<'a>>, image: Image) -> Collector<'a> {
        let total = image.as_bytes().len();
        let per_worker = vec![0; ends.len()];
        Collector {
            ends,
            image,
            collected: 0,
            total,
            per_worker,
        }
    }

    /// Cells written so far.
    pub fn collected(&self) -> usize {
        self.collected
    }

    /// True once every cell has been written.
    pub fn is_done(&self) -> bool {
        self.collected == self.total
    }

    /// One pass over the workers, taking everything each currently has
    /// ready.  Returns how many results were written.
    pub fn step(&mut self) -> usize {
        let mut written = 0;
        for (slot, end) in self.ends.iter_mut().enumerate() {
            while let Some(result) = end.output.try_pop() {
                self.image.write(result);
                self.per_worker[slot] += 1;
                written += 1;
            }
        }
        self.collected += written;
        written
    }

    /// Collects until the image is complete, then hands it over along
    /// with how many cells came from each worker.
    pub fn run(mut self, idle: Idle) -> (Image, Vec<usize>) {
        debug!(cells = self.total, "collector started");
        while !self.is_done() {
            if self.step() > 0 {
                idle.reset();
            } else {
                idle.wait();
            }
        }
        debug!(per_worker = ?self.per_worker, "collector finished");
        (self.image, self.per_worker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{split_all, WorkerChannel};
    use crate::grid::{GridSpec, ResultItem};

    #[test]
    fn places_results_by_index_not_arrival() {
        let grid = GridSpec::new(2, 3, 10).unwrap();
        let mut channels = WorkerChannel::many(2);
        let (_, mut workers, ends) = split_all(&mut channels);
        let mut collector = Collector::new(ends, Image::blank(&grid));

        for &(w, index, value) in &[(1, 5, b'a'), (0, 0, b'b'), (1, 2, b'c')] {
            assert!(workers[w].output.try_push(ResultItem { index, value }));
        }
        assert_eq!(collector.step(), 3);
        assert!(!collector.is_done());
        for &(w, index, value) in &[(0, 4, b'd'), (0, 1, b'e'), (1, 3, b'f')] {
            assert!(workers[w].output.try_push(ResultItem { index, value }));
        }
        assert_eq!(collector.step(), 3);
        assert!(collector.is_done());
        assert_eq!(collector.step(), 0);

        let (image, per_worker) = collector.run(Idle::default());
        assert_eq!(image.as_bytes(), b"becfda");
        assert_eq!(per_worker, vec![3, 3]);
    }

    #[test]
    fn nothing_ready_means_no_progress() {
        let grid = GridSpec::new(2, 2, 10).unwrap();
        let mut channels = WorkerChannel::many(3);
        let (_, _, ends) = split_all(&mut channels);
        let mut collector = Collector::new(ends, Image::blank(&grid));
        assert_eq!(collector.step(), 0);
        assert_eq!(collector.collected(), 0);
    }
}
