//! One worker's pair of rings.
//!
//! Work flows feeder → `input` → worker → `output` → collector.  A
//! [`WorkerChannel`] is split once per run into three ends, one for each
//! of those threads, and only the thread holding an end can touch the
//! corresponding half of a ring.

use crossbeam::utils::CachePadded;

use crate::grid::{ResultItem, WorkItem};
use crate::ring::{Consumer, Producer, RingSlot};

/// Slots in each feeder → worker ring.
pub const INPUT_CAPACITY: usize = 16;

/// Slots in each worker → collector ring.
pub const OUTPUT_CAPACITY: usize = 8;

/// Stride of a [`WorkerChannel`].  Two lines, so the adjacent-line
/// prefetcher cannot pull a neighbour's channel in either.
pub const CHANNEL_ALIGN: usize = 128;

/// The rings owned by one worker.  Aligned and padded to
/// [`CHANNEL_ALIGN`] so no two channels, and no channel and anything
/// else, share a cache line; the two rings are padded apart as well
/// since the feeder polls one and the collector the other.
#[repr(C, align(128))]
pub struct WorkerChannel {
    id: usize,
    input: CachePadded<RingSlot<WorkItem, INPUT_CAPACITY>>,
    output: CachePadded<RingSlot<ResultItem, OUTPUT_CAPACITY>>,
}

/// Feeder side of a channel.
pub struct FeederEnd<'a> {
    /// Worker this end feeds.
    pub id: usize,
    /// Pushes work to the worker.
    pub input: Producer<'a, WorkItem, INPUT_CAPACITY>,
}

/// Worker side of a channel.
pub struct WorkerEnd<'a> {
    /// Index of the worker holding this end.
    pub id: usize,
    /// Pops work pushed by the feeder.
    pub input: Consumer<'a, WorkItem, INPUT_CAPACITY>,
    /// Pushes results to the collector.
    pub output: Producer<'a, ResultItem, OUTPUT_CAPACITY>,
}

/// Collector side of a channel.
pub struct CollectorEnd<'a> {
    /// Worker whose results this end drains.
    pub id: usize,
    /// Pops results pushed by the worker.
    pub output: Consumer<'a, ResultItem, OUTPUT_CAPACITY>,
}

impl WorkerChannel {
    /// A channel with both rings empty.
    pub fn new(id: usize) -> WorkerChannel {
        WorkerChannel {
            id,
            input: CachePadded::new(RingSlot::new()),
            output: CachePadded::new(RingSlot::new()),
        }
    }

    /// `count` channels numbered from zero.
    pub fn many(count: usize) -> Vec<WorkerChannel> {
        (0..count).map(WorkerChannel::new).collect()
    }

    /// Splits the channel between the feeder, its worker and the
    /// collector.
    pub fn split(&mut self) -> (FeederEnd<'_>, WorkerEnd<'_>, CollectorEnd<'_>) {
        let id = self.id;
        let (work_tx, work_rx) = self.input.split();
        let (result_tx, result_rx) = self.output.split();
        (
            FeederEnd { id, input: work_tx },
            WorkerEnd {
                id,
                input: work_rx,
                output: result_tx,
            },
            CollectorEnd {
                id,
                output: result_rx,
            },
        )
    }
}

/// Splits every channel and regroups the ends by the thread that will
/// own them.
pub fn split_all(
    channels: &mut [WorkerChannel],
) -> (Vec<FeederEnd<'_>>, Vec<WorkerEnd<'_>>, Vec<CollectorEnd<'_>>) {
    let mut feeder = Vec::with_capacity(channels.len());
    let mut workers = Vec::with_capacity(channels.len());
    let mut collector = Vec::with_capacity(channels.len());
    for channel in channels.iter_mut() {
        let (f, w, c) = channel.split();
        feeder.push(f);
        workers.push(w);
        collector.push(c);
    }
    (feeder, workers, collector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    #[test]
    fn channels_never_share_a_line() {
        assert_eq!(align_of::<WorkerChannel>(), CHANNEL_ALIGN);
        assert_eq!(size_of::<WorkerChannel>() % CHANNEL_ALIGN, 0);

        let channels = WorkerChannel::many(4);
        for pair in channels.windows(2) {
            let a = &pair[0] as *const WorkerChannel as usize;
            let b = &pair[1] as *const WorkerChannel as usize;
            assert_eq!(a % CHANNEL_ALIGN, 0);
            assert!(b - a >= size_of::<WorkerChannel>());
        }
    }

    #[test]
    fn rings_sit_on_separate_lines() {
        let channel = WorkerChannel::new(0);
        let input = &*channel.input as *const _ as usize;
        let output = &*channel.output as *const _ as usize;
        assert!(output >= input + size_of::<RingSlot<WorkItem, INPUT_CAPACITY>>());
        assert_eq!(output % 64, 0);
    }

    #[test]
    fn ends_share_the_channel_id() {
        let mut channels = WorkerChannel::many(3);
        let (feeder, workers, collector) = split_all(&mut channels);
        for i in 0..3 {
            assert_eq!(feeder[i].id, i);
            assert_eq!(workers[i].id, i);
            assert_eq!(collector[i].id, i);
        }
    }

    #[test]
    fn work_and_results_flow_through_one_channel() {
        let mut channel = WorkerChannel::new(5);
        let (mut feeder, mut worker, mut collector) = channel.split();
        assert!(feeder.input.try_push(42));
        let index = worker.input.try_pop().unwrap();
        assert!(worker.output.try_push(ResultItem { index, value: b'#' }));
        assert_eq!(
            collector.output.try_pop(),
            Some(ResultItem {
                index: 42,
                value: b'#'
            })
        );
        assert_eq!(feeder.input.capacity(), INPUT_CAPACITY);
        assert_eq!(collector.output.capacity(), OUTPUT_CAPACITY);
    }
}
