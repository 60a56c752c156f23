//! Worker threads and the flag that releases them.

use crossbeam::utils::CachePadded;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::channel::WorkerEnd;
use crate::grid::{GridSpec, ResultItem};
use crate::idle::Idle;

/// Tells idle workers the run is over.
///
/// Written once, by the coordinator, after both the feeder and the
/// collector have finished; read by every worker whenever its input
/// ring turns up empty.  The store is `Release` and the loads are
/// `Acquire`, so a worker that sees the flag also sees everything the
/// coordinator did before raising it.
pub struct ShutdownFlag(CachePadded<AtomicBool>);

impl ShutdownFlag {
    /// A lowered flag.
    pub fn new() -> ShutdownFlag {
        ShutdownFlag(CachePadded::new(AtomicBool::new(false)))
    }

    /// Raises the flag.  Only the coordinator calls this.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether the flag has been raised.
    #[inline]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for ShutdownFlag {
    fn default() -> ShutdownFlag {
        ShutdownFlag::new()
    }
}

/// Outcome of one [`Worker::poll`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Poll {
    /// One cell was computed and handed to the collector.
    Computed,
    /// Nothing was waiting; keep polling.
    Idle,
    /// Nothing was waiting and the run is over.
    Shutdown,
}

/// Computes cells popped from one input ring and pushes the tagged
/// results to the matching output ring.  A worker touches nothing but
/// its own two rings.
pub struct Worker<'a> {
    end: WorkerEnd<'a>,
    grid: GridSpec,
    computed: usize,
}

impl<'a> Worker<'a> {
    /// A worker over one channel end.
    pub fn new(end: WorkerEnd<'a>, grid: GridSpec) -> Worker<'a> {
        Worker {
            end,
            grid,
            computed: 0,
        }
    }

    /// Index of this worker.
    pub fn id(&self) -> usize {
        self.end.id
    }

    /// How many cells this worker has computed.
    pub fn computed(&self) -> usize {
        self.computed
    }

    /// Tries to take one cell.  The shutdown flag is only consulted when
    /// the input ring is empty, so a worker always finishes the work it
    /// has been given.
    pub fn poll(&mut self, shutdown: &ShutdownFlag, idle: &Idle) -> Poll {
        match self.end.input.try_pop() {
            Some(index) => {
                let result = self.grid.evaluate(index);
                if self.deliver(result, shutdown, idle) {
                    self.computed += 1;
                    Poll::Computed
                } else {
                    Poll::Shutdown
                }
            }
            None if shutdown.is_raised() => Poll::Shutdown,
            None => Poll::Idle,
        }
    }

    // Waits for room in the output ring.  Under the normal protocol the
    // flag cannot rise while a result is pending; it is checked anyway
    // so a dead collector cannot pin the worker here.
    fn deliver(&mut self, result: ResultItem, shutdown: &ShutdownFlag, idle: &Idle) -> bool {
        while !self.end.output.try_push(result) {
            if shutdown.is_raised() {
                return false;
            }
            idle.wait();
        }
        idle.reset();
        true
    }

    /// Polls until shut down.  Returns the number of cells computed.
    pub fn run(mut self, shutdown: &ShutdownFlag, idle: Idle) -> usize {
        debug!(worker = self.id(), "worker started");
        loop {
            match self.poll(shutdown, &idle) {
                Poll::Computed => idle.reset(),
                Poll::Idle => idle.wait(),
                Poll::Shutdown => break,
            }
        }
        debug!(worker = self.id(), computed = self.computed, "worker exiting");
        self.computed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::WorkerChannel;
    use crate::kernel;

    #[test]
    fn computes_what_it_is_fed() {
        let grid = GridSpec::new(4, 4, 20).unwrap();
        let mut channel = WorkerChannel::new(0);
        let (mut feeder, end, mut collector) = channel.split();
        let mut worker = Worker::new(end, grid);
        let shutdown = ShutdownFlag::new();
        let idle = Idle::default();

        assert!(feeder.input.try_push(10));
        assert_eq!(worker.poll(&shutdown, &idle), Poll::Computed);
        let expected = kernel::evaluate(2, 2, 4, 4, 20).as_byte();
        assert_eq!(
            collector.output.try_pop(),
            Some(ResultItem {
                index: 10,
                value: expected
            })
        );
        assert_eq!(worker.poll(&shutdown, &idle), Poll::Idle);
        assert_eq!(worker.computed(), 1);
    }

    #[test]
    fn drains_input_before_honouring_shutdown() {
        let grid = GridSpec::new(4, 4, 20).unwrap();
        let mut channel = WorkerChannel::new(0);
        let (mut feeder, end, mut collector) = channel.split();
        let mut worker = Worker::new(end, grid);
        let shutdown = ShutdownFlag::new();
        let idle = Idle::default();

        assert!(feeder.input.try_push(1));
        assert!(feeder.input.try_push(2));
        shutdown.raise();
        assert_eq!(worker.poll(&shutdown, &idle), Poll::Computed);
        assert_eq!(worker.poll(&shutdown, &idle), Poll::Computed);
        assert_eq!(worker.poll(&shutdown, &idle), Poll::Shutdown);
        assert_eq!(collector.output.try_pop().map(|r| r.index), Some(1));
        assert_eq!(collector.output.try_pop().map(|r| r.index), Some(2));
    }

    #[test]
    fn run_exits_once_flag_is_raised() {
        let grid = GridSpec::new(8, 8, 20).unwrap();
        let mut channel = WorkerChannel::new(3);
        let (mut feeder, end, mut collector) = channel.split();
        let shutdown = ShutdownFlag::new();

        let computed = crossbeam::scope(|s| {
            let handle = s.spawn(|_| Worker::new(end, grid).run(&shutdown, Idle::default()));
            let mut collected = 0;
            let mut next = 0;
            while collected < 64 {
                if next < 64 && feeder.input.try_push(next) {
                    next += 1;
                }
                if collector.output.try_pop().is_some() {
                    collected += 1;
                }
            }
            shutdown.raise();
            handle.join().unwrap()
        })
        .unwrap();
        assert_eq!(computed, 64);
    }

    #[test]
    fn full_output_with_raised_flag_gives_up() {
        let grid = GridSpec::new(8, 8, 20).unwrap();
        let mut channel = WorkerChannel::new(0);
        let (mut feeder, end, _collector) = channel.split();
        let mut worker = Worker::new(end, grid);
        let shutdown = ShutdownFlag::new();
        let idle = Idle::default();

        let capacity = crate::channel::OUTPUT_CAPACITY as u32;
        for i in 0..capacity {
            assert!(feeder.input.try_push(i));
            assert_eq!(worker.poll(&shutdown, &idle), Poll::Computed);
        }
        assert!(feeder.input.try_push(capacity));
        shutdown.raise();
        assert_eq!(worker.poll(&shutdown, &idle), Poll::Shutdown);
        assert_eq!(worker.computed(), capacity as usize);
    }
}
