//! The coordinator: builds the channels, runs feeder, workers and
//! collector on their own threads, and shuts them down in the one order
//! that cannot strand work.

use std::time::Duration;
use tracing::{info, warn};

use crate::affinity;
use crate::channel::{split_all, WorkerChannel};
use crate::collector::Collector;
use crate::error::{RenderError, Result};
use crate::feeder::Feeder;
use crate::grid::{GridSpec, Image};
use crate::idle::{Idle, DEFAULT_IDLE_SLEEP};
use crate::worker::{ShutdownFlag, Worker};

/// Hard ceiling on the worker pool, whatever the machine claims.
pub const MAX_WORKERS: usize = 256;

/// How a render is run.  None of it affects the image, only how fast
/// it appears.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    workers: usize,
    pin_threads: bool,
    idle_sleep: Duration,
}

impl PipelineConfig {
    /// One worker per hardware thread, no pinning.
    pub fn new() -> PipelineConfig {
        PipelineConfig {
            workers: num_cpus::get().max(1).min(MAX_WORKERS),
            pin_threads: false,
            idle_sleep: DEFAULT_IDLE_SLEEP,
        }
    }

    /// Requests a worker count.  Checked by [`PipelineConfig::validate`].
    pub fn workers(mut self, workers: usize) -> PipelineConfig {
        self.workers = workers;
        self
    }

    /// Enables or disables pinning threads to cores.
    pub fn pin_threads(mut self, pin: bool) -> PipelineConfig {
        self.pin_threads = pin;
        self
    }

    /// Sets the sleep used once a waiting thread has stopped spinning.
    pub fn idle_sleep(mut self, sleep: Duration) -> PipelineConfig {
        self.idle_sleep = sleep;
        self
    }

    /// Rejects worker counts no run could use, and clamps the rest to
    /// the hardware.  Returns the count the pipeline will run with.
    pub fn validate(&self) -> Result<usize> {
        if self.workers == 0 {
            return Err(RenderError::NoWorkers);
        }
        if self.workers > MAX_WORKERS {
            return Err(RenderError::TooManyWorkers {
                requested: self.workers,
                max: MAX_WORKERS,
            });
        }
        let hardware = num_cpus::get().max(1);
        if self.workers > hardware {
            warn!(
                requested = self.workers,
                hardware, "clamping worker count to hardware concurrency"
            );
            return Ok(hardware);
        }
        Ok(self.workers)
    }
}

impl Default for PipelineConfig {
    fn default() -> PipelineConfig {
        PipelineConfig::new()
    }
}

/// A finished render.
#[derive(Clone, Debug)]
pub struct Rendered {
    /// The fully populated image.
    pub image: Image,
    /// Cells collected from each worker; sums to the cell count.
    pub per_worker: Vec<usize>,
}

fn panicked(role: String) -> RenderError {
    RenderError::ThreadPanicked { role }
}

/// Renders `grid` on a feeder thread, a pool of workers and a collector
/// thread.
///
/// The coordinator waits for the feeder, then the collector, and only
/// then raises the shutdown flag and joins the workers.  Once the
/// collector has every cell, every index the feeder handed out has been
/// computed and drained, so no worker can be holding work when it is
/// told to stop.
pub fn render(grid: &GridSpec, config: &PipelineConfig) -> Result<Rendered> {
    let workers = config.validate()?;
    render_with_workers(grid, workers, config)
}

// Runs exactly `workers` workers; the hardware clamp is `render`'s job.
pub(crate) fn render_with_workers(
    grid: &GridSpec,
    workers: usize,
    config: &PipelineConfig,
) -> Result<Rendered> {
    info!(
        workers,
        rows = grid.rows(),
        cols = grid.cols(),
        iterations = grid.iteration_limit(),
        "working with {} thread(s)",
        workers
    );

    let mut channels = WorkerChannel::many(workers);
    let image = Image::blank(grid);
    let shutdown = ShutdownFlag::new();
    let (feeder_ends, worker_ends, collector_ends) = split_all(&mut channels);

    let pin = config.pin_threads;
    let sleep = config.idle_sleep;
    let feeder = Feeder::new(feeder_ends, grid.len());
    let collector = Collector::new(collector_ends, image);
    let shutdown = &shutdown;

    let outcome = crossbeam::scope(|s| -> Result<Rendered> {
        let feeder = s.spawn(move |_| {
            affinity::apply(pin, "feeder", 0);
            feeder.run(Idle::new(sleep))
        });

        let pool: Vec<_> = worker_ends
            .into_iter()
            .map(|end| {
                let grid = *grid;
                s.spawn(move |_| {
                    affinity::apply(pin, "worker", end.id + 1);
                    Worker::new(end, grid).run(shutdown, Idle::new(sleep))
                })
            })
            .collect();

        let collector = s.spawn(move |_| {
            affinity::apply(pin, "collector", workers + 1);
            collector.run(Idle::new(sleep))
        });

        let fed = feeder.join();
        if fed.is_ok() {
            info!("finished providing the input, waiting for the collector");
        }
        let collected = collector.join();
        if collected.is_ok() {
            info!("finished collecting the output, waiting for the workers");
        }

        // Raised whatever the joins returned; a worker only leaves its
        // loop once it sees the flag, and the scope joins them all.
        shutdown.raise();
        let mut computed = Vec::with_capacity(pool.len());
        let mut failed = None;
        for (id, handle) in pool.into_iter().enumerate() {
            match handle.join() {
                Ok(count) => computed.push(count),
                Err(_) => {
                    failed.get_or_insert(id);
                }
            }
        }

        fed.map_err(|_| panicked("feeder".to_string()))?;
        let (image, per_worker) = collected.map_err(|_| panicked("collector".to_string()))?;
        if let Some(id) = failed {
            return Err(panicked(format!("worker {}", id)));
        }
        debug_assert_eq!(computed, per_worker);
        Ok(Rendered { image, per_worker })
    })
    .map_err(|_| panicked("pipeline".to_string()))?;

    let rendered = outcome?;
    info!("all {} worker(s) joined, done", workers);
    Ok(rendered)
}
