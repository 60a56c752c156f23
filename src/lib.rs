#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer
//!
//! Every cell of the image is independent: map it onto the complex
//! plane, iterate `z = z² + c` from zero, and mark it interior if the
//! orbit is still inside the radius-2 disc when the iteration budget
//! runs out.  The arithmetic is the easy part.  What this crate is about
//! is moving a few million of those cells through a pool of threads
//! without a single lock.
//!
//! A render runs `N + 2` threads.  A feeder deals cell indices
//! round-robin into one small ring per worker; each worker pops from its
//! own ring, evaluates the cell, and pushes the tagged result into a
//! second ring of its own; a collector drains those rings round-robin
//! into the image.  Every ring has exactly one producer and one
//! consumer, which the types enforce, and every ring lives in its own
//! cache-aligned [`WorkerChannel`](channel::WorkerChannel).  All waiting
//! is polling with backoff.  When the feeder is out of work and the
//! collector has every cell, the coordinator raises a flag and the
//! workers wind down.
//!
//! ```no_run
//! use mandelbrot::{render, GridSpec, PipelineConfig};
//!
//! let grid = GridSpec::new(100, 100, 50).unwrap();
//! let rendered = render(&grid, &PipelineConfig::new().workers(4)).unwrap();
//! print!("{}", mandelbrot::output::to_ascii(&rendered.image));
//! ```

pub mod affinity;
pub mod channel;
pub mod collector;
pub mod error;
pub mod feeder;
pub mod grid;
pub mod idle;
pub mod kernel;
pub mod output;
pub mod pipeline;
pub mod ring;
pub mod worker;

pub use error::{RenderError, Result};
pub use grid::{render_serial, GridSpec, Image, ResultItem, WorkItem};
pub use kernel::{evaluate, Cell};
pub use pipeline::{render, PipelineConfig, Rendered};
