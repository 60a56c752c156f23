// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors raised while configuring or running a render.

use failure::Fail;
use std::io;

/// Everything that can stop a render.  Configuration problems are all
/// detected before a single thread is spawned; the pipeline itself only
/// fails if one of its threads panics.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The grid has no cells.
    #[fail(display = "grid must have at least one row and one column (got {}x{})", rows, cols)]
    EmptyGrid {
        /// Requested rows.
        rows: u32,
        /// Requested columns.
        cols: u32,
    },

    /// An iteration limit of zero leaves nothing to compute.
    #[fail(display = "iteration limit must be at least 1")]
    ZeroIterations,

    /// Cell indices must stay strictly below the empty-slot sentinel.
    #[fail(display = "grid {}x{} has too many cells to index", rows, cols)]
    GridTooLarge {
        /// Requested rows.
        rows: u32,
        /// Requested columns.
        cols: u32,
    },

    /// The pool needs at least one worker.
    #[fail(display = "worker count must be at least 1")]
    NoWorkers,

    /// More workers than any sane machine would offer.
    #[fail(display = "worker count {} exceeds the maximum of {}", requested, max)]
    TooManyWorkers {
        /// Requested workers.
        requested: usize,
        /// Hard ceiling.
        max: usize,
    },

    /// A pipeline thread panicked.
    #[fail(display = "{} thread panicked", role)]
    ThreadPanicked {
        /// Which thread: "feeder", "collector" or "worker N".
        role: String,
    },

    /// The grid description could not be parsed.
    #[fail(display = "malformed input: {}", _0)]
    Input(String),

    /// Writing the rendered image failed.
    #[fail(display = "could not write image: {}", _0)]
    Io(#[cause] io::Error),
}

impl From<io::Error> for RenderError {
    fn from(err: io::Error) -> Self {
        RenderError::Io(err)
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, RenderError>;
