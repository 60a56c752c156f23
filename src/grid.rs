//! The grid being rendered, the items that travel through the pipeline,
//! and the image they are assembled into.

use itertools::iproduct;
use std::io::BufRead;

use crate::error::{RenderError, Result};
use crate::kernel;

/// Linear index of one grid cell, `row * cols + col`.
pub type WorkItem = u32;

/// Reserved slot value meaning "no item here".  No valid [`WorkItem`]
/// may ever equal it.
pub const EMPTY_INDEX: WorkItem = u32::MAX;

/// Immutable shape of a render: every thread reads it, none writes it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GridSpec {
    rows: u32,
    cols: u32,
    iteration_limit: u32,
}

impl GridSpec {
    /// Validates and builds a grid.  The cell count has to stay strictly
    /// below [`EMPTY_INDEX`] so that every index is distinguishable from
    /// an empty slot.
    pub fn new(rows: u32, cols: u32, iteration_limit: u32) -> Result<GridSpec> {
        if rows == 0 || cols == 0 {
            return Err(RenderError::EmptyGrid { rows, cols });
        }
        if iteration_limit == 0 {
            return Err(RenderError::ZeroIterations);
        }
        let cells = u64::from(rows) * u64::from(cols);
        if cells >= u64::from(EMPTY_INDEX) {
            return Err(RenderError::GridTooLarge { rows, cols });
        }
        Ok(GridSpec {
            rows,
            cols,
            iteration_limit,
        })
    }

    /// Reads three whitespace-separated unsigned integers: rows, columns
    /// and the iteration limit.  They may be spread over any number of
    /// lines; reading stops at the third, and whatever follows it is left
    /// unread.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<GridSpec> {
        let mut numbers = Vec::with_capacity(3);
        'lines: for line in reader.lines() {
            for token in line?.split_whitespace() {
                let value = token
                    .parse::<u32>()
                    .map_err(|_| RenderError::Input(format!("'{}' is not an unsigned integer", token)))?;
                numbers.push(value);
                if numbers.len() == 3 {
                    break 'lines;
                }
            }
        }
        match numbers.as_slice() {
            [rows, cols, limit] => GridSpec::new(*rows, *cols, *limit),
            _ => Err(RenderError::Input(format!(
                "expected rows, columns and iteration limit, found {} number(s)",
                numbers.len()
            ))),
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Iteration budget per cell.
    pub fn iteration_limit(&self) -> u32 {
        self.iteration_limit
    }

    /// Total number of cells; also one past the largest valid index.
    pub fn len(&self) -> u32 {
        self.rows * self.cols
    }

    /// Splits a linear index into `(row, col)`.
    #[inline]
    pub fn locate(&self, index: WorkItem) -> (u32, u32) {
        (index / self.cols, index % self.cols)
    }

    /// Runs the kernel for one work item.
    #[inline]
    pub fn evaluate(&self, index: WorkItem) -> ResultItem {
        let (row, col) = self.locate(index);
        let cell = kernel::evaluate(row, col, self.rows, self.cols, self.iteration_limit);
        ResultItem {
            index,
            value: cell.as_byte(),
        }
    }
}

/// A computed cell tagged with where it belongs, so it can arrive in any
/// order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResultItem {
    /// Destination index in the image.
    pub index: WorkItem,
    /// The kernel's marker byte.
    pub value: u8,
}

/// Row-major buffer of result bytes.  Cells start out as [`Image::BLANK`]
/// and are overwritten exactly once each.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    rows: u32,
    cols: u32,
    cells: Vec<u8>,
}

impl Image {
    /// Content of a cell nobody has written yet.
    pub const BLANK: u8 = 0;

    /// Allocates a blank image shaped like `grid`.
    pub fn blank(grid: &GridSpec) -> Image {
        Image {
            rows: grid.rows,
            cols: grid.cols,
            cells: vec![Image::BLANK; grid.len() as usize],
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// The whole buffer, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    /// Iterates over the rows as byte slices.
    pub fn rows_iter(&self) -> std::slice::Chunks<'_, u8> {
        self.cells.chunks(self.cols as usize)
    }

    /// True once no cell is [`Image::BLANK`] any more.
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|&c| c != Image::BLANK)
    }

    /// Stores a result at its tagged index.
    #[inline]
    pub fn write(&mut self, item: ResultItem) {
        let cell = &mut self.cells[item.index as usize];
        debug_assert_eq!(*cell, Image::BLANK, "cell {} written twice", item.index);
        *cell = item.value;
    }
}

/// Single-threaded row-major render, the reference every pipeline run
/// must reproduce byte for byte.
pub fn render_serial(grid: &GridSpec) -> Image {
    let mut image = Image::blank(grid);
    for (row, col) in iproduct!(0..grid.rows, 0..grid.cols) {
        image.write(grid.evaluate(row * grid.cols + col));
    }
    image
}
