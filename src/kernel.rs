//! The escape-time kernel.  Everything the pipeline carries is the
//! output of [`evaluate`]; the rest of the crate only moves it around.

use num::Complex;

/// The value written for a cell that never escaped.
pub const INTERIOR: u8 = b'#';

/// The value written for a cell whose orbit left the radius-2 disc.
pub const EXTERIOR: u8 = b'.';

/// Classification of one grid cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    /// The orbit stayed bounded for the whole iteration budget.
    Interior,
    /// The orbit escaped before the budget ran out.
    Exterior,
}

impl Cell {
    /// The byte stored in the image for this cell.
    #[inline]
    pub fn as_byte(self) -> u8 {
        match self {
            Cell::Interior => INTERIOR,
            Cell::Exterior => EXTERIOR,
        }
    }
}

/// Maps a grid cell onto the complex plane.  Columns span the real
/// interval [-1.5, 0.5), rows span the imaginary interval [-1.0, 1.0).
#[inline]
pub fn cell_to_point(row: u32, col: u32, rows: u32, cols: u32) -> Complex<f32> {
    Complex::new(
        col as f32 * 2.0 / cols as f32 - 1.5,
        row as f32 * 2.0 / rows as f32 - 1.0,
    )
}

/// Classifies a single cell.  `n` counts up from zero and is bumped
/// before every iteration; the loop gives up once `|z|` reaches 2 or
/// the bumped count reaches `limit`.  A cell is interior iff the count
/// hit the limit.
///
/// Pure: no shared state, safe to call from any number of threads.
pub fn evaluate(row: u32, col: u32, rows: u32, cols: u32, limit: u32) -> Cell {
    let c = cell_to_point(row, col, rows, cols);
    let mut z = Complex::new(0.0_f32, 0.0_f32);
    let mut n = 0u32;
    while z.norm_sqr() < 4.0 {
        n += 1;
        if n >= limit {
            break;
        }
        z = z * z + c;
    }
    if n == limit {
        Cell::Interior
    } else {
        Cell::Exterior
    }
}
