//! Formatters for a finished image.

use image::pnm::PNMEncoder;
use image::pnm::{PNMSubtype, SampleEncoding};
use image::ColorType;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::grid::Image;
use crate::kernel::INTERIOR;

/// Writes the image as text: one line per row, one marker byte per
/// cell.
pub fn write_ascii<W: Write>(image: &Image, out: &mut W) -> Result<()> {
    for row in image.rows_iter() {
        out.write_all(row)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// The text rendering as a string.
pub fn to_ascii(image: &Image) -> String {
    let mut text = String::with_capacity(image.as_bytes().len() + image.rows() as usize);
    for row in image.rows_iter() {
        text.extend(row.iter().map(|&b| b as char));
        text.push('\n');
    }
    text
}

/// Greyscale pixels for the image: interior black, everything else white.
pub fn to_gray(image: &Image) -> Vec<u8> {
    image
        .as_bytes()
        .iter()
        .map(|&c| if c == INTERIOR { 0 } else { 255 })
        .collect()
}

/// Writes the image as a binary PGM.
pub fn write_pgm<P: AsRef<Path>>(image: &Image, outfile: P) -> Result<()> {
    let output = File::create(outfile)?;
    let mut encoder =
        PNMEncoder::new(output).with_subtype(PNMSubtype::Graymap(SampleEncoding::Binary));
    let pixels = to_gray(image);
    encoder.encode(&pixels[..], image.cols(), image.rows(), ColorType::Gray(8))?;
    Ok(())
}
