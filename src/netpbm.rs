//! Minimal binary Netpbm writers.
//!
//! Both formats use the shortest valid header, `P5\n<w> <h>\n255\n` for
//! graymaps and `P6\n<w> <h>\n255\n` for pixmaps, followed by the raw rows.
//! Rows are taken from a [`PlaneView`], so stride padding is never written.

use std::io::{self, Write};

use crate::plane::PlaneView;

/// The header [`write_pgm`] emits for a `width`×`height` image.
pub fn pgm_header(width: usize, height: usize) -> String {
    format!("P5\n{width} {height}\n255\n")
}

/// The header [`write_ppm`] emits for a `width`×`height` image.
pub fn ppm_header(width: usize, height: usize) -> String {
    format!("P6\n{width} {height}\n255\n")
}

/// Write a single-channel plane as a binary graymap (P5).
///
/// Each byte of a row is one pixel.
pub fn write_pgm<W: Write>(writer: &mut W, plane: &PlaneView<'_>) -> io::Result<()> {
    writer.write_all(pgm_header(plane.row_bytes(), plane.height()).as_bytes())?;
    write_rows(writer, plane)
}

/// Write a packed RGB24 plane as a binary pixmap (P6).
///
/// Fails with [`io::ErrorKind::InvalidInput`] before writing anything if the
/// row width is not a whole number of RGB triplets.
pub fn write_ppm<W: Write>(writer: &mut W, plane: &PlaneView<'_>) -> io::Result<()> {
    if plane.row_bytes() % 3 != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "a row of {} bytes is not a whole number of RGB pixels",
                plane.row_bytes()
            ),
        ));
    }

    let width = plane.row_bytes() / 3;
    writer.write_all(ppm_header(width, plane.height()).as_bytes())?;
    write_rows(writer, plane)
}

fn write_rows<W: Write>(writer: &mut W, plane: &PlaneView<'_>) -> io::Result<()> {
    for row in plane.rows() {
        writer.write_all(row)?;
    }
    Ok(())
}
