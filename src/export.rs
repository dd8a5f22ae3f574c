//! Raster exporters.
//!
//! [`GrayExporter`] writes a frame's luma plane verbatim as a PGM file.
//! [`ColorExporter`] converts the frame itself, through its own
//! [`FormatConverter`], and writes the packed RGB result as a PPM file.
//! [`FrameExporter`] runs both for one decoded frame.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    config::{ConversionOptions, OutputLayout},
    conversion::FormatConverter,
    error::FrameDumpError,
    frame::{ConvertedFrame, DecodedFrame},
    netpbm,
    plane::PlaneView,
};

/// Files written for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFrame {
    /// Session frame number shared by both files.
    pub frame_number: u64,
    /// The `.pgm` file.
    pub gray_path: PathBuf,
    /// The `.ppm` file.
    pub color_path: PathBuf,
}

/// Writes single-channel planes as `<base>-<N>.pgm`.
#[derive(Debug, Clone)]
pub struct GrayExporter {
    layout: OutputLayout,
}

impl GrayExporter {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }

    /// Write `luma` as the graymap for `frame_number`.
    ///
    /// The image is `luma.row_bytes()` pixels wide and `luma.height()` rows
    /// tall; row `r` is read at offset `r * luma.stride()`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameDumpError::Io`] if the file cannot be created or fully
    /// written.
    pub fn export(&self, luma: &PlaneView<'_>, frame_number: u64) -> Result<PathBuf, FrameDumpError> {
        let path = self.layout.gray_path(frame_number);
        write_file(&path, |writer| netpbm::write_pgm(writer, luma))?;
        log::debug!(
            "wrote {} ({}x{})",
            path.display(),
            luma.row_bytes(),
            luma.height()
        );
        Ok(path)
    }
}

/// Converts frames to packed RGB and writes them as `<base>-<N>.ppm`.
#[derive(Debug, Clone)]
pub struct ColorExporter {
    layout: OutputLayout,
    converter: FormatConverter,
}

impl ColorExporter {
    pub fn new(layout: OutputLayout, conversion: ConversionOptions) -> Self {
        Self {
            layout,
            converter: FormatConverter::new(conversion),
        }
    }

    /// Convert `frame` and write the pixmap for its frame number.
    ///
    /// # Errors
    ///
    /// Returns conversion errors from [`FormatConverter::convert`] and the
    /// errors of [`write`](Self::write).
    pub fn export(&self, frame: &DecodedFrame) -> Result<PathBuf, FrameDumpError> {
        let converted = self.converter.convert(frame)?;
        self.write(&converted)
    }

    /// Write an already converted frame.
    ///
    /// # Errors
    ///
    /// - [`FrameDumpError::UnsupportedPixelFormat`] unless the frame holds
    ///   three bytes per pixel.
    /// - [`FrameDumpError::Io`] if the file cannot be created or fully
    ///   written.
    pub fn write(&self, converted: &ConvertedFrame) -> Result<PathBuf, FrameDumpError> {
        if converted.bytes_per_pixel() != 3 {
            return Err(FrameDumpError::UnsupportedPixelFormat(format!(
                "{:?} cannot be stored in a pixmap",
                converted.format()
            )));
        }

        let packed = converted.packed()?;
        let path = self.layout.color_path(converted.frame_number());
        write_file(&path, |writer| netpbm::write_ppm(writer, &packed))?;
        log::debug!(
            "wrote {} ({}x{})",
            path.display(),
            converted.width(),
            converted.height()
        );
        Ok(path)
    }
}

/// Exports both rasters of a decoded frame.
#[derive(Debug, Clone)]
pub struct FrameExporter {
    gray: GrayExporter,
    color: ColorExporter,
}

impl FrameExporter {
    pub fn new(layout: OutputLayout, conversion: ConversionOptions) -> Self {
        Self {
            gray: GrayExporter::new(layout.clone()),
            color: ColorExporter::new(layout, conversion),
        }
    }

    /// Write the graymap, then the pixmap, of `frame`.
    ///
    /// With the `rayon` feature the two files are written concurrently; they
    /// share nothing but read access to `frame`.
    ///
    /// # Errors
    ///
    /// Returns the first error of either exporter.
    pub fn export(&self, frame: &DecodedFrame) -> Result<ExportedFrame, FrameDumpError> {
        #[cfg(feature = "rayon")]
        let (gray_path, color_path) = {
            let (gray, color) = rayon::join(|| self.export_gray(frame), || self.color.export(frame));
            (gray?, color?)
        };

        #[cfg(not(feature = "rayon"))]
        let (gray_path, color_path) = {
            let gray = self.export_gray(frame)?;
            (gray, self.color.export(frame)?)
        };

        Ok(ExportedFrame {
            frame_number: frame.frame_number(),
            gray_path,
            color_path,
        })
    }

    fn export_gray(&self, frame: &DecodedFrame) -> Result<PathBuf, FrameDumpError> {
        let luma = frame.luma()?;
        self.gray.export(&luma, frame.frame_number())
    }
}

/// Create `path`, run `write` against a buffered writer and flush it.
fn write_file<F>(path: &Path, write: F) -> Result<(), FrameDumpError>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let io_error = |source: io::Error| FrameDumpError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).map_err(io_error)?;
    writer.flush().map_err(io_error)
}
