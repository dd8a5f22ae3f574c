//! Pixel-format conversion.
//!
//! [`FormatConverter`] turns a [`DecodedFrame`] in its native planar format
//! into a newly allocated packed [`ConvertedFrame`] at exactly the same
//! resolution. The numeric colorspace transform is FFmpeg's swscale; this
//! module only decides formats and geometry and owns the output buffer.

use ffmpeg_next::{
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::Context as ScalingContext,
};

use crate::{
    config::ConversionOptions,
    error::FrameDumpError,
    frame::{ConvertedFrame, DecodedFrame},
};

/// Bytes per pixel for the packed 8-bit formats a conversion may target.
pub fn packed_bytes_per_pixel(format: Pixel) -> Option<usize> {
    match format {
        Pixel::GRAY8 => Some(1),
        Pixel::RGB24 | Pixel::BGR24 => Some(3),
        Pixel::RGBA | Pixel::BGRA | Pixel::ARGB | Pixel::ABGR => Some(4),
        _ => None,
    }
}

/// Same-resolution colorspace / pixel-format converter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatConverter {
    options: ConversionOptions,
}

impl FormatConverter {
    pub fn new(options: ConversionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Convert `frame` to the configured target format.
    ///
    /// The input is only read. A frame whose format differs from
    /// [`ConversionOptions::expected_source`] is still converted, after a
    /// warning.
    ///
    /// # Errors
    ///
    /// - [`FrameDumpError::UnsupportedPixelFormat`] if the target is not a
    ///   packed 8-bit format.
    /// - [`FrameDumpError::AllocationFailed`] if the destination frame cannot
    ///   be allocated.
    /// - [`FrameDumpError::Ffmpeg`] if swscale rejects the conversion.
    pub fn convert(&self, frame: &DecodedFrame) -> Result<ConvertedFrame, FrameDumpError> {
        let target = self.options.target;
        let bytes_per_pixel = packed_bytes_per_pixel(target)
            .ok_or_else(|| FrameDumpError::UnsupportedPixelFormat(format!("{target:?}")))?;

        let source_format = frame.format();
        if source_format != self.options.expected_source {
            log::warn!(
                "frame {} is {:?}, not {:?}: the exported rasters may not be correct \
                 (the grayscale file could e.g. hold just the R component of an RGB video)",
                frame.frame_number(),
                source_format,
                self.options.expected_source,
            );
        }

        let width = frame.width();
        let height = frame.height();

        let mut converted = VideoFrame::new(target, width, height);
        if converted.planes() == 0 || converted.stride(0) < width as usize * bytes_per_pixel {
            return Err(FrameDumpError::AllocationFailed(format!(
                "could not allocate a {width}x{height} {target:?} destination frame"
            )));
        }

        let mut scaler = ScalingContext::get(
            source_format,
            width,
            height,
            target,
            width,
            height,
            self.options.flags,
        )?;
        scaler.run(frame.as_video_frame(), &mut converted)?;

        Ok(ConvertedFrame {
            frame: converted,
            frame_number: frame.frame_number(),
            bytes_per_pixel,
        })
    }
}
