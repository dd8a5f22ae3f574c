//! Decoded and converted frame types.
//!
//! [`DecodedFrame`] is what the [`DecoderSession`](crate::DecoderSession)
//! yields: a picture in the decoder's native (usually planar) pixel format,
//! tagged with the session's frame number. [`ConvertedFrame`] is the packed
//! result of a [`FormatConverter`](crate::FormatConverter) call. Both own
//! their FFmpeg frame and hand out [`PlaneView`]s for reading pixel data.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use ffmpeg_next::{format::Pixel, frame::Video as VideoFrame, picture::Type as FfmpegPictureType};

use crate::{error::FrameDumpError, plane::PlaneView};

/// Coded picture type of a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PictureType {
    /// Intra-coded picture.
    I,
    /// Predicted picture.
    P,
    /// Bi-directionally predicted picture.
    B,
    /// S(GMC)-VOP (MPEG-4).
    S,
    /// Switching intra picture.
    SI,
    /// Switching predicted picture.
    SP,
    /// BI type picture.
    BI,
    /// The decoder did not report a picture type.
    Unknown,
}

impl PictureType {
    /// One-letter code, matching FFmpeg's `av_get_picture_type_char`.
    pub fn as_char(self) -> char {
        match self {
            PictureType::I => 'I',
            PictureType::P => 'P',
            PictureType::B => 'B',
            PictureType::S => 'S',
            PictureType::SI => 'i',
            PictureType::SP => 'p',
            PictureType::BI => 'b',
            PictureType::Unknown => '?',
        }
    }
}

impl From<FfmpegPictureType> for PictureType {
    fn from(kind: FfmpegPictureType) -> Self {
        match kind {
            FfmpegPictureType::I => PictureType::I,
            FfmpegPictureType::P => PictureType::P,
            FfmpegPictureType::B => PictureType::B,
            FfmpegPictureType::S => PictureType::S,
            FfmpegPictureType::SI => PictureType::SI,
            FfmpegPictureType::SP => PictureType::SP,
            FfmpegPictureType::BI => PictureType::BI,
            FfmpegPictureType::None => PictureType::Unknown,
        }
    }
}

/// A picture produced by the decoder.
pub struct DecodedFrame {
    frame: VideoFrame,
    frame_number: u64,
}

impl Debug for DecodedFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DecodedFrame")
            .field("frame_number", &self.frame_number)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("format", &self.format())
            .field("pts", &self.pts())
            .field("key_frame", &self.is_key_frame())
            .finish_non_exhaustive()
    }
}

impl DecodedFrame {
    /// Wrap an FFmpeg frame with the session frame number it was assigned.
    pub fn new(frame: VideoFrame, frame_number: u64) -> Self {
        Self {
            frame,
            frame_number,
        }
    }

    /// The session's 1-based frame number, used as the export file suffix.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    /// Native pixel format as reported by the decoder.
    pub fn format(&self) -> Pixel {
        self.frame.format()
    }

    pub fn pts(&self) -> Option<i64> {
        self.frame.pts()
    }

    pub fn is_key_frame(&self) -> bool {
        self.frame.is_key()
    }

    pub fn picture_type(&self) -> PictureType {
        PictureType::from(self.frame.kind())
    }

    /// Number of planes carried by the frame.
    pub fn plane_count(&self) -> usize {
        self.frame.planes()
    }

    /// View plane `index`, treating each sample as one byte.
    ///
    /// Suited to 8-bit planar formats such as YUV420P, where the row width of
    /// a chroma plane is its subsampled pixel width.
    ///
    /// # Errors
    ///
    /// Returns [`FrameDumpError::InvalidPlane`] if the plane does not exist
    /// or its stride is narrower than its width.
    pub fn plane(&self, index: usize) -> Result<PlaneView<'_>, FrameDumpError> {
        if index >= self.frame.planes() {
            return Err(FrameDumpError::InvalidPlane(format!(
                "frame {} has {} planes, plane {index} requested",
                self.frame_number,
                self.frame.planes()
            )));
        }
        PlaneView::new(
            self.frame.data(index),
            self.frame.stride(index),
            self.frame.plane_width(index) as usize,
            self.frame.plane_height(index) as usize,
        )
    }

    /// View the luma (first) plane at the frame's full resolution.
    pub fn luma(&self) -> Result<PlaneView<'_>, FrameDumpError> {
        self.plane(0)
    }

    /// Borrow the underlying FFmpeg frame.
    pub fn as_video_frame(&self) -> &VideoFrame {
        &self.frame
    }

    /// Release the underlying FFmpeg frame.
    pub fn into_video_frame(self) -> VideoFrame {
        self.frame
    }
}

/// A packed frame produced by a format conversion.
///
/// Always freshly allocated, never aliasing the [`DecodedFrame`] it was
/// converted from.
pub struct ConvertedFrame {
    pub(crate) frame: VideoFrame,
    pub(crate) frame_number: u64,
    pub(crate) bytes_per_pixel: usize,
}

impl Debug for ConvertedFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConvertedFrame")
            .field("frame_number", &self.frame_number)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("format", &self.format())
            .field("bytes_per_pixel", &self.bytes_per_pixel)
            .finish_non_exhaustive()
    }
}

impl ConvertedFrame {
    /// Frame number of the source frame.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    pub fn format(&self) -> Pixel {
        self.frame.format()
    }

    /// Bytes per pixel of the packed target format (3 for RGB24).
    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    /// View the single packed plane: `height` rows of
    /// `width * bytes_per_pixel` bytes.
    pub fn packed(&self) -> Result<PlaneView<'_>, FrameDumpError> {
        PlaneView::new(
            self.frame.data(0),
            self.frame.stride(0),
            self.width() as usize * self.bytes_per_pixel,
            self.height() as usize,
        )
    }
}
