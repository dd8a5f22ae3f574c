//! Error types for the `framedump` crate.
//!
//! [`FrameDumpError`] is the single error type returned by every fallible
//! operation. Setup and decode-path variants are fatal to a run; only
//! [`FrameDumpError::Io`] may be tolerated, and only when the pipeline is
//! configured with [`ExportFailurePolicy::Continue`](crate::ExportFailurePolicy).

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;

/// The unified error type for all `framedump` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameDumpError {
    /// The command line or driver was invoked without the required input.
    #[error("{0}")]
    Usage(String),

    /// The container could not be allocated or opened.
    #[error("Failed to open media file at {path}: {reason}")]
    ContainerOpen {
        /// Path that was passed to [`crate::MediaSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The container opened but its stream information could not be read.
    #[error("Failed to read stream information from {path}: {reason}")]
    StreamProbe {
        /// Path of the container being probed.
        path: PathBuf,
        /// Underlying reason the probe failed.
        reason: String,
    },

    /// No video stream with a registered decoder exists in the container.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The decoder context could not be allocated, configured or opened.
    #[error("Failed to initialise video decoder: {0}")]
    CodecInit(String),

    /// A frame or packet buffer could not be allocated.
    #[error("Allocation failed: {0}")]
    AllocationFailed(String),

    /// The decoder refused a packet (or the end-of-stream signal).
    #[error("Decoder rejected packet: {0}")]
    DecodeRejected(String),

    /// The decoder failed while returning a frame, for a reason other than
    /// needing more input or having reached the end of the stream.
    #[error("Failed to receive frame from decoder: {0}")]
    DecodePull(String),

    /// A plane's buffer, stride and dimensions are inconsistent.
    #[error("Invalid plane geometry: {0}")]
    InvalidPlane(String),

    /// The configured conversion target is not a packed 8-bit format.
    #[error("Unsupported target pixel format: {0}")]
    UnsupportedPixelFormat(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// A raster file could not be created or fully written.
    #[error("Failed to write {path}: {source}")]
    Io {
        /// Destination file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: IoError,
    },

    /// The background export worker terminated abnormally.
    #[error("Export worker failed: {0}")]
    ExportWorker(String),
}

impl From<FfmpegError> for FrameDumpError {
    fn from(error: FfmpegError) -> Self {
        FrameDumpError::Ffmpeg(error.to_string())
    }
}

impl FrameDumpError {
    /// Returns `true` for raster export failures, the only errors a run can
    /// be configured to tolerate.
    pub fn is_export_failure(&self) -> bool {
        matches!(self, FrameDumpError::Io { .. })
    }
}
