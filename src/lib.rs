//! # framedump
//!
//! Decode the first frames of a video and dump each one twice: its luma
//! plane as a binary PGM graymap and an RGB24 conversion as a binary PPM
//! pixmap, powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use framedump::{PipelineDriver, PipelineOptions};
//!
//! let options = PipelineOptions::new()
//!     .with_frame_budget(5)
//!     .with_output_directory("frames");
//! let summary = PipelineDriver::new(options).run_path(Some(Path::new("input.mp4")))?;
//!
//! for files in &summary.exported {
//!     println!("{} {}", files.gray_path.display(), files.color_path.display());
//! }
//! # Ok::<(), framedump::FrameDumpError>(())
//! ```
//!
//! ## Stages
//!
//! - [`MediaSource`] opens a container, describes its streams and selects
//!   the first decodable video stream.
//! - [`DecoderSession`] runs the codec's send/receive protocol, numbering
//!   frames from 1.
//! - [`FormatConverter`] converts a frame to packed RGB at the same
//!   resolution.
//! - [`GrayExporter`] and [`ColorExporter`] write `frame-<N>.pgm` and
//!   `frame-<N>.ppm`.
//! - [`PipelineDriver`] ties them together under a frame budget.
//!
//! The source and decoder sit behind the [`PacketSource`] and
//! [`VideoDecoder`] traits, so the driver can run against any packet
//! producer.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | Writes the two rasters of a frame concurrently |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod config;
pub mod conversion;
pub mod decoder;
pub mod error;
pub mod export;
pub mod ffmpeg;
pub mod frame;
pub mod metadata;
pub mod netpbm;
pub mod pipeline;
pub mod plane;
pub mod progress;
pub mod source;

pub use config::{
    ConversionOptions, DEFAULT_BASE_NAME, DEFAULT_FRAME_BUDGET, ExportFailurePolicy, OutputLayout,
    PipelineOptions,
};
pub use conversion::{FormatConverter, packed_bytes_per_pixel};
pub use decoder::{DecodeStep, DecoderSession, Drain, VideoDecoder};
pub use error::FrameDumpError;
pub use export::{ColorExporter, ExportedFrame, FrameExporter, GrayExporter};
pub use ffmpeg::{FfmpegLogLevel, UnknownLogLevel};
pub use frame::{ConvertedFrame, DecodedFrame, PictureType};
pub use metadata::{
    MediaKind, MediaMetadata, StreamDescriptor, StreamParameters, select_video_stream,
};
pub use netpbm::{pgm_header, ppm_header, write_pgm, write_ppm};
pub use pipeline::{PipelineDriver, RunSummary, StopReason};
pub use plane::PlaneView;
pub use progress::{ProgressCallback, ProgressInfo};
pub use source::{MediaSource, PacketSource};
