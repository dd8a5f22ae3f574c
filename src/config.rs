//! Pipeline configuration.
//!
//! [`PipelineOptions`] is a builder that carries the frame budget, output
//! layout, conversion settings and failure policy into the
//! [`PipelineDriver`](crate::PipelineDriver). Every setting is immutable once
//! the driver is built; nothing is kept in process-wide state.
//!
//! # Example
//!
//! ```no_run
//! use framedump::{ExportFailurePolicy, PipelineOptions};
//!
//! let options = PipelineOptions::new()
//!     .with_frame_budget(10)
//!     .with_output_directory("frames")
//!     .with_export_failure_policy(ExportFailurePolicy::Continue);
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    sync::Arc,
};

use ffmpeg_next::{format::Pixel, software::scaling::Flags as ScalingFlags};

use crate::progress::ProgressCallback;

/// Number of frames exported when no budget is configured.
pub const DEFAULT_FRAME_BUDGET: u64 = 5;

/// Base file name used when no prefix is configured.
pub const DEFAULT_BASE_NAME: &str = "frame";

/// Where raster files are written and how they are named.
///
/// Files are named `<base_name>-<N>.pgm` and `<base_name>-<N>.ppm` inside
/// `directory`, where `N` is the decoder session's frame number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// Destination directory.
    pub directory: PathBuf,
    /// File name stem shared by both rasters.
    pub base_name: String,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            base_name: DEFAULT_BASE_NAME.to_string(),
        }
    }
}

impl OutputLayout {
    /// Create a layout writing into `directory` with the default base name.
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Path of the grayscale raster for `frame_number`.
    pub fn gray_path(&self, frame_number: u64) -> PathBuf {
        self.directory
            .join(format!("{}-{frame_number}.pgm", self.base_name))
    }

    /// Path of the colour raster for `frame_number`.
    pub fn color_path(&self, frame_number: u64) -> PathBuf {
        self.directory
            .join(format!("{}-{frame_number}.ppm", self.base_name))
    }
}

/// Pixel-format conversion settings for the colour raster.
///
/// `expected_source` is the format the pipeline is authored against; frames
/// in any other format are still converted, with a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Native format frames are expected to arrive in.
    pub expected_source: Pixel,
    /// Packed output format.
    pub target: Pixel,
    /// swscale algorithm and accuracy flags.
    pub flags: ScalingFlags,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            expected_source: Pixel::YUV420P,
            target: Pixel::RGB24,
            flags: ScalingFlags::FAST_BILINEAR
                | ScalingFlags::FULL_CHR_H_INT
                | ScalingFlags::ACCURATE_RND,
        }
    }
}

/// What the driver does when writing a raster file fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFailurePolicy {
    /// Stop the run and return the error. This is the default.
    #[default]
    Abort,
    /// Log the failure, count it in the run summary and keep going.
    Continue,
}

/// Options for a [`PipelineDriver`](crate::PipelineDriver) run.
#[derive(Clone)]
pub struct PipelineOptions {
    /// Maximum number of video frames to export.
    pub(crate) frame_budget: u64,
    /// File naming and destination.
    pub(crate) output: OutputLayout,
    /// Colour conversion settings.
    pub(crate) conversion: ConversionOptions,
    /// Reaction to raster write failures.
    pub(crate) export_failure: ExportFailurePolicy,
    /// Capacity of the decode → export queue. `None` runs every stage on the
    /// calling thread.
    pub(crate) pipeline_depth: Option<usize>,
    /// Progress callback, invoked after every exported frame.
    pub(crate) progress: Option<Arc<dyn ProgressCallback>>,
}

impl Debug for PipelineOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PipelineOptions")
            .field("frame_budget", &self.frame_budget)
            .field("output", &self.output)
            .field("conversion", &self.conversion)
            .field("export_failure", &self.export_failure)
            .field("pipeline_depth", &self.pipeline_depth)
            .field("has_progress", &self.progress.is_some())
            .finish()
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineOptions {
    /// Create options with the default settings: a budget of
    /// [`DEFAULT_FRAME_BUDGET`] frames written to the current directory,
    /// YUV420P → RGB24 conversion, abort on export failure, no worker thread.
    pub fn new() -> Self {
        Self {
            frame_budget: DEFAULT_FRAME_BUDGET,
            output: OutputLayout::default(),
            conversion: ConversionOptions::default(),
            export_failure: ExportFailurePolicy::default(),
            pipeline_depth: None,
            progress: None,
        }
    }

    /// Set the maximum number of frames to export.
    ///
    /// A budget of 0 ends the run before any packet is read.
    #[must_use]
    pub fn with_frame_budget(mut self, frames: u64) -> Self {
        self.frame_budget = frames;
        self
    }

    /// Set the directory raster files are written into.
    #[must_use]
    pub fn with_output_directory<P: AsRef<Path>>(mut self, directory: P) -> Self {
        self.output.directory = directory.as_ref().to_path_buf();
        self
    }

    /// Set the file name stem (`frame` by default).
    #[must_use]
    pub fn with_base_name<S: Into<String>>(mut self, base_name: S) -> Self {
        self.output.base_name = base_name.into();
        self
    }

    /// Set the complete output layout.
    #[must_use]
    pub fn with_output(mut self, output: OutputLayout) -> Self {
        self.output = output;
        self
    }

    /// Set the colour conversion settings.
    #[must_use]
    pub fn with_conversion(mut self, conversion: ConversionOptions) -> Self {
        self.conversion = conversion;
        self
    }

    /// Choose whether a failed raster write aborts the run.
    #[must_use]
    pub fn with_export_failure_policy(mut self, policy: ExportFailurePolicy) -> Self {
        self.export_failure = policy;
        self
    }

    /// Export on a dedicated thread, fed through a queue holding at most
    /// `depth` decoded frames. The decoder blocks while the queue is full.
    ///
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_pipeline_depth(mut self, depth: usize) -> Self {
        self.pipeline_depth = Some(depth.max(1));
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn frame_budget(&self) -> u64 {
        self.frame_budget
    }

    pub fn output(&self) -> &OutputLayout {
        &self.output
    }

    pub fn conversion(&self) -> &ConversionOptions {
        &self.conversion
    }

    pub fn export_failure_policy(&self) -> ExportFailurePolicy {
        self.export_failure
    }

    pub fn pipeline_depth(&self) -> Option<usize> {
        self.pipeline_depth
    }
}
