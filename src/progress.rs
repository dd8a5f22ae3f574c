//! Progress reporting.
//!
//! A [`ProgressCallback`] attached through
//! [`PipelineOptions::with_progress`](crate::PipelineOptions::with_progress)
//! is told about every frame once both of its rasters have been written.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framedump::{PipelineDriver, PipelineOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("frame {} ({}/{})", info.frame_number, info.current, info.total);
//!     }
//! }
//!
//! let options = PipelineOptions::new().with_progress(Arc::new(PrintProgress));
//! PipelineDriver::new(options).run_path(Some("input.mp4".as_ref()))?;
//! # Ok::<(), framedump::FrameDumpError>(())
//! ```

use std::time::{Duration, Instant};

/// A snapshot taken after a frame has been exported.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Frames handled so far, including this one.
    pub current: u64,
    /// The frame budget of the run.
    pub total: u64,
    /// Session frame number of the frame just exported.
    pub frame_number: u64,
    /// Wall-clock time since the run started.
    pub elapsed: Duration,
}

/// Receives progress updates from the pipeline.
///
/// Implementations must be [`Send`] and [`Sync`]: with a pipeline depth
/// configured the callback runs on the export thread.
pub trait ProgressCallback: Send + Sync {
    /// Called once per exported frame.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Counts frames and forwards snapshots to an optional callback.
pub(crate) struct ProgressTracker<'a> {
    callback: Option<&'a dyn ProgressCallback>,
    total: u64,
    current: u64,
    started: Instant,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(callback: Option<&'a dyn ProgressCallback>, total: u64) -> Self {
        Self {
            callback,
            total,
            current: 0,
            started: Instant::now(),
        }
    }

    pub(crate) fn frame_done(&mut self, frame_number: u64) {
        self.current += 1;
        if let Some(callback) = self.callback {
            callback.on_progress(&ProgressInfo {
                current: self.current,
                total: self.total,
                frame_number,
                elapsed: self.started.elapsed(),
            });
        }
    }
}
