//! The pipeline driver.
//!
//! [`PipelineDriver`] reads packets from a [`PacketSource`], feeds those of
//! the selected video stream to a [`DecoderSession`] and exports every frame
//! it releases until the frame budget is spent or the input runs out. At end
//! of input the decoder is flushed so that frames it still holds for
//! reordering are exported too.
//!
//! With [`PipelineOptions::with_pipeline_depth`] the exports run on a scoped
//! worker thread behind a bounded queue, so decoding the next frame overlaps
//! writing the previous one. Frames are exported in decode order either way.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs,
    ops::ControlFlow,
    path::Path,
    thread,
};

use crossbeam_channel::Sender;

use crate::{
    config::{ExportFailurePolicy, PipelineOptions},
    decoder::{DecoderSession, Drain, VideoDecoder},
    error::FrameDumpError,
    export::{ExportedFrame, FrameExporter},
    frame::DecodedFrame,
    progress::ProgressTracker,
    source::{MediaSource, PacketSource},
};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured number of frames was reached.
    BudgetExhausted,
    /// The input and the decoder ran out of frames first.
    EndOfStream,
}

impl Display for StopReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StopReason::BudgetExhausted => f.write_str("frame budget reached"),
            StopReason::EndOfStream => f.write_str("end of stream"),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub stop_reason: StopReason,
    /// Frames released by the decoder.
    pub frames_decoded: u64,
    /// Frames whose two rasters were both written.
    pub frames_exported: u64,
    /// Frames whose export failed under [`ExportFailurePolicy::Continue`].
    pub export_failures: u64,
    /// Packets read from the source, of any stream.
    pub packets_read: u64,
    /// Packets skipped because they belong to another stream.
    pub packets_discarded: u64,
    /// Files written, in frame order.
    pub exported: Vec<ExportedFrame>,
}

/// Runs the read → decode → export loop.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use framedump::{PipelineDriver, PipelineOptions};
///
/// let driver = PipelineDriver::new(PipelineOptions::new().with_frame_budget(3));
/// let summary = driver.run_path(Some(Path::new("input.mp4")))?;
/// println!("{} frames, {}", summary.frames_exported, summary.stop_reason);
/// # Ok::<(), framedump::FrameDumpError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct PipelineDriver {
    options: PipelineOptions,
}

enum State {
    Reading,
    Decoding(ffmpeg_next::Packet),
    Draining,
    Done(StopReason),
}

#[derive(Default)]
struct PacketCounts {
    read: u64,
    discarded: u64,
}

impl PipelineDriver {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Open `path`, decode its first decodable video stream and export up
    /// to the frame budget.
    ///
    /// # Errors
    ///
    /// - [`FrameDumpError::Usage`] if no path is given.
    /// - The errors of [`MediaSource::open`], [`DecoderSession::create`] and
    ///   [`run`](Self::run).
    pub fn run_path(&self, path: Option<&Path>) -> Result<RunSummary, FrameDumpError> {
        let path = path.ok_or_else(|| {
            FrameDumpError::Usage("You need to specify a media file.".to_string())
        })?;

        let mut source = MediaSource::open(path)?;
        let mut session = DecoderSession::create(&source)?;
        let video_stream_index = source.video_stream_index();
        self.run(&mut source, video_stream_index, &mut session)
    }

    /// Run the loop over an already opened source and decoder.
    ///
    /// Packets whose stream index is not `video_stream_index` are counted
    /// and dropped. The output directory is created if it does not exist.
    /// A frame budget of 0 returns at once without reading anything.
    ///
    /// # Errors
    ///
    /// - Any source or decode error. These always abort the run.
    /// - [`FrameDumpError::Io`] for the first failed raster write, unless the
    ///   policy is [`ExportFailurePolicy::Continue`].
    /// - [`FrameDumpError::ExportWorker`] if the export thread panics.
    pub fn run<S, D>(
        &self,
        source: &mut S,
        video_stream_index: usize,
        session: &mut DecoderSession<D>,
    ) -> Result<RunSummary, FrameDumpError>
    where
        S: PacketSource,
        D: VideoDecoder,
    {
        let mut counts = PacketCounts::default();

        if self.options.frame_budget == 0 {
            log::info!("frame budget is 0, nothing to do");
            let stage = self.export_stage();
            return Ok(self.summary(StopReason::BudgetExhausted, session, counts, stage));
        }

        let directory = &self.options.output.directory;
        fs::create_dir_all(directory).map_err(|source| FrameDumpError::Io {
            path: directory.clone(),
            source,
        })?;

        let (stop_reason, stage) = match self.options.pipeline_depth {
            None => {
                let mut stage = self.export_stage();
                let stop_reason =
                    self.drive(source, video_stream_index, session, &mut stage, &mut counts)?;
                (stop_reason, stage)
            }
            Some(depth) => {
                self.drive_pipelined(source, video_stream_index, session, depth, &mut counts)?
            }
        };

        let summary = self.summary(stop_reason, session, counts, stage);
        log::info!(
            "stopped on {}: {} frames decoded, {} exported, {} failed, {} of {} packets discarded",
            summary.stop_reason,
            summary.frames_decoded,
            summary.frames_exported,
            summary.export_failures,
            summary.packets_discarded,
            summary.packets_read,
        );
        Ok(summary)
    }

    fn drive_pipelined<S, D>(
        &self,
        source: &mut S,
        video_stream_index: usize,
        session: &mut DecoderSession<D>,
        depth: usize,
        counts: &mut PacketCounts,
    ) -> Result<(StopReason, ExportStage<'_>), FrameDumpError>
    where
        S: PacketSource,
        D: VideoDecoder,
    {
        let (mut sender, receiver) = crossbeam_channel::bounded::<DecodedFrame>(depth);
        let mut stage = self.export_stage();
        log::debug!("exporting on a worker thread, queue depth {depth}");

        thread::scope(|scope| {
            let worker = scope.spawn(move || {
                for frame in receiver {
                    stage.export(frame)?;
                }
                Ok::<_, FrameDumpError>(stage)
            });

            let decoded = self.drive(source, video_stream_index, session, &mut sender, counts);
            // Closing the queue lets the worker finish what is left and return.
            drop(sender);

            let stage = worker
                .join()
                .map_err(|_| FrameDumpError::ExportWorker("export thread panicked".to_string()))??;
            Ok((decoded?, stage))
        })
    }

    fn drive<S, D, K>(
        &self,
        source: &mut S,
        video_stream_index: usize,
        session: &mut DecoderSession<D>,
        sink: &mut K,
        counts: &mut PacketCounts,
    ) -> Result<StopReason, FrameDumpError>
    where
        S: PacketSource,
        D: VideoDecoder,
        K: FrameSink,
    {
        let mut remaining = self.options.frame_budget;
        let mut state = State::Reading;

        loop {
            state = match state {
                State::Reading => match source.read_packet()? {
                    Some(packet) => {
                        counts.read += 1;
                        if packet.stream() == video_stream_index {
                            State::Decoding(packet)
                        } else {
                            counts.discarded += 1;
                            log::debug!("discarding packet of stream {}", packet.stream());
                            State::Reading
                        }
                    }
                    None => State::Draining,
                },
                State::Decoding(packet) => {
                    let drain = session
                        .submit(&packet, |frame| deliver(frame, &mut remaining, &mut *sink))?;
                    match drain {
                        Drain::WouldBlock => State::Reading,
                        Drain::EndOfStream => State::Done(StopReason::EndOfStream),
                        Drain::Stopped => State::Done(stopped(remaining)),
                    }
                }
                State::Draining => {
                    match session.finish(|frame| deliver(frame, &mut remaining, &mut *sink))? {
                        Drain::Stopped => State::Done(stopped(remaining)),
                        Drain::WouldBlock | Drain::EndOfStream => {
                            State::Done(StopReason::EndOfStream)
                        }
                    }
                }
                State::Done(reason) => return Ok(reason),
            };
        }
    }

    fn export_stage(&self) -> ExportStage<'_> {
        ExportStage {
            exporter: FrameExporter::new(self.options.output.clone(), self.options.conversion),
            policy: self.options.export_failure,
            progress: ProgressTracker::new(
                self.options.progress.as_deref(),
                self.options.frame_budget,
            ),
            exported: Vec::new(),
            failures: 0,
        }
    }

    fn summary<D: VideoDecoder>(
        &self,
        stop_reason: StopReason,
        session: &DecoderSession<D>,
        counts: PacketCounts,
        stage: ExportStage<'_>,
    ) -> RunSummary {
        RunSummary {
            stop_reason,
            frames_decoded: session.frames_decoded(),
            frames_exported: stage.exported.len() as u64,
            export_failures: stage.failures,
            packets_read: counts.read,
            packets_discarded: counts.discarded,
            exported: stage.exported,
        }
    }
}

/// Hand one frame to the sink and charge it against the budget.
fn deliver<K: FrameSink>(
    frame: DecodedFrame,
    remaining: &mut u64,
    sink: &mut K,
) -> Result<ControlFlow<()>, FrameDumpError> {
    *remaining = remaining.saturating_sub(1);
    if sink.accept(frame)?.is_break() || *remaining == 0 {
        return Ok(ControlFlow::Break(()));
    }
    Ok(ControlFlow::Continue(()))
}

// A sink only stops early when the export worker has gone away, and then the
// worker's error is what the run reports.
fn stopped(remaining: u64) -> StopReason {
    if remaining == 0 {
        StopReason::BudgetExhausted
    } else {
        StopReason::EndOfStream
    }
}

/// Where the decode loop sends frames.
trait FrameSink {
    fn accept(&mut self, frame: DecodedFrame) -> Result<ControlFlow<()>, FrameDumpError>;
}

impl FrameSink for Sender<DecodedFrame> {
    fn accept(&mut self, frame: DecodedFrame) -> Result<ControlFlow<()>, FrameDumpError> {
        match self.send(frame) {
            Ok(()) => Ok(ControlFlow::Continue(())),
            Err(_) => Ok(ControlFlow::Break(())),
        }
    }
}

/// Exports frames and keeps the tallies for the summary.
struct ExportStage<'a> {
    exporter: FrameExporter,
    policy: ExportFailurePolicy,
    progress: ProgressTracker<'a>,
    exported: Vec<ExportedFrame>,
    failures: u64,
}

impl ExportStage<'_> {
    fn export(&mut self, frame: DecodedFrame) -> Result<(), FrameDumpError> {
        let frame_number = frame.frame_number();
        match self.exporter.export(&frame) {
            Ok(files) => {
                log::info!(
                    "frame {frame_number}: wrote {} and {}",
                    files.gray_path.display(),
                    files.color_path.display()
                );
                self.exported.push(files);
            }
            Err(error)
                if error.is_export_failure() && self.policy == ExportFailurePolicy::Continue =>
            {
                log::warn!("frame {frame_number}: {error}, continuing");
                self.failures += 1;
            }
            Err(error) => return Err(error),
        }
        self.progress.frame_done(frame_number);
        Ok(())
    }
}

impl FrameSink for ExportStage<'_> {
    fn accept(&mut self, frame: DecodedFrame) -> Result<ControlFlow<()>, FrameDumpError> {
        self.export(frame)?;
        Ok(ControlFlow::Continue(()))
    }
}
