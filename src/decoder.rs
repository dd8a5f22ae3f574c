//! The decoder session.
//!
//! Codecs do not work one-packet-in, one-frame-out: a decoder may need
//! several packets before it produces a picture (reference frames, frame
//! reordering) and may release several pictures after a single packet. A
//! [`DecoderSession`] therefore feeds one packet and then pulls until the
//! decoder reports that it needs more input or that it is finished. Stopping
//! after the first frame would silently drop the rest.
//!
//! # Example
//!
//! ```no_run
//! use std::ops::ControlFlow;
//!
//! use framedump::{DecoderSession, MediaSource, PacketSource};
//!
//! let mut source = MediaSource::open("input.mp4")?;
//! let mut session = DecoderSession::create(&source)?;
//!
//! while let Some(packet) = source.read_packet()? {
//!     if packet.stream() != source.video_stream_index() {
//!         continue;
//!     }
//!     session.submit(&packet, |frame| {
//!         println!("frame {} is {}x{}", frame.frame_number(), frame.width(), frame.height());
//!         Ok(ControlFlow::Continue(()))
//!     })?;
//! }
//! # Ok::<(), framedump::FrameDumpError>(())
//! ```

use std::ops::ControlFlow;

use ffmpeg_next::{
    Error as FfmpegError, Packet, decoder::Video as FfmpegVideoDecoder, error::EAGAIN,
    frame::Video as VideoFrame,
};

use crate::{error::FrameDumpError, frame::DecodedFrame, source::MediaSource};

/// The send/receive surface of a stateful video decoder.
///
/// Errors use FFmpeg's convention: [`FfmpegError::Eof`] once the decoder is
/// fully drained and `EAGAIN` when it needs more input before it can output.
pub trait VideoDecoder {
    /// Supply one compressed packet.
    fn feed(&mut self, packet: &Packet) -> Result<(), FfmpegError>;

    /// Signal that no more packets will follow.
    fn finish(&mut self) -> Result<(), FfmpegError>;

    /// Move the next decoded picture, if any, into `frame`.
    fn pull(&mut self, frame: &mut VideoFrame) -> Result<(), FfmpegError>;
}

impl VideoDecoder for FfmpegVideoDecoder {
    fn feed(&mut self, packet: &Packet) -> Result<(), FfmpegError> {
        self.send_packet(packet)
    }

    fn finish(&mut self) -> Result<(), FfmpegError> {
        self.send_eof()
    }

    fn pull(&mut self, frame: &mut VideoFrame) -> Result<(), FfmpegError> {
        self.receive_frame(frame)
    }
}

/// Result of a single [`DecoderSession::pull`].
#[derive(Debug)]
pub enum DecodeStep {
    /// A picture is ready.
    Frame(DecodedFrame),
    /// The decoder needs more packets before it can output anything.
    WouldBlock,
    /// The decoder has been flushed and will produce nothing more.
    EndOfStream,
}

/// How a drain loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    /// Every ready frame was handed out; the decoder wants more input.
    WouldBlock,
    /// The decoder reported end of stream.
    EndOfStream,
    /// The frame handler asked to stop.
    Stopped,
}

/// A decoding context bound to the selected video stream.
pub struct DecoderSession<D = FfmpegVideoDecoder> {
    decoder: D,
    frames_decoded: u64,
}

impl DecoderSession<FfmpegVideoDecoder> {
    /// Open a decoder for the source's selected video stream.
    ///
    /// # Errors
    ///
    /// Returns [`FrameDumpError::CodecInit`] if the codec context cannot be
    /// created from the stream parameters or the decoder cannot be opened.
    pub fn create(source: &MediaSource) -> Result<Self, FrameDumpError> {
        let decoder = source.open_video_decoder()?;
        log::debug!(
            "opened decoder for stream {}: {}x{} {:?}",
            source.video_stream_index(),
            decoder.width(),
            decoder.height(),
            decoder.format(),
        );
        Ok(Self::with_decoder(decoder))
    }
}

impl<D: VideoDecoder> DecoderSession<D> {
    /// Wrap an already opened decoder.
    pub fn with_decoder(decoder: D) -> Self {
        Self {
            decoder,
            frames_decoded: 0,
        }
    }

    /// The wrapped decoder.
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Number of frames handed out so far. This is also the frame number of
    /// the most recent frame.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Supply one compressed packet.
    ///
    /// # Errors
    ///
    /// Returns [`FrameDumpError::DecodeRejected`] if the codec refuses the
    /// packet. The session should not be used further.
    pub fn feed(&mut self, packet: &Packet) -> Result<(), FrameDumpError> {
        log::debug!("AVPacket->pts {:?}", packet.pts());
        self.decoder.feed(packet).map_err(|error| {
            log::error!("Error while sending a packet to the decoder: {error}");
            FrameDumpError::DecodeRejected(error.to_string())
        })
    }

    /// Retrieve the next decoded frame, if one is ready.
    ///
    /// # Errors
    ///
    /// Returns [`FrameDumpError::DecodePull`] for any decoder failure other
    /// than needing more input or having reached the end of the stream.
    pub fn pull(&mut self) -> Result<DecodeStep, FrameDumpError> {
        let mut frame = VideoFrame::empty();
        match self.decoder.pull(&mut frame) {
            Ok(()) => {
                self.frames_decoded += 1;
                let decoded = DecodedFrame::new(frame, self.frames_decoded);
                log::debug!(
                    "Frame {} (type={}, format={:?}) pts {:?} key_frame {}",
                    decoded.frame_number(),
                    decoded.picture_type().as_char(),
                    decoded.format(),
                    decoded.pts(),
                    u8::from(decoded.is_key_frame()),
                );
                Ok(DecodeStep::Frame(decoded))
            }
            Err(FfmpegError::Other { errno: EAGAIN }) => Ok(DecodeStep::WouldBlock),
            Err(FfmpegError::Eof) => Ok(DecodeStep::EndOfStream),
            Err(error) => {
                log::error!("Error while receiving a frame from the decoder: {error}");
                Err(FrameDumpError::DecodePull(error.to_string()))
            }
        }
    }

    /// Feed `packet`, then hand every frame the decoder releases to
    /// `handler` until it needs more input.
    ///
    /// The handler takes ownership of each frame and may return
    /// [`ControlFlow::Break`] to stop early, leaving any further frames
    /// buffered in the decoder.
    ///
    /// # Errors
    ///
    /// Returns decode errors from [`feed`](Self::feed) and
    /// [`pull`](Self::pull), and any error returned by `handler`.
    pub fn submit<F>(&mut self, packet: &Packet, handler: F) -> Result<Drain, FrameDumpError>
    where
        F: FnMut(DecodedFrame) -> Result<ControlFlow<()>, FrameDumpError>,
    {
        self.feed(packet)?;
        self.drain(handler)
    }

    /// Signal end of input and hand out every frame still buffered in the
    /// decoder.
    ///
    /// # Errors
    ///
    /// Returns [`FrameDumpError::DecodeRejected`] if the decoder refuses the
    /// end-of-stream signal, plus the errors of [`submit`](Self::submit).
    pub fn finish<F>(&mut self, handler: F) -> Result<Drain, FrameDumpError>
    where
        F: FnMut(DecodedFrame) -> Result<ControlFlow<()>, FrameDumpError>,
    {
        log::debug!("flushing decoder after {} frames", self.frames_decoded);
        self.decoder
            .finish()
            .map_err(|error| FrameDumpError::DecodeRejected(error.to_string()))?;
        self.drain(handler)
    }

    fn drain<F>(&mut self, mut handler: F) -> Result<Drain, FrameDumpError>
    where
        F: FnMut(DecodedFrame) -> Result<ControlFlow<()>, FrameDumpError>,
    {
        loop {
            match self.pull()? {
                DecodeStep::Frame(frame) => {
                    if handler(frame)?.is_break() {
                        return Ok(Drain::Stopped);
                    }
                }
                DecodeStep::WouldBlock => return Ok(Drain::WouldBlock),
                DecodeStep::EndOfStream => return Ok(Drain::EndOfStream),
            }
        }
    }
}
