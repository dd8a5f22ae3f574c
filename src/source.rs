//! Opening and probing a media container.
//!
//! [`MediaSource::open`] is the stream prober: it opens the container, reads
//! its header and stream information, resolves a decoder for every stream,
//! and selects the video stream the pipeline will decode. Afterwards the
//! source hands out compressed packets through [`PacketSource`].

use std::{
    ffi::CString,
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    ptr,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Stream, codec::context::Context as CodecContext,
    decoder::Video as FfmpegVideoDecoder, format::context::Input,
};
use ffmpeg_sys_next::{
    AVFormatContext, avformat_close_input, avformat_find_stream_info, avformat_open_input,
};

use crate::{
    error::FrameDumpError,
    metadata::{MediaKind, MediaMetadata, StreamDescriptor, StreamParameters, select_video_stream},
};

/// Anything that yields compressed packets in container order.
///
/// `Ok(None)` signals the end of the input.
pub trait PacketSource {
    fn read_packet(&mut self) -> Result<Option<Packet>, FrameDumpError>;
}

/// An opened media container with a selected video stream.
pub struct MediaSource {
    input: Input,
    metadata: MediaMetadata,
    video_stream_index: usize,
    path: PathBuf,
}

impl Debug for MediaSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaSource")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .finish_non_exhaustive()
    }
}

impl MediaSource {
    /// Open `path`, read its stream information and select the first video
    /// stream that has a registered decoder.
    ///
    /// Streams whose codec has no decoder are logged and skipped.
    ///
    /// # Errors
    ///
    /// - [`FrameDumpError::ContainerOpen`] if FFmpeg cannot be initialised or
    ///   the file cannot be opened as a container.
    /// - [`FrameDumpError::StreamProbe`] if the stream information cannot be
    ///   read.
    /// - [`FrameDumpError::NoVideoStream`] if no decodable video stream exists.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use framedump::MediaSource;
    ///
    /// let source = MediaSource::open("input.mp4")?;
    /// println!("decoding stream {}", source.video_stream_index());
    /// # Ok::<(), framedump::FrameDumpError>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FrameDumpError> {
        let path = path.as_ref().to_path_buf();

        log::info!("initializing all the containers, codecs and protocols");
        ffmpeg_next::init().map_err(|error| FrameDumpError::ContainerOpen {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        log::info!(
            "opening the input file ({}) and loading format (container) header",
            path.display()
        );
        let input = open_input(&path)?;

        let format = input.format().name().to_string();
        let duration_microseconds = input.duration();
        let bit_rate = input.bit_rate();
        log::info!("format {format}, duration {duration_microseconds} us, bit_rate {bit_rate}");

        let streams: Vec<StreamDescriptor> = input
            .streams()
            .map(|stream| describe_stream(&stream))
            .collect();

        for descriptor in &streams {
            log_stream(descriptor);
        }

        let video_stream_index = select_video_stream(&streams).ok_or_else(|| {
            log::error!("File {} does not contain a video stream!", path.display());
            FrameDumpError::NoVideoStream
        })?;

        let metadata = MediaMetadata {
            format,
            duration_microseconds,
            bit_rate,
            streams,
        };

        log::info!(
            "Opened media file: {} (streams={}, video_stream={})",
            path.display(),
            metadata.streams.len(),
            video_stream_index,
        );

        Ok(Self {
            input,
            metadata,
            video_stream_index,
            path,
        })
    }

    /// Metadata read while opening.
    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    /// Container index of the selected video stream.
    pub fn video_stream_index(&self) -> usize {
        self.video_stream_index
    }

    /// Descriptor of the selected video stream.
    pub fn video_stream(&self) -> &StreamDescriptor {
        // Descriptors are collected in container order, so index == position.
        &self.metadata.streams[self.video_stream_index]
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy the selected stream's codec parameters into a new codec context
    /// and open it as a video decoder.
    pub(crate) fn open_video_decoder(&self) -> Result<FfmpegVideoDecoder, FrameDumpError> {
        let stream = self
            .input
            .stream(self.video_stream_index)
            .ok_or(FrameDumpError::NoVideoStream)?;

        let context = CodecContext::from_parameters(stream.parameters()).map_err(|error| {
            FrameDumpError::CodecInit(format!(
                "failed to copy codec params to codec context: {error}"
            ))
        })?;

        context.decoder().video().map_err(|error| {
            FrameDumpError::CodecInit(format!("failed to open video decoder: {error}"))
        })
    }
}

impl PacketSource for MediaSource {
    /// Read the next packet of any stream.
    ///
    /// End of file yields `Ok(None)`. Other demuxer errors also end the
    /// input, after a warning.
    fn read_packet(&mut self) -> Result<Option<Packet>, FrameDumpError> {
        let mut packet = Packet::empty();
        match packet.read(&mut self.input) {
            Ok(()) => Ok(Some(packet)),
            Err(FfmpegError::Eof) => Ok(None),
            Err(error) => {
                log::warn!(
                    "stopping at demuxer error in {}: {error}",
                    self.path.display()
                );
                Ok(None)
            }
        }
    }
}

/// Open the container and read its stream information as two separate
/// steps, so that each failure maps to its own error.
fn open_input(path: &Path) -> Result<Input, FrameDumpError> {
    let container_error = |reason: String| FrameDumpError::ContainerOpen {
        path: path.to_path_buf(),
        reason,
    };

    let utf8_path = path
        .to_str()
        .ok_or_else(|| container_error("path is not valid UTF-8".to_string()))?;
    let c_path = CString::new(utf8_path)
        .map_err(|_| container_error("path contains an interior NUL byte".to_string()))?;

    let mut context: *mut AVFormatContext = ptr::null_mut();

    // SAFETY: `context` starts null so FFmpeg allocates it; on failure FFmpeg
    // frees it and leaves it null.
    let code = unsafe {
        avformat_open_input(&mut context, c_path.as_ptr(), ptr::null_mut(), ptr::null_mut())
    };
    if code != 0 {
        return Err(container_error(FfmpegError::from(code).to_string()));
    }

    // SAFETY: `context` was successfully opened above and is owned here.
    let code = unsafe { avformat_find_stream_info(context, ptr::null_mut()) };
    if code < 0 {
        // SAFETY: closing the context opened above; FFmpeg nulls the pointer.
        unsafe { avformat_close_input(&mut context) };
        return Err(FrameDumpError::StreamProbe {
            path: path.to_path_buf(),
            reason: FfmpegError::from(code).to_string(),
        });
    }

    // SAFETY: ownership of the opened context moves into `Input`, which
    // closes it on drop.
    Ok(unsafe { Input::wrap(context) })
}

fn describe_stream(stream: &Stream) -> StreamDescriptor {
    let parameters = stream.parameters();
    let kind = MediaKind::from(parameters.medium());
    let codec_id = parameters.id();
    // SAFETY: `parameters` borrows a live stream of the open input.
    let raw = unsafe { &*parameters.as_ptr() };

    let stream_parameters = match kind {
        MediaKind::Video => StreamParameters::Video {
            width: raw.width.max(0) as u32,
            height: raw.height.max(0) as u32,
        },
        MediaKind::Audio => StreamParameters::Audio {
            channels: raw.ch_layout.nb_channels.max(0) as u32,
            sample_rate: raw.sample_rate.max(0) as u32,
        },
        _ => StreamParameters::Other,
    };

    StreamDescriptor {
        index: stream.index(),
        kind,
        codec_id: codec_id.name().to_string(),
        decoder: ffmpeg_next::decoder::find(codec_id).map(|codec| codec.name().to_string()),
        bit_rate: raw.bit_rate,
        time_base: stream.time_base(),
        frame_rate: stream.rate(),
        start_time: stream.start_time(),
        duration: stream.duration(),
        parameters: stream_parameters,
    }
}

fn log_stream(stream: &StreamDescriptor) {
    log::debug!(
        "stream {}: time_base {}/{}, r_frame_rate {}/{}, start_time {}, duration {}",
        stream.index,
        stream.time_base.numerator(),
        stream.time_base.denominator(),
        stream.frame_rate.numerator(),
        stream.frame_rate.denominator(),
        stream.start_time,
        stream.duration,
    );

    let Some(decoder) = &stream.decoder else {
        log::warn!(
            "stream {}: unsupported codec {}, skipping",
            stream.index,
            stream.codec_id
        );
        return;
    };

    match stream.parameters {
        StreamParameters::Video { width, height } => {
            log::info!("stream {}: video, resolution {width} x {height}", stream.index);
        }
        StreamParameters::Audio {
            channels,
            sample_rate,
        } => {
            log::info!(
                "stream {}: audio, {channels} channels, sample rate {sample_rate}",
                stream.index
            );
        }
        StreamParameters::Other => {}
    }

    log::info!(
        "stream {}: codec {decoder} ID {} bit_rate {}",
        stream.index,
        stream.codec_id,
        stream.bit_rate,
    );
}
