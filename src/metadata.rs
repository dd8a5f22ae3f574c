//! Container and stream metadata.
//!
//! [`MediaMetadata`] and its [`StreamDescriptor`]s are read once, when a
//! [`MediaSource`](crate::MediaSource) is opened, and never change afterwards.
//! [`select_video_stream`] holds the stream selection rule.

use std::time::Duration;

use ffmpeg_next::{Rational, media::Type};

/// Container-level metadata.
#[derive(Debug, Clone)]
#[must_use]
pub struct MediaMetadata {
    /// Short name of the container format (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
    /// Container duration in microseconds, as reported by the demuxer.
    /// Negative when unknown.
    pub duration_microseconds: i64,
    /// Container bit rate in bits per second (0 when unknown).
    pub bit_rate: i64,
    /// Every stream of the container, in container order.
    pub streams: Vec<StreamDescriptor>,
}

impl MediaMetadata {
    /// Container duration, or [`Duration::ZERO`] when the demuxer did not
    /// report one.
    pub fn duration(&self) -> Duration {
        if self.duration_microseconds > 0 {
            Duration::from_micros(self.duration_microseconds as u64)
        } else {
            Duration::ZERO
        }
    }

    /// Descriptors of the given kind, in container order.
    pub fn streams_of(&self, kind: MediaKind) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter().filter(move |stream| stream.kind == kind)
    }
}

/// Media type of an elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
    Subtitle,
    Data,
    Attachment,
    Unknown,
}

impl From<Type> for MediaKind {
    fn from(medium: Type) -> Self {
        match medium {
            Type::Video => MediaKind::Video,
            Type::Audio => MediaKind::Audio,
            Type::Subtitle => MediaKind::Subtitle,
            Type::Data => MediaKind::Data,
            Type::Attachment => MediaKind::Attachment,
            Type::Unknown => MediaKind::Unknown,
        }
    }
}

/// Type-specific stream parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamParameters {
    Video {
        /// Coded width in pixels.
        width: u32,
        /// Coded height in pixels.
        height: u32,
    },
    Audio {
        /// Number of channels.
        channels: u32,
        /// Samples per second.
        sample_rate: u32,
    },
    Other,
}

/// Metadata of one elementary stream.
#[derive(Debug, Clone)]
#[must_use]
pub struct StreamDescriptor {
    /// Index of the stream in the container; packets carry the same index.
    pub index: usize,
    /// Media type.
    pub kind: MediaKind,
    /// Name of the codec id (e.g. `"h264"`), or `"none"`.
    pub codec_id: String,
    /// Name of the registered decoder, `None` when FFmpeg has no decoder for
    /// the codec id. Such streams are never selected.
    pub decoder: Option<String>,
    /// Codec bit rate in bits per second (0 when unknown).
    pub bit_rate: i64,
    /// Stream time base.
    pub time_base: Rational,
    /// Real base frame rate (`r_frame_rate`).
    pub frame_rate: Rational,
    /// First presentation timestamp, in time-base units.
    pub start_time: i64,
    /// Stream duration in time-base units.
    pub duration: i64,
    /// Type-specific parameters.
    pub parameters: StreamParameters,
}

impl StreamDescriptor {
    /// `true` when FFmpeg has a decoder for this stream's codec.
    pub fn is_decodable(&self) -> bool {
        self.decoder.is_some()
    }

    /// Video dimensions, if this is a video stream.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self.parameters {
            StreamParameters::Video { width, height } => Some((width, height)),
            _ => None,
        }
    }
}

/// Choose the stream the pipeline decodes: the first video stream, in
/// container order, that has a registered decoder.
///
/// Returns that stream's container index, or `None` when no stream
/// qualifies. Later video streams are ignored.
pub fn select_video_stream(streams: &[StreamDescriptor]) -> Option<usize> {
    streams
        .iter()
        .find(|stream| stream.kind == MediaKind::Video && stream.is_decodable())
        .map(|stream| stream.index)
}
