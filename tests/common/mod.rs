//! In-memory packet sources and a scripted decoder for driving the pipeline
//! without media files.

#![allow(dead_code)]

use std::collections::VecDeque;

use ffmpeg_next::{Error as FfmpegError, Packet, error::EAGAIN, format::Pixel, frame::Video};
use framedump::{DecodedFrame, FrameDumpError, PacketSource, VideoDecoder};

pub const VIDEO_STREAM: usize = 0;
pub const AUDIO_STREAM: usize = 1;

pub fn packet(stream: usize, pts: i64) -> Packet {
    let mut packet = Packet::copy(&[0u8; 32]);
    packet.set_stream(stream);
    packet.set_pts(Some(pts));
    packet
}

/// Serves a fixed list of packets, then reports end of input.
pub struct VecSource {
    packets: VecDeque<Packet>,
    pub reads: usize,
}

impl VecSource {
    pub fn new(packets: Vec<Packet>) -> Self {
        Self {
            packets: packets.into(),
            reads: 0,
        }
    }

    /// `count` packets of the video stream.
    pub fn video(count: usize) -> Self {
        Self::new(
            (0..count)
                .map(|index| packet(VIDEO_STREAM, index as i64))
                .collect(),
        )
    }

    /// `count` video packets, each followed by `audio_per_video` audio packets.
    pub fn interleaved(count: usize, audio_per_video: usize) -> Self {
        let mut packets = Vec::new();
        for index in 0..count {
            packets.push(packet(VIDEO_STREAM, index as i64));
            for _ in 0..audio_per_video {
                packets.push(packet(AUDIO_STREAM, index as i64));
            }
        }
        Self::new(packets)
    }

    pub fn remaining(&self) -> usize {
        self.packets.len()
    }
}

impl PacketSource for VecSource {
    fn read_packet(&mut self) -> Result<Option<Packet>, FrameDumpError> {
        self.reads += 1;
        Ok(self.packets.pop_front())
    }
}

/// Luma sample the scripted decoder writes for `sequence` at (`row`, `column`).
pub fn luma_sample(sequence: u64, row: usize, column: usize) -> u8 {
    ((row * 7 + column * 3) as u64 + sequence * 11) as u8
}

/// Allocate a YUV420P frame with the deterministic luma pattern of
/// `sequence` and neutral chroma.
pub fn patterned_frame(width: u32, height: u32, sequence: u64) -> Video {
    let mut frame = Video::new(Pixel::YUV420P, width, height);

    let stride = frame.stride(0);
    let luma = frame.data_mut(0);
    for row in 0..height as usize {
        for column in 0..stride {
            luma[row * stride + column] = if column < width as usize {
                luma_sample(sequence, row, column)
            } else {
                // Padding bytes, never part of an exported row.
                0xEE
            };
        }
    }
    for plane in 1..3 {
        frame.data_mut(plane).fill(128);
    }

    frame.set_pts(Some(sequence as i64));
    frame
}

/// A single YUV420P frame filled with one luma value and neutral chroma.
pub fn flat_frame(width: u32, height: u32, luma: u8, frame_number: u64) -> DecodedFrame {
    let mut frame = Video::new(Pixel::YUV420P, width, height);
    frame.data_mut(0).fill(luma);
    frame.data_mut(1).fill(128);
    frame.data_mut(2).fill(128);
    DecodedFrame::new(frame, frame_number)
}

/// A decoder whose output schedule is fixed up front.
///
/// Every accepted packet queues `frames_per_packet` pictures. The decoder
/// keeps `latency` pictures back until end of input is signalled, like a
/// codec holding reference frames for reordering.
pub struct ScriptedDecoder {
    width: u32,
    height: u32,
    frames_per_packet: usize,
    latency: usize,
    reject_packet: Option<usize>,
    fail_pull: Option<u64>,
    queued: VecDeque<u64>,
    next_sequence: u64,
    packets_fed: usize,
    pulls_succeeded: u64,
    finished: bool,
}

impl ScriptedDecoder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames_per_packet: 1,
            latency: 0,
            reject_packet: None,
            fail_pull: None,
            queued: VecDeque::new(),
            next_sequence: 0,
            packets_fed: 0,
            pulls_succeeded: 0,
            finished: false,
        }
    }

    pub fn frames_per_packet(mut self, frames: usize) -> Self {
        self.frames_per_packet = frames;
        self
    }

    pub fn latency(mut self, frames: usize) -> Self {
        self.latency = frames;
        self
    }

    /// Refuse the packet at zero-based position `index`.
    pub fn reject_packet(mut self, index: usize) -> Self {
        self.reject_packet = Some(index);
        self
    }

    /// Fail with a generic error instead of producing picture `number`
    /// (1-based).
    pub fn fail_pull(mut self, number: u64) -> Self {
        self.fail_pull = Some(number);
        self
    }

    pub fn packets_fed(&self) -> usize {
        self.packets_fed
    }

    pub fn buffered(&self) -> usize {
        self.queued.len()
    }
}

impl VideoDecoder for ScriptedDecoder {
    fn feed(&mut self, _packet: &Packet) -> Result<(), FfmpegError> {
        if self.reject_packet == Some(self.packets_fed) {
            return Err(FfmpegError::InvalidData);
        }
        self.packets_fed += 1;
        for _ in 0..self.frames_per_packet {
            self.queued.push_back(self.next_sequence);
            self.next_sequence += 1;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), FfmpegError> {
        self.finished = true;
        Ok(())
    }

    fn pull(&mut self, frame: &mut Video) -> Result<(), FfmpegError> {
        if self.fail_pull == Some(self.pulls_succeeded + 1) {
            return Err(FfmpegError::Bug);
        }
        if !self.finished && self.queued.len() <= self.latency {
            return Err(FfmpegError::Other { errno: EAGAIN });
        }
        let Some(sequence) = self.queued.pop_front() else {
            return Err(FfmpegError::Eof);
        };

        *frame = patterned_frame(self.width, self.height, sequence);
        self.pulls_succeeded += 1;
        Ok(())
    }
}
