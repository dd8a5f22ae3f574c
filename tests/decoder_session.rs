//! DecoderSession protocol tests against a scripted decoder.

mod common;

use std::ops::ControlFlow;

use framedump::{DecodeStep, DecodedFrame, DecoderSession, Drain, FrameDumpError};

use common::{ScriptedDecoder, VIDEO_STREAM, luma_sample, packet};

fn collect_into(
    frames: &mut Vec<u64>,
) -> impl FnMut(DecodedFrame) -> Result<ControlFlow<()>, FrameDumpError> + '_ {
    move |frame| {
        frames.push(frame.frame_number());
        Ok(ControlFlow::Continue(()))
    }
}

// ── pull ───────────────────────────────────────────────────────────

#[test]
fn pull_before_any_packet_would_block() {
    let mut session = DecoderSession::with_decoder(ScriptedDecoder::new(8, 8));
    assert!(matches!(session.pull().expect("pull"), DecodeStep::WouldBlock));
    assert_eq!(session.frames_decoded(), 0);
}

#[test]
fn pull_numbers_frames_from_one() {
    let mut session = DecoderSession::with_decoder(ScriptedDecoder::new(8, 8));
    session.feed(&packet(VIDEO_STREAM, 0)).expect("feed");

    match session.pull().expect("pull") {
        DecodeStep::Frame(frame) => {
            assert_eq!(frame.frame_number(), 1);
            assert_eq!((frame.width(), frame.height()), (8, 8));
            assert_eq!(frame.pts(), Some(0));
        }
        other => panic!("expected a frame, got {other:?}"),
    }
    assert!(matches!(session.pull().expect("pull"), DecodeStep::WouldBlock));
    assert_eq!(session.frames_decoded(), 1);
}

#[test]
fn pull_after_flush_reports_end_of_stream() {
    let mut session = DecoderSession::with_decoder(ScriptedDecoder::new(8, 8));
    let drain = session.finish(|_| Ok(ControlFlow::Continue(()))).expect("finish");
    assert_eq!(drain, Drain::EndOfStream);
    assert!(matches!(session.pull().expect("pull"), DecodeStep::EndOfStream));
}

// ── submit ─────────────────────────────────────────────────────────

#[test]
fn submit_drains_every_ready_frame() {
    let decoder = ScriptedDecoder::new(8, 8).frames_per_packet(3);
    let mut session = DecoderSession::with_decoder(decoder);

    let mut frames = Vec::new();
    let drain = session
        .submit(&packet(VIDEO_STREAM, 0), collect_into(&mut frames))
        .expect("submit");

    assert_eq!(drain, Drain::WouldBlock);
    assert_eq!(frames, vec![1, 2, 3]);
}

#[test]
fn frame_numbers_increase_across_packets() {
    let decoder = ScriptedDecoder::new(8, 8).frames_per_packet(2);
    let mut session = DecoderSession::with_decoder(decoder);

    let mut frames = Vec::new();
    for pts in 0..4 {
        session
            .submit(&packet(VIDEO_STREAM, pts), collect_into(&mut frames))
            .expect("submit");
    }

    assert_eq!(frames, (1..=8).collect::<Vec<_>>());
    assert!(frames.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn latency_frames_arrive_after_flush() {
    let decoder = ScriptedDecoder::new(8, 8).latency(2);
    let mut session = DecoderSession::with_decoder(decoder);

    let mut frames = Vec::new();
    for pts in 0..2 {
        let drain = session
            .submit(&packet(VIDEO_STREAM, pts), collect_into(&mut frames))
            .expect("submit");
        assert_eq!(drain, Drain::WouldBlock);
    }
    assert!(frames.is_empty(), "decoder is still holding its reference frames");

    session
        .submit(&packet(VIDEO_STREAM, 2), collect_into(&mut frames))
        .expect("submit");
    assert_eq!(frames, vec![1]);

    let drain = session.finish(collect_into(&mut frames)).expect("finish");
    assert_eq!(drain, Drain::EndOfStream);
    assert_eq!(frames, vec![1, 2, 3]);
}

#[test]
fn handler_break_stops_the_drain() {
    let decoder = ScriptedDecoder::new(8, 8).frames_per_packet(4);
    let mut session = DecoderSession::with_decoder(decoder);

    let mut seen = 0;
    let drain = session
        .submit(&packet(VIDEO_STREAM, 0), |_| {
            seen += 1;
            Ok(if seen == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        })
        .expect("submit");

    assert_eq!(drain, Drain::Stopped);
    assert_eq!(seen, 2);
    assert_eq!(session.frames_decoded(), 2);
}

#[test]
fn handler_error_is_propagated() {
    let mut session = DecoderSession::with_decoder(ScriptedDecoder::new(8, 8));
    let result = session.submit(&packet(VIDEO_STREAM, 0), |_| {
        Err(FrameDumpError::ExportWorker("handler failed".to_string()))
    });
    assert!(matches!(result, Err(FrameDumpError::ExportWorker(_))));
}

#[test]
fn frames_carry_decoded_pixels() {
    let mut session = DecoderSession::with_decoder(ScriptedDecoder::new(12, 6));
    session
        .submit(&packet(VIDEO_STREAM, 0), |frame| {
            let luma = frame.luma()?;
            assert_eq!(luma.row_bytes(), 12);
            assert_eq!(luma.height(), 6);
            assert_eq!(luma.get(5, 11), Some(luma_sample(0, 5, 11)));
            Ok(ControlFlow::Continue(()))
        })
        .expect("submit");
}

// ── failures ───────────────────────────────────────────────────────

#[test]
fn rejected_packet_is_reported() {
    let decoder = ScriptedDecoder::new(8, 8).reject_packet(1);
    let mut session = DecoderSession::with_decoder(decoder);

    session.feed(&packet(VIDEO_STREAM, 0)).expect("first packet");
    let result = session.feed(&packet(VIDEO_STREAM, 1));
    assert!(matches!(result, Err(FrameDumpError::DecodeRejected(_))));
}

#[test]
fn pull_failure_is_reported() {
    let decoder = ScriptedDecoder::new(8, 8).frames_per_packet(3).fail_pull(2);
    let mut session = DecoderSession::with_decoder(decoder);

    let mut frames = Vec::new();
    let result = session.submit(&packet(VIDEO_STREAM, 0), collect_into(&mut frames));
    assert!(matches!(result, Err(FrameDumpError::DecodePull(_))));
    assert_eq!(frames, vec![1]);
}
