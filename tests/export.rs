//! GrayExporter, ColorExporter and FrameExporter tests.

mod common;

use std::fs;

use ffmpeg_next::format::Pixel;
use framedump::{
    ColorExporter, ConversionOptions, FormatConverter, FrameDumpError, FrameExporter,
    GrayExporter, OutputLayout, PlaneView, pgm_header, ppm_header,
};

use common::{flat_frame, luma_sample, patterned_frame};

fn layout(directory: &std::path::Path) -> OutputLayout {
    OutputLayout::new(directory)
}

// ── grayscale ──────────────────────────────────────────────────────

#[test]
fn gray_export_names_file_after_frame_number() {
    let directory = tempfile::tempdir().expect("temp dir");
    let buffer = [7u8; 6];
    let plane = PlaneView::new(&buffer, 3, 3, 2).expect("valid plane");

    let path = GrayExporter::new(layout(directory.path()))
        .export(&plane, 4)
        .expect("export graymap");

    assert_eq!(path, directory.path().join("frame-4.pgm"));
    let bytes = fs::read(&path).expect("read graymap");
    assert_eq!(bytes.len(), pgm_header(3, 2).len() + 6);
}

#[test]
fn gray_export_copies_luma_verbatim() {
    let directory = tempfile::tempdir().expect("temp dir");
    let frame = framedump::DecodedFrame::new(patterned_frame(37, 9, 2), 1);
    let luma = frame.luma().expect("luma plane");
    assert!(luma.stride() >= 37);

    let path = GrayExporter::new(layout(directory.path()))
        .export(&luma, frame.frame_number())
        .expect("export graymap");

    let image = image::open(&path).expect("decode graymap").into_luma8();
    assert_eq!(image.dimensions(), (37, 9));
    for (column, row, pixel) in image.enumerate_pixels() {
        assert_eq!(pixel.0[0], luma_sample(2, row as usize, column as usize));
    }
}

#[test]
fn gray_export_reports_unwritable_path() {
    let directory = tempfile::tempdir().expect("temp dir");
    let missing = directory.path().join("does-not-exist");
    let buffer = [0u8; 4];
    let plane = PlaneView::new(&buffer, 2, 2, 2).expect("valid plane");

    let error = GrayExporter::new(layout(&missing))
        .export(&plane, 1)
        .expect_err("directory is missing");
    match error {
        FrameDumpError::Io { path, .. } => assert_eq!(path, missing.join("frame-1.pgm")),
        other => panic!("unexpected error: {other:?}"),
    }
}

// ── colour ─────────────────────────────────────────────────────────

#[test]
fn color_export_writes_rgb_at_source_resolution() {
    let directory = tempfile::tempdir().expect("temp dir");
    let frame = flat_frame(18, 10, 128, 3);

    let path = ColorExporter::new(layout(directory.path()), ConversionOptions::default())
        .export(&frame)
        .expect("export pixmap");

    assert_eq!(path, directory.path().join("frame-3.ppm"));
    let bytes = fs::read(&path).expect("read pixmap");
    assert_eq!(bytes.len(), ppm_header(18, 10).len() + 18 * 10 * 3);

    let image = image::open(&path).expect("decode pixmap").into_rgb8();
    assert_eq!(image.dimensions(), (18, 10));
    for pixel in image.pixels() {
        for channel in pixel.0 {
            assert!((118..=142).contains(&channel), "neutral gray, got {channel}");
        }
    }
}

#[test]
fn color_write_rejects_non_rgb_frames() {
    let directory = tempfile::tempdir().expect("temp dir");
    let options = ConversionOptions {
        target: Pixel::RGBA,
        ..ConversionOptions::default()
    };
    let converted = FormatConverter::new(options)
        .convert(&flat_frame(8, 8, 64, 1))
        .expect("convert to RGBA");

    let result = ColorExporter::new(layout(directory.path()), ConversionOptions::default())
        .write(&converted);
    assert!(matches!(result, Err(FrameDumpError::UnsupportedPixelFormat(_))));
    assert!(!directory.path().join("frame-1.ppm").exists());
}

// ── both rasters ───────────────────────────────────────────────────

#[test]
fn frame_export_writes_both_files() {
    let directory = tempfile::tempdir().expect("temp dir");
    let frame = flat_frame(16, 16, 200, 7);

    let files = FrameExporter::new(layout(directory.path()), ConversionOptions::default())
        .export(&frame)
        .expect("export frame");

    assert_eq!(files.frame_number, 7);
    assert_eq!(files.gray_path, directory.path().join("frame-7.pgm"));
    assert_eq!(files.color_path, directory.path().join("frame-7.ppm"));
    assert!(files.gray_path.is_file());
    assert!(files.color_path.is_file());
}

#[test]
fn frame_export_is_deterministic() {
    let first = tempfile::tempdir().expect("temp dir");
    let second = tempfile::tempdir().expect("temp dir");

    for directory in [&first, &second] {
        let frame = framedump::DecodedFrame::new(patterned_frame(33, 17, 5), 1);
        FrameExporter::new(layout(directory.path()), ConversionOptions::default())
            .export(&frame)
            .expect("export frame");
    }

    for name in ["frame-1.pgm", "frame-1.ppm"] {
        let a = fs::read(first.path().join(name)).expect("read first run");
        let b = fs::read(second.path().join(name)).expect("read second run");
        assert_eq!(a, b, "{name} differs between runs");
    }
}

#[test]
fn custom_base_name_is_used() {
    let directory = tempfile::tempdir().expect("temp dir");
    let layout = OutputLayout {
        directory: directory.path().to_path_buf(),
        base_name: "clip".to_string(),
    };

    let files = FrameExporter::new(layout, ConversionOptions::default())
        .export(&flat_frame(4, 4, 16, 2))
        .expect("export frame");
    assert_eq!(files.gray_path, directory.path().join("clip-2.pgm"));
    assert_eq!(files.color_path, directory.path().join("clip-2.ppm"));
}
