//! FormatConverter tests on synthetic YUV420P frames.

mod common;

use ffmpeg_next::format::Pixel;
use framedump::{
    ConversionOptions, DecodedFrame, FormatConverter, FrameDumpError, packed_bytes_per_pixel,
};

use common::{flat_frame, patterned_frame};

#[test]
fn packed_formats_have_known_sizes() {
    assert_eq!(packed_bytes_per_pixel(Pixel::GRAY8), Some(1));
    assert_eq!(packed_bytes_per_pixel(Pixel::RGB24), Some(3));
    assert_eq!(packed_bytes_per_pixel(Pixel::BGRA), Some(4));
    assert_eq!(packed_bytes_per_pixel(Pixel::YUV420P), None);
}

#[test]
fn conversion_preserves_resolution() {
    let converter = FormatConverter::default();
    for (width, height) in [(2, 2), (16, 9), (33, 17), (640, 360)] {
        let frame = flat_frame(width, height, 90, 1);
        let converted = converter.convert(&frame).expect("convert");

        assert_eq!((converted.width(), converted.height()), (width, height));
        assert_eq!(converted.format(), Pixel::RGB24);
        assert_eq!(converted.bytes_per_pixel(), 3);

        let packed = converted.packed().expect("packed plane");
        assert_eq!(packed.row_bytes(), width as usize * 3);
        assert_eq!(packed.height(), height as usize);
    }
}

#[test]
fn conversion_keeps_frame_number() {
    let converted = FormatConverter::default()
        .convert(&flat_frame(8, 8, 0, 42))
        .expect("convert");
    assert_eq!(converted.frame_number(), 42);
}

#[test]
fn conversion_does_not_touch_the_source() {
    let frame = DecodedFrame::new(patterned_frame(24, 12, 3), 1);
    let before = frame.luma().expect("luma").to_packed();

    FormatConverter::default().convert(&frame).expect("convert");

    assert_eq!(frame.luma().expect("luma").to_packed(), before);
    assert_eq!(frame.format(), Pixel::YUV420P);
}

#[test]
fn neutral_chroma_converts_to_gray() {
    let converted = FormatConverter::default()
        .convert(&flat_frame(16, 16, 128, 1))
        .expect("convert");
    let packed = converted.packed().expect("packed plane");

    for row in packed.rows() {
        for pixel in row.chunks_exact(3) {
            assert!(
                pixel[0].abs_diff(pixel[1]) <= 2 && pixel[1].abs_diff(pixel[2]) <= 2,
                "expected gray, got {pixel:?}"
            );
            assert!((118..=142).contains(&pixel[0]), "expected mid gray, got {pixel:?}");
        }
    }
}

#[test]
fn brighter_luma_gives_brighter_rgb() {
    let converter = FormatConverter::default();
    let dark = converter.convert(&flat_frame(8, 8, 40, 1)).expect("convert");
    let light = converter.convert(&flat_frame(8, 8, 220, 2)).expect("convert");

    let dark = dark.packed().expect("packed").get(0, 0).expect("pixel");
    let light = light.packed().expect("packed").get(0, 0).expect("pixel");
    assert!(light > dark);
}

#[test]
fn planar_target_is_rejected() {
    let options = ConversionOptions {
        target: Pixel::YUV444P,
        ..ConversionOptions::default()
    };
    let result = FormatConverter::new(options).convert(&flat_frame(8, 8, 0, 1));
    assert!(matches!(result, Err(FrameDumpError::UnsupportedPixelFormat(_))));
}

#[test]
fn unexpected_source_format_still_converts() {
    let options = ConversionOptions {
        expected_source: Pixel::NV12,
        ..ConversionOptions::default()
    };
    let converted = FormatConverter::new(options)
        .convert(&flat_frame(8, 8, 128, 1))
        .expect("convert despite the format mismatch");
    assert_eq!(converted.format(), Pixel::RGB24);
}
