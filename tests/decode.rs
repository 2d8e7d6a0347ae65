//! Decode path: opening, frame addressing, metadata and raw extraction.

mod common;

use std::io::Write;

use common::{expected_pixels, FakeCodecs, FakeImage};
use jxrdecode_rs::{
    ByteSource, ColorFormat, FormatError, ImageHandle, ImageRsEncoders, JxrError, Pipeline,
    PipelineConfig, PixelFormatGuid,
};
use proptest::prelude::*;

fn format_error(err: JxrError) -> FormatError {
    match err {
        JxrError::Format(e) => e,
        other => panic!("expected a format error, got {other:?}"),
    }
}

#[test]
fn test_frame_count_at_least_one() {
    let codecs = FakeCodecs::new();
    let bytes = FakeImage::new(PixelFormatGuid::RGB_24, ColorFormat::Rgb)
        .frames(3)
        .to_bytes();
    let handle = ImageHandle::open(&codecs, ByteSource::from_bytes(&bytes)).unwrap();
    assert_eq!(handle.frame_count().unwrap(), 3);
}

#[test]
fn test_corrupt_frame_directory() {
    let codecs = FakeCodecs::new();
    let bytes = FakeImage::new(PixelFormatGuid::RGB_24, ColorFormat::Rgb)
        .frames(0)
        .to_bytes();
    let handle = ImageHandle::open(&codecs, ByteSource::from_bytes(&bytes)).unwrap();
    assert!(matches!(
        format_error(handle.frame_count().unwrap_err()),
        FormatError::FrameCount(_)
    ));
}

#[test]
fn test_out_of_range_frame() {
    let codecs = FakeCodecs::new();
    let bytes = FakeImage::new(PixelFormatGuid::GRAY_8, ColorFormat::YOnly)
        .frames(2)
        .to_bytes();
    let mut handle = ImageHandle::open(&codecs, ByteSource::from_bytes(&bytes)).unwrap();
    handle.select_frame(1).unwrap();
    assert_eq!(
        format_error(handle.select_frame(2).unwrap_err()),
        FormatError::FrameOutOfRange { index: 2, count: 2 }
    );
    // The failed selection leaves the previous frame current.
    assert_eq!(handle.current_frame(), 1);
}

#[test]
fn test_decode_is_idempotent() {
    let codecs = FakeCodecs::new();
    let bytes = FakeImage::new(PixelFormatGuid::BGRA_32, ColorFormat::Yuv444)
        .frames(2)
        .size(9, 5)
        .to_bytes();
    let mut handle = ImageHandle::open(&codecs, ByteSource::from_bytes(&bytes)).unwrap();
    handle.select_frame(1).unwrap();
    let first = handle.decode_frame().unwrap();
    let second = handle.decode_frame().unwrap();
    assert_eq!(first, second);
    assert_eq!(first, expected_pixels(1, 9, 5, 4));

    let mut reopened = ImageHandle::open(&codecs, ByteSource::from_bytes(&bytes)).unwrap();
    reopened.select_frame(1).unwrap();
    assert_eq!(reopened.decode_frame().unwrap(), first);
}

#[test]
fn test_metadata_matches_read_length() {
    let codecs = FakeCodecs::new();
    for format in [
        PixelFormatGuid::GRAY_8,
        PixelFormatGuid::GRAY_16,
        PixelFormatGuid::BGR_24,
        PixelFormatGuid::RGB_48,
        PixelFormatGuid::RGBA_64,
        PixelFormatGuid::RGBA_FLOAT_128,
    ] {
        let bytes = FakeImage::new(format, ColorFormat::Yuv444)
            .size(7, 3)
            .to_bytes();
        let mut handle = ImageHandle::open(&codecs, ByteSource::from_bytes(&bytes)).unwrap();
        let metadata = handle.metadata().unwrap();
        let mut buffer = vec![0u8; metadata.frame_len() + 16];
        let written = handle.read_frame(&mut buffer).unwrap();
        assert_eq!(
            written,
            (metadata.width * metadata.height * metadata.bytes_per_pixel) as usize,
            "{format}"
        );
        assert_eq!(metadata.resolution.x, 96.0);
    }
}

#[test]
fn test_grayscale_not_upgraded() {
    let codecs = FakeCodecs::new();
    for (format, bytes_per_pixel) in [(PixelFormatGuid::GRAY_8, 1), (PixelFormatGuid::GRAY_16, 2)]
    {
        let bytes = FakeImage::new(format, ColorFormat::Yuv420).to_bytes();
        let handle = ImageHandle::open(&codecs, ByteSource::from_bytes(&bytes)).unwrap();
        assert_eq!(handle.descriptor().color_format, ColorFormat::YOnly);
        assert_eq!(handle.pixel_format(), format);
        assert_eq!(handle.metadata().unwrap().bytes_per_pixel, bytes_per_pixel);
    }
}

#[test]
fn test_cmyk_decodes_as_rgb() {
    let codecs = FakeCodecs::new();
    let bytes = FakeImage::new(PixelFormatGuid::CMYK_32, ColorFormat::Cmyk).to_bytes();
    let mut handle = ImageHandle::open(&codecs, ByteSource::from_bytes(&bytes)).unwrap();
    assert_eq!(handle.descriptor().color_format, ColorFormat::Rgb);
    assert_eq!(handle.pixel_format(), PixelFormatGuid::RGB_24);
    assert_eq!(handle.metadata().unwrap().bytes_per_pixel, 3);
    assert_eq!(handle.decode_frame().unwrap(), expected_pixels(0, 4, 3, 3));
}

#[test]
fn test_non_jxr_rejected() {
    let codecs = FakeCodecs::new();
    for bytes in [
        b"\x89PNG\r\n\x1a\n-rest-of-a-png".to_vec(),
        b"II*\x00\x08\x00\x00\x00".to_vec(),
        Vec::new(),
    ] {
        let err = ImageHandle::open(&codecs, ByteSource::from_bytes(&bytes)).unwrap_err();
        assert_eq!(format_error(err), FormatError::NotJpegXr);
    }
    // Nothing reached the codec.
    assert!(codecs.calls().is_empty());
}

#[test]
fn test_truncated_description_is_decoder_init() {
    let codecs = FakeCodecs::new();
    let bytes = FakeImage::new(PixelFormatGuid::RGB_24, ColorFormat::Rgb).to_bytes();
    let err = ImageHandle::open(&codecs, ByteSource::from_bytes(&bytes[..20])).unwrap_err();
    assert!(matches!(format_error(err), FormatError::DecoderInit(_)));
}

#[test]
fn test_copy_failure() {
    let codecs = FakeCodecs::failing_copy();
    let bytes = FakeImage::new(PixelFormatGuid::RGB_24, ColorFormat::Rgb).to_bytes();
    let pipeline = Pipeline::new(&codecs, &ImageRsEncoders);
    let err = pipeline
        .decode_first_frame(ByteSource::from_bytes(&bytes))
        .unwrap_err();
    assert!(matches!(format_error(err), FormatError::Copy(_)));
}

#[test]
fn test_decode_all_frames_in_order() {
    let codecs = FakeCodecs::new();
    let bytes = FakeImage::new(PixelFormatGuid::RGB_24, ColorFormat::Rgb)
        .frames(3)
        .to_bytes();
    let pipeline = Pipeline::new(&codecs, &ImageRsEncoders);
    let frames = pipeline
        .decode_all_frames(ByteSource::from_bytes(&bytes))
        .unwrap();
    assert_eq!(frames.len(), 3);
    for (index, decoded) in frames.iter().enumerate() {
        assert_eq!(decoded.frame, index as u32);
        assert_eq!(decoded.metadata.frame_count, 3);
        assert_eq!(decoded.pixels, expected_pixels(index as u32, 4, 3, 3));
    }
    let selects: Vec<String> = codecs
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("select"))
        .collect();
    assert_eq!(selects, ["select 0", "select 1", "select 2"]);
}

#[test]
fn test_decode_into_caller_buffer() {
    let codecs = FakeCodecs::new();
    let bytes = FakeImage::new(PixelFormatGuid::GRAY_8, ColorFormat::YOnly)
        .frames(2)
        .to_bytes();
    let pipeline = Pipeline::new(&codecs, &ImageRsEncoders);
    let mut dest = vec![0xEEu8; 20];
    let written = pipeline
        .decode_frame_into(ByteSource::from_bytes(&bytes), 1, &mut dest, 4)
        .unwrap();
    assert_eq!(written, 12);
    assert_eq!(&dest[..4], &[0xEE; 4]);
    assert_eq!(&dest[4..16], expected_pixels(1, 4, 3, 1).as_slice());
    assert_eq!(&dest[16..], &[0xEE; 4]);

    let err = pipeline
        .decode_frame_into(ByteSource::from_bytes(&bytes), 0, &mut dest, 10)
        .unwrap_err();
    assert_eq!(
        format_error(err),
        FormatError::BufferTooSmall {
            required: 12,
            actual: 10
        }
    );
}

#[test]
fn test_frame_size_limit() {
    let codecs = FakeCodecs::new();
    let bytes = FakeImage::new(PixelFormatGuid::RGB_24, ColorFormat::Rgb)
        .size(100, 100)
        .to_bytes();
    let config = PipelineConfig::default().with_max_frame_bytes(1000);
    let pipeline = Pipeline::with_config(&codecs, &ImageRsEncoders, config);
    let err = pipeline
        .decode_first_frame(ByteSource::from_bytes(&bytes))
        .unwrap_err();
    assert_eq!(
        format_error(err),
        FormatError::FrameTooLarge {
            required: 30_000,
            limit: 1000
        }
    );
    // Metadata is still available.
    let metadata = pipeline
        .image_metadata(ByteSource::from_bytes(&bytes))
        .unwrap();
    assert_eq!(metadata.frame_len(), 30_000);
}

#[test]
fn test_memory_range_source() {
    let codecs = FakeCodecs::new();
    let image = FakeImage::new(PixelFormatGuid::RGB_24, ColorFormat::Rgb).to_bytes();
    let mut container = vec![0xAAu8; 13];
    container.extend_from_slice(&image);
    container.extend_from_slice(&[0x55; 7]);
    let source = ByteSource::from_bytes_range(&container, 13, image.len()).unwrap();
    let mut handle = ImageHandle::open(&codecs, source).unwrap();
    assert_eq!(handle.decode_frame().unwrap(), expected_pixels(0, 4, 3, 3));
}

proptest! {
    #[test]
    fn select_frame_succeeds_iff_in_range(frames in 1u8..8, index in 0u32..12) {
        let codecs = FakeCodecs::new();
        let bytes = FakeImage::new(PixelFormatGuid::RGB_24, ColorFormat::Rgb)
            .frames(frames)
            .to_bytes();
        let mut handle = ImageHandle::open(&codecs, ByteSource::from_bytes(&bytes)).unwrap();
        let count = handle.frame_count().unwrap();
        prop_assert!(count >= 1);
        prop_assert!(handle.select_frame(count - 1).is_ok());
        prop_assert!(handle.select_frame(count).is_err());
        let result = handle.select_frame(index);
        prop_assert_eq!(result.is_ok(), index < count);
        if let Err(err) = result {
            prop_assert!(err.is_format());
        }
    }

    #[test]
    fn file_offset_matches_sliced_buffer(
        prefix in proptest::collection::vec(any::<u8>(), 0..64),
        width in 1u16..16,
        height in 1u16..16,
        frames in 1u8..4,
    ) {
        let codecs = FakeCodecs::new();
        let image = FakeImage::new(PixelFormatGuid::BGR_24, ColorFormat::Yuv444)
            .frames(frames)
            .size(width, height)
            .to_bytes();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&prefix).unwrap();
        file.write_all(&image).unwrap();
        file.flush().unwrap();

        let pipeline = Pipeline::new(&codecs, &ImageRsEncoders);
        let from_file = pipeline
            .decode_all_frames(ByteSource::from_path_at(file.path(), prefix.len() as u64).unwrap())
            .unwrap();
        let all = std::fs::read(file.path()).unwrap();
        let from_slice = pipeline
            .decode_all_frames(ByteSource::from_bytes(&all[prefix.len()..]))
            .unwrap();
        prop_assert_eq!(from_file, from_slice);
    }
}
