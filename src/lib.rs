//! JPEG XR decode and transcode pipeline.
//!
//! The bitstream codec itself is an external collaborator reached through
//! the traits in [`codec`]. This crate owns everything around it: byte
//! source windows, pixel format normalization, frame addressing and the
//! decoder → converter → encoder transcode chain.

pub mod cli;
pub mod codec;
pub mod config;
pub mod constants;
pub mod container;
pub mod converter;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod pipeline;
pub mod pixel_format;
pub mod resolver;
pub mod source;

pub use codec::{
    CodecFactory, EncoderFactory, NativeConverter, NativeDecoder, NativeEncoder, PixelSource,
};
pub use config::{FrameNaming, PipelineConfig, RawOutput};
pub use converter::{PixelConverter, TranscodeConverter};
pub use decoder::ImageHandle;
pub use encoder::{ImageRsEncoders, OutputFormat, OutputSink};
pub use error::{CodecStatus, ErrorKind, FormatError, JxrError, Result, TranscodeError};
pub use pipeline::{DecodedFrame, FrameOutput, Pipeline, Stage};
pub use pixel_format::{BitDepth, ColorFormat, PixelFormatGuid, PixelFormatInfo};
pub use resolver::{DecodeParams, NativeFormat, PixelFormatDescriptor};
pub use source::ByteSource;

/// Physical resolution in dots per inch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Resolution {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Per-image metadata. `width * height * bytes_per_pixel` is the exact size
/// of one decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImageMetadata {
    pub resolution: Resolution,
    pub width: u32,
    pub height: u32,
    pub bytes_per_pixel: u32,
    pub frame_count: u32,
}

impl ImageMetadata {
    pub fn stride(&self) -> usize {
        self.width as usize * self.bytes_per_pixel as usize
    }

    pub fn frame_len(&self) -> usize {
        self.stride() * self.height as usize
    }
}
