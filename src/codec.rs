//! Contracts of the native codec.
//!
//! Decoding the JPEG XR bitstream, converting pixel layouts and writing
//! output files are performed by codec objects behind these traits. A
//! backend wraps its own handles in types implementing them and hands a
//! factory to [`ImageHandle::open`](crate::ImageHandle::open) and
//! [`OutputSink::create`](crate::OutputSink::create). All methods are
//! blocking; failures carry the codec's [`CodecStatus`].

use std::io::{Seek, Write};

use crate::converter::PixelConverter;
use crate::error::CodecStatus;
use crate::pixel_format::{ColorFormat, PixelFormatGuid};
use crate::resolver::DecodeParams;
use crate::source::ByteSource;
use crate::{Rect, Resolution};

pub trait WriteSeek: Write + Seek {}

impl<T: Write + Seek + ?Sized> WriteSeek for T {}

/// An opened decoder bound to one byte source.
pub trait NativeDecoder {
    /// Pixel format stored in the stream.
    fn pixel_format(&self) -> PixelFormatGuid;

    /// Internal color format of the coded image.
    fn color_format(&self) -> ColorFormat;

    /// Full image size of the currently selected frame.
    fn size(&self) -> Result<(u32, u32), CodecStatus>;

    fn resolution(&self) -> Result<Resolution, CodecStatus>;

    fn black_white(&self) -> bool;

    fn frame_count(&self) -> Result<u32, CodecStatus>;

    fn select_frame(&mut self, index: u32) -> Result<(), CodecStatus>;

    /// Applies normalized decode parameters. Called once, right after open.
    fn configure(&mut self, params: &DecodeParams) -> Result<(), CodecStatus>;

    /// Decodes `rect` of the selected frame into `dest`, rows `stride`
    /// bytes apart.
    fn copy(&mut self, rect: Rect, dest: &mut [u8], stride: usize) -> Result<(), CodecStatus>;
}

/// Converts decoded pixels to the layout an output codec expects.
pub trait NativeConverter {
    fn output_format(&self) -> PixelFormatGuid;

    fn copy(
        &mut self,
        decoder: &mut dyn NativeDecoder,
        rect: Rect,
        dest: &mut [u8],
        stride: usize,
    ) -> Result<(), CodecStatus>;
}

/// Pixel data an encoder pulls from while writing.
pub trait PixelSource {
    fn output_format(&self) -> PixelFormatGuid;

    fn copy(&mut self, rect: Rect, dest: &mut [u8], stride: usize) -> Result<(), CodecStatus>;
}

pub trait NativeEncoder {
    fn set_pixel_format(&mut self, format: PixelFormatGuid) -> Result<(), CodecStatus>;

    fn set_black_white(&mut self, black_white: bool);

    fn set_size(&mut self, width: u32, height: u32) -> Result<(), CodecStatus>;

    fn set_resolution(&mut self, resolution: Resolution) -> Result<(), CodecStatus>;

    fn size(&self) -> (u32, u32);

    /// Pulls `rect` from `source` and encodes it.
    fn write_source(&mut self, source: &mut dyn PixelSource, rect: Rect)
    -> Result<(), CodecStatus>;

    /// Flushes and finalizes the output.
    fn release(self: Box<Self>) -> Result<(), CodecStatus>;
}

/// Creates decoders and format converters.
pub trait CodecFactory {
    fn create_decoder<'a>(
        &self,
        source: ByteSource<'a>,
    ) -> Result<Box<dyn NativeDecoder + 'a>, CodecStatus>;

    /// Creates a converter from `pixel_format` to what the encoder for
    /// `extension` accepts. Defaults to the built-in [`PixelConverter`].
    fn create_converter(
        &self,
        decoder: &dyn NativeDecoder,
        extension: &str,
        pixel_format: PixelFormatGuid,
    ) -> Result<Box<dyn NativeConverter>, CodecStatus> {
        let _ = decoder;
        Ok(Box::new(PixelConverter::new(pixel_format, extension)?))
    }
}

/// Creates output codecs keyed by file extension (without the leading dot).
pub trait EncoderFactory {
    fn create_encoder<'w>(
        &self,
        extension: &str,
        destination: Box<dyn WriteSeek + 'w>,
    ) -> Result<Box<dyn NativeEncoder + 'w>, CodecStatus>;
}
