//! Format conversion between the decoded frame and an output codec.

use crate::codec::{CodecFactory, NativeConverter, NativeDecoder, PixelSource};
use crate::decoder::ImageHandle;
use crate::encoder::{self, OutputFormat};
use crate::error::{CodecStatus, FormatError, Result};
use crate::pixel_format::{self, ColorFormat, PixelFormatGuid};
use crate::Rect;

/// Binds the currently selected frame of an [`ImageHandle`] to the pixel
/// layout an output extension needs. Building one decodes nothing; pixels
/// are pulled by the encoder through [`PixelSource::copy`].
pub struct TranscodeConverter<'h, 'a> {
    handle: &'h mut ImageHandle<'a>,
    native: Box<dyn NativeConverter>,
    extension: String,
}

impl<'h, 'a> TranscodeConverter<'h, 'a> {
    pub fn build(
        codecs: &dyn CodecFactory,
        handle: &'h mut ImageHandle<'a>,
        extension: &str,
    ) -> Result<Self> {
        let extension = encoder::normalize_extension(extension);
        let pixel_format = handle.pixel_format();
        let native = codecs
            .create_converter(handle.native(), &extension, pixel_format)
            .map_err(|status| match status {
                CodecStatus::IndexNotFound => FormatError::UnsupportedExtension(extension.clone()),
                status => FormatError::ConverterInit {
                    extension: extension.clone(),
                    status,
                },
            })?;
        log::info!("created format converter for extension: {}", extension);
        log::debug!("converting {} to {}", pixel_format, native.output_format());
        Ok(Self {
            handle,
            native,
            extension,
        })
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The image this converter reads from.
    pub fn source(&self) -> &ImageHandle<'a> {
        &*self.handle
    }
}

impl PixelSource for TranscodeConverter<'_, '_> {
    fn output_format(&self) -> PixelFormatGuid {
        self.native.output_format()
    }

    fn copy(
        &mut self,
        rect: Rect,
        dest: &mut [u8],
        stride: usize,
    ) -> std::result::Result<(), CodecStatus> {
        self.native.copy(self.handle.native_mut(), rect, dest, stride)
    }
}

/// Sample positions of one decoded pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    samples_per_pixel: usize,
    sample_bytes: usize,
    /// Index of each output channel within the input pixel.
    order: [usize; 4],
}

impl Layout {
    fn bytes_per_pixel(&self) -> usize {
        self.samples_per_pixel * self.sample_bytes
    }
}

/// Built-in converter for integer gray, RGB and RGBA layouts.
///
/// Swizzles BGR to RGB, drops padding, narrows 16-bit samples for 8-bit
/// only targets and drops alpha for targets without it. Gray is expanded
/// to RGB for color-only targets; color sources are refused by gray-only
/// targets.
#[derive(Debug, Clone)]
pub struct PixelConverter {
    from: PixelFormatGuid,
    to: PixelFormatGuid,
    input: Layout,
    output_sample_bytes: usize,
    output_channels: usize,
}

impl PixelConverter {
    pub fn new(from: PixelFormatGuid, extension: &str) -> std::result::Result<Self, CodecStatus> {
        let target = OutputFormat::from_extension(extension).ok_or(CodecStatus::IndexNotFound)?;
        let info = pixel_format::lookup(&from).ok_or(CodecStatus::UnsupportedFormat)?;
        let sample_bytes = info
            .bit_depth
            .integer_sample_bytes()
            .ok_or(CodecStatus::UnsupportedFormat)?;
        if info.is_premultiplied() || info.bits_per_unit as usize % (8 * sample_bytes) != 0 {
            return Err(CodecStatus::UnsupportedFormat);
        }
        let samples_per_pixel = info.bits_per_unit as usize / (8 * sample_bytes);

        let (order, channels) = match (info.color_format, info.channels) {
            (ColorFormat::YOnly, 1) => ([0, 0, 0, 0], 1),
            (ColorFormat::Rgb, 3) if info.is_bgr() => ([2, 1, 0, 0], 3),
            (ColorFormat::Rgb, 3) => ([0, 1, 2, 0], 3),
            (ColorFormat::Rgb, 4) if info.is_bgr() => ([2, 1, 0, 3], 4),
            (ColorFormat::Rgb, 4) => ([0, 1, 2, 3], 4),
            _ => return Err(CodecStatus::UnsupportedFormat),
        };
        if samples_per_pixel < channels {
            return Err(CodecStatus::UnsupportedFormat);
        }

        let output_sample_bytes = if sample_bytes == 2 && target.supports_16bit() {
            2
        } else {
            1
        };
        if channels > 1 && !target.supports_color() {
            return Err(CodecStatus::UnsupportedFormat);
        }
        let output_channels = match channels {
            1 if !target.supports_gray() => 3,
            4 if !target.supports_alpha() => 3,
            n => n,
        };
        let to = match (output_channels, output_sample_bytes) {
            (1, 1) => PixelFormatGuid::GRAY_8,
            (1, _) => PixelFormatGuid::GRAY_16,
            (3, 1) => PixelFormatGuid::RGB_24,
            (3, _) => PixelFormatGuid::RGB_48,
            (_, 1) => PixelFormatGuid::RGBA_32,
            (_, _) => PixelFormatGuid::RGBA_64,
        };

        Ok(Self {
            from,
            to,
            input: Layout {
                samples_per_pixel,
                sample_bytes,
                order,
            },
            output_sample_bytes,
            output_channels,
        })
    }

    pub fn input_format(&self) -> PixelFormatGuid {
        self.from
    }

    pub fn is_passthrough(&self) -> bool {
        self.from == self.to
    }

    pub fn output_bytes_per_pixel(&self) -> usize {
        self.output_channels * self.output_sample_bytes
    }

    /// Converts `width` pixels of one input row into `dst`.
    fn convert_row(&self, src: &[u8], dst: &mut [u8], width: usize) {
        let in_bpp = self.input.bytes_per_pixel();
        let out_bpp = self.output_bytes_per_pixel();
        let in_sample = self.input.sample_bytes;
        let out_sample = self.output_sample_bytes;
        for x in 0..width {
            let pixel = &src[x * in_bpp..(x + 1) * in_bpp];
            let out = &mut dst[x * out_bpp..(x + 1) * out_bpp];
            for c in 0..self.output_channels {
                let at = self.input.order[c] * in_sample;
                let sample = &pixel[at..at + in_sample];
                let target = &mut out[c * out_sample..(c + 1) * out_sample];
                if in_sample == out_sample {
                    target.copy_from_slice(sample);
                } else {
                    target[0] = (u16::from_ne_bytes([sample[0], sample[1]]) >> 8) as u8;
                }
            }
        }
    }
}

impl NativeConverter for PixelConverter {
    fn output_format(&self) -> PixelFormatGuid {
        self.to
    }

    fn copy(
        &mut self,
        decoder: &mut dyn NativeDecoder,
        rect: Rect,
        dest: &mut [u8],
        stride: usize,
    ) -> std::result::Result<(), CodecStatus> {
        let width = rect.width as usize;
        let height = rect.height as usize;
        if width == 0 || height == 0 {
            return Ok(());
        }
        let row_len = width * self.output_bytes_per_pixel();
        if stride < row_len || dest.len() < (height - 1) * stride + row_len {
            return Err(CodecStatus::BufferOverflow);
        }
        if self.is_passthrough() {
            return decoder.copy(rect, dest, stride);
        }

        let in_stride = width * self.input.bytes_per_pixel();
        let mut decoded = vec![0u8; in_stride * height];
        decoder.copy(rect, &mut decoded, in_stride)?;
        for (y, src) in decoded.chunks_exact(in_stride).enumerate() {
            let dst = &mut dest[y * stride..y * stride + row_len];
            self.convert_row(src, dst, width);
        }
        Ok(())
    }
}
