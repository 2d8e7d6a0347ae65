//! Pixel format normalization.
//!
//! Given the pixel format and internal color format the codec reports right
//! after opening a stream, [`resolve`] computes the full set of decode
//! parameters the codec must be configured with before any frame is read:
//!
//! 1. forward lookup of the reported format;
//! 2. 8/16-bit grayscale is decoded as luma only, format unchanged;
//! 3. CMYK content is decoded to 24bpp RGB;
//! 4. a second forward lookup on the (possibly rewritten) format supplies
//!    color format, bit depth and bits per unit;
//! 5. alpha mode follows the format's alpha flag;
//! 6. thumbnails and region-of-interest cropping are disabled, so the full
//!    image is always decoded;
//! 7. remaining codec knobs are pinned to fixed defaults.

use crate::constants::{ALPHA_MODE_IMAGE_AND_ALPHA, ALPHA_MODE_NONE};
use crate::error::FormatError;
use crate::pixel_format::{self, BitDepth, ColorFormat, PixelFormatGuid};
use crate::Rect;

/// What the codec reports about the stream it just opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeFormat {
    pub pixel_format: PixelFormatGuid,
    pub color_format: ColorFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitstreamFormat {
    Spatial,
    Frequency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subbands {
    All,
    NoFlexbits,
    NoHighpass,
    DcOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    None,
    FlipVertical,
    FlipHorizontal,
    FlipBoth,
    Rotate90,
    Rotate90FlipVertical,
    Rotate90FlipHorizontal,
    Rotate90FlipBoth,
}

/// Normalized pixel layout of decoded frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormatDescriptor {
    pub format: PixelFormatGuid,
    pub color_format: ColorFormat,
    pub bits_per_unit: u32,
    pub bit_depth: BitDepth,
    pub has_alpha: bool,
    pub is_bgr: bool,
}

impl PixelFormatDescriptor {
    pub fn bytes_per_pixel(&self) -> u32 {
        self.bits_per_unit / 8
    }
}

/// Configuration applied to the native decoder before reading frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeParams {
    pub pixel_format: PixelFormatGuid,
    pub color_format: ColorFormat,
    pub bit_depth: BitDepth,
    pub bits_per_unit: u32,
    pub alpha_mode: u8,
    pub rgb: bool,
    pub has_alpha: bool,
    pub is_bgr: bool,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub skip_flexbits: bool,
    pub roi: Rect,
    pub bitstream_format: BitstreamFormat,
    pub subbands: Subbands,
    pub ignore_overlap: bool,
    pub orientation: Orientation,
    pub post_proc_strength: u8,
    pub verbose: bool,
}

impl DecodeParams {
    pub fn descriptor(&self) -> PixelFormatDescriptor {
        PixelFormatDescriptor {
            format: self.pixel_format,
            color_format: self.color_format,
            bits_per_unit: self.bits_per_unit,
            bit_depth: self.bit_depth,
            has_alpha: self.has_alpha,
            is_bgr: self.is_bgr,
        }
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        self.bits_per_unit / 8
    }
}

/// Computes decode parameters for a freshly opened `width` x `height` image.
pub fn resolve(native: NativeFormat, width: u32, height: u32) -> Result<DecodeParams, FormatError> {
    let mut pixel_format = native.pixel_format;
    let mut color_format = native.color_format;
    let mut rgb = false;

    pixel_format::lookup(&pixel_format).ok_or(FormatError::UnknownPixelFormat(pixel_format))?;

    if pixel_format == PixelFormatGuid::GRAY_8 || pixel_format == PixelFormatGuid::GRAY_16 {
        color_format = ColorFormat::YOnly;
    } else if color_format == ColorFormat::Cmyk && pixel_format != PixelFormatGuid::RGB_24 {
        color_format = ColorFormat::Rgb;
        pixel_format = PixelFormatGuid::RGB_24;
        rgb = true;
    }

    let info =
        pixel_format::lookup(&pixel_format).ok_or(FormatError::UnknownPixelFormat(pixel_format))?;

    let alpha_mode = if info.has_alpha() {
        ALPHA_MODE_IMAGE_AND_ALPHA
    } else {
        ALPHA_MODE_NONE
    };

    log::debug!(
        "resolved {} ({:?}) to {} ({:?}, {} bits per unit, alpha mode {})",
        native.pixel_format,
        native.color_format,
        info.name,
        color_format,
        info.bits_per_unit,
        alpha_mode
    );

    Ok(DecodeParams {
        pixel_format,
        // The table is authoritative once the format has been rewritten.
        color_format: info.color_format,
        bit_depth: info.bit_depth,
        bits_per_unit: info.bits_per_unit,
        alpha_mode,
        rgb,
        has_alpha: info.has_alpha(),
        is_bgr: info.is_bgr(),
        thumbnail_width: width,
        thumbnail_height: height,
        skip_flexbits: false,
        roi: Rect::full(width, height),
        bitstream_format: BitstreamFormat::Spatial,
        subbands: Subbands::All,
        ignore_overlap: false,
        orientation: Orientation::None,
        post_proc_strength: 0,
        verbose: false,
    })
}
