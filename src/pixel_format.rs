//! Pixel format registry.
//!
//! JPEG XR identifies pixel formats by GUID. Most share the common prefix
//! `6FDDC324-4E03-4BFE-B185-3D77768DC9xx` and differ only in the last byte;
//! the 32bpp RGB(A) variants carry their own GUIDs. The table below is the
//! forward lookup used to derive channel count, color format, bit depth and
//! storage size for a format reported by the codec.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormatGuid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

const fn pk(last: u8) -> PixelFormatGuid {
    PixelFormatGuid::new(
        0x6fdd_c324,
        0x4e03,
        0x4bfe,
        [0xb1, 0x85, 0x3d, 0x77, 0x76, 0x8d, 0xc9, last],
    )
}

impl PixelFormatGuid {
    pub const DONT_CARE: Self = pk(0x00);
    pub const BLACK_WHITE: Self = pk(0x05);
    pub const GRAY_8: Self = pk(0x08);
    pub const RGB555_16: Self = pk(0x09);
    pub const RGB565_16: Self = pk(0x0a);
    pub const GRAY_16: Self = pk(0x0b);
    pub const BGR_24: Self = pk(0x0c);
    pub const RGB_24: Self = pk(0x0d);
    pub const BGR_32: Self = pk(0x0e);
    pub const BGRA_32: Self = pk(0x0f);
    pub const PBGRA_32: Self = pk(0x10);
    pub const GRAY_FLOAT_32: Self = pk(0x11);
    pub const RGB_FIXED_48: Self = pk(0x12);
    pub const GRAY_FIXED_16: Self = pk(0x13);
    pub const RGB101010_32: Self = pk(0x14);
    pub const RGB_48: Self = pk(0x15);
    pub const RGBA_64: Self = pk(0x16);
    pub const PRGBA_64: Self = pk(0x17);
    pub const RGB_FIXED_96: Self = pk(0x18);
    pub const RGBA_FLOAT_128: Self = pk(0x19);
    pub const PRGBA_FLOAT_128: Self = pk(0x1a);
    pub const RGB_FLOAT_128: Self = pk(0x1b);
    pub const CMYK_32: Self = pk(0x1c);
    pub const RGBA_FIXED_64: Self = pk(0x1d);
    pub const RGBA_FIXED_128: Self = pk(0x1e);
    pub const CMYK_64: Self = pk(0x1f);
    pub const CMYK_ALPHA_40: Self = pk(0x2c);
    pub const CMYK_ALPHA_80: Self = pk(0x2d);
    pub const RGBA_HALF_64: Self = pk(0x3a);
    pub const RGB_HALF_48: Self = pk(0x3b);
    pub const RGBE_32: Self = pk(0x3d);
    pub const GRAY_HALF_16: Self = pk(0x3e);
    pub const GRAY_FIXED_32: Self = pk(0x3f);
    pub const RGB_FIXED_64: Self = pk(0x40);
    pub const RGB_FIXED_128: Self = pk(0x41);
    pub const RGB_HALF_64: Self = pk(0x42);
    pub const RGB_32: Self = PixelFormatGuid::new(
        0xd98c_6b95,
        0x3efe,
        0x47d6,
        [0xbb, 0x25, 0xeb, 0x17, 0x48, 0xab, 0x0c, 0xf1],
    );
    pub const RGBA_32: Self = PixelFormatGuid::new(
        0xf5c7_ad2d,
        0x6a8d,
        0x43dd,
        [0xa7, 0xa8, 0xa2, 0x99, 0x35, 0x26, 0x1a, 0xe9],
    );
    pub const PRGBA_32: Self = PixelFormatGuid::new(
        0x3cc4_a650,
        0xa527,
        0x4d37,
        [0xa9, 0x16, 0x31, 0x42, 0xc7, 0xeb, 0xed, 0xba],
    );

    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// Reads a GUID stored in the little-endian Windows layout used by the
    /// JPEG XR container's PixelFormat tag.
    pub fn from_le_bytes(bytes: [u8; 16]) -> Self {
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&bytes[8..16]);
        Self {
            data1: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_le_bytes([bytes[4], bytes[5]]),
            data3: u16::from_le_bytes([bytes[6], bytes[7]]),
            data4,
        }
    }

    pub fn to_le_bytes(self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[0..4].copy_from_slice(&self.data1.to_le_bytes());
        out[4..6].copy_from_slice(&self.data2.to_le_bytes());
        out[6..8].copy_from_slice(&self.data3.to_le_bytes());
        out[8..16].copy_from_slice(&self.data4);
        out
    }
}

impl fmt::Display for PixelFormatGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.data4;
        write!(
            f,
            "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}}}",
            self.data1, self.data2, self.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
        )
    }
}

/// Internal color format of the codec (`COLORFORMAT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum ColorFormat {
    YOnly = 0,
    Yuv420 = 1,
    Yuv422 = 2,
    Yuv444 = 3,
    Cmyk = 4,
    NComponent = 6,
    Rgb = 7,
    Rgbe = 8,
}

/// Sample bit depth (`BITDEPTH_BITS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum BitDepth {
    Bd1 = 0,
    Bd8 = 1,
    Bd16 = 2,
    Bd16S = 3,
    Bd16F = 4,
    Bd32 = 5,
    Bd32S = 6,
    Bd32F = 7,
    Bd5 = 8,
    Bd10 = 9,
    Bd565 = 10,
}

impl BitDepth {
    /// Bytes per sample for byte-aligned integer depths.
    pub fn integer_sample_bytes(self) -> Option<usize> {
        match self {
            BitDepth::Bd8 => Some(1),
            BitDepth::Bd16 => Some(2),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelFormatFlags(u32);

impl PixelFormatFlags {
    pub const NONE: Self = Self(0);
    pub const HAS_ALPHA: Self = Self(0x0000_0010);
    pub const PREMULTIPLIED: Self = Self(0x0000_0020);
    pub const BGR: Self = Self(0x0000_1000);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

/// One row of the forward lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormatInfo {
    pub guid: PixelFormatGuid,
    pub name: &'static str,
    pub channels: u8,
    pub color_format: ColorFormat,
    pub bit_depth: BitDepth,
    pub bits_per_unit: u32,
    pub flags: PixelFormatFlags,
}

impl PixelFormatInfo {
    pub fn has_alpha(&self) -> bool {
        self.flags.contains(PixelFormatFlags::HAS_ALPHA)
    }

    pub fn is_bgr(&self) -> bool {
        self.flags.contains(PixelFormatFlags::BGR)
    }

    pub fn is_premultiplied(&self) -> bool {
        self.flags.contains(PixelFormatFlags::PREMULTIPLIED)
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        self.bits_per_unit / 8
    }
}

const ALPHA: PixelFormatFlags = PixelFormatFlags::HAS_ALPHA;
const PREMUL_ALPHA: PixelFormatFlags =
    PixelFormatFlags::HAS_ALPHA.union(PixelFormatFlags::PREMULTIPLIED);
const BGR: PixelFormatFlags = PixelFormatFlags::BGR;
const NONE: PixelFormatFlags = PixelFormatFlags::NONE;

macro_rules! format_row {
    ($guid:ident, $name:literal, $ch:literal, $cf:ident, $bd:ident, $bits:literal, $flags:expr) => {
        PixelFormatInfo {
            guid: PixelFormatGuid::$guid,
            name: $name,
            channels: $ch,
            color_format: ColorFormat::$cf,
            bit_depth: BitDepth::$bd,
            bits_per_unit: $bits,
            flags: $flags,
        }
    };
}

pub static PIXEL_FORMATS: &[PixelFormatInfo] = &[
    format_row!(BLACK_WHITE, "BlackWhite", 1, YOnly, Bd1, 1, NONE),
    format_row!(GRAY_8, "8bppGray", 1, YOnly, Bd8, 8, NONE),
    format_row!(GRAY_16, "16bppGray", 1, YOnly, Bd16, 16, NONE),
    format_row!(GRAY_FIXED_16, "16bppGrayFixedPoint", 1, YOnly, Bd16S, 16, NONE),
    format_row!(GRAY_HALF_16, "16bppGrayHalf", 1, YOnly, Bd16F, 16, NONE),
    format_row!(GRAY_FIXED_32, "32bppGrayFixedPoint", 1, YOnly, Bd32S, 32, NONE),
    format_row!(GRAY_FLOAT_32, "32bppGrayFloat", 1, YOnly, Bd32F, 32, NONE),
    format_row!(RGB555_16, "16bppRGB555", 3, Rgb, Bd5, 16, NONE),
    format_row!(RGB565_16, "16bppRGB565", 3, Rgb, Bd565, 16, NONE),
    format_row!(RGB101010_32, "32bppRGB101010", 3, Rgb, Bd10, 32, NONE),
    format_row!(RGB_24, "24bppRGB", 3, Rgb, Bd8, 24, NONE),
    format_row!(BGR_24, "24bppBGR", 3, Rgb, Bd8, 24, BGR),
    format_row!(RGB_32, "32bppRGB", 3, Rgb, Bd8, 32, NONE),
    format_row!(BGR_32, "32bppBGR", 3, Rgb, Bd8, 32, BGR),
    format_row!(RGBA_32, "32bppRGBA", 4, Rgb, Bd8, 32, ALPHA),
    format_row!(BGRA_32, "32bppBGRA", 4, Rgb, Bd8, 32, ALPHA.union(BGR)),
    format_row!(PRGBA_32, "32bppPRGBA", 4, Rgb, Bd8, 32, PREMUL_ALPHA),
    format_row!(PBGRA_32, "32bppPBGRA", 4, Rgb, Bd8, 32, PREMUL_ALPHA.union(BGR)),
    format_row!(RGB_48, "48bppRGB", 3, Rgb, Bd16, 48, NONE),
    format_row!(RGBA_64, "64bppRGBA", 4, Rgb, Bd16, 64, ALPHA),
    format_row!(PRGBA_64, "64bppPRGBA", 4, Rgb, Bd16, 64, PREMUL_ALPHA),
    format_row!(RGB_FIXED_48, "48bppRGBFixedPoint", 3, Rgb, Bd16S, 48, NONE),
    format_row!(RGB_HALF_48, "48bppRGBHalf", 3, Rgb, Bd16F, 48, NONE),
    format_row!(RGB_HALF_64, "64bppRGBHalf", 3, Rgb, Bd16F, 64, NONE),
    format_row!(RGBA_HALF_64, "64bppRGBAHalf", 4, Rgb, Bd16F, 64, ALPHA),
    format_row!(RGB_FIXED_64, "64bppRGBFixedPoint", 3, Rgb, Bd16S, 64, NONE),
    format_row!(RGBA_FIXED_64, "64bppRGBAFixedPoint", 4, Rgb, Bd16S, 64, ALPHA),
    format_row!(RGB_FIXED_96, "96bppRGBFixedPoint", 3, Rgb, Bd32S, 96, NONE),
    format_row!(RGB_FIXED_128, "128bppRGBFixedPoint", 3, Rgb, Bd32S, 128, NONE),
    format_row!(RGBA_FIXED_128, "128bppRGBAFixedPoint", 4, Rgb, Bd32S, 128, ALPHA),
    format_row!(RGB_FLOAT_128, "128bppRGBFloat", 3, Rgb, Bd32F, 128, NONE),
    format_row!(RGBA_FLOAT_128, "128bppRGBAFloat", 4, Rgb, Bd32F, 128, ALPHA),
    format_row!(PRGBA_FLOAT_128, "128bppPRGBAFloat", 4, Rgb, Bd32F, 128, PREMUL_ALPHA),
    format_row!(RGBE_32, "32bppRGBE", 3, Rgbe, Bd8, 32, NONE),
    format_row!(CMYK_32, "32bppCMYK", 4, Cmyk, Bd8, 32, NONE),
    format_row!(CMYK_64, "64bppCMYK", 4, Cmyk, Bd16, 64, NONE),
    format_row!(CMYK_ALPHA_40, "40bppCMYKAlpha", 5, Cmyk, Bd8, 40, ALPHA),
    format_row!(CMYK_ALPHA_80, "80bppCMYKAlpha", 5, Cmyk, Bd16, 80, ALPHA),
];

/// Forward lookup: GUID to format record.
pub fn lookup(guid: &PixelFormatGuid) -> Option<&'static PixelFormatInfo> {
    PIXEL_FORMATS.iter().find(|info| info.guid == *guid)
}
