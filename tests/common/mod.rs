// Scripted codec backend for integration tests.
//
// Fake JPEG XR files carry a real container header followed by a fixed
// image description:
//
//   0..8    "II" 0xBC 0x01, first IFD offset 8
//   8..24   pixel format GUID (little-endian fields)
//   24      color format
//   25      frame count
//   26..28  width (u16 LE)
//   28..30  height (u16 LE)
//   30..34  horizontal dpi (f32 LE)
//   34..38  vertical dpi (f32 LE)
//
// Decoded sample `c` of pixel `(x, y)` in frame `f` is
// `f * 31 + y * 7 + x * 3 + c` truncated to a byte.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Read;
use std::rc::Rc;

use jxrdecode_rs::codec::WriteSeek;
use jxrdecode_rs::{
    ByteSource, CodecFactory, CodecStatus, ColorFormat, DecodeParams, EncoderFactory,
    ImageRsEncoders, NativeConverter, NativeDecoder, NativeEncoder, PixelConverter,
    PixelFormatGuid, PixelSource, Rect, Resolution,
};

pub const DESCRIPTION_LEN: usize = 38;

#[derive(Debug, Clone, Copy)]
pub struct FakeImage {
    pub format: PixelFormatGuid,
    pub color_format: ColorFormat,
    pub frames: u8,
    pub width: u16,
    pub height: u16,
    pub dpi: (f32, f32),
}

impl FakeImage {
    pub fn new(format: PixelFormatGuid, color_format: ColorFormat) -> Self {
        Self {
            format,
            color_format,
            frames: 1,
            width: 4,
            height: 3,
            dpi: (96.0, 96.0),
        }
    }

    pub fn frames(mut self, frames: u8) -> Self {
        self.frames = frames;
        self
    }

    pub fn size(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![b'I', b'I', 0xBC, 0x01, 0x08, 0x00, 0x00, 0x00];
        out.extend_from_slice(&self.format.to_le_bytes());
        out.push(u32::from(self.color_format) as u8);
        out.push(self.frames);
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.dpi.0.to_le_bytes());
        out.extend_from_slice(&self.dpi.1.to_le_bytes());
        out
    }

    fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < DESCRIPTION_LEN {
            return None;
        }
        let mut guid = [0u8; 16];
        guid.copy_from_slice(&bytes[8..24]);
        let color_format = ColorFormat::try_from(u32::from(bytes[24])).ok()?;
        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let f32_at =
            |at: usize| f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        Some(Self {
            format: PixelFormatGuid::from_le_bytes(guid),
            color_format,
            frames: bytes[25],
            width: u16_at(26),
            height: u16_at(28),
            dpi: (f32_at(30), f32_at(34)),
        })
    }
}

/// Expected decoded bytes of one frame.
pub fn expected_pixels(frame: u32, width: u32, height: u32, bytes_per_pixel: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity((width * height * bytes_per_pixel) as usize);
    for y in 0..height {
        for x in 0..width {
            for c in 0..bytes_per_pixel {
                out.push(sample(frame, x, y, c));
            }
        }
    }
    out
}

fn sample(frame: u32, x: u32, y: u32, c: u32) -> u8 {
    (frame
        .wrapping_mul(31)
        .wrapping_add(y.wrapping_mul(7))
        .wrapping_add(x.wrapping_mul(3))
        .wrapping_add(c)) as u8
}

pub type CallLog = Rc<RefCell<Vec<String>>>;

fn record(log: &CallLog, entry: impl Into<String>) {
    log.borrow_mut().push(entry.into());
}

#[derive(Default)]
pub struct FakeCodecs {
    pub log: CallLog,
    pub fail_copy: bool,
}

impl FakeCodecs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_copy() -> Self {
        Self {
            fail_copy: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl CodecFactory for FakeCodecs {
    fn create_decoder<'a>(
        &self,
        mut source: ByteSource<'a>,
    ) -> Result<Box<dyn NativeDecoder + 'a>, CodecStatus> {
        let mut bytes = Vec::new();
        source
            .read_to_end(&mut bytes)
            .map_err(|_| CodecStatus::FileIo)?;
        let image = FakeImage::parse(&bytes).ok_or(CodecStatus::UnsupportedFormat)?;
        record(&self.log, "open");
        Ok(Box::new(FakeDecoder {
            image,
            selected: 0,
            bytes_per_pixel: None,
            fail_copy: self.fail_copy,
            log: self.log.clone(),
        }))
    }

    fn create_converter(
        &self,
        _decoder: &dyn NativeDecoder,
        extension: &str,
        pixel_format: PixelFormatGuid,
    ) -> Result<Box<dyn NativeConverter>, CodecStatus> {
        record(&self.log, format!("converter {extension}"));
        Ok(Box::new(PixelConverter::new(pixel_format, extension)?))
    }
}

struct FakeDecoder {
    image: FakeImage,
    selected: u32,
    bytes_per_pixel: Option<u32>,
    fail_copy: bool,
    log: CallLog,
}

impl NativeDecoder for FakeDecoder {
    fn pixel_format(&self) -> PixelFormatGuid {
        self.image.format
    }

    fn color_format(&self) -> ColorFormat {
        self.image.color_format
    }

    fn size(&self) -> Result<(u32, u32), CodecStatus> {
        Ok((u32::from(self.image.width), u32::from(self.image.height)))
    }

    fn resolution(&self) -> Result<Resolution, CodecStatus> {
        Ok(Resolution {
            x: self.image.dpi.0,
            y: self.image.dpi.1,
        })
    }

    fn black_white(&self) -> bool {
        self.image.format == PixelFormatGuid::BLACK_WHITE
    }

    fn frame_count(&self) -> Result<u32, CodecStatus> {
        match self.image.frames {
            0 => Err(CodecStatus::IndexNotFound),
            n => Ok(u32::from(n)),
        }
    }

    fn select_frame(&mut self, index: u32) -> Result<(), CodecStatus> {
        record(&self.log, format!("select {index}"));
        self.selected = index;
        Ok(())
    }

    fn configure(&mut self, params: &DecodeParams) -> Result<(), CodecStatus> {
        self.bytes_per_pixel = Some(params.bits_per_unit / 8);
        Ok(())
    }

    fn copy(&mut self, rect: Rect, dest: &mut [u8], stride: usize) -> Result<(), CodecStatus> {
        record(&self.log, format!("copy {}", self.selected));
        if self.fail_copy {
            return Err(CodecStatus::BufferOverflow);
        }
        let bytes_per_pixel = self.bytes_per_pixel.ok_or(CodecStatus::NotInitialized)?;
        for y in 0..rect.height {
            let row = &mut dest[y as usize * stride..];
            for x in 0..rect.width {
                for c in 0..bytes_per_pixel {
                    row[(x * bytes_per_pixel + c) as usize] =
                        sample(self.selected, rect.x + x, rect.y + y, c);
                }
            }
        }
        Ok(())
    }
}

/// Wraps the `image` crate encoders and records every call.
#[derive(Default)]
pub struct RecordingEncoders {
    pub log: CallLog,
}

impl RecordingEncoders {
    pub fn sharing(log: &CallLog) -> Self {
        Self { log: log.clone() }
    }
}

impl EncoderFactory for RecordingEncoders {
    fn create_encoder<'w>(
        &self,
        extension: &str,
        destination: Box<dyn WriteSeek + 'w>,
    ) -> Result<Box<dyn NativeEncoder + 'w>, CodecStatus> {
        let inner = ImageRsEncoders.create_encoder(extension, destination)?;
        record(&self.log, format!("encoder {extension}"));
        Ok(Box::new(RecordingEncoder {
            inner,
            log: self.log.clone(),
        }))
    }
}

struct RecordingEncoder<'w> {
    inner: Box<dyn NativeEncoder + 'w>,
    log: CallLog,
}

impl NativeEncoder for RecordingEncoder<'_> {
    fn set_pixel_format(&mut self, format: PixelFormatGuid) -> Result<(), CodecStatus> {
        self.inner.set_pixel_format(format)
    }

    fn set_black_white(&mut self, black_white: bool) {
        self.inner.set_black_white(black_white)
    }

    fn set_size(&mut self, width: u32, height: u32) -> Result<(), CodecStatus> {
        record(&self.log, format!("size {width}x{height}"));
        self.inner.set_size(width, height)
    }

    fn set_resolution(&mut self, resolution: Resolution) -> Result<(), CodecStatus> {
        self.inner.set_resolution(resolution)
    }

    fn size(&self) -> (u32, u32) {
        self.inner.size()
    }

    fn write_source(
        &mut self,
        source: &mut dyn PixelSource,
        rect: Rect,
    ) -> Result<(), CodecStatus> {
        record(&self.log, "write");
        self.inner.write_source(source, rect)
    }

    fn release(self: Box<Self>) -> Result<(), CodecStatus> {
        record(&self.log, "close");
        self.inner.release()
    }
}
