//! OutputSink and the built-in encoders.

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use image::codecs::bmp::BmpEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::codecs::tga::TgaEncoder;
use image::codecs::tiff::TiffEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageError};

use crate::codec::{EncoderFactory, NativeEncoder, PixelSource, WriteSeek};
use crate::decoder::ImageHandle;
use crate::error::{CodecStatus, FormatError, Result, TranscodeError};
use crate::pixel_format::{self, BitDepth, PixelFormatGuid};
use crate::{Rect, Resolution};

/// Strips a leading dot and lowercases, so `".PNG"` and `"png"` agree.
pub fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

/// Normalized extension of `path`. A path without one has no encoder.
pub fn output_extension(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .map(|ext| normalize_extension(&ext.to_string_lossy()))
        .unwrap_or_default();
    if extension.is_empty() {
        return Err(FormatError::UnsupportedExtension(extension).into());
    }
    Ok(extension)
}

/// Output file created on its first write or seek.
struct DeferredFile {
    path: PathBuf,
    file: Option<BufWriter<File>>,
}

impl DeferredFile {
    fn open(&mut self) -> io::Result<&mut BufWriter<File>> {
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                let file = File::create(&self.path)?;
                log::info!("created output stream for file: {}", self.path.display());
                BufWriter::new(file)
            }
        };
        Ok(self.file.insert(file))
    }
}

impl Write for DeferredFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.open()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.file {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl Seek for DeferredFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.open()?.seek(pos)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Created,
    Initialized,
    Written,
    Failed,
}

impl SinkState {
    fn name(self) -> &'static str {
        match self {
            SinkState::Created => "created",
            SinkState::Initialized => "initialized",
            SinkState::Written => "written",
            SinkState::Failed => "failed",
        }
    }
}

/// One output codec bound to a destination stream.
///
/// Usage is strictly `create` → [`initialize_from`](Self::initialize_from)
/// → [`write`](Self::write) → [`close`](Self::close). `close` consumes the
/// sink, so the output is finalized at most once; dropping a sink without
/// closing it releases the codec without finalizing.
pub struct OutputSink<'w> {
    encoder: Box<dyn NativeEncoder + 'w>,
    extension: String,
    state: SinkState,
}

impl<'w> OutputSink<'w> {
    pub fn create<W: Write + Seek + 'w>(
        encoders: &dyn EncoderFactory,
        destination: W,
        extension: &str,
    ) -> Result<Self> {
        let extension = normalize_extension(extension);
        let encoder = encoders
            .create_encoder(&extension, Box::new(destination))
            .map_err(|status| match status {
                CodecStatus::UnsupportedFormat | CodecStatus::IndexNotFound => {
                    FormatError::UnsupportedExtension(extension.clone())
                }
                status => FormatError::EncoderInit(status),
            })?;
        log::info!("created image encoder for extension: {}", extension);
        Ok(Self {
            encoder,
            extension,
            state: SinkState::Created,
        })
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    fn expect_state(&self, expected: SinkState) -> Result<()> {
        if self.state != expected {
            return Err(FormatError::SinkState {
                expected: expected.name(),
                actual: self.state.name(),
            }
            .into());
        }
        Ok(())
    }

    /// Copies pixel format, black/white flag, size and resolution from the
    /// decoded image.
    pub fn initialize_from(&mut self, handle: &ImageHandle<'_>) -> Result<()> {
        self.expect_state(SinkState::Created)?;
        let resolution = handle.resolution()?;
        let encoder = &mut self.encoder;
        encoder
            .set_pixel_format(handle.pixel_format())
            .map_err(FormatError::EncoderSettings)?;
        encoder.set_black_white(handle.black_white());
        encoder
            .set_size(handle.width(), handle.height())
            .map_err(FormatError::EncoderSettings)?;
        encoder
            .set_resolution(resolution)
            .map_err(FormatError::EncoderSettings)?;
        self.state = SinkState::Initialized;
        Ok(())
    }

    /// Pulls the full image rectangle through `source` and encodes it.
    /// After a failure only [`close`](Self::close) is valid.
    pub fn write(&mut self, source: &mut dyn PixelSource) -> Result<()> {
        self.expect_state(SinkState::Initialized)?;
        let (width, height) = self.encoder.size();
        match self.encoder.write_source(source, Rect::full(width, height)) {
            Ok(()) => {
                self.state = SinkState::Written;
                Ok(())
            }
            Err(status) => {
                self.state = SinkState::Failed;
                Err(TranscodeError::WriteSource(status).into())
            }
        }
    }

    /// Finalizes the output and releases the codec.
    pub fn close(self) -> Result<()> {
        if self.state != SinkState::Written {
            log::warn!(
                "closing {} output in state {}",
                self.extension,
                self.state.name()
            );
        }
        self.encoder.release().map_err(TranscodeError::Close)?;
        Ok(())
    }
}

impl OutputSink<'static> {
    /// Binds an encoder selected by the extension of `path` to that file.
    /// The file is created when the encoder first writes, so a refused
    /// extension leaves nothing on disk.
    pub fn create_file(encoders: &dyn EncoderFactory, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = output_extension(path)?;
        let destination = DeferredFile {
            path: path.to_path_buf(),
            file: None,
        };
        Self::create(encoders, destination, &extension)
    }
}

/// Output file formats the built-in encoders write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Bmp,
    Tiff,
    /// Binary PGM or PPM, picked by the pixel layout.
    Pnm,
    /// Binary PGM (`P5`); gray only.
    Pgm,
    /// Binary PPM (`P6`); gray is expanded to RGB.
    Ppm,
    Tga,
}

impl OutputFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match normalize_extension(extension).as_str() {
            "png" => Some(OutputFormat::Png),
            "bmp" => Some(OutputFormat::Bmp),
            "tif" | "tiff" => Some(OutputFormat::Tiff),
            "pnm" => Some(OutputFormat::Pnm),
            "pgm" => Some(OutputFormat::Pgm),
            "ppm" => Some(OutputFormat::Ppm),
            "tga" => Some(OutputFormat::Tga),
            _ => None,
        }
    }

    pub fn supports_16bit(self) -> bool {
        !matches!(self, OutputFormat::Bmp | OutputFormat::Tga)
    }

    pub fn supports_alpha(self) -> bool {
        !matches!(
            self,
            OutputFormat::Pnm | OutputFormat::Pgm | OutputFormat::Ppm
        )
    }

    pub fn supports_gray(self) -> bool {
        self != OutputFormat::Ppm
    }

    pub fn supports_color(self) -> bool {
        self != OutputFormat::Pgm
    }

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Png => "PNG",
            OutputFormat::Bmp => "BMP",
            OutputFormat::Tiff => "TIFF",
            OutputFormat::Pnm => "PNM",
            OutputFormat::Pgm => "PGM",
            OutputFormat::Ppm => "PPM",
            OutputFormat::Tga => "TGA",
        }
    }
}

/// Color type of an 8/16-bit gray, RGB or RGBA pixel format.
fn color_type(format: &PixelFormatGuid) -> Option<(ExtendedColorType, usize)> {
    let info = pixel_format::lookup(format)?;
    let color = match (info.channels, info.bit_depth, info.bits_per_unit) {
        (1, BitDepth::Bd8, 8) => ExtendedColorType::L8,
        (1, BitDepth::Bd16, 16) => ExtendedColorType::L16,
        (3, BitDepth::Bd8, 24) => ExtendedColorType::Rgb8,
        (3, BitDepth::Bd16, 48) => ExtendedColorType::Rgb16,
        (4, BitDepth::Bd8, 32) => ExtendedColorType::Rgba8,
        (4, BitDepth::Bd16, 64) => ExtendedColorType::Rgba16,
        _ => return None,
    };
    if info.is_bgr() || info.is_premultiplied() {
        return None;
    }
    Some((color, info.bytes_per_pixel() as usize))
}

fn status_of(error: &ImageError) -> CodecStatus {
    match error {
        ImageError::Unsupported(_) => CodecStatus::UnsupportedFormat,
        ImageError::IoError(_) => CodecStatus::FileIo,
        ImageError::Parameter(_) => CodecStatus::InvalidParameter,
        ImageError::Limits(_) => CodecStatus::OutOfMemory,
        _ => CodecStatus::Fail,
    }
}

/// [`EncoderFactory`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRsEncoders;

impl EncoderFactory for ImageRsEncoders {
    fn create_encoder<'w>(
        &self,
        extension: &str,
        destination: Box<dyn WriteSeek + 'w>,
    ) -> std::result::Result<Box<dyn NativeEncoder + 'w>, CodecStatus> {
        let format = OutputFormat::from_extension(extension).ok_or(CodecStatus::UnsupportedFormat)?;
        Ok(Box::new(ImageRsEncoder {
            format,
            destination,
            pixel_format: None,
            black_white: false,
            width: 0,
            height: 0,
            resolution: Resolution::default(),
        }))
    }
}

pub struct ImageRsEncoder<'w> {
    format: OutputFormat,
    destination: Box<dyn WriteSeek + 'w>,
    pixel_format: Option<PixelFormatGuid>,
    black_white: bool,
    width: u32,
    height: u32,
    resolution: Resolution,
}

impl ImageRsEncoder<'_> {
    fn encode(&mut self, pixels: &[u8], color: ExtendedColorType) -> image::ImageResult<()> {
        let (width, height) = (self.width, self.height);
        let writer = &mut self.destination;
        match self.format {
            OutputFormat::Png => PngEncoder::new(writer).write_image(pixels, width, height, color),
            OutputFormat::Bmp => BmpEncoder::new(writer).write_image(pixels, width, height, color),
            OutputFormat::Tiff => TiffEncoder::new(writer).write_image(pixels, width, height, color),
            OutputFormat::Pnm | OutputFormat::Pgm | OutputFormat::Ppm => {
                let gray = matches!(color, ExtendedColorType::L8 | ExtendedColorType::L16);
                let subtype = match self.format {
                    OutputFormat::Pgm => PnmSubtype::Graymap(SampleEncoding::Binary),
                    OutputFormat::Pnm if gray => PnmSubtype::Graymap(SampleEncoding::Binary),
                    _ => PnmSubtype::Pixmap(SampleEncoding::Binary),
                };
                PnmEncoder::new(writer)
                    .with_subtype(subtype)
                    .write_image(pixels, width, height, color)
            }
            OutputFormat::Tga => TgaEncoder::new(writer).write_image(pixels, width, height, color),
        }
    }
}

impl NativeEncoder for ImageRsEncoder<'_> {
    fn set_pixel_format(&mut self, format: PixelFormatGuid) -> std::result::Result<(), CodecStatus> {
        pixel_format::lookup(&format).ok_or(CodecStatus::UnsupportedFormat)?;
        self.pixel_format = Some(format);
        Ok(())
    }

    fn set_black_white(&mut self, black_white: bool) {
        self.black_white = black_white;
    }

    fn set_size(&mut self, width: u32, height: u32) -> std::result::Result<(), CodecStatus> {
        if width == 0 || height == 0 {
            return Err(CodecStatus::InvalidParameter);
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn set_resolution(&mut self, resolution: Resolution) -> std::result::Result<(), CodecStatus> {
        self.resolution = resolution;
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn write_source(
        &mut self,
        source: &mut dyn PixelSource,
        rect: Rect,
    ) -> std::result::Result<(), CodecStatus> {
        if self.pixel_format.is_none() || self.width == 0 {
            return Err(CodecStatus::NotInitialized);
        }
        if rect != Rect::full(self.width, self.height) {
            return Err(CodecStatus::InvalidArgument);
        }
        let output_format = source.output_format();
        let (color, bytes_per_pixel) =
            color_type(&output_format).ok_or(CodecStatus::UnsupportedFormat)?;
        let stride = self.width as usize * bytes_per_pixel;
        let mut pixels = vec![0u8; stride * self.height as usize];
        source.copy(rect, &mut pixels, stride)?;

        log::debug!(
            "encoding {}x{} {:?} as {} ({} dpi x {} dpi, black/white: {})",
            self.width,
            self.height,
            color,
            self.format.name(),
            self.resolution.x,
            self.resolution.y,
            self.black_white
        );
        self.encode(&pixels, color).map_err(|e| {
            log::error!("{} encoding failed: {}", self.format.name(), e);
            status_of(&e)
        })
    }

    fn release(mut self: Box<Self>) -> std::result::Result<(), CodecStatus> {
        self.destination.flush().map_err(|e| {
            log::error!("flushing {} output failed: {}", self.format.name(), e);
            CodecStatus::FileIo
        })
    }
}
