//! ImageHandle: one opened native decoder bound to a byte source.

use crate::codec::{CodecFactory, NativeDecoder};
use crate::constants::JXR_HEADER_SIZE;
use crate::container::ContainerHeader;
use crate::error::{FormatError, Result};
use crate::pixel_format::PixelFormatGuid;
use crate::resolver::{self, DecodeParams, NativeFormat, PixelFormatDescriptor};
use crate::source::ByteSource;
use crate::{ImageMetadata, Rect, Resolution};

/// An opened JPEG XR image.
///
/// Opening only reads the container header and the codec's image
/// description; pixel data is decoded on [`read_frame`](Self::read_frame).
/// All reads act on the frame chosen by the last
/// [`select_frame`](Self::select_frame) call.
pub struct ImageHandle<'a> {
    decoder: Box<dyn NativeDecoder + 'a>,
    params: DecodeParams,
    current_frame: u32,
}

impl<'a> ImageHandle<'a> {
    /// Binds a decoder from `codecs` to `source` and normalizes its pixel
    /// format. A failed open leaves nothing behind.
    pub fn open(codecs: &dyn CodecFactory, mut source: ByteSource<'a>) -> Result<Self> {
        let mut head = [0u8; JXR_HEADER_SIZE];
        let filled = source.peek_start(&mut head)?;
        let header = ContainerHeader::parse(&head[..filled])?;
        log::debug!(
            "container version {}, first IFD at {}, {} bytes at offset {}",
            header.version,
            header.first_ifd_offset,
            source.len(),
            source.offset()
        );

        let mut decoder = codecs
            .create_decoder(source)
            .map_err(FormatError::DecoderInit)?;
        let (width, height) = decoder.size().map_err(FormatError::Size)?;
        let native = NativeFormat {
            pixel_format: decoder.pixel_format(),
            color_format: decoder.color_format(),
        };
        let params = resolver::resolve(native, width, height)?;
        decoder
            .configure(&params)
            .map_err(FormatError::DecoderInit)?;

        log::info!(
            "opened decoder: {}x{}, {} bytes per pixel",
            width,
            height,
            params.bytes_per_pixel()
        );

        Ok(Self {
            decoder,
            params,
            current_frame: 0,
        })
    }

    pub fn frame_count(&self) -> Result<u32> {
        Ok(self.decoder.frame_count().map_err(FormatError::FrameCount)?)
    }

    pub fn select_frame(&mut self, index: u32) -> Result<()> {
        let count = self.frame_count()?;
        if index >= count {
            return Err(FormatError::FrameOutOfRange { index, count }.into());
        }
        self.decoder
            .select_frame(index)
            .map_err(|status| FormatError::SelectFrame { index, status })?;
        self.current_frame = index;
        Ok(())
    }

    /// Index of the frame reads currently act on.
    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    pub fn metadata(&self) -> Result<ImageMetadata> {
        Ok(ImageMetadata {
            resolution: self.resolution()?,
            width: self.params.roi.width,
            height: self.params.roi.height,
            bytes_per_pixel: self.params.bytes_per_pixel(),
            frame_count: self.frame_count()?,
        })
    }

    pub fn resolution(&self) -> Result<Resolution> {
        Ok(self.decoder.resolution().map_err(FormatError::Resolution)?)
    }

    pub fn width(&self) -> u32 {
        self.params.roi.width
    }

    pub fn height(&self) -> u32 {
        self.params.roi.height
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        self.params.bytes_per_pixel()
    }

    /// Exact size in bytes of one decoded frame.
    pub fn frame_len(&self) -> usize {
        self.stride() * self.params.roi.height as usize
    }

    fn stride(&self) -> usize {
        self.params.roi.width as usize * self.params.bytes_per_pixel() as usize
    }

    /// Decoded pixel format, after normalization.
    pub fn pixel_format(&self) -> PixelFormatGuid {
        self.params.pixel_format
    }

    pub fn is_bgr(&self) -> bool {
        self.params.is_bgr
    }

    pub fn black_white(&self) -> bool {
        self.decoder.black_white()
    }

    pub fn descriptor(&self) -> PixelFormatDescriptor {
        self.params.descriptor()
    }

    pub fn decode_params(&self) -> &DecodeParams {
        &self.params
    }

    /// Decodes the current frame into the front of `buffer`, row-major with
    /// a stride of `width * bytes_per_pixel`. Returns the number of bytes
    /// written.
    pub fn read_frame(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let required = self.frame_len();
        if buffer.len() < required {
            return Err(FormatError::BufferTooSmall {
                required,
                actual: buffer.len(),
            }
            .into());
        }
        let stride = self.stride();
        let roi: Rect = self.params.roi;
        self.decoder
            .copy(roi, &mut buffer[..required], stride)
            .map_err(FormatError::Copy)?;
        log::debug!(
            "decoded frame {} ({} bytes)",
            self.current_frame,
            required
        );
        Ok(required)
    }

    /// Decodes the current frame into a freshly allocated buffer.
    pub fn decode_frame(&mut self) -> Result<Vec<u8>> {
        let mut pixels = vec![0u8; self.frame_len()];
        self.read_frame(&mut pixels)?;
        Ok(pixels)
    }

    pub(crate) fn native(&self) -> &dyn NativeDecoder {
        &*self.decoder
    }

    pub(crate) fn native_mut(&mut self) -> &mut dyn NativeDecoder {
        &mut *self.decoder
    }
}

impl std::fmt::Debug for ImageHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageHandle")
            .field("params", &self.params)
            .field("current_frame", &self.current_frame)
            .finish_non_exhaustive()
    }
}
