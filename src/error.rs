use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

use crate::pixel_format::PixelFormatGuid;

pub type Result<T> = std::result::Result<T, JxrError>;

/// Status codes reported by the native JPEG XR codec.
///
/// Values mirror the codec library's `ERR` codes so that a backend can hand
/// its raw return value to [`CodecStatus::from_raw`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum CodecStatus {
    #[error("operation failed")]
    Fail = -1,
    #[error("not yet implemented")]
    NotYetImplemented = -2,
    #[error("abstract method")]
    AbstractMethod = -3,
    #[error("out of memory")]
    OutOfMemory = -101,
    #[error("file I/O failure")]
    FileIo = -102,
    #[error("buffer overflow")]
    BufferOverflow = -103,
    #[error("invalid parameter")]
    InvalidParameter = -104,
    #[error("invalid argument")]
    InvalidArgument = -105,
    #[error("unsupported format")]
    UnsupportedFormat = -106,
    #[error("incorrect codec version")]
    IncorrectCodecVersion = -107,
    #[error("index not found")]
    IndexNotFound = -108,
    #[error("out of sequence")]
    OutOfSequence = -109,
    #[error("not initialized")]
    NotInitialized = -110,
    #[error("must be multiple of 16 lines until last call")]
    MustBeMultipleOf16LinesUntilLastCall = -111,
    #[error("planar alpha banded encoding requires a temp file")]
    PlanarAlphaBandedEncRequiresTempFile = -112,
    #[error("alpha mode cannot be transcoded")]
    AlphaModeCannotBeTranscoded = -113,
    #[error("incorrect codec sub-version")]
    IncorrectCodecSubVersion = -114,
}

impl CodecStatus {
    /// Converts a raw codec return value. `0` (success) maps to `Ok(())`;
    /// unknown negative values collapse to [`CodecStatus::Fail`].
    pub fn from_raw(code: i32) -> std::result::Result<(), CodecStatus> {
        if code >= 0 {
            return Ok(());
        }
        Err(CodecStatus::try_from(code).unwrap_or(CodecStatus::Fail))
    }

    pub fn code(self) -> i32 {
        self.into()
    }
}

/// The source does not describe a decodable JPEG XR image, or the codec
/// refused one of the decode/encode setup steps.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("input is not a JPEG XR container")]
    NotJpegXr,
    #[error("unable to initialize decoder: {0}")]
    DecoderInit(CodecStatus),
    #[error("unable to initialize decoder: unknown pixel format {0}")]
    UnknownPixelFormat(PixelFormatGuid),
    #[error("unable to get frame count: {0}")]
    FrameCount(CodecStatus),
    #[error("frame {index} out of range (image has {count} frames)")]
    FrameOutOfRange { index: u32, count: u32 },
    #[error("unable to select frame {index}: {status}")]
    SelectFrame { index: u32, status: CodecStatus },
    #[error("could not get decoder resolution: {0}")]
    Resolution(CodecStatus),
    #[error("could not get decoder size: {0}")]
    Size(CodecStatus),
    #[error("could not get image bytes: {0}")]
    Copy(CodecStatus),
    #[error("destination buffer too small: {actual} bytes, {required} required")]
    BufferTooSmall { required: usize, actual: usize },
    #[error("frame of {required} bytes exceeds the configured limit of {limit} bytes")]
    FrameTooLarge { required: u64, limit: u64 },
    #[error("unable to create format converter for extension {extension:?}: {status}")]
    ConverterInit {
        extension: String,
        status: CodecStatus,
    },
    #[error("unsupported output extension {0:?}")]
    UnsupportedExtension(String),
    #[error("unable to initialize encoder: {0}")]
    EncoderInit(CodecStatus),
    #[error("could not initialize encoder with settings from decoder: {0}")]
    EncoderSettings(CodecStatus),
    #[error("output sink is {actual}, expected {expected}")]
    SinkState {
        expected: &'static str,
        actual: &'static str,
    },
}

/// The converter or encoder could not produce the requested output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    #[error("could not write source: {0}")]
    WriteSource(CodecStatus),
    #[error("could not finalize output: {0}")]
    Close(CodecStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Format,
    Transcode,
}

#[derive(Error, Debug)]
pub enum JxrError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Transcode(#[from] TranscodeError),
}

impl JxrError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JxrError::Io(_) => ErrorKind::Io,
            JxrError::Format(_) => ErrorKind::Format,
            JxrError::Transcode(_) => ErrorKind::Transcode,
        }
    }

    pub fn is_format(&self) -> bool {
        self.kind() == ErrorKind::Format
    }
}
