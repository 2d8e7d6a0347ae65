//! Byte sources for the decoder.
//!
//! A [`ByteSource`] is a window `[offset, offset + length)` over either a
//! caller-owned byte slice or an opened file. Position 0 of the source is
//! `offset` in the underlying data, so a JPEG XR stream embedded inside a
//! larger container decodes exactly like a standalone file. Memory sources
//! only borrow the slice; nothing is copied.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::Result;

pub enum ByteSource<'a> {
    Memory {
        data: &'a [u8],
        offset: usize,
        length: usize,
        position: usize,
    },
    File {
        file: File,
        offset: u64,
        length: u64,
        position: u64,
    },
}

impl<'a> ByteSource<'a> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_at(path, 0)
    }

    /// Opens `path` and treats byte `offset` as the start of the image.
    pub fn from_path_at(path: impl AsRef<Path>, offset: u64) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();
        if offset > file_len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "offset {} is past the end of {} ({} bytes)",
                    offset,
                    path.display(),
                    file_len
                ),
            )
            .into());
        }
        file.seek(SeekFrom::Start(offset))?;
        Ok(ByteSource::File {
            file,
            offset,
            length: file_len - offset,
            position: 0,
        })
    }

    pub fn from_bytes(data: &'a [u8]) -> Self {
        ByteSource::Memory {
            data,
            offset: 0,
            length: data.len(),
            position: 0,
        }
    }

    pub fn from_bytes_range(data: &'a [u8], offset: usize, length: usize) -> Result<Self> {
        let end = offset.checked_add(length).filter(|&end| end <= data.len());
        if end.is_none() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "range {}+{} exceeds buffer of {} bytes",
                    offset,
                    length,
                    data.len()
                ),
            )
            .into());
        }
        Ok(ByteSource::Memory {
            data,
            offset,
            length,
            position: 0,
        })
    }

    /// Number of readable bytes in the window.
    pub fn len(&self) -> u64 {
        match self {
            ByteSource::Memory { length, .. } => *length as u64,
            ByteSource::File { length, .. } => *length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offset of logical position 0 within the underlying data.
    pub fn offset(&self) -> u64 {
        match self {
            ByteSource::Memory { offset, .. } => *offset as u64,
            ByteSource::File { offset, .. } => *offset,
        }
    }

    /// The borrowed window, for memory sources.
    pub fn as_slice(&self) -> Option<&'a [u8]> {
        match self {
            ByteSource::Memory {
                data,
                offset,
                length,
                ..
            } => Some(&data[*offset..*offset + *length]),
            ByteSource::File { .. } => None,
        }
    }

    /// Reads up to `buf.len()` bytes from logical position 0 and restores
    /// the current position afterwards.
    pub fn peek_start(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let saved = self.stream_position()?;
        self.seek(SeekFrom::Start(0))?;
        let mut filled = 0;
        let result = loop {
            if filled == buf.len() {
                break Ok(filled);
            }
            match self.read(&mut buf[filled..]) {
                Ok(0) => break Ok(filled),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => break Err(e),
            }
        };
        self.seek(SeekFrom::Start(saved))?;
        result
    }
}

impl Read for ByteSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ByteSource::Memory {
                data,
                offset,
                length,
                position,
            } => {
                let remaining = length.saturating_sub(*position);
                let n = remaining.min(buf.len());
                if n == 0 {
                    return Ok(0);
                }
                let start = *offset + *position;
                buf[..n].copy_from_slice(&data[start..start + n]);
                *position += n;
                Ok(n)
            }
            ByteSource::File {
                file,
                length,
                position,
                ..
            } => {
                let remaining = length.saturating_sub(*position);
                let want = (buf.len() as u64).min(remaining) as usize;
                if want == 0 {
                    return Ok(0);
                }
                let n = file.read(&mut buf[..want])?;
                *position += n as u64;
                Ok(n)
            }
        }
    }
}

impl Seek for ByteSource<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.len();
        let current = match self {
            ByteSource::Memory { position, .. } => *position as u64,
            ByteSource::File { position, .. } => *position,
        };
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::End(delta) => len.checked_add_signed(delta),
            SeekFrom::Current(delta) => current.checked_add_signed(delta),
        }
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative position",
            )
        })?;

        match self {
            ByteSource::Memory { position, .. } => {
                *position = usize::try_from(target).map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidInput, "seek position overflows usize")
                })?;
            }
            ByteSource::File {
                file,
                offset,
                position,
                ..
            } => {
                let absolute = offset.checked_add(target).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "seek position overflows u64")
                })?;
                file.seek(SeekFrom::Start(absolute))?;
                *position = target;
            }
        }
        Ok(target)
    }
}

impl std::fmt::Debug for ByteSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteSource::Memory { offset, length, .. } => f
                .debug_struct("ByteSource::Memory")
                .field("offset", offset)
                .field("length", length)
                .finish(),
            ByteSource::File { offset, length, .. } => f
                .debug_struct("ByteSource::File")
                .field("offset", offset)
                .field("length", length)
                .finish(),
        }
    }
}
