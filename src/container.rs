//! JPEG XR container header (ITU-T T.832 Annex A).
//!
//! Only the fixed 8-byte header is inspected here: enough to reject inputs
//! that are not JPEG XR before any codec state is created. Directory parsing
//! stays with the codec.

use crate::constants::{
    JXR_BYTE_ORDER, JXR_HEADER_SIZE, JXR_IDENTIFIER, JXR_VERSION, JXR_VERSION_HD_PHOTO,
};
use crate::error::FormatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u8,
    pub first_ifd_offset: u32,
}

impl ContainerHeader {
    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        if data.len() < JXR_HEADER_SIZE {
            return Err(FormatError::NotJpegXr);
        }
        if data[0..2] != JXR_BYTE_ORDER || data[2] != JXR_IDENTIFIER {
            return Err(FormatError::NotJpegXr);
        }
        let version = data[3];
        if version != JXR_VERSION && version != JXR_VERSION_HD_PHOTO {
            return Err(FormatError::NotJpegXr);
        }
        let first_ifd_offset = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        // The first directory can never overlap the header itself.
        if (first_ifd_offset as usize) < JXR_HEADER_SIZE {
            return Err(FormatError::NotJpegXr);
        }
        Ok(Self {
            version,
            first_ifd_offset,
        })
    }

    pub fn is_hd_photo(&self) -> bool {
        self.version == JXR_VERSION_HD_PHOTO
    }

    /// Serializes the header, used when assembling containers in memory.
    pub fn to_bytes(&self) -> [u8; JXR_HEADER_SIZE] {
        let mut out = [0u8; JXR_HEADER_SIZE];
        out[0..2].copy_from_slice(&JXR_BYTE_ORDER);
        out[2] = JXR_IDENTIFIER;
        out[3] = self.version;
        out[4..8].copy_from_slice(&self.first_ifd_offset.to_le_bytes());
        out
    }
}

pub fn is_jpegxr(data: &[u8]) -> bool {
    ContainerHeader::parse(data).is_ok()
}
