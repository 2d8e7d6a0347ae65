// Byte order mark of a JPEG XR container ("II", little-endian TIFF style).
pub const JXR_BYTE_ORDER: [u8; 2] = *b"II";

// Identifier byte following the byte order mark, ITU-T T.832 Annex A.
pub const JXR_IDENTIFIER: u8 = 0xBC;

// Version byte: 0x01 for JPEG XR, 0x00 for early HD Photo files.
pub const JXR_VERSION_HD_PHOTO: u8 = 0x00;
pub const JXR_VERSION: u8 = 0x01;

// Size of the fixed container header (byte order, identifier, version, first IFD offset).
pub const JXR_HEADER_SIZE: usize = 8;

// Process exit code used when a format error reaches the command line boundary.
// Matches the codec's WMP_errUnsupportedFormat.
pub const UNSUPPORTED_FORMAT_EXIT_CODE: i32 = -106;

pub const FAILURE_EXIT_CODE: i32 = 1;

// Hex dump layout: four bytes per group, ten groups per line.
pub const HEX_GROUP_BYTES: usize = 4;
pub const HEX_GROUPS_PER_LINE: usize = 10;

// Native codec decode parameters that are always forced.
pub const ALPHA_MODE_NONE: u8 = 0;
pub const ALPHA_MODE_IMAGE_AND_ALPHA: u8 = 2;
