//! Zip archive format constants, record layouts, and low-level parsing utilities.
//!
//! This module contains the signatures, flag bits, and fixed-size records
//! defined by the zip application note (APPNOTE.TXT). Only the single-disk,
//! non-Zip64 subset is modelled.

pub mod header;
pub mod reader;

pub use header::{CentralDirectoryHeader, EndOfCentralDirectory, LocalFileHeader};

/// Signature of a local file header: `PK\x03\x04`.
pub const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;

/// Signature of a central directory file header: `PK\x01\x02`.
pub const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;

/// Signature of the end of central directory record: `PK\x05\x06`.
pub const EOCD_SIGNATURE: u32 = 0x0605_4b50;

/// Fixed size of a local file header, excluding name and extra field.
pub const LOCAL_HEADER_SIZE: u64 = 30;

/// Fixed size of a central directory header, excluding variable fields.
pub const CENTRAL_HEADER_SIZE: u64 = 46;

/// Fixed size of the end of central directory record, excluding the comment.
pub const EOCD_SIZE: u64 = 22;

/// Maximum length of the archive comment that may trail the EOCD record.
pub const MAX_COMMENT_SIZE: u64 = u16::MAX as u64;

/// Sentinel marking a 32-bit field whose value lives in a Zip64 record.
pub const ZIP64_SENTINEL_U32: u32 = u32::MAX;

/// Sentinel marking a 16-bit field whose value lives in a Zip64 record.
pub const ZIP64_SENTINEL_U16: u16 = u16::MAX;

/// Version 2.0: deflate and directory support.
pub const VERSION_DEFLATE: u16 = 20;

/// Version 1.0: stored entries.
pub const VERSION_STORED: u16 = 10;

/// General purpose flag bits.
pub mod flags {
    /// The entry is encrypted.
    pub const ENCRYPTED: u16 = 0x0001;
    /// Sizes and CRC follow the data in a data descriptor.
    pub const DATA_DESCRIPTOR: u16 = 0x0008;
    /// Name and comment are UTF-8.
    pub const UTF8: u16 = 0x0800;
}

/// MS-DOS directory attribute used in external file attributes.
pub const DOS_DIRECTORY_ATTRIBUTE: u32 = 0x10;

/// DOS date for 1980-01-01, the earliest representable zip timestamp.
///
/// Every record written by this crate uses it so identical inputs produce
/// identical archives.
pub const FIXED_DOS_DATE: u16 = (1 << 5) | 1;

/// DOS time for 00:00:00.
pub const FIXED_DOS_TIME: u16 = 0;
