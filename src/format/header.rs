//! Fixed-size zip records: local file header, central directory header,
//! and the end of central directory record.

use std::io::{Read, Write};

use super::reader::{read_bytes, read_u16_le, read_u32_le, write_u16_le, write_u32_le};
use super::{
    CENTRAL_HEADER_SIGNATURE, EOCD_SIGNATURE, LOCAL_HEADER_SIGNATURE, flags,
};
use crate::{Error, Result};

/// Decodes a record name, honouring the UTF-8 flag.
///
/// Names without the flag are nominally CP437; valid UTF-8 is accepted
/// as-is and anything else is decoded lossily.
fn decode_name(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(name) => name,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

fn corrupt(offset: u64, reason: impl Into<String>) -> Error {
    Error::CorruptHeader {
        offset,
        reason: reason.into(),
    }
}

/// Local file header preceding each entry's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    /// Version needed to extract.
    pub version_needed: u16,
    /// General purpose bit flag.
    pub flags: u16,
    /// Compression method.
    pub method: u16,
    /// DOS modification time.
    pub mod_time: u16,
    /// DOS modification date.
    pub mod_date: u16,
    /// CRC-32 of uncompressed data.
    pub crc32: u32,
    /// Compressed size.
    pub compressed_size: u32,
    /// Uncompressed size.
    pub uncompressed_size: u32,
    /// Length of the name that follows the fixed part.
    pub name_length: u16,
    /// Length of the extra field that follows the name.
    pub extra_length: u16,
}

impl LocalFileHeader {
    /// Reads a local header at the current position, which is `offset` in the file.
    pub fn read<R: Read>(r: &mut R, offset: u64) -> Result<Self> {
        let short = |_| corrupt(offset, "truncated local file header");
        let signature = read_u32_le(r).map_err(short)?;
        if signature != LOCAL_HEADER_SIGNATURE {
            return Err(corrupt(
                offset,
                format!("bad local header signature {:#010x}", signature),
            ));
        }
        Ok(Self {
            version_needed: read_u16_le(r).map_err(short)?,
            flags: read_u16_le(r).map_err(short)?,
            method: read_u16_le(r).map_err(short)?,
            mod_time: read_u16_le(r).map_err(short)?,
            mod_date: read_u16_le(r).map_err(short)?,
            crc32: read_u32_le(r).map_err(short)?,
            compressed_size: read_u32_le(r).map_err(short)?,
            uncompressed_size: read_u32_le(r).map_err(short)?,
            name_length: read_u16_le(r).map_err(short)?,
            extra_length: read_u16_le(r).map_err(short)?,
        })
    }

    /// Writes the fixed part of the header.
    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        write_u32_le(w, LOCAL_HEADER_SIGNATURE)?;
        write_u16_le(w, self.version_needed)?;
        write_u16_le(w, self.flags)?;
        write_u16_le(w, self.method)?;
        write_u16_le(w, self.mod_time)?;
        write_u16_le(w, self.mod_date)?;
        write_u32_le(w, self.crc32)?;
        write_u32_le(w, self.compressed_size)?;
        write_u32_le(w, self.uncompressed_size)?;
        write_u16_le(w, self.name_length)?;
        write_u16_le(w, self.extra_length)
    }

    /// Total variable-length data size following this header.
    pub fn variable_data_size(&self) -> u64 {
        self.name_length as u64 + self.extra_length as u64
    }
}

/// Central directory file header describing one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    /// Version made by.
    pub version_made_by: u16,
    /// Version needed to extract.
    pub version_needed: u16,
    /// General purpose bit flag.
    pub flags: u16,
    /// Compression method.
    pub method: u16,
    /// DOS modification time.
    pub mod_time: u16,
    /// DOS modification date.
    pub mod_date: u16,
    /// CRC-32 of uncompressed data.
    pub crc32: u32,
    /// Compressed size.
    pub compressed_size: u32,
    /// Uncompressed size.
    pub uncompressed_size: u32,
    /// Disk number where the entry starts.
    pub disk_number_start: u16,
    /// Internal file attributes.
    pub internal_attrs: u16,
    /// External file attributes.
    pub external_attrs: u32,
    /// Offset of the local file header.
    pub local_header_offset: u32,
    /// Entry name.
    pub name: String,
    /// Extra field, carried verbatim.
    pub extra: Vec<u8>,
    /// Entry comment, carried verbatim.
    pub comment: Vec<u8>,
}

impl CentralDirectoryHeader {
    /// Reads a central directory header at the current position (`offset` in the file).
    pub fn read<R: Read>(r: &mut R, offset: u64) -> Result<Self> {
        let short = |_| corrupt(offset, "truncated central directory header");
        let signature = read_u32_le(r).map_err(short)?;
        if signature != CENTRAL_HEADER_SIGNATURE {
            return Err(corrupt(
                offset,
                format!("bad central directory signature {:#010x}", signature),
            ));
        }
        let version_made_by = read_u16_le(r).map_err(short)?;
        let version_needed = read_u16_le(r).map_err(short)?;
        let flags = read_u16_le(r).map_err(short)?;
        let method = read_u16_le(r).map_err(short)?;
        let mod_time = read_u16_le(r).map_err(short)?;
        let mod_date = read_u16_le(r).map_err(short)?;
        let crc32 = read_u32_le(r).map_err(short)?;
        let compressed_size = read_u32_le(r).map_err(short)?;
        let uncompressed_size = read_u32_le(r).map_err(short)?;
        let name_length = read_u16_le(r).map_err(short)?;
        let extra_length = read_u16_le(r).map_err(short)?;
        let comment_length = read_u16_le(r).map_err(short)?;
        let disk_number_start = read_u16_le(r).map_err(short)?;
        let internal_attrs = read_u16_le(r).map_err(short)?;
        let external_attrs = read_u32_le(r).map_err(short)?;
        let local_header_offset = read_u32_le(r).map_err(short)?;
        let name = decode_name(read_bytes(r, name_length as usize).map_err(short)?);
        let extra = read_bytes(r, extra_length as usize).map_err(short)?;
        let comment = read_bytes(r, comment_length as usize).map_err(short)?;

        Ok(Self {
            version_made_by,
            version_needed,
            flags,
            method,
            mod_time,
            mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            disk_number_start,
            internal_attrs,
            external_attrs,
            local_header_offset,
            name,
            extra,
            comment,
        })
    }

    /// Writes the header including its variable-length fields.
    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        write_u32_le(w, CENTRAL_HEADER_SIGNATURE)?;
        write_u16_le(w, self.version_made_by)?;
        write_u16_le(w, self.version_needed)?;
        write_u16_le(w, self.flags)?;
        write_u16_le(w, self.method)?;
        write_u16_le(w, self.mod_time)?;
        write_u16_le(w, self.mod_date)?;
        write_u32_le(w, self.crc32)?;
        write_u32_le(w, self.compressed_size)?;
        write_u32_le(w, self.uncompressed_size)?;
        write_u16_le(w, self.name.len() as u16)?;
        write_u16_le(w, self.extra.len() as u16)?;
        write_u16_le(w, self.comment.len() as u16)?;
        write_u16_le(w, self.disk_number_start)?;
        write_u16_le(w, self.internal_attrs)?;
        write_u32_le(w, self.external_attrs)?;
        write_u32_le(w, self.local_header_offset)?;
        w.write_all(self.name.as_bytes())?;
        w.write_all(&self.extra)?;
        w.write_all(&self.comment)
    }

    /// Size of this header on disk, including variable-length fields.
    pub fn encoded_size(&self) -> u64 {
        super::CENTRAL_HEADER_SIZE
            + self.name.len() as u64
            + self.extra.len() as u64
            + self.comment.len() as u64
    }

    /// Returns `true` if this record is a directory marker.
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }

    /// Returns `true` if the entry is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.flags & flags::ENCRYPTED != 0
    }

    /// Returns `true` if any size or offset field holds a Zip64 sentinel.
    pub fn uses_zip64(&self) -> bool {
        self.compressed_size == super::ZIP64_SENTINEL_U32
            || self.uncompressed_size == super::ZIP64_SENTINEL_U32
            || self.local_header_offset == super::ZIP64_SENTINEL_U32
    }
}

/// End of central directory record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    /// Number of this disk.
    pub disk_number: u16,
    /// Disk where the central directory starts.
    pub central_dir_disk: u16,
    /// Number of central directory records on this disk.
    pub entries_on_disk: u16,
    /// Total number of central directory records.
    pub entries_total: u16,
    /// Size of the central directory in bytes.
    pub central_dir_size: u32,
    /// Offset of the start of the central directory.
    pub central_dir_offset: u32,
    /// Archive comment.
    pub comment: Vec<u8>,
}

impl EndOfCentralDirectory {
    /// Parses the record from a buffer beginning at its signature.
    pub fn parse(buf: &[u8], offset: u64) -> Result<Self> {
        let mut r = buf;
        let short = |_| corrupt(offset, "truncated end of central directory record");
        let signature = read_u32_le(&mut r).map_err(short)?;
        if signature != EOCD_SIGNATURE {
            return Err(corrupt(offset, "bad end of central directory signature"));
        }
        let disk_number = read_u16_le(&mut r).map_err(short)?;
        let central_dir_disk = read_u16_le(&mut r).map_err(short)?;
        let entries_on_disk = read_u16_le(&mut r).map_err(short)?;
        let entries_total = read_u16_le(&mut r).map_err(short)?;
        let central_dir_size = read_u32_le(&mut r).map_err(short)?;
        let central_dir_offset = read_u32_le(&mut r).map_err(short)?;
        let comment_length = read_u16_le(&mut r).map_err(short)?;
        // Comments cut short by a truncated file are tolerated.
        let available = r.len().min(comment_length as usize);
        let comment = r[..available].to_vec();

        Ok(Self {
            disk_number,
            central_dir_disk,
            entries_on_disk,
            entries_total,
            central_dir_size,
            central_dir_offset,
            comment,
        })
    }

    /// Writes the record including its comment.
    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        write_u32_le(w, EOCD_SIGNATURE)?;
        write_u16_le(w, self.disk_number)?;
        write_u16_le(w, self.central_dir_disk)?;
        write_u16_le(w, self.entries_on_disk)?;
        write_u16_le(w, self.entries_total)?;
        write_u32_le(w, self.central_dir_size)?;
        write_u32_le(w, self.central_dir_offset)?;
        write_u16_le(w, self.comment.len() as u16)?;
        w.write_all(&self.comment)
    }

    /// Returns `true` if this archive spans more than one disk.
    pub fn is_multi_disk(&self) -> bool {
        self.disk_number != 0 || self.central_dir_disk != 0
    }

    /// Returns `true` if any field holds a Zip64 sentinel.
    pub fn uses_zip64(&self) -> bool {
        self.entries_total == super::ZIP64_SENTINEL_U16
            || self.central_dir_size == super::ZIP64_SENTINEL_U32
            || self.central_dir_offset == super::ZIP64_SENTINEL_U32
    }
}
