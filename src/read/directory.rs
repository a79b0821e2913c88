//! Locating and parsing the central directory.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, SeekFrom};

use crate::format::reader::u32_at;
use crate::format::{
    CentralDirectoryHeader, EOCD_SIGNATURE, EOCD_SIZE, EndOfCentralDirectory, MAX_COMMENT_SIZE,
};
use crate::{Error, Result};

/// The parsed central directory of an archive.
///
/// Records are unique by name: when an archive lists a name twice, the later
/// record replaces the earlier one in place.
#[derive(Debug, Clone, Default)]
pub struct CentralDirectory {
    /// Directory records in archive order.
    pub records: Vec<CentralDirectoryHeader>,
    /// Record name to index into `records`.
    pub index: HashMap<String, usize>,
    /// Offset of the first central directory header.
    pub offset: u64,
    /// Archive comment.
    pub comment: Vec<u8>,
}

impl CentralDirectory {
    /// Reads the central directory from a seekable source.
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let (eocd_offset, eocd) = find_eocd(reader)?;

        if eocd.is_multi_disk() {
            return Err(Error::UnsupportedFeature {
                feature: "multi-disk archives",
            });
        }
        if eocd.uses_zip64() {
            return Err(Error::UnsupportedFeature { feature: "zip64" });
        }

        let offset = eocd.central_dir_offset as u64;
        let size = eocd.central_dir_size as u64;
        if offset + size > eocd_offset {
            return Err(Error::CorruptHeader {
                offset: eocd_offset,
                reason: format!(
                    "central directory ({} bytes at {:#x}) overlaps end record",
                    size, offset
                ),
            });
        }

        reader.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; size as usize];
        reader.read_exact(&mut buf).map_err(|_| Error::CorruptHeader {
            offset,
            reason: "truncated central directory".into(),
        })?;

        let mut cursor = Cursor::new(buf);
        let mut directory = CentralDirectory {
            offset,
            comment: eocd.comment,
            ..Default::default()
        };
        for _ in 0..eocd.entries_total {
            let header_offset = offset + cursor.position();
            let header = CentralDirectoryHeader::read(&mut cursor, header_offset)?;
            if header.uses_zip64() {
                return Err(Error::UnsupportedFeature { feature: "zip64" });
            }
            directory.insert(header);
        }

        Ok(directory)
    }

    /// Adds a record, replacing any record with the same name.
    pub fn insert(&mut self, header: CentralDirectoryHeader) {
        match self.index.get(&header.name) {
            Some(&idx) => self.records[idx] = header,
            None => {
                self.index.insert(header.name.clone(), self.records.len());
                self.records.push(header);
            }
        }
    }

    /// Looks up a record by name.
    pub fn get(&self, name: &str) -> Option<&CentralDirectoryHeader> {
        self.index.get(name).map(|&idx| &self.records[idx])
    }
}

/// Scans the tail of the archive for the end of central directory record.
///
/// Returns the record and its absolute offset.
fn find_eocd<R: Read + Seek>(reader: &mut R) -> Result<(u64, EndOfCentralDirectory)> {
    let len = reader.seek(SeekFrom::End(0))?;
    if len < EOCD_SIZE {
        return Err(Error::InvalidFormat(format!(
            "file is {} bytes, too small for a zip archive",
            len
        )));
    }

    let tail_len = len.min(EOCD_SIZE + MAX_COMMENT_SIZE);
    let tail_start = len - tail_len;
    reader.seek(SeekFrom::Start(tail_start))?;
    let mut tail = vec![0u8; tail_len as usize];
    reader.read_exact(&mut tail)?;

    let last_candidate = tail.len() - EOCD_SIZE as usize;
    let pos = (0..=last_candidate)
        .rev()
        .find(|&pos| u32_at(&tail, pos) == Some(EOCD_SIGNATURE))
        .ok_or_else(|| {
            Error::InvalidFormat("end of central directory record not found".into())
        })?;

    let offset = tail_start + pos as u64;
    let eocd = EndOfCentralDirectory::parse(&tail[pos..], offset)?;
    Ok((offset, eocd))
}
