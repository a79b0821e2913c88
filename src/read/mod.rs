//! Zip archive reading.
//!
//! [`ZipReader`] parses the central directory once at open time and then
//! extracts single entries on demand, verifying each against its recorded
//! size and CRC-32.
//!
//! # Example
//!
//! ```rust,no_run
//! use zipsession::read::ZipReader;
//!
//! let mut reader = ZipReader::open_path("archive.zip")?;
//! for record in reader.records() {
//!     println!("{}: {} bytes", record.name, record.uncompressed_size);
//! }
//! let data = reader.read_by_name("hello.txt")?;
//! # Ok::<(), zipsession::Error>(())
//! ```

mod directory;

pub use directory::CentralDirectory;

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::checksum::verify_crc32;
use crate::codec::{ArchiveReader, CompressionMethod, EntryRecord};
use crate::format::{CentralDirectoryHeader, LocalFileHeader, LOCAL_HEADER_SIZE};
use crate::{Error, Result};

/// Upper bound on buffer space reserved from sizes declared in the archive.
const MAX_PREALLOCATION: usize = 1024 * 1024;

/// A read handle on a zip archive.
pub struct ZipReader<R> {
    reader: R,
    directory: CentralDirectory,
}

impl<R> std::fmt::Debug for ZipReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipReader")
            .field("entries", &self.directory.records.len())
            .finish_non_exhaustive()
    }
}

impl ZipReader<BufReader<File>> {
    /// Opens the archive at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArchiveNotFound`] if the file does not exist.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::ArchiveNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Io(e),
        })?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> ZipReader<R> {
    /// Parses the central directory of `reader`.
    pub fn new(mut reader: R) -> Result<Self> {
        let directory = CentralDirectory::read(&mut reader)?;
        log::trace!(
            "parsed central directory: {} records at {:#x}",
            directory.records.len(),
            directory.offset
        );
        Ok(Self { reader, directory })
    }

    /// Returns the directory records in archive order.
    pub fn records(&self) -> &[CentralDirectoryHeader] {
        &self.directory.records
    }

    /// Returns the archive comment.
    pub fn comment(&self) -> &[u8] {
        &self.directory.comment
    }

    /// Returns the number of directory records.
    pub fn len(&self) -> usize {
        self.directory.records.len()
    }

    /// Returns `true` if the archive has no records.
    pub fn is_empty(&self) -> bool {
        self.directory.records.is_empty()
    }

    /// Reads and decodes the data entry named `name`.
    pub fn read_by_name(&mut self, name: &str) -> Result<Vec<u8>> {
        let header = match self.directory.get(name) {
            Some(header) if !header.is_directory() => header.clone(),
            _ => {
                return Err(Error::EntryNotFound {
                    path: name.to_string(),
                });
            }
        };
        self.extract(&header)
    }

    /// Reads an entry's stored bytes without decoding them.
    ///
    /// Sizes and CRC are taken from the central directory record.
    pub fn read_raw(&mut self, header: &CentralDirectoryHeader) -> Result<Vec<u8>> {
        let offset = header.local_header_offset as u64;
        self.reader.seek(SeekFrom::Start(offset))?;
        let local = LocalFileHeader::read(&mut self.reader, offset)?;
        self.reader
            .seek(SeekFrom::Start(offset + LOCAL_HEADER_SIZE + local.variable_data_size()))?;

        let size = header.compressed_size as usize;
        let mut data = Vec::with_capacity(size.min(MAX_PREALLOCATION));
        (&mut self.reader)
            .take(size as u64)
            .read_to_end(&mut data)?;
        if data.len() != size {
            return Err(Error::CorruptEntry {
                name: header.name.clone(),
                reason: format!("truncated data: expected {} bytes, found {}", size, data.len()),
            });
        }
        Ok(data)
    }

    fn extract(&mut self, header: &CentralDirectoryHeader) -> Result<Vec<u8>> {
        if header.is_encrypted() {
            return Err(Error::UnsupportedFeature {
                feature: "encrypted entries",
            });
        }
        let method = CompressionMethod::from_id(header.method)?;
        let raw = self.read_raw(header)?;
        let expected = header.uncompressed_size as usize;

        let data = match method {
            CompressionMethod::Stored => raw,
            #[cfg(feature = "deflate")]
            CompressionMethod::Deflate => crate::codec::deflate::decompress(&raw, expected)
                .map_err(|e| Error::CorruptEntry {
                    name: header.name.clone(),
                    reason: e.to_string(),
                })?,
            #[cfg(not(feature = "deflate"))]
            CompressionMethod::Deflate => {
                return Err(Error::UnsupportedMethod {
                    method: header.method,
                });
            }
        };

        if data.len() != expected {
            return Err(Error::CorruptEntry {
                name: header.name.clone(),
                reason: format!("expected {} bytes, decoded {}", expected, data.len()),
            });
        }
        verify_crc32(&header.name, &data, header.crc32)?;
        Ok(data)
    }
}

impl<R: Read + Seek> ArchiveReader for ZipReader<R> {
    fn list_entries(&mut self) -> Result<Vec<EntryRecord>> {
        Ok(self
            .directory
            .records
            .iter()
            .map(|header| EntryRecord {
                name: header.name.clone(),
                is_directory: header.is_directory(),
                size: header.uncompressed_size as u64,
                compressed_size: header.compressed_size as u64,
                crc32: header.crc32,
                method: header.method,
            })
            .collect())
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        self.read_by_name(name)
    }
}
