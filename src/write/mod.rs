//! Zip archive writing.
//!
//! [`ZipWriter`] streams entries into a temporary file next to the target and
//! renames it over the target on [`finish`](ZipWriter::finish), so the target
//! is either the previous archive or the complete new one. Dropping an
//! unfinished writer removes the temporary file.
//!
//! # Example
//!
//! ```rust,no_run
//! use zipsession::write::{WriteOptions, ZipWriter};
//!
//! let mut writer = ZipWriter::create_path("archive.zip", WriteOptions::default())?;
//! writer.add_bytes("hello.txt", b"Hello, World!")?;
//! writer.add_directory("empty")?;
//! writer.finish()?;
//! # Ok::<(), zipsession::Error>(())
//! ```

pub(crate) mod options;

pub use options::WriteOptions;

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::checksum::{Checksum, Crc32};
use crate::codec::{ArchiveWriter, CompressionMethod};
use crate::format::{
    CentralDirectoryHeader, DOS_DIRECTORY_ATTRIBUTE, EndOfCentralDirectory, FIXED_DOS_DATE,
    FIXED_DOS_TIME, LOCAL_HEADER_SIZE, LocalFileHeader, VERSION_DEFLATE, VERSION_STORED,
    ZIP64_SENTINEL_U16, ZIP64_SENTINEL_U32, flags,
};
use crate::read::{CentralDirectory, ZipReader};
use crate::{Error, Result};

/// Returns the temporary path used while rewriting `target`.
fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let file_name = target.file_name().ok_or_else(|| {
        Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' does not name a file", target.display()),
        ))
    })?;
    let mut temp_name = OsString::from(file_name);
    temp_name.push(".tmp");
    Ok(target.with_file_name(temp_name))
}

/// Largest record count that does not collide with the Zip64 sentinel.
const MAX_ENTRIES: usize = ZIP64_SENTINEL_U16 as usize - 1;

/// Narrows a size or offset, rejecting values that need Zip64.
fn limit_u32(value: u64, what: &str) -> Result<u32> {
    match u32::try_from(value) {
        Ok(v) if v != ZIP64_SENTINEL_U32 => Ok(v),
        _ => Err(Error::ResourceLimitExceeded(format!(
            "{} of {} bytes needs Zip64",
            what, value
        ))),
    }
}

fn too_many_entries() -> Error {
    Error::ResourceLimitExceeded(format!("more than {} entries", MAX_ENTRIES))
}

/// A write handle on a zip archive.
pub struct ZipWriter {
    target: PathBuf,
    temp_path: PathBuf,
    out: Option<BufWriter<File>>,
    offset: u64,
    directory: CentralDirectory,
    options: WriteOptions,
    finished: bool,
}

impl std::fmt::Debug for ZipWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipWriter")
            .field("target", &self.target)
            .field("entries", &self.directory.records.len())
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl ZipWriter {
    /// Starts a new, empty archive that will replace `path` on finish.
    pub fn create_path(path: impl AsRef<Path>, options: WriteOptions) -> Result<Self> {
        let target = path.as_ref().to_path_buf();
        let temp_path = temp_path_for(&target)?;
        let file = File::create(&temp_path)?;
        Ok(Self {
            target,
            temp_path,
            out: Some(BufWriter::new(file)),
            offset: 0,
            directory: CentralDirectory::default(),
            options,
            finished: false,
        })
    }

    /// Starts a rewrite of `path` that carries over its existing entries.
    ///
    /// Existing entries are copied without recompression. A missing archive
    /// starts empty.
    pub fn append_path(path: impl AsRef<Path>, options: WriteOptions) -> Result<Self> {
        let mut writer = Self::create_path(path, options)?;
        if writer.target.try_exists()? {
            let mut source = ZipReader::open_path(&writer.target)?;
            writer.carry_entries(&mut source)?;
            if writer.options.comment.is_none() && !source.comment().is_empty() {
                writer.directory.comment = source.comment().to_vec();
            }
        }
        Ok(writer)
    }

    /// Returns the path this writer will replace on finish.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Returns the number of records written or carried so far.
    pub fn len(&self) -> usize {
        self.directory.records.len()
    }

    /// Returns `true` if no records have been written or carried.
    pub fn is_empty(&self) -> bool {
        self.directory.records.is_empty()
    }

    /// Adds a data entry.
    pub fn add_bytes(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let size = limit_u32(data.len() as u64, "entry")?;
        let crc32 = Crc32::compute(data);
        let (method, payload) = self.encode(data)?;
        let version_needed = match method {
            CompressionMethod::Stored => VERSION_STORED,
            CompressionMethod::Deflate => VERSION_DEFLATE,
        };
        let header = self.new_record(name, version_needed, method.id(), crc32, size, &payload)?;
        self.write_record(header, &payload)
    }

    /// Adds a directory marker named `name/`.
    pub fn add_directory(&mut self, name: &str) -> Result<()> {
        let marker = format!("{}/", name.trim_end_matches('/'));
        let mut header = self.new_record(&marker, VERSION_DEFLATE, 0, 0, 0, &[])?;
        header.external_attrs = DOS_DIRECTORY_ATTRIBUTE;
        self.write_record(header, &[])
    }

    /// Writes the central directory and replaces the target archive.
    pub fn finish(mut self) -> Result<()> {
        let mut out = self.out.take().ok_or_else(|| {
            Error::Io(io::Error::other("archive writer already closed"))
        })?;

        let central_dir_offset = limit_u32(self.offset, "archive")?;
        let mut central_dir_size = 0u64;
        for header in &self.directory.records {
            header.write(&mut out)?;
            central_dir_size += header.encoded_size();
        }

        if self.directory.records.len() > MAX_ENTRIES {
            return Err(too_many_entries());
        }
        let count = self.directory.records.len() as u16;
        let comment = match &self.options.comment {
            Some(comment) => comment.as_bytes().to_vec(),
            None => std::mem::take(&mut self.directory.comment),
        };
        if comment.len() > u16::MAX as usize {
            return Err(Error::ResourceLimitExceeded(
                "archive comment longer than 65535 bytes".into(),
            ));
        }
        EndOfCentralDirectory {
            entries_on_disk: count,
            entries_total: count,
            central_dir_size: limit_u32(central_dir_size, "central directory")?,
            central_dir_offset,
            comment,
            ..Default::default()
        }
        .write(&mut out)?;

        let file = out.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&self.temp_path, &self.target)?;
        self.finished = true;
        log::debug!(
            "wrote {} records to {}",
            self.directory.records.len(),
            self.target.display()
        );
        Ok(())
    }

    /// Copies every record of `source` into this archive without decoding.
    fn carry_entries<R: io::Read + io::Seek>(&mut self, source: &mut ZipReader<R>) -> Result<()> {
        let records = source.records().to_vec();
        for record in records {
            let payload = source.read_raw(&record)?;
            let mut header = record;
            // A fresh local header carries the sizes, so no data descriptor follows.
            header.flags &= !flags::DATA_DESCRIPTOR;
            header.local_header_offset = limit_u32(self.offset, "archive")?;
            self.write_record(header, &payload)?;
        }
        Ok(())
    }

    fn encode(&self, data: &[u8]) -> Result<(CompressionMethod, Vec<u8>)> {
        match self.options.effective_method() {
            CompressionMethod::Stored => Ok((CompressionMethod::Stored, data.to_vec())),
            #[cfg(feature = "deflate")]
            CompressionMethod::Deflate => {
                let options = crate::codec::deflate::DeflateEncoderOptions::with_level(
                    self.options.level,
                );
                let compressed = crate::codec::deflate::compress(data, &options)?;
                if compressed.len() >= data.len() {
                    Ok((CompressionMethod::Stored, data.to_vec()))
                } else {
                    Ok((CompressionMethod::Deflate, compressed))
                }
            }
            #[cfg(not(feature = "deflate"))]
            CompressionMethod::Deflate => Err(Error::UnsupportedMethod {
                method: CompressionMethod::Deflate.id(),
            }),
        }
    }

    fn new_record(
        &self,
        name: &str,
        version_needed: u16,
        method: u16,
        crc32: u32,
        size: u32,
        payload: &[u8],
    ) -> Result<CentralDirectoryHeader> {
        if name.len() > u16::MAX as usize {
            return Err(Error::InvalidArchivePath(format!(
                "name of {} bytes exceeds 65535",
                name.len()
            )));
        }
        Ok(CentralDirectoryHeader {
            version_made_by: VERSION_DEFLATE,
            version_needed,
            flags: if name.is_ascii() { 0 } else { flags::UTF8 },
            method,
            mod_time: FIXED_DOS_TIME,
            mod_date: FIXED_DOS_DATE,
            crc32,
            compressed_size: limit_u32(payload.len() as u64, "compressed entry")?,
            uncompressed_size: size,
            disk_number_start: 0,
            internal_attrs: 0,
            external_attrs: 0,
            local_header_offset: limit_u32(self.offset, "archive")?,
            name: name.to_string(),
            extra: Vec::new(),
            comment: Vec::new(),
        })
    }

    /// Writes a local header and payload, then records the directory entry.
    fn write_record(&mut self, header: CentralDirectoryHeader, payload: &[u8]) -> Result<()> {
        if !self.directory.index.contains_key(&header.name)
            && self.directory.records.len() >= MAX_ENTRIES
        {
            return Err(too_many_entries());
        }
        let out = self.out.as_mut().ok_or_else(|| {
            Error::Io(io::Error::other("archive writer already closed"))
        })?;

        let local = LocalFileHeader {
            version_needed: header.version_needed,
            flags: header.flags,
            method: header.method,
            mod_time: header.mod_time,
            mod_date: header.mod_date,
            crc32: header.crc32,
            compressed_size: header.compressed_size,
            uncompressed_size: header.uncompressed_size,
            name_length: header.name.len() as u16,
            extra_length: 0,
        };
        local.write(out)?;
        out.write_all(header.name.as_bytes())?;
        out.write_all(payload)?;

        self.offset += LOCAL_HEADER_SIZE + header.name.len() as u64 + payload.len() as u64;
        self.directory.insert(header);
        Ok(())
    }
}

impl ArchiveWriter for ZipWriter {
    fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.add_bytes(name, data)
    }

    fn write_directory(&mut self, name: &str) -> Result<()> {
        self.add_directory(name)
    }

    fn finish(self) -> Result<()> {
        ZipWriter::finish(self)
    }
}

impl Drop for ZipWriter {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        drop(self.out.take());
        if let Err(e) = std::fs::remove_file(&self.temp_path) {
            if e.kind() != io::ErrorKind::NotFound {
                log::warn!(
                    "Failed to remove temporary archive '{}': {}",
                    self.temp_path.display(),
                    e
                );
            }
        }
    }
}
