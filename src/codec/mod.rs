//! The archive codec capability and its zip implementation.
//!
//! An [`ArchiveSession`](crate::ArchiveSession) never touches the archive
//! file directly. It drives a [`Codec`], which hands out one handle at a time:
//! an [`ArchiveReader`] for extraction or an [`ArchiveWriter`] for insertion.
//! [`ZipCodec`] is the production implementation; tests substitute an
//! in-memory double.
//!
//! Handles close when dropped. Dropping an [`ArchiveWriter`] without calling
//! [`finish`](ArchiveWriter::finish) discards everything written through it.

#[cfg(feature = "deflate")]
pub mod deflate;

use std::path::Path;

use crate::read::ZipReader;
use crate::write::{WriteOptions, ZipWriter};
use crate::{Error, Result};

/// Compression methods understood by the zip codec.
///
/// The default is [`Deflate`](Self::Deflate) when the `deflate` feature is
/// enabled and [`Stored`](Self::Stored) otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CompressionMethod {
    /// No compression.
    Stored = 0,
    /// Raw deflate.
    Deflate = 8,
}

impl Default for CompressionMethod {
    fn default() -> Self {
        if cfg!(feature = "deflate") {
            Self::Deflate
        } else {
            Self::Stored
        }
    }
}

impl CompressionMethod {
    /// Returns the zip method ID.
    pub fn id(self) -> u16 {
        self as u16
    }

    /// Maps a zip method ID to a supported method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] for any other ID, or for deflate
    /// when the `deflate` feature is disabled.
    pub fn from_id(id: u16) -> Result<Self> {
        match id {
            0 => Ok(Self::Stored),
            #[cfg(feature = "deflate")]
            8 => Ok(Self::Deflate),
            other => Err(Error::UnsupportedMethod { method: other }),
        }
    }
}

/// One directory record as reported by [`ArchiveReader::list_entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Record name as stored in the archive; directory markers end in `/`.
    pub name: String,
    /// `true` for directory markers.
    pub is_directory: bool,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Compressed size in bytes.
    pub compressed_size: u64,
    /// CRC-32 of the uncompressed content.
    pub crc32: u32,
    /// Raw zip method ID.
    pub method: u16,
}

/// Opens read and write handles on archives at filesystem locations.
pub trait Codec {
    /// Handle type used for extraction.
    type Reader: ArchiveReader;
    /// Handle type used for insertion.
    type Writer: ArchiveWriter;

    /// Returns whether an archive exists at `location`.
    fn exists(&self, location: &Path) -> Result<bool>;

    /// Opens an existing archive for reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArchiveNotFound`] if nothing exists at `location`, or a
    /// codec error if the directory cannot be parsed.
    fn open_for_read(&self, location: &Path) -> Result<Self::Reader>;

    /// Opens an archive for writing.
    ///
    /// With `append` the existing entries are carried into the result (a
    /// missing archive starts empty); without it the result holds only what
    /// is written through the handle. Nothing at `location` changes until
    /// [`ArchiveWriter::finish`] succeeds.
    fn open_for_write(&self, location: &Path, append: bool) -> Result<Self::Writer>;
}

/// A read handle on one archive.
pub trait ArchiveReader {
    /// Lists every directory record, data entries and directory markers alike.
    fn list_entries(&mut self) -> Result<Vec<EntryRecord>>;

    /// Reads and decompresses the entry named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if no data entry has that name.
    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>>;
}

/// A write handle on one archive.
pub trait ArchiveWriter {
    /// Writes a data entry, replacing any earlier entry of the same name.
    fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<()>;

    /// Writes a directory marker for `name` (without the trailing `/`).
    fn write_directory(&mut self, name: &str) -> Result<()>;

    /// Commits the archive and closes the handle.
    fn finish(self) -> Result<()>;
}

/// The zip codec backed by the host filesystem.
///
/// # Example
///
/// ```rust,no_run
/// use zipsession::{ArchiveSession, CompressionMethod, OpenMode, WriteOptions, ZipCodec};
///
/// let codec = ZipCodec::new().with_options(
///     WriteOptions::new().method(CompressionMethod::Deflate).level(9)?,
/// );
/// let mut session = ArchiveSession::open_with_codec("book.xlsx", OpenMode::read_write(), codec)?;
/// session.set("docProps/app.xml", b"<Properties/>".to_vec())?;
/// session.close()?;
/// # Ok::<(), zipsession::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ZipCodec {
    options: WriteOptions,
}

impl ZipCodec {
    /// Creates a codec with default write options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the options used when writing entries.
    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the options used when writing entries.
    pub fn options(&self) -> &WriteOptions {
        &self.options
    }
}

impl Codec for ZipCodec {
    type Reader = ZipReader<std::io::BufReader<std::fs::File>>;
    type Writer = ZipWriter;

    fn exists(&self, location: &Path) -> Result<bool> {
        Ok(location.try_exists()?)
    }

    fn open_for_read(&self, location: &Path) -> Result<Self::Reader> {
        ZipReader::open_path(location)
    }

    fn open_for_write(&self, location: &Path, append: bool) -> Result<Self::Writer> {
        if append {
            ZipWriter::append_path(location, self.options.clone())
        } else {
            ZipWriter::create_path(location, self.options.clone())
        }
    }
}
