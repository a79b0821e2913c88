//! Error types for archive session operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when opening, reading, modifying, or persisting a zip
//! archive, along with a convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. Callers
//! that only care about the broad category of a failure can use
//! [`Error::kind`]:
//!
//! ```rust,no_run
//! use zipsession::{ArchiveSession, ErrorKind, OpenMode};
//!
//! fn open_or_report(path: &str) -> zipsession::Result<()> {
//!     match ArchiveSession::open(path, OpenMode::read()) {
//!         Ok(session) => {
//!             println!("{} entries", session.len());
//!             session.close()
//!         }
//!         Err(e) if e.kind() == ErrorKind::NotFound => {
//!             eprintln!("No archive at {}", path);
//!             Err(e)
//!         }
//!         Err(e) if e.is_codec_error() => {
//!             eprintln!("Not a readable zip archive: {}", e);
//!             Err(e)
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use std::io;
use std::path::PathBuf;

use crate::session::{Access, Disposition};

/// Broad classification of an [`Error`].
///
/// Several variants share a kind; for example both a missing archive and a
/// missing entry are [`ErrorKind::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The archive location or a requested entry does not exist.
    NotFound,
    /// Exclusive creation was requested but the archive already exists.
    AlreadyExists,
    /// The open mode is contradictory, or the session's access forbids the operation.
    InvalidMode,
    /// The archive could not be decoded or encoded.
    Codec,
    /// The host filesystem reported a failure.
    Io,
    /// A caller-supplied argument was rejected.
    InvalidArgument,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotFound => "not found",
            Self::AlreadyExists => "already exists",
            Self::InvalidMode => "invalid mode",
            Self::Codec => "codec error",
            Self::Io => "I/O error",
            Self::InvalidArgument => "invalid argument",
        };
        f.write_str(name)
    }
}

/// The main error type for archive session operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | File system operations |
/// | Lookup | [`ArchiveNotFound`][Self::ArchiveNotFound], [`EntryNotFound`][Self::EntryNotFound], [`ArchiveExists`][Self::ArchiveExists] | Missing or colliding paths |
/// | Mode | [`InvalidMode`][Self::InvalidMode], [`AccessDenied`][Self::AccessDenied] | Illegal open mode or operation |
/// | Format | [`InvalidFormat`][Self::InvalidFormat], [`CorruptHeader`][Self::CorruptHeader], [`CorruptEntry`][Self::CorruptEntry] | Invalid archive data |
/// | Compatibility | [`UnsupportedMethod`][Self::UnsupportedMethod], [`UnsupportedFeature`][Self::UnsupportedFeature] | Zip features outside this codec |
/// | Integrity | [`CrcMismatch`][Self::CrcMismatch] | Data corruption |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    ///
    /// This wraps [`std::io::Error`] and is returned when the backing file
    /// cannot be opened, written, renamed, or closed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive location does not exist and the open mode requires it.
    #[error("Archive not found: {}", path.display())]
    ArchiveNotFound {
        /// The location that was looked up.
        path: PathBuf,
    },

    /// Exclusive creation was requested but the archive already exists.
    ///
    /// The existing archive is left untouched.
    #[error("Archive already exists: {}", path.display())]
    ArchiveExists {
        /// The location that already exists.
        path: PathBuf,
    },

    /// The requested entry is not present in the session or the archive.
    #[error("Entry not found: {path}")]
    EntryNotFound {
        /// The entry name that was requested.
        path: String,
    },

    /// The disposition and access combination is contradictory.
    ///
    /// For example, truncating an archive that is only opened for reading.
    #[error("Invalid open mode: {disposition:?} with {access:?} access")]
    InvalidMode {
        /// The requested disposition.
        disposition: Disposition,
        /// The requested access.
        access: Access,
    },

    /// The session's access does not permit the operation.
    #[error("Operation '{operation}' not permitted with {access:?} access")]
    AccessDenied {
        /// The rejected operation.
        operation: &'static str,
        /// The access the session was opened with.
        access: Access,
    },

    /// The file is not a zip archive.
    ///
    /// The string contains a description of what was expected vs. found.
    #[error("Invalid zip format: {0}")]
    InvalidFormat(String),

    /// A directory record or local header is corrupt or truncated.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// An entry's compressed data could not be decoded.
    #[error("Corrupt entry '{name}': {reason}")]
    CorruptEntry {
        /// The entry name.
        name: String,
        /// A description of the failure.
        reason: String,
    },

    /// The archive uses a compression method not supported by this build.
    ///
    /// Common method IDs:
    /// - `0`: Stored (uncompressed)
    /// - `8`: Deflate
    /// - `12`: BZip2
    /// - `93`: Zstandard
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The zip method ID that is not supported.
        method: u16,
    },

    /// A zip feature required by the archive is not supported.
    #[error("Unsupported feature: {feature}")]
    UnsupportedFeature {
        /// The name of the unsupported feature.
        feature: &'static str,
    },

    /// The CRC checksum of an extracted entry does not match the directory record.
    #[error("CRC mismatch for entry '{entry_name}': expected {expected:#x}, got {actual:#x}")]
    CrcMismatch {
        /// The entry name with the CRC mismatch.
        entry_name: String,
        /// The expected CRC value from the archive.
        expected: u32,
        /// The actual CRC value of the extracted data.
        actual: u32,
    },

    /// An entry name failed validation.
    #[error("Invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// Invalid compression level specified.
    ///
    /// Compression levels must be in the range 0-9.
    #[error("invalid compression level {level}: must be 0-9")]
    InvalidCompressionLevel {
        /// The invalid level that was specified.
        level: u32,
    },

    /// A size or count exceeds what a non-Zip64 archive can represent.
    #[error("Resource limit exceeded: {0}")]
    ResourceLimitExceeded(String),
}

impl Error {
    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::ArchiveNotFound { .. } | Error::EntryNotFound { .. } => ErrorKind::NotFound,
            Error::ArchiveExists { .. } => ErrorKind::AlreadyExists,
            Error::InvalidMode { .. } | Error::AccessDenied { .. } => ErrorKind::InvalidMode,
            Error::InvalidFormat(_)
            | Error::CorruptHeader { .. }
            | Error::CorruptEntry { .. }
            | Error::UnsupportedMethod { .. }
            | Error::UnsupportedFeature { .. }
            | Error::CrcMismatch { .. } => ErrorKind::Codec,
            Error::InvalidArchivePath(_)
            | Error::InvalidCompressionLevel { .. }
            | Error::ResourceLimitExceeded(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Returns `true` if an archive or entry was missing.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Returns `true` if the archive could not be decoded or encoded.
    pub fn is_codec_error(&self) -> bool {
        self.kind() == ErrorKind::Codec
    }

    /// Returns `true` if this is a data corruption error.
    ///
    /// Corruption errors indicate the archive or extracted data is damaged.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::CrcMismatch { .. } | Error::CorruptHeader { .. } | Error::CorruptEntry { .. }
        )
    }

    /// Returns the entry name associated with this error, if any.
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Error::EntryNotFound { path } => Some(path),
            Error::CorruptEntry { name, .. } => Some(name),
            Error::CrcMismatch { entry_name, .. } => Some(entry_name),
            _ => None,
        }
    }
}

/// A specialized [`Result`](std::result::Result) type for archive session operations.
pub type Result<T> = std::result::Result<T, Error>;
