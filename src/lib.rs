//! # zipsession
//!
//! A key-value view over a zip archive with batched rewrites.
//!
//! An [`ArchiveSession`] decompresses every entry into memory when it opens,
//! lets the caller read, replace, and delete entries by name without touching
//! the file, and rewrites the archive in one pass when flushed, closed, or
//! dropped. Sessions that change nothing never rewrite anything.
//!
//! ## Quick Start
//!
//! ### Editing an Archive
//!
//! ```rust,no_run
//! use zipsession::{ArchiveSession, OpenMode, Result};
//!
//! fn main() -> Result<()> {
//!     let mut session = ArchiveSession::open("book.xlsx", OpenMode::read_write())?;
//!
//!     for name in session.names() {
//!         println!("{}", name);
//!     }
//!
//!     let workbook = session.get("xl/workbook.xml")?;
//!     session.set("xl/workbook.xml", workbook)?;
//!     session.delete("xl/calcChain.xml")?;
//!
//!     // Rewrites the archive once, with every change applied.
//!     session.close()
//! }
//! ```
//!
//! ### Creating an Archive
//!
//! ```rust,no_run
//! use zipsession::{ArchiveSession, OpenMode, Result};
//!
//! fn main() -> Result<()> {
//!     let mut session = ArchiveSession::open("new.zip", OpenMode::create_new())?;
//!     session.set("hello.txt", "Hello, World!")?;
//!     session.add_directory("empty")?;
//!     session.flush(false)?;
//!     Ok(())
//! }
//! ```
//!
//! ### Open Modes
//!
//! An [`OpenMode`] combines an [`Access`] level with a disposition. Only
//! meaningful combinations can be constructed:
//!
//! ```rust
//! use zipsession::{Access, Disposition, OpenMode, ReadDisposition};
//!
//! let mode = OpenMode::Read(ReadDisposition::OpenOrCreate);
//! assert_eq!(mode.access(), Access::Read);
//!
//! // Truncating a read-only archive makes no sense.
//! assert!(OpenMode::new(Disposition::Truncate, Access::Read).is_err());
//! ```
//!
//! ## Codecs
//!
//! Sessions drive the archive through the [`Codec`] trait. [`ZipCodec`] is
//! the default and supports stored and deflate entries; the zip codec's
//! reader and writer are also usable on their own through [`read::ZipReader`]
//! and [`write::ZipWriter`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `deflate` | Yes | Deflate compression via flate2 |
//! | `cli` | No | The `zipsession` command-line tool |
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade. Persist failures during drop
//! are reported at error level, since they cannot be returned.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive_path;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod format;
pub mod read;
pub mod session;
pub mod write;

pub use archive_path::ArchivePath;
pub use error::{Error, ErrorKind, Result};

// Re-export the session API at crate root for convenience
pub use session::{
    Access, ArchiveSession, Disposition, OpenMode, ReadDisposition, ReadWriteDisposition,
    SessionState, WriteDisposition,
};

// Re-export the codec API
pub use codec::{ArchiveReader, ArchiveWriter, Codec, CompressionMethod, EntryRecord, ZipCodec};
pub use write::WriteOptions;
