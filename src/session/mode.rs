//! Open-mode configuration for archive sessions.
//!
//! An [`OpenMode`] pairs an access level with a disposition. Each access
//! level carries its own disposition enum, so pairs that make no sense (a
//! read-only session that truncates, a read-write session that appends) are
//! unrepresentable. [`OpenMode::new`] converts a loose
//! [`Disposition`]/[`Access`] pair and rejects contradictory ones.
//!
//! # Example
//!
//! ```rust
//! use zipsession::{Access, Disposition, OpenMode, WriteDisposition};
//!
//! let mode = OpenMode::new(Disposition::Append, Access::Write)?;
//! assert_eq!(mode, OpenMode::Write(WriteDisposition::Append));
//!
//! assert!(OpenMode::new(Disposition::Truncate, Access::Read).is_err());
//! # Ok::<(), zipsession::Error>(())
//! ```

use crate::{Error, Result};

/// Which operations a session permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Entries may be read but not changed or persisted.
    Read,
    /// Entries may be changed and persisted; existing entries are not loaded.
    Write,
    /// Entries are loaded at open and may be changed and persisted.
    ReadWrite,
}

impl Access {
    /// Returns `true` if the session loads entries at open.
    pub fn can_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    /// Returns `true` if the session may change and persist entries.
    pub fn can_write(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// What happens to the archive location at open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Keep an existing archive; create an empty one if missing. Write only.
    Append,
    /// Replace any existing archive with an empty one.
    Create,
    /// Create an empty archive; fail if one exists.
    CreateNew,
    /// Keep an existing archive; fail if missing.
    Open,
    /// Keep an existing archive; create an empty one if missing.
    OpenOrCreate,
    /// Replace an existing archive with an empty one; fail if missing.
    Truncate,
}

impl Disposition {
    /// Returns `true` if opening fails when no archive exists.
    pub fn requires_existing(self) -> bool {
        matches!(self, Self::Open | Self::Truncate)
    }

    /// Returns `true` if opening fails when an archive already exists.
    pub fn rejects_existing(self) -> bool {
        matches!(self, Self::CreateNew)
    }

    /// Returns `true` if an existing archive is replaced by an empty one.
    pub fn discards_existing(self) -> bool {
        matches!(self, Self::Create | Self::Truncate)
    }
}

/// Dispositions legal with [`Access::Read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReadDisposition {
    /// The archive must exist.
    #[default]
    Open,
    /// An empty archive is created if none exists.
    OpenOrCreate,
}

/// Dispositions legal with [`Access::Write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WriteDisposition {
    /// The archive must exist.
    Open,
    /// An empty archive is created if none exists.
    OpenOrCreate,
    /// Any existing archive is replaced.
    Create,
    /// The archive must not exist.
    CreateNew,
    /// The archive must exist and is emptied.
    Truncate,
    /// Existing entries are kept and new ones added.
    #[default]
    Append,
}

/// Dispositions legal with [`Access::ReadWrite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReadWriteDisposition {
    /// The archive must exist.
    Open,
    /// An empty archive is created if none exists.
    #[default]
    OpenOrCreate,
    /// Any existing archive is replaced.
    Create,
    /// The archive must not exist.
    CreateNew,
    /// The archive must exist and is emptied.
    Truncate,
}

impl From<ReadDisposition> for Disposition {
    fn from(d: ReadDisposition) -> Self {
        match d {
            ReadDisposition::Open => Self::Open,
            ReadDisposition::OpenOrCreate => Self::OpenOrCreate,
        }
    }
}

impl From<WriteDisposition> for Disposition {
    fn from(d: WriteDisposition) -> Self {
        match d {
            WriteDisposition::Open => Self::Open,
            WriteDisposition::OpenOrCreate => Self::OpenOrCreate,
            WriteDisposition::Create => Self::Create,
            WriteDisposition::CreateNew => Self::CreateNew,
            WriteDisposition::Truncate => Self::Truncate,
            WriteDisposition::Append => Self::Append,
        }
    }
}

impl From<ReadWriteDisposition> for Disposition {
    fn from(d: ReadWriteDisposition) -> Self {
        match d {
            ReadWriteDisposition::Open => Self::Open,
            ReadWriteDisposition::OpenOrCreate => Self::OpenOrCreate,
            ReadWriteDisposition::Create => Self::Create,
            ReadWriteDisposition::CreateNew => Self::CreateNew,
            ReadWriteDisposition::Truncate => Self::Truncate,
        }
    }
}

/// How a session opens its archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// Read-only access.
    Read(ReadDisposition),
    /// Write-only access.
    Write(WriteDisposition),
    /// Read and write access.
    ReadWrite(ReadWriteDisposition),
}

impl Default for OpenMode {
    fn default() -> Self {
        Self::read()
    }
}

impl OpenMode {
    /// Builds a mode from a loose disposition and access pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMode`] if the pair is contradictory: any
    /// disposition that creates or empties an archive with read-only access,
    /// or [`Disposition::Append`] with anything but write-only access.
    pub fn new(disposition: Disposition, access: Access) -> Result<Self> {
        let invalid = || Error::InvalidMode {
            disposition,
            access,
        };
        let mode = match access {
            Access::Read => Self::Read(match disposition {
                Disposition::Open => ReadDisposition::Open,
                Disposition::OpenOrCreate => ReadDisposition::OpenOrCreate,
                _ => return Err(invalid()),
            }),
            Access::Write => Self::Write(match disposition {
                Disposition::Append => WriteDisposition::Append,
                Disposition::Create => WriteDisposition::Create,
                Disposition::CreateNew => WriteDisposition::CreateNew,
                Disposition::Open => WriteDisposition::Open,
                Disposition::OpenOrCreate => WriteDisposition::OpenOrCreate,
                Disposition::Truncate => WriteDisposition::Truncate,
            }),
            Access::ReadWrite => Self::ReadWrite(match disposition {
                Disposition::Create => ReadWriteDisposition::Create,
                Disposition::CreateNew => ReadWriteDisposition::CreateNew,
                Disposition::Open => ReadWriteDisposition::Open,
                Disposition::OpenOrCreate => ReadWriteDisposition::OpenOrCreate,
                Disposition::Truncate => ReadWriteDisposition::Truncate,
                Disposition::Append => return Err(invalid()),
            }),
        };
        Ok(mode)
    }

    /// Read-only access to an existing archive.
    pub fn read() -> Self {
        Self::Read(ReadDisposition::Open)
    }

    /// Read-write access, creating an empty archive if none exists.
    pub fn read_write() -> Self {
        Self::ReadWrite(ReadWriteDisposition::OpenOrCreate)
    }

    /// Read-write access to a fresh empty archive, replacing any existing one.
    pub fn create() -> Self {
        Self::ReadWrite(ReadWriteDisposition::Create)
    }

    /// Read-write access to a fresh archive that must not already exist.
    pub fn create_new() -> Self {
        Self::ReadWrite(ReadWriteDisposition::CreateNew)
    }

    /// Write-only access that keeps existing entries.
    pub fn append() -> Self {
        Self::Write(WriteDisposition::Append)
    }

    /// Returns the access level.
    pub fn access(self) -> Access {
        match self {
            Self::Read(_) => Access::Read,
            Self::Write(_) => Access::Write,
            Self::ReadWrite(_) => Access::ReadWrite,
        }
    }

    /// Returns the disposition.
    pub fn disposition(self) -> Disposition {
        match self {
            Self::Read(d) => d.into(),
            Self::Write(d) => d.into(),
            Self::ReadWrite(d) => d.into(),
        }
    }
}

impl TryFrom<(Disposition, Access)> for OpenMode {
    type Error = Error;

    fn try_from((disposition, access): (Disposition, Access)) -> Result<Self> {
        Self::new(disposition, access)
    }
}
