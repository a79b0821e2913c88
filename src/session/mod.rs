//! The archive session: an in-memory entry map over one archive.
//!
//! An [`ArchiveSession`] loads every entry when it opens (for modes that
//! permit reading), serves `get`/`set`/`delete` from memory, and rewrites the
//! whole archive in one pass on [`flush`](ArchiveSession::flush),
//! [`close`](ArchiveSession::close), or drop. Nothing is rewritten unless an
//! entry changed or a flush is forced.
//!
//! The session holds at most one codec handle at a time. It moves between
//! three states:
//!
//! - [`SessionState::Reading`]: a read handle is open, after loading entries
//!   or after a single-entry fallback read.
//! - [`SessionState::Writing`]: a write handle is open, held by write-only
//!   sessions from open until the first flush.
//! - [`SessionState::Closed`]: no handle is open, after a persist pass or a
//!   codec failure.
//!
//! # Example
//!
//! ```rust,no_run
//! use zipsession::{ArchiveSession, OpenMode};
//!
//! let mut session = ArchiveSession::open("report.zip", OpenMode::read_write())?;
//! session.set("summary.txt", b"all green".to_vec())?;
//! session.delete("draft.txt")?;
//! assert!(session.has("summary.txt"));
//! session.close()?;
//! # Ok::<(), zipsession::Error>(())
//! ```

mod mode;

pub use mode::{
    Access, Disposition, OpenMode, ReadDisposition, ReadWriteDisposition, WriteDisposition,
};

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::codec::{ArchiveReader, ArchiveWriter, Codec, ZipCodec};
use crate::{ArchivePath, Error, Result};

/// Which codec handle a session currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// A read handle is open.
    Reading,
    /// A write handle is open.
    Writing,
    /// No handle is open.
    Closed,
}

enum Handle<R, W> {
    Reading(R),
    Writing(W),
    Closed,
}

/// Addresses a stored entry: leading separators are ignored.
fn entry_key(name: &str) -> &str {
    ArchivePath::strip_root(name)
}

/// Returns `true` if the first of the sorted `keys` lies inside directory `dir`.
fn any_inside<'a>(mut keys: impl Iterator<Item = &'a String>, dir: &str) -> bool {
    keys.next()
        .is_some_and(|key| key.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/')))
}

/// An open archive with its entries cached in memory.
///
/// See the [module documentation](self) for the lifecycle.
pub struct ArchiveSession<C: Codec = ZipCodec> {
    codec: C,
    location: PathBuf,
    mode: OpenMode,
    handle: Handle<C::Reader, C::Writer>,
    entries: BTreeMap<String, Vec<u8>>,
    directories: BTreeSet<String>,
    dirty: bool,
    /// `false` while a kept archive's entries have not been loaded.
    materialized: bool,
    closed: bool,
}

impl<C: Codec> std::fmt::Debug for ArchiveSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveSession")
            .field("location", &self.location)
            .field("mode", &self.mode)
            .field("state", &self.state())
            .field("entries", &self.entries.len())
            .field("directories", &self.directories.len())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl ArchiveSession<ZipCodec> {
    /// Opens the zip archive at `location` with the default codec.
    ///
    /// # Errors
    ///
    /// See [`open_with_codec`](Self::open_with_codec).
    pub fn open(location: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        Self::open_with_codec(location, mode, ZipCodec::default())
    }
}

impl<C: Codec> ArchiveSession<C> {
    /// Opens the archive at `location` through `codec`.
    ///
    /// Dispositions that create or empty the archive commit an empty archive
    /// first. Modes with read access then load every entry; write-only modes
    /// keep an append handle open instead.
    ///
    /// # Errors
    ///
    /// - [`Error::ArchiveNotFound`] for [`Disposition::Open`] or
    ///   [`Disposition::Truncate`] when nothing exists at `location`.
    /// - [`Error::ArchiveExists`] for [`Disposition::CreateNew`] when an
    ///   archive exists; the archive is left untouched.
    /// - Codec and I/O errors from opening or loading the archive.
    pub fn open_with_codec(location: impl AsRef<Path>, mode: OpenMode, codec: C) -> Result<Self> {
        let location = location.as_ref().to_path_buf();
        let disposition = mode.disposition();

        let exists = codec.exists(&location)?;
        if exists && disposition.rejects_existing() {
            return Err(Error::ArchiveExists { path: location });
        }
        if !exists && disposition.requires_existing() {
            return Err(Error::ArchiveNotFound { path: location });
        }

        let kept = exists && !disposition.discards_existing();
        if !kept {
            codec.open_for_write(&location, false)?.finish()?;
            log::debug!("created empty archive at {}", location.display());
        }

        let mut session = Self {
            codec,
            location,
            mode,
            handle: Handle::Closed,
            entries: BTreeMap::new(),
            directories: BTreeSet::new(),
            dirty: false,
            materialized: !kept,
            closed: false,
        };

        if mode.access().can_read() {
            session.materialize()?;
        } else {
            let writer = session.codec.open_for_write(&session.location, true)?;
            session.handle = Handle::Writing(writer);
        }
        Ok(session)
    }

    /// Returns the archive location.
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Returns the mode the session was opened with.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Returns the codec the session drives.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Returns which codec handle is currently open.
    pub fn state(&self) -> SessionState {
        match self.handle {
            Handle::Reading(_) => SessionState::Reading,
            Handle::Writing(_) => SessionState::Writing,
            Handle::Closed => SessionState::Closed,
        }
    }

    /// Returns `true` if entries changed since the last persist.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the number of cached data entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no data entries are cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over cached entry names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over recorded directory markers in sorted order.
    pub fn directories(&self) -> impl Iterator<Item = &str> + '_ {
        self.directories.iter().map(String::as_str)
    }

    /// Returns `true` if a data entry named `name` is cached.
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(entry_key(name))
    }

    /// Returns `true` if `name` is a recorded directory or contains an entry.
    pub fn has_directory(&self, name: &str) -> bool {
        let dir = entry_key(name).trim_end_matches('/');
        if dir.is_empty() {
            return false;
        }
        self.directories.contains(dir)
            || any_inside(self.directories.range(format!("{}/", dir)..), dir)
            || any_inside(self.entries.range(format!("{}/", dir)..).map(|(k, _)| k), dir)
    }

    /// Returns a copy of the content of entry `name`.
    ///
    /// An entry that is not cached is read from the archive when the session
    /// has not loaded it yet (write-only sessions over a kept archive).
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if no such entry exists, or a codec
    /// error if the fallback read fails.
    pub fn get(&mut self, name: &str) -> Result<Vec<u8>> {
        let key = entry_key(name);
        if let Some(data) = self.entries.get(key) {
            return Ok(data.clone());
        }
        if self.materialized || key.is_empty() {
            return Err(Error::EntryNotFound {
                path: key.to_string(),
            });
        }

        log::trace!(
            "reading '{}' directly from {}",
            key,
            self.location.display()
        );
        let key = key.to_string();
        let data = match self.read_single(&key) {
            Ok(data) => data,
            Err(e) => {
                if !e.is_not_found() {
                    self.handle = Handle::Closed;
                }
                return Err(e);
            }
        };
        self.entries.insert(key, data.clone());
        Ok(data)
    }

    /// Reads the data entry stored under `key`, matching record names the
    /// way `read_all` does. The last matching record wins.
    fn read_single(&mut self, key: &str) -> Result<Vec<u8>> {
        let reader = self.reader()?;
        let record_name = reader
            .list_entries()?
            .into_iter()
            .rev()
            .find(|record| !record.is_directory && entry_key(&record.name) == key)
            .map(|record| record.name)
            .ok_or_else(|| Error::EntryNotFound {
                path: key.to_string(),
            })?;
        reader.read_entry(&record_name)
    }

    /// Inserts or replaces entry `name`.
    ///
    /// No codec work happens until the next persist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessDenied`] on a read-only session and
    /// [`Error::InvalidArchivePath`] if `name` is not a valid entry name.
    pub fn set(&mut self, name: &str, content: impl Into<Vec<u8>>) -> Result<()> {
        self.require_write("set")?;
        let path = ArchivePath::new(name)?;
        self.entries.insert(path.into_string(), content.into());
        self.dirty = true;
        Ok(())
    }

    /// Removes entry `name`, returning whether it existed.
    ///
    /// Deleting a missing entry is a successful no-op and leaves the session
    /// clean.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessDenied`] on a read-only session, or a codec
    /// error if unloaded entries must be read first.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        self.require_write("delete")?;
        self.ensure_materialized()?;
        let removed = self.entries.remove(entry_key(name)).is_some();
        if removed {
            self.dirty = true;
        }
        Ok(removed)
    }

    /// Records an explicit directory marker.
    ///
    /// Markers are written only for directories that hold no data entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessDenied`] on a read-only session and
    /// [`Error::InvalidArchivePath`] if `name` is not a valid directory name.
    pub fn add_directory(&mut self, name: &str) -> Result<()> {
        self.require_write("add_directory")?;
        let path = ArchivePath::directory(name)?;
        if self.directories.insert(path.into_string()) {
            self.dirty = true;
        }
        Ok(())
    }

    /// Rewrites the archive from the cached entries.
    ///
    /// Does nothing unless the session is dirty or `force` is set. On
    /// success the session is clean and holds no handle. On failure the
    /// session stays dirty with its entries intact, so the flush can be
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessDenied`] for a forced flush of a read-only
    /// session, or the codec error that aborted the rewrite.
    pub fn flush(&mut self, force: bool) -> Result<()> {
        if !self.dirty && !force {
            return Ok(());
        }
        self.require_write("flush")?;
        self.ensure_materialized()?;

        match self.write_all() {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.handle = Handle::Closed;
                Err(e)
            }
        }
    }

    /// Persists pending changes and closes the session.
    ///
    /// Prefer this over dropping the session when persist failures must be
    /// handled.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        let result = self.flush(false);
        self.handle = Handle::Closed;
        result
    }

    fn require_write(&self, operation: &'static str) -> Result<()> {
        let access = self.mode.access();
        if access.can_write() {
            Ok(())
        } else {
            Err(Error::AccessDenied { operation, access })
        }
    }

    /// Returns the read handle, closing a write handle to open it.
    fn reader(&mut self) -> Result<&mut C::Reader> {
        if !matches!(self.handle, Handle::Reading(_)) {
            self.handle = Handle::Closed;
            let reader = self.codec.open_for_read(&self.location)?;
            self.handle = Handle::Reading(reader);
        }
        match &mut self.handle {
            Handle::Reading(reader) => Ok(reader),
            Handle::Writing(_) | Handle::Closed => unreachable!("read handle opened above"),
        }
    }

    fn ensure_materialized(&mut self) -> Result<()> {
        if self.materialized {
            Ok(())
        } else {
            self.materialize()
        }
    }

    /// Loads every entry not already cached.
    fn materialize(&mut self) -> Result<()> {
        let result = self.read_all();
        if result.is_err() {
            self.handle = Handle::Closed;
        }
        result
    }

    fn read_all(&mut self) -> Result<()> {
        let records = self.reader()?.list_entries()?;

        let mut wanted = Vec::new();
        let mut directories = Vec::new();
        for record in records {
            let name = entry_key(&record.name);
            if record.is_directory {
                let dir = name.trim_end_matches('/');
                if !dir.is_empty() {
                    directories.push(dir.to_string());
                }
                continue;
            }
            // Cached entries were set by the caller and take precedence.
            if name.is_empty() || self.entries.contains_key(name) {
                continue;
            }
            wanted.push((name.to_string(), record.name.clone()));
        }

        let reader = self.reader()?;
        let mut loaded = Vec::with_capacity(wanted.len());
        for (name, record_name) in wanted {
            let data = reader.read_entry(&record_name)?;
            loaded.push((name, data));
        }

        log::debug!(
            "loaded {} entries and {} directories from {}",
            loaded.len(),
            directories.len(),
            self.location.display()
        );
        self.entries.extend(loaded);
        self.directories.extend(directories);
        self.materialized = true;
        Ok(())
    }

    fn write_all(&mut self) -> Result<()> {
        self.handle = Handle::Closed;
        let mut writer = self.codec.open_for_write(&self.location, false)?;

        for (name, data) in &self.entries {
            writer.write_entry(name, data)?;
        }
        let mut markers = 0;
        for dir in &self.directories {
            let has_entries = any_inside(
                self.entries.range(format!("{}/", dir)..).map(|(k, _)| k),
                dir,
            );
            if !has_entries {
                writer.write_directory(dir)?;
                markers += 1;
            }
        }
        writer.finish()?;

        log::debug!(
            "persisted {} entries and {} directory markers to {}",
            self.entries.len(),
            markers,
            self.location.display()
        );
        Ok(())
    }
}

impl<C: Codec> Drop for ArchiveSession<C> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.flush(false) {
            log::error!(
                "Failed to persist archive '{}' on drop: {}",
                self.location.display(),
                e
            );
        }
        self.handle = Handle::Closed;
    }
}
