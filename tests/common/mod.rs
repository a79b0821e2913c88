//! Shared test utilities for integration tests.
//!
//! Provides archive-building helpers for on-disk zip files and
//! [`MemoryCodec`], an in-memory codec that records every handle it opens
//! and can be told to fail reads or writes.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use zipsession::write::ZipWriter;
use zipsession::{ArchiveReader, ArchiveWriter, Codec, EntryRecord, Error, WriteOptions};

/// Writes a zip archive at `path` holding `entries`.
///
/// Names ending in `/` become directory markers.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) -> zipsession::Result<()> {
    let mut writer = ZipWriter::create_path(path, WriteOptions::default())?;
    for (name, data) in entries {
        match name.strip_suffix('/') {
            Some(dir) => writer.add_directory(dir)?,
            None => writer.add_bytes(name, data)?,
        }
    }
    writer.finish()
}

/// Returns the error of a result that must have failed.
pub fn expect_err<T, E>(result: Result<T, E>) -> E {
    match result {
        Ok(_) => panic!("Expected error but got Ok"),
        Err(e) => e,
    }
}

/// Counts of codec operations performed through a [`MemoryCodec`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoStats {
    /// Read handles opened.
    pub reads_opened: usize,
    /// Write handles opened.
    pub writes_opened: usize,
    /// Entries decoded through read handles.
    pub entries_read: usize,
    /// Entries and markers written through write handles.
    pub entries_written: usize,
    /// Write handles that committed.
    pub commits: usize,
}

impl IoStats {
    /// Total number of handles opened.
    pub fn handles_opened(&self) -> usize {
        self.reads_opened + self.writes_opened
    }
}

/// One stored record: name (markers end in `/`) and content.
type Records = Vec<(String, Vec<u8>)>;

#[derive(Default)]
struct Store {
    archives: HashMap<PathBuf, Records>,
    stats: IoStats,
    open_handles: usize,
    max_open_handles: usize,
    fail_reads: bool,
    fail_writes: bool,
}

impl Store {
    fn handle_opened(&mut self) {
        self.open_handles += 1;
        self.max_open_handles = self.max_open_handles.max(self.open_handles);
    }
}

/// An in-memory codec that records I/O and can inject read and write failures.
///
/// Clones share the same store, so a test keeps one clone to inspect while
/// the session owns another.
#[derive(Clone, Default)]
pub struct MemoryCodec {
    store: Rc<RefCell<Store>>,
}

impl MemoryCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an archive directly, bypassing the counters.
    pub fn insert_archive(&self, location: &Path, entries: &[(&str, &[u8])]) {
        let records = entries
            .iter()
            .map(|(name, data)| (name.to_string(), data.to_vec()))
            .collect();
        self.store
            .borrow_mut()
            .archives
            .insert(location.to_path_buf(), records);
    }

    /// Returns the committed records at `location`.
    pub fn archive(&self, location: &Path) -> Option<Vec<(String, Vec<u8>)>> {
        self.store.borrow().archives.get(location).cloned()
    }

    /// Returns the committed record names at `location`.
    pub fn names(&self, location: &Path) -> Vec<String> {
        self.archive(location)
            .unwrap_or_default()
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    pub fn stats(&self) -> IoStats {
        self.store.borrow().stats
    }

    pub fn reset_stats(&self) {
        self.store.borrow_mut().stats = IoStats::default();
    }

    /// Number of handles currently open.
    pub fn open_handles(&self) -> usize {
        self.store.borrow().open_handles
    }

    /// Largest number of handles that were ever open at once.
    pub fn max_open_handles(&self) -> usize {
        self.store.borrow().max_open_handles
    }

    /// Makes every subsequent entry read fail until turned off.
    ///
    /// Failures are corruption errors, as a damaged archive would report.
    pub fn fail_reads(&self, fail: bool) {
        self.store.borrow_mut().fail_reads = fail;
    }

    /// Makes every subsequent entry write fail until turned off.
    pub fn fail_writes(&self, fail: bool) {
        self.store.borrow_mut().fail_writes = fail;
    }
}

impl Codec for MemoryCodec {
    type Reader = MemoryReader;
    type Writer = MemoryWriter;

    fn exists(&self, location: &Path) -> zipsession::Result<bool> {
        Ok(self.store.borrow().archives.contains_key(location))
    }

    fn open_for_read(&self, location: &Path) -> zipsession::Result<MemoryReader> {
        let mut store = self.store.borrow_mut();
        let records = store
            .archives
            .get(location)
            .cloned()
            .ok_or_else(|| Error::ArchiveNotFound {
                path: location.to_path_buf(),
            })?;
        store.stats.reads_opened += 1;
        store.handle_opened();
        Ok(MemoryReader {
            store: Rc::clone(&self.store),
            records,
        })
    }

    fn open_for_write(&self, location: &Path, append: bool) -> zipsession::Result<MemoryWriter> {
        let mut store = self.store.borrow_mut();
        let records = if append {
            store.archives.get(location).cloned().unwrap_or_default()
        } else {
            Vec::new()
        };
        store.stats.writes_opened += 1;
        store.handle_opened();
        Ok(MemoryWriter {
            store: Rc::clone(&self.store),
            location: location.to_path_buf(),
            records,
        })
    }
}

/// Read handle of a [`MemoryCodec`].
pub struct MemoryReader {
    store: Rc<RefCell<Store>>,
    records: Records,
}

impl ArchiveReader for MemoryReader {
    fn list_entries(&mut self) -> zipsession::Result<Vec<EntryRecord>> {
        Ok(self
            .records
            .iter()
            .map(|(name, data)| EntryRecord {
                name: name.clone(),
                is_directory: name.ends_with('/'),
                size: data.len() as u64,
                compressed_size: data.len() as u64,
                crc32: 0,
                method: 0,
            })
            .collect())
    }

    fn read_entry(&mut self, name: &str) -> zipsession::Result<Vec<u8>> {
        if self.store.borrow().fail_reads {
            return Err(Error::CorruptEntry {
                name: name.to_string(),
                reason: "injected read failure".into(),
            });
        }
        let data = self
            .records
            .iter()
            .rev()
            .find(|(n, _)| n == name && !n.ends_with('/'))
            .map(|(_, data)| data.clone())
            .ok_or_else(|| Error::EntryNotFound {
                path: name.to_string(),
            })?;
        self.store.borrow_mut().stats.entries_read += 1;
        Ok(data)
    }
}

impl Drop for MemoryReader {
    fn drop(&mut self) {
        self.store.borrow_mut().open_handles -= 1;
    }
}

/// Write handle of a [`MemoryCodec`]; commits on finish.
pub struct MemoryWriter {
    store: Rc<RefCell<Store>>,
    location: PathBuf,
    records: Records,
}

impl MemoryWriter {
    fn push(&mut self, name: String, data: Vec<u8>) -> zipsession::Result<()> {
        let mut store = self.store.borrow_mut();
        if store.fail_writes {
            return Err(Error::Io(io::Error::other("injected write failure")));
        }
        store.stats.entries_written += 1;
        self.records.retain(|(n, _)| *n != name);
        self.records.push((name, data));
        Ok(())
    }
}

impl ArchiveWriter for MemoryWriter {
    fn write_entry(&mut self, name: &str, data: &[u8]) -> zipsession::Result<()> {
        self.push(name.to_string(), data.to_vec())
    }

    fn write_directory(&mut self, name: &str) -> zipsession::Result<()> {
        self.push(format!("{}/", name), Vec::new())
    }

    fn finish(mut self) -> zipsession::Result<()> {
        let records = std::mem::take(&mut self.records);
        let mut store = self.store.borrow_mut();
        store.stats.commits += 1;
        store.archives.insert(self.location.clone(), records);
        Ok(())
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        self.store.borrow_mut().open_handles -= 1;
    }
}
