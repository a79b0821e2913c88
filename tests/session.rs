//! Archive session behaviour: caching, dirty tracking, and persistence.
//!
//! Most tests drive the session through the in-memory codec so codec I/O can
//! be counted; the round-trip tests at the end use real zip files.

mod common;

use std::path::Path;

use common::{IoStats, MemoryCodec, expect_err, write_zip};
use tempfile::TempDir;
use zipsession::{ArchiveSession, Error, ErrorKind, OpenMode, SessionState};

const LOCATION: &str = "/virtual/book.zip";

fn location() -> &'static Path {
    Path::new(LOCATION)
}

fn open(codec: &MemoryCodec, mode: OpenMode) -> ArchiveSession<MemoryCodec> {
    ArchiveSession::open_with_codec(location(), mode, codec.clone()).unwrap()
}

// =============================================================================
// Cache semantics
// =============================================================================

#[test]
fn test_set_then_get_needs_no_codec_io() {
    let codec = MemoryCodec::new();
    let mut session = open(&codec, OpenMode::create());
    codec.reset_stats();

    session.set("a.txt", b"content".to_vec()).unwrap();
    assert_eq!(session.get("a.txt").unwrap(), b"content");
    assert!(session.has("a.txt"));
    assert_eq!(codec.stats(), IoStats::default());
}

#[test]
fn test_delete_then_get_is_not_found() {
    let codec = MemoryCodec::new();
    codec.insert_archive(location(), &[("x", b"1")]);
    let mut session = open(&codec, OpenMode::read_write());

    assert!(session.delete("x").unwrap());
    let err = expect_err(session.get("x"));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // Never-set names behave the same.
    assert!(!session.delete("never").unwrap());
    assert!(expect_err(session.get("never")).is_not_found());
}

#[test]
fn test_get_returns_copy() {
    let codec = MemoryCodec::new();
    let mut session = open(&codec, OpenMode::create());
    session.set("a", "one").unwrap();
    let mut copy = session.get("a").unwrap();
    copy.push(b'!');
    assert_eq!(session.get("a").unwrap(), b"one");
}

#[test]
fn test_leading_slash_addresses_same_entry() {
    let codec = MemoryCodec::new();
    codec.insert_archive(location(), &[("/rooted.txt", b"r")]);
    let mut session = open(&codec, OpenMode::read_write());

    assert!(session.has("rooted.txt"));
    assert!(session.has("/rooted.txt"));
    session.set("/other.txt", "o").unwrap();
    assert_eq!(session.names().collect::<Vec<_>>(), vec!["other.txt", "rooted.txt"]);
}

// =============================================================================
// Materialisation
// =============================================================================

#[test]
fn test_open_materialises_every_entry_once() {
    let codec = MemoryCodec::new();
    codec.insert_archive(
        location(),
        &[("a", b"1"), ("dir/", b""), ("dir/b", b"2"), ("empty/", b"")],
    );
    let session = open(&codec, OpenMode::read());

    let stats = codec.stats();
    assert_eq!(stats.reads_opened, 1);
    assert_eq!(stats.entries_read, 2);
    assert_eq!(stats.writes_opened, 0);
    assert_eq!(session.state(), SessionState::Reading);
    assert_eq!(session.len(), 2);
    assert_eq!(session.directories().collect::<Vec<_>>(), vec!["dir", "empty"]);
    assert!(session.has_directory("empty"));
    assert!(!session.has("empty"));
}

#[test]
fn test_empty_archive_reads_as_empty() {
    let codec = MemoryCodec::new();
    open(&codec, OpenMode::create()).close().unwrap();

    let mut session = open(&codec, OpenMode::read());
    assert!(session.is_empty());
    assert!(!session.has("anything"));
    assert!(expect_err(session.get("anything")).is_not_found());
}

#[test]
fn test_never_more_than_one_handle_open() {
    let codec = MemoryCodec::new();
    codec.insert_archive(location(), &[("kept", b"k"), ("gone", b"g")]);

    let mut session = open(&codec, OpenMode::append());
    assert_eq!(codec.open_handles(), 1);
    session.get("kept").unwrap();
    session.set("new", "n").unwrap();
    session.delete("gone").unwrap();
    session.flush(false).unwrap();
    assert_eq!(codec.open_handles(), 0);
    session.close().unwrap();

    assert_eq!(codec.max_open_handles(), 1);
}

// =============================================================================
// Flush and dirty tracking
// =============================================================================

#[test]
fn test_flush_is_idempotent() {
    let codec = MemoryCodec::new();
    let mut session = open(&codec, OpenMode::create());
    session.set("a.txt", "hi").unwrap();
    codec.reset_stats();

    session.flush(false).unwrap();
    let after_first = codec.stats();
    assert_eq!(after_first.writes_opened, 1);
    assert_eq!(after_first.commits, 1);

    session.flush(false).unwrap();
    assert_eq!(codec.stats(), after_first);
}

#[test]
fn test_forced_flush_rewrites_clean_session() {
    let codec = MemoryCodec::new();
    codec.insert_archive(location(), &[("a", b"1")]);
    let mut session = open(&codec, OpenMode::read_write());
    codec.reset_stats();

    session.flush(false).unwrap();
    assert_eq!(codec.stats().commits, 0);
    session.flush(true).unwrap();
    assert_eq!(codec.stats().commits, 1);
    assert_eq!(codec.archive(location()).unwrap(), vec![("a".to_string(), b"1".to_vec())]);
}

#[test]
fn test_noop_delete_keeps_session_clean() {
    let codec = MemoryCodec::new();
    let mut session = open(&codec, OpenMode::create());
    codec.reset_stats();
    assert!(!session.delete("missing").unwrap());
    assert!(!session.is_dirty());
    session.close().unwrap();
    assert_eq!(codec.stats().commits, 0);
}

#[test]
fn test_entries_written_sorted() {
    let codec = MemoryCodec::new();
    let mut session = open(&codec, OpenMode::create());
    for name in ["zeta", "alpha", "mid/b", "mid/a"] {
        session.set(name, name).unwrap();
    }
    session.add_directory("void").unwrap();
    session.close().unwrap();
    assert_eq!(
        codec.names(location()),
        vec!["alpha", "mid/a", "mid/b", "zeta", "void/"]
    );
}

#[test]
fn test_failed_flush_keeps_dirty_and_retries() {
    let codec = MemoryCodec::new();
    codec.insert_archive(location(), &[("old", b"o")]);
    let mut session = open(&codec, OpenMode::read_write());
    session.set("new", "n").unwrap();

    codec.fail_writes(true);
    let err = expect_err(session.flush(false));
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(session.is_dirty());
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(codec.names(location()), vec!["old"]);
    assert_eq!(session.get("new").unwrap(), b"n");

    codec.fail_writes(false);
    session.flush(false).unwrap();
    assert!(!session.is_dirty());
    assert_eq!(codec.names(location()), vec!["new", "old"]);
}

#[test]
fn test_close_surfaces_flush_error() {
    let codec = MemoryCodec::new();
    let mut session = open(&codec, OpenMode::create());
    session.set("a", "1").unwrap();
    codec.fail_writes(true);
    assert!(session.close().is_err());
    assert_eq!(codec.open_handles(), 0);
}

#[test]
fn test_drop_flushes_dirty_session() {
    let codec = MemoryCodec::new();
    {
        let mut session = open(&codec, OpenMode::create());
        session.set("dropped.txt", "saved").unwrap();
    }
    assert_eq!(
        codec.archive(location()).unwrap(),
        vec![("dropped.txt".to_string(), b"saved".to_vec())]
    );
}

#[test]
fn test_drop_swallows_flush_failure() {
    let codec = MemoryCodec::new();
    {
        let mut session = open(&codec, OpenMode::create());
        session.set("a", "1").unwrap();
        codec.fail_writes(true);
    }
    assert_eq!(codec.open_handles(), 0);
    assert!(codec.names(location()).is_empty());
}

// =============================================================================
// Write-only sessions
// =============================================================================

#[test]
fn test_write_only_holds_write_handle() {
    let codec = MemoryCodec::new();
    codec.insert_archive(location(), &[("a", b"1")]);
    let session = open(&codec, OpenMode::append());
    assert_eq!(session.state(), SessionState::Writing);
    assert!(session.is_empty());
    assert_eq!(codec.stats().reads_opened, 0);
}

#[test]
fn test_write_only_get_falls_back_to_archive() {
    let codec = MemoryCodec::new();
    codec.insert_archive(location(), &[("a", b"1"), ("b", b"2")]);
    let mut session = open(&codec, OpenMode::append());
    codec.reset_stats();

    assert_eq!(session.get("a").unwrap(), b"1");
    assert_eq!(codec.stats().entries_read, 1);
    assert_eq!(session.state(), SessionState::Reading);
    // Cached now, and not a change.
    assert_eq!(session.get("a").unwrap(), b"1");
    assert_eq!(codec.stats().entries_read, 1);
    assert!(!session.is_dirty());

    assert!(expect_err(session.get("missing")).is_not_found());
}

#[test]
fn test_write_only_flush_keeps_untouched_entries() {
    let codec = MemoryCodec::new();
    codec.insert_archive(location(), &[("keep", b"k"), ("replace", b"old")]);
    let mut session = open(&codec, OpenMode::append());
    session.set("replace", "new").unwrap();
    session.set("add", "a").unwrap();
    session.close().unwrap();

    let archive = codec.archive(location()).unwrap();
    assert_eq!(
        archive,
        vec![
            ("add".to_string(), b"a".to_vec()),
            ("keep".to_string(), b"k".to_vec()),
            ("replace".to_string(), b"new".to_vec()),
        ]
    );
}

#[test]
fn test_write_only_get_matches_rooted_record_names() {
    let codec = MemoryCodec::new();
    codec.insert_archive(location(), &[("/a", b"1"), ("/dir/b", b"2"), ("/dir/", b"")]);

    let read = open(&codec, OpenMode::read());
    assert!(read.has("a"));
    drop(read);

    let mut session = open(&codec, OpenMode::append());
    assert_eq!(session.get("a").unwrap(), b"1");
    assert_eq!(session.get("/dir/b").unwrap(), b"2");
    assert!(expect_err(session.get("dir")).is_not_found());
}

#[test]
fn test_write_only_get_takes_last_duplicate() {
    let codec = MemoryCodec::new();
    codec.insert_archive(location(), &[("a", b"first"), ("/a", b"second")]);

    let mut read = open(&codec, OpenMode::read());
    assert_eq!(read.get("a").unwrap(), b"second");
    drop(read);

    let mut session = open(&codec, OpenMode::append());
    assert_eq!(session.get("a").unwrap(), b"second");
}

#[test]
fn test_failed_fallback_read_closes_handle() {
    let codec = MemoryCodec::new();
    codec.insert_archive(location(), &[("a", b"1"), ("b", b"2")]);
    let mut session = open(&codec, OpenMode::append());

    codec.fail_reads(true);
    let err = expect_err(session.get("a"));
    assert_eq!(err.kind(), ErrorKind::Codec);
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(codec.open_handles(), 0);
    assert!(!session.has("a"));

    codec.fail_reads(false);
    codec.reset_stats();
    assert_eq!(session.get("a").unwrap(), b"1");
    assert_eq!(session.state(), SessionState::Reading);
    assert_eq!(codec.stats().reads_opened, 1);
}

#[test]
fn test_missing_fallback_keeps_read_handle() {
    let codec = MemoryCodec::new();
    codec.insert_archive(location(), &[("a", b"1")]);
    let mut session = open(&codec, OpenMode::append());
    codec.reset_stats();

    assert!(expect_err(session.get("missing")).is_not_found());
    assert_eq!(session.state(), SessionState::Reading);
    assert_eq!(codec.open_handles(), 1);

    assert_eq!(session.get("a").unwrap(), b"1");
    assert_eq!(codec.stats().reads_opened, 1);
}

#[test]
fn test_failed_materialise_closes_handle() {
    let codec = MemoryCodec::new();
    codec.insert_archive(location(), &[("a", b"1"), ("b", b"2")]);
    let mut session = open(&codec, OpenMode::append());
    session.set("c", "3").unwrap();

    codec.fail_reads(true);
    let err = expect_err(session.delete("a"));
    assert_eq!(err.kind(), ErrorKind::Codec);
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(codec.open_handles(), 0);
    assert!(session.is_dirty());

    codec.fail_reads(false);
    assert!(session.delete("a").unwrap());
    session.close().unwrap();
    assert_eq!(codec.names(location()), vec!["b", "c"]);
}

#[test]
fn test_directory_marker_name_fits_zip_limit() {
    let codec = MemoryCodec::new();
    let mut session = open(&codec, OpenMode::create());
    let name = "d".repeat(zipsession::archive_path::MAX_PATH_LENGTH);

    let err = expect_err(session.add_directory(&name));
    assert!(matches!(err, Error::InvalidArchivePath(_)), "{:?}", err);
    assert!(!session.is_dirty());
    session.close().unwrap();
}

// =============================================================================
// Access checks
// =============================================================================

#[test]
fn test_read_only_session_rejects_changes() {
    let codec = MemoryCodec::new();
    codec.insert_archive(location(), &[("a", b"1")]);
    let mut session = open(&codec, OpenMode::read());

    for err in [
        expect_err(session.set("b", "2")),
        expect_err(session.delete("a").map(|_| ())),
        expect_err(session.add_directory("d")),
        expect_err(session.flush(true)),
    ] {
        assert!(matches!(err, Error::AccessDenied { .. }), "{:?}", err);
        assert_eq!(err.kind(), ErrorKind::InvalidMode);
    }
    assert!(session.has("a"));
    session.close().unwrap();
    assert_eq!(codec.stats().writes_opened, 0);
}

// =============================================================================
// Round trips through real zip files
// =============================================================================

#[test]
fn test_round_trip_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("round.zip");

    let mut session = ArchiveSession::open(&path, OpenMode::create()).unwrap();
    session.set("a.txt", "hi").unwrap();
    session.flush(false).unwrap();
    drop(session);

    let mut session = ArchiveSession::open(&path, OpenMode::read()).unwrap();
    assert_eq!(session.get("a.txt").unwrap(), b"hi");
}

#[test]
fn test_deletion_persists_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("delete.zip");

    let mut session = ArchiveSession::open(&path, OpenMode::create()).unwrap();
    session.set("x", "1").unwrap();
    session.flush(false).unwrap();
    session.delete("x").unwrap();
    session.flush(false).unwrap();
    drop(session);

    let session = ArchiveSession::open(&path, OpenMode::read()).unwrap();
    assert!(!session.has("x"));
}

#[test]
fn test_edit_existing_zip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("existing.zip");
    let big = "lorem ipsum ".repeat(500);
    write_zip(
        &path,
        &[
            ("docs/", b""),
            ("docs/readme.md", b"# Title"),
            ("data/big.txt", big.as_bytes()),
            ("media/", b""),
        ],
    )
    .unwrap();

    let mut session = ArchiveSession::open(&path, OpenMode::read_write()).unwrap();
    assert_eq!(session.get("data/big.txt").unwrap(), big.as_bytes());
    session.delete("docs/readme.md").unwrap();
    session.set("data/small.txt", "s").unwrap();
    session.close().unwrap();

    let session = ArchiveSession::open(&path, OpenMode::read()).unwrap();
    assert_eq!(
        session.names().collect::<Vec<_>>(),
        vec!["data/big.txt", "data/small.txt"]
    );
    // Both markers now describe empty directories.
    assert_eq!(session.directories().collect::<Vec<_>>(), vec!["docs", "media"]);
}

#[test]
fn test_write_only_get_reads_rooted_zip_entry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rooted.zip");
    let mut writer =
        zipsession::write::ZipWriter::create_path(&path, zipsession::WriteOptions::default())
            .unwrap();
    writer.add_bytes("/x.txt", b"rooted").unwrap();
    writer.finish().unwrap();

    assert!(ArchiveSession::open(&path, OpenMode::read()).unwrap().has("x.txt"));
    let mut session = ArchiveSession::open(&path, OpenMode::append()).unwrap();
    assert_eq!(session.get("x.txt").unwrap(), b"rooted");
}

#[test]
fn test_identical_sessions_write_identical_bytes() {
    let dir = TempDir::new().unwrap();
    let write = |name: &str| {
        let path = dir.path().join(name);
        let mut session = ArchiveSession::open(&path, OpenMode::create()).unwrap();
        session.set("b.txt", "bbbbbbbbbbbbbbbbbbbbbbbbbbbb").unwrap();
        session.set("a.txt", "a").unwrap();
        session.add_directory("c").unwrap();
        session.close().unwrap();
        std::fs::read(path).unwrap()
    };
    assert_eq!(write("one.zip"), write("two.zip"));
}

#[test]
fn test_no_temp_file_left_behind() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clean.zip");
    let mut session = ArchiveSession::open(&path, OpenMode::append()).unwrap();
    session.set("a", "1").unwrap();
    session.close().unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|n| n != "clean.zip")
        .collect();
    assert!(leftovers.is_empty(), "{:?}", leftovers);
}
