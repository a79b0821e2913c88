//! Command implementations for the CLI tool.

use std::io::{Read, Write};
use std::path::Path;

use zipsession::read::ZipReader;
use zipsession::{
    ArchiveReader, ArchiveSession, OpenMode, ReadWriteDisposition, WriteOptions, ZipCodec,
};

use crate::OutputFormat;
use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::create_formatter;

/// Configuration for the put command.
pub struct PutConfig<'a> {
    pub archive_path: &'a Path,
    pub entry: &'a str,
    pub source: &'a Path,
    pub create: bool,
    pub level: u32,
}

/// Prints an error and converts it to an exit code.
fn report(context: &str, error: zipsession::Error) -> ExitCode {
    eprintln!("Error {}: {}", context, error);
    error_to_exit_code(&error)
}

/// Opens a read-write session, creating the archive only when asked to.
fn open_session(path: &Path, create: bool, level: u32) -> Result<ArchiveSession, ExitCode> {
    let options = WriteOptions::new()
        .level(level)
        .map_err(|e| report("parsing options", e))?;
    let disposition = if create {
        ReadWriteDisposition::OpenOrCreate
    } else {
        ReadWriteDisposition::Open
    };
    ArchiveSession::open_with_codec(
        path,
        OpenMode::ReadWrite(disposition),
        ZipCodec::new().with_options(options),
    )
    .map_err(|e| report("opening archive", e))
}

/// List command implementation
pub fn list(archive_path: &Path, technical: bool, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let mut reader = match ZipReader::open_path(archive_path) {
        Ok(r) => r,
        Err(e) => return report("opening archive", e),
    };
    let records = match reader.list_entries() {
        Ok(records) => records,
        Err(e) => return report("listing archive", e),
    };

    print!("{}", formatter.format_list(&records, technical));
    ExitCode::Success
}

/// Cat command implementation
pub fn cat(archive_path: &Path, entry: &str) -> ExitCode {
    let mut session = match ArchiveSession::open(archive_path, OpenMode::read()) {
        Ok(s) => s,
        Err(e) => return report("opening archive", e),
    };
    let data = match session.get(entry) {
        Ok(data) => data,
        Err(e) => return report("reading entry", e),
    };

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout.write_all(&data).and_then(|()| stdout.flush()) {
        eprintln!("Error writing output: {}", e);
        return ExitCode::IoError;
    }
    ExitCode::Success
}

/// Put command implementation
pub fn put(config: &PutConfig<'_>) -> ExitCode {
    let data = if config.source == Path::new("-") {
        let mut buf = Vec::new();
        if let Err(e) = std::io::stdin().lock().read_to_end(&mut buf) {
            eprintln!("Error reading stdin: {}", e);
            return ExitCode::IoError;
        }
        buf
    } else {
        match std::fs::read(config.source) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("Error reading {}: {}", config.source.display(), e);
                return ExitCode::IoError;
            }
        }
    };

    let mut session = match open_session(config.archive_path, config.create, config.level) {
        Ok(s) => s,
        Err(code) => return code,
    };
    if let Err(e) = session.set(config.entry, data) {
        return report("adding entry", e);
    }
    match session.close() {
        Ok(()) => ExitCode::Success,
        Err(e) => report("writing archive", e),
    }
}

/// Rm command implementation
pub fn rm(archive_path: &Path, entry: &str) -> ExitCode {
    let mut session = match open_session(archive_path, false, WriteOptions::default().level) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match session.delete(entry) {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("Error: entry '{}' not found", entry);
            return ExitCode::NotFound;
        }
        Err(e) => return report("removing entry", e),
    }
    match session.close() {
        Ok(()) => ExitCode::Success,
        Err(e) => report("writing archive", e),
    }
}

/// Mkdir command implementation
pub fn mkdir(archive_path: &Path, dir: &str, create: bool) -> ExitCode {
    let mut session = match open_session(archive_path, create, WriteOptions::default().level) {
        Ok(s) => s,
        Err(code) => return code,
    };
    if let Err(e) = session.add_directory(dir) {
        return report("adding directory", e);
    }
    match session.close() {
        Ok(()) => ExitCode::Success,
        Err(e) => report("writing archive", e),
    }
}
