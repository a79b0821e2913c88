//! Exit codes for the CLI tool.

use zipsession::{Error, ErrorKind};

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Archive format error
pub const BAD_ARCHIVE: i32 = 3;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Archive or entry does not exist
pub const NOT_FOUND: i32 = 6;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FatalError,
    BadArchive,
    IoError,
    NotFound,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FatalError => FATAL_ERROR,
            Self::BadArchive => BAD_ARCHIVE,
            Self::IoError => IO_ERROR,
            Self::NotFound => NOT_FOUND,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a library error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error.kind() {
        ErrorKind::NotFound => ExitCode::NotFound,
        ErrorKind::Codec => ExitCode::BadArchive,
        ErrorKind::Io => ExitCode::IoError,
        ErrorKind::InvalidMode => ExitCode::BadArgs,
        ErrorKind::AlreadyExists => ExitCode::FatalError,
        ErrorKind::InvalidArgument => match error {
            Error::ResourceLimitExceeded(_) => ExitCode::FatalError,
            _ => ExitCode::BadArgs,
        },
        // Future kinds - required by #[non_exhaustive]
        _ => ExitCode::FatalError,
    }
}
