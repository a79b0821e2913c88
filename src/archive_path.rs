//! Archive path type with validation for entry names.

use crate::{Error, Result};
use std::fmt;

/// Maximum length for archive paths (in bytes).
///
/// Zip stores the name length in a 16-bit field.
pub const MAX_PATH_LENGTH: usize = u16::MAX as usize;

/// A validated entry name inside an archive.
///
/// `ArchivePath` strips leading `/` separators and validates that:
/// - No NUL bytes are present
/// - The name is not empty
/// - No empty segments exist (no `//` or trailing `/`)
/// - No `.` or `..` segments are present
///
/// # Examples
///
/// ```
/// use zipsession::ArchivePath;
///
/// let path = ArchivePath::new("xl/workbook.xml").unwrap();
/// assert_eq!(path.as_str(), "xl/workbook.xml");
///
/// // Leading separators are dropped
/// let path = ArchivePath::new("/docProps/app.xml").unwrap();
/// assert_eq!(path.as_str(), "docProps/app.xml");
///
/// // Invalid names are rejected
/// assert!(ArchivePath::new("../secret").is_err());
/// assert!(ArchivePath::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Creates a new `ArchivePath` from a string, normalizing and validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchivePath`] if the name:
    /// - Contains NUL bytes
    /// - Is empty, or consists only of separators
    /// - Contains empty segments (e.g., `a//b`) or a trailing `/`
    /// - Contains `.` or `..` segments
    pub fn new(s: &str) -> Result<Self> {
        let s = Self::strip_root(s);
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Creates a directory path, accepting (and dropping) one trailing `/`.
    ///
    /// ```
    /// use zipsession::ArchivePath;
    ///
    /// let dir = ArchivePath::directory("media/").unwrap();
    /// assert_eq!(dir.as_str(), "media");
    /// ```
    ///
    /// # Errors
    ///
    /// Besides the checks of [`new`](Self::new), fails if the marker name
    /// (with its trailing `/`) would exceed [`MAX_PATH_LENGTH`].
    pub fn directory(s: &str) -> Result<Self> {
        let path = Self::new(s.strip_suffix('/').unwrap_or(s))?;
        if path.0.len() + 1 > MAX_PATH_LENGTH {
            return Err(Error::InvalidArchivePath(format!(
                "directory marker exceeds maximum length of {} bytes",
                MAX_PATH_LENGTH
            )));
        }
        Ok(path)
    }

    /// Removes leading separators so `"/a.txt"` and `"a.txt"` name the same entry.
    pub(crate) fn strip_root(s: &str) -> &str {
        s.trim_start_matches('/')
    }

    /// Validates an archive path string.
    fn validate(s: &str) -> Result<()> {
        if s.contains('\0') {
            return Err(Error::InvalidArchivePath("contains NUL byte".into()));
        }

        if s.is_empty() {
            return Err(Error::InvalidArchivePath("empty path".into()));
        }

        if s.len() > MAX_PATH_LENGTH {
            return Err(Error::InvalidArchivePath(format!(
                "path exceeds maximum length of {} bytes",
                MAX_PATH_LENGTH
            )));
        }

        if s.ends_with('/') {
            return Err(Error::InvalidArchivePath(
                "trailing slash not allowed".into(),
            ));
        }

        for segment in s.split('/') {
            if segment.is_empty() {
                return Err(Error::InvalidArchivePath(
                    "empty segment (consecutive slashes)".into(),
                ));
            }
            if segment == "." {
                return Err(Error::InvalidArchivePath("'.' segment not allowed".into()));
            }
            if segment == ".." {
                return Err(Error::InvalidArchivePath(
                    "'..' segment not allowed (path traversal)".into(),
                ));
            }
        }

        Ok(())
    }

    /// Returns the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the path and returns the owned name.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ArchivePath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(&s)
    }
}
