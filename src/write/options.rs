//! Options controlling how entries are encoded.

use crate::codec::CompressionMethod;

/// Options for writing zip entries.
///
/// # Example
///
/// ```rust
/// use zipsession::{CompressionMethod, WriteOptions};
///
/// let opts = WriteOptions::new()
///     .method(CompressionMethod::Deflate)
///     .level(9)?
///     .comment("generated");
/// assert_eq!(opts.level, 9);
/// # Ok::<(), zipsession::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Compression method for data entries.
    pub method: CompressionMethod,
    /// Compression level (0-9). Level 0 stores entries uncompressed.
    pub level: u32,
    /// Archive comment written after the central directory.
    pub comment: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            method: CompressionMethod::default(),
            level: 6,
            comment: None,
        }
    }
}

impl WriteOptions {
    /// Creates new write options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression method.
    pub fn method(mut self, method: CompressionMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the compression level (strict validation).
    ///
    /// Valid values are 0-9, where:
    /// - 0: No compression (store only)
    /// - 1-3: Fast compression, lower ratio
    /// - 4-6: Balanced compression (default is 6)
    /// - 7-9: Maximum compression, slower
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`] if level is greater than 9.
    ///
    /// [`Error::InvalidCompressionLevel`]: crate::Error::InvalidCompressionLevel
    pub fn level(mut self, level: u32) -> crate::Result<Self> {
        if level > 9 {
            return Err(crate::Error::InvalidCompressionLevel { level });
        }
        self.level = level;
        Ok(self)
    }

    /// Sets the compression level, clamping values above 9.
    pub fn level_clamped(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    /// Sets the archive comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Returns the method actually applied to data entries.
    pub(crate) fn effective_method(&self) -> CompressionMethod {
        if self.level == 0 {
            CompressionMethod::Stored
        } else {
            self.method
        }
    }
}
