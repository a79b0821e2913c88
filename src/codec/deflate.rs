//! Deflate codec implementation (zip method 8).
//!
//! Zip stores raw deflate streams without a zlib header, so these wrap
//! flate2's raw `Deflate*` types.

use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::DeflateDecoder as FlateDecoder;
use flate2::write::DeflateEncoder as FlateEncoder;

/// Deflate decoder.
pub struct DeflateDecoder<R> {
    inner: FlateDecoder<R>,
}

impl<R> std::fmt::Debug for DeflateDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflateDecoder").finish_non_exhaustive()
    }
}

impl<R: Read> DeflateDecoder<R> {
    /// Creates a new Deflate decoder.
    ///
    /// # Arguments
    ///
    /// * `input` - The compressed data source
    pub fn new(input: R) -> Self {
        Self {
            inner: FlateDecoder::new(input),
        }
    }
}

impl<R: Read> Read for DeflateDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Deflate encoder options.
#[derive(Debug, Clone)]
pub struct DeflateEncoderOptions {
    /// Compression level (0-9, default 6).
    pub level: u32,
}

impl Default for DeflateEncoderOptions {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl DeflateEncoderOptions {
    /// Creates options with the given compression level.
    pub fn with_level(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }
}

/// Deflate encoder.
pub struct DeflateEncoder<W: Write> {
    inner: FlateEncoder<W>,
}

impl<W: Write> std::fmt::Debug for DeflateEncoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflateEncoder").finish_non_exhaustive()
    }
}

impl<W: Write> DeflateEncoder<W> {
    /// Creates a new Deflate encoder.
    ///
    /// # Arguments
    ///
    /// * `output` - The destination for compressed data
    /// * `options` - Encoder options
    pub fn new(output: W, options: &DeflateEncoderOptions) -> Self {
        Self {
            inner: FlateEncoder::new(output, Compression::new(options.level)),
        }
    }

    /// Finishes encoding and returns the underlying writer.
    pub fn try_finish(self) -> io::Result<W> {
        self.inner.finish()
    }
}

impl<W: Write> Write for DeflateEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Compresses a whole buffer into a raw deflate stream.
pub fn compress(data: &[u8], options: &DeflateEncoderOptions) -> io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::with_capacity(data.len() / 2), options);
    encoder.write_all(data)?;
    encoder.try_finish()
}

/// Decompresses a raw deflate stream, expecting `expected_size` output bytes.
///
/// Output beyond `expected_size` is an error, which bounds memory use for
/// records that lie about their size.
pub fn decompress(data: &[u8], expected_size: usize) -> io::Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    // Declared sizes are untrusted; grow past 1 MiB on demand.
    let mut out = Vec::with_capacity(expected_size.min(1 << 20));
    (&mut decoder)
        .take(expected_size as u64 + 1)
        .read_to_end(&mut out)?;
    if out.len() > expected_size {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("deflate stream exceeds declared size of {} bytes", expected_size),
        ));
    }
    Ok(out)
}
