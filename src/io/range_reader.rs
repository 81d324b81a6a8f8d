use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use bytes::Bytes;

use crate::error::IoError;

/// Trait for reading byte ranges from a seekable resource.
///
/// The TIFF walker and value decoder only ever ask for "`len` bytes at
/// `offset`". Implementations must leave the resource's stream position where
/// it was before the call, so a caller that interleaves sequential reads with
/// out-of-line value fetches never loses its place.
pub trait RangeReader {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Returns an error if the range is out of bounds or if the read fails.
    fn read_exact_at(&mut self, offset: u64, len: usize) -> Result<Bytes, IoError>;

    /// Get the total size of the resource in bytes.
    fn size(&self) -> u64;

    /// Get a unique identifier for this resource (for logging).
    fn identifier(&self) -> &str;
}

// =============================================================================
// SeekReader
// =============================================================================

/// A [`RangeReader`] over any `Read + Seek` stream.
///
/// Each positional read seeks to the requested offset, reads, and seeks back
/// to the position the stream had before the call.
#[derive(Debug)]
pub struct SeekReader<R> {
    inner: R,
    size: u64,
    identifier: String,
}

impl<R: Read + Seek> SeekReader<R> {
    /// Wrap a stream, measuring its length once up front.
    pub fn new(mut inner: R, identifier: impl Into<String>) -> Result<Self, IoError> {
        let start = inner.stream_position()?;
        let size = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(start))?;

        Ok(Self {
            inner,
            size,
            identifier: identifier.into(),
        })
    }

    /// Current stream position.
    pub fn position(&mut self) -> Result<u64, IoError> {
        Ok(self.inner.stream_position()?)
    }
}

impl SeekReader<File> {
    /// Open a file read-only.
    pub fn open(path: &Path) -> Result<Self, IoError> {
        let file = File::open(path).map_err(|e| IoError::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::new(file, path.display().to_string())
    }
}

impl SeekReader<Cursor<Vec<u8>>> {
    /// Wrap an in-memory buffer.
    pub fn from_bytes(data: Vec<u8>, identifier: impl Into<String>) -> Self {
        let size = data.len() as u64;
        Self {
            inner: Cursor::new(data),
            size,
            identifier: identifier.into(),
        }
    }
}

impl<R: Read + Seek> RangeReader for SeekReader<R> {
    fn read_exact_at(&mut self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let end = offset.checked_add(len as u64);
        if end.map_or(true, |end| end > self.size) {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.size,
            });
        }

        let saved = self.inner.stream_position()?;
        self.inner.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        let read = self.inner.read_exact(&mut buf);
        self.inner.seek(SeekFrom::Start(saved))?;
        read?;

        Ok(Bytes::from(buf))
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

// =============================================================================
// Endian Helper Functions
// =============================================================================
//
// Only little-endian ("II") files are handled, so only the little-endian
// readers and writers are provided.

/// Read a little-endian u16 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 2 bytes.
#[inline]
pub fn read_u16_le(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

/// Read a little-endian u32 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 4 bytes.
#[inline]
pub fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Append a little-endian u16 to a buffer.
#[inline]
pub fn write_u16_le(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Append a little-endian u32 to a buffer.
#[inline]
pub fn write_u32_le(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}
