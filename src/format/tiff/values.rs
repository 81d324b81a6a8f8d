//! TIFF tag value decoding.
//!
//! Every value is read from its effective data offset, whether it lives
//! inline in the IFD entry or elsewhere in the file. Reading an inline value
//! from the position of its value/offset field yields the same bytes as
//! interpreting the field directly, and gives every decoded value a real file
//! offset that can later be written back to.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;
use tracing::trace;

use crate::error::{IoError, TiffError};
use crate::io::{read_u16_le, read_u32_le, write_u32_le, RangeReader};

use super::parser::IfdEntry;
use super::tags::FieldType;

// =============================================================================
// Rational
// =============================================================================

/// An unsigned rational: numerator / denominator, 8 bytes on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    /// Encoded size in bytes.
    pub const SIZE: usize = 8;

    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Decode from 8 little-endian bytes.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 8 bytes.
    #[inline]
    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        Self::new(read_u32_le(&bytes[0..4]), read_u32_le(&bytes[4..8]))
    }

    /// Append the little-endian encoding to a buffer.
    #[inline]
    pub fn write_le(&self, buf: &mut Vec<u8>) {
        write_u32_le(buf, self.numerator);
        write_u32_le(buf, self.denominator);
    }

    /// Value as a float; a zero denominator yields infinity or NaN.
    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Encode a slice of rationals as contiguous little-endian bytes.
pub fn encode_rationals(values: &[Rational]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * Rational::SIZE);
    for value in values {
        value.write_le(&mut buf);
    }
    buf
}

// =============================================================================
// Decoded values
// =============================================================================

/// A materialized tag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    /// ASCII text with the trailing NUL removed
    Ascii(String),

    /// BYTE values
    Bytes(Bytes),

    /// SHORT values
    Shorts(Vec<u16>),

    /// RATIONAL values
    Rationals(Vec<Rational>),

    /// A type this decoder does not materialize
    Skipped,
}

/// A decoded entry together with where its value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEntry {
    pub tag_id: u16,
    pub field_type_raw: u16,
    /// Absolute file offset the value was read from
    pub offset: u32,
    pub value: DecodedValue,
}

// =============================================================================
// ValueReader
// =============================================================================

/// Decodes IFD entry values from a [`RangeReader`].
pub struct ValueReader<'a, R: RangeReader> {
    reader: &'a mut R,
}

impl<'a, R: RangeReader> ValueReader<'a, R> {
    /// Create a new ValueReader.
    pub fn new(reader: &'a mut R) -> Self {
        Self { reader }
    }

    /// Read the raw bytes of an entry's value from its effective data offset.
    pub fn read_bytes(&mut self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        let size = entry.value_byte_size();
        let len = usize::try_from(size).map_err(|_| IoError::RangeOutOfBounds {
            offset: entry.data_offset() as u64,
            requested: size,
            size: self.reader.size(),
        })?;
        Ok(self.reader.read_exact_at(entry.data_offset() as u64, len)?)
    }

    /// Decode an entry into a typed value.
    ///
    /// # Errors
    /// - `Io` if the value lies outside the file
    /// - `UnterminatedAscii` if an ASCII value does not end in NUL
    pub fn decode(&mut self, entry: &IfdEntry) -> Result<DecodedEntry, TiffError> {
        let offset = entry.data_offset();

        let value = match entry.field_type {
            Some(FieldType::Ascii) => {
                let bytes = self.read_bytes(entry)?;
                DecodedValue::Ascii(parse_ascii(&bytes, entry.tag_id, offset)?)
            }
            Some(FieldType::Byte) => DecodedValue::Bytes(self.read_bytes(entry)?),
            Some(FieldType::Short) => {
                let bytes = self.read_bytes(entry)?;
                DecodedValue::Shorts(parse_u16_array(&bytes, entry.count as usize))
            }
            Some(FieldType::Rational) => {
                let bytes = self.read_bytes(entry)?;
                DecodedValue::Rationals(parse_rational_array(&bytes, entry.count as usize))
            }
            _ => DecodedValue::Skipped,
        };

        trace!(
            tag = entry.tag_id,
            field_type = entry.field_type_raw,
            count = entry.count,
            offset,
            value = ?value,
            "Decoded entry"
        );

        Ok(DecodedEntry {
            tag_id: entry.tag_id,
            field_type_raw: entry.field_type_raw,
            offset,
            value,
        })
    }
}

// =============================================================================
// Convenience functions for parsing bytes directly
// =============================================================================

/// Parse a NUL-terminated ASCII value, stripping the terminator.
///
/// An empty value decodes to an empty string.
pub fn parse_ascii(bytes: &[u8], tag: u16, offset: u32) -> Result<String, TiffError> {
    match bytes.split_last() {
        None => Ok(String::new()),
        Some((0, text)) => Ok(String::from_utf8_lossy(text).into_owned()),
        Some(_) => Err(TiffError::UnterminatedAscii { tag, offset }),
    }
}

/// Parse an array of little-endian u16 values.
pub fn parse_u16_array(bytes: &[u8], count: usize) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .take(count)
        .map(read_u16_le)
        .collect()
}

/// Parse an array of little-endian rationals.
pub fn parse_rational_array(bytes: &[u8], count: usize) -> Vec<Rational> {
    bytes
        .chunks_exact(Rational::SIZE)
        .take(count)
        .map(Rational::from_le_bytes)
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
