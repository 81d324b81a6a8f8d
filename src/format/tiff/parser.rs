//! TIFF header and IFD structure parsing.
//!
//! # TIFF Header Structure (8 bytes)
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II")
//! Bytes 2-3: Version (42 = 0x002A)
//! Bytes 4-7: Offset to first IFD (4 bytes)
//! ```
//!
//! # IFD Structure
//! ```text
//! 2 bytes:       entry count N
//! N * 12 bytes:  entries (tag u16, type u16, count u32, value/offset u32)
//! 4 bytes:       offset of the next IFD (0 terminates the chain)
//! ```
//!
//! Only little-endian files are accepted. Big-endian files are recognised so
//! that they can be reported distinctly, but are not parsed further.

use crate::error::TiffError;
use crate::io::{read_u16_le, read_u32_le, write_u16_le, write_u32_le};

use super::tags::{FieldType, TiffTag};

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Version number for classic TIFF
const VERSION_TIFF: u16 = 42;

/// Size of classic TIFF header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

/// Size of one IFD entry in bytes
pub const IFD_ENTRY_SIZE: usize = 12;

/// Size of the entry count field at the start of an IFD
pub const IFD_COUNT_SIZE: usize = 2;

/// Size of the next IFD offset field at the end of an IFD
pub const IFD_NEXT_OFFSET_SIZE: usize = 4;

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed little-endian TIFF file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Offset to the first IFD in the file
    pub first_ifd_offset: u32,
}

impl TiffHeader {
    /// Parse a TIFF header from raw bytes.
    ///
    /// # Errors
    /// - `FileTooSmall` if fewer than 8 bytes are supplied
    /// - `UnsupportedByteOrder` for a big-endian ("MM") file
    /// - `InvalidMagic` if byte order bytes are neither II nor MM
    /// - `InvalidVersion` if version is not 42
    /// - `MisalignedIfdOffset` if the first IFD offset is odd
    pub fn parse(bytes: &[u8]) -> Result<Self, TiffError> {
        if bytes.len() < TIFF_HEADER_SIZE {
            return Err(TiffError::FileTooSmall {
                required: TIFF_HEADER_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }

        let magic = read_u16_le(&bytes[0..2]);
        match magic {
            BYTE_ORDER_LITTLE_ENDIAN => {}
            BYTE_ORDER_BIG_ENDIAN => return Err(TiffError::UnsupportedByteOrder),
            _ => return Err(TiffError::InvalidMagic(magic)),
        }

        let version = read_u16_le(&bytes[2..4]);
        if version != VERSION_TIFF {
            return Err(TiffError::InvalidVersion(version));
        }

        let first_ifd_offset = read_u32_le(&bytes[4..8]);
        if first_ifd_offset & 1 != 0 {
            return Err(TiffError::MisalignedIfdOffset(first_ifd_offset));
        }

        Ok(TiffHeader { first_ifd_offset })
    }
}

// =============================================================================
// IfdEntry
// =============================================================================

/// A single 12-byte IFD entry, as stored on disk.
///
/// The 4-byte value/offset field is kept verbatim together with its absolute
/// file position, so the entry can be re-encoded exactly and its data located
/// regardless of whether the value is inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfdEntry {
    /// Tag identifier
    pub tag_id: u16,

    /// Decoded field type, `None` for unknown type codes
    pub field_type: Option<FieldType>,

    /// Field type exactly as stored
    pub field_type_raw: u16,

    /// Number of values (not bytes)
    pub count: u32,

    /// The raw value/offset field
    pub value_offset_bytes: [u8; 4],

    /// Absolute file position of the value/offset field
    pub value_field_position: u32,
}

impl IfdEntry {
    /// Parse an entry from its 12 on-disk bytes located at `entry_position`.
    ///
    /// # Panics
    /// Panics if `bytes` is shorter than 12 bytes.
    pub fn parse(bytes: &[u8], entry_position: u32) -> Self {
        let field_type_raw = read_u16_le(&bytes[2..4]);
        IfdEntry {
            tag_id: read_u16_le(&bytes[0..2]),
            field_type: FieldType::from_u16(field_type_raw),
            field_type_raw,
            count: read_u32_le(&bytes[4..8]),
            value_offset_bytes: [bytes[8], bytes[9], bytes[10], bytes[11]],
            value_field_position: entry_position.wrapping_add(8),
        }
    }

    /// Re-encode this entry to its 12 on-disk bytes.
    pub fn encode(&self) -> [u8; IFD_ENTRY_SIZE] {
        let mut buf = Vec::with_capacity(IFD_ENTRY_SIZE);
        write_u16_le(&mut buf, self.tag_id);
        write_u16_le(&mut buf, self.field_type_raw);
        write_u32_le(&mut buf, self.count);
        buf.extend_from_slice(&self.value_offset_bytes);

        let mut out = [0u8; IFD_ENTRY_SIZE];
        out.copy_from_slice(&buf);
        out
    }

    /// The known tag this entry carries, if any.
    #[inline]
    pub fn tag(&self) -> Option<TiffTag> {
        TiffTag::from_u16(self.tag_id)
    }

    /// Byte width of one unit; 0 for unknown types.
    #[inline]
    pub fn unit_width(&self) -> usize {
        FieldType::unit_width(self.field_type_raw)
    }

    /// Total size of the value in bytes.
    #[inline]
    pub fn value_byte_size(&self) -> u64 {
        self.count as u64 * self.unit_width() as u64
    }

    /// Whether the value lives in the 4-byte value/offset field itself.
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.value_byte_size() <= FieldType::INLINE_THRESHOLD as u64
    }

    /// The value/offset field read as a little-endian u32.
    #[inline]
    pub fn raw_value_offset(&self) -> u32 {
        read_u32_le(&self.value_offset_bytes)
    }

    /// Absolute file offset where this entry's value starts.
    ///
    /// Inline values resolve to the position of the value/offset field
    /// itself, never to its numeric content.
    #[inline]
    pub fn data_offset(&self) -> u32 {
        if self.is_inline() {
            self.value_field_position
        } else {
            self.raw_value_offset()
        }
    }
}

// =============================================================================
// Ifd
// =============================================================================

/// A parsed Image File Directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ifd {
    /// Absolute file offset of the entry count field
    pub offset: u32,

    /// Entries in on-disk order
    pub entries: Vec<IfdEntry>,

    /// Offset of the next IFD, 0 at the end of the chain
    pub next_ifd_offset: u32,
}

impl Ifd {
    /// Total on-disk size of an IFD with `entry_count` entries.
    #[inline]
    pub const fn calculate_size(entry_count: u16) -> usize {
        IFD_COUNT_SIZE + entry_count as usize * IFD_ENTRY_SIZE + IFD_NEXT_OFFSET_SIZE
    }

    /// Parse an IFD from its complete on-disk bytes.
    ///
    /// `bytes` must start at the entry count and be at least
    /// `calculate_size(count)` long.
    pub fn parse(bytes: &[u8], offset: u32) -> Result<Self, TiffError> {
        if bytes.len() < IFD_COUNT_SIZE {
            return Err(TiffError::FileTooSmall {
                required: IFD_COUNT_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }

        let entry_count = read_u16_le(&bytes[0..2]);
        let size = Self::calculate_size(entry_count);
        if bytes.len() < size {
            return Err(TiffError::FileTooSmall {
                required: size as u64,
                actual: bytes.len() as u64,
            });
        }

        let entries = (0..entry_count as usize)
            .map(|i| {
                let start = IFD_COUNT_SIZE + i * IFD_ENTRY_SIZE;
                let position = offset.wrapping_add(start as u32);
                IfdEntry::parse(&bytes[start..start + IFD_ENTRY_SIZE], position)
            })
            .collect();

        let next_start = size - IFD_NEXT_OFFSET_SIZE;
        let next_ifd_offset = read_u32_le(&bytes[next_start..size]);

        Ok(Ifd {
            offset,
            entries,
            next_ifd_offset,
        })
    }

    /// Re-encode the directory to its exact on-disk bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::calculate_size(self.entries.len() as u16));
        write_u16_le(&mut buf, self.entries.len() as u16);
        for entry in &self.entries {
            buf.extend_from_slice(&entry.encode());
        }
        write_u32_le(&mut buf, self.next_ifd_offset);
        buf
    }
}

// =============================================================================
// Tests
// =============================================================================
