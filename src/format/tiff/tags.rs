//! TIFF tag and field type definitions.
//!
//! This module defines the vocabulary for TIFF parsing, including:
//! - Field types that determine how values are encoded
//! - Tag IDs for the DNG metadata fields the corrector reads

// =============================================================================
// TIFF Field Types
// =============================================================================

/// TIFF field types that determine how values are encoded.
///
/// Each field type has a fixed unit width, which decides whether a value is
/// stored inline in its IFD entry and how many bytes an out-of-line value
/// occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer (1 byte)
    Byte = 1,

    /// 8-bit ASCII character, NUL-terminated (1 byte)
    Ascii = 2,

    /// Unsigned 16-bit integer (2 bytes)
    Short = 3,

    /// Unsigned 32-bit integer (4 bytes)
    Long = 4,

    /// Two unsigned 32-bit integers, numerator then denominator (8 bytes)
    Rational = 5,

    /// Signed 8-bit integer (1 byte)
    SByte = 6,

    /// Opaque byte data
    Undefined = 7,

    /// Signed 16-bit integer (2 bytes)
    SShort = 8,

    /// Signed 32-bit integer (4 bytes)
    SLong = 9,

    /// Two signed 32-bit integers (8 bytes)
    SRational = 10,

    /// IEEE single precision float (4 bytes)
    Float = 11,

    /// IEEE double precision float (8 bytes)
    Double = 12,
}

impl FieldType {
    /// Size of a single value of this type in bytes.
    ///
    /// `Undefined` reports 0: its entries are treated as zero-length and
    /// never materialized.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::SByte => 1,
            FieldType::Short | FieldType::SShort => 2,
            FieldType::Long | FieldType::SLong | FieldType::Float => 4,
            FieldType::Rational | FieldType::SRational | FieldType::Double => 8,
            FieldType::Undefined => 0,
        }
    }

    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for unknown type values.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            5 => Some(FieldType::Rational),
            6 => Some(FieldType::SByte),
            7 => Some(FieldType::Undefined),
            8 => Some(FieldType::SShort),
            9 => Some(FieldType::SLong),
            10 => Some(FieldType::SRational),
            11 => Some(FieldType::Float),
            12 => Some(FieldType::Double),
            _ => None,
        }
    }

    /// Get the numeric type code.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Unit width for a raw type code; 0 for unrecognized codes.
    #[inline]
    pub fn unit_width(raw: u16) -> usize {
        Self::from_u16(raw).map_or(0, FieldType::size_in_bytes)
    }

    /// Maximum bytes that can be stored inline in a classic TIFF IFD entry.
    pub const INLINE_THRESHOLD: usize = 4;

    /// Check if a value with this type and count fits inline.
    #[inline]
    pub fn fits_inline(self, count: u32) -> bool {
        self.size_in_bytes() as u64 * count as u64 <= Self::INLINE_THRESHOLD as u64
    }
}

// =============================================================================
// TIFF Tags
// =============================================================================

/// TIFF/DNG tag IDs the corrector looks at.
///
/// Tags not listed here are decoded to keep the walk in step and then
/// discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TiffTag {
    /// Camera manufacturer
    Make = 271,

    /// Camera model name
    Model = 272,

    /// Color filter array pattern (TIFF/EP), BYTE, 4 values for a 2x2 array
    CfaPattern = 33422,

    /// DNG unique camera model, ASCII
    UniqueCameraModel = 50708,

    /// DNG black level repeat pattern size, SHORT, rows then columns
    BlackLevelRepeatDim = 50713,

    /// DNG black level, one RATIONAL per repeat-pattern position
    BlackLevel = 50714,
}

impl TiffTag {
    /// Create a TiffTag from its numeric value.
    ///
    /// Returns `None` for unrecognized tags. Unknown tags are not an error.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            271 => Some(TiffTag::Make),
            272 => Some(TiffTag::Model),
            33422 => Some(TiffTag::CfaPattern),
            50708 => Some(TiffTag::UniqueCameraModel),
            50713 => Some(TiffTag::BlackLevelRepeatDim),
            50714 => Some(TiffTag::BlackLevel),
            _ => None,
        }
    }

    /// Get the numeric tag ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Human-readable tag name for log output.
    pub const fn name(self) -> &'static str {
        match self {
            TiffTag::Make => "Make",
            TiffTag::Model => "Model",
            TiffTag::CfaPattern => "CFAPattern",
            TiffTag::UniqueCameraModel => "UniqueCameraModel",
            TiffTag::BlackLevelRepeatDim => "BlackLevelRepeatDim",
            TiffTag::BlackLevel => "BlackLevel",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
