//! Camera metadata extracted from one file's IFD chain.

use bytes::Bytes;
use tracing::debug;

use crate::format::tiff::{DecodedEntry, DecodedValue, EntrySink, Rational, TiffTag};

/// The fields of interest, accumulated across every IFD of a single file.
///
/// A value is created empty for each file, filled while walking, consumed by
/// the classifier and then dropped. Nothing carries over between files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraMetadata {
    /// Camera manufacturer (informational only)
    pub make: Option<String>,

    /// Camera model (informational only)
    pub model: Option<String>,

    /// DNG unique camera model; the last occurrence in the chain wins
    pub unique_camera_model: Option<String>,

    /// CFA pattern bytes
    pub cfa_pattern: Option<Bytes>,

    /// File offset the CFA pattern was read from
    pub cfa_pattern_offset: Option<u32>,

    /// Black level repeat dimensions (rows, columns)
    pub black_level_repeat_dim: Option<Vec<u16>>,

    /// Black level values
    pub black_level: Option<Vec<Rational>>,

    /// File offset the black level was read from
    pub black_level_offset: Option<u32>,
}

impl CameraMetadata {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntrySink for CameraMetadata {
    /// Retain the entry if it is one of the tracked tags with the expected
    /// type. Everything else is ignored; no validation happens here.
    fn record(&mut self, entry: &DecodedEntry) {
        let Some(tag) = TiffTag::from_u16(entry.tag_id) else {
            return;
        };

        match (tag, &entry.value) {
            (TiffTag::Make, DecodedValue::Ascii(s)) => self.make = Some(s.clone()),
            (TiffTag::Model, DecodedValue::Ascii(s)) => self.model = Some(s.clone()),
            (TiffTag::UniqueCameraModel, DecodedValue::Ascii(s)) => {
                self.unique_camera_model = Some(s.clone());
            }
            (TiffTag::CfaPattern, DecodedValue::Bytes(b)) => {
                self.cfa_pattern = Some(b.clone());
                self.cfa_pattern_offset = Some(entry.offset);
            }
            (TiffTag::BlackLevelRepeatDim, DecodedValue::Shorts(v)) => {
                self.black_level_repeat_dim = Some(v.clone());
            }
            (TiffTag::BlackLevel, DecodedValue::Rationals(v)) => {
                self.black_level = Some(v.clone());
                self.black_level_offset = Some(entry.offset);
            }
            _ => return,
        }

        debug!(tag = tag.name(), offset = entry.offset, "Recorded tag");
    }
}
