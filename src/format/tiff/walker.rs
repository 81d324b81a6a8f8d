//! IFD chain traversal.
//!
//! The walker starts at the header's first-IFD offset, decodes every entry of
//! each directory and hands the results to an [`EntrySink`], then follows the
//! next-IFD pointer until it reads zero.
//!
//! Only the first offset is alignment-checked (by [`TiffHeader::parse`]);
//! later offsets are trusted, apart from loop and length guards.

use std::collections::HashSet;

use tracing::debug;

use crate::error::TiffError;
use crate::io::{read_u16_le, RangeReader};

use super::parser::{Ifd, TiffHeader, IFD_COUNT_SIZE, TIFF_HEADER_SIZE};
use super::values::{DecodedEntry, ValueReader};

/// Upper bound on directories in one chain.
pub const MAX_IFD_CHAIN: usize = 256;

/// Receives every decoded entry during a walk.
pub trait EntrySink {
    /// Called once per entry, in file order.
    fn record(&mut self, entry: &DecodedEntry);
}

/// Counts gathered during a walk, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub ifd_count: usize,
    pub entry_count: usize,
}

/// Read and validate the 8-byte TIFF header.
pub fn read_header<R: RangeReader>(reader: &mut R) -> Result<TiffHeader, TiffError> {
    if reader.size() < TIFF_HEADER_SIZE as u64 {
        return Err(TiffError::FileTooSmall {
            required: TIFF_HEADER_SIZE as u64,
            actual: reader.size(),
        });
    }

    let bytes = reader.read_exact_at(0, TIFF_HEADER_SIZE)?;
    TiffHeader::parse(&bytes)
}

/// Read one complete IFD located at `offset`.
pub fn read_ifd<R: RangeReader>(reader: &mut R, offset: u32) -> Result<Ifd, TiffError> {
    let count_bytes = reader.read_exact_at(offset as u64, IFD_COUNT_SIZE)?;
    let entry_count = read_u16_le(&count_bytes);

    let size = Ifd::calculate_size(entry_count);
    let bytes = reader.read_exact_at(offset as u64, size)?;
    Ifd::parse(&bytes, offset)
}

/// Walk the IFD chain, decoding every entry into `sink`.
///
/// # Errors
/// - `IfdLoop` if a directory offset repeats
/// - `IfdChainTooLong` past [`MAX_IFD_CHAIN`] directories
/// - `Io` if a directory or value lies outside the file
/// - `UnterminatedAscii` from value decoding
pub fn walk_ifd_chain<R, S>(
    reader: &mut R,
    header: &TiffHeader,
    sink: &mut S,
) -> Result<WalkSummary, TiffError>
where
    R: RangeReader,
    S: EntrySink + ?Sized,
{
    let mut summary = WalkSummary::default();
    let mut visited = HashSet::new();
    let mut offset = header.first_ifd_offset;

    while offset != 0 {
        if !visited.insert(offset) {
            return Err(TiffError::IfdLoop(offset));
        }
        if visited.len() > MAX_IFD_CHAIN {
            return Err(TiffError::IfdChainTooLong(MAX_IFD_CHAIN));
        }

        let ifd = read_ifd(reader, offset)?;
        debug!(
            file = reader.identifier(),
            index = summary.ifd_count,
            offset,
            entries = ifd.entries.len(),
            "Image File Directory"
        );

        let mut values = ValueReader::new(reader);
        for entry in &ifd.entries {
            let decoded = values.decode(entry)?;
            sink.record(&decoded);
        }

        summary.ifd_count += 1;
        summary.entry_count += ifd.entries.len();
        offset = ifd.next_ifd_offset;
    }

    Ok(summary)
}

// =============================================================================
// Tests
// =============================================================================
