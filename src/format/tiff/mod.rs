//! TIFF reader for DNG metadata.
//!
//! # Key Concepts
//!
//! - **Byte order**: only little-endian ("II") files are read. Big-endian
//!   files are recognised and rejected.
//!
//! - **IFD (Image File Directory)**: a count of entries, the entries, and a
//!   pointer to the next IFD. DNG files chain several IFDs.
//!
//! - **Inline vs offset values**: values of 4 bytes or fewer are stored in the
//!   entry itself. Either way, every value is resolved to an absolute file
//!   offset so it can be rewritten in place later.

mod parser;
mod tags;
mod values;
mod walker;

pub use parser::{
    Ifd, IfdEntry, TiffHeader, IFD_COUNT_SIZE, IFD_ENTRY_SIZE, IFD_NEXT_OFFSET_SIZE,
    TIFF_HEADER_SIZE,
};
pub use tags::{FieldType, TiffTag};
pub use values::{
    encode_rationals, parse_ascii, parse_rational_array, parse_u16_array, DecodedEntry,
    DecodedValue, Rational, ValueReader,
};
pub use walker::{read_header, read_ifd, walk_ifd_chain, EntrySink, WalkSummary, MAX_IFD_CHAIN};
