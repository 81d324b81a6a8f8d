//! # dng-fixup
//!
//! In-place repair of DNG raw files whose black level and CFA pattern were
//! recorded wrongly by certain phone cameras.
//!
//! The library walks the TIFF IFD chain of each file, collects the handful of
//! tags that identify the camera and describe the sensor layout, compares
//! them against known corruption signatures, and overwrites the broken bytes
//! without changing the file length.
//!
//! ## Architecture
//!
//! - [`io`] - Positional reads over seekable byte sources
//! - [`mod@format`] - Little-endian TIFF header, IFD and value decoding
//! - [`fixup`] - Metadata collection, classification and patching
//! - [`scan`] - Candidate file discovery
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use dng_fixup::{Corrector, CorrectorConfig, find_candidates};
//! use std::path::Path;
//!
//! let paths = find_candidates(Path::new("/sdcard/DCIM/OpenCamera")).unwrap();
//! let corrector = Corrector::new(CorrectorConfig { dry_run: true, ..Default::default() });
//! let summary = corrector.run(&paths).unwrap();
//! println!("{} file(s) would be patched", summary.patched);
//! ```

pub mod config;
pub mod error;
pub mod fixup;
pub mod format;
pub mod io;
pub mod scan;

// Re-export commonly used types
pub use config::{Config, OutputFormat};
pub use error::{FixupError, IoError, PatchError, TiffError};
pub use fixup::{
    classify, CameraMetadata, Corrector, CorrectorConfig, FileOutcome, FileReport, Patch,
    PatchField, RunSummary, SignatureRule, SkipReason, Verdict, SIGNATURE_RULES,
};
pub use format::tiff::{FieldType, Ifd, IfdEntry, Rational, TiffHeader, TiffTag};
pub use io::{RangeReader, SeekReader};
pub use scan::find_candidates;
