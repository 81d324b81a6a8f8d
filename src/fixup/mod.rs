//! DNG metadata correction.
//!
//! # Key Concepts
//!
//! - **Metadata**: the handful of tags collected from one file's IFD chain
//! - **Signature**: the exact known-bad and known-good values for one camera
//! - **Verdict**: what the classifier decided about a file
//! - **Patch**: replacement bytes for one recorded offset, never changing
//!   the file length

mod corrector;
mod metadata;
mod patcher;
mod signature;

pub use corrector::{
    read_camera_metadata, Corrector, CorrectorConfig, FileOutcome, FileReport, RunSummary,
    SkipReason,
};
pub use metadata::CameraMetadata;
pub use patcher::{plan_patches, Patch, PatchField, PatchReport, Patcher};
pub use signature::{
    classify, Classification, FieldSignature, SignatureRule, Verdict, SIGNATURE_RULES, SM_A320F,
};
