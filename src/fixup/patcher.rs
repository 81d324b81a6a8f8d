//! In-place, length-preserving writes of corrected values.
//!
//! Patches are planned from the offsets recorded while decoding and the
//! known-good constants of the matching rule, then written one after another
//! through a read+write handle that never truncates. A failed write abandons
//! the remaining patches for that file; patches already written stay on disk.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::PatchError;
use crate::format::tiff::encode_rationals;

use super::metadata::CameraMetadata;
use super::signature::{Classification, FieldSignature};

// =============================================================================
// Patch planning
// =============================================================================

/// Which field a patch rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchField {
    CfaPattern,
    BlackLevel,
}

/// Replacement bytes for one recorded file range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Patch {
    pub field: PatchField,
    pub offset: u64,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Patch {
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn length_checked<T>(signature: &FieldSignature<T>, field: PatchField) -> Result<(), PatchError> {
    if signature.is_length_preserving() {
        Ok(())
    } else {
        Err(PatchError::LengthMismatch {
            field: format!("{field:?}"),
            old: signature.known_bad.len(),
            new: signature.known_good.len(),
        })
    }
}

/// Build the patches a classification calls for, CFA pattern first.
///
/// Returns an empty list when the verdict needs no writes.
pub fn plan_patches(
    classification: &Classification<'_>,
    metadata: &CameraMetadata,
) -> Result<Vec<Patch>, PatchError> {
    let mut patches = Vec::new();
    let verdict = classification.verdict;
    let Some(rule) = classification.rule else {
        return Ok(patches);
    };

    if verdict.needs_cfa_fix() {
        if let (Some(signature), Some(offset)) = (rule.cfa_pattern, metadata.cfa_pattern_offset) {
            length_checked(&signature, PatchField::CfaPattern)?;
            patches.push(Patch {
                field: PatchField::CfaPattern,
                offset: offset as u64,
                bytes: signature.known_good.to_vec(),
            });
        }
    }

    if verdict.needs_black_level_fix() {
        if let (Some(signature), Some(offset)) = (rule.black_level, metadata.black_level_offset) {
            length_checked(&signature, PatchField::BlackLevel)?;
            patches.push(Patch {
                field: PatchField::BlackLevel,
                offset: offset as u64,
                bytes: encode_rationals(signature.known_good),
            });
        }
    }

    Ok(patches)
}

// =============================================================================
// Patcher
// =============================================================================

/// Writes patches into an open read+write stream.
pub struct Patcher<F> {
    inner: F,
    size: u64,
    identifier: String,
}

impl Patcher<File> {
    /// Open an existing file for read+write without truncating it.
    pub fn open(path: &Path) -> Result<Self, PatchError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| PatchError::Open(e.to_string()))?;
        Self::new(file, path.display().to_string())
    }

    /// Flush file contents to disk.
    pub fn sync(&mut self) -> Result<(), PatchError> {
        self.inner
            .sync_all()
            .map_err(|e| PatchError::Sync(e.to_string()))
    }
}

impl<F: Read + Write + Seek> Patcher<F> {
    pub fn new(mut inner: F, identifier: impl Into<String>) -> Result<Self, PatchError> {
        let size = inner
            .seek(SeekFrom::End(0))
            .map_err(|e| PatchError::Open(e.to_string()))?;
        Ok(Self {
            inner,
            size,
            identifier: identifier.into(),
        })
    }

    /// Write one patch at its recorded offset.
    ///
    /// # Errors
    /// - `OutOfRange` if the patch would extend past the end of the file
    /// - `Write` on a seek or write failure
    pub fn apply(&mut self, patch: &Patch) -> Result<(), PatchError> {
        let end = patch.offset.checked_add(patch.len() as u64);
        if end.map_or(true, |end| end > self.size) {
            return Err(PatchError::OutOfRange {
                offset: patch.offset,
                len: patch.len(),
                size: self.size,
            });
        }

        let write_err = |e: std::io::Error| PatchError::Write {
            offset: patch.offset,
            len: patch.len(),
            message: e.to_string(),
        };

        debug!(
            file = %self.identifier,
            field = ?patch.field,
            offset = patch.offset,
            len = patch.len(),
            "Writing patch"
        );
        self.inner.seek(SeekFrom::Start(patch.offset)).map_err(write_err)?;
        self.inner.write_all(&patch.bytes).map_err(write_err)?;
        self.inner.flush().map_err(write_err)?;
        Ok(())
    }

    /// Re-read a patched range and compare it with the patch bytes.
    pub fn verify(&mut self, patch: &Patch) -> Result<(), PatchError> {
        let mut buf = vec![0u8; patch.len()];
        let read = self
            .inner
            .seek(SeekFrom::Start(patch.offset))
            .and_then(|_| self.inner.read_exact(&mut buf));

        match read {
            Ok(()) if buf == patch.bytes => Ok(()),
            Ok(()) => Err(PatchError::VerifyMismatch {
                offset: patch.offset,
            }),
            Err(e) => Err(PatchError::Write {
                offset: patch.offset,
                len: patch.len(),
                message: e.to_string(),
            }),
        }
    }

    /// Apply every patch in order, stopping at the first failure.
    ///
    /// Verification, when enabled, runs only after all writes succeeded.
    pub fn apply_all(&mut self, patches: &[Patch], verify: bool) -> PatchReport {
        let mut report = PatchReport::default();

        for patch in patches {
            if let Err(error) = self.apply(patch) {
                warn!(file = %self.identifier, %error, "Failed to alter the file");
                report.error = Some(error);
                return report;
            }
            report.applied.push(patch.field);
        }

        if verify {
            for patch in patches {
                if let Err(error) = self.verify(patch) {
                    warn!(file = %self.identifier, %error, "Patch verification failed");
                    report.error = Some(error);
                    return report;
                }
            }
        }

        report
    }

    /// Length of the stream when it was opened.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// What [`Patcher::apply_all`] managed to do.
#[derive(Debug, Clone, Default)]
pub struct PatchReport {
    /// Fields written, in order
    pub applied: Vec<PatchField>,

    /// The failure that stopped the run, if any
    pub error: Option<PatchError>,
}

impl PatchReport {
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

// =============================================================================
// Tests
// =============================================================================
