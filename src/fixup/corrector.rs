//! Per-file correction pipeline and the run loop over many files.
//!
//! For one file: open read-only, parse the header, walk the IFD chain into a
//! fresh [`CameraMetadata`], close the read handle, classify, and only then
//! reopen read+write to patch. Every per-file problem becomes a
//! [`FileOutcome`]; the only error that escapes is a fatal decode error,
//! which stops the run.

use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};

use crate::error::{FixupError, PatchError, TiffError};
use crate::format::tiff::{read_header, walk_ifd_chain, WalkSummary};
use crate::io::{RangeReader, SeekReader};

use super::metadata::CameraMetadata;
use super::patcher::{plan_patches, Patch, PatchField, Patcher};
use super::signature::{classify, SignatureRule, Verdict, SIGNATURE_RULES};

// =============================================================================
// Configuration
// =============================================================================

/// Behaviour switches for a [`Corrector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrectorConfig {
    /// Classify and plan, but never open a write handle
    pub dry_run: bool,

    /// Re-read patched ranges after writing
    pub verify: bool,

    /// Treat a non-NUL-terminated ASCII value as a per-file skip instead of
    /// aborting the run
    pub lenient_ascii: bool,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            verify: true,
            lenient_ascii: false,
        }
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Why a file was left alone before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Not a little-endian classic TIFF
    UnsupportedFormat(String),

    /// First IFD offset is odd
    MisalignedIfd(u32),

    /// Open, seek or read failure, or a broken IFD chain
    ReadFailed(String),

    /// Unterminated ASCII value, in lenient mode
    MalformedAscii(String),

    /// The file could not be reopened for writing
    OpenForWriteFailed(String),

    /// The matching rule would change the length of a field
    PlanFailed(String),
}

impl SkipReason {
    /// Map a per-file decode error to a skip reason.
    ///
    /// Returns `None` for errors that are fatal to the run.
    fn from_tiff_error(err: &TiffError, lenient_ascii: bool) -> Option<Self> {
        let reason = match err {
            TiffError::InvalidMagic(_)
            | TiffError::UnsupportedByteOrder
            | TiffError::InvalidVersion(_)
            | TiffError::FileTooSmall { .. } => SkipReason::UnsupportedFormat(err.to_string()),
            TiffError::MisalignedIfdOffset(offset) => SkipReason::MisalignedIfd(*offset),
            TiffError::Io(_) | TiffError::IfdLoop(_) | TiffError::IfdChainTooLong(_) => {
                SkipReason::ReadFailed(err.to_string())
            }
            TiffError::UnterminatedAscii { .. } if lenient_ascii => {
                SkipReason::MalformedAscii(err.to_string())
            }
            TiffError::UnterminatedAscii { .. } => return None,
        };
        Some(reason)
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// The file was not decoded or not writable
    Skipped { reason: SkipReason },

    /// Classified, and the verdict calls for no writes
    Unchanged { verdict: Verdict },

    /// Dry run: these patches would have been written
    DryRun { verdict: Verdict, patches: Vec<Patch> },

    /// All patches written (and verified, if enabled)
    Patched { verdict: Verdict, patches: Vec<Patch> },

    /// Writing stopped part way; `applied` fields are on disk
    PatchFailed {
        verdict: Verdict,
        applied: Vec<PatchField>,
        error: String,
    },
}

/// Outcome of one file, with the camera it claimed to come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub camera: Option<String>,
    pub outcome: FileOutcome,
}

/// Counters and per-file reports for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub patched: usize,
    pub would_patch: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub files: Vec<FileReport>,
}

impl RunSummary {
    /// Add a file's report, updating the counters.
    pub fn record(&mut self, report: FileReport) {
        self.processed += 1;
        match report.outcome {
            FileOutcome::Patched { .. } => self.patched += 1,
            FileOutcome::DryRun { .. } => self.would_patch += 1,
            FileOutcome::Unchanged { .. } => self.unchanged += 1,
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::PatchFailed { .. } => self.failed += 1,
        }
        self.files.push(report);
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Parse the header and walk the whole IFD chain into fresh metadata.
pub fn read_camera_metadata<R: RangeReader>(
    reader: &mut R,
) -> Result<(CameraMetadata, WalkSummary), TiffError> {
    let header = read_header(reader)?;
    let mut metadata = CameraMetadata::new();
    let summary = walk_ifd_chain(reader, &header, &mut metadata)?;
    Ok((metadata, summary))
}

// =============================================================================
// Corrector
// =============================================================================

/// Applies a signature table to files on disk.
#[derive(Debug, Clone, Copy)]
pub struct Corrector<'r> {
    config: CorrectorConfig,
    rules: &'r [SignatureRule],
}

impl Corrector<'static> {
    /// A corrector using the built-in signature table.
    pub fn new(config: CorrectorConfig) -> Self {
        Self::with_rules(config, SIGNATURE_RULES)
    }
}

impl<'r> Corrector<'r> {
    pub fn with_rules(config: CorrectorConfig, rules: &'r [SignatureRule]) -> Self {
        Self { config, rules }
    }

    pub fn config(&self) -> &CorrectorConfig {
        &self.config
    }

    /// Process files in order, stopping only on a fatal error.
    pub fn run<I, P>(&self, paths: I) -> Result<RunSummary, FixupError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut summary = RunSummary::default();
        for path in paths {
            let report = self.process_file(path.as_ref())?;
            summary.record(report);
        }

        info!(
            processed = summary.processed,
            patched = summary.patched,
            would_patch = summary.would_patch,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            failed = summary.failed,
            "Run complete"
        );
        Ok(summary)
    }

    /// Inspect one file and patch it if its signature calls for it.
    ///
    /// # Errors
    /// Only `FixupError::Fatal`, for an unterminated ASCII value when
    /// `lenient_ascii` is off. Everything else is reported in the returned
    /// [`FileReport`].
    pub fn process_file(&self, path: &Path) -> Result<FileReport, FixupError> {
        let span = info_span!("file", path = %path.display());
        let _enter = span.enter();
        info!("Trying file");

        let report = |camera: Option<String>, outcome: FileOutcome| FileReport {
            path: path.to_path_buf(),
            camera,
            outcome,
        };

        // The read handle lives only inside this block
        let decoded = SeekReader::open(path)
            .map_err(TiffError::from)
            .and_then(|mut reader| read_camera_metadata(&mut reader));

        let metadata = match decoded {
            Ok((metadata, walk)) => {
                debug!(
                    ifds = walk.ifd_count,
                    entries = walk.entry_count,
                    make = ?metadata.make,
                    model = ?metadata.model,
                    "Decoded IFD chain"
                );
                metadata
            }
            Err(err) => {
                return match SkipReason::from_tiff_error(&err, self.config.lenient_ascii) {
                    Some(reason) => {
                        warn!(error = %err, "Error reading file");
                        Ok(report(None, FileOutcome::Skipped { reason }))
                    }
                    None => {
                        error!(error = %err, "Aborting run");
                        Err(FixupError::Fatal {
                            path: path.display().to_string(),
                            source: err,
                        })
                    }
                };
            }
        };

        let camera = metadata.unique_camera_model.clone();
        let classification = classify(&metadata, self.rules);
        let verdict = classification.verdict;
        info!(?verdict, "{}", verdict.description());

        if !verdict.needs_patch() {
            return Ok(report(camera, FileOutcome::Unchanged { verdict }));
        }

        let patches = match plan_patches(&classification, &metadata) {
            Ok(patches) => patches,
            Err(err) => {
                warn!(error = %err, "Won't touch the file");
                let reason = SkipReason::PlanFailed(err.to_string());
                return Ok(report(camera, FileOutcome::Skipped { reason }));
            }
        };

        if self.config.dry_run {
            for patch in &patches {
                info!(field = ?patch.field, offset = patch.offset, "Dry run: would write patch");
            }
            return Ok(report(camera, FileOutcome::DryRun { verdict, patches }));
        }

        let outcome = self.write_patches(Patcher::open(path), verdict, patches, Patcher::sync);
        Ok(report(camera, outcome))
    }

    /// Write planned patches through a freshly opened handle.
    ///
    /// `finish` runs once every patch has been written and verified.
    fn write_patches<F, S>(
        &self,
        opened: Result<Patcher<F>, PatchError>,
        verdict: Verdict,
        patches: Vec<Patch>,
        finish: S,
    ) -> FileOutcome
    where
        F: Read + Write + Seek,
        S: FnOnce(&mut Patcher<F>) -> Result<(), PatchError>,
    {
        let mut patcher = match opened {
            Ok(patcher) => patcher,
            Err(err) => {
                warn!(error = %err, "Failed to open file for writing");
                let reason = SkipReason::OpenForWriteFailed(err.to_string());
                return FileOutcome::Skipped { reason };
            }
        };

        let result = patcher.apply_all(&patches, self.config.verify);
        let error = match result.error {
            None => finish(&mut patcher).err(),
            Some(err) => Some(err),
        };

        match error {
            None => {
                info!(patches = patches.len(), "File corrected");
                FileOutcome::Patched { verdict, patches }
            }
            Some(err) => {
                error!(error = %err, applied = result.applied.len(), "File left partially corrected");
                FileOutcome::PatchFailed {
                    verdict,
                    applied: result.applied,
                    error: err.to_string(),
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
