//! Configuration management for dng-fixup.
//!
//! Options come from command-line arguments via clap, with environment
//! variables under the `DNG_FIXUP_` prefix as a fallback:
//!
//! - `DNG_FIXUP_DIR` - Directory to scan (default: the Open Camera folder)
//! - `DNG_FIXUP_DRY_RUN` - Classify only, never write
//! - `DNG_FIXUP_NO_VERIFY` - Skip re-reading patched ranges
//! - `DNG_FIXUP_LENIENT_ASCII` - Skip files with malformed ASCII instead of aborting
//! - `DNG_FIXUP_FORMAT` - Summary format, `text` or `json`

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::fixup::CorrectorConfig;

// =============================================================================
// Default Values
// =============================================================================

/// Where Open Camera stores its DNG output on Android.
pub const DEFAULT_DIR: &str = "/storage/emulated/0/DCIM/OpenCamera/";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Output format for the run summary.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line per file plus totals
    #[default]
    Text,
    /// The full run summary as JSON
    Json,
}

/// dng-fixup - Repair black level and CFA pattern metadata in DNG files.
///
/// Scans a directory for DNG files written by affected cameras and rewrites
/// the broken fields in place. File length never changes.
#[derive(Parser, Debug, Clone)]
#[command(name = "dng-fixup")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Directory containing the DNG files.
    #[arg(default_value = DEFAULT_DIR, env = "DNG_FIXUP_DIR")]
    pub dir: PathBuf,

    // =========================================================================
    // Correction
    // =========================================================================
    /// Report what would be patched without writing anything.
    #[arg(long, default_value_t = false, env = "DNG_FIXUP_DRY_RUN")]
    pub dry_run: bool,

    /// Do not re-read patched ranges after writing.
    #[arg(long, default_value_t = false, env = "DNG_FIXUP_NO_VERIFY")]
    pub no_verify: bool,

    /// Skip files with a non-NUL-terminated ASCII value instead of aborting.
    #[arg(long, default_value_t = false, env = "DNG_FIXUP_LENIENT_ASCII")]
    pub lenient_ascii: bool,

    // =========================================================================
    // Output
    // =========================================================================
    /// Format of the run summary printed to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, env = "DNG_FIXUP_FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.dir.as_os_str().is_empty() {
            return Err("Directory is required. Pass DIR or set DNG_FIXUP_DIR".to_string());
        }

        Ok(())
    }

    /// Options for the correction pipeline.
    pub fn corrector_config(&self) -> CorrectorConfig {
        CorrectorConfig {
            dry_run: self.dry_run,
            verify: !self.dry_run && !self.no_verify,
            lenient_ascii: self.lenient_ascii,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
