//! Candidate file discovery.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::FixupError;

/// File name suffixes treated as DNG candidates. Matching is case-sensitive.
pub const DNG_SUFFIXES: &[&str] = &[".dng", ".DNG"];

/// Minimum length of the full path, suffix included.
const MIN_PATH_LEN: usize = 4;

/// Whether a path looks like a DNG: the full path is longer than
/// [`MIN_PATH_LEN`] bytes and the file name ends in one of [`DNG_SUFFIXES`].
///
/// Names are compared as raw bytes, so non-UTF-8 names still match.
pub fn is_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.as_encoded_bytes();

    path.as_os_str().len() > MIN_PATH_LEN
        && DNG_SUFFIXES
            .iter()
            .any(|suffix| name.ends_with(suffix.as_bytes()))
}

/// List the DNG candidates directly inside `dir`, sorted by path.
///
/// Subdirectories are not descended into, and entries that are not regular
/// files are ignored.
pub fn find_candidates(dir: &Path) -> Result<Vec<PathBuf>, FixupError> {
    let scan_err = |e: std::io::Error| FixupError::Scan {
        path: dir.display().to_string(),
        message: e.to_string(),
    };

    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir).map_err(scan_err)? {
        let path = entry.map_err(scan_err)?.path();
        if !is_candidate(&path) {
            continue;
        }
        if !path.is_file() {
            debug!(path = %path.display(), "Ignoring non-file entry");
            continue;
        }
        candidates.push(path);
    }

    candidates.sort();
    debug!(dir = %dir.display(), count = candidates.len(), "Found candidate files");
    Ok(candidates)
}
