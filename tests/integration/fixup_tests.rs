//! End-to-end correction of files on disk.
//!
//! Tests verify:
//! - Affected files are patched at exactly the recorded offsets
//! - File length never changes and unrelated bytes are untouched
//! - A second run over a corrected file writes nothing
//! - Unexpected values, other models and broken files are left alone
//! - Dry run, lenient ASCII handling and directory runs

use std::fs;

use dng_fixup::{
    find_candidates, Corrector, CorrectorConfig, FileOutcome, FixupError, PatchField, SkipReason,
    Verdict,
};

use super::test_utils::{
    camera_dng, changed_bytes, main_ifd, rational_bytes, DngBuilder, IfdBuilder,
    AFFECTED_MODEL, BAD_BLACK_LEVEL, BAD_CFA, GOOD_BLACK_LEVEL, GOOD_CFA, TAG_BLACK_LEVEL,
    TAG_CFA_PATTERN, TAG_UNIQUE_CAMERA_MODEL,
};

fn corrector() -> Corrector<'static> {
    Corrector::new(CorrectorConfig::default())
}

// =============================================================================
// Patching
// =============================================================================

#[test]
fn test_bad_signature_patched_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let dng = camera_dng(AFFECTED_MODEL, &BAD_BLACK_LEVEL, &BAD_CFA);
    let path = dng.write_to(dir.path(), "IMG_0001.dng");

    let report = corrector().process_file(&path).unwrap();
    match &report.outcome {
        FileOutcome::Patched { verdict, patches } => {
            assert_eq!(*verdict, Verdict::NeedsBothFixes);
            assert_eq!(patches[0].field, PatchField::CfaPattern);
            assert_eq!(patches[1].field, PatchField::BlackLevel);
        }
        other => panic!("expected Patched, got {:?}", other),
    }
    assert_eq!(report.camera.as_deref(), Some(AFFECTED_MODEL));

    let after = fs::read(&path).unwrap();
    assert_eq!(after.len(), dng.bytes.len());

    let cfa = dng.offset_of(TAG_CFA_PATTERN) as usize;
    let black = dng.offset_of(TAG_BLACK_LEVEL) as usize;
    assert_eq!(&after[cfa..cfa + 4], &GOOD_CFA);
    assert_eq!(&after[black..black + 32], rational_bytes(&GOOD_BLACK_LEVEL).as_slice());

    // Nothing outside the two ranges moved
    for i in changed_bytes(&dng.bytes, &after) {
        assert!(
            (cfa..cfa + 4).contains(&i) || (black..black + 32).contains(&i),
            "unexpected change at byte {}",
            i
        );
    }
}

#[test]
fn test_second_run_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let dng = camera_dng(AFFECTED_MODEL, &BAD_BLACK_LEVEL, &BAD_CFA);
    let path = dng.write_to(dir.path(), "IMG_0002.dng");

    corrector().process_file(&path).unwrap();
    let once = fs::read(&path).unwrap();

    let report = corrector().process_file(&path).unwrap();
    assert_eq!(
        report.outcome,
        FileOutcome::Unchanged {
            verdict: Verdict::AlreadyCorrect
        }
    );
    assert_eq!(fs::read(&path).unwrap(), once);
}

#[test]
fn test_black_level_only() {
    let dir = tempfile::tempdir().unwrap();
    let dng = camera_dng(AFFECTED_MODEL, &BAD_BLACK_LEVEL, &GOOD_CFA);
    let path = dng.write_to(dir.path(), "IMG_0003.dng");

    let report = corrector().process_file(&path).unwrap();
    assert!(matches!(
        report.outcome,
        FileOutcome::Patched {
            verdict: Verdict::NeedsBlackLevelFix,
            ..
        }
    ));

    let after = fs::read(&path).unwrap();
    let black = dng.offset_of(TAG_BLACK_LEVEL) as usize;
    let changed = changed_bytes(&dng.bytes, &after);
    assert!(!changed.is_empty());
    assert!(changed.iter().all(|i| (black..black + 32).contains(i)));
}

#[test]
fn test_cfa_only() {
    let dir = tempfile::tempdir().unwrap();
    let dng = camera_dng(AFFECTED_MODEL, &GOOD_BLACK_LEVEL, &BAD_CFA);
    let path = dng.write_to(dir.path(), "IMG_0004.dng");

    let report = corrector().process_file(&path).unwrap();
    assert!(matches!(
        report.outcome,
        FileOutcome::Patched {
            verdict: Verdict::NeedsCfaFix,
            ..
        }
    ));

    let after = fs::read(&path).unwrap();
    let cfa = dng.offset_of(TAG_CFA_PATTERN) as usize;
    assert_eq!(changed_bytes(&dng.bytes, &after), vec![cfa, cfa + 1, cfa + 2, cfa + 3]);
}

// =============================================================================
// Files left alone
// =============================================================================

#[test]
fn test_other_model_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let dng = camera_dng("Pixel 7-Google-google", &BAD_BLACK_LEVEL, &BAD_CFA);
    let path = dng.write_to(dir.path(), "PXL_0001.dng");

    let report = corrector().process_file(&path).unwrap();
    assert_eq!(
        report.outcome,
        FileOutcome::Unchanged {
            verdict: Verdict::NotApplicableModel
        }
    );
    assert_eq!(fs::read(&path).unwrap(), dng.bytes);
}

#[test]
fn test_unexpected_cfa_blocks_all_writes() {
    let dir = tempfile::tempdir().unwrap();
    let dng = camera_dng(AFFECTED_MODEL, &BAD_BLACK_LEVEL, &[2, 1, 1, 0]);
    let path = dng.write_to(dir.path(), "IMG_0005.dng");

    let report = corrector().process_file(&path).unwrap();
    assert_eq!(
        report.outcome,
        FileOutcome::Unchanged {
            verdict: Verdict::UnexpectedCfaPattern
        }
    );
    assert_eq!(fs::read(&path).unwrap(), dng.bytes);
}

#[test]
fn test_unexpected_black_level_blocks_all_writes() {
    let dir = tempfile::tempdir().unwrap();
    let dng = camera_dng(AFFECTED_MODEL, &[(64, 1); 4], &BAD_CFA);
    let path = dng.write_to(dir.path(), "IMG_0006.dng");

    let report = corrector().process_file(&path).unwrap();
    assert_eq!(
        report.outcome,
        FileOutcome::Unchanged {
            verdict: Verdict::UnexpectedBlackLevel
        }
    );
    assert_eq!(fs::read(&path).unwrap(), dng.bytes);
}

#[test]
fn test_garbage_file_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.dng");
    fs::write(&path, b"this is not a tiff file at all").unwrap();

    let report = corrector().process_file(&path).unwrap();
    assert!(matches!(
        report.outcome,
        FileOutcome::Skipped {
            reason: SkipReason::UnsupportedFormat(_)
        }
    ));
    assert_eq!(fs::read(&path).unwrap(), b"this is not a tiff file at all");
}

#[test]
fn test_misaligned_first_ifd_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let dng = DngBuilder::new()
        .with_first_ifd_offset(11)
        .add_ifd(main_ifd(AFFECTED_MODEL))
        .build();
    let path = dng.write_to(dir.path(), "odd.dng");

    let report = corrector().process_file(&path).unwrap();
    assert_eq!(
        report.outcome,
        FileOutcome::Skipped {
            reason: SkipReason::MisalignedIfd(11)
        }
    );
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let dng = camera_dng(AFFECTED_MODEL, &BAD_BLACK_LEVEL, &BAD_CFA);
    let path = dng.write_to(dir.path(), "IMG_0007.dng");

    let corrector = Corrector::new(CorrectorConfig {
        dry_run: true,
        ..CorrectorConfig::default()
    });
    let report = corrector.process_file(&path).unwrap();
    match report.outcome {
        FileOutcome::DryRun { verdict, patches } => {
            assert_eq!(verdict, Verdict::NeedsBothFixes);
            assert_eq!(patches.len(), 2);
            assert_eq!(patches[0].offset, dng.offset_of(TAG_CFA_PATTERN) as u64);
            assert_eq!(patches[1].offset, dng.offset_of(TAG_BLACK_LEVEL) as u64);
        }
        other => panic!("expected DryRun, got {:?}", other),
    }
    assert_eq!(fs::read(&path).unwrap(), dng.bytes);
}

// =============================================================================
// ASCII handling
// =============================================================================

fn unterminated_dng() -> Vec<u8> {
    DngBuilder::new()
        .add_ifd(IfdBuilder::new().ascii_unterminated(TAG_UNIQUE_CAMERA_MODEL, AFFECTED_MODEL))
        .build()
        .bytes
}

#[test]
fn test_unterminated_ascii_is_fatal_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("a_bad.dng");
    fs::write(&bad, unterminated_dng()).unwrap();
    let good = camera_dng(AFFECTED_MODEL, &BAD_BLACK_LEVEL, &BAD_CFA);
    let good_path = good.write_to(dir.path(), "b_good.dng");

    let paths = find_candidates(dir.path()).unwrap();
    let result = corrector().run(&paths);
    assert!(matches!(result, Err(FixupError::Fatal { .. })));

    // The run stopped before reaching the second file
    assert_eq!(fs::read(&good_path).unwrap(), good.bytes);
}

#[test]
fn test_unterminated_ascii_skipped_when_lenient() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("a_bad.dng");
    fs::write(&bad, unterminated_dng()).unwrap();
    let good = camera_dng(AFFECTED_MODEL, &BAD_BLACK_LEVEL, &BAD_CFA);
    good.write_to(dir.path(), "b_good.dng");

    let corrector = Corrector::new(CorrectorConfig {
        lenient_ascii: true,
        ..CorrectorConfig::default()
    });
    let paths = find_candidates(dir.path()).unwrap();
    let summary = corrector.run(&paths).unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.patched, 1);
    assert!(matches!(
        summary.files[0].outcome,
        FileOutcome::Skipped {
            reason: SkipReason::MalformedAscii(_)
        }
    ));
}

// =============================================================================
// Directory runs
// =============================================================================

#[test]
fn test_directory_run_summary() {
    let dir = tempfile::tempdir().unwrap();
    camera_dng(AFFECTED_MODEL, &BAD_BLACK_LEVEL, &BAD_CFA).write_to(dir.path(), "1.dng");
    camera_dng(AFFECTED_MODEL, &GOOD_BLACK_LEVEL, &GOOD_CFA).write_to(dir.path(), "2.DNG");
    camera_dng("Other-Phone", &BAD_BLACK_LEVEL, &BAD_CFA).write_to(dir.path(), "3.dng");
    fs::write(dir.path().join("4.dng"), b"junk").unwrap();
    fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let paths = find_candidates(dir.path()).unwrap();
    assert_eq!(paths.len(), 4);

    let summary = corrector().run(&paths).unwrap();
    assert_eq!(summary.processed, 4);
    assert_eq!(summary.patched, 1);
    assert_eq!(summary.unchanged, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["files"][0]["outcome"]["status"], "patched");
    assert_eq!(json["files"][1]["outcome"]["verdict"], "already_correct");
}

#[test]
fn test_dry_run_summary_counts_would_patch() {
    let dir = tempfile::tempdir().unwrap();
    let bad = camera_dng(AFFECTED_MODEL, &BAD_BLACK_LEVEL, &BAD_CFA);
    let bad_path = bad.write_to(dir.path(), "1.dng");
    camera_dng(AFFECTED_MODEL, &GOOD_BLACK_LEVEL, &GOOD_CFA).write_to(dir.path(), "2.dng");

    let corrector = Corrector::new(CorrectorConfig {
        dry_run: true,
        ..CorrectorConfig::default()
    });
    let paths = find_candidates(dir.path()).unwrap();
    let summary = corrector.run(&paths).unwrap();

    assert_eq!(summary.would_patch, 1);
    assert_eq!(summary.patched, 0);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(fs::read(&bad_path).unwrap(), bad.bytes);
}
