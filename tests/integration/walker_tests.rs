//! IFD walking and metadata extraction over in-memory files.
//!
//! Tests verify:
//! - Every IFD of a chain is visited and values are collected with offsets
//! - Inline values resolve to the position of the value field itself
//! - Header problems and broken chains are reported as errors
//! - Directories re-encode to their exact on-disk bytes

use dng_fixup::fixup::read_camera_metadata;
use dng_fixup::format::tiff::{read_header, read_ifd, Rational};
use dng_fixup::io::SeekReader;
use dng_fixup::TiffError;

use super::test_utils::{
    camera_dng, main_ifd, raw_ifd, DngBuilder, IfdBuilder, AFFECTED_MODEL, BAD_BLACK_LEVEL,
    BAD_CFA, TAG_BLACK_LEVEL, TAG_CFA_PATTERN, TAG_UNIQUE_CAMERA_MODEL,
};

fn reader(bytes: &[u8]) -> SeekReader<std::io::Cursor<Vec<u8>>> {
    SeekReader::from_bytes(bytes.to_vec(), "mem://test.dng")
}

// =============================================================================
// Extraction
// =============================================================================

#[test]
fn test_collects_tags_across_ifds() {
    let dng = camera_dng(AFFECTED_MODEL, &BAD_BLACK_LEVEL, &BAD_CFA);
    let (meta, walk) = read_camera_metadata(&mut reader(&dng.bytes)).unwrap();

    assert_eq!(walk.ifd_count, 2);
    assert_eq!(walk.entry_count, 8);

    assert_eq!(meta.make.as_deref(), Some("samsung"));
    assert_eq!(meta.model.as_deref(), Some("SM-A320F"));
    assert_eq!(meta.unique_camera_model.as_deref(), Some(AFFECTED_MODEL));
    assert_eq!(meta.cfa_pattern.as_deref(), Some(&BAD_CFA[..]));
    assert_eq!(meta.black_level_repeat_dim, Some(vec![2, 2]));
    assert_eq!(meta.black_level, Some(vec![Rational::new(0, 1); 4]));
}

#[test]
fn test_recorded_offsets_match_layout() {
    let dng = camera_dng(AFFECTED_MODEL, &BAD_BLACK_LEVEL, &BAD_CFA);
    let (meta, _) = read_camera_metadata(&mut reader(&dng.bytes)).unwrap();

    assert_eq!(meta.cfa_pattern_offset, Some(dng.offset_of(TAG_CFA_PATTERN)));
    assert_eq!(meta.black_level_offset, Some(dng.offset_of(TAG_BLACK_LEVEL)));
}

#[test]
fn test_inline_cfa_offset_is_value_field_position() {
    let dng = camera_dng(AFFECTED_MODEL, &BAD_BLACK_LEVEL, &BAD_CFA);
    let (meta, _) = read_camera_metadata(&mut reader(&dng.bytes)).unwrap();

    // CFA pattern is the second entry of the raw IFD
    let raw_ifd_offset = dng.ifd_offsets[1];
    let expected = raw_ifd_offset + 2 + 12 + 8;
    assert_eq!(meta.cfa_pattern_offset, Some(expected));

    let offset = expected as usize;
    assert_eq!(&dng.bytes[offset..offset + 4], &BAD_CFA);
}

#[test]
fn test_black_level_is_out_of_line() {
    let dng = camera_dng(AFFECTED_MODEL, &BAD_BLACK_LEVEL, &BAD_CFA);
    let ifd = read_ifd(&mut reader(&dng.bytes), dng.ifd_offsets[1]).unwrap();

    let entry = ifd
        .entries
        .iter()
        .find(|e| e.tag_id == TAG_BLACK_LEVEL)
        .unwrap();
    assert!(!entry.is_inline());
    assert_eq!(entry.value_byte_size(), 32);
    assert_eq!(entry.data_offset(), dng.offset_of(TAG_BLACK_LEVEL));
}

#[test]
fn test_last_unique_model_wins() {
    let dng = DngBuilder::new()
        .add_ifd(main_ifd("Some-Other-Phone"))
        .add_ifd(IfdBuilder::new().ascii(TAG_UNIQUE_CAMERA_MODEL, AFFECTED_MODEL))
        .build();
    let (meta, _) = read_camera_metadata(&mut reader(&dng.bytes)).unwrap();
    assert_eq!(meta.unique_camera_model.as_deref(), Some(AFFECTED_MODEL));
}

#[test]
fn test_empty_ifd_chain() {
    let dng = DngBuilder::new().add_ifd(IfdBuilder::new()).build();
    let (meta, walk) = read_camera_metadata(&mut reader(&dng.bytes)).unwrap();
    assert_eq!(walk.ifd_count, 1);
    assert_eq!(walk.entry_count, 0);
    assert!(meta.unique_camera_model.is_none());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_big_endian_rejected() {
    let dng = DngBuilder::new()
        .with_magic(*b"MM")
        .add_ifd(main_ifd(AFFECTED_MODEL))
        .build();
    assert!(matches!(
        read_header(&mut reader(&dng.bytes)),
        Err(TiffError::UnsupportedByteOrder)
    ));
}

#[test]
fn test_garbage_header_rejected() {
    let data = b"JFIF garbage, not a tiff".to_vec();
    assert!(matches!(
        read_header(&mut reader(&data)),
        Err(TiffError::InvalidMagic(_))
    ));
}

#[test]
fn test_short_file_rejected() {
    assert!(matches!(
        read_header(&mut reader(b"II*")),
        Err(TiffError::FileTooSmall { .. })
    ));
}

#[test]
fn test_odd_first_offset_rejected() {
    let dng = DngBuilder::new()
        .with_first_ifd_offset(9)
        .add_ifd(main_ifd(AFFECTED_MODEL))
        .build();
    assert!(matches!(
        read_camera_metadata(&mut reader(&dng.bytes)),
        Err(TiffError::MisalignedIfdOffset(9))
    ));
}

#[test]
fn test_ifd_loop_detected() {
    let dng = DngBuilder::new()
        .add_ifd(main_ifd(AFFECTED_MODEL))
        .add_ifd(raw_ifd(&BAD_BLACK_LEVEL, &BAD_CFA))
        .with_loop()
        .build();
    let first = dng.ifd_offsets[0];
    assert!(matches!(
        read_camera_metadata(&mut reader(&dng.bytes)),
        Err(TiffError::IfdLoop(offset)) if offset == first
    ));
}

#[test]
fn test_ifd_past_end_of_file() {
    let dng = DngBuilder::new()
        .with_first_ifd_offset(0x1000)
        .add_ifd(main_ifd(AFFECTED_MODEL))
        .build();
    assert!(matches!(
        read_camera_metadata(&mut reader(&dng.bytes)),
        Err(TiffError::Io(_))
    ));
}

#[test]
fn test_unterminated_ascii() {
    let dng = DngBuilder::new()
        .add_ifd(IfdBuilder::new().ascii_unterminated(TAG_UNIQUE_CAMERA_MODEL, AFFECTED_MODEL))
        .build();
    assert!(matches!(
        read_camera_metadata(&mut reader(&dng.bytes)),
        Err(TiffError::UnterminatedAscii { tag: TAG_UNIQUE_CAMERA_MODEL, .. })
    ));
}

// =============================================================================
// Re-encoding
// =============================================================================

#[test]
fn test_ifd_reencodes_to_identical_bytes() {
    let dng = camera_dng(AFFECTED_MODEL, &BAD_BLACK_LEVEL, &BAD_CFA);
    let mut r = reader(&dng.bytes);

    for &offset in &dng.ifd_offsets {
        let ifd = read_ifd(&mut r, offset).unwrap();
        let encoded = ifd.encode();
        let start = offset as usize;
        assert_eq!(&dng.bytes[start..start + encoded.len()], encoded.as_slice());
    }
}
