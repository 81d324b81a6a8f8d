//! Known corruption signatures and the classifier that matches them.
//!
//! Each [`SignatureRule`] names one camera model together with the exact
//! known-bad and known-good values of the fields it may rewrite. A field that
//! matches neither constant stops all patching for the file.

use serde::Serialize;

use crate::format::tiff::Rational;

use super::metadata::CameraMetadata;

// =============================================================================
// Signature table
// =============================================================================

/// The known-bad and known-good encodings of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSignature<T: 'static> {
    pub known_bad: &'static [T],
    pub known_good: &'static [T],
}

impl<T> FieldSignature<T> {
    /// Whether rewriting bad with good keeps the on-disk length.
    pub const fn is_length_preserving(&self) -> bool {
        self.known_bad.len() == self.known_good.len()
    }
}

/// One camera model and the corruption it is known to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureRule {
    /// Exact DNG UniqueCameraModel string
    pub model: &'static str,

    /// Required BlackLevelRepeatDim
    pub repeat_dim: &'static [u16],

    /// BlackLevel signature; `None` leaves the field alone
    pub black_level: Option<FieldSignature<Rational>>,

    /// CFAPattern signature; `None` leaves the field alone
    pub cfa_pattern: Option<FieldSignature<u8>>,
}

/// Samsung Galaxy A3 (2017) writing DNGs through Open Camera: black level
/// stored as zero and the CFA pattern shifted by one column.
pub const SM_A320F: SignatureRule = SignatureRule {
    model: "SM-A320F-samsung-samsung",
    repeat_dim: &[2, 2],
    black_level: Some(FieldSignature {
        known_bad: &[Rational::new(0, 1); 4],
        known_good: &[Rational::new(331, 5); 4],
    }),
    cfa_pattern: Some(FieldSignature {
        known_bad: &[1, 0, 2, 1],
        known_good: &[0, 1, 1, 2],
    }),
};

/// Built-in rules, checked in order.
pub const SIGNATURE_RULES: &[SignatureRule] = &[SM_A320F];

// =============================================================================
// Verdict
// =============================================================================

/// Outcome of classifying one file's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    NotApplicableModel,
    UnexpectedRepeatDim,
    UnexpectedBlackLevel,
    UnexpectedCfaPattern,
    NeedsBlackLevelFix,
    NeedsCfaFix,
    NeedsBothFixes,
    AlreadyCorrect,
    NoFixNeeded,
}

impl Verdict {
    #[inline]
    pub const fn needs_black_level_fix(self) -> bool {
        matches!(self, Verdict::NeedsBlackLevelFix | Verdict::NeedsBothFixes)
    }

    #[inline]
    pub const fn needs_cfa_fix(self) -> bool {
        matches!(self, Verdict::NeedsCfaFix | Verdict::NeedsBothFixes)
    }

    /// Whether any bytes should be written.
    #[inline]
    pub const fn needs_patch(self) -> bool {
        self.needs_black_level_fix() || self.needs_cfa_fix()
    }

    /// Human-readable description for log output.
    pub const fn description(self) -> &'static str {
        match self {
            Verdict::NotApplicableModel => "Not a relevant camera model",
            Verdict::UnexpectedRepeatDim => "Unexpected black level repeat dimension",
            Verdict::UnexpectedBlackLevel => "Unexpected black level. Won't touch the file",
            Verdict::UnexpectedCfaPattern => "Unexpected CFA pattern. Won't touch the file",
            Verdict::NeedsBlackLevelFix => "Black level needs fixup",
            Verdict::NeedsCfaFix => "CFA pattern field needs to be fixed up",
            Verdict::NeedsBothFixes => "Black level and CFA pattern need fixup",
            Verdict::AlreadyCorrect => "Black level and CFA pattern are already OK",
            Verdict::NoFixNeeded => "No fix needed",
        }
    }
}

/// A verdict together with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    pub verdict: Verdict,
    pub rule: Option<&'a SignatureRule>,
}

// =============================================================================
// Classifier
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    Bad,
    Good,
    Unexpected,
    Unchecked,
}

fn field_state<T: PartialEq>(signature: Option<&FieldSignature<T>>, value: Option<&[T]>) -> FieldState {
    let Some(signature) = signature else {
        return FieldState::Unchecked;
    };

    match value {
        Some(v) if v == signature.known_bad => FieldState::Bad,
        Some(v) if v == signature.known_good => FieldState::Good,
        _ => FieldState::Unexpected,
    }
}

/// Classify a file's metadata against a rule table.
///
/// Decision order: model, repeat dimension, black level, CFA pattern. The
/// first mismatch wins, so an unexpected CFA pattern blocks a black level fix
/// and vice versa.
pub fn classify<'a>(metadata: &CameraMetadata, rules: &'a [SignatureRule]) -> Classification<'a> {
    let rule = metadata
        .unique_camera_model
        .as_deref()
        .and_then(|model| rules.iter().find(|rule| rule.model == model));

    let Some(rule) = rule else {
        return Classification {
            verdict: Verdict::NotApplicableModel,
            rule: None,
        };
    };

    let verdict = classify_with_rule(metadata, rule);
    Classification {
        verdict,
        rule: Some(rule),
    }
}

fn classify_with_rule(metadata: &CameraMetadata, rule: &SignatureRule) -> Verdict {
    if metadata.black_level_repeat_dim.as_deref() != Some(rule.repeat_dim) {
        return Verdict::UnexpectedRepeatDim;
    }

    let black_level = field_state(rule.black_level.as_ref(), metadata.black_level.as_deref());
    if black_level == FieldState::Unexpected {
        return Verdict::UnexpectedBlackLevel;
    }

    let cfa = field_state(rule.cfa_pattern.as_ref(), metadata.cfa_pattern.as_deref());
    if cfa == FieldState::Unexpected {
        return Verdict::UnexpectedCfaPattern;
    }

    match (black_level, cfa) {
        (FieldState::Bad, FieldState::Bad) => Verdict::NeedsBothFixes,
        (FieldState::Bad, _) => Verdict::NeedsBlackLevelFix,
        (_, FieldState::Bad) => Verdict::NeedsCfaFix,
        (FieldState::Good, FieldState::Good) => Verdict::AlreadyCorrect,
        _ => Verdict::NoFixNeeded,
    }
}

// =============================================================================
// Tests
// =============================================================================
