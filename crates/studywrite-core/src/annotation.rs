//! Suggestion annotations over a plain-text snapshot.
//!
//! An [`Annotation`] proposes a replacement for one char range of the
//! document. A set of annotations is only meaningful against the exact
//! text it was produced for; the session invalidates the whole set when
//! the text changes outside the accept path.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::text::PlainText;

/// Category of a suggestion. Affects presentation only, never
/// reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Grammar,
    Spelling,
    Style,
    Readability,
    Structure,
    Tone,
}

impl AnnotationKind {
    /// Short label shown next to a highlight.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Grammar => "Grammar",
            Self::Spelling => "Spelling",
            Self::Style => "Style",
            Self::Readability => "Readability",
            Self::Structure => "Structure",
            Self::Tone => "Tone",
        }
    }

    /// Parses a producer-supplied category name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "grammar" => Some(Self::Grammar),
            "spelling" => Some(Self::Spelling),
            "style" => Some(Self::Style),
            "readability" => Some(Self::Readability),
            "structure" => Some(Self::Structure),
            "tone" => Some(Self::Tone),
            _ => None,
        }
    }
}

/// Display weight of a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

impl Severity {
    /// Parses a producer-supplied severity name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// A proposed change to the char range `[start, end)` of the document.
///
/// `original_text` must equal the document slice at creation time; the
/// producer upholds this and [`validate`] enforces it.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Stable identifier for the annotation's lifetime.
    pub id: Uuid,
    pub kind: AnnotationKind,
    /// Start of the half-open char range.
    pub start: usize,
    /// End of the half-open char range (exclusive).
    pub end: usize,
    /// The document text the range covered when the annotation was made.
    pub original_text: String,
    /// The proposed substitution.
    pub replacement_text: String,
    pub severity: Severity,
    /// Human-readable reason for the suggestion.
    pub explanation: String,
}

impl Annotation {
    /// Length of the annotated range in chars.
    pub fn len_chars(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Signed length change the replacement would cause, in chars.
    pub fn delta(&self) -> isize {
        self.replacement_text.chars().count() as isize - self.len_chars() as isize
    }
}

/// Why a candidate annotation was rejected by [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// `start >= end`.
    EmptyRange,
    /// The range does not fit within the text.
    OutOfBounds,
    /// `original_text` does not match the text at the claimed range.
    TextMismatch,
    /// The range overlaps an annotation already kept in the set.
    Overlap,
}

/// Outcome of validating a candidate annotation against its target text.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid(Annotation),
    Rejected(RejectReason),
}

/// Checks a candidate annotation against the text it targets.
///
/// A valid annotation has a non-empty, in-bounds range whose text equals
/// `original_text`. Overlap is not checked here — that is a property of a
/// set, enforced by [`AnnotationSet::from_batch`].
pub fn validate(candidate: Annotation, text: &PlainText) -> Validation {
    if candidate.start >= candidate.end {
        return Validation::Rejected(RejectReason::EmptyRange);
    }
    if candidate.end > text.len_chars() {
        return Validation::Rejected(RejectReason::OutOfBounds);
    }
    match text.slice(candidate.start, candidate.end) {
        Ok(actual) if actual == candidate.original_text => Validation::Valid(candidate),
        _ => Validation::Rejected(RejectReason::TextMismatch),
    }
}

/// The active suggestions for one document snapshot, kept sorted by start
/// offset and pairwise disjoint.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    items: Vec<Annotation>,
}

impl AnnotationSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Builds a set from a producer batch.
    ///
    /// Each candidate is validated against `text`; invalid candidates and
    /// candidates overlapping an already-kept one are dropped (the
    /// producer is required to emit disjoint ranges, so a drop indicates
    /// a producer bug and is logged, never surfaced).
    pub fn from_batch(candidates: Vec<Annotation>, text: &PlainText) -> Self {
        let mut valid: Vec<Annotation> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let id = candidate.id;
            match validate(candidate, text) {
                Validation::Valid(a) => valid.push(a),
                Validation::Rejected(reason) => {
                    debug!(annotation = %id, ?reason, "dropping invalid annotation");
                }
            }
        }
        valid.sort_by_key(|a| (a.start, a.end));

        let mut items: Vec<Annotation> = Vec::with_capacity(valid.len());
        for a in valid {
            if items.last().is_some_and(|prev| a.start < prev.end) {
                debug!(annotation = %a.id, start = a.start, "dropping overlapping annotation");
                continue;
            }
            items.push(a);
        }
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates annotations in ascending start order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Annotation> {
        self.items.iter()
    }

    /// Looks up an annotation by id.
    pub fn get(&self, id: Uuid) -> Option<&Annotation> {
        self.items.iter().find(|a| a.id == id)
    }

    /// Removes and returns an annotation by id. Unknown ids are a no-op.
    pub fn remove(&mut self, id: Uuid) -> Option<Annotation> {
        let idx = self.items.iter().position(|a| a.id == id)?;
        Some(self.items.remove(idx))
    }

    /// Discards all annotations.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Rewrites surviving offsets after the range `[accepted_start,
    /// accepted_end)` was replaced with text `delta` chars longer (or
    /// shorter, when negative).
    ///
    /// Annotations entirely before the edit keep their offsets; those
    /// starting at or after `accepted_end` shift by `delta`; those
    /// overlapping the edited range are dropped, since the text they
    /// anchored to no longer exists. Returns the number dropped.
    pub fn reconcile_after_accept(
        &mut self,
        accepted_start: usize,
        accepted_end: usize,
        delta: isize,
    ) -> usize {
        let before = self.items.len();
        self.items.retain_mut(|a| {
            if a.end <= accepted_start {
                true
            } else if a.start >= accepted_end {
                a.start = shift(a.start, delta);
                a.end = shift(a.end, delta);
                true
            } else {
                debug!(annotation = %a.id, "dropping annotation overlapping accepted edit");
                false
            }
        });
        before - self.items.len()
    }
}

/// Applies a signed delta to an offset, saturating at zero.
pub(crate) fn shift(offset: usize, delta: isize) -> usize {
    if delta >= 0 {
        offset + delta as usize
    } else {
        offset.saturating_sub(delta.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann(start: usize, end: usize, original: &str, replacement: &str) -> Annotation {
        Annotation {
            id: Uuid::new_v4(),
            kind: AnnotationKind::Grammar,
            start,
            end,
            original_text: original.to_string(),
            replacement_text: replacement.to_string(),
            severity: Severity::Medium,
            explanation: String::new(),
        }
    }

    // ── validate ─────────────────────────────────────────────────────

    #[test]
    fn test_validate_accepts_matching_range() {
        let text = PlainText::from("I has a cat.");
        let result = validate(ann(2, 5, "has", "have"), &text);
        assert!(matches!(result, Validation::Valid(_)));
    }

    #[test]
    fn test_validate_rejects_empty_range() {
        let text = PlainText::from("I has a cat.");
        assert_eq!(
            validate(ann(5, 5, "", "x"), &text),
            Validation::Rejected(RejectReason::EmptyRange)
        );
        assert_eq!(
            validate(ann(5, 2, "has", "have"), &text),
            Validation::Rejected(RejectReason::EmptyRange)
        );
    }

    #[test]
    fn test_validate_rejects_out_of_bounds() {
        let text = PlainText::from("short");
        assert_eq!(
            validate(ann(2, 50, "ort", "x"), &text),
            Validation::Rejected(RejectReason::OutOfBounds)
        );
    }

    #[test]
    fn test_validate_rejects_text_mismatch() {
        let text = PlainText::from("I has a cat.");
        assert_eq!(
            validate(ann(2, 5, "had", "have"), &text),
            Validation::Rejected(RejectReason::TextMismatch)
        );
    }

    #[test]
    fn test_offset_invariant_after_validation() {
        let text = PlainText::from("The cat and dog run.");
        let result = validate(ann(4, 7, "cat", "kitten"), &text);
        match result {
            Validation::Valid(a) => {
                assert_eq!(text.slice(a.start, a.end).unwrap(), a.original_text);
            }
            Validation::Rejected(reason) => panic!("unexpected rejection: {reason:?}"),
        }
    }

    // ── from_batch ───────────────────────────────────────────────────

    #[test]
    fn test_from_batch_sorts_by_start() {
        let text = PlainText::from("The cat and dog run.");
        let set = AnnotationSet::from_batch(
            vec![ann(12, 15, "dog", "wolf"), ann(4, 7, "cat", "kitten")],
            &text,
        );
        let starts: Vec<usize> = set.iter().map(|a| a.start).collect();
        assert_eq!(starts, vec![4, 12]);
    }

    #[test]
    fn test_from_batch_drops_invalid_candidates() {
        let text = PlainText::from("The cat and dog run.");
        let set = AnnotationSet::from_batch(
            vec![
                ann(4, 7, "cat", "kitten"),
                ann(4, 7, "dog", "wolf"),  // mismatch
                ann(90, 95, "run", "ran"), // out of bounds
            ],
            &text,
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_from_batch_drops_overlapping_first_kept_wins() {
        let text = PlainText::from("The cat and dog run.");
        let set = AnnotationSet::from_batch(
            vec![ann(4, 11, "cat and", "cats or"), ann(8, 11, "and", "or")],
            &text,
        );
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().start, 4);
    }

    #[test]
    fn test_from_batch_keeps_adjacent_ranges() {
        let text = PlainText::from("abcdef");
        let set = AnnotationSet::from_batch(vec![ann(0, 3, "abc", "x"), ann(3, 6, "def", "y")], &text);
        assert_eq!(set.len(), 2);
    }

    // ── set membership ───────────────────────────────────────────────

    #[test]
    fn test_get_remove_clear() {
        let text = PlainText::from("The cat and dog run.");
        let a = ann(4, 7, "cat", "kitten");
        let id = a.id;
        let mut set = AnnotationSet::from_batch(vec![a, ann(12, 15, "dog", "wolf")], &text);

        assert!(set.get(id).is_some());
        assert!(set.remove(id).is_some());
        assert!(set.get(id).is_none());
        assert!(set.remove(id).is_none());

        set.clear();
        assert!(set.is_empty());
    }

    // ── reconcile_after_accept ───────────────────────────────────────

    #[test]
    fn test_reconcile_shifts_later_annotations() {
        let text = PlainText::from("I has a cat.");
        let mut set = AnnotationSet::from_batch(vec![ann(8, 11, "cat", "dog")], &text);

        // "has" (2..5) replaced by "have": delta = +1
        let dropped = set.reconcile_after_accept(2, 5, 1);
        assert_eq!(dropped, 0);
        let b = set.iter().next().unwrap();
        assert_eq!((b.start, b.end), (9, 12));
    }

    #[test]
    fn test_reconcile_leaves_earlier_annotations() {
        let text = PlainText::from("I has a cat.");
        let mut set = AnnotationSet::from_batch(vec![ann(2, 5, "has", "have")], &text);

        set.reconcile_after_accept(8, 11, -1);
        let a = set.iter().next().unwrap();
        assert_eq!((a.start, a.end), (2, 5));
    }

    #[test]
    fn test_reconcile_drops_overlapping_annotation() {
        let text = PlainText::from("The cat and dog run.");
        let mut set = AnnotationSet::from_batch(vec![ann(4, 11, "cat and", "pets")], &text);

        // An accepted edit over 8..15 overlaps 4..11.
        let dropped = set.reconcile_after_accept(8, 15, 2);
        assert_eq!(dropped, 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_reconcile_shifts_annotation_adjacent_to_edit_end() {
        let text = PlainText::from("abcdef");
        let mut set = AnnotationSet::from_batch(vec![ann(3, 6, "def", "xyz")], &text);

        // Edit over 0..3; the annotation starts exactly at the edit end.
        set.reconcile_after_accept(0, 3, -2);
        let a = set.iter().next().unwrap();
        assert_eq!((a.start, a.end), (1, 4));
    }

    #[test]
    fn test_shift_saturates_at_zero() {
        assert_eq!(shift(1, -5), 0);
        assert_eq!(shift(5, -2), 3);
        assert_eq!(shift(5, 2), 7);
    }

    // ── parsing helpers ──────────────────────────────────────────────

    #[test]
    fn test_kind_parse() {
        assert_eq!(AnnotationKind::parse("Grammar"), Some(AnnotationKind::Grammar));
        assert_eq!(AnnotationKind::parse("TONE"), Some(AnnotationKind::Tone));
        assert_eq!(AnnotationKind::parse("fluency"), None);
    }

    #[test]
    fn test_severity_parse_and_order() {
        assert_eq!(Severity::parse("high"), Some(Severity::High));
        assert_eq!(Severity::parse("urgent"), None);
        assert!(Severity::Low < Severity::High);
    }

    #[test]
    fn test_annotation_delta() {
        let a = ann(2, 5, "has", "have");
        assert_eq!(a.delta(), 1);
        let b = ann(0, 4, "very", "");
        assert_eq!(b.delta(), -4);
    }
}
