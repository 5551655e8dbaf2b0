//! Editing session: the owning aggregate for one open document.
//!
//! An `EditorSession` ties together the plain-text body, the active
//! annotation set, the caret offset, and the document identity. All text
//! mutations flow through it so the annotation invariant holds: offsets
//! are rewritten on an accepted fix and the whole set is discarded on
//! any other edit. The session is the single logical writer — there is
//! no concurrent mutation to guard against.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::annotation::{Annotation, AnnotationKind, AnnotationSet};
use crate::render::{render, RenderTree};
use crate::store::DocumentRecord;
use crate::text::PlainText;

/// The state an analysis request is issued against.
///
/// Carrying the document identity and generation lets the session reject
/// a response that arrives after the user has edited or switched
/// documents in the meantime.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub document_id: String,
    pub generation: u64,
    pub text: String,
}

/// The outcome of an analysis request, tagged with the snapshot it was
/// produced against.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub document_id: String,
    pub generation: u64,
    pub annotations: Vec<Annotation>,
}

/// Emitted when the user accepts a suggestion; consumed by an optional
/// fire-and-forget feedback path. Nothing in the session depends on what
/// happens to it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceRecord {
    pub document_id: String,
    pub kind: AnnotationKind,
    pub original_text: String,
    pub replacement_text: String,
    pub accepted_at: DateTime<Utc>,
}

/// One open document being edited.
#[derive(Debug)]
pub struct EditorSession {
    document_id: String,
    title: String,
    text: PlainText,
    annotations: AnnotationSet,
    /// Caret as a char offset into the text.
    caret: usize,
    /// Bumped on every text mutation; annotation sets and analysis
    /// reports are only valid while it is unchanged.
    generation: u64,
    modified: bool,
}

impl EditorSession {
    /// Opens a session for a document loaded from the store.
    pub fn open(record: DocumentRecord) -> Self {
        Self {
            document_id: record.id,
            title: record.title,
            text: PlainText::from(record.content.as_str()),
            annotations: AnnotationSet::new(),
            caret: 0,
            generation: 0,
            modified: false,
        }
    }

    /// Switches the session to another loaded document.
    ///
    /// Annotations survive only when the incoming identity equals the
    /// tracked one *and* the content is unchanged — the case of the same
    /// document being re-delivered. A remote content update or a genuine
    /// switch discards them.
    pub fn reopen(&mut self, record: DocumentRecord) {
        let same_doc =
            record.id == self.document_id && record.content == self.text.to_string();
        if same_doc {
            self.title = record.title;
            return;
        }

        debug!(from = %self.document_id, to = %record.id, "switching document");
        self.document_id = record.id;
        self.title = record.title;
        self.text = PlainText::from(record.content.as_str());
        self.invalidate_annotations("document switch");
        self.caret = self.caret.min(self.text.len_chars());
        self.generation += 1;
        self.modified = false;
    }

    /// Ends the session, yielding the final content for persistence.
    pub fn close(self) -> String {
        self.text.to_string()
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &PlainText {
        &self.text
    }

    pub fn annotations(&self) -> &AnnotationSet {
        &self.annotations
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Marks the current content as persisted.
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// Moves the caret, clamped to the text bounds.
    pub fn set_caret(&mut self, offset: usize) {
        self.caret = offset.min(self.text.len_chars());
    }

    /// Captures the state an analysis request should run against.
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            document_id: self.document_id.clone(),
            generation: self.generation,
            text: self.text.to_string(),
        }
    }

    /// Renders the current text with its annotations overlaid.
    pub fn render(&self) -> RenderTree {
        render(&self.text, &self.annotations)
    }

    // ── Direct edits ─────────────────────────────────────────────────
    //
    // A free-form edit can change text anywhere; without a diff there is
    // no way to repair annotation offsets, so the set is discarded.

    /// Inserts text at a char offset (typing, paste, dictation append).
    ///
    /// # Errors
    ///
    /// Returns an error if the offset is out of bounds.
    pub fn insert_text(&mut self, at: usize, s: &str) -> Result<()> {
        self.text.insert(at, s)?;
        self.caret = at + s.chars().count();
        self.after_direct_edit();
        Ok(())
    }

    /// Deletes the char range [start..end).
    ///
    /// # Errors
    ///
    /// Returns an error if the range is out of bounds.
    pub fn delete_range(&mut self, start: usize, end: usize) -> Result<()> {
        self.text.remove(start, end)?;
        self.caret = start;
        self.after_direct_edit();
        Ok(())
    }

    /// Replaces the whole body (file import, remote overwrite).
    pub fn set_text(&mut self, s: &str) {
        self.text = PlainText::from(s);
        self.caret = self.caret.min(self.text.len_chars());
        self.after_direct_edit();
    }

    fn after_direct_edit(&mut self) {
        self.invalidate_annotations("direct edit");
        self.generation += 1;
        self.modified = true;
    }

    fn invalidate_annotations(&mut self, why: &str) {
        if !self.annotations.is_empty() {
            debug!(count = self.annotations.len(), why, "clearing annotation set");
            self.annotations.clear();
        }
    }

    // ── Suggestion transitions ───────────────────────────────────────

    /// Accepts a suggestion: substitutes the replacement text, removes
    /// the annotation, and rewrites the offsets of everything after the
    /// edit. Unknown or no-longer-valid ids are a no-op.
    ///
    /// Returns the acceptance record for the feedback path.
    pub fn accept(&mut self, id: Uuid) -> Option<AcceptanceRecord> {
        let ann = self.annotations.get(id)?.clone();
        if self
            .text
            .replace(ann.start, ann.end, &ann.replacement_text)
            .is_err()
        {
            debug!(annotation = %id, "accept ignored: range no longer fits the text");
            return None;
        }

        let delta = ann.delta();
        self.annotations.remove(id);
        self.annotations
            .reconcile_after_accept(ann.start, ann.end, delta);

        let replacement_len = ann.replacement_text.chars().count();
        if self.caret >= ann.end {
            self.caret = crate::annotation::shift(self.caret, delta);
        } else if self.caret > ann.start {
            self.caret = ann.start + replacement_len;
        }

        self.generation += 1;
        self.modified = true;

        Some(AcceptanceRecord {
            document_id: self.document_id.clone(),
            kind: ann.kind,
            original_text: ann.original_text,
            replacement_text: ann.replacement_text,
            accepted_at: Utc::now(),
        })
    }

    /// Dismisses a suggestion without touching the text. Unknown ids are
    /// a no-op. Returns whether an annotation was removed.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        self.annotations.remove(id).is_some()
    }

    /// Installs the annotations from a completed analysis, unless the
    /// report is stale — produced against a different document or an
    /// older generation — in which case it is discarded and `false` is
    /// returned.
    pub fn apply_analysis(&mut self, report: AnalysisReport) -> bool {
        if report.document_id != self.document_id || report.generation != self.generation {
            debug!(
                report_document = %report.document_id,
                report_generation = report.generation,
                current_generation = self.generation,
                "discarding stale analysis report"
            );
            return false;
        }
        self.annotations = AnnotationSet::from_batch(report.annotations, &self.text);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Severity;

    fn record(id: &str, content: &str) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            title: id.to_string(),
            content: content.to_string(),
            updated_at: Utc::now(),
        }
    }

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

    fn session_with(content: &str, annotations: Vec<Annotation>) -> EditorSession {
        let mut session = EditorSession::open(record("doc-1", content));
        let applied = session.apply_analysis(AnalysisReport {
            document_id: "doc-1".to_string(),
            generation: 0,
            annotations,
        });
        assert!(applied);
        session
    }

    // ── Accept ───────────────────────────────────────────────────────

    #[test]
    fn test_accept_substitutes_and_shifts_later_annotation() {
        let a = ann(2, 5, "has", "have");
        let b = ann(8, 11, "cat", "dog");
        let (a_id, b_id) = (a.id, b.id);
        let mut session = session_with("I has a cat.", vec![a, b]);

        let rec = session.accept(a_id).expect("accept succeeds");
        assert_eq!(session.text().to_string(), "I have a cat.");
        assert_eq!(rec.original_text, "has");
        assert_eq!(rec.replacement_text, "have");

        let b = session.annotations().get(b_id).expect("b survives");
        assert_eq!((b.start, b.end), (9, 12));
        assert_eq!(session.text().slice(9, 12).unwrap(), "cat");
    }

    #[test]
    fn test_accept_removes_accepted_annotation() {
        let a = ann(2, 5, "has", "have");
        let a_id = a.id;
        let mut session = session_with("I has a cat.", vec![a]);

        assert!(session.accept(a_id).is_some());
        assert!(session.annotations().is_empty());
        // Accepting again is a no-op.
        assert!(session.accept(a_id).is_none());
    }

    #[test]
    fn test_accept_unknown_id_is_noop() {
        let mut session = session_with("I has a cat.", vec![ann(2, 5, "has", "have")]);
        let before = session.text().to_string();
        assert!(session.accept(Uuid::new_v4()).is_none());
        assert_eq!(session.text().to_string(), before);
        assert_eq!(session.annotations().len(), 1);
    }

    #[test]
    fn test_accept_bumps_generation_and_marks_modified() {
        let a = ann(2, 5, "has", "have");
        let a_id = a.id;
        let mut session = session_with("I has a cat.", vec![a]);
        assert!(!session.is_modified());
        let gen = session.generation();

        session.accept(a_id);
        assert!(session.is_modified());
        assert_eq!(session.generation(), gen + 1);
    }

    #[test]
    fn test_accept_caret_after_edit_shifts() {
        let a = ann(2, 5, "has", "have");
        let a_id = a.id;
        let mut session = session_with("I has a cat.", vec![a]);
        session.set_caret(8);

        session.accept(a_id);
        assert_eq!(session.caret(), 9);
    }

    #[test]
    fn test_accept_caret_inside_edit_clamps_to_replacement_end() {
        let a = ann(2, 5, "has", "have");
        let a_id = a.id;
        let mut session = session_with("I has a cat.", vec![a]);
        session.set_caret(4);

        session.accept(a_id);
        assert_eq!(session.caret(), 6); // end of "have"
    }

    #[test]
    fn test_accept_caret_before_edit_untouched() {
        let a = ann(8, 11, "cat", "dog");
        let a_id = a.id;
        let mut session = session_with("I has a cat.", vec![a]);
        session.set_caret(1);

        session.accept(a_id);
        assert_eq!(session.caret(), 1);
    }

    #[test]
    fn test_accept_with_shrinking_replacement() {
        let a = ann(0, 9, "Basically", "So");
        let b = ann(10, 13, "teh", "the");
        let (a_id, b_id) = (a.id, b.id);
        let mut session = session_with("Basically teh end.", vec![a, b]);

        session.accept(a_id);
        assert_eq!(session.text().to_string(), "So teh end.");
        let b = session.annotations().get(b_id).unwrap();
        assert_eq!(session.text().slice(b.start, b.end).unwrap(), "teh");
    }

    // ── Dismiss ──────────────────────────────────────────────────────

    #[test]
    fn test_dismiss_removes_without_text_change() {
        let a = ann(2, 5, "has", "have");
        let a_id = a.id;
        let mut session = session_with("I has a cat.", vec![a]);

        assert!(session.dismiss(a_id));
        assert_eq!(session.text().to_string(), "I has a cat.");
        assert!(session.annotations().is_empty());
        assert!(!session.dismiss(a_id));
        assert!(!session.is_modified());
    }

    // ── Direct edits ─────────────────────────────────────────────────

    #[test]
    fn test_direct_insert_clears_annotations() {
        let mut session = session_with("I has a cat.", vec![ann(2, 5, "has", "have")]);
        session.insert_text(0, "Well, ").unwrap();
        assert!(session.annotations().is_empty());
        assert_eq!(session.text().to_string(), "Well, I has a cat.");
        assert_eq!(session.caret(), 6);
    }

    #[test]
    fn test_direct_delete_clears_annotations() {
        let mut session = session_with("I has a cat.", vec![ann(2, 5, "has", "have")]);
        session.delete_range(0, 2).unwrap();
        assert!(session.annotations().is_empty());
        assert_eq!(session.caret(), 0);
    }

    #[test]
    fn test_set_text_clears_annotations_and_clamps_caret() {
        let mut session = session_with("I has a cat.", vec![ann(2, 5, "has", "have")]);
        session.set_caret(12);
        session.set_text("tiny");
        assert!(session.annotations().is_empty());
        assert_eq!(session.caret(), 4);
    }

    #[test]
    fn test_out_of_bounds_edit_is_err_and_preserves_annotations() {
        let mut session = session_with("I has a cat.", vec![ann(2, 5, "has", "have")]);
        assert!(session.insert_text(100, "x").is_err());
        assert_eq!(session.annotations().len(), 1);
    }

    // ── Analysis application & staleness ─────────────────────────────

    #[test]
    fn test_apply_analysis_rejects_other_document() {
        let mut session = EditorSession::open(record("doc-1", "some text"));
        let applied = session.apply_analysis(AnalysisReport {
            document_id: "doc-2".to_string(),
            generation: 0,
            annotations: vec![],
        });
        assert!(!applied);
    }

    #[test]
    fn test_apply_analysis_rejects_stale_generation() {
        let mut session = EditorSession::open(record("doc-1", "I has a cat."));
        let snapshot = session.snapshot();

        // The user types while the request is in flight.
        session.insert_text(0, "Hey. ").unwrap();

        let applied = session.apply_analysis(AnalysisReport {
            document_id: snapshot.document_id,
            generation: snapshot.generation,
            annotations: vec![ann(2, 5, "has", "have")],
        });
        assert!(!applied);
        assert!(session.annotations().is_empty());
    }

    #[test]
    fn test_apply_analysis_rejects_after_document_switch() {
        let mut session = EditorSession::open(record("doc-1", "I has a cat."));
        let snapshot = session.snapshot();

        session.reopen(record("doc-2", "Other text."));

        let applied = session.apply_analysis(AnalysisReport {
            document_id: snapshot.document_id,
            generation: snapshot.generation,
            annotations: vec![ann(2, 5, "has", "have")],
        });
        assert!(!applied);
    }

    #[test]
    fn test_apply_analysis_installs_matching_report() {
        let mut session = EditorSession::open(record("doc-1", "I has a cat."));
        let applied = session.apply_analysis(AnalysisReport {
            document_id: "doc-1".to_string(),
            generation: session.generation(),
            annotations: vec![ann(2, 5, "has", "have"), ann(8, 11, "cat", "dog")],
        });
        assert!(applied);
        assert_eq!(session.annotations().len(), 2);
    }

    // ── Document switching ───────────────────────────────────────────

    #[test]
    fn test_reopen_same_document_same_content_keeps_annotations() {
        let mut session = session_with("I has a cat.", vec![ann(2, 5, "has", "have")]);
        session.reopen(record("doc-1", "I has a cat."));
        assert_eq!(session.annotations().len(), 1);
    }

    #[test]
    fn test_reopen_same_document_remote_update_clears_annotations() {
        let mut session = session_with("I has a cat.", vec![ann(2, 5, "has", "have")]);
        session.reopen(record("doc-1", "I has a dog."));
        assert!(session.annotations().is_empty());
        assert_eq!(session.text().to_string(), "I has a dog.");
    }

    #[test]
    fn test_reopen_different_document_clears_annotations() {
        let mut session = session_with("I has a cat.", vec![ann(2, 5, "has", "have")]);
        session.reopen(record("doc-2", "Fresh start."));
        assert!(session.annotations().is_empty());
        assert_eq!(session.document_id(), "doc-2");
    }

    #[test]
    fn test_close_yields_final_content() {
        let a = ann(2, 5, "has", "have");
        let a_id = a.id;
        let mut session = session_with("I has a cat.", vec![a]);
        session.accept(a_id);
        assert_eq!(session.close(), "I have a cat.");
    }
}
