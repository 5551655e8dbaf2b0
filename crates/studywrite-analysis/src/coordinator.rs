//! Bridges user intent ("check my writing") to the analysis service.
//!
//! One explicit user action produces one attempt: no automatic trigger,
//! no retry, no backoff. The call is raced against a fixed ceiling and
//! every raw suggestion is validated — and repaired where possible —
//! before it becomes an annotation. The resulting report is tagged with
//! the snapshot it was produced against so the session can discard it if
//! the document moved on in the meantime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use uuid::Uuid;

use studywrite_core::{
    validate, AnalysisReport, Annotation, DocumentSnapshot, PlainText, Validation,
};

use crate::error::AnalysisError;
use crate::service::AnalysisService;
use crate::types::{AnalysisMode, RawSuggestion};

/// Ceiling applied when the config does not override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AnalysisCoordinator {
    service: Arc<dyn AnalysisService>,
    timeout: Duration,
    in_flight: AtomicBool,
}

impl AnalysisCoordinator {
    pub fn new(service: Arc<dyn AnalysisService>, timeout: Duration) -> Self {
        Self {
            service,
            timeout,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a request is currently outstanding. The UI layer gates
    /// the trigger on this; the coordinator itself does not reject
    /// re-entry.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Runs one analysis attempt against the given snapshot.
    ///
    /// # Errors
    ///
    /// Returns the classified failure; the caller renders it as a notice
    /// and leaves the session state untouched.
    pub async fn request_analysis(
        &self,
        snapshot: &DocumentSnapshot,
        mode: AnalysisMode,
    ) -> Result<AnalysisReport, AnalysisError> {
        self.in_flight.store(true, Ordering::SeqCst);
        let _guard = FlightGuard(&self.in_flight);

        let raw = match tokio::time::timeout(
            self.timeout,
            self.service.analyze(&snapshot.text, mode),
        )
        .await
        {
            Ok(result) => result?,
            Err(_elapsed) => return Err(AnalysisError::Timeout),
        };

        let text = PlainText::from(snapshot.text.as_str());
        let mut annotations = Vec::with_capacity(raw.len());
        for suggestion in raw {
            if let Some(a) = map_suggestion(suggestion, &text) {
                annotations.push(a);
            }
        }
        debug!(
            document = %snapshot.document_id,
            count = annotations.len(),
            "analysis completed"
        );
        Ok(AnalysisReport {
            document_id: snapshot.document_id.clone(),
            generation: snapshot.generation,
            annotations,
        })
    }
}

/// Clears the in-flight flag when the request resolves, including on
/// early error returns and cancellation.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Maps one raw suggestion into a validated annotation.
///
/// When the claimed range does not match the document, the original text
/// is located by literal substring search — first at or after the
/// claimed start, then anywhere — and the offsets corrected. A
/// suggestion whose text cannot be found is dropped, never an error.
fn map_suggestion(raw: RawSuggestion, text: &PlainText) -> Option<Annotation> {
    match validate(annotation_from(&raw, raw.start_index, raw.end_index), text) {
        Validation::Valid(a) => return Some(a),
        Validation::Rejected(reason) => {
            debug!(
                ?reason,
                claimed_start = raw.start_index,
                claimed_end = raw.end_index,
                "suggestion failed validation, attempting offset repair"
            );
        }
    }

    if raw.original_text.is_empty() {
        debug!("dropping suggestion with empty original text");
        return None;
    }

    let from = raw.start_index.min(text.len_chars());
    let found = match text
        .find_from(&raw.original_text, from)
        .or_else(|| text.find(&raw.original_text))
    {
        Some(idx) => idx,
        None => {
            debug!("dropping suggestion: original text not present in document");
            return None;
        }
    };

    let end = found + raw.original_text.chars().count();
    match validate(annotation_from(&raw, found, end), text) {
        Validation::Valid(a) => {
            debug!(start = found, end, "repaired suggestion offsets");
            Some(a)
        }
        Validation::Rejected(reason) => {
            debug!(?reason, "dropping unrepairable suggestion");
            None
        }
    }
}

fn annotation_from(raw: &RawSuggestion, start: usize, end: usize) -> Annotation {
    Annotation {
        id: Uuid::new_v4(),
        kind: raw.kind_or_default(),
        start,
        end,
        original_text: raw.original_text.clone(),
        replacement_text: raw.replacement_text.clone(),
        severity: raw.severity_or_default(),
        explanation: raw.explanation.clone(),
    }
}
