//! Fire-and-forget acceptance feedback.
//!
//! Accepting a suggestion emits an [`AcceptanceRecord`]; sinks consume
//! it without ever blocking the editing path. Delivery failures are
//! logged and forgotten — nothing downstream depends on the outcome.

use std::time::Duration;

use anyhow::Result;
use studywrite_core::AcceptanceRecord;
use tracing::debug;

pub trait FeedbackSink: Send + Sync {
    fn record(&self, record: AcceptanceRecord);
}

/// Discards every record. For tests and offline use.
#[derive(Debug, Default)]
pub struct NullSink;

impl FeedbackSink for NullSink {
    fn record(&self, _record: AcceptanceRecord) {}
}

/// Posts records to the feedback endpoint on a spawned task.
pub struct HttpFeedbackSink {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpFeedbackSink {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

impl FeedbackSink for HttpFeedbackSink {
    fn record(&self, record: AcceptanceRecord) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let api_key = self.api_key.clone();
        tokio::spawn(async move {
            match client
                .post(&endpoint)
                .bearer_auth(&api_key)
                .json(&record)
                .send()
                .await
            {
                Ok(resp) if !resp.status().is_success() => {
                    debug!(status = %resp.status(), "feedback post rejected");
                }
                Ok(_) => {}
                Err(e) => debug!("feedback post failed: {e}"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use studywrite_core::AnnotationKind;

    #[test]
    fn test_null_sink_swallows_records() {
        let sink = NullSink;
        sink.record(AcceptanceRecord {
            document_id: "doc-1".to_string(),
            kind: AnnotationKind::Grammar,
            original_text: "has".to_string(),
            replacement_text: "have".to_string(),
            accepted_at: Utc::now(),
        });
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = AcceptanceRecord {
            document_id: "doc-1".to_string(),
            kind: AnnotationKind::Spelling,
            original_text: "teh".to_string(),
            replacement_text: "the".to_string(),
            accepted_at: Utc::now(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["documentId"], "doc-1");
        assert_eq!(value["kind"], "spelling");
        assert_eq!(value["replacementText"], "the");
    }
}
