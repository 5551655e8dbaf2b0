//! HTTP client for the hosted analysis service.
//!
//! POSTs `{text, mode}` and expects `{suggestions: [...]}` back. Each
//! suggestion entry is decoded individually so one malformed entry never
//! fails the batch; only an undecodable top-level body is `Malformed`.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AnalysisError;
use crate::service::AnalysisService;
use crate::types::{AnalysisMode, RawSuggestion};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    text: &'a str,
    mode: AnalysisMode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    #[serde(default)]
    suggestions: Vec<serde_json::Value>,
}

pub struct HttpAnalysisService {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpAnalysisService {
    /// Builds a client for the given endpoint.
    ///
    /// The reqwest-level timeout is a transport backstop; the
    /// coordinator applies the user-facing request ceiling on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn analyze(
        &self,
        text: &str,
        mode: AnalysisMode,
    ) -> Result<Vec<RawSuggestion>, AnalysisError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&AnalyzeRequest { text, mode })
            .send()
            .await
            .map_err(classify_transport)?;

        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AnalysisError::AuthInvalid)
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(AnalysisError::RateLimited),
            status if !status.is_success() => {
                return Err(AnalysisError::Transport(format!(
                    "unexpected http status {status}"
                )))
            }
            _ => {}
        }

        let body: AnalyzeResponse = resp
            .json()
            .await
            .map_err(|e| AnalysisError::Malformed(e.to_string()))?;

        let mut out = Vec::with_capacity(body.suggestions.len());
        for value in body.suggestions {
            match serde_json::from_value::<RawSuggestion>(value) {
                Ok(s) => out.push(s),
                Err(e) => debug!("dropping undecodable suggestion entry: {e}"),
            }
        }
        Ok(out)
    }
}

fn classify_transport(e: reqwest::Error) -> AnalysisError {
    if e.is_timeout() {
        AnalysisError::Timeout
    } else {
        AnalysisError::Transport(e.to_string())
    }
}
