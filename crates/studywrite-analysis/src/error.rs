//! Classified failures of the analysis path.
//!
//! Every failure is terminal at the coordinator boundary: callers show a
//! single notice naming the category and leave the session untouched.
//! The session and renderer never see an error, only zero or more valid
//! annotations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The service did not answer within the configured ceiling.
    #[error("the analysis request timed out")]
    Timeout,

    /// The service rejected the credentials.
    #[error("the analysis service rejected the API credentials")]
    AuthInvalid,

    /// The service is throttling requests.
    #[error("the analysis service is rate limiting requests")]
    RateLimited,

    /// The service could not be reached or answered outside its contract.
    #[error("could not reach the analysis service: {0}")]
    Transport(String),

    /// The response body could not be decoded at all.
    #[error("the analysis service returned a malformed response: {0}")]
    Malformed(String),
}

impl AnalysisError {
    /// Short category name for logs and notices.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::AuthInvalid => "auth",
            Self::RateLimited => "rate-limit",
            Self::Transport(_) => "transport",
            Self::Malformed(_) => "malformed",
        }
    }
}
