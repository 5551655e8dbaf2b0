//! Analysis request coordination for StudyWrite.
//!
//! Connects an editing session to the external text-analysis service:
//! one explicit user action becomes one bounded request, raw suggestions
//! are validated and repaired into annotations, and acceptance feedback
//! flows out on a best-effort path.

pub mod coordinator;
pub mod error;
pub mod feedback;
pub mod http;
pub mod service;
pub mod types;

pub use coordinator::{AnalysisCoordinator, DEFAULT_TIMEOUT};
pub use error::AnalysisError;
pub use feedback::{FeedbackSink, HttpFeedbackSink, NullSink};
pub use http::HttpAnalysisService;
pub use service::AnalysisService;
pub use types::{AnalysisMode, RawSuggestion};
