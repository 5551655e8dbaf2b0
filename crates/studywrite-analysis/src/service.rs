//! The external text-analysis collaborator, behind a trait so the
//! coordinator can be exercised without a network.

use async_trait::async_trait;

use crate::error::AnalysisError;
use crate::types::{AnalysisMode, RawSuggestion};

#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Analyzes `text` under the given mode, returning raw suggestions
    /// in document order.
    async fn analyze(
        &self,
        text: &str,
        mode: AnalysisMode,
    ) -> Result<Vec<RawSuggestion>, AnalysisError>;
}
