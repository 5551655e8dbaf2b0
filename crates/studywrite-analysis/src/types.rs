//! Wire types for the analysis service contract.

use serde::{Deserialize, Serialize};
use studywrite_core::{AnnotationKind, Severity};

/// The mode configuration forwarded with a request. Changes the
/// instruction profile the service applies, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Grammar and spelling only.
    #[default]
    Proofread,
    /// Formal register, citations-friendly phrasing.
    Academic,
    /// Wordiness and redundancy.
    Concise,
    /// Everything the service can flag.
    Full,
}

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 4] = [
        Self::Proofread,
        Self::Academic,
        Self::Concise,
        Self::Full,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proofread => "proofread",
            Self::Academic => "academic",
            Self::Concise => "concise",
            Self::Full => "full",
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "proofread" => Ok(Self::Proofread),
            "academic" => Ok(Self::Academic),
            "concise" => Ok(Self::Concise),
            "full" => Ok(Self::Full),
            other => Err(format!(
                "unknown mode '{other}' (expected one of: proofread, academic, concise, full)"
            )),
        }
    }
}

/// One suggestion as emitted by the service. Producer categories and
/// severities arrive as free-form strings; unknown values fall back to
/// defaults instead of failing the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSuggestion {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub severity: String,
    pub original_text: String,
    pub replacement_text: String,
    #[serde(default)]
    pub explanation: String,
    pub start_index: usize,
    pub end_index: usize,
}

impl RawSuggestion {
    pub fn kind_or_default(&self) -> AnnotationKind {
        AnnotationKind::parse(&self.kind).unwrap_or(AnnotationKind::Style)
    }

    pub fn severity_or_default(&self) -> Severity {
        Severity::parse(&self.severity).unwrap_or_default()
    }
}
