//! Step kinds, statuses and per-step outcomes

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One analysis facet of an audit. Each kind is a section of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Ranked keywords from the structured-data provider
    Keywords,
    /// Competing domains from the structured-data provider
    Competitor,
    /// Technical SEO review from the AI provider
    Technical,
    /// Content review from the AI provider, enriched with keywords
    Content,
    /// Visibility in AI-generated answers, enriched with keywords
    AiAnalysis,
}

/// Which provider adapter serves a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    /// LLM-backed analysis
    AiAnalysis,
    /// Keyword/competitor metrics
    StructuredData,
}

impl StepKind {
    /// Every declared section, in report order
    pub const ALL: [StepKind; 5] = [
        StepKind::Keywords,
        StepKind::Competitor,
        StepKind::Technical,
        StepKind::Content,
        StepKind::AiAnalysis,
    ];

    /// The adapter this step queries
    pub fn adapter(self) -> AdapterKind {
        match self {
            Self::Keywords | Self::Competitor => AdapterKind::StructuredData,
            Self::Technical | Self::Content | Self::AiAnalysis => AdapterKind::AiAnalysis,
        }
    }

    /// The step whose outcome this step's query is built from, if any
    pub fn depends_on(self) -> Option<StepKind> {
        match self {
            Self::Content | Self::AiAnalysis => Some(Self::Keywords),
            Self::Keywords | Self::Competitor | Self::Technical => None,
        }
    }

    /// Steps that wait on `self`
    pub fn dependents(self) -> impl Iterator<Item = StepKind> {
        Self::ALL
            .into_iter()
            .filter(move |kind| kind.depends_on() == Some(self))
    }

    /// Wire name, matching the serialized form
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keywords => "keywords",
            Self::Competitor => "competitor",
            Self::Technical => "technical",
            Self::Content => "content",
            Self::AiAnalysis => "ai_analysis",
        }
    }

    /// Section heading for rendered reports
    pub fn title(self) -> &'static str {
        match self {
            Self::Keywords => "Keyword Rankings",
            Self::Competitor => "Competitors",
            Self::Technical => "Technical SEO",
            Self::Content => "Content",
            Self::AiAnalysis => "AI Answer Visibility",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AiAnalysis => f.write_str("ai-analysis"),
            Self::StructuredData => f.write_str("structured-data"),
        }
    }
}

/// How a step resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// The provider answered
    Ok,
    /// The provider failed and no fallback was applied
    Failed,
    /// A placeholder payload stands in for the provider
    Fallback,
}

impl StepStatus {
    /// Whether the section carries provider data
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::Failed => f.write_str("failed"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// Result of a single step. Built once and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    kind: StepKind,
    status: StepStatus,
    payload: Option<Value>,
    error_detail: Option<String>,
}

impl StepOutcome {
    /// Provider success
    pub fn ok(kind: StepKind, payload: Value) -> Self {
        Self {
            kind,
            status: StepStatus::Ok,
            payload: Some(payload),
            error_detail: None,
        }
    }

    /// Provider failure with no substitute payload
    pub fn failed(kind: StepKind, error: impl Into<String>) -> Self {
        Self {
            kind,
            status: StepStatus::Failed,
            payload: None,
            error_detail: Some(error.into()),
        }
    }

    /// Placeholder payload standing in for a failed or unconfigured provider
    pub fn fallback(kind: StepKind, payload: Value, error: impl Into<String>) -> Self {
        Self {
            kind,
            status: StepStatus::Fallback,
            payload: Some(payload),
            error_detail: Some(error.into()),
        }
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    /// Split into owned parts for the assembler
    pub(crate) fn into_parts(self) -> (StepKind, StepStatus, Option<Value>, Option<String>) {
        (self.kind, self.status, self.payload, self.error_detail)
    }
}
