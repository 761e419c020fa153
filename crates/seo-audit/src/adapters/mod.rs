//! Provider adapters
//!
//! Each adapter turns a [`ProviderQuery`] into either a section payload or a
//! [`ProviderFailure`]. Transport errors never escape an adapter in any other
//! form.

pub mod ai_analysis;
pub mod structured_data;

pub use ai_analysis::AiAnalysisAdapter;
pub use structured_data::StructuredDataAdapter;

use crate::engine::{AdapterKind, StepKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Why a provider call did not produce a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Credentials missing or rejected
    Unauthenticated,
    /// Network or server-side failure
    Unreachable,
    /// The provider answered with something unusable
    BadResponse,
    /// No answer within the time budget
    Timeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Unreachable => "unreachable",
            Self::BadResponse => "bad response",
            Self::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// A typed provider failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{provider}: {kind}: {detail}")]
pub struct ProviderFailure {
    pub provider: String,
    pub kind: FailureKind,
    pub detail: String,
}

impl ProviderFailure {
    pub fn new(provider: impl Into<String>, kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            kind,
            detail: detail.into(),
        }
    }

    /// Map a reqwest transport error onto a failure kind
    pub fn from_transport(provider: impl Into<String>, err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_decode() || err.is_body() {
            FailureKind::BadResponse
        } else {
            FailureKind::Unreachable
        };
        Self::new(provider, kind, err.to_string())
    }
}

/// One provider request for one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderQuery {
    /// The step being served
    pub kind: StepKind,
    /// Free-form query text: a prompt for AI steps, the target host for data steps
    pub text: String,
    /// Market code (`US`, `en-GB`, ...)
    pub market: String,
    /// Language hint (`en`, `de`, ...)
    pub language: String,
}

/// A provider behind the audit engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider name for logs and error details
    fn name(&self) -> &str;

    /// Which adapter slot this provider fills
    fn kind(&self) -> AdapterKind;

    /// Whether credentials are present. Unconfigured adapters are not queried.
    fn is_configured(&self) -> bool;

    /// Run a query. The caller enforces the time budget.
    async fn query(&self, query: &ProviderQuery) -> Result<Value, ProviderFailure>;
}

/// Stand-in for a provider with no credentials
#[derive(Debug, Clone)]
pub struct UnconfiguredAdapter {
    name: String,
    kind: AdapterKind,
}

impl UnconfiguredAdapter {
    pub fn new(kind: AdapterKind) -> Self {
        Self {
            name: kind.to_string(),
            kind,
        }
    }
}

#[async_trait]
impl ProviderAdapter for UnconfiguredAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> AdapterKind {
        self.kind
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn query(&self, _query: &ProviderQuery) -> Result<Value, ProviderFailure> {
        Err(ProviderFailure::new(
            &self.name,
            FailureKind::Unauthenticated,
            "no credentials configured",
        ))
    }
}
