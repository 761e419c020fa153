//! Audit report types

use super::step::{StepKind, StepStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One report slot: a payload, an error, or both for fallback sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub status: StepStatus,
    pub payload: Option<Value>,
    pub error: Option<String>,
}

/// Section counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub ok: usize,
    pub fallback: usize,
    pub failed: usize,
}

impl ReportSummary {
    fn record(&mut self, status: StepStatus) {
        match status {
            StepStatus::Ok => self.ok += 1,
            StepStatus::Fallback => self.fallback += 1,
            StepStatus::Failed => self.failed += 1,
        }
    }

    /// Whether any section is not backed by provider data
    pub fn is_degraded(&self) -> bool {
        self.fallback + self.failed > 0
    }
}

/// The assembled audit. Every [`StepKind`] has a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub domain: String,
    pub market: String,
    pub language: String,
    pub generated_at: DateTime<Utc>,
    pub recommendations: Vec<String>,
    pub sections: BTreeMap<StepKind, Section>,
    pub summary: ReportSummary,
}

impl AuditReport {
    pub(crate) fn new(
        domain: String,
        market: String,
        language: String,
        recommendations: Vec<String>,
        sections: BTreeMap<StepKind, Section>,
    ) -> Self {
        let mut summary = ReportSummary::default();
        for section in sections.values() {
            summary.record(section.status);
        }

        Self {
            domain,
            market,
            language,
            generated_at: Utc::now(),
            recommendations,
            sections,
            summary,
        }
    }

    /// Section for a step kind
    pub fn section(&self, kind: StepKind) -> Option<&Section> {
        self.sections.get(&kind)
    }

    /// Status of a step kind's section
    pub fn status(&self, kind: StepKind) -> Option<StepStatus> {
        self.section(kind).map(|s| s.status)
    }

    /// Whether every declared section is present
    pub fn is_complete(&self) -> bool {
        StepKind::ALL.iter().all(|k| self.sections.contains_key(k))
    }

    /// Short one-line description for logs and headers
    pub fn headline(&self) -> String {
        format!(
            "SEO audit for {} ({}) - {}/{} sections live, {} fallback, {} failed ({})",
            self.domain,
            self.market,
            self.summary.ok,
            self.sections.len(),
            self.summary.fallback,
            self.summary.failed,
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        )
    }
}
