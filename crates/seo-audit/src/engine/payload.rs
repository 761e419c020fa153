//! Section payload shapes
//!
//! Real provider results and fallback placeholders serialize to the same
//! shapes, so a section's `status` is the only thing that tells them apart.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A keyword the domain ranks for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub keyword: String,
    pub search_volume: Option<u64>,
    pub position: Option<u32>,
}

/// Payload of the `keywords` section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeywordsPayload {
    pub keywords: Vec<KeywordEntry>,
    pub total_count: u64,
}

/// A domain competing for the same keywords
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorEntry {
    pub domain: String,
    pub common_keywords: Option<u64>,
    pub avg_position: Option<f64>,
}

/// Payload of the `competitor` section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompetitorsPayload {
    pub competitors: Vec<CompetitorEntry>,
    pub total_count: u64,
}

/// Payload of the AI-backed sections
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub summary: String,
    pub findings: Vec<String>,
    pub source: String,
}

const MAX_FINDINGS: usize = 8;

impl AnalysisPayload {
    /// Build a payload from free-form model output.
    ///
    /// Bullet (`-`, `*`, `•`) and numbered (`1.`, `2)`) lines become findings.
    pub fn from_text(text: &str, source: impl Into<String>) -> Self {
        let findings = text
            .lines()
            .filter_map(strip_list_marker)
            .filter(|line| !line.is_empty())
            .take(MAX_FINDINGS)
            .map(str::to_string)
            .collect();

        Self {
            summary: text.trim().to_string(),
            findings,
            source: source.into(),
        }
    }
}

fn strip_list_marker(line: &str) -> Option<&str> {
    let line = line.trim();
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))
    {
        return Some(rest.trim());
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return Some(rest.trim());
        }
    }
    None
}

/// Serialize a payload struct into the opaque section value
pub(crate) fn to_value<T: Serialize>(payload: &T) -> Value {
    // Plain structs of strings and numbers always serialize
    serde_json::to_value(payload).unwrap_or(Value::Null)
}
