//! Folds step outcomes into an [`AuditReport`]

use super::payload::{AnalysisPayload, CompetitorsPayload, KeywordsPayload};
use super::report::{AuditReport, Section};
use super::request::AuditRequest;
use super::step::{StepKind, StepOutcome, StepStatus};
use crate::error::{AuditError, Result};
use crate::market;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::error;

const DEFAULT_MAX_RECOMMENDATIONS: usize = 10;
const FINDINGS_PER_SECTION: usize = 3;
const PAGE_TWO: std::ops::RangeInclusive<u32> = 11..=20;

/// Builds reports. Apart from the timestamp, the output depends only on the
/// request and the outcomes.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    max_recommendations: usize,
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECOMMENDATIONS)
    }
}

impl ReportAssembler {
    pub fn new(max_recommendations: usize) -> Self {
        Self {
            max_recommendations: max_recommendations.max(1),
        }
    }

    /// Assemble a report. When a kind appears more than once, the last
    /// outcome for it wins.
    pub fn assemble(&self, request: &AuditRequest, outcomes: Vec<StepOutcome>) -> Result<AuditReport> {
        let mut sections = BTreeMap::new();
        for outcome in outcomes {
            let (kind, status, payload, error) = outcome.into_parts();
            if status != StepStatus::Failed && payload.is_none() {
                return Err(internal(format!(
                    "{kind} section is marked {status} but has no payload"
                )));
            }
            sections.insert(kind, Section { status, payload, error });
        }

        if let Some(missing) = StepKind::ALL.iter().find(|k| !sections.contains_key(k)) {
            return Err(internal(format!("no outcome for the {missing} step")));
        }

        let recommendations = self.recommendations(request, &sections);

        Ok(AuditReport::new(
            request.domain().to_string(),
            request.market().to_string(),
            request.language().to_string(),
            recommendations,
            sections,
        ))
    }

    /// One generic entry per section without usable data is always kept;
    /// specific entries fill whatever room the cap leaves after them.
    fn recommendations(&self, request: &AuditRequest, sections: &BTreeMap<StepKind, Section>) -> Vec<String> {
        let market_name = market::display_name(request.market());

        let per_section: Vec<(bool, Vec<String>)> = sections
            .iter()
            .map(|(kind, section)| {
                let specific = match (section.status, &section.payload) {
                    (StepStatus::Ok, Some(payload)) => specific_recommendations(*kind, payload, &market_name),
                    _ => Vec::new(),
                };
                if specific.is_empty() {
                    (true, vec![generic_recommendation(*kind, &market_name)])
                } else {
                    (false, specific)
                }
            })
            .collect();

        let generic_count = per_section.iter().filter(|(generic, _)| *generic).count();
        let mut specific_budget = self.max_recommendations.saturating_sub(generic_count);
        let mut seen = HashSet::new();
        let mut recs = Vec::new();

        for (generic, entries) in per_section {
            for rec in entries {
                if !generic && specific_budget == 0 {
                    break;
                }
                if seen.insert(rec.clone()) {
                    if !generic {
                        specific_budget -= 1;
                    }
                    recs.push(rec);
                }
            }
        }

        recs
    }
}

fn internal(message: String) -> AuditError {
    error!("Report assembly failed: {}", message);
    AuditError::Internal(message)
}

fn parse<T: DeserializeOwned>(payload: &Value) -> Option<T> {
    serde_json::from_value(payload.clone()).ok()
}

/// Recommendations drawn from provider data. Empty when the payload has
/// nothing usable.
fn specific_recommendations(kind: StepKind, payload: &Value, market_name: &str) -> Vec<String> {
    match kind {
        StepKind::Keywords => parse::<KeywordsPayload>(payload)
            .map(|p| keyword_recommendations(&p, market_name))
            .unwrap_or_default(),
        StepKind::Competitor => parse::<CompetitorsPayload>(payload)
            .and_then(|p| p.competitors.into_iter().next())
            .map(|leader| {
                let shared = leader
                    .common_keywords
                    .map(|n| format!(" ({n} shared keywords)"))
                    .unwrap_or_default();
                vec![format!(
                    "Benchmark against {}, the leading organic competitor in {market_name}{shared}",
                    leader.domain
                )]
            })
            .unwrap_or_default(),
        StepKind::Technical | StepKind::Content | StepKind::AiAnalysis => {
            parse::<AnalysisPayload>(payload)
                .map(analysis_recommendations)
                .unwrap_or_default()
        }
    }
}

fn keyword_recommendations(payload: &KeywordsPayload, market_name: &str) -> Vec<String> {
    let mut recs = Vec::new();

    // Lowest position wins; ties keep payload order
    let best = payload
        .keywords
        .iter()
        .filter_map(|k| k.position.map(|p| (p, k)))
        .min_by_key(|(p, _)| *p);
    if let Some((position, entry)) = best {
        let volume = entry
            .search_volume
            .map(|v| format!(", {v} monthly searches"))
            .unwrap_or_default();
        recs.push(format!(
            "Protect the ranking for '{}' (position {position}{volume}) in {market_name}",
            entry.keyword
        ));
    }

    recs.extend(
        payload
            .keywords
            .iter()
            .filter_map(|k| k.position.filter(|p| PAGE_TWO.contains(p)).map(|p| (p, k)))
            .take(2)
            .map(|(position, entry)| {
                format!(
                    "Move '{}' from position {position} onto page one",
                    entry.keyword
                )
            }),
    );

    recs
}

fn analysis_recommendations(payload: AnalysisPayload) -> Vec<String> {
    if !payload.findings.is_empty() {
        return payload
            .findings
            .into_iter()
            .take(FINDINGS_PER_SECTION)
            .collect();
    }

    first_sentence(&payload.summary)
        .map(|s| vec![s.to_string()])
        .unwrap_or_default()
}

fn first_sentence(text: &str) -> Option<&str> {
    let text = text.trim();
    let sentence_end = text.find(". ").map(|i| i + 1);
    let line_end = text.find('\n');
    let end = match (sentence_end, line_end) {
        (Some(a), Some(b)) => a.min(b),
        (a, b) => a.or(b).unwrap_or(text.len()),
    };
    let sentence = text[..end].trim();
    (!sentence.is_empty()).then_some(sentence)
}

/// Used for degraded sections. Never looks at the payload.
fn generic_recommendation(kind: StepKind, market_name: &str) -> String {
    match kind {
        StepKind::Keywords => {
            format!("Run keyword research to find the search terms that matter in {market_name}")
        }
        StepKind::Competitor => {
            format!("Identify the main organic competitors in {market_name} and track their rankings")
        }
        StepKind::Technical => format!(
            "Audit crawlability, page speed and mobile usability for searchers in {market_name}"
        ),
        StepKind::Content => {
            format!("Plan content around the questions your audience in {market_name} searches for")
        }
        StepKind::AiAnalysis => {
            format!("Make key pages easy to cite in AI-generated answers for users in {market_name}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::payload::{CompetitorEntry, KeywordEntry};
    use crate::fallback::{FallbackGenerator, PlaceholderFallback};
    use serde_json::json;

    fn request() -> AuditRequest {
        AuditRequest::new("example.com", "US").unwrap()
    }

    fn keywords() -> Value {
        serde_json::to_value(KeywordsPayload {
            keywords: vec![
                KeywordEntry {
                    keyword: "widget repair".to_string(),
                    search_volume: Some(90),
                    position: Some(14),
                },
                KeywordEntry {
                    keyword: "blue widgets".to_string(),
                    search_volume: Some(2400),
                    position: Some(3),
                },
            ],
            total_count: 2,
        })
        .unwrap()
    }

    fn all_fallback() -> Vec<StepOutcome> {
        let fallback = PlaceholderFallback::new();
        StepKind::ALL
            .iter()
            .map(|kind| {
                StepOutcome::fallback(*kind, fallback.generate(*kind, "example.com", "US"), "down")
            })
            .collect()
    }

    fn without_timestamp(report: &AuditReport) -> String {
        let mut value = serde_json::to_value(report).unwrap();
        value.as_object_mut().unwrap().remove("generated_at");
        serde_json::to_string(&value).unwrap()
    }

    #[test]
    fn test_specific_recommendations_from_ok_sections() {
        let mut outcomes = all_fallback();
        outcomes.push(StepOutcome::ok(StepKind::Keywords, keywords()));
        outcomes.push(StepOutcome::ok(
            StepKind::Competitor,
            serde_json::to_value(CompetitorsPayload {
                competitors: vec![CompetitorEntry {
                    domain: "rival.com".to_string(),
                    common_keywords: Some(42),
                    avg_position: Some(6.5),
                }],
                total_count: 1,
            })
            .unwrap(),
        ));

        let report = ReportAssembler::default().assemble(&request(), outcomes).unwrap();
        assert_eq!(
            report.recommendations[0],
            "Protect the ranking for 'blue widgets' (position 3, 2400 monthly searches) in United States"
        );
        assert_eq!(
            report.recommendations[1],
            "Move 'widget repair' from position 14 onto page one"
        );
        assert!(report.recommendations[2].contains("rival.com"));
        assert!(report.recommendations[2].contains("42 shared keywords"));
    }

    #[test]
    fn test_degraded_sections_get_market_specific_generic_advice() {
        let report = ReportAssembler::default()
            .assemble(&request(), all_fallback())
            .unwrap();

        assert_eq!(report.recommendations.len(), StepKind::ALL.len());
        assert!(report.recommendations.iter().all(|r| r.contains("United States")));
        assert_eq!(report.summary.fallback, 5);
    }

    #[test]
    fn test_failed_sections_without_payload() {
        let outcomes = StepKind::ALL
            .iter()
            .map(|kind| StepOutcome::failed(*kind, "unreachable"))
            .collect();
        let report = ReportAssembler::default().assemble(&request(), outcomes).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.summary.failed, 5);
        assert!(!report.recommendations.is_empty());
        let section = report.section(StepKind::Technical).unwrap();
        assert_eq!(section.payload, None);
        assert_eq!(section.error.as_deref(), Some("unreachable"));
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let build = || {
            let mut outcomes = all_fallback();
            outcomes.push(StepOutcome::ok(StepKind::Keywords, keywords()));
            outcomes.push(StepOutcome::ok(
                StepKind::Technical,
                json!({"summary": "Fine.", "findings": ["Fix redirects"], "source": "openai"}),
            ));
            ReportAssembler::default().assemble(&request(), outcomes).unwrap()
        };

        assert_eq!(without_timestamp(&build()), without_timestamp(&build()));
    }

    #[test]
    fn test_last_outcome_for_a_kind_wins() {
        let mut outcomes = all_fallback();
        outcomes.push(StepOutcome::ok(StepKind::Keywords, keywords()));
        outcomes.push(StepOutcome::failed(StepKind::Keywords, "second attempt failed"));

        let report = ReportAssembler::default().assemble(&request(), outcomes).unwrap();
        assert_eq!(report.status(StepKind::Keywords), Some(StepStatus::Failed));
    }

    #[test]
    fn test_missing_kind_is_internal_error() {
        let mut outcomes = all_fallback();
        outcomes.retain(|o| o.kind() != StepKind::Content);

        let err = ReportAssembler::default().assemble(&request(), outcomes).unwrap_err();
        assert!(matches!(err, AuditError::Internal(msg) if msg.contains("content")));
    }

    #[test]
    fn test_recommendations_are_capped_and_deduplicated() {
        let findings = json!({
            "summary": "x",
            "findings": ["Same advice", "Same advice", "Other advice"],
            "source": "openai"
        });
        let mut outcomes = all_fallback();
        outcomes.push(StepOutcome::ok(StepKind::Technical, findings.clone()));
        outcomes.push(StepOutcome::ok(StepKind::Content, findings));

        let report = ReportAssembler::new(5).assemble(&request(), outcomes).unwrap();
        assert_eq!(report.recommendations.len(), 5);
        assert_eq!(report.recommendations[2], "Same advice");
        assert_eq!(report.recommendations[3], "Other advice");
        let same = report
            .recommendations
            .iter()
            .filter(|r| r.as_str() == "Same advice")
            .count();
        assert_eq!(same, 1);
    }

    #[test]
    fn test_cap_keeps_generic_advice_for_degraded_sections() {
        let analysis = |prefix: &str| {
            json!({
                "summary": "x",
                "findings": [format!("{prefix} 1"), format!("{prefix} 2"), format!("{prefix} 3")],
                "source": "openai"
            })
        };
        let fallback = PlaceholderFallback::new();
        let outcomes = vec![
            StepOutcome::ok(
                StepKind::Keywords,
                json!({
                    "keywords": [
                        {"keyword": "a", "search_volume": null, "position": 1},
                        {"keyword": "b", "search_volume": null, "position": 12},
                        {"keyword": "c", "search_volume": null, "position": 13}
                    ],
                    "total_count": 3
                }),
            ),
            StepOutcome::ok(
                StepKind::Competitor,
                json!({"competitors": [{"domain": "rival.com", "common_keywords": null, "avg_position": null}], "total_count": 1}),
            ),
            StepOutcome::ok(StepKind::Technical, analysis("technical")),
            StepOutcome::ok(StepKind::Content, analysis("content")),
            StepOutcome::fallback(
                StepKind::AiAnalysis,
                fallback.generate(StepKind::AiAnalysis, "example.com", "US"),
                "openai: timeout",
            ),
        ];

        let report = ReportAssembler::default().assemble(&request(), outcomes).unwrap();

        assert_eq!(report.recommendations.len(), 10);
        assert_eq!(
            report.recommendations.last().map(String::as_str),
            Some("Make key pages easy to cite in AI-generated answers for users in United States")
        );
        assert!(!report.recommendations.iter().any(|r| r == "content 3"));
    }

    #[test]
    fn test_generic_advice_survives_a_tiny_cap() {
        let report = ReportAssembler::new(1).assemble(&request(), all_fallback()).unwrap();
        assert_eq!(report.recommendations.len(), StepKind::ALL.len());
    }

    #[test]
    fn test_first_sentence() {
        assert_eq!(first_sentence("Looks good. More text"), Some("Looks good."));
        assert_eq!(first_sentence("One line\nsecond"), Some("One line"));
        assert_eq!(first_sentence("Line one\nLine two. More"), Some("Line one"));
        assert_eq!(first_sentence("Done. Next\nline"), Some("Done."));
        assert_eq!(first_sentence("   "), None);
    }
}
