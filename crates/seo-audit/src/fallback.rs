//! Placeholder payloads for steps whose provider is unavailable

use crate::engine::payload::{
    self, AnalysisPayload, CompetitorsPayload, KeywordEntry, KeywordsPayload,
};
use crate::engine::StepKind;
use crate::market;
use serde_json::Value;

/// Source tag carried by generated analysis payloads
pub const FALLBACK_SOURCE: &str = "fallback";

/// Produces substitute payloads. Implementations must be total: every
/// `(kind, domain, market)` yields a payload of the same shape a provider
/// would return for that kind.
#[cfg_attr(test, mockall::automock)]
pub trait FallbackGenerator: Send + Sync {
    fn generate(&self, kind: StepKind, domain: &str, market: &str) -> Value;
}

/// Deterministic baseline content derived only from the inputs
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderFallback;

impl PlaceholderFallback {
    pub fn new() -> Self {
        Self
    }

    fn keywords(domain: &str, market_name: &str) -> KeywordsPayload {
        let brand = brand_term(domain);
        let keywords = [
            brand.clone(),
            format!("{brand} reviews"),
            format!("{brand} {}", market_name.to_lowercase()),
        ]
        .into_iter()
        .map(|keyword| KeywordEntry {
            keyword,
            search_volume: None,
            position: None,
        })
        .collect();

        KeywordsPayload {
            keywords,
            total_count: 0,
        }
    }

    fn competitors() -> CompetitorsPayload {
        CompetitorsPayload {
            competitors: Vec::new(),
            total_count: 0,
        }
    }

    fn analysis(kind: StepKind, domain: &str, market_name: &str) -> AnalysisPayload {
        let findings: &[&str] = match kind {
            StepKind::Technical => &[
                "Confirm every important page returns HTTP 200 and is indexable",
                "Submit an up-to-date XML sitemap",
                "Check Core Web Vitals on mobile",
            ],
            StepKind::Content => &[
                "Give every page a unique title and meta description",
                "Cover the main search intents of your audience with dedicated pages",
                "Refresh thin or outdated articles",
            ],
            _ => &[
                "Publish clear, citable answers to common customer questions",
                "Keep company facts consistent across your site and profiles",
                "Add structured data for organization and products",
            ],
        };

        AnalysisPayload {
            summary: format!(
                "Automated {} analysis for {domain} is unavailable. \
                 Baseline guidance for the {market_name} market is shown instead.",
                kind.title().to_lowercase()
            ),
            findings: findings.iter().map(|f| (*f).to_string()).collect(),
            source: FALLBACK_SOURCE.to_string(),
        }
    }
}

impl FallbackGenerator for PlaceholderFallback {
    fn generate(&self, kind: StepKind, domain: &str, market: &str) -> Value {
        let market_name = market::display_name(market);
        match kind {
            StepKind::Keywords => payload::to_value(&Self::keywords(domain, &market_name)),
            StepKind::Competitor => payload::to_value(&Self::competitors()),
            StepKind::Technical | StepKind::Content | StepKind::AiAnalysis => {
                payload::to_value(&Self::analysis(kind, domain, &market_name))
            }
        }
    }
}

/// First label of the host, e.g. `shop` for `shop.example.com`, falling back
/// to the whole input for unusual hosts
fn brand_term(domain: &str) -> String {
    let host = domain.trim().trim_start_matches("www.");
    let label = host.split('.').find(|l| !l.is_empty()).unwrap_or(host);
    if label.is_empty() {
        domain.trim().to_lowercase()
    } else {
        label.to_lowercase()
    }
}
