//! Prompt templates for AI-backed audit steps
//!
//! Templates are compiled once when the library is created, so a broken
//! template fails engine construction rather than an individual audit.

use crate::engine::payload::KeywordsPayload;
use crate::engine::StepKind;
use crate::error::Result;
use crate::market;
use minijinja::{Environment, context};
use serde_json::Value;

const SYSTEM: &str = r"You are a senior SEO consultant preparing a website audit for the {{ market_name }} market.
Write in the language with ISO code '{{ language }}'.
Start with a two or three sentence assessment, then list concrete, prioritized actions as '- ' bullet points.
Do not invent metrics you were not given.";

const TECHNICAL: &str = r"Review the technical SEO health of {{ domain }} for searchers in {{ market_name }}.
Cover crawlability and indexing, site speed and Core Web Vitals, mobile usability, structured data, and international targeting (hreflang) where relevant.";

const CONTENT: &str = r"Assess the content strategy of {{ domain }} for the {{ market_name }} market.
{% if keywords %}The site currently ranks for: {{ keywords | join(', ') }}.
Identify content gaps around these topics and pages that should be created or consolidated.{% else %}No ranking keyword data is available; recommend the topics the site should build content around first.{% endif %}";

const AI_VISIBILITY: &str = r"Evaluate how likely {{ domain }} is to be cited in AI-generated answers (chat assistants, AI overviews) for users in {{ market_name }}.
{% if keywords %}Consider queries related to: {{ keywords | join(', ') }}.{% endif %}
Point out what would make the site a more citable source.";

const MAX_PROMPT_KEYWORDS: usize = 8;

/// Compiled prompt templates
pub struct PromptLibrary {
    env: Environment<'static>,
}

impl PromptLibrary {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("system", SYSTEM)?;
        env.add_template("technical", TECHNICAL)?;
        env.add_template("content", CONTENT)?;
        env.add_template("ai_analysis", AI_VISIBILITY)?;
        Ok(Self { env })
    }

    /// System prompt shared by every AI step
    pub fn system(&self, market: &str, language: &str) -> Result<String> {
        let template = self.env.get_template("system")?;
        Ok(template.render(context! {
            market_name => market::display_name(market),
            language => language,
        })?)
    }

    /// Query text for a step.
    ///
    /// Data steps query by host. AI steps get a rendered prompt, enriched with
    /// the dependency payload (real or placeholder) when there is one.
    pub fn query_text(
        &self,
        kind: StepKind,
        domain: &str,
        market: &str,
        dependency: Option<&Value>,
    ) -> Result<String> {
        let template_name = match kind {
            StepKind::Keywords | StepKind::Competitor => return Ok(domain.to_string()),
            StepKind::Technical => "technical",
            StepKind::Content => "content",
            StepKind::AiAnalysis => "ai_analysis",
        };

        let keywords = dependency.map(top_keywords).unwrap_or_default();
        let template = self.env.get_template(template_name)?;
        Ok(template.render(context! {
            domain => domain,
            market_name => market::display_name(market),
            keywords => keywords,
        })?)
    }
}

fn top_keywords(payload: &Value) -> Vec<String> {
    serde_json::from_value::<KeywordsPayload>(payload.clone())
        .map(|p| {
            p.keywords
                .into_iter()
                .take(MAX_PROMPT_KEYWORDS)
                .map(|k| k.keyword)
                .collect()
        })
        .unwrap_or_default()
}
