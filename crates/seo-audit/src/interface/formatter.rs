//! Report formatting

use crate::engine::payload::{AnalysisPayload, CompetitorsPayload, KeywordsPayload};
use crate::engine::{AuditReport, Section, StepKind, StepStatus};
use crate::error::{AuditError, Result};
use clap::ValueEnum;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub trait ReportFormatter: Send + Sync {
    fn format_report(&self, report: &AuditReport) -> Result<String>;
    fn format_error(&self, error: &AuditError) -> String;
}

/// Output formats offered on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Human-readable report with a section table
pub struct TextFormatter;

impl ReportFormatter for TextFormatter {
    fn format_report(&self, report: &AuditReport) -> Result<String> {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Section", "Status", "Details"]);

        for (kind, section) in &report.sections {
            table.add_row(vec![
                kind.title().to_string(),
                section.status.to_string(),
                section_details(*kind, section),
            ]);
        }

        let mut output = String::new();
        output.push_str(&report.headline());
        output.push_str("\n\n");
        output.push_str(&table.to_string());
        output.push_str("\n\nRecommendations:\n");
        for (i, rec) in report.recommendations.iter().enumerate() {
            output.push_str(&format!("{:>2}. {}\n", i + 1, rec));
        }

        Ok(output)
    }

    fn format_error(&self, error: &AuditError) -> String {
        format!("Error: {error}")
    }
}

/// The report as pretty-printed JSON
pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn format_report(&self, report: &AuditReport) -> Result<String> {
        serde_json::to_string_pretty(report)
            .map_err(|e| AuditError::Internal(format!("report serialization: {e}")))
    }

    fn format_error(&self, error: &AuditError) -> String {
        serde_json::json!({ "error": error.to_string() }).to_string()
    }
}

pub struct FormatterFactory;

impl FormatterFactory {
    pub fn create(format: OutputFormat) -> Box<dyn ReportFormatter> {
        match format {
            OutputFormat::Text => Box::new(TextFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
        }
    }
}

fn parse<T: DeserializeOwned>(payload: Option<&Value>) -> Option<T> {
    payload.and_then(|p| serde_json::from_value(p.clone()).ok())
}

fn section_details(kind: StepKind, section: &Section) -> String {
    let error = section.error.as_deref().unwrap_or("unknown error");
    match section.status {
        StepStatus::Failed => return error.to_string(),
        StepStatus::Fallback => return format!("placeholder data ({error})"),
        StepStatus::Ok => {}
    }

    let payload = section.payload.as_ref();
    let details = match kind {
        StepKind::Keywords => parse::<KeywordsPayload>(payload).map(|p| {
            format!(
                "{} ranked keywords, showing {}",
                p.total_count,
                p.keywords.len()
            )
        }),
        StepKind::Competitor => parse::<CompetitorsPayload>(payload).map(|p| {
            match p.competitors.first() {
                Some(leader) => format!("{} competitors, led by {}", p.total_count, leader.domain),
                None => "no competitors found".to_string(),
            }
        }),
        StepKind::Technical | StepKind::Content | StepKind::AiAnalysis => {
            parse::<AnalysisPayload>(payload)
                .map(|p| format!("{} findings from {}", p.findings.len(), p.source))
        }
    };

    details.unwrap_or_default()
}
