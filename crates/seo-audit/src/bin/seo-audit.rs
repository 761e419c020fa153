//! SEO audit CLI
//!
//! Runs one audit and prints the report.
//!
//! # Usage
//!
//! ```bash
//! # Provider credentials (either may be omitted; its steps then fall back)
//! export SEO_AI_API_KEY="sk-..."
//! export SEO_DATA_LOGIN="me@example.com"
//! export SEO_DATA_PASSWORD="..."
//!
//! cargo run --bin seo-audit -- --domain example.com --market US
//! ```

use anyhow::Context;
use audit_utils::Config;
use clap::Parser;
use seo_audit::interface::{FormatterFactory, OutputFormat};
use seo_audit::{AuditConfig, AuditEngine, AuditError, AuditRequest};
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

const EXIT_INVALID_INPUT: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "seo-audit")]
#[command(about = "Audit a website's SEO for a target market", long_about = None)]
struct Args {
    /// Domain or URL to audit, e.g. example.com
    #[arg(short, long)]
    domain: String,

    /// Target market: country code (US) or locale (en-GB)
    #[arg(short, long)]
    market: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Per-step timeout in seconds (overrides SEO_STEP_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Report provider failures as failed sections instead of placeholders
    #[arg(long)]
    no_fallback: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Args::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let app = Config::from_env().context("invalid logging configuration")?;
    audit_utils::init_tracing_with(app.log_format, "warn,seo_audit=info");
    info!(
        app = %app.app_name,
        environment = %app.environment,
        production = app.is_production(),
        "Starting seo-audit"
    );

    let mut config = AuditConfig::from_env().context("invalid audit configuration")?;
    if let Some(secs) = args.timeout_secs {
        config.step_timeout = Duration::from_secs(secs);
    }
    if args.no_fallback {
        config.fallback_enabled = false;
    }

    if config.ai.is_none() {
        warn!("SEO_AI_API_KEY not set, AI analysis steps will use placeholder data");
    }
    if config.data.is_none() {
        warn!("SEO_DATA_LOGIN/SEO_DATA_PASSWORD not set, keyword and competitor steps will use placeholder data");
    }

    let formatter = FormatterFactory::create(args.format);

    let request = match AuditRequest::new(normalize_host(&args.domain), &args.market) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{}", formatter.format_error(&e));
            return Ok(ExitCode::from(EXIT_INVALID_INPUT));
        }
    };

    let engine = AuditEngine::from_config(config)?;

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, cancelling audit");
            ctrl_c.cancel();
        }
    });

    match engine.run_with_cancellation(&request, token).await {
        Ok(report) => {
            println!("{}", formatter.format_report(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(AuditError::Cancelled) => {
            eprintln!("{}", formatter.format_error(&AuditError::Cancelled));
            Ok(ExitCode::from(130))
        }
        Err(e) if e.is_client_error() => {
            eprintln!("{}", formatter.format_error(&e));
            Ok(ExitCode::from(EXIT_INVALID_INPUT))
        }
        Err(e) => Err(e.into()),
    }
}

/// Reduce a URL or bare host to a lowercase host name. Input that does not
/// parse is passed through trimmed.
fn normalize_host(input: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        return String::new();
    }

    let parsed = Url::parse(input)
        .ok()
        .filter(|url| url.has_host())
        .or_else(|| Url::parse(&format!("https://{input}")).ok());

    parsed
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_else(|| input.to_string())
}
