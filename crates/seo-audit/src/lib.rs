//! Fault-tolerant SEO audit orchestration
//!
//! An audit of a `(domain, market)` pair fans out into five steps served by
//! two providers:
//!
//! - `keywords` and `competitor` from a structured SEO data API
//! - `technical`, `content` and `ai_analysis` from an LLM
//!
//! Steps run concurrently and are isolated from each other. A step whose
//! provider fails, times out or has no credentials gets a placeholder payload
//! from the [`FallbackGenerator`](fallback::FallbackGenerator) and is marked
//! `fallback`, so the assembled [`AuditReport`] always has every section.
//!
//! # Example
//!
//! ```rust,ignore
//! use seo_audit::{AuditConfig, AuditEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = AuditEngine::from_config(AuditConfig::from_env()?)?;
//!     let report = engine.submit_audit("example.com", "US").await?;
//!
//!     for rec in &report.recommendations {
//!         println!("- {rec}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod interface;
pub mod market;
pub mod prompts;

pub use config::{AiProviderConfig, AuditConfig, DataProviderConfig};
pub use engine::{
    AuditEngine, AuditProgress, AuditReport, AuditRequest, ReportAssembler, Section, StepKind,
    StepOutcome, StepStatus,
};
pub use error::{AuditError, Result};
pub use fallback::{FallbackGenerator, PlaceholderFallback};
