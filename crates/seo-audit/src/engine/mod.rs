//! Audit orchestration: steps, outcomes, assembly

pub mod assembler;
pub mod orchestrator;
pub mod payload;
pub mod progress;
pub mod report;
pub mod request;
pub mod step;

pub use assembler::ReportAssembler;
pub use orchestrator::{AuditEngine, AuditEngineBuilder};
pub use progress::AuditProgress;
pub use report::{AuditReport, ReportSummary, Section};
pub use request::AuditRequest;
pub use step::{AdapterKind, StepKind, StepOutcome, StepStatus};
