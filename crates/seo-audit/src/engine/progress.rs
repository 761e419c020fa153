//! Progress events emitted while an audit runs

use super::step::{StepKind, StepStatus};
use serde::Serialize;

/// Sent on the engine's optional progress channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditProgress {
    StepStarted { kind: StepKind },
    StepFinished { kind: StepKind, status: StepStatus },
    /// The report is built; no further events follow
    Assembled,
}
