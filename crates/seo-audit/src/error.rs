//! Error types for audit operations

use thiserror::Error;

/// Errors that cross the audit engine boundary.
///
/// Provider failures are not represented here: they are absorbed per step and
/// surface only as degraded report sections.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The request is missing a domain or market
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// An invariant of the engine or assembler was violated
    #[error("Internal error: {0}")]
    Internal(String),

    /// The caller cancelled the audit before the report was assembled
    #[error("Audit cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuditError {
    /// Whether the error was caused by caller input rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}

impl From<minijinja::Error> for AuditError {
    fn from(err: minijinja::Error) -> Self {
        AuditError::Internal(format!("prompt template: {err}"))
    }
}

/// Result type alias for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;
