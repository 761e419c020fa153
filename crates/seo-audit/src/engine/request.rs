//! Validated audit request

use crate::error::{AuditError, Result};
use crate::market;
use serde::Serialize;

/// A validated `(domain, market)` pair. Construct with [`AuditRequest::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRequest {
    domain: String,
    market: String,
    language: String,
}

impl AuditRequest {
    /// Validate caller input.
    ///
    /// Both fields are trimmed and must be non-empty. No other format rules
    /// apply here; host normalization belongs to whoever collects the input.
    pub fn new(domain: impl AsRef<str>, market: impl AsRef<str>) -> Result<Self> {
        let domain = domain.as_ref().trim();
        let market = market.as_ref().trim();

        if domain.is_empty() {
            return Err(AuditError::InvalidRequest("domain is required".to_string()));
        }
        if market.is_empty() {
            return Err(AuditError::InvalidRequest("market is required".to_string()));
        }

        Ok(Self {
            domain: domain.to_string(),
            market: market.to_string(),
            language: market::language_for_market(market),
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn market(&self) -> &str {
        &self.market
    }

    /// Language hint derived from the market
    pub fn language(&self) -> &str {
        &self.language
    }
}
