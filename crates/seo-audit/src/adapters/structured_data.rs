//! Adapter over the structured SEO data API

use super::{FailureKind, ProviderAdapter, ProviderFailure, ProviderQuery};
use crate::api::{SeoDataClient, SeoDataError};
use crate::config::DataProviderConfig;
use crate::engine::payload;
use crate::engine::{AdapterKind, StepKind};
use crate::error::{AuditError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const PROVIDER_NAME: &str = "structured-data";

/// Serves the keyword and competitor steps
pub struct StructuredDataAdapter {
    client: SeoDataClient,
}

impl StructuredDataAdapter {
    pub fn new(config: DataProviderConfig, timeout: Duration) -> Result<Self> {
        let client = SeoDataClient::new(config, timeout)
            .map_err(|e| AuditError::Config(format!("structured data client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ProviderAdapter for StructuredDataAdapter {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::StructuredData
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn query(&self, query: &ProviderQuery) -> std::result::Result<Value, ProviderFailure> {
        let target = query.text.trim();
        let result = match query.kind {
            StepKind::Keywords => self
                .client
                .ranked_keywords(target, &query.market, &query.language)
                .await
                .map(|p| payload::to_value(&p)),
            StepKind::Competitor => self
                .client
                .competitors(target, &query.market, &query.language)
                .await
                .map(|p| payload::to_value(&p)),
            other => {
                return Err(ProviderFailure::new(
                    PROVIDER_NAME,
                    FailureKind::BadResponse,
                    format!("step '{other}' is not served by this provider"),
                ));
            }
        };

        result.map_err(map_error)
    }
}

fn map_error(err: SeoDataError) -> ProviderFailure {
    match &err {
        SeoDataError::Unauthorized(_) => {
            ProviderFailure::new(PROVIDER_NAME, FailureKind::Unauthenticated, err.to_string())
        }
        SeoDataError::Http(inner) => ProviderFailure::from_transport(PROVIDER_NAME, inner),
        SeoDataError::Api { .. } if err.is_server_error() => {
            ProviderFailure::new(PROVIDER_NAME, FailureKind::Unreachable, err.to_string())
        }
        SeoDataError::Api { .. } | SeoDataError::UnexpectedResponse(_) => {
            ProviderFailure::new(PROVIDER_NAME, FailureKind::BadResponse, err.to_string())
        }
    }
}
