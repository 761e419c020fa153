//! Structured SEO data API client
//!
//! Speaks the v3 "labs" JSON API: requests are arrays of task objects,
//! responses wrap results in a status envelope with one entry per task.

use crate::config::DataProviderConfig;
use crate::engine::payload::{CompetitorEntry, CompetitorsPayload, KeywordEntry, KeywordsPayload};
use crate::market;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

const RANKED_KEYWORDS_PATH: &str = "/dataforseo_labs/google/ranked_keywords/live";
const COMPETITORS_PATH: &str = "/dataforseo_labs/google/competitors_domain/live";
const STATUS_OK: u32 = 20000;

/// Errors from the structured data API
#[derive(Debug, Error)]
pub enum SeoDataError {
    /// Credentials were rejected
    #[error("authentication rejected: {0}")]
    Unauthorized(String),

    /// The API answered with a non-success status code
    #[error("API error {code}: {message}")]
    Api { code: u32, message: String },

    /// Network or HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The body did not have the expected structure
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl SeoDataError {
    /// 401xx codes and HTTP 401/403 are authentication problems
    fn from_status(code: u32, message: String) -> Self {
        if (40100..40200).contains(&code) {
            Self::Unauthorized(message)
        } else {
            Self::Api { code, message }
        }
    }

    /// Server-side (5xxxx) errors
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Api { code, .. } if *code >= 50000)
    }
}

pub type Result<T> = std::result::Result<T, SeoDataError>;

/// Structured SEO data API client
#[derive(Debug, Clone)]
pub struct SeoDataClient {
    client: Client,
    config: DataProviderConfig,
}

#[derive(Debug, Serialize)]
struct TaskRequest<'a> {
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    location_code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location_name: Option<String>,
    language_code: &'a str,
    limit: u32,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct Envelope<T> {
    status_code: u32,
    #[serde(default)]
    status_message: String,
    #[serde(default)]
    tasks: Vec<Task<T>>,
}

#[derive(Debug, Deserialize)]
struct Task<T> {
    status_code: u32,
    #[serde(default)]
    status_message: String,
    result: Option<Vec<T>>,
}

#[derive(Debug, Deserialize)]
struct ItemsResult<I> {
    #[serde(default)]
    total_count: Option<u64>,
    items: Option<Vec<I>>,
}

#[derive(Debug, Deserialize)]
struct RankedKeywordItem {
    keyword_data: Option<KeywordData>,
    ranked_serp_element: Option<RankedSerpElement>,
}

#[derive(Debug, Deserialize)]
struct KeywordData {
    keyword: String,
    keyword_info: Option<KeywordInfo>,
}

#[derive(Debug, Deserialize)]
struct KeywordInfo {
    search_volume: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RankedSerpElement {
    serp_item: Option<SerpItem>,
}

#[derive(Debug, Deserialize)]
struct SerpItem {
    rank_absolute: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CompetitorItem {
    domain: String,
    avg_position: Option<f64>,
    intersections: Option<u64>,
}

impl SeoDataClient {
    /// Create a client for the configured account
    pub fn new(config: DataProviderConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    /// Keywords the target ranks for in the market
    #[instrument(skip(self))]
    pub async fn ranked_keywords(
        &self,
        target: &str,
        market: &str,
        language: &str,
    ) -> Result<KeywordsPayload> {
        let result: ItemsResult<RankedKeywordItem> = self
            .post_task(RANKED_KEYWORDS_PATH, target, market, language)
            .await?;

        let keywords: Vec<KeywordEntry> = result
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                let data = item.keyword_data?;
                Some(KeywordEntry {
                    keyword: data.keyword,
                    search_volume: data.keyword_info.and_then(|i| i.search_volume),
                    position: item
                        .ranked_serp_element
                        .and_then(|e| e.serp_item)
                        .and_then(|s| s.rank_absolute),
                })
            })
            .collect();

        Ok(KeywordsPayload {
            total_count: result.total_count.unwrap_or(keywords.len() as u64),
            keywords,
        })
    }

    /// Domains competing with the target in the market
    #[instrument(skip(self))]
    pub async fn competitors(
        &self,
        target: &str,
        market: &str,
        language: &str,
    ) -> Result<CompetitorsPayload> {
        let result: ItemsResult<CompetitorItem> = self
            .post_task(COMPETITORS_PATH, target, market, language)
            .await?;

        // The target itself is listed among its competitors
        let competitors: Vec<CompetitorEntry> = result
            .items
            .unwrap_or_default()
            .into_iter()
            .filter(|item| !item.domain.eq_ignore_ascii_case(target))
            .map(|item| CompetitorEntry {
                domain: item.domain,
                common_keywords: item.intersections,
                avg_position: item.avg_position,
            })
            .collect();

        Ok(CompetitorsPayload {
            total_count: competitors.len() as u64,
            competitors,
        })
    }

    async fn post_task<T: DeserializeOwned>(
        &self,
        path: &str,
        target: &str,
        market: &str,
        language: &str,
    ) -> Result<T> {
        let location_code = market::location_code(market);
        let task = TaskRequest {
            target,
            location_code,
            location_name: location_code
                .is_none()
                .then(|| market::display_name(market)),
            language_code: language,
            limit: self.config.result_limit,
        };

        let url = format!("{}{path}", self.config.api_base.trim_end_matches('/'));
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.login, Some(&self.config.password))
            .json(&[task])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(SeoDataError::Unauthorized(format!("HTTP {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SeoDataError::Api {
                code: u32::from(status.as_u16()) * 100,
                message: body,
            });
        }

        let envelope: Envelope<T> = response.json().await?;
        unwrap_envelope(envelope)
    }
}

fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T> {
    if envelope.status_code != STATUS_OK {
        return Err(SeoDataError::from_status(
            envelope.status_code,
            envelope.status_message,
        ));
    }

    let task = envelope
        .tasks
        .into_iter()
        .next()
        .ok_or_else(|| SeoDataError::UnexpectedResponse("no tasks in response".to_string()))?;

    if task.status_code != STATUS_OK {
        return Err(SeoDataError::from_status(task.status_code, task.status_message));
    }

    task.result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SeoDataError::UnexpectedResponse("task has no result".to_string()))
}
