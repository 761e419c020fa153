//! Configuration for audit operations
//!
//! Provider credentials live here and are handed to adapter constructors.
//! The engine itself never looks at the environment.

use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_AI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_DATA_API_BASE: &str = "https://api.dataforseo.com/v3";

/// Credentials and model settings for the AI-analysis provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiProviderConfig {
    /// Bearer token for the chat completion API
    pub api_key: String,
    /// Base URL of an OpenAI-compatible API
    pub api_base: String,
    /// Model identifier
    pub model: String,
    /// Maximum tokens per analysis
    pub max_tokens: usize,
    /// Sampling temperature
    pub temperature: f32,
}

impl AiProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_AI_API_BASE.to_string(),
            model: DEFAULT_AI_MODEL.to_string(),
            max_tokens: 900,
            temperature: 0.2,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Credentials for the structured SEO data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProviderConfig {
    /// Basic-auth login
    pub login: String,
    /// Basic-auth password
    pub password: String,
    /// Base URL of the v3 API
    pub api_base: String,
    /// Maximum rows requested per lookup
    pub result_limit: u32,
}

impl DataProviderConfig {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            api_base: DEFAULT_DATA_API_BASE.to_string(),
            result_limit: 20,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

/// Configuration for audit orchestration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Upper bound for a single provider call
    pub step_timeout: Duration,

    /// Substitute placeholder payloads for failed steps
    pub fallback_enabled: bool,

    /// Maximum number of recommendations in a report
    pub max_recommendations: usize,

    /// AI-analysis provider (None = unconfigured)
    pub ai: Option<AiProviderConfig>,

    /// Structured-data provider (None = unconfigured)
    pub data: Option<DataProviderConfig>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(25),
            fallback_enabled: true,
            max_recommendations: 10,
            ai: None,
            data: None,
        }
    }
}

impl AuditConfig {
    /// Create a new configuration builder
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::default()
    }

    /// Load provider credentials and tuning from the process environment.
    ///
    /// Missing credentials leave the corresponding provider unconfigured;
    /// audits still run and fall back for that provider's steps.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = Self::builder();

        if let Some(api_key) = var("SEO_AI_API_KEY") {
            let mut ai = AiProviderConfig::new(api_key);
            if let Some(base) = var("SEO_AI_API_BASE") {
                ai = ai.with_api_base(base);
            }
            if let Some(model) = var("SEO_AI_MODEL") {
                ai = ai.with_model(model);
            }
            builder = builder.ai(ai);
        }

        if let (Some(login), Some(password)) = (var("SEO_DATA_LOGIN"), var("SEO_DATA_PASSWORD")) {
            let mut data = DataProviderConfig::new(login, password);
            if let Some(base) = var("SEO_DATA_API_BASE") {
                data = data.with_api_base(base);
            }
            builder = builder.data(data);
        }

        if let Some(raw) = var("SEO_STEP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                AuditError::Config(format!("SEO_STEP_TIMEOUT_SECS must be an integer, got '{raw}'"))
            })?;
            builder = builder.step_timeout(Duration::from_secs(secs));
        }

        if let Some(raw) = var("SEO_FALLBACK_ENABLED") {
            let enabled = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(AuditError::Config(format!(
                        "SEO_FALLBACK_ENABLED must be a boolean, got '{raw}'"
                    )));
                }
            };
            builder = builder.fallback_enabled(enabled);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.step_timeout.is_zero() {
            return Err(AuditError::Config(
                "step_timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_recommendations == 0 {
            return Err(AuditError::Config(
                "max_recommendations must be greater than 0".to_string(),
            ));
        }

        if let Some(ai) = &self.ai {
            if ai.api_key.trim().is_empty() {
                return Err(AuditError::Config("AI provider api_key is empty".to_string()));
            }
            if ai.model.trim().is_empty() {
                return Err(AuditError::Config("AI provider model is empty".to_string()));
            }
        }

        if let Some(data) = &self.data {
            if data.login.trim().is_empty() || data.password.is_empty() {
                return Err(AuditError::Config(
                    "data provider login and password are required".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Builder for AuditConfig
#[derive(Debug, Default)]
pub struct AuditConfigBuilder {
    step_timeout: Option<Duration>,
    fallback_enabled: Option<bool>,
    max_recommendations: Option<usize>,
    ai: Option<AiProviderConfig>,
    data: Option<DataProviderConfig>,
}

impl AuditConfigBuilder {
    /// Set the per-step timeout
    pub fn step_timeout(mut self, duration: Duration) -> Self {
        self.step_timeout = Some(duration);
        self
    }

    /// Enable or disable fallback substitution
    pub fn fallback_enabled(mut self, enabled: bool) -> Self {
        self.fallback_enabled = Some(enabled);
        self
    }

    /// Set the recommendation cap
    pub fn max_recommendations(mut self, max: usize) -> Self {
        self.max_recommendations = Some(max);
        self
    }

    /// Configure the AI-analysis provider
    pub fn ai(mut self, ai: AiProviderConfig) -> Self {
        self.ai = Some(ai);
        self
    }

    /// Configure the structured-data provider
    pub fn data(mut self, data: DataProviderConfig) -> Self {
        self.data = Some(data);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AuditConfig> {
        let defaults = AuditConfig::default();

        let config = AuditConfig {
            step_timeout: self.step_timeout.unwrap_or(defaults.step_timeout),
            fallback_enabled: self.fallback_enabled.unwrap_or(defaults.fallback_enabled),
            max_recommendations: self
                .max_recommendations
                .unwrap_or(defaults.max_recommendations),
            ai: self.ai,
            data: self.data,
        };

        config.validate()?;
        Ok(config)
    }
}
