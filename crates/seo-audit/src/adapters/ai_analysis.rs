//! Adapter over an LLM provider

use super::{FailureKind, ProviderAdapter, ProviderFailure, ProviderQuery};
use crate::config::AiProviderConfig;
use crate::engine::payload::{self, AnalysisPayload};
use crate::engine::AdapterKind;
use crate::error::{AuditError, Result};
use crate::prompts::PromptLibrary;
use async_trait::async_trait;
use audit_llm::providers::{OpenAIConfig, OpenAIProvider};
use audit_llm::{CompletionRequest, LLMError, LLMProvider, Message};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Serves the technical, content and AI-visibility steps
pub struct AiAnalysisAdapter {
    provider: Arc<dyn LLMProvider>,
    prompts: PromptLibrary,
    model: String,
    max_tokens: usize,
    temperature: f32,
}

impl AiAnalysisAdapter {
    /// Build an adapter backed by an OpenAI-compatible endpoint
    pub fn from_config(config: &AiProviderConfig, timeout: Duration) -> Result<Self> {
        let openai = OpenAIConfig::new(config.api_key.clone())
            .with_api_base(config.api_base.clone())
            .with_timeout(timeout.as_secs().max(1));
        let provider = OpenAIProvider::with_config(openai)
            .map_err(|e| AuditError::Config(format!("AI provider: {e}")))?;

        Self::with_provider(Arc::new(provider), config)
    }

    /// Build an adapter around any LLM provider
    pub fn with_provider(provider: Arc<dyn LLMProvider>, config: &AiProviderConfig) -> Result<Self> {
        Ok(Self {
            provider,
            prompts: PromptLibrary::new()?,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn failure(&self, kind: FailureKind, detail: impl Into<String>) -> ProviderFailure {
        ProviderFailure::new(self.provider.name(), kind, detail)
    }

    fn map_error(&self, err: LLMError) -> ProviderFailure {
        let kind = match &err {
            LLMError::AuthenticationFailed | LLMError::ConfigurationError(_) => {
                FailureKind::Unauthenticated
            }
            LLMError::Timeout(_) => FailureKind::Timeout,
            LLMError::HttpError(inner) if inner.is_timeout() => FailureKind::Timeout,
            LLMError::RequestFailed(_)
            | LLMError::RateLimitExceeded(_)
            | LLMError::ConnectionFailed(_)
            | LLMError::HttpError(_) => FailureKind::Unreachable,
            LLMError::InvalidRequest(_)
            | LLMError::ModelNotFound(_)
            | LLMError::SerializationError(_)
            | LLMError::UnexpectedResponse(_) => FailureKind::BadResponse,
        };
        self.failure(kind, err.to_string())
    }
}

#[async_trait]
impl ProviderAdapter for AiAnalysisAdapter {
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::AiAnalysis
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn query(&self, query: &ProviderQuery) -> std::result::Result<Value, ProviderFailure> {
        let system = self
            .prompts
            .system(&query.market, &query.language)
            .map_err(|e| self.failure(FailureKind::BadResponse, e.to_string()))?;

        let request = CompletionRequest::builder(&self.model)
            .system(system)
            .add_message(Message::user(query.text.clone()))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build();

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| self.map_error(e))?;

        debug!(
            step = %query.kind,
            tokens = response.usage.total(),
            "AI analysis completed"
        );

        let text = response
            .message
            .text()
            .ok_or_else(|| self.failure(FailureKind::BadResponse, "empty completion"))?;

        Ok(payload::to_value(&AnalysisPayload::from_text(
            text,
            self.provider.name(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::StepKind;
    use audit_llm::{CompletionResponse, StopReason, TokenUsage};

    struct CannedProvider {
        text: &'static str,
        error: Option<fn() -> LLMError>,
    }

    #[async_trait]
    impl LLMProvider for CannedProvider {
        async fn complete(&self, request: CompletionRequest) -> audit_llm::Result<CompletionResponse> {
            assert!(request.system.is_some());
            if let Some(make) = self.error {
                return Err(make());
            }
            Ok(CompletionResponse {
                message: Message::assistant(self.text),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            })
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn adapter(provider: CannedProvider) -> AiAnalysisAdapter {
        AiAnalysisAdapter::with_provider(Arc::new(provider), &AiProviderConfig::new("sk-test"))
            .unwrap()
    }

    fn replying(text: &'static str) -> AiAnalysisAdapter {
        adapter(CannedProvider { text, error: None })
    }

    fn failing(make: fn() -> LLMError) -> AiAnalysisAdapter {
        adapter(CannedProvider {
            text: "",
            error: Some(make),
        })
    }

    fn query() -> ProviderQuery {
        ProviderQuery {
            kind: StepKind::Technical,
            text: "Review example.com".to_string(),
            market: "US".to_string(),
            language: "en".to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_analysis() {
        let value = replying("Solid base.\n- Fix canonical tags")
            .query(&query())
            .await
            .unwrap();
        let payload: AnalysisPayload = serde_json::from_value(value).unwrap();
        assert_eq!(payload.findings, vec!["Fix canonical tags"]);
        assert_eq!(payload.source, "canned");
    }

    #[tokio::test]
    async fn test_empty_completion_is_bad_response() {
        let failure = replying("   ").query(&query()).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::BadResponse);
    }

    #[tokio::test]
    async fn test_error_kinds() {
        let failure = failing(|| LLMError::AuthenticationFailed)
            .query(&query())
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Unauthenticated);

        let failure = failing(|| LLMError::Timeout("slow".to_string()))
            .query(&query())
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Timeout);

        let failure = failing(|| LLMError::RateLimitExceeded("429".to_string()))
            .query(&query())
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Unreachable);
        assert_eq!(failure.provider, "canned");
    }

    #[test]
    fn test_from_config() {
        let adapter = AiAnalysisAdapter::from_config(
            &AiProviderConfig::new("sk-test").with_model("gpt-4o"),
            Duration::from_secs(10),
        )
        .unwrap();
        assert_eq!(adapter.name(), "openai");
        assert_eq!(adapter.model, "gpt-4o");
        assert!(adapter.is_configured());
    }
}
