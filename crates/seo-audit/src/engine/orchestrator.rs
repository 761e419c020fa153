//! The audit engine
//!
//! An audit fans out into one future per root step. Each root carries its
//! dependents: once the root's outcome settles, the dependents run
//! concurrently with each other, enriched with the root's payload (real or
//! placeholder). Every step is wrapped in the step timeout and turned into a
//! [`StepOutcome`] on its own, so one provider failing never touches another
//! step. All chains are joined inside the `run` future; dropping it drops
//! every in-flight provider call.

use super::assembler::ReportAssembler;
use super::progress::AuditProgress;
use super::report::AuditReport;
use super::request::AuditRequest;
use super::step::{AdapterKind, StepKind, StepOutcome};
use crate::adapters::{
    AiAnalysisAdapter, FailureKind, ProviderAdapter, ProviderFailure, ProviderQuery,
    StructuredDataAdapter, UnconfiguredAdapter,
};
use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::fallback::{FallbackGenerator, PlaceholderFallback};
use crate::prompts::PromptLibrary;
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs audits against a pair of provider adapters
pub struct AuditEngine {
    ai: Arc<dyn ProviderAdapter>,
    data: Arc<dyn ProviderAdapter>,
    fallback: Arc<dyn FallbackGenerator>,
    prompts: PromptLibrary,
    assembler: ReportAssembler,
    step_timeout: Duration,
    fallback_enabled: bool,
    progress: Option<UnboundedSender<AuditProgress>>,
}

impl AuditEngine {
    /// Start building an engine. Adapters default to unconfigured.
    pub fn builder(config: AuditConfig) -> AuditEngineBuilder {
        AuditEngineBuilder::new(config)
    }

    /// Build an engine with the real providers for whatever credentials the
    /// config carries
    pub fn from_config(config: AuditConfig) -> Result<Self> {
        let mut builder = AuditEngineBuilder::new(config.clone());

        if let Some(ai) = &config.ai {
            builder = builder.ai_adapter(Arc::new(AiAnalysisAdapter::from_config(
                ai,
                config.step_timeout,
            )?));
        }
        if let Some(data) = &config.data {
            builder = builder.data_adapter(Arc::new(StructuredDataAdapter::new(
                data.clone(),
                config.step_timeout,
            )?));
        }

        builder.build()
    }

    /// Validate caller input and run the audit
    pub async fn submit_audit(&self, domain: &str, market: &str) -> Result<AuditReport> {
        let request = AuditRequest::new(domain, market)?;
        self.run(&request).await
    }

    /// Run an audit to completion. The report always has every section.
    pub async fn run(&self, request: &AuditRequest) -> Result<AuditReport> {
        info!(
            domain = request.domain(),
            market = request.market(),
            "Starting SEO audit"
        );

        let chains = StepKind::ALL
            .into_iter()
            .filter(|kind| kind.depends_on().is_none())
            .map(|root| self.run_chain(request, root));

        let mut outcomes = Vec::with_capacity(StepKind::ALL.len());
        for chain in join_all(chains).await {
            outcomes.extend(chain?);
        }

        let report = self.assembler.assemble(request, outcomes)?;
        self.notify(AuditProgress::Assembled);

        info!("{}", report.headline());
        Ok(report)
    }

    /// Like [`run`](Self::run), but gives up with [`AuditError::Cancelled`]
    /// once `token` fires. In-flight provider calls are dropped.
    pub async fn run_with_cancellation(
        &self,
        request: &AuditRequest,
        token: CancellationToken,
    ) -> Result<AuditReport> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!(domain = request.domain(), "SEO audit cancelled");
                Err(AuditError::Cancelled)
            }
            result = self.run(request) => result,
        }
    }

    async fn run_chain(&self, request: &AuditRequest, root: StepKind) -> Result<Vec<StepOutcome>> {
        let root_outcome = self.run_step(request, root, None).await?;
        let dependency = root_outcome.payload();

        let dependents = join_all(
            root.dependents()
                .map(|kind| self.run_step(request, kind, dependency)),
        )
        .await;

        let mut outcomes = Vec::with_capacity(dependents.len() + 1);
        for outcome in dependents {
            outcomes.push(outcome?);
        }
        outcomes.insert(0, root_outcome);
        Ok(outcomes)
    }

    async fn run_step(
        &self,
        request: &AuditRequest,
        kind: StepKind,
        dependency: Option<&Value>,
    ) -> Result<StepOutcome> {
        self.notify(AuditProgress::StepStarted { kind });
        debug!(step = %kind, "Running step");

        let adapter = self.adapter_for(kind);
        let result = if adapter.is_configured() {
            let query = ProviderQuery {
                kind,
                text: self
                    .prompts
                    .query_text(kind, request.domain(), request.market(), dependency)?,
                market: request.market().to_string(),
                language: request.language().to_string(),
            };

            match tokio::time::timeout(self.step_timeout, adapter.query(&query)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderFailure::new(
                    adapter.name(),
                    FailureKind::Timeout,
                    format!("no response within {}s", self.step_timeout.as_secs_f64()),
                )),
            }
        } else {
            Err(ProviderFailure::new(
                adapter.name(),
                FailureKind::Unauthenticated,
                format!("provider '{}' is not configured", adapter.name()),
            ))
        };

        let outcome = match result {
            Ok(payload) => StepOutcome::ok(kind, payload),
            Err(failure) => self.recover(request, kind, failure),
        };

        debug!(step = %kind, status = %outcome.status(), "Step finished");
        self.notify(AuditProgress::StepFinished {
            kind,
            status: outcome.status(),
        });
        Ok(outcome)
    }

    fn recover(&self, request: &AuditRequest, kind: StepKind, failure: ProviderFailure) -> StepOutcome {
        if !self.fallback_enabled {
            warn!(step = %kind, error = %failure, "Step failed");
            return StepOutcome::failed(kind, failure.to_string());
        }

        warn!(step = %kind, error = %failure, "Step failed, using fallback");
        let payload = self
            .fallback
            .generate(kind, request.domain(), request.market());
        StepOutcome::fallback(kind, payload, failure.to_string())
    }

    fn adapter_for(&self, kind: StepKind) -> &dyn ProviderAdapter {
        match kind.adapter() {
            AdapterKind::AiAnalysis => self.ai.as_ref(),
            AdapterKind::StructuredData => self.data.as_ref(),
        }
    }

    fn notify(&self, event: AuditProgress) {
        if let Some(progress) = &self.progress {
            // A dropped receiver just means nobody is listening
            let _ = progress.send(event);
        }
    }
}

/// Builder for [`AuditEngine`]
pub struct AuditEngineBuilder {
    config: AuditConfig,
    ai: Option<Arc<dyn ProviderAdapter>>,
    data: Option<Arc<dyn ProviderAdapter>>,
    fallback: Option<Arc<dyn FallbackGenerator>>,
    progress: Option<UnboundedSender<AuditProgress>>,
}

impl AuditEngineBuilder {
    pub fn new(config: AuditConfig) -> Self {
        Self {
            config,
            ai: None,
            data: None,
            fallback: None,
            progress: None,
        }
    }

    /// Adapter for the technical, content and AI-visibility steps
    pub fn ai_adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.ai = Some(adapter);
        self
    }

    /// Adapter for the keyword and competitor steps
    pub fn data_adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.data = Some(adapter);
        self
    }

    pub fn fallback(mut self, fallback: Arc<dyn FallbackGenerator>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Receive [`AuditProgress`] events while audits run
    pub fn progress(mut self, sender: UnboundedSender<AuditProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn build(self) -> Result<AuditEngine> {
        self.config.validate()?;
        check_slot(self.ai.as_deref(), AdapterKind::AiAnalysis)?;
        check_slot(self.data.as_deref(), AdapterKind::StructuredData)?;

        Ok(AuditEngine {
            ai: self
                .ai
                .unwrap_or_else(|| Arc::new(UnconfiguredAdapter::new(AdapterKind::AiAnalysis))),
            data: self
                .data
                .unwrap_or_else(|| Arc::new(UnconfiguredAdapter::new(AdapterKind::StructuredData))),
            fallback: self
                .fallback
                .unwrap_or_else(|| Arc::new(PlaceholderFallback::new())),
            prompts: PromptLibrary::new()?,
            assembler: ReportAssembler::new(self.config.max_recommendations),
            step_timeout: self.config.step_timeout,
            fallback_enabled: self.config.fallback_enabled,
            progress: self.progress,
        })
    }
}

/// Reject an adapter that serves a different slot than the one it was given
fn check_slot(adapter: Option<&dyn ProviderAdapter>, slot: AdapterKind) -> Result<()> {
    match adapter {
        Some(adapter) if adapter.kind() != slot => Err(AuditError::Config(format!(
            "adapter '{}' serves {} but was given the {} slot",
            adapter.name(),
            adapter.kind(),
            slot
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockProviderAdapter;
    use crate::engine::payload::{AnalysisPayload, KeywordsPayload};
    use crate::engine::StepStatus;
    use crate::fallback::MockFallbackGenerator;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    fn config() -> AuditConfig {
        AuditConfig::builder().build().unwrap()
    }

    fn keywords_payload() -> Value {
        json!({
            "keywords": [
                {"keyword": "blue widgets", "search_volume": 2400, "position": 3}
            ],
            "total_count": 1
        })
    }

    fn competitors_payload() -> Value {
        json!({
            "competitors": [
                {"domain": "rival.com", "common_keywords": 42, "avg_position": 6.5}
            ],
            "total_count": 1
        })
    }

    fn data_mock() -> MockProviderAdapter {
        let mut data = MockProviderAdapter::new();
        data.expect_kind().return_const(AdapterKind::StructuredData);
        data.expect_is_configured().return_const(true);
        data.expect_query().returning(|query: &ProviderQuery| match query.kind {
            StepKind::Keywords => Ok(keywords_payload()),
            _ => Ok(competitors_payload()),
        });
        data
    }

    fn ai_mock() -> MockProviderAdapter {
        let mut ai = MockProviderAdapter::new();
        ai.expect_kind().return_const(AdapterKind::AiAnalysis);
        ai.expect_is_configured().return_const(true);
        ai.expect_query().returning(|query: &ProviderQuery| {
            Ok(json!({
                "summary": format!("{} review", query.kind),
                "findings": [format!("Improve {}", query.kind)],
                "source": "mock"
            }))
        });
        ai
    }

    /// Answers after a fixed delay and records the prompts it saw
    struct SlowAdapter {
        kind: AdapterKind,
        delay: Duration,
        seen: Mutex<Vec<ProviderQuery>>,
    }

    impl SlowAdapter {
        fn new(kind: AdapterKind, delay: Duration) -> Self {
            Self {
                kind,
                delay,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ProviderAdapter for SlowAdapter {
        fn name(&self) -> &str {
            "slow"
        }

        fn kind(&self) -> AdapterKind {
            self.kind
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn query(&self, query: &ProviderQuery) -> std::result::Result<Value, ProviderFailure> {
            self.seen.lock().unwrap().push(query.clone());
            tokio::time::sleep(self.delay).await;
            Ok(json!({"summary": "late", "findings": [], "source": "slow"}))
        }
    }

    #[tokio::test]
    async fn test_invalid_request_contacts_no_provider() {
        let mut ai = MockProviderAdapter::new();
        ai.expect_kind().return_const(AdapterKind::AiAnalysis);
        ai.expect_is_configured().times(0);
        ai.expect_query().times(0);
        let mut data = MockProviderAdapter::new();
        data.expect_kind().return_const(AdapterKind::StructuredData);
        data.expect_is_configured().times(0);
        data.expect_query().times(0);

        let engine = AuditEngine::builder(config())
            .ai_adapter(Arc::new(ai))
            .data_adapter(Arc::new(data))
            .build()
            .unwrap();

        let err = engine.submit_audit("", "US").await.unwrap_err();
        assert!(matches!(err, AuditError::InvalidRequest(_)));
        let err = engine.submit_audit("example.com", "  ").await.unwrap_err();
        assert!(matches!(err, AuditError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_all_providers_succeed() {
        let engine = AuditEngine::builder(config())
            .ai_adapter(Arc::new(ai_mock()))
            .data_adapter(Arc::new(data_mock()))
            .build()
            .unwrap();

        let report = engine.submit_audit("example.com", "US").await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.summary.ok, 5);
        assert!(!report.summary.is_degraded());
        assert!(report.sections.values().all(|s| s.error.is_none()));
        assert!(report.recommendations.iter().any(|r| r.contains("blue widgets")));
        assert!(report.recommendations.iter().any(|r| r.contains("rival.com")));
        assert_eq!(report.language, "en");
    }

    #[tokio::test]
    async fn test_dependents_see_keyword_payload() {
        let ai = Arc::new(SlowAdapter::new(AdapterKind::AiAnalysis, Duration::ZERO));
        let engine = AuditEngine::builder(config())
            .ai_adapter(ai.clone())
            .data_adapter(Arc::new(data_mock()))
            .build()
            .unwrap();

        engine.submit_audit("example.com", "US").await.unwrap();

        let seen = ai.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        let content = seen.iter().find(|q| q.kind == StepKind::Content).unwrap();
        assert!(content.text.contains("blue widgets"));
        let technical = seen.iter().find(|q| q.kind == StepKind::Technical).unwrap();
        assert!(!technical.text.contains("blue widgets"));
    }

    #[tokio::test]
    async fn test_one_failing_step_is_isolated() {
        let mut data = MockProviderAdapter::new();
        data.expect_kind().return_const(AdapterKind::StructuredData);
        data.expect_is_configured().return_const(true);
        data.expect_query().returning(|query: &ProviderQuery| match query.kind {
            StepKind::Keywords => Err(ProviderFailure::new(
                "structured-data",
                FailureKind::BadResponse,
                "garbled body",
            )),
            _ => Ok(competitors_payload()),
        });

        let engine = AuditEngine::builder(config())
            .ai_adapter(Arc::new(ai_mock()))
            .data_adapter(Arc::new(data))
            .build()
            .unwrap();

        let report = engine.submit_audit("example.com", "US").await.unwrap();

        let keywords = report.section(StepKind::Keywords).unwrap();
        assert_eq!(keywords.status, StepStatus::Fallback);
        assert!(keywords.error.as_deref().unwrap().contains("garbled body"));
        let placeholder: KeywordsPayload =
            serde_json::from_value(keywords.payload.clone().unwrap()).unwrap();
        assert!(!placeholder.keywords.is_empty());

        for kind in [StepKind::Competitor, StepKind::Technical, StepKind::Content, StepKind::AiAnalysis] {
            assert_eq!(report.status(kind), Some(StepStatus::Ok), "{kind}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ai_timeout_falls_back() {
        let ai = SlowAdapter::new(AdapterKind::AiAnalysis, Duration::from_secs(60));
        let engine = AuditEngine::builder(config())
            .ai_adapter(Arc::new(ai))
            .data_adapter(Arc::new(data_mock()))
            .build()
            .unwrap();

        let report = engine.submit_audit("example.com", "US").await.unwrap();

        assert_eq!(report.status(StepKind::Keywords), Some(StepStatus::Ok));
        assert_eq!(report.status(StepKind::Competitor), Some(StepStatus::Ok));
        for kind in [StepKind::Technical, StepKind::Content, StepKind::AiAnalysis] {
            let section = report.section(kind).unwrap();
            assert_eq!(section.status, StepStatus::Fallback);
            assert!(section.error.as_deref().unwrap().contains("timeout"));
            let payload: AnalysisPayload =
                serde_json::from_value(section.payload.clone().unwrap()).unwrap();
            assert_eq!(payload.source, "fallback");
        }

        assert!(!report.recommendations.is_empty());
        assert!(
            report
                .recommendations
                .iter()
                .any(|r| r.contains("AI-generated answers") && r.contains("United States"))
        );
        assert!(report.recommendations.iter().any(|r| r.contains("blue widgets")));
    }

    #[tokio::test]
    async fn test_all_unconfigured() {
        let engine = AuditEngine::builder(config()).build().unwrap();

        let report = engine.submit_audit("x", "DE").await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.summary.fallback, 5);
        assert!(!report.recommendations.is_empty());
        assert!(report.recommendations.iter().all(|r| r.contains("Germany")));
        assert!(
            report
                .sections
                .values()
                .all(|s| s.error.as_deref().unwrap().contains("not configured"))
        );
        assert_eq!(report.language, "de");
    }

    #[tokio::test]
    async fn test_fallback_generator_called_per_failed_step() {
        let mut fallback = MockFallbackGenerator::new();
        fallback
            .expect_generate()
            .withf(|kind, domain, market| {
                kind.adapter() == AdapterKind::AiAnalysis
                    && domain.to_string() == "example.com"
                    && market.to_string() == "US"
            })
            .times(3)
            .returning(|kind, _, _| json!({"placeholder": kind.as_str()}));

        let engine = AuditEngine::builder(config())
            .data_adapter(Arc::new(data_mock()))
            .fallback(Arc::new(fallback))
            .build()
            .unwrap();

        let report = engine.submit_audit("example.com", "US").await.unwrap();
        assert_eq!(report.summary.ok, 2);
        assert_eq!(report.summary.fallback, 3);
    }

    #[tokio::test]
    async fn test_fallback_disabled_leaves_failures() {
        let config = AuditConfig::builder().fallback_enabled(false).build().unwrap();
        let engine = AuditEngine::builder(config)
            .data_adapter(Arc::new(data_mock()))
            .build()
            .unwrap();

        let report = engine.submit_audit("example.com", "US").await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.summary.failed, 3);
        let technical = report.section(StepKind::Technical).unwrap();
        assert_eq!(technical.payload, None);
        assert!(technical.error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation() {
        let engine = AuditEngine::builder(config())
            .ai_adapter(Arc::new(SlowAdapter::new(AdapterKind::AiAnalysis, Duration::from_secs(20))))
            .build()
            .unwrap();
        let request = AuditRequest::new("example.com", "US").unwrap();

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let err = engine.run_with_cancellation(&request, token).await.unwrap_err();
        assert!(matches!(err, AuditError::Cancelled));
    }

    #[tokio::test]
    async fn test_uncancelled_run_completes() {
        let engine = AuditEngine::builder(config()).build().unwrap();
        let request = AuditRequest::new("example.com", "US").unwrap();

        let report = engine
            .run_with_cancellation(&request, CancellationToken::new())
            .await
            .unwrap();
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_progress_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let engine = AuditEngine::builder(config()).progress(tx).build().unwrap();

        engine.submit_audit("example.com", "US").await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        let started = events
            .iter()
            .filter(|e| matches!(e, AuditProgress::StepStarted { .. }))
            .count();
        let finished = events
            .iter()
            .filter(|e| matches!(e, AuditProgress::StepFinished { status: StepStatus::Fallback, .. }))
            .count();
        assert_eq!(started, 5);
        assert_eq!(finished, 5);
        assert_eq!(events.last(), Some(&AuditProgress::Assembled));

        let keywords_done = events
            .iter()
            .position(|e| matches!(e, AuditProgress::StepFinished { kind: StepKind::Keywords, .. }))
            .unwrap();
        let content_started = events
            .iter()
            .position(|e| *e == AuditProgress::StepStarted { kind: StepKind::Content })
            .unwrap();
        assert!(keywords_done < content_started);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let config = AuditConfig {
            step_timeout: Duration::ZERO,
            ..AuditConfig::default()
        };
        assert!(matches!(
            AuditEngine::builder(config).build(),
            Err(AuditError::Config(_))
        ));
    }

    #[test]
    fn test_builder_rejects_adapter_in_wrong_slot() {
        let ai_in_data_slot = AuditEngine::builder(config())
            .data_adapter(Arc::new(SlowAdapter::new(AdapterKind::AiAnalysis, Duration::ZERO)))
            .build();
        match ai_in_data_slot {
            Err(AuditError::Config(message)) => assert!(message.contains("structured-data slot")),
            other => panic!("expected a config error, got {:?}", other.map(|_| ())),
        }

        let data_in_ai_slot = AuditEngine::builder(config())
            .ai_adapter(Arc::new(SlowAdapter::new(AdapterKind::StructuredData, Duration::ZERO)))
            .build();
        assert!(matches!(data_in_ai_slot, Err(AuditError::Config(_))));
    }
}
