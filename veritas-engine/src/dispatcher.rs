//! Dispatcher
//!
//! Fan-out/fan-in over the selected models. One spawned task per model, each
//! bound by `min(overall deadline, per-model timeout)`. A single
//! `CancellationToken` per request is cloned into every task; when the
//! overall deadline fires the token is cancelled, the tasks get a bounded
//! grace period to settle, and anything still outstanding is aborted and
//! recorded as `Timeout`.
//!
//! Results are returned in completion order. Display ordering is the
//! assembler's concern.

use crate::adapters::{within_deadline, AdapterSet, ModelAdapter};
use crate::registry::ModelRegistry;
use crate::types::{
    AdapterError, AdapterErrorKind, ContentReference, DetectionError, ModelDescriptor, ModelFailure,
    ModelInvocation, ModelResult, SpeedClass,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use veritas_common::config::EngineSettings;

/// Timeouts and retry policy for one dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSettings {
    pub fast_timeout: Duration,
    pub medium_timeout: Duration,
    pub slow_timeout: Duration,
    /// Extra attempts after a retryable failure (0 = none)
    pub max_retries: u32,
    /// Bounded wait for cancelled tasks after the overall deadline
    pub cancellation_grace: Duration,
}

impl DispatchSettings {
    /// Per-invocation default timeout for a speed class
    pub fn default_timeout(&self, speed_class: SpeedClass) -> Duration {
        match speed_class {
            SpeedClass::Fast => self.fast_timeout,
            SpeedClass::Medium => self.medium_timeout,
            SpeedClass::Slow => self.slow_timeout,
        }
    }
}

impl From<&EngineSettings> for DispatchSettings {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            fast_timeout: Duration::from_millis(settings.fast_timeout_ms),
            medium_timeout: Duration::from_millis(settings.medium_timeout_ms),
            slow_timeout: Duration::from_millis(settings.slow_timeout_ms),
            max_retries: settings.max_retries,
            cancellation_grace: settings.cancellation_grace(),
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from(&EngineSettings::default())
    }
}

/// Fan-in of one dispatch
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    /// Successful results in completion order
    pub results: Vec<ModelResult>,
    /// One entry per model that produced no usable result
    pub failures: Vec<ModelFailure>,
    /// Distinct models attempted (results + failures)
    pub attempted: usize,
}

pub struct Dispatcher {
    registry: Arc<ModelRegistry>,
    adapters: AdapterSet,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(registry: Arc<ModelRegistry>, adapters: AdapterSet, settings: DispatchSettings) -> Self {
        Self {
            registry,
            adapters,
            settings,
        }
    }

    /// Run the requested models concurrently against `content`
    ///
    /// Unknown ids are recorded as `UnknownModel`. Models that do not
    /// declare the content kind, or whose adapter cannot take the content in
    /// its current form, are recorded as `UnsupportedContent`. None of these
    /// are dispatched. When nothing remains, the best usable model for the
    /// kind is dispatched instead. Returns only once every task has settled
    /// or `overall_deadline` (plus the cancellation grace) has elapsed.
    ///
    /// # Errors
    /// - `NoModelForKind` when no registered model supports the content kind
    /// - `UnrecognizedContent` when models exist for the kind but none can
    ///   take the content in this form (e.g. text by URL)
    ///
    /// Per-model failures are never errors here.
    pub async fn detect(
        &self,
        content: Arc<ContentReference>,
        model_ids: &[String],
        overall_deadline: Duration,
    ) -> Result<DispatchOutcome, DetectionError> {
        let started = Instant::now();
        let overall = started + overall_deadline;
        let kind = content.kind();

        let mut failures = Vec::new();
        let mut selected = self.resolve(&content, model_ids, &mut failures);
        if selected.is_empty() {
            let best = self.best_usable(&content)?;
            info!(
                model_id = %best.id,
                content_kind = %kind,
                "No usable model requested, falling back to best model for kind"
            );
            selected.push(best.clone());
        }

        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();
        let mut pending: HashSet<String> = HashSet::new();

        for model in selected {
            let Some(adapter) = self.adapters.get(&model.provider_id) else {
                warn!(model_id = %model.id, provider = %model.provider_id, "No adapter registered for provider");
                failures.push(ModelFailure::new(
                    model.id.clone(),
                    AdapterError::unavailable(format!(
                        "no adapter registered for provider '{}'",
                        model.provider_id
                    )),
                ));
                continue;
            };

            debug!(
                model_id = %model.id,
                provider = %model.provider_id,
                content = %content.describe(),
                "Dispatching model"
            );
            pending.insert(model.id.clone());
            tasks.spawn(run_model(
                adapter,
                Arc::clone(&content),
                self.settings.default_timeout(model.speed_class),
                model,
                overall,
                self.settings.max_retries,
                cancel.clone(),
            ));
        }

        let mut results = Vec::new();
        let mut deadline_hit = false;
        let deadline_sleep = tokio::time::sleep_until(overall);
        tokio::pin!(deadline_sleep);

        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok((model_id, outcome))) => {
                        pending.remove(&model_id);
                        match outcome {
                            Ok(result) => {
                                debug!(model_id = %model_id, score = result.score, elapsed_ms = result.processing_time_ms, "Model responded");
                                results.push(result);
                            }
                            Err(error) => {
                                warn!(model_id = %model_id, kind = %error.kind, error = %error.message, "Model invocation failed");
                                failures.push(ModelFailure::new(model_id, error));
                            }
                        }
                    }
                    Some(Err(join_error)) => {
                        warn!(error = %join_error, "Model invocation task did not complete");
                    }
                },
                _ = &mut deadline_sleep => {
                    deadline_hit = true;
                    break;
                }
            }
        }

        if deadline_hit {
            self.cancel_outstanding(&cancel, &mut tasks).await;
        }

        let mut outstanding: Vec<String> = pending.into_iter().collect();
        outstanding.sort_unstable();
        for model_id in outstanding {
            let error = if deadline_hit {
                AdapterError::timeout("overall deadline exceeded")
            } else {
                AdapterError::provider("invocation task aborted")
            };
            warn!(model_id = %model_id, kind = %error.kind, "Model did not settle");
            failures.push(ModelFailure::new(model_id, error));
        }

        Ok(DispatchOutcome {
            attempted: results.len() + failures.len(),
            results,
            failures,
        })
    }

    /// Requested descriptors usable for `content`, first occurrence wins
    fn resolve(
        &self,
        content: &ContentReference,
        model_ids: &[String],
        failures: &mut Vec<ModelFailure>,
    ) -> Vec<ModelDescriptor> {
        let kind = content.kind();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut selected = Vec::new();

        for model_id in model_ids {
            if !seen.insert(model_id.as_str()) {
                continue;
            }
            match self.registry.describe(model_id) {
                Ok(model) if !model.supports(kind) => failures.push(ModelFailure::new(
                    model_id.clone(),
                    AdapterError::new(
                        AdapterErrorKind::UnsupportedContent,
                        format!("model does not support {} content", kind),
                    ),
                )),
                Ok(model) if !self.accepts(model, content) => failures.push(ModelFailure::new(
                    model_id.clone(),
                    AdapterError::new(
                        AdapterErrorKind::UnsupportedContent,
                        format!(
                            "provider '{}' cannot take {} content {}",
                            model.provider_id,
                            kind,
                            form_of(content)
                        ),
                    ),
                )),
                Ok(model) => selected.push(model.clone()),
                Err(e) => failures.push(ModelFailure::new(
                    model_id.clone(),
                    AdapterError::new(AdapterErrorKind::UnknownModel, e.to_string()),
                )),
            }
        }

        selected
    }

    /// Highest declared accuracy among models usable for `content`; ties go
    /// to the earliest registry entry
    fn best_usable(&self, content: &ContentReference) -> Result<&ModelDescriptor, DetectionError> {
        let kind = content.kind();
        let candidates = self.registry.list_models(kind);
        if candidates.is_empty() {
            return Err(DetectionError::NoModelForKind(kind));
        }

        candidates
            .into_iter()
            .filter(|model| self.accepts(model, content))
            .rev()
            .max_by_key(|model| model.declared_accuracy)
            .ok_or_else(|| {
                DetectionError::UnrecognizedContent(format!(
                    "no registered model can take {} content {}",
                    kind,
                    form_of(content)
                ))
            })
    }

    /// Models without a registered adapter stay selected and fail as `Unavailable`
    fn accepts(&self, model: &ModelDescriptor, content: &ContentReference) -> bool {
        self.adapters
            .get(&model.provider_id)
            .map_or(true, |adapter| adapter.accepts(content))
    }

    /// Signal cancellation, let tasks settle for the grace period, abort the rest
    ///
    /// Outcomes arriving during the grace period are discarded; the caller
    /// records every still-pending model as `Timeout`.
    async fn cancel_outstanding(
        &self,
        cancel: &CancellationToken,
        tasks: &mut JoinSet<(String, Result<ModelResult, AdapterError>)>,
    ) {
        cancel.cancel();
        debug!(outstanding = tasks.len(), "Overall deadline reached, cancelling invocations");

        let grace = tokio::time::sleep(self.settings.cancellation_grace);
        tokio::pin!(grace);
        loop {
            tokio::select! {
                joined = tasks.join_next() => {
                    if joined.is_none() {
                        break;
                    }
                }
                _ = &mut grace => break,
            }
        }

        if !tasks.is_empty() {
            warn!(remaining = tasks.len(), "Aborting invocations that ignored cancellation");
            tasks.abort_all();
        }
    }
}

fn form_of(content: &ContentReference) -> &'static str {
    match content {
        ContentReference::Url { .. } => "by URL",
        ContentReference::Payload { .. } => "as an uploaded payload",
    }
}

/// One model, with retries, until success, a final failure or cancellation
async fn run_model(
    adapter: Arc<dyn ModelAdapter>,
    content: Arc<ContentReference>,
    per_model_timeout: Duration,
    model: ModelDescriptor,
    overall: Instant,
    max_retries: u32,
    cancel: CancellationToken,
) -> (String, Result<ModelResult, AdapterError>) {
    let mut attempt = 0;
    loop {
        let now = Instant::now();
        let invocation = ModelInvocation::new(&model.id, attempt, now, (now + per_model_timeout).min(overall));

        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(AdapterError::timeout("cancelled at overall deadline")),
            outcome = within_deadline(
                invocation.deadline,
                adapter.invoke(&content, &model, invocation.deadline),
            ) => outcome,
        };

        match outcome {
            Err(error)
                if error.is_retryable()
                    && attempt < max_retries
                    && !cancel.is_cancelled()
                    && Instant::now() < overall =>
            {
                warn!(
                    model_id = %invocation.model_id,
                    attempt = invocation.attempt,
                    elapsed_ms = invocation.elapsed().as_millis() as u64,
                    error = %error,
                    "Retrying model invocation"
                );
                attempt += 1;
            }
            outcome => return (model.id, outcome),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentKind;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Clone)]
    enum Behavior {
        Score(u8, Duration),
        Fail(AdapterErrorKind),
        Hang,
    }

    struct MockAdapter {
        behaviors: HashMap<String, Behavior>,
    }

    #[async_trait]
    impl ModelAdapter for MockAdapter {
        fn provider_id(&self) -> &str {
            "mock"
        }

        async fn invoke(
            &self,
            _content: &ContentReference,
            model: &ModelDescriptor,
            _deadline: Instant,
        ) -> Result<ModelResult, AdapterError> {
            match self.behaviors.get(&model.id).cloned().unwrap_or(Behavior::Hang) {
                Behavior::Score(score, delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(ModelResult {
                        model_id: model.id.clone(),
                        model_name: model.display_name.clone(),
                        score,
                        processing_time_ms: delay.as_millis() as u64,
                        analysis: "mock".to_string(),
                        artifacts: vec!["none".to_string()],
                    })
                }
                Behavior::Fail(kind) => Err(AdapterError::new(kind, "mock failure")),
                Behavior::Hang => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }
    }

    /// Fails with ProviderError until `failures_before_success` calls have been made
    struct FlakyAdapter {
        calls: AtomicU32,
        failures_before_success: u32,
    }

    #[async_trait]
    impl ModelAdapter for FlakyAdapter {
        fn provider_id(&self) -> &str {
            "flaky"
        }

        async fn invoke(
            &self,
            _content: &ContentReference,
            model: &ModelDescriptor,
            _deadline: Instant,
        ) -> Result<ModelResult, AdapterError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                return Err(AdapterError::provider("503 Service Unavailable"));
            }
            Ok(ModelResult {
                model_id: model.id.clone(),
                model_name: model.display_name.clone(),
                score: 64,
                processing_time_ms: 1,
                analysis: String::new(),
                artifacts: vec!["none".to_string()],
            })
        }
    }

    /// Takes uploaded payloads only
    struct InlineOnlyAdapter;

    #[async_trait]
    impl ModelAdapter for InlineOnlyAdapter {
        fn provider_id(&self) -> &str {
            "inline"
        }

        fn accepts(&self, content: &ContentReference) -> bool {
            matches!(content, ContentReference::Payload { .. })
        }

        async fn invoke(
            &self,
            _content: &ContentReference,
            _model: &ModelDescriptor,
            _deadline: Instant,
        ) -> Result<ModelResult, AdapterError> {
            Err(AdapterError::provider("invoked with content it declined"))
        }
    }

    fn descriptor(id: &str, provider: &str, accuracy: u8, kinds: &[ContentKind]) -> ModelDescriptor {
        ModelDescriptor {
            id: id.to_string(),
            provider_id: provider.to_string(),
            display_name: format!("Model {}", id),
            content_kinds: kinds.to_vec(),
            specialty: "test".to_string(),
            declared_accuracy: accuracy,
            speed_class: SpeedClass::Fast,
            provider_model: id.to_string(),
        }
    }

    fn image() -> Arc<ContentReference> {
        Arc::new(ContentReference::from_url("https://example.com/photo.jpg").unwrap())
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn settings() -> DispatchSettings {
        DispatchSettings {
            fast_timeout: Duration::from_secs(5),
            medium_timeout: Duration::from_secs(5),
            slow_timeout: Duration::from_secs(5),
            max_retries: 0,
            cancellation_grace: Duration::from_millis(50),
        }
    }

    fn dispatcher(behaviors: &[(&str, Behavior)], settings: DispatchSettings) -> Dispatcher {
        let registry = ModelRegistry::new(vec![
            descriptor("alpha", "mock", 90, &[ContentKind::Image]),
            descriptor("beta", "mock", 85, &[ContentKind::Image]),
            descriptor("gamma", "mock", 80, &[ContentKind::Image]),
            descriptor("voice", "mock", 95, &[ContentKind::Audio]),
            descriptor("orphan", "missing", 70, &[ContentKind::Image]),
        ])
        .unwrap();
        let adapter = MockAdapter {
            behaviors: behaviors
                .iter()
                .map(|(id, b)| (id.to_string(), b.clone()))
                .collect(),
        };
        Dispatcher::new(
            Arc::new(registry),
            AdapterSet::new().with_adapter(Arc::new(adapter)),
            settings,
        )
    }

    const QUICK: Duration = Duration::from_millis(5);

    #[test]
    fn test_default_timeout_by_speed_class() {
        let settings = DispatchSettings::default();
        assert_eq!(settings.default_timeout(SpeedClass::Fast), Duration::from_secs(10));
        assert_eq!(settings.default_timeout(SpeedClass::Medium), Duration::from_secs(20));
        assert_eq!(settings.default_timeout(SpeedClass::Slow), Duration::from_secs(45));
    }

    #[tokio::test]
    async fn test_all_models_respond() {
        let d = dispatcher(
            &[("alpha", Behavior::Score(90, QUICK)), ("beta", Behavior::Score(85, QUICK))],
            settings(),
        );
        let outcome = d
            .detect(image(), &ids(&["alpha", "beta"]), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.attempted, 2);
    }

    #[tokio::test]
    async fn test_unknown_and_unsupported_not_dispatched() {
        let d = dispatcher(&[("alpha", Behavior::Score(90, QUICK))], settings());
        let outcome = d
            .detect(image(), &ids(&["alpha", "nope", "voice"]), Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        let kinds: HashMap<&str, AdapterErrorKind> = outcome
            .failures
            .iter()
            .map(|f| (f.model_id.as_str(), f.error.kind))
            .collect();
        assert_eq!(kinds["nope"], AdapterErrorKind::UnknownModel);
        assert_eq!(kinds["voice"], AdapterErrorKind::UnsupportedContent);
        assert_eq!(outcome.attempted, 3);
    }

    #[tokio::test]
    async fn test_duplicate_ids_dispatched_once() {
        let d = dispatcher(&[("alpha", Behavior::Score(90, QUICK))], settings());
        let outcome = d
            .detect(image(), &ids(&["alpha", "alpha", "alpha"]), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.attempted, 1);
    }

    #[tokio::test]
    async fn test_empty_selection_falls_back_to_best() {
        let d = dispatcher(&[("alpha", Behavior::Score(77, QUICK))], settings());
        let outcome = d.detect(image(), &[], Duration::from_secs(2)).await.unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].model_id, "alpha");
    }

    #[tokio::test]
    async fn test_all_unknown_falls_back_to_best() {
        let d = dispatcher(&[("alpha", Behavior::Score(77, QUICK))], settings());
        let outcome = d
            .detect(image(), &ids(&["ghost"]), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(outcome.results[0].model_id, "alpha");
        assert_eq!(outcome.failures[0].error.kind, AdapterErrorKind::UnknownModel);
        assert_eq!(outcome.attempted, 2);
    }

    #[tokio::test]
    async fn test_no_model_for_kind() {
        let d = dispatcher(&[], settings());
        let text = Arc::new(ContentReference::from_bytes(b"hello".to_vec(), Some("text/plain")).unwrap());
        let err = d.detect(text, &[], Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, DetectionError::NoModelForKind(ContentKind::Text)));
    }

    #[tokio::test]
    async fn test_missing_adapter_is_unavailable() {
        let d = dispatcher(&[("alpha", Behavior::Score(90, QUICK))], settings());
        let outcome = d
            .detect(image(), &ids(&["alpha", "orphan"]), Duration::from_secs(2))
            .await
            .unwrap();
        let orphan = outcome.failures.iter().find(|f| f.model_id == "orphan").unwrap();
        assert_eq!(orphan.error.kind, AdapterErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn test_overall_deadline_cancels_outstanding() {
        let d = dispatcher(
            &[("alpha", Behavior::Score(90, QUICK)), ("beta", Behavior::Hang)],
            settings(),
        );
        let started = Instant::now();
        let outcome = d
            .detect(image(), &ids(&["alpha", "beta"]), Duration::from_millis(200))
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_millis(200) + Duration::from_millis(500));
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].model_id, "beta");
        assert_eq!(outcome.failures[0].error.kind, AdapterErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_per_model_timeout_bounds_invocation() {
        let mut s = settings();
        s.fast_timeout = Duration::from_millis(50);
        let d = dispatcher(&[("alpha", Behavior::Score(90, Duration::from_secs(3)))], s);
        let outcome = d
            .detect(image(), &ids(&["alpha"]), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.failures[0].error.kind, AdapterErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_parse_error_not_retried() {
        let mut s = settings();
        s.max_retries = 3;
        let d = dispatcher(&[("alpha", Behavior::Fail(AdapterErrorKind::ParseError))], s);
        let outcome = d
            .detect(image(), &ids(&["alpha"]), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(outcome.failures[0].error.kind, AdapterErrorKind::ParseError);
    }

    #[tokio::test]
    async fn test_retry_recovers_provider_error() {
        let registry = ModelRegistry::new(vec![descriptor("f", "flaky", 90, &[ContentKind::Image])]).unwrap();
        let flaky = Arc::new(FlakyAdapter {
            calls: AtomicU32::new(0),
            failures_before_success: 2,
        });
        let mut s = settings();
        s.max_retries = 2;
        let d = Dispatcher::new(
            Arc::new(registry),
            AdapterSet::new().with_adapter(flaky.clone()),
            s,
        );

        let outcome = d.detect(image(), &ids(&["f"]), Duration::from_secs(1)).await.unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.failures.is_empty());
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let registry = ModelRegistry::new(vec![descriptor("f", "flaky", 90, &[ContentKind::Image])]).unwrap();
        let flaky = Arc::new(FlakyAdapter {
            calls: AtomicU32::new(0),
            failures_before_success: 10,
        });
        let mut s = settings();
        s.max_retries = 1;
        let d = Dispatcher::new(
            Arc::new(registry),
            AdapterSet::new().with_adapter(flaky.clone()),
            s,
        );

        let outcome = d.detect(image(), &ids(&["f"]), Duration::from_secs(1)).await.unwrap();
        assert_eq!(outcome.failures[0].error.kind, AdapterErrorKind::ProviderError);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }

    fn form_dispatcher() -> Dispatcher {
        let registry = ModelRegistry::new(vec![
            descriptor("reader", "inline", 95, &[ContentKind::Image, ContentKind::Text]),
            descriptor("alpha", "mock", 90, &[ContentKind::Image]),
        ])
        .unwrap();
        let mock = MockAdapter {
            behaviors: HashMap::from([("alpha".to_string(), Behavior::Score(70, QUICK))]),
        };
        Dispatcher::new(
            Arc::new(registry),
            AdapterSet::new()
                .with_adapter(Arc::new(mock))
                .with_adapter(Arc::new(InlineOnlyAdapter)),
            settings(),
        )
    }

    #[tokio::test]
    async fn test_fallback_skips_model_declining_form() {
        let outcome = form_dispatcher()
            .detect(image(), &[], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(outcome.results[0].model_id, "alpha");
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn test_declined_form_recorded_as_unsupported() {
        let outcome = form_dispatcher()
            .detect(image(), &ids(&["reader", "alpha"]), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.failures[0].model_id, "reader");
        assert_eq!(outcome.failures[0].error.kind, AdapterErrorKind::UnsupportedContent);
        assert_eq!(outcome.attempted, 2);
    }

    #[tokio::test]
    async fn test_no_model_accepts_form() {
        let text_url = Arc::new(ContentReference::from_url("https://news.example.com/article.txt").unwrap());
        let err = form_dispatcher()
            .detect(text_url, &[], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DetectionError::UnrecognizedContent(_)));
    }
}
