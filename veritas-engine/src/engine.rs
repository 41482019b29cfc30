//! Detection Engine
//!
//! Facade over the detection flow:
//! Registry → Dispatcher → Adapters → Aggregator → Classifier → Assembler
//!
//! `detect_content` is the single inbound operation. The caller awaits one
//! `EnhancedDetectionResult`; internally every selected model runs
//! concurrently under one overall deadline.

use crate::adapters::AdapterSet;
use crate::dispatcher::{DispatchSettings, Dispatcher};
use crate::ensemble::ResultAssembler;
use crate::registry::ModelRegistry;
use crate::types::{ContentReference, DetectionError, EnhancedDetectionResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};
use veritas_common::config::EngineSettings;
use veritas_common::{EnsemblePolicy, VeritasConfig};

pub struct DetectionEngine {
    registry: Arc<ModelRegistry>,
    dispatcher: Dispatcher,
    assembler: ResultAssembler,
    overall_deadline: Duration,
    default_models: Vec<String>,
}

impl DetectionEngine {
    pub fn new(
        registry: Arc<ModelRegistry>,
        adapters: AdapterSet,
        settings: &EngineSettings,
        policy: EnsemblePolicy,
    ) -> Self {
        for model_id in &settings.default_models {
            if registry.describe(model_id).is_err() {
                warn!(model_id = %model_id, "Configured default model is not registered");
            }
        }

        Self {
            dispatcher: Dispatcher::new(
                Arc::clone(&registry),
                adapters,
                DispatchSettings::from(settings),
            ),
            registry,
            assembler: ResultAssembler::new(policy),
            overall_deadline: settings.overall_deadline(),
            default_models: settings.default_models.clone(),
        }
    }

    /// Engine over the built-in catalog and provider adapters
    pub fn from_config(config: &VeritasConfig) -> veritas_common::Result<Self> {
        let adapters = AdapterSet::from_config(&config.providers)?;
        for provider in adapters.providers() {
            let available = adapters.get(provider).is_some_and(|a| a.is_available());
            if !available {
                warn!(provider = provider, "Provider credentials not configured; its models will report Unavailable");
            }
        }

        Ok(Self::new(
            Arc::new(ModelRegistry::builtin()),
            adapters,
            &config.engine,
            config.policy.clone(),
        ))
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn overall_deadline(&self) -> Duration {
        self.overall_deadline
    }

    /// Run detection with the configured overall deadline
    ///
    /// `model_ids = None` (or an empty list) selects the configured default
    /// models that support the content kind, else the registry's best model
    /// for the kind.
    pub async fn detect_content(
        &self,
        content: ContentReference,
        model_ids: Option<&[String]>,
    ) -> Result<EnhancedDetectionResult, DetectionError> {
        self.detect_content_with_deadline(content, model_ids, self.overall_deadline)
            .await
    }

    /// Run detection with an explicit overall deadline
    ///
    /// # Errors
    /// - `NoModelForKind` when nothing in the registry supports the content
    /// - `UnrecognizedContent` when no model can take the content in its
    ///   form (e.g. text by URL)
    /// - `NoResults` when every attempted model failed
    pub async fn detect_content_with_deadline(
        &self,
        content: ContentReference,
        model_ids: Option<&[String]>,
        overall_deadline: Duration,
    ) -> Result<EnhancedDetectionResult, DetectionError> {
        let started = Instant::now();
        let kind = content.kind();
        let requested = match model_ids {
            Some(ids) if !ids.is_empty() => ids.to_vec(),
            _ => self.default_models_for(&content),
        };

        info!(
            content = %content.describe(),
            requested = requested.len(),
            deadline_ms = overall_deadline.as_millis() as u64,
            "Starting detection"
        );

        let outcome = self
            .dispatcher
            .detect(Arc::new(content), &requested, overall_deadline)
            .await?;

        match self.assembler.assemble(outcome, started) {
            Ok(result) => {
                info!(
                    detection_id = %result.id(),
                    content_kind = %kind,
                    overall_score = result.overall_score(),
                    action = result.ensemble_analysis().recommended_action.as_str(),
                    elapsed_ms = result.processing_time_ms(),
                    "Detection complete: {}",
                    result.coverage()
                );
                Ok(result)
            }
            Err(e) => {
                warn!(content_kind = %kind, error = %e, "Detection produced no results");
                Err(e)
            }
        }
    }

    fn default_models_for(&self, content: &ContentReference) -> Vec<String> {
        let kind = content.kind();
        self.default_models
            .iter()
            .filter(|id| {
                self.registry
                    .describe(id)
                    .is_ok_and(|model| model.supports(kind))
            })
            .cloned()
            .collect()
    }
}
