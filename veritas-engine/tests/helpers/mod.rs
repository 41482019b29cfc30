//! Shared test helpers: a scripted in-process adapter and engine builders

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use veritas_common::config::EngineSettings;
use veritas_common::EnsemblePolicy;
use veritas_engine::adapters::{AdapterSet, ModelAdapter};
use veritas_engine::registry::ModelRegistry;
use veritas_engine::types::{
    AdapterError, AdapterErrorKind, ContentKind, ContentReference, ModelDescriptor, ModelResult,
    SpeedClass,
};
use veritas_engine::DetectionEngine;

pub const PROVIDER: &str = "scripted";

/// Scripted behavior of one model
#[derive(Debug, Clone)]
pub enum Script {
    Score(u8),
    ScoreAfter(u8, Duration),
    Fail(AdapterErrorKind),
    Hang,
}

/// Adapter answering from a per-model script
pub struct ScriptedAdapter {
    scripts: HashMap<String, Script>,
    calls: AtomicUsize,
}

impl ScriptedAdapter {
    pub fn new(scripts: &[(&str, Script)]) -> Self {
        Self {
            scripts: scripts
                .iter()
                .map(|(id, script)| (id.to_string(), script.clone()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelAdapter for ScriptedAdapter {
    fn provider_id(&self) -> &str {
        PROVIDER
    }

    async fn invoke(
        &self,
        _content: &ContentReference,
        model: &ModelDescriptor,
        _deadline: Instant,
    ) -> Result<ModelResult, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .get(&model.id)
            .cloned()
            .unwrap_or(Script::Fail(AdapterErrorKind::ProviderError));

        let score = match script {
            Script::Score(score) => score,
            Script::ScoreAfter(score, delay) => {
                tokio::time::sleep(delay).await;
                score
            }
            Script::Fail(kind) => return Err(AdapterError::new(kind, "scripted failure")),
            Script::Hang => {
                std::future::pending::<()>().await;
                0
            }
        };

        Ok(ModelResult {
            model_id: model.id.clone(),
            model_name: model.display_name.clone(),
            score,
            processing_time_ms: 1,
            analysis: format!("scripted score {}", score),
            artifacts: vec!["No specific artifacts detected".to_string()],
        })
    }
}

pub fn model(id: &str, accuracy: u8, kinds: &[ContentKind]) -> ModelDescriptor {
    ModelDescriptor {
        id: id.to_string(),
        provider_id: PROVIDER.to_string(),
        display_name: format!("Scripted {}", id),
        content_kinds: kinds.to_vec(),
        specialty: "scripted".to_string(),
        declared_accuracy: accuracy,
        speed_class: SpeedClass::Fast,
        provider_model: id.to_string(),
    }
}

/// alpha/beta/gamma/delta (image, descending accuracy) and voice (audio)
pub fn test_registry() -> ModelRegistry {
    ModelRegistry::new(vec![
        model("alpha", 90, &[ContentKind::Image]),
        model("beta", 85, &[ContentKind::Image]),
        model("gamma", 80, &[ContentKind::Image]),
        model("delta", 75, &[ContentKind::Image]),
        model("voice", 88, &[ContentKind::Audio]),
    ])
    .unwrap()
}

pub fn test_settings() -> EngineSettings {
    EngineSettings {
        overall_deadline_ms: 2_000,
        cancellation_grace_ms: 50,
        ..EngineSettings::default()
    }
}

pub fn engine_with_settings(
    scripts: &[(&str, Script)],
    settings: EngineSettings,
) -> (DetectionEngine, Arc<ScriptedAdapter>) {
    let adapter = Arc::new(ScriptedAdapter::new(scripts));
    let engine = DetectionEngine::new(
        Arc::new(test_registry()),
        AdapterSet::new().with_adapter(adapter.clone()),
        &settings,
        EnsemblePolicy::default(),
    );
    (engine, adapter)
}

pub fn engine(scripts: &[(&str, Script)]) -> DetectionEngine {
    engine_with_settings(scripts, test_settings()).0
}

pub fn image_url() -> ContentReference {
    ContentReference::from_url("https://media.example.com/upload/portrait.jpg").unwrap()
}

pub fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
