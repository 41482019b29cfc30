//! Model Registry
//!
//! Static catalog of detection capabilities. Read-only after construction,
//! so it is shared across concurrent invocations behind an `Arc` without
//! locking.

use crate::types::{ContentKind, ModelDescriptor, SpeedClass};
use std::collections::HashSet;
use thiserror::Error;

/// Registry lookup and construction errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Duplicate model id: {0}")]
    DuplicateModel(String),

    #[error("No model supports {0} content")]
    NoModelForKind(ContentKind),
}

/// Catalog of model descriptors in insertion order
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    /// Build a registry, rejecting duplicate ids
    pub fn new(models: Vec<ModelDescriptor>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for model in &models {
            if !seen.insert(model.id.as_str()) {
                return Err(RegistryError::DuplicateModel(model.id.clone()));
            }
        }
        Ok(Self { models })
    }

    /// Registry with the built-in provider catalog
    pub fn builtin() -> Self {
        Self {
            models: builtin_catalog(),
        }
    }

    /// All descriptors in insertion order
    pub fn all(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Descriptors supporting `kind`, in insertion order
    pub fn list_models(&self, kind: ContentKind) -> Vec<&ModelDescriptor> {
        self.models.iter().filter(|m| m.supports(kind)).collect()
    }

    pub fn describe(&self, model_id: &str) -> Result<&ModelDescriptor, RegistryError> {
        self.models
            .iter()
            .find(|m| m.id == model_id)
            .ok_or_else(|| RegistryError::UnknownModel(model_id.to_string()))
    }

    /// Highest declared accuracy for `kind`; ties go to the earliest entry
    pub fn best_for(&self, kind: ContentKind) -> Result<&ModelDescriptor, RegistryError> {
        let mut best: Option<&ModelDescriptor> = None;
        for model in self.models.iter().filter(|m| m.supports(kind)) {
            match best {
                Some(current) if model.declared_accuracy <= current.declared_accuracy => {}
                _ => best = Some(model),
            }
        }
        best.ok_or(RegistryError::NoModelForKind(kind))
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[allow(clippy::too_many_arguments)]
fn descriptor(
    id: &str,
    provider_id: &str,
    display_name: &str,
    content_kinds: &[ContentKind],
    specialty: &str,
    declared_accuracy: u8,
    speed_class: SpeedClass,
    provider_model: &str,
) -> ModelDescriptor {
    ModelDescriptor {
        id: id.to_string(),
        provider_id: provider_id.to_string(),
        display_name: display_name.to_string(),
        content_kinds: content_kinds.to_vec(),
        specialty: specialty.to_string(),
        declared_accuracy,
        speed_class,
        provider_model: provider_model.to_string(),
    }
}

/// Built-in catalog. Ids must stay unique (checked in tests).
fn builtin_catalog() -> Vec<ModelDescriptor> {
    use ContentKind::*;

    vec![
        descriptor(
            "hive-deepfake",
            "hive",
            "Hive Deepfake Detection",
            &[Image, Video],
            "Face-swap and face-reenactment detection",
            94,
            SpeedClass::Medium,
            "deepfake",
        ),
        descriptor(
            "hive-ai-generated",
            "hive",
            "Hive AI-Generated Media",
            &[Image, Video],
            "Fully synthetic imagery from GAN and diffusion generators",
            92,
            SpeedClass::Fast,
            "ai_generated",
        ),
        descriptor(
            "sightengine-deepfake",
            "sightengine",
            "Sightengine Deepfake",
            &[Image],
            "Face manipulation detection",
            91,
            SpeedClass::Fast,
            "deepfake",
        ),
        descriptor(
            "sightengine-genai",
            "sightengine",
            "Sightengine GenAI",
            &[Image],
            "Generative AI image detection",
            89,
            SpeedClass::Fast,
            "genai",
        ),
        descriptor(
            "hf-vit-deepfake",
            "huggingface",
            "ViT Deepfake Classifier",
            &[Image],
            "Vision transformer face-forgery classifier",
            87,
            SpeedClass::Medium,
            "prithivMLmods/Deep-Fake-Detector-v2-Model",
        ),
        descriptor(
            "hf-wav2vec-antispoof",
            "huggingface",
            "Wav2Vec2 Anti-Spoofing",
            &[Audio],
            "Synthetic speech and voice-clone detection",
            85,
            SpeedClass::Medium,
            "MelodyMachine/Deepfake-audio-detection-V2",
        ),
        descriptor(
            "llm-vision-forensics",
            "llm",
            "LLM Vision Forensics",
            &[Image],
            "Multimodal forensic reasoning over visual artifacts",
            80,
            SpeedClass::Slow,
            "gpt-4o",
        ),
        descriptor(
            "llm-text-detector",
            "llm",
            "LLM Machine-Text Detector",
            &[Text],
            "Machine-generated text detection",
            78,
            SpeedClass::Slow,
            "gpt-4o-mini",
        ),
    ]
}
