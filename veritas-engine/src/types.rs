//! Core Types for the Veritas detection engine
//!
//! Shared by every stage of the detection flow:
//! Registry → Dispatcher → Adapters → Aggregator → Classifier → Assembler
//!
//! All score fields use the 0-100 scale where higher means higher risk of
//! manipulation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

// ============================================================================
// Content
// ============================================================================

/// Coarse content category used for model selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Image,
    Video,
    Audio,
    Text,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Image => "image",
            ContentKind::Video => "video",
            ContentKind::Audio => "audio",
            ContentKind::Text => "text",
        }
    }

    /// Map a MIME type (parameters ignored) to a content kind
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        let (top, sub) = essence.split_once('/')?;
        match top {
            "image" => Some(ContentKind::Image),
            "video" => Some(ContentKind::Video),
            "audio" => Some(ContentKind::Audio),
            "text" => Some(ContentKind::Text),
            "application" if matches!(sub, "json" | "xml") => Some(ContentKind::Text),
            _ => None,
        }
    }

    /// Map a file extension (without dot) to a content kind
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "bmp" | "tif" | "tiff" | "heic" | "avif" => {
                Some(ContentKind::Image)
            }
            "mp4" | "mov" | "avi" | "mkv" | "webm" | "m4v" => Some(ContentKind::Video),
            "mp3" | "wav" | "flac" | "ogg" | "m4a" | "aac" | "opus" => Some(ContentKind::Audio),
            "txt" | "md" | "html" | "htm" | "json" | "xml" => Some(ContentKind::Text),
            _ => None,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = DetectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(ContentKind::Image),
            "video" => Ok(ContentKind::Video),
            "audio" => Ok(ContentKind::Audio),
            "text" => Ok(ContentKind::Text),
            other => Err(DetectionError::UnrecognizedContent(format!(
                "unknown content kind '{}'",
                other
            ))),
        }
    }
}

/// Content to analyze: a URL or an in-memory payload
///
/// Immutable once built. The dispatcher shares it read-only across
/// concurrent invocations behind an `Arc`.
#[derive(Debug, Clone)]
pub enum ContentReference {
    Url {
        url: String,
        kind: ContentKind,
    },
    Payload {
        data: Arc<[u8]>,
        mime_type: String,
        kind: ContentKind,
    },
}

impl ContentReference {
    /// Build a URL reference, inferring the kind from the path extension
    pub fn from_url(url: impl Into<String>) -> Result<Self, DetectionError> {
        let url = url.into();
        let kind = kind_from_url(&url).ok_or_else(|| {
            DetectionError::UnrecognizedContent(format!(
                "cannot infer content kind from URL '{}'; declare it explicitly",
                url
            ))
        })?;
        Ok(ContentReference::Url { url, kind })
    }

    /// Build a URL reference with an explicitly declared kind
    pub fn from_url_with_kind(url: impl Into<String>, kind: ContentKind) -> Self {
        ContentReference::Url {
            url: url.into(),
            kind,
        }
    }

    /// Build a payload reference
    ///
    /// When `mime_type` is absent the type is sniffed from the leading bytes;
    /// valid UTF-8 without a known signature is treated as `text/plain`.
    pub fn from_bytes(data: Vec<u8>, mime_type: Option<&str>) -> Result<Self, DetectionError> {
        if data.is_empty() {
            return Err(DetectionError::UnrecognizedContent(
                "payload is empty".to_string(),
            ));
        }

        let mime_type = match mime_type.map(str::trim).filter(|m| !m.is_empty()) {
            Some(mime) => mime.to_string(),
            None => match infer::get(&data) {
                Some(sniffed) => sniffed.mime_type().to_string(),
                None if std::str::from_utf8(&data).is_ok() => "text/plain".to_string(),
                None => {
                    return Err(DetectionError::UnrecognizedContent(
                        "unable to determine payload MIME type".to_string(),
                    ))
                }
            },
        };

        let kind = ContentKind::from_mime(&mime_type).ok_or_else(|| {
            DetectionError::UnrecognizedContent(format!("unsupported MIME type '{}'", mime_type))
        })?;

        Ok(ContentReference::Payload {
            data: Arc::from(data),
            mime_type,
            kind,
        })
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ContentReference::Url { kind, .. } | ContentReference::Payload { kind, .. } => *kind,
        }
    }

    /// Short description for logs (never includes payload bytes)
    pub fn describe(&self) -> String {
        match self {
            ContentReference::Url { url, kind } => format!("{} url {}", kind, url),
            ContentReference::Payload {
                data, mime_type, ..
            } => format!("{} payload ({} bytes)", mime_type, data.len()),
        }
    }
}

fn kind_from_url(url: &str) -> Option<ContentKind> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = path.rsplit('/').next()?;
    let (_, ext) = last_segment.rsplit_once('.')?;
    ContentKind::from_extension(ext)
}

// ============================================================================
// Models
// ============================================================================

/// Declared latency class of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedClass {
    Fast,
    Medium,
    Slow,
}

/// Static description of one detection capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// Globally unique model identifier
    pub id: String,
    /// Provider family; selects the adapter
    pub provider_id: String,
    pub display_name: String,
    /// Supported content kinds (set semantics)
    pub content_kinds: Vec<ContentKind>,
    pub specialty: String,
    /// Declared accuracy (0-100)
    pub declared_accuracy: u8,
    pub speed_class: SpeedClass,
    /// Provider-side model or class name, opaque outside the adapter
    pub provider_model: String,
}

impl ModelDescriptor {
    pub fn supports(&self, kind: ContentKind) -> bool {
        self.content_kinds.contains(&kind)
    }
}

/// Ephemeral record of one call to one model
#[derive(Debug, Clone)]
pub struct ModelInvocation {
    pub model_id: String,
    /// 0 for the first attempt, incremented per retry
    pub attempt: u32,
    pub started_at: Instant,
    pub deadline: Instant,
}

impl ModelInvocation {
    pub fn new(model_id: &str, attempt: u32, started_at: Instant, deadline: Instant) -> Self {
        Self {
            model_id: model_id.to_string(),
            attempt,
            started_at,
            deadline,
        }
    }

    /// Time spent on this attempt so far
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Normalized outcome of one successful invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResult {
    pub model_id: String,
    pub model_name: String,
    /// Risk of manipulation (0-100)
    pub score: u8,
    pub processing_time_ms: u64,
    pub analysis: String,
    /// Ordered artifact labels; never empty
    pub artifacts: Vec<String>,
}

// ============================================================================
// Adapter errors
// ============================================================================

/// Per-invocation failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdapterErrorKind {
    /// Requested id is not in the registry
    UnknownModel,
    /// Model does not declare the content kind
    UnsupportedContent,
    /// Adapter missing or not configured (credentials)
    Unavailable,
    /// Invocation or overall deadline exceeded
    Timeout,
    /// Network error or non-success response
    ProviderError,
    /// Malformed or unexpected response body
    ParseError,
}

impl fmt::Display for AdapterErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdapterErrorKind::UnknownModel => "UnknownModel",
            AdapterErrorKind::UnsupportedContent => "UnsupportedContent",
            AdapterErrorKind::Unavailable => "Unavailable",
            AdapterErrorKind::Timeout => "Timeout",
            AdapterErrorKind::ProviderError => "ProviderError",
            AdapterErrorKind::ParseError => "ParseError",
        };
        f.write_str(name)
    }
}

/// Typed failure of a single model invocation
///
/// Always local to one model; never aborts the overall request.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub message: String,
}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Timeout, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::ProviderError, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::ParseError, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Unavailable, message)
    }

    /// Whether the dispatcher may retry this failure as a new invocation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            AdapterErrorKind::Timeout | AdapterErrorKind::ProviderError
        )
    }
}

/// A failed model paired with its error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFailure {
    pub model_id: String,
    pub error: AdapterError,
}

impl ModelFailure {
    pub fn new(model_id: impl Into<String>, error: AdapterError) -> Self {
        Self {
            model_id: model_id.into(),
            error,
        }
    }
}

// ============================================================================
// Ensemble output
// ============================================================================

/// Recommended handling of the analyzed content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendedAction {
    Accept,
    Review,
    Reject,
}

impl RecommendedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedAction::Accept => "accept",
            RecommendedAction::Review => "review",
            RecommendedAction::Reject => "reject",
        }
    }
}

/// Confidence tier derived from model agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

/// Agreement analysis over the successful model results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsembleAnalysis {
    /// 100 minus the normalized population standard deviation (0-100)
    pub agreement_score: u8,
    pub consensus_reached: bool,
    pub recommended_action: RecommendedAction,
    pub explanation: String,
}

/// Final output of one detection request
///
/// Built only by the result assembler; fields are read through accessors so
/// `overall_score` always matches `model_results`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedDetectionResult {
    pub(crate) id: Uuid,
    pub(crate) is_deepfake: bool,
    pub(crate) overall_score: u8,
    pub(crate) confidence: ConfidenceTier,
    pub(crate) model_results: Vec<ModelResult>,
    pub(crate) failures: Vec<ModelFailure>,
    pub(crate) ensemble_analysis: EnsembleAnalysis,
    pub(crate) processing_time_ms: u64,
    pub(crate) requested_models: usize,
    pub(crate) created_at: DateTime<Utc>,
}

impl EnhancedDetectionResult {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_deepfake(&self) -> bool {
        self.is_deepfake
    }

    pub fn overall_score(&self) -> u8 {
        self.overall_score
    }

    pub fn confidence(&self) -> ConfidenceTier {
        self.confidence
    }

    /// Successful results sorted by model id
    pub fn model_results(&self) -> &[ModelResult] {
        &self.model_results
    }

    /// Models that produced no usable result
    pub fn failures(&self) -> &[ModelFailure] {
        &self.failures
    }

    pub fn ensemble_analysis(&self) -> &EnsembleAnalysis {
        &self.ensemble_analysis
    }

    pub fn processing_time_ms(&self) -> u64 {
        self.processing_time_ms
    }

    /// Number of models attempted (successes plus failures)
    pub fn requested_models(&self) -> usize {
        self.requested_models
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True when some attempted models produced no result
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Coverage disclosure, e.g. "3 of 5 models responded"
    pub fn coverage(&self) -> String {
        format!(
            "{} of {} models responded",
            self.model_results.len(),
            self.requested_models
        )
    }
}

// ============================================================================
// Request-level errors
// ============================================================================

/// Fatal detection failure
#[derive(Debug, Error)]
pub enum DetectionError {
    /// Content kind could not be determined or is not supported
    #[error("Unrecognized content: {0}")]
    UnrecognizedContent(String),

    /// The registry has no model for this content kind
    #[error("No model supports {0} content")]
    NoModelForKind(ContentKind),

    /// Every attempted model failed
    #[error("No model produced a result ({} failed)", failures.len())]
    NoResults { failures: Vec<ModelFailure> },
}

// ============================================================================
// Tests
// ============================================================================
