//! Model Adapters
//!
//! One adapter per provider family. Each translates a generic
//! `(content, model, deadline)` request into the provider's wire call and
//! normalizes the response into a [`ModelResult`] or a typed
//! [`AdapterError`]. Provider response shapes never leave this module.
//!
//! # Adapters
//! 1. **hive** - Sync task API, explicit class probabilities
//! 2. **sightengine** - `check.json`, explicit per-model probabilities
//! 3. **huggingface** - Inference API, `[{label, score}]` classifications
//! 4. **llm** - OpenAI-compatible chat completions, free-text verdicts
//!
//! Adapters make exactly one outbound call per invocation and never retry;
//! retry policy belongs to the dispatcher.

pub mod huggingface;
pub mod hive;
pub mod llm;
pub mod scoring;
pub mod sightengine;

use crate::types::{AdapterError, ContentReference, ModelDescriptor, ModelResult};
use async_trait::async_trait;
use reqwest::multipart::Part;
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use veritas_common::config::ProvidersConfig;

pub use huggingface::HuggingFaceAdapter;
pub use hive::HiveAdapter;
pub use llm::LlmAdapter;
pub use sightengine::SightengineAdapter;

/// User-Agent sent to every provider
const USER_AGENT: &str = concat!("veritas-engine/", env!("CARGO_PKG_VERSION"));

/// Longest provider body excerpt kept in error messages
const ERROR_BODY_EXCERPT: usize = 200;

/// Direct (unkeyed) request quota
pub type DirectRateLimiter = governor::RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Provider adapter trait
///
/// # Example
/// ```rust,ignore
/// let adapter = HiveAdapter::new(&config.providers.hive)?;
/// let deadline = Instant::now() + Duration::from_secs(10);
/// match adapter.invoke(&content, &descriptor, deadline).await {
///     Ok(result) => println!("{}: {}", result.model_id, result.score),
///     Err(e) => println!("{} failed: {}", descriptor.id, e),
/// }
/// ```
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Provider family served by this adapter (matches `ModelDescriptor::provider_id`)
    fn provider_id(&self) -> &str;

    /// Check if adapter is usable (credentials configured, etc.)
    fn is_available(&self) -> bool {
        true
    }

    /// Whether this provider can take the content in its current form
    ///
    /// The registry declares kinds; this narrows by form (URL vs payload).
    /// The dispatcher never invokes a model whose adapter declines.
    fn accepts(&self, _content: &ContentReference) -> bool {
        true
    }

    /// Run one model against the content
    ///
    /// `deadline` is a hard upper bound on the call; exceeding it yields
    /// `AdapterErrorKind::Timeout`.
    async fn invoke(
        &self,
        content: &ContentReference,
        model: &ModelDescriptor,
        deadline: Instant,
    ) -> Result<ModelResult, AdapterError>;
}

/// Adapters keyed by provider id
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: HashMap<String, Arc<dyn ModelAdapter>>,
}

impl AdapterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the four built-in provider adapters from configuration
    ///
    /// Adapters without credentials are still registered; their invocations
    /// fail with `Unavailable`.
    pub fn from_config(providers: &ProvidersConfig) -> veritas_common::Result<Self> {
        Ok(Self::new()
            .with_adapter(Arc::new(HiveAdapter::new(&providers.hive)?))
            .with_adapter(Arc::new(SightengineAdapter::new(&providers.sightengine)?))
            .with_adapter(Arc::new(HuggingFaceAdapter::new(&providers.huggingface)?))
            .with_adapter(Arc::new(LlmAdapter::new(&providers.llm)?)))
    }

    /// Register an adapter, replacing any adapter for the same provider
    pub fn with_adapter(mut self, adapter: Arc<dyn ModelAdapter>) -> Self {
        self.adapters
            .insert(adapter.provider_id().to_string(), adapter);
        self
    }

    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn ModelAdapter>> {
        self.adapters.get(provider_id).cloned()
    }

    /// Registered provider ids, sorted
    pub fn providers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Build the HTTP client shared by one adapter's invocations
pub(crate) fn build_http_client() -> veritas_common::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| veritas_common::Error::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// Build an optional request quota (`None` or 0 = unlimited)
pub(crate) fn build_rate_limiter(requests_per_second: Option<u32>) -> Option<DirectRateLimiter> {
    requests_per_second
        .and_then(NonZeroU32::new)
        .map(|rps| governor::RateLimiter::direct(governor::Quota::per_second(rps)))
}

/// Trim a configured base URL, falling back to the provider default
pub(crate) fn base_url(configured: Option<&str>, default: &str) -> String {
    configured
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

/// Time left before `deadline`, or `Timeout` if none remains
pub(crate) fn remaining(deadline: Instant) -> Result<Duration, AdapterError> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        Err(AdapterError::timeout("deadline already passed"))
    } else {
        Ok(left)
    }
}

/// Run `future` with `deadline` as a hard bound
pub async fn within_deadline<F, T>(deadline: Instant, future: F) -> Result<T, AdapterError>
where
    F: Future<Output = Result<T, AdapterError>>,
{
    match tokio::time::timeout_at(deadline, future).await {
        Ok(outcome) => outcome,
        Err(_) => Err(AdapterError::timeout("invocation deadline exceeded")),
    }
}

/// Await the quota (if any) before sending
pub(crate) async fn acquire_quota(limiter: Option<&DirectRateLimiter>) {
    if let Some(limiter) = limiter {
        limiter.until_ready().await;
    }
}

/// Map a transport error to an adapter error
pub(crate) fn map_transport_error(provider: &str, err: reqwest::Error) -> AdapterError {
    if err.is_timeout() {
        AdapterError::timeout(format!("{} request timed out", provider))
    } else {
        AdapterError::provider(format!("{} request failed: {}", provider, err))
    }
}

/// Read the body of a successful response
///
/// Non-2xx statuses become `ProviderError` with a short body excerpt.
pub(crate) async fn read_success_body(
    provider: &str,
    response: reqwest::Response,
) -> Result<String, AdapterError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| map_transport_error(provider, e))?;

    if !status.is_success() {
        return Err(AdapterError::provider(format!(
            "{} returned {}: {}",
            provider,
            status,
            excerpt(&body)
        )));
    }
    Ok(body)
}

/// Multipart part for an uploaded payload
pub(crate) fn media_part(data: &[u8], mime_type: &str) -> Result<Part, AdapterError> {
    let extension = mime_type
        .split(';')
        .next()
        .and_then(|essence| essence.split('/').nth(1))
        .unwrap_or("bin");
    Part::bytes(data.to_vec())
        .file_name(format!("upload.{}", extension))
        .mime_str(mime_type)
        .map_err(|e| AdapterError::provider(format!("invalid MIME type '{}': {}", mime_type, e)))
}

/// Milliseconds elapsed since `started`
pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

pub(crate) fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(ERROR_BODY_EXCERPT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
