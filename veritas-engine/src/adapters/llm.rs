//! LLM Forensics Adapter
//!
//! OpenAI-compatible chat completions with a forensic system prompt. Image
//! payloads are embedded as base64 data URLs, image URLs are passed through,
//! text payloads are inlined (truncated). The model answers in free text; an
//! explicit `risk score: N` line is honored, otherwise the shared keyword
//! rule derives the score.

use super::{
    acquire_quota, base_url, build_http_client, build_rate_limiter, elapsed_ms, map_transport_error,
    read_success_body, remaining, scoring, within_deadline, DirectRateLimiter, ModelAdapter,
};
use crate::types::{
    AdapterError, AdapterErrorKind, ContentKind, ContentReference, ModelDescriptor, ModelResult,
};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::debug;
use veritas_common::config::ProviderConfig;

const LLM_API_URL: &str = "https://api.openai.com";
const PROVIDER: &str = "llm";

/// Longest inline text sent to the model, in characters
const MAX_TEXT_CHARS: usize = 20_000;

const SYSTEM_PROMPT: &str = "You are a media forensics analyst. Assess whether the supplied content \
is authentic or synthetically manipulated. Describe concrete evidence (lighting, blending \
boundaries, texture, compression, repetitive phrasing, etc.). End with a line of the form \
'Risk score: N' where N is 0-100 and higher means more likely manipulated.";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

pub struct LlmAdapter {
    api_key: Option<String>,
    base_url: String,
    client: Client,
    rate_limiter: Option<DirectRateLimiter>,
}

impl LlmAdapter {
    pub fn new(config: &ProviderConfig) -> veritas_common::Result<Self> {
        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: base_url(config.base_url.as_deref(), LLM_API_URL),
            client: build_http_client()?,
            rate_limiter: build_rate_limiter(config.requests_per_second),
        })
    }

    async fn call(
        &self,
        api_key: &str,
        content: &ContentReference,
        model: &ModelDescriptor,
        deadline: Instant,
    ) -> Result<ModelResult, AdapterError> {
        let started = Instant::now();
        let user_content = build_user_content(content)?;
        acquire_quota(self.rate_limiter.as_ref()).await;

        let payload = json!({
            "model": model.provider_model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_content },
            ],
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&payload)
            .timeout(remaining(deadline)?)
            .send()
            .await
            .map_err(|e| map_transport_error(PROVIDER, e))?;
        let body = read_success_body(PROVIDER, response).await?;

        let verdict = extract_verdict(&body)?;
        let score = parse_explicit_score(&verdict).unwrap_or_else(|| scoring::keyword_score(&verdict));
        debug!(model_id = %model.id, score = score, "LLM verdict received");

        Ok(ModelResult {
            model_id: model.id.clone(),
            model_name: model.display_name.clone(),
            score,
            processing_time_ms: elapsed_ms(started),
            artifacts: scoring::extract_artifacts(&verdict),
            analysis: verdict,
        })
    }
}

#[async_trait]
impl ModelAdapter for LlmAdapter {
    fn provider_id(&self) -> &str {
        PROVIDER
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Images by URL or payload; text only inline
    fn accepts(&self, content: &ContentReference) -> bool {
        matches!(
            content,
            ContentReference::Url {
                kind: ContentKind::Image,
                ..
            } | ContentReference::Payload {
                kind: ContentKind::Image | ContentKind::Text,
                ..
            }
        )
    }

    async fn invoke(
        &self,
        content: &ContentReference,
        model: &ModelDescriptor,
        deadline: Instant,
    ) -> Result<ModelResult, AdapterError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AdapterError::unavailable("LLM API key not configured"))?;
        within_deadline(deadline, self.call(api_key, content, model, deadline)).await
    }
}

/// Build the user message content parts
fn build_user_content(content: &ContentReference) -> Result<Value, AdapterError> {
    match content {
        ContentReference::Url {
            url,
            kind: ContentKind::Image,
        } => Ok(json!([
            { "type": "text", "text": "Analyze this image for signs of manipulation." },
            { "type": "image_url", "image_url": { "url": url } },
        ])),
        ContentReference::Payload {
            data,
            mime_type,
            kind: ContentKind::Image,
        } => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(data);
            Ok(json!([
                { "type": "text", "text": "Analyze this image for signs of manipulation." },
                { "type": "image_url", "image_url": { "url": format!("data:{};base64,{}", mime_type, encoded) } },
            ]))
        }
        ContentReference::Payload {
            data,
            kind: ContentKind::Text,
            ..
        } => {
            let text = String::from_utf8_lossy(data);
            let truncated: String = text.chars().take(MAX_TEXT_CHARS).collect();
            Ok(json!([
                { "type": "text", "text": format!("Was the following text machine-generated or manipulated?\n\n{}", truncated) },
            ]))
        }
        ContentReference::Url {
            kind: ContentKind::Text,
            ..
        } => Err(AdapterError::new(
            AdapterErrorKind::UnsupportedContent,
            "LLM text analysis requires the text inline, not a URL",
        )),
        other => Err(AdapterError::new(
            AdapterErrorKind::UnsupportedContent,
            format!("LLM adapter cannot analyze {} content", other.kind()),
        )),
    }
}

fn extract_verdict(body: &str) -> Result<String, AdapterError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| AdapterError::parse(format!("Failed to parse chat completion: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| AdapterError::parse("Chat completion has no message content"))
}

/// Find an explicit "risk score: N" (case-insensitive, 0-100)
fn parse_explicit_score(text: &str) -> Option<u8> {
    const MARKER: &str = "risk score";
    let lower = text.to_lowercase();
    let start = lower.rfind(MARKER)? + MARKER.len();

    let digits: String = lower[start..]
        .trim_start_matches(|c: char| c == ':' || c == '=' || c.is_whitespace())
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();

    digits.parse::<u8>().ok().filter(|score| *score <= 100)
}
