//! Hive Adapter
//!
//! Synchronous task API. URLs are sent as a form field, payloads as a
//! multipart `media` part. The response carries per-class probabilities for
//! each analyzed frame (one frame for images). Artifacts come from the
//! names of classes above the notable probability (generator sources such
//! as `midjourney`); plain deepfake classes carry the placeholder.
//!
//! # API Reference
//! - Endpoint: `POST {base}/api/v2/task/sync`
//! - Auth: `Authorization: Token <api_key>`

use super::{
    acquire_quota, base_url, build_http_client, build_rate_limiter, elapsed_ms, map_transport_error,
    media_part, read_success_body, remaining, scoring, within_deadline, DirectRateLimiter,
    ModelAdapter,
};
use crate::types::{AdapterError, ContentReference, ModelDescriptor, ModelResult};
use async_trait::async_trait;
use reqwest::{header, multipart::Form, Client};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::debug;
use veritas_common::config::ProviderConfig;

const HIVE_API_URL: &str = "https://api.thehive.ai";
const PROVIDER: &str = "hive";

/// Classes above this probability are listed in the analysis text
const NOTABLE_CLASS_PROBABILITY: f64 = 0.5;

#[derive(Debug, Deserialize)]
struct HiveResponse {
    status: Vec<HiveStatus>,
}

#[derive(Debug, Deserialize)]
struct HiveStatus {
    response: HiveTaskResponse,
}

#[derive(Debug, Deserialize)]
struct HiveTaskResponse {
    output: Vec<HiveFrame>,
}

#[derive(Debug, Deserialize)]
struct HiveFrame {
    classes: Vec<HiveClass>,
}

#[derive(Debug, Deserialize)]
struct HiveClass {
    class: String,
    score: f64,
}

/// Highest probability for `target_class` across all frames
#[derive(Debug, PartialEq)]
struct HiveVerdict {
    score: u8,
    frames: usize,
    notable_classes: Vec<String>,
}

pub struct HiveAdapter {
    api_key: Option<String>,
    base_url: String,
    client: Client,
    rate_limiter: Option<DirectRateLimiter>,
}

impl HiveAdapter {
    pub fn new(config: &ProviderConfig) -> veritas_common::Result<Self> {
        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: base_url(config.base_url.as_deref(), HIVE_API_URL),
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
        acquire_quota(self.rate_limiter.as_ref()).await;

        let request = self
            .client
            .post(format!("{}/api/v2/task/sync", self.base_url))
            .header(header::AUTHORIZATION, format!("Token {}", api_key))
            .header(header::ACCEPT, "application/json");

        let request = match content {
            ContentReference::Url { url, .. } => request.form(&[("url", url.as_str())]),
            ContentReference::Payload {
                data, mime_type, ..
            } => request.multipart(Form::new().part("media", media_part(data, mime_type)?)),
        };

        let response = request
            .timeout(remaining(deadline)?)
            .send()
            .await
            .map_err(|e| map_transport_error(PROVIDER, e))?;
        let body = read_success_body(PROVIDER, response).await?;

        let verdict = parse_verdict(&body, &model.provider_model)?;
        debug!(
            model_id = %model.id,
            score = verdict.score,
            frames = verdict.frames,
            "Hive classification complete"
        );

        let analysis = if verdict.notable_classes.is_empty() {
            format!(
                "Hive '{}' probability {}% across {} frame(s); no class above {}%",
                model.provider_model,
                verdict.score,
                verdict.frames,
                (NOTABLE_CLASS_PROBABILITY * 100.0) as u8
            )
        } else {
            format!(
                "Hive '{}' probability {}% across {} frame(s); notable classes: {}",
                model.provider_model,
                verdict.score,
                verdict.frames,
                verdict.notable_classes.join(", ")
            )
        };

        Ok(ModelResult {
            model_id: model.id.clone(),
            model_name: model.display_name.clone(),
            score: verdict.score,
            processing_time_ms: elapsed_ms(started),
            artifacts: scoring::extract_artifacts_from_labels(
                verdict.notable_classes.iter().map(String::as_str),
            ),
            analysis,
        })
    }
}

#[async_trait]
impl ModelAdapter for HiveAdapter {
    fn provider_id(&self) -> &str {
        PROVIDER
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
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
            .ok_or_else(|| AdapterError::unavailable("Hive API key not configured"))?;
        within_deadline(deadline, self.call(api_key, content, model, deadline)).await
    }
}

fn parse_verdict(body: &str, target_class: &str) -> Result<HiveVerdict, AdapterError> {
    let response: HiveResponse = serde_json::from_str(body)
        .map_err(|e| AdapterError::parse(format!("Failed to parse Hive response: {}", e)))?;

    let frames: Vec<&HiveFrame> = response
        .status
        .iter()
        .flat_map(|s| s.response.output.iter())
        .collect();

    let mut best: Option<f64> = None;
    let mut notable_classes: Vec<String> = Vec::new();
    for class in frames.iter().flat_map(|f| f.classes.iter()) {
        if class.class == target_class {
            best = Some(best.map_or(class.score, |b| b.max(class.score)));
        }
        if class.score > NOTABLE_CLASS_PROBABILITY && !notable_classes.contains(&class.class) {
            notable_classes.push(class.class.clone());
        }
    }

    let probability = best.ok_or_else(|| {
        AdapterError::parse(format!("Hive response has no '{}' class", target_class))
    })?;
    let score = scoring::probability_to_score(probability)
        .ok_or_else(|| AdapterError::parse("Hive returned a non-numeric probability"))?;

    Ok(HiveVerdict {
        score,
        frames: frames.len(),
        notable_classes,
    })
}
