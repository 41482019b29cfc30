//! Sightengine Adapter
//!
//! `check.json` endpoint. URLs go as query parameters on a GET, payloads as
//! a multipart POST. Credentials are an `api_user`/`api_secret` pair.
//! A `"status": "failure"` body is a provider error even on HTTP 200.
//! Responses carry a bare probability, so results always hold the
//! no-artifacts placeholder.

use super::{
    acquire_quota, base_url, build_http_client, build_rate_limiter, elapsed_ms, map_transport_error,
    media_part, read_success_body, remaining, scoring, within_deadline, DirectRateLimiter,
    ModelAdapter,
};
use crate::types::{AdapterError, ContentReference, ModelDescriptor, ModelResult};
use async_trait::async_trait;
use reqwest::{multipart::Form, Client};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::time::Instant;
use tracing::debug;
use veritas_common::config::ProviderConfig;

const SIGHTENGINE_API_URL: &str = "https://api.sightengine.com";
const PROVIDER: &str = "sightengine";

#[derive(Debug, Deserialize)]
struct SightengineResponse {
    status: String,
    #[serde(rename = "type", default)]
    types: HashMap<String, serde_json::Value>,
    error: Option<SightengineError>,
}

#[derive(Debug, Deserialize)]
struct SightengineError {
    message: String,
}

pub struct SightengineAdapter {
    api_user: Option<String>,
    api_secret: Option<String>,
    base_url: String,
    client: Client,
    rate_limiter: Option<DirectRateLimiter>,
}

impl SightengineAdapter {
    pub fn new(config: &ProviderConfig) -> veritas_common::Result<Self> {
        Ok(Self {
            api_user: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            base_url: base_url(config.base_url.as_deref(), SIGHTENGINE_API_URL),
            client: build_http_client()?,
            rate_limiter: build_rate_limiter(config.requests_per_second),
        })
    }

    async fn call(
        &self,
        (api_user, api_secret): (&str, &str),
        content: &ContentReference,
        model: &ModelDescriptor,
        deadline: Instant,
    ) -> Result<ModelResult, AdapterError> {
        let started = Instant::now();
        acquire_quota(self.rate_limiter.as_ref()).await;

        let endpoint = format!("{}/1.0/check.json", self.base_url);
        let models = model.provider_model.as_str();
        let request = match content {
            ContentReference::Url { url, .. } => self.client.get(&endpoint).query(&[
                ("models", models),
                ("api_user", api_user),
                ("api_secret", api_secret),
                ("url", url.as_str()),
            ]),
            ContentReference::Payload {
                data, mime_type, ..
            } => {
                let form = Form::new()
                    .text("models", models.to_string())
                    .text("api_user", api_user.to_string())
                    .text("api_secret", api_secret.to_string())
                    .part("media", media_part(data, mime_type)?);
                self.client.post(&endpoint).multipart(form)
            }
        };

        let response = request
            .timeout(remaining(deadline)?)
            .send()
            .await
            .map_err(|e| map_transport_error(PROVIDER, e))?;
        let body = read_success_body(PROVIDER, response).await?;

        let probability = parse_probability(&body, response_key(models))?;
        let score = scoring::probability_to_score(probability)
            .ok_or_else(|| AdapterError::parse("Sightengine returned a non-numeric probability"))?;
        debug!(model_id = %model.id, score = score, "Sightengine check complete");

        let analysis = format!(
            "Sightengine '{}' model reports {}% likelihood of manipulation",
            models, score
        );
        Ok(ModelResult {
            model_id: model.id.clone(),
            model_name: model.display_name.clone(),
            score,
            processing_time_ms: elapsed_ms(started),
            artifacts: vec![scoring::NO_ARTIFACTS_PLACEHOLDER.to_string()],
            analysis,
        })
    }
}

#[async_trait]
impl ModelAdapter for SightengineAdapter {
    fn provider_id(&self) -> &str {
        PROVIDER
    }

    fn is_available(&self) -> bool {
        self.api_user.is_some() && self.api_secret.is_some()
    }

    async fn invoke(
        &self,
        content: &ContentReference,
        model: &ModelDescriptor,
        deadline: Instant,
    ) -> Result<ModelResult, AdapterError> {
        let credentials = match (self.api_user.as_deref(), self.api_secret.as_deref()) {
            (Some(user), Some(secret)) => (user, secret),
            _ => {
                return Err(AdapterError::unavailable(
                    "Sightengine api_user/api_secret not configured",
                ))
            }
        };
        within_deadline(deadline, self.call(credentials, content, model, deadline)).await
    }
}

/// Key of the `type` object holding the probability for a request model
fn response_key(provider_model: &str) -> &str {
    match provider_model {
        "genai" => "ai_generated",
        other => other,
    }
}

fn parse_probability(body: &str, key: &str) -> Result<f64, AdapterError> {
    let response: SightengineResponse = serde_json::from_str(body)
        .map_err(|e| AdapterError::parse(format!("Failed to parse Sightengine response: {}", e)))?;

    if response.status != "success" {
        let message = response
            .error
            .map(|e| e.message)
            .unwrap_or_else(|| format!("status '{}'", response.status));
        return Err(AdapterError::provider(format!("Sightengine failure: {}", message)));
    }

    response
        .types
        .get(key)
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| AdapterError::parse(format!("Sightengine response has no type.{}", key)))
}
