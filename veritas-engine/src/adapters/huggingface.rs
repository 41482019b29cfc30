//! Hugging Face Inference Adapter
//!
//! Payloads are posted as the raw request body; URLs as `{"inputs": url}`.
//! Classification pipelines answer with `[{label, score}]` (some audio
//! pipelines nest it one level deeper). Labels are mapped to a risk score:
//! fake-like labels give their probability directly, real-like labels give
//! the complement, and unrecognized label sets fall back to the shared
//! keyword rule.

use super::{
    acquire_quota, base_url, build_http_client, build_rate_limiter, elapsed_ms, map_transport_error,
    read_success_body, remaining, scoring, within_deadline, DirectRateLimiter, ModelAdapter,
};
use crate::types::{AdapterError, ContentReference, ModelDescriptor, ModelResult};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::debug;
use veritas_common::config::ProviderConfig;

const HUGGINGFACE_API_URL: &str = "https://api-inference.huggingface.co";
const PROVIDER: &str = "huggingface";

/// Label tokens meaning "manipulated"
const FAKE_TOKENS: &[&str] = &[
    "fake", "deepfake", "spoof", "spoofed", "synthetic", "ai", "generated", "artificial", "manipulated",
];

/// Label tokens meaning "authentic"
const REAL_TOKENS: &[&str] = &["real", "bonafide", "bona", "genuine", "authentic", "human", "original"];

/// Tokens that flip the class of the token after them (`not_deepfake`, `non-human`)
const NEGATION_TOKENS: &[&str] = &["not", "non", "no"];

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Flat(Vec<LabelScore>),
    Nested(Vec<Vec<LabelScore>>),
}

impl ClassificationResponse {
    fn into_labels(self) -> Vec<LabelScore> {
        match self {
            ClassificationResponse::Flat(labels) => labels,
            ClassificationResponse::Nested(groups) => groups.into_iter().flatten().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LabelClass {
    Fake,
    Real,
    Other,
}

fn classify_label(label: &str) -> LabelClass {
    let lower = label.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let classes: Vec<LabelClass> = tokens
        .iter()
        .enumerate()
        .filter_map(|(i, token)| {
            let class = if FAKE_TOKENS.contains(token) {
                LabelClass::Fake
            } else if REAL_TOKENS.contains(token) {
                LabelClass::Real
            } else {
                return None;
            };
            let negated = i > 0 && NEGATION_TOKENS.contains(&tokens[i - 1]);
            Some(match (class, negated) {
                (LabelClass::Fake, true) => LabelClass::Real,
                (LabelClass::Real, true) => LabelClass::Fake,
                (class, _) => class,
            })
        })
        .collect();

    if classes.contains(&LabelClass::Fake) {
        LabelClass::Fake
    } else if classes.contains(&LabelClass::Real) {
        LabelClass::Real
    } else {
        LabelClass::Other
    }
}

pub struct HuggingFaceAdapter {
    api_key: Option<String>,
    base_url: String,
    client: Client,
    rate_limiter: Option<DirectRateLimiter>,
}

impl HuggingFaceAdapter {
    pub fn new(config: &ProviderConfig) -> veritas_common::Result<Self> {
        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: base_url(config.base_url.as_deref(), HUGGINGFACE_API_URL),
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
            .post(format!("{}/models/{}", self.base_url, model.provider_model))
            .bearer_auth(api_key);

        let request = match content {
            ContentReference::Url { url, .. } => {
                request.json(&serde_json::json!({ "inputs": url }))
            }
            ContentReference::Payload {
                data, mime_type, ..
            } => request
                .header(header::CONTENT_TYPE, mime_type.as_str())
                .body(data.to_vec()),
        };

        let response = request
            .timeout(remaining(deadline)?)
            .send()
            .await
            .map_err(|e| map_transport_error(PROVIDER, e))?;
        let body = read_success_body(PROVIDER, response).await?;

        let (score, analysis) = score_labels(&body)?;
        debug!(model_id = %model.id, score = score, "Hugging Face inference complete");

        Ok(ModelResult {
            model_id: model.id.clone(),
            model_name: model.display_name.clone(),
            score,
            processing_time_ms: elapsed_ms(started),
            artifacts: scoring::extract_artifacts(&analysis),
            analysis,
        })
    }
}

#[async_trait]
impl ModelAdapter for HuggingFaceAdapter {
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
            .ok_or_else(|| AdapterError::unavailable("Hugging Face API token not configured"))?;
        within_deadline(deadline, self.call(api_key, content, model, deadline)).await
    }
}

/// Convert a classification body into `(score, analysis)`
fn score_labels(body: &str) -> Result<(u8, String), AdapterError> {
    let labels = serde_json::from_str::<ClassificationResponse>(body)
        .map_err(|e| AdapterError::parse(format!("Failed to parse Hugging Face response: {}", e)))?
        .into_labels();

    if labels.is_empty() {
        return Err(AdapterError::parse("Hugging Face returned no labels"));
    }

    let summary = labels
        .iter()
        .map(|l| format!("{} {:.1}%", l.label, l.score * 100.0))
        .collect::<Vec<_>>()
        .join(", ");

    let top_of = |class: LabelClass| {
        labels
            .iter()
            .filter(|l| classify_label(&l.label) == class)
            .max_by(|a, b| a.score.total_cmp(&b.score))
    };

    let score = match (top_of(LabelClass::Fake), top_of(LabelClass::Real)) {
        (Some(fake), _) => scoring::probability_to_score(fake.score),
        (None, Some(real)) => scoring::probability_to_score(1.0 - real.score),
        (None, None) => Some(scoring::keyword_score(&summary)),
    }
    .ok_or_else(|| AdapterError::parse("Hugging Face returned a non-numeric score"))?;

    Ok((score, format!("Classifier labels: {}", summary)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AdapterErrorKind;

    #[test]
    fn test_label_classification() {
        assert_eq!(classify_label("Fake"), LabelClass::Fake);
        assert_eq!(classify_label("AI-generated"), LabelClass::Fake);
        assert_eq!(classify_label("bona-fide"), LabelClass::Real);
        assert_eq!(classify_label("Realism"), LabelClass::Other);
        assert_eq!(classify_label("LABEL_0"), LabelClass::Other);
    }

    #[test]
    fn test_negated_labels_flip_class() {
        assert_eq!(classify_label("not_deepfake"), LabelClass::Real);
        assert_eq!(classify_label("Non-Fake"), LabelClass::Real);
        assert_eq!(classify_label("non-human"), LabelClass::Fake);
        assert_eq!(classify_label("real_not_fake"), LabelClass::Real);
    }

    #[test]
    fn test_fake_label_scores_directly() {
        let body = r#"[{"label":"Fake","score":0.93},{"label":"Real","score":0.07}]"#;
        let (score, analysis) = score_labels(body).unwrap();
        assert_eq!(score, 93);
        assert!(analysis.contains("Fake 93.0%"));
    }

    #[test]
    fn test_real_only_scores_complement() {
        let body = r#"[{"label":"real","score":0.8}]"#;
        assert_eq!(score_labels(body).unwrap().0, 20);
    }

    #[test]
    fn test_nested_response_flattened() {
        let body = r#"[[{"label":"spoof","score":0.66},{"label":"bonafide","score":0.34}]]"#;
        assert_eq!(score_labels(body).unwrap().0, 66);
    }

    #[test]
    fn test_unknown_labels_use_keyword_rule() {
        let body = r#"[{"label":"LABEL_0","score":0.6},{"label":"LABEL_1","score":0.4}]"#;
        assert_eq!(score_labels(body).unwrap().0, scoring::BASELINE_SCORE as u8);
    }

    #[test]
    fn test_error_object_is_parse_error() {
        let err = score_labels(r#"{"error":"Model is loading"}"#).unwrap_err();
        assert_eq!(err.kind, AdapterErrorKind::ParseError);
    }

    #[test]
    fn test_empty_labels_is_parse_error() {
        assert!(score_labels("[]").is_err());
    }
}
