//! Detection API handler
//!
//! POST /api/detect

use axum::{extract::State, routing::post, Json, Router};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    error::{ApiError, ApiResult},
    types::{ContentKind, ContentReference, EnhancedDetectionResult},
    AppState,
};

/// POST /api/detect request
///
/// Exactly one of `url` / `dataBase64`. `kind` applies to URLs only;
/// payload kinds come from `mimeType` or content sniffing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectRequest {
    pub url: Option<String>,
    pub data_base64: Option<String>,
    pub mime_type: Option<String>,
    pub kind: Option<String>,
    pub model_ids: Option<Vec<String>>,
    /// Overall deadline; capped at the configured deadline
    pub deadline_ms: Option<u64>,
}

/// POST /api/detect response
#[derive(Debug, Serialize)]
pub struct DetectResponse {
    #[serde(flatten)]
    pub result: EnhancedDetectionResult,
    /// e.g. "3 of 5 models responded"
    pub coverage: String,
}

impl DetectRequest {
    fn content(&self) -> ApiResult<ContentReference> {
        let declared_kind = self
            .kind
            .as_deref()
            .map(str::parse::<ContentKind>)
            .transpose()?;

        match (&self.url, &self.data_base64) {
            (Some(url), None) => match declared_kind {
                Some(kind) => Ok(ContentReference::from_url_with_kind(url.clone(), kind)),
                None => Ok(ContentReference::from_url(url.clone())?),
            },
            (None, Some(encoded)) => {
                let data = base64::engine::general_purpose::STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| ApiError::BadRequest(format!("dataBase64 is not valid base64: {}", e)))?;
                Ok(ContentReference::from_bytes(data, self.mime_type.as_deref())?)
            }
            (Some(_), Some(_)) => Err(ApiError::BadRequest(
                "provide either 'url' or 'dataBase64', not both".to_string(),
            )),
            (None, None) => Err(ApiError::BadRequest(
                "one of 'url' or 'dataBase64' is required".to_string(),
            )),
        }
    }

    fn deadline(&self, configured: Duration) -> ApiResult<Duration> {
        match self.deadline_ms {
            Some(0) => Err(ApiError::BadRequest("deadlineMs must be greater than zero".to_string())),
            Some(ms) => Ok(Duration::from_millis(ms).min(configured)),
            None => Ok(configured),
        }
    }
}

/// POST /api/detect
///
/// Runs the ensemble and returns the assembled result. Partial model
/// failures are listed in `failures`; total failure is 502 `NO_RESULTS`.
pub async fn detect(
    State(state): State<AppState>,
    Json(request): Json<DetectRequest>,
) -> ApiResult<Json<DetectResponse>> {
    let content = request.content()?;
    let deadline = request.deadline(state.engine.overall_deadline())?;

    let result = state
        .engine
        .detect_content_with_deadline(content, request.model_ids.as_deref(), deadline)
        .await?;

    Ok(Json(DetectResponse {
        coverage: result.coverage(),
        result,
    }))
}

/// Build detection routes
pub fn detect_routes() -> Router<AppState> {
    Router::new().route("/api/detect", post(detect))
}
