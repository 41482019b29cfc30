//! Model catalog API handlers
//!
//! GET /api/models, GET /api/models/best, GET /api/models/:id

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    types::{ContentKind, ModelDescriptor},
    AppState,
};

/// `?kind=` filter
#[derive(Debug, Default, Deserialize)]
pub struct KindQuery {
    pub kind: Option<String>,
}

impl KindQuery {
    fn parse_kind(&self) -> ApiResult<Option<ContentKind>> {
        self.kind
            .as_deref()
            .map(|k| k.parse::<ContentKind>())
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}

/// GET /api/models
///
/// All descriptors, or only those supporting `kind`.
pub async fn list_models(
    State(state): State<AppState>,
    Query(query): Query<KindQuery>,
) -> ApiResult<Json<Vec<ModelDescriptor>>> {
    let registry = state.engine.registry();
    let models = match query.parse_kind()? {
        Some(kind) => registry.list_models(kind).into_iter().cloned().collect(),
        None => registry.all().to_vec(),
    };
    Ok(Json(models))
}

/// GET /api/models/best?kind=
pub async fn best_model(
    State(state): State<AppState>,
    Query(query): Query<KindQuery>,
) -> ApiResult<Json<ModelDescriptor>> {
    let kind = query
        .parse_kind()?
        .ok_or_else(|| ApiError::BadRequest("query parameter 'kind' is required".to_string()))?;
    let model = state.engine.registry().best_for(kind)?;
    Ok(Json(model.clone()))
}

/// GET /api/models/:id
pub async fn describe_model(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
) -> ApiResult<Json<ModelDescriptor>> {
    let model = state.engine.registry().describe(&model_id)?;
    Ok(Json(model.clone()))
}

/// Build model catalog routes
pub fn model_routes() -> Router<AppState> {
    Router::new()
        .route("/api/models", get(list_models))
        .route("/api/models/best", get(best_model))
        .route("/api/models/:id", get(describe_model))
}
