//! veritas-engine library interface
//!
//! Ensemble deepfake detection: fans one piece of content out to several
//! provider-hosted detection models, normalizes their answers to a 0-100
//! risk score and combines them into one verdict with an agreement analysis.

pub mod adapters;
pub mod api;
pub mod dispatcher;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod registry;
pub mod types;

pub use crate::engine::DetectionEngine;
pub use crate::error::{ApiError, ApiResult};
pub use crate::types::{
    ContentKind, ContentReference, DetectionError, EnhancedDetectionResult, ModelDescriptor,
    ModelResult,
};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DetectionEngine>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: Arc<DetectionEngine>) -> Self {
        Self {
            engine,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::detect_routes())
        .merge(api::model_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
