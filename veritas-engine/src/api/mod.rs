//! HTTP API handlers for veritas-engine
//!
//! Thin JSON surface over `DetectionEngine`.

pub mod detect;
pub mod health;
pub mod models;

pub use detect::detect_routes;
pub use health::health_routes;
pub use models::model_routes;
