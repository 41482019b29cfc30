//! # Veritas Common Library
//!
//! Shared code for the Veritas detection engine and its binaries:
//! - Common error type
//! - Configuration model and TOML/ENV resolution
//! - Ensemble policy thresholds

pub mod config;
pub mod error;

pub use config::{EnsemblePolicy, VeritasConfig};
pub use error::{Error, Result};
