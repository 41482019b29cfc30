//! Configuration loading and credential resolution
//!
//! Config file resolution order:
//! 1. Command-line argument (highest priority)
//! 2. `VERITAS_CONFIG` environment variable
//! 3. `<config_dir>/veritas/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! Provider credentials resolve ENV → TOML.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "VERITAS_CONFIG";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VeritasConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub engine: EngineSettings,
    pub policy: EnsemblePolicy,
    pub providers: ProvidersConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5790".to_string(),
        }
    }
}

/// Logging settings (overridden by `RUST_LOG` when set)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Dispatcher deadlines, retries and default model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Overall per-request deadline
    pub overall_deadline_ms: u64,
    /// Bounded wait for cancelled invocations to settle after the deadline
    pub cancellation_grace_ms: u64,
    /// Per-invocation default timeout for `fast` models
    pub fast_timeout_ms: u64,
    /// Per-invocation default timeout for `medium` models
    pub medium_timeout_ms: u64,
    /// Per-invocation default timeout for `slow` models
    pub slow_timeout_ms: u64,
    /// Extra attempts for Timeout/ProviderError failures (0 = no retries)
    pub max_retries: u32,
    /// Models used when the caller does not name any
    pub default_models: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            overall_deadline_ms: 30_000,
            cancellation_grace_ms: 250,
            fast_timeout_ms: 10_000,
            medium_timeout_ms: 20_000,
            slow_timeout_ms: 45_000,
            max_retries: 0,
            default_models: Vec::new(),
        }
    }
}

impl EngineSettings {
    pub fn overall_deadline(&self) -> Duration {
        Duration::from_millis(self.overall_deadline_ms)
    }

    pub fn cancellation_grace(&self) -> Duration {
        Duration::from_millis(self.cancellation_grace_ms)
    }
}

/// Ensemble decision thresholds, all on the 0-100 scale
///
/// Defaults are policy, not calibrated constants. The qualitative ordering
/// must hold: `accept_threshold < reject_threshold` and
/// `medium_confidence_threshold <= high_confidence_threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsemblePolicy {
    /// Minimum agreement score for consensus
    pub consensus_threshold: u8,
    /// Minimum overall score for a `reject` recommendation
    pub reject_threshold: u8,
    /// Maximum overall score for an `accept` recommendation
    pub accept_threshold: u8,
    /// Minimum agreement score for `high` confidence
    pub high_confidence_threshold: u8,
    /// Minimum agreement score for `medium` confidence
    pub medium_confidence_threshold: u8,
    /// Overall scores strictly above this are flagged as deepfakes
    pub deepfake_threshold: u8,
}

impl Default for EnsemblePolicy {
    fn default() -> Self {
        Self {
            consensus_threshold: 70,
            reject_threshold: 80,
            accept_threshold: 30,
            high_confidence_threshold: 80,
            medium_confidence_threshold: 50,
            deepfake_threshold: 50,
        }
    }
}

impl EnsemblePolicy {
    /// Validate threshold ranges and ordering
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("consensus_threshold", self.consensus_threshold),
            ("reject_threshold", self.reject_threshold),
            ("accept_threshold", self.accept_threshold),
            ("high_confidence_threshold", self.high_confidence_threshold),
            ("medium_confidence_threshold", self.medium_confidence_threshold),
            ("deepfake_threshold", self.deepfake_threshold),
        ];
        for (name, value) in fields {
            if value > 100 {
                return Err(Error::Config(format!(
                    "policy.{} must be within 0-100 (got {})",
                    name, value
                )));
            }
        }

        if self.accept_threshold >= self.reject_threshold {
            return Err(Error::Config(format!(
                "policy.accept_threshold ({}) must be below policy.reject_threshold ({})",
                self.accept_threshold, self.reject_threshold
            )));
        }

        if self.medium_confidence_threshold > self.high_confidence_threshold {
            return Err(Error::Config(format!(
                "policy.medium_confidence_threshold ({}) must not exceed policy.high_confidence_threshold ({})",
                self.medium_confidence_threshold, self.high_confidence_threshold
            )));
        }

        Ok(())
    }
}

/// Per-provider connection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    /// Second credential for providers that use a user/secret pair
    pub api_secret: Option<String>,
    /// Override of the provider's public endpoint (testing, proxies)
    pub base_url: Option<String>,
    /// Request quota; unlimited when absent
    pub requests_per_second: Option<u32>,
}

/// Connection settings for every provider family
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub hive: ProviderConfig,
    pub sightengine: ProviderConfig,
    pub huggingface: ProviderConfig,
    pub llm: ProviderConfig,
}

impl VeritasConfig {
    /// Overlay provider credentials from environment variables
    pub fn apply_env_credentials(&mut self) {
        let providers = &mut self.providers;
        providers.hive.api_key =
            resolve_credential("hive", "VERITAS_HIVE_API_KEY", providers.hive.api_key.take());
        providers.sightengine.api_key = resolve_credential(
            "sightengine",
            "VERITAS_SIGHTENGINE_API_KEY",
            providers.sightengine.api_key.take(),
        );
        providers.sightengine.api_secret = resolve_credential(
            "sightengine",
            "VERITAS_SIGHTENGINE_API_SECRET",
            providers.sightengine.api_secret.take(),
        );
        providers.huggingface.api_key = resolve_credential(
            "huggingface",
            "VERITAS_HUGGINGFACE_API_KEY",
            providers.huggingface.api_key.take(),
        );
        providers.llm.api_key =
            resolve_credential("llm", "VERITAS_LLM_API_KEY", providers.llm.api_key.take());
    }
}

/// Locate the config file following the documented priority order
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("veritas").join("config.toml"))
        .filter(|p| p.exists())
}

/// Read, parse and validate a TOML config file
pub fn load_config(path: &Path) -> Result<VeritasConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: VeritasConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    config.policy.validate()?;
    if config.engine.overall_deadline_ms == 0 {
        return Err(Error::Config(
            "engine.overall_deadline_ms must be greater than zero".to_string(),
        ));
    }

    Ok(config)
}

/// Resolve one credential with ENV taking priority over TOML
pub fn resolve_credential(
    provider: &str,
    env_var: &str,
    toml_value: Option<String>,
) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v));

    match (env_value, toml_value) {
        (Some(env), Some(_)) => {
            warn!(
                provider = provider,
                "Credential {} set in both environment and TOML. Using environment.", env_var
            );
            Some(env)
        }
        (Some(env), None) => Some(env),
        (None, toml) => toml,
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
