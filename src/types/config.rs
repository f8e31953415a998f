//! Configuration structures.
//!
//! Configuration is deserialized from any serde source (every section falls
//! back to its defaults) and can be overlaid from environment variables with
//! [`Config::from_env`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Global dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Dispatch pipeline configuration.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Bearer token configuration.
    #[serde(default)]
    pub tokens: TokenConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Defaults overlaid with `DISPATCH_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("DISPATCH_VALIDATE_PERMISSIONS") {
            config.dispatch.validate_permissions = !matches!(
                value.to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
        if let Ok(dir) = std::env::var("DISPATCH_UPLOAD_DIR") {
            if !dir.is_empty() {
                config.dispatch.upload_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(level) = std::env::var("DISPATCH_LOG_LEVEL") {
            config.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("DISPATCH_LOG_FORMAT") {
            config.observability.json_logs = format.eq_ignore_ascii_case("json");
        }

        config
    }
}

/// Dispatch pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Global permission switch. When false the permission gate never
    /// consults the validator.
    pub validate_permissions: bool,

    /// Directory for persisted uploads (OS temp dir when unset).
    pub upload_dir: Option<PathBuf>,

    /// File name prefix for persisted uploads.
    pub upload_prefix: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            validate_permissions: true,
            upload_dir: None,
            upload_prefix: "upload-".to_string(),
        }
    }
}

impl DispatchConfig {
    /// Effective upload directory.
    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Bearer token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Lifetime of issued tokens.
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            token_ttl: Duration::from_secs(60 * 60),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
