//! Configuration module for Clipdrop
//!
//! Handles loading of YAML configuration files (with environment variable
//! expansion) or building the configuration purely from the environment.
//! Everything is validated eagerly so a misconfigured service fails at startup
//! instead of at its first signing request.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Region variable consumed by the signing primitive.
pub const ENV_REGION: &str = "AWS_REGION";
/// Access key identifier variable.
pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
/// Secret access key variable.
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// Optional session token variable for temporary credentials.
pub const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

/// Longest expiry S3 accepts for a pre-signed URL (7 days).
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub issuance: IssuanceConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Build configuration from defaults plus the `AWS_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::default().with_env_fallback();
        config.validate()?;
        Ok(config)
    }

    /// Fill storage settings left unset with values from the environment.
    pub fn with_env_fallback(mut self) -> Self {
        let storage = &mut self.storage;
        fill_from_env(&mut storage.region, ENV_REGION);
        fill_from_env(&mut storage.access_key, ENV_ACCESS_KEY_ID);
        fill_from_env(&mut storage.secret_key, ENV_SECRET_ACCESS_KEY);
        fill_from_env(&mut storage.session_token, ENV_SESSION_TOKEN);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.socket_addr()?;

        if self.storage.bucket.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "storage.bucket cannot be empty".into(),
            ));
        }

        if self.storage.key_prefix.starts_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "storage.key_prefix '{}' must not start with '/'",
                self.storage.key_prefix
            )));
        }

        require_setting(&self.storage.region, "storage.region", ENV_REGION)?;
        require_setting(&self.storage.access_key, "storage.access_key", ENV_ACCESS_KEY_ID)?;
        require_setting(
            &self.storage.secret_key,
            "storage.secret_key",
            ENV_SECRET_ACCESS_KEY,
        )?;

        if let Some(ref endpoint) = self.storage.endpoint {
            if !is_valid_http_url(endpoint) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid storage endpoint '{}': must start with http:// or https://",
                    endpoint
                )));
            }
        }

        let expiry = self.issuance.expires_in_secs;
        if expiry == 0 || expiry > MAX_PRESIGN_EXPIRY_SECS {
            return Err(ConfigError::ValidationError(format!(
                "Invalid issuance.expires_in_secs {}: must be between 1 and {}",
                expiry, MAX_PRESIGN_EXPIRY_SECS
            )));
        }

        if self.issuance.content_type.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "issuance.content_type cannot be empty".into(),
            ));
        }

        if self.metrics.enabled {
            self.metrics.address.parse::<SocketAddr>().map_err(|e| {
                ConfigError::ValidationError(format!(
                    "Invalid metrics.address '{}': {}",
                    self.metrics.address, e
                ))
            })?;
        }

        Ok(())
    }
}

fn fill_from_env(slot: &mut Option<String>, var: &str) {
    if slot.as_deref().map_or(true, str::is_empty) {
        if let Ok(value) = std::env::var(var) {
            if !value.is_empty() {
                *slot = Some(value);
            }
        }
    }
}

fn require_setting(value: &Option<String>, field: &str, env: &str) -> Result<(), ConfigError> {
    match value.as_deref() {
        None | Some("") => Err(ConfigError::ValidationError(format!(
            "{} is not set (set it in the config file or via {})",
            field, env
        ))),
        // Placeholder left behind by ${VAR} expansion
        Some(v) if v.contains("${") => Err(ConfigError::ValidationError(format!(
            "{} references an undefined environment variable: {}",
            field, v
        ))),
        Some(_) => Ok(()),
    }
}

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_address")]
    pub address: String,
}

impl ServerConfig {
    /// Parse the bind address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.address.parse().map_err(|e| {
            ConfigError::ValidationError(format!(
                "Invalid server.address '{}': {}",
                self.address, e
            ))
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_server_address(),
        }
    }
}

fn default_server_address() -> String {
    "0.0.0.0:3000".to_string()
}

/// Object storage target and credentials
///
/// The bucket and key prefix are fixed for the lifetime of the service;
/// callers only ever supply the object name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
    /// Use path-style addressing (`endpoint/bucket/key`), needed by most
    /// S3-compatible stores.
    #[serde(default)]
    pub force_path_style: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            key_prefix: default_key_prefix(),
            region: None,
            endpoint: None,
            access_key: None,
            secret_key: None,
            session_token: None,
            force_path_style: false,
        }
    }
}

fn default_bucket() -> String {
    "user-uploaded-videos1".to_string()
}

fn default_key_prefix() -> String {
    "uploads/".to_string()
}

/// Upload URL issuance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuanceConfig {
    /// Lifetime of each issued URL. Default: 3600
    #[serde(default = "default_expires_in_secs")]
    pub expires_in_secs: u64,
    /// Content type the URL is signed for. Default: "video/mp4"
    #[serde(default = "default_content_type")]
    pub content_type: String,
    /// Prefix every object name with a generated UUID. Default: true
    #[serde(default = "default_unique_prefix")]
    pub unique_prefix: bool,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            expires_in_secs: default_expires_in_secs(),
            content_type: default_content_type(),
            unique_prefix: default_unique_prefix(),
        }
    }
}

fn default_expires_in_secs() -> u64 {
    3600
}

fn default_content_type() -> String {
    crate::MP4_MIME_TYPE.to_string()
}

fn default_unique_prefix() -> bool {
    true
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_address")]
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            address: default_metrics_address(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_address() -> String {
    "0.0.0.0:9090".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Default filter directive when RUST_LOG is not set. Default: "info"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
