//! Configuration loader with environment variable expansion

use super::{Config, ConfigError};
use lazy_static::lazy_static;
use std::path::Path;

lazy_static! {
    // ${VAR} or ${VAR:-default}
    static ref ENV_VAR_PATTERN: regex_lite::Regex =
        regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}").unwrap();
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    ///
    /// The file is expanded, parsed, completed from `AWS_*` variables and
    /// validated before it is returned.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content);
        let config: Config = serde_yaml::from_str(&expanded)?;
        let config = config.with_env_fallback();
        config.validate()?;
        Ok(config)
    }

    /// Expand environment variables in a string.
    ///
    /// `${VAR}` keeps the placeholder when the variable is unset, so validation
    /// can report it; `${VAR:-default}` falls back to `default`.
    fn expand_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |cap: &regex_lite::Captures<'_>| {
                match std::env::var(&cap[1]) {
                    Ok(value) => value,
                    Err(_) => match cap.get(2) {
                        Some(default) => default.as_str().to_string(),
                        None => cap[0].to_string(),
                    },
                }
            })
            .into_owned()
    }
}
