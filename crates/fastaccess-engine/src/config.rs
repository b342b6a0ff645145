//! Compiler configuration
//!
//! Loaded from defaults, the environment, or a flat TOML table.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable for [`CompilerConfig::generation_threshold`]
pub const ENV_THRESHOLD: &str = "FASTACCESS_THRESHOLD";
/// Environment variable for [`CompilerConfig::trace_enabled`]
pub const ENV_TRACE: &str = "FASTACCESS_TRACE";
/// Environment variable for [`CompilerConfig::trace_dir`]
pub const ENV_TRACE_DIR: &str = "FASTACCESS_TRACE_DIR";

/// Default member count at which callers switch to a generated accessor
pub const DEFAULT_GENERATION_THRESHOLD: usize = 3;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML parse error
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// An environment variable held an unusable value
    #[error("invalid value {value:?} for {name}")]
    InvalidEnv {
        /// Variable name
        name: &'static str,
        /// Value found
        value: String,
    },
}

/// Accessor compiler settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Callers generate an accessor once a type has at least this many
    /// members. The compiler itself never consults it.
    pub generation_threshold: usize,

    /// Persist every generated image through the debug sink
    pub trace_enabled: bool,

    /// Directory for the default file sink when tracing is enabled
    pub trace_dir: Option<PathBuf>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            generation_threshold: DEFAULT_GENERATION_THRESHOLD,
            trace_enabled: false,
            trace_dir: None,
        }
    }
}

impl CompilerConfig {
    /// Defaults overridden by `FASTACCESS_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_THRESHOLD) {
            config.generation_threshold = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_THRESHOLD,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(ENV_TRACE) {
            config.trace_enabled = parse_flag(&value).ok_or(ConfigError::InvalidEnv {
                name: ENV_TRACE,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(ENV_TRACE_DIR) {
            if !value.is_empty() {
                config.trace_dir = Some(PathBuf::from(value));
            }
        }
        Ok(config)
    }

    /// Parse a flat TOML table; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Whether a type with `member_count` members clears the threshold
    pub fn should_generate(&self, member_count: usize) -> bool {
        member_count >= self.generation_threshold
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.generation_threshold, 3);
        assert!(!config.trace_enabled);
        assert!(config.trace_dir.is_none());
    }

    #[test]
    fn test_should_generate_is_inclusive() {
        let config = CompilerConfig::default();
        assert!(!config.should_generate(2));
        assert!(config.should_generate(3));
        assert!(config.should_generate(40));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = CompilerConfig::from_lookup(lookup(&[
            (ENV_THRESHOLD, "10"),
            (ENV_TRACE, "yes"),
            (ENV_TRACE_DIR, "/tmp/fxasm"),
        ]))
        .unwrap();

        assert_eq!(config.generation_threshold, 10);
        assert!(config.trace_enabled);
        assert_eq!(config.trace_dir, Some(PathBuf::from("/tmp/fxasm")));
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = CompilerConfig::from_lookup(lookup(&[(ENV_THRESHOLD, "many")])).unwrap_err();
        assert!(err.to_string().contains(ENV_THRESHOLD));

        assert!(CompilerConfig::from_lookup(lookup(&[(ENV_TRACE, "maybe")])).is_err());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = CompilerConfig::from_toml_str("trace_enabled = true\n").unwrap();
        assert!(config.trace_enabled);
        assert_eq!(config.generation_threshold, DEFAULT_GENERATION_THRESHOLD);
    }

    #[test]
    fn test_from_toml_full() {
        let config = CompilerConfig::from_toml_str(
            r#"
            generation_threshold = 0
            trace_enabled = false
            trace_dir = "target/fxasm"
            "#,
        )
        .unwrap();
        assert_eq!(config.generation_threshold, 0);
        assert!(config.should_generate(0));
        assert_eq!(config.trace_dir, Some(PathBuf::from("target/fxasm")));
    }

    #[test]
    fn test_from_toml_unknown_key() {
        assert!(CompilerConfig::from_toml_str("threshold = 4").is_err());
    }
}
