//! Configuration file parsing for the server.
//!
//! Loads bind settings and upstream model parameters from TOML. The
//! upstream credential is never read from the file; it is supplied through
//! the `GEMINI_API_KEY` environment variable.

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tac_llm::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use tac_llm::{GeminiConfig, SamplingParams};
use tac_store::DEFAULT_MAX_ENTRIES;
use thiserror::Error;

/// Environment variable holding the upstream API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Field present but out of range
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port (e.g., 3001)
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Upstream model settings
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Ledger retention settings
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Ledger retention settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Verifications and logs kept each; older entries are evicted
    pub max_entries: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Upstream generation settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// API base URL
    pub api_base: String,

    /// Model name
    pub model: String,

    /// Sampling temperature [0.0, 2.0]
    pub temperature: f32,

    /// Nucleus sampling threshold (0.0, 1.0]
    pub top_p: f32,

    /// Top-k cutoff (>= 1)
    pub top_k: u32,

    /// Output token cap (>= 1)
    pub max_output_tokens: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Enable Google Search grounding and return cited sources
    pub grounding: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        let sampling = SamplingParams::default();
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            top_k: sampling.top_k,
            max_output_tokens: sampling.max_output_tokens,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            grounding: false,
        }
    }
}

impl UpstreamConfig {
    /// Provider configuration for these settings
    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            api_base: self.api_base.clone(),
            model: self.model.clone(),
            sampling: SamplingParams {
                temperature: self.temperature,
                top_p: self.top_p,
                top_k: self.top_k,
                max_output_tokens: self.max_output_tokens,
            },
            timeout_secs: self.timeout_secs,
            grounding: self.grounding,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base.is_empty() {
            return Err(ConfigError::Invalid("upstream.api_base must not be empty".into()));
        }
        if self.model.is_empty() {
            return Err(ConfigError::Invalid("upstream.model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid("upstream.temperature must be in [0, 2]".into()));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(ConfigError::Invalid("upstream.top_p must be in (0, 1]".into()));
        }
        if self.top_k == 0 {
            return Err(ConfigError::Invalid("upstream.top_k must be at least 1".into()));
        }
        if self.max_output_tokens == 0 {
            return Err(ConfigError::Invalid(
                "upstream.max_output_tokens must be at least 1".into(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("upstream.timeout_secs must be at least 1".into()));
        }
        Ok(())
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

/// Port the dev frontend expects the proxy on
fn default_bind_port() -> u16 {
    3001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            upstream: UpstreamConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.is_empty() {
            return Err(ConfigError::Invalid("bind_address must not be empty".into()));
        }
        if self.ledger.max_entries == 0 {
            return Err(ConfigError::Invalid("ledger.max_entries must be at least 1".into()));
        }
        self.upstream.validate()
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

/// Upstream API credential
///
/// `Debug` output is redacted so the key never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key; empty values count as not configured
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// The raw key, for the upstream request only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.bind_port, 3001);
        assert_eq!(config.upstream.model, "gemini-2.0-flash-exp");
        assert_eq!(config.upstream.top_k, 40);
        assert!(!config.upstream.grounding);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:3001");
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            bind_address = "0.0.0.0"
            bind_port = 9000

            [upstream]
            model = "gemini-1.5-pro"
            temperature = 0.2
            grounding = true
        "#;

        let config = ServerConfig::from_toml(toml).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.bind_port, 9000);
        assert_eq!(config.upstream.model, "gemini-1.5-pro");
        assert_eq!(config.upstream.temperature, 0.2);
        assert!(config.upstream.grounding);
        // Unspecified fields keep their defaults
        assert_eq!(config.upstream.max_output_tokens, 1024);
        assert_eq!(config.upstream.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config.bind_port, 3001);
        assert_eq!(config.upstream, UpstreamConfig::default());
    }

    #[test]
    fn test_invalid_sampling_rejected() {
        let result = ServerConfig::from_toml("[upstream]\ntop_p = 1.5\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = ServerConfig::from_toml("[upstream]\ntimeout_secs = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_ledger_retention() {
        assert_eq!(ServerConfig::default().ledger.max_entries, DEFAULT_MAX_ENTRIES);

        let config = ServerConfig::from_toml("[ledger]\nmax_entries = 25\n").unwrap();
        assert_eq!(config.ledger.max_entries, 25);

        let result = ServerConfig::from_toml("[ledger]\nmax_entries = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result = ServerConfig::from_toml("bind_port = \"not a number\"");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_gemini_config_mapping() {
        let upstream = UpstreamConfig {
            grounding: true,
            top_k: 20,
            ..Default::default()
        };
        let gemini = upstream.gemini_config();
        assert!(gemini.grounding);
        assert_eq!(gemini.sampling.top_k, 20);
        assert_eq!(gemini.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_api_key_empty_is_absent() {
        assert!(ApiKey::new("").is_none());
        let key = ApiKey::new("abc123").unwrap();
        assert_eq!(key.expose(), "abc123");
    }

    #[test]
    fn test_api_key_debug_redacted() {
        let key = ApiKey::new("super-secret").unwrap();
        let debug = format!("{:?}", key);
        assert!(!debug.contains("super-secret"));
    }
}
