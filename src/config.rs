use crate::error::ContractError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for building validators
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    pub reader: ReaderConfig,
    pub cache: CacheConfig,
}

/// Settings for the default spec reader's HTTP client
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("openapi-contract/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// How loaded definitions are stored in an attached cache
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime handed to the cache store; `None` lets the store decide
    pub ttl_secs: Option<u64>,
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: None,
            key_prefix: "openapi-contract".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

impl ContractConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ContractError> {
        serde_yaml::from_str(text).map_err(|e| ContractError::Config(e.to_string()))
    }

    pub fn from_json_str(text: &str) -> Result<Self, ContractError> {
        serde_json::from_str(text).map_err(|e| ContractError::Config(e.to_string()))
    }

    /// Loads configuration from a file; `.json` files are parsed as JSON,
    /// everything else as YAML
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let text = fs::read_to_string(path).map_err(|e| {
            ContractError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ContractConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config.reader.timeout_secs, 30);
        assert_eq!(config.cache.key_prefix, "openapi-contract");
        assert!(config.cache.ttl().is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let yaml = "reader:\n  timeout_secs: 5\ncache:\n  ttl_secs: 60\n";
        let config = ContractConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.reader.timeout_secs, 5);
        assert!(config.reader.user_agent.starts_with("openapi-contract/"));
        assert_eq!(config.cache.ttl(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn reads_json_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.json");
        fs::write(&path, r#"{"cache":{"key_prefix":"svc"}}"#).unwrap();

        let config = ContractConfig::from_path(&path).unwrap();
        assert_eq!(config.cache.key_prefix, "svc");
    }

    #[test]
    fn malformed_config_is_rejected() {
        let err = ContractConfig::from_yaml_str("reader: [1, 2").unwrap_err();
        assert!(matches!(err, ContractError::Config(_)));
    }
}
