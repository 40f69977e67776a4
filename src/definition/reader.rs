use super::Format;
use crate::config::ReaderConfig;
use crate::error::ContractError;
use reqwest::header::ACCEPT;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Reads definition documents that do not arrive inline.
///
/// The builder takes a reader by injection so tests can substitute one that
/// never touches the network or the disk. Implementations return the raw
/// document text; parsing happens afterwards.
pub trait SpecReader: Send + Sync {
    /// Fetches a definition served over http(s)
    fn read_remote(&self, url: &Url, format: Format) -> Result<String, ContractError>;

    /// Reads a definition from the local file system
    fn read_local_file(&self, path: &Path, format: Format) -> Result<String, ContractError>;
}

/// Reader backed by a blocking `reqwest` client and `std::fs`.
///
/// Remote reads block the calling thread and must not be issued from inside
/// an async runtime.
#[derive(Debug, Clone, Default)]
pub struct DefaultSpecReader {
    config: ReaderConfig,
}

impl DefaultSpecReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    fn client(&self) -> Result<reqwest::blocking::Client, reqwest::Error> {
        reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .user_agent(self.config.user_agent.clone())
            .build()
    }
}

fn accept_header(format: Format) -> &'static str {
    match format {
        Format::Yaml => "application/yaml, application/x-yaml, text/yaml, */*;q=0.5",
        Format::Json => "application/json, */*;q=0.5",
    }
}

impl SpecReader for DefaultSpecReader {
    fn read_remote(&self, url: &Url, format: Format) -> Result<String, ContractError> {
        let client = self
            .client()
            .map_err(|e| ContractError::load(url.as_str(), e))?;

        let response = client
            .get(url.clone())
            .header(ACCEPT, accept_header(format))
            .send()
            .map_err(|e| ContractError::load(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractError::load(
                url.as_str(),
                format!("server responded with {}", status),
            ));
        }

        let text = response
            .text()
            .map_err(|e| ContractError::load(url.as_str(), e))?;

        tracing::debug!(url = %url, bytes = text.len(), "Fetched remote definition");
        Ok(text)
    }

    fn read_local_file(&self, path: &Path, _format: Format) -> Result<String, ContractError> {
        let text = fs::read_to_string(path)
            .map_err(|e| ContractError::load(path.display().to_string(), e))?;

        tracing::debug!(path = %path.display(), bytes = text.len(), "Read definition file");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openapi.yaml");
        fs::write(&path, "openapi: 3.0.0").unwrap();

        let text = DefaultSpecReader::default()
            .read_local_file(&path, Format::Yaml)
            .unwrap();
        assert_eq!(text, "openapi: 3.0.0");
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let err = DefaultSpecReader::default()
            .read_local_file(&path, Format::Json)
            .unwrap_err();
        assert!(matches!(err, ContractError::DefinitionLoad { .. }));
    }

    #[test]
    fn unreachable_url_is_a_load_error() {
        let reader = DefaultSpecReader::new(ReaderConfig {
            timeout_secs: 2,
            ..ReaderConfig::default()
        });
        // Port 1 on loopback is reserved (tcpmux) and refuses connections
        let url = Url::parse("http://127.0.0.1:1/openapi.yaml").unwrap();

        let err = reader.read_remote(&url, Format::Yaml).unwrap_err();
        match err {
            ContractError::DefinitionLoad { origin, .. } => {
                assert_eq!(origin, "http://127.0.0.1:1/openapi.yaml")
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
