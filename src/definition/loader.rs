use super::Format;
use crate::error::ContractError;
use openapiv3::OpenAPI;

/// Parses definition text into an OpenAPI document.
///
/// `origin` names where the text came from and is carried in the error.
pub fn parse_definition(
    text: &str,
    format: Format,
    origin: &str,
) -> Result<OpenAPI, ContractError> {
    let spec: OpenAPI = match format {
        Format::Yaml => serde_yaml::from_str(text).map_err(|e| {
            ContractError::load(origin, format!("Failed to parse OpenAPI YAML: {}", e))
        })?,
        Format::Json => serde_json::from_str(text).map_err(|e| {
            ContractError::load(origin, format!("Failed to parse OpenAPI JSON: {}", e))
        })?,
    };

    Ok(spec)
}
