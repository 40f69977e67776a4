use crate::error::ContractError;
use crate::violation::{map_to_rule, Location, Violation};
use jsonschema::{Registry, Validator};
use serde_json::Value;

pub(crate) const BASE_URI: &str = "urn:oas:spec";

/// Builds a JSON Schema validator with registry for $ref resolution
pub fn build_validator(
    schema: &Value,
    registry: &Registry,
    error_context: &str,
) -> Result<Validator, ContractError> {
    jsonschema::options()
        .with_registry(registry.clone())
        .with_base_uri(BASE_URI.to_string())
        .build(schema)
        .map_err(|e| {
            ContractError::SchemaCompilation(format!(
                "Failed to compile schema for {}: {}",
                error_context, e
            ))
        })
}

/// Formats instance path from JSON Schema validation error
pub fn format_instance_location(instance_path: &str, prefix: &str) -> String {
    if instance_path.is_empty() {
        prefix.to_string()
    } else {
        format!("{}{}", prefix, instance_path)
    }
}

/// Runs `validator` over `value`, turning every error into a violation
/// located under `prefix`
pub fn collect_violations(
    validator: &Validator,
    value: &Value,
    location: Location,
    prefix: &str,
) -> Vec<Violation> {
    validator
        .iter_errors(value)
        .map(|e| {
            let pointer = format_instance_location(&e.instance_path.to_string(), prefix);
            Violation::new(location, map_to_rule(&e.kind), pointer, e.to_string())
        })
        .collect()
}
