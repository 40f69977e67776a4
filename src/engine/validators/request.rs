use crate::engine::helpers::{build_validator, collect_violations};
use crate::error::ContractError;
use crate::violation::{Location, Rule, Violation};
use jsonschema::{Registry, Validator};
use serde_json::Value;

/// Validator for request body against a JSON Schema
pub struct RequestBodyValidator {
    schema: Validator,
    required: bool,
    /// The operation declares no media type besides JSON ones
    json_only: bool,
}

impl RequestBodyValidator {
    /// Creates validator with registry for $ref resolution
    pub fn new(
        schema_value: &Value,
        required: bool,
        json_only: bool,
        registry: &Registry,
    ) -> Result<Self, ContractError> {
        let schema = build_validator(schema_value, registry, "request body")?;
        Ok(Self {
            schema,
            required,
            json_only,
        })
    }

    /// Whether a body sent with a non-JSON content type breaks the contract
    pub fn json_only(&self) -> bool {
        self.json_only
    }

    /// Validates a parsed request body; `None` means the request had no body
    pub fn validate(&self, body: Option<&Value>) -> Vec<Violation> {
        match body {
            None if self.required => vec![Violation::new(
                Location::Request,
                Rule::MissingRequired,
                "body",
                "Request body is required but missing",
            )],
            None => Vec::new(),
            Some(value) => collect_violations(&self.schema, value, Location::Request, "body"),
        }
    }
}
