use crate::engine::helpers::{build_validator, collect_violations};
use crate::error::ContractError;
use crate::violation::{Location, Rule, Violation};
use jsonschema::{Registry, Validator};
use serde_json::Value;
use std::collections::HashMap;

/// A documented response for one status, status range or `default`
pub struct DocumentedResponse {
    /// `None` when the response declares no JSON body
    schema: Option<Validator>,
    json_only: bool,
}

impl DocumentedResponse {
    fn compile(
        schema: Option<&Value>,
        json_only: bool,
        registry: &Registry,
        context: &str,
    ) -> Result<Self, ContractError> {
        let schema = schema
            .map(|schema| build_validator(schema, registry, context))
            .transpose()?;
        Ok(Self { schema, json_only })
    }

    pub fn has_body_schema(&self) -> bool {
        self.schema.is_some()
    }

    /// Whether a body sent with a non-JSON content type breaks the contract
    pub fn json_only(&self) -> bool {
        self.schema.is_some() && self.json_only
    }

    /// Validates a parsed body; `None` means the response had no body
    pub fn validate(&self, body: Option<&Value>) -> Vec<Violation> {
        match (&self.schema, body) {
            (Some(validator), Some(value)) => {
                collect_violations(validator, value, Location::Response, "body")
            }
            (Some(_), None) => vec![Violation::new(
                Location::Response,
                Rule::MissingRequired,
                "body",
                "Response body is documented but missing",
            )],
            (None, _) => Vec::new(),
        }
    }
}

/// Validator for response bodies against JSON Schemas based on status codes
#[derive(Default)]
pub struct ResponseValidator {
    exact: HashMap<u16, DocumentedResponse>,
    /// Keyed by the leading digit of `1XX`..`5XX` ranges
    ranges: HashMap<u16, DocumentedResponse>,
    default: Option<DocumentedResponse>,
}

impl ResponseValidator {
    /// Create a new empty ResponseValidator
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents a specific status code, optionally with a body schema
    pub fn add_response(
        &mut self,
        status_code: u16,
        schema: Option<&Value>,
        json_only: bool,
        registry: &Registry,
    ) -> Result<(), ContractError> {
        let context = format!("response {}", status_code);
        let response = DocumentedResponse::compile(schema, json_only, registry, &context)?;
        self.exact.insert(status_code, response);
        Ok(())
    }

    /// Documents a status range such as `2XX`
    pub fn add_range(
        &mut self,
        class: u16,
        schema: Option<&Value>,
        json_only: bool,
        registry: &Registry,
    ) -> Result<(), ContractError> {
        let context = format!("response {}XX", class);
        let response = DocumentedResponse::compile(schema, json_only, registry, &context)?;
        self.ranges.insert(class, response);
        Ok(())
    }

    /// Sets default response schema for unmatched status codes
    pub fn set_default(
        &mut self,
        schema: Option<&Value>,
        json_only: bool,
        registry: &Registry,
    ) -> Result<(), ContractError> {
        let response =
            DocumentedResponse::compile(schema, json_only, registry, "default response")?;
        self.default = Some(response);
        Ok(())
    }

    /// Looks up the documented response for a status code.
    ///
    /// Lookup order is exact status, status range, then `default`.
    pub fn lookup(&self, status_code: u16) -> Result<&DocumentedResponse, Violation> {
        self.exact
            .get(&status_code)
            .or_else(|| self.ranges.get(&(status_code / 100)))
            .or(self.default.as_ref())
            .ok_or_else(|| {
                Violation::new(
                    Location::Response,
                    Rule::UndocumentedStatus,
                    "status",
                    format!("No response is documented for status code {}", status_code),
                )
            })
    }

    /// Validates response body against schema for the given status code
    pub fn validate(&self, status_code: u16, body: Option<&Value>) -> Vec<Violation> {
        match self.lookup(status_code) {
            Ok(response) => response.validate(body),
            Err(violation) => vec![violation],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> Registry {
        let resource = jsonschema::Resource::from_contents(json!({"components": {}})).unwrap();
        Registry::try_new("urn:oas:spec", resource).unwrap()
    }

    #[test]
    fn exact_status_wins_over_range_and_default() {
        let registry = registry();
        let mut responses = ResponseValidator::new();
        responses
            .add_response(200, Some(&json!({"type": "object"})), true, &registry)
            .unwrap();
        responses
            .add_range(2, Some(&json!({"type": "array"})), true, &registry)
            .unwrap();
        responses.set_default(None, false, &registry).unwrap();

        assert!(responses.validate(200, Some(&json!({}))).is_empty());
        assert_eq!(
            responses.validate(201, Some(&json!({})))[0].rule,
            Rule::TypeMismatch
        );
        assert!(responses.validate(500, Some(&json!("anything"))).is_empty());
    }

    #[test]
    fn undocumented_status_is_reported() {
        let registry = registry();
        let mut responses = ResponseValidator::new();
        responses.add_response(204, None, false, &registry).unwrap();

        assert!(responses.validate(204, None).is_empty());
        let violations = responses.validate(404, None);
        assert_eq!(violations[0].rule, Rule::UndocumentedStatus);
        assert_eq!(violations[0].location, Location::Response);
    }

    #[test]
    fn documented_body_must_be_present() {
        let registry = registry();
        let mut responses = ResponseValidator::new();
        responses
            .add_response(200, Some(&json!({"type": "object"})), true, &registry)
            .unwrap();

        let violations = responses.validate(200, None);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::MissingRequired);
        assert_eq!(violations[0].pointer, "body");
    }

    #[test]
    fn json_only_requires_a_body_schema() {
        let registry = registry();
        let mut responses = ResponseValidator::new();
        responses.add_response(204, None, true, &registry).unwrap();
        responses
            .add_response(200, Some(&json!({"type": "object"})), false, &registry)
            .unwrap();

        assert!(!responses.lookup(204).unwrap().json_only());
        assert!(!responses.lookup(200).unwrap().json_only());
    }
}
