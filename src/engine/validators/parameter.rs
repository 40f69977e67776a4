use crate::engine::helpers::build_validator;
use crate::error::ContractError;
use crate::violation::{map_to_rule, Location, Rule, Violation};
use jsonschema::{Registry, Validator};
use serde_json::Value;

/// How a parameter's textual value is turned into JSON before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coercion {
    Integer,
    Number,
    Boolean,
    String,
    Array(Box<Coercion>),
    /// No declared type: numbers, booleans and null are recognised, the
    /// rest stays a string
    Infer,
}

impl Coercion {
    /// Derives the coercion from a schema's declared `type`
    pub fn from_schema(schema: &Value) -> Self {
        match schema.get("type").and_then(Value::as_str) {
            Some("integer") => Self::Integer,
            Some("number") => Self::Number,
            Some("boolean") => Self::Boolean,
            Some("string") => Self::String,
            Some("array") => {
                let items = schema.get("items").map(Self::from_schema).unwrap_or(Self::Infer);
                Self::Array(Box::new(items))
            }
            _ => Self::Infer,
        }
    }

    /// Converts raw occurrences of a parameter into a JSON value. Arrays
    /// accept both repeated occurrences and comma separated values.
    pub fn coerce(&self, raw: &[&str]) -> Value {
        match self {
            Self::Array(items) => Value::Array(
                raw.iter()
                    .flat_map(|value| value.split(','))
                    .map(|value| items.coerce_scalar(value))
                    .collect(),
            ),
            _ => raw
                .first()
                .map(|value| self.coerce_scalar(value))
                .unwrap_or(Value::Null),
        }
    }

    fn coerce_scalar(&self, raw: &str) -> Value {
        let fallback = || Value::String(raw.to_string());
        match self {
            Self::Integer => raw
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| fallback()),
            Self::Number => raw
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(fallback),
            Self::Boolean => match raw {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => fallback(),
            },
            Self::String | Self::Array(_) => fallback(),
            Self::Infer => serde_json::from_str::<Value>(raw)
                .ok()
                .filter(|value| !value.is_object() && !value.is_array() && !value.is_string())
                .unwrap_or_else(fallback),
        }
    }
}

/// Validator for a single parameter
#[derive(Debug)]
pub struct ParameterValidator {
    name: String,
    required: bool,
    coercion: Coercion,
    validator: Validator,
}

impl ParameterValidator {
    /// Creates validator with registry for $ref resolution
    pub fn new(
        name: String,
        required: bool,
        coercion: Coercion,
        schema: &Value,
        registry: &Registry,
    ) -> Result<Self, ContractError> {
        let validator = build_validator(schema, registry, &format!("parameter '{}'", name))?;
        Ok(Self {
            name,
            required,
            coercion,
            validator,
        })
    }

    /// Validates the raw occurrences of this parameter
    pub fn validate(&self, raw: &[&str], prefix: &str) -> Vec<Violation> {
        let value = self.coercion.coerce(raw);
        self.validator
            .iter_errors(&value)
            .map(|e| {
                let instance_path = e.instance_path.to_string();
                let pointer = if instance_path.is_empty() {
                    format!("{}.{}", prefix, self.name)
                } else {
                    format!("{}.{}[{}]", prefix, self.name, instance_path)
                };
                Violation::new(Location::Request, map_to_rule(&e.kind), pointer, e.to_string())
            })
            .collect()
    }

    /// Get the parameter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the parameter is required
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Validator for all parameters of an operation
#[derive(Default, Debug)]
pub struct ParametersValidator {
    /// Path parameters (e.g., /users/{id})
    path: Vec<ParameterValidator>,
    /// Query parameters (e.g., ?page=1&limit=10)
    query: Vec<ParameterValidator>,
    /// Header parameters, matched case-insensitively
    header: Vec<ParameterValidator>,
}

impl ParametersValidator {
    /// Create a new empty ParametersValidator
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_path_parameter(&mut self, validator: ParameterValidator) {
        self.path.push(validator);
    }

    pub fn add_query_parameter(&mut self, validator: ParameterValidator) {
        self.query.push(validator);
    }

    pub fn add_header_parameter(&mut self, validator: ParameterValidator) {
        self.header.push(validator);
    }

    /// Validate path parameters captured by the router
    pub fn validate_path(&self, params: &[(String, String)]) -> Vec<Violation> {
        validate_parameters(&self.path, "path", |name| {
            params
                .iter()
                .filter(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
                .collect()
        })
    }

    /// Validate decoded query string pairs
    pub fn validate_query(&self, pairs: &[(String, String)]) -> Vec<Violation> {
        validate_parameters(&self.query, "query", |name| {
            pairs
                .iter()
                .filter(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
                .collect()
        })
    }

    /// Validate header parameters
    pub fn validate_headers(&self, headers: &[(String, String)]) -> Vec<Violation> {
        validate_parameters(&self.header, "header", |name| {
            headers
                .iter()
                .filter(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
                .collect()
        })
    }
}

fn validate_parameters<'a, F>(
    validators: &[ParameterValidator],
    prefix: &str,
    lookup: F,
) -> Vec<Violation>
where
    F: Fn(&str) -> Vec<&'a str>,
{
    let mut violations = Vec::new();
    for validator in validators {
        let raw = lookup(validator.name());
        if raw.is_empty() {
            if validator.is_required() {
                violations.push(Violation::new(
                    Location::Request,
                    Rule::MissingRequired,
                    format!("{}.{}", prefix, validator.name()),
                    format!("Required {} parameter '{}' is missing", prefix, validator.name()),
                ));
            }
            continue;
        }
        violations.extend(validator.validate(&raw, prefix));
    }
    violations
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
    fn coerces_declared_types() {
        assert_eq!(Coercion::Integer.coerce(&["42"]), json!(42));
        assert_eq!(Coercion::Integer.coerce(&["abc"]), json!("abc"));
        assert_eq!(Coercion::Boolean.coerce(&["true"]), json!(true));
        assert_eq!(Coercion::String.coerce(&["007"]), json!("007"));
        assert_eq!(
            Coercion::Array(Box::new(Coercion::Integer)).coerce(&["1,2", "3"]),
            json!([1, 2, 3])
        );
    }

    #[test]
    fn infers_scalars_without_declared_type() {
        assert_eq!(Coercion::Infer.coerce(&["1.5"]), json!(1.5));
        assert_eq!(Coercion::Infer.coerce(&["hello"]), json!("hello"));
        assert_eq!(Coercion::Infer.coerce(&["\"quoted\""]), json!("\"quoted\""));
    }

    #[test]
    fn derives_coercion_from_schema() {
        let schema = json!({"type": "array", "items": {"type": "number"}});
        assert_eq!(
            Coercion::from_schema(&schema),
            Coercion::Array(Box::new(Coercion::Number))
        );
        assert_eq!(Coercion::from_schema(&json!({"$ref": "#/x"})), Coercion::Infer);
    }

    #[test]
    fn reports_type_mismatch_and_missing_parameters() {
        let registry = registry();
        let schema = json!({"type": "integer"});
        let mut params = ParametersValidator::new();
        let limit = ParameterValidator::new(
            "limit".into(),
            true,
            Coercion::Integer,
            &schema,
            &registry,
        )
        .unwrap();
        params.add_query_parameter(limit);

        let violations = params.validate_query(&[("limit".into(), "ten".into())]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::TypeMismatch);
        assert_eq!(violations[0].pointer, "query.limit");

        let violations = params.validate_query(&[]);
        assert_eq!(violations[0].rule, Rule::MissingRequired);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let registry = registry();
        let schema = json!({"type": "string", "minLength": 3});
        let mut params = ParametersValidator::new();
        let api_key = ParameterValidator::new(
            "X-Api-Key".into(),
            true,
            Coercion::String,
            &schema,
            &registry,
        )
        .unwrap();
        params.add_header_parameter(api_key);

        assert!(params
            .validate_headers(&[("x-api-key".into(), "secret".into())])
            .is_empty());
    }
}
