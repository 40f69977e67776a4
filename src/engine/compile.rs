use super::reference_resolver::ResolveReference;
use super::validators::{
    Coercion, ParameterValidator, ParametersValidator, RequestBodyValidator, ResponseValidator,
};
use super::{HttpMethod, OperationValidator, SchemaEngine};
use crate::engine::helpers::BASE_URI;
use crate::error::ContractError;
use indexmap::IndexMap;
use jsonschema::{Registry, Resource};
use openapiv3::{OpenAPI, Parameter, ParameterData, ReferenceOr};
use serde_json::{self, Value};
use std::collections::HashMap;
use std::str::FromStr;

/// Converts a schema reference to JSON Value
fn schema_to_json(
    schema_ref: &impl serde::Serialize,
    context: &str,
) -> Result<Value, ContractError> {
    serde_json::to_value(schema_ref).map_err(|e| {
        ContractError::SchemaCompilation(format!(
            "Failed to convert {} schema to JSON: {}",
            context, e
        ))
    })
}

fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Whether every media type the content declares is a JSON one
fn declares_only_json(content: &openapiv3::Content) -> bool {
    !content.is_empty() && content.keys().all(|media_type| is_json_media_type(media_type))
}

/// Extracts the JSON schema of the first JSON media type, if any
fn extract_json_schema(
    content: &openapiv3::Content,
    context: &str,
) -> Result<Option<Value>, ContractError> {
    let schema_ref = content
        .iter()
        .find(|(media_type, _)| is_json_media_type(media_type))
        .and_then(|(_, media)| media.schema.as_ref());

    schema_ref.map(|schema| schema_to_json(schema, context)).transpose()
}

/// Builds JSON Schema registry from OpenAPI components section
fn build_registry(spec: &OpenAPI) -> Result<Registry, ContractError> {
    let components_json = match &spec.components {
        Some(components) => schema_to_json(components, "components")?,
        None => serde_json::json!({}),
    };

    let wrapped_components = serde_json::json!({
        "components": components_json
    });

    let components_resource = Resource::from_contents(wrapped_components).map_err(|e| {
        ContractError::SchemaCompilation(format!("Failed to create resource: {}", e))
    })?;

    Registry::try_new(BASE_URI, components_resource)
        .map_err(|e| ContractError::SchemaCompilation(format!("Failed to create registry: {}", e)))
}

/// Compiles every operation of a parsed document into a [`SchemaEngine`]
pub fn build_engine(spec: &OpenAPI) -> Result<SchemaEngine, ContractError> {
    let mut engine = SchemaEngine::new();
    let registry = build_registry(spec)?;
    let mut operation_count = 0usize;

    for (path, path_item_ref) in &spec.paths.paths {
        let path_item = match path_item_ref {
            ReferenceOr::Item(item) => item,
            ReferenceOr::Reference { reference } => {
                tracing::warn!(
                    path = %path,
                    reference = %reference,
                    "Skipping path, path references are not supported"
                );
                continue;
            }
        };

        let mut operations_map = HashMap::new();

        for (method_str, operation) in path_item.iter() {
            let method = HttpMethod::from_str(method_str).map_err(|_| {
                ContractError::SchemaCompilation(format!("Unknown HTTP method: {}", method_str))
            })?;

            let validator =
                build_operation_validator(spec, &registry, &path_item.parameters, operation)?;
            operations_map.insert(method, validator);
            operation_count += 1;
        }

        engine.add_path_operations(path, operations_map)?;
    }

    tracing::info!(
        paths = spec.paths.paths.len(),
        operations = operation_count,
        "Compiled OpenAPI operations"
    );
    Ok(engine)
}

/// Build an OperationValidator from an OpenAPI operation
fn build_operation_validator(
    spec: &OpenAPI,
    registry: &Registry,
    path_parameters: &[ReferenceOr<Parameter>],
    operation: &openapiv3::Operation,
) -> Result<OperationValidator, ContractError> {
    let parameters_validator =
        build_parameters_validator(spec, registry, path_parameters, &operation.parameters)?;

    let request_body_validator = match &operation.request_body {
        Some(request_body) => build_request_body_validator(spec, registry, request_body)?,
        None => None,
    };

    let response_validator = build_response_validator(spec, registry, &operation.responses)?;

    Ok(OperationValidator::new(
        request_body_validator,
        response_validator,
        parameters_validator,
    ))
}

/// Build a RequestBodyValidator when the body is described with a JSON media type
fn build_request_body_validator(
    spec: &OpenAPI,
    registry: &Registry,
    request_body_ref: &ReferenceOr<openapiv3::RequestBody>,
) -> Result<Option<RequestBodyValidator>, ContractError> {
    let request_body = request_body_ref.resolve(spec)?;

    match extract_json_schema(&request_body.content, "request body")? {
        Some(schema_json) => Ok(Some(RequestBodyValidator::new(
            &schema_json,
            request_body.required,
            declares_only_json(&request_body.content),
            registry,
        )?)),
        None => {
            tracing::debug!("Request body has no JSON media type, body will not be validated");
            Ok(None)
        }
    }
}

/// Build a ResponseValidator from OpenAPI Responses
fn build_response_validator(
    spec: &OpenAPI,
    registry: &Registry,
    responses: &openapiv3::Responses,
) -> Result<ResponseValidator, ContractError> {
    let mut response_validator = ResponseValidator::new();

    for (status_code, response_ref) in &responses.responses {
        let response = response_ref.resolve(spec)?;
        let schema_json = extract_json_schema(&response.content, "response")?;
        let json_only = declares_only_json(&response.content);

        match status_code {
            openapiv3::StatusCode::Code(code) => response_validator.add_response(
                *code,
                schema_json.as_ref(),
                json_only,
                registry,
            )?,
            openapiv3::StatusCode::Range(class) => response_validator.add_range(
                *class,
                schema_json.as_ref(),
                json_only,
                registry,
            )?,
        }
    }

    if let Some(default_response_ref) = &responses.default {
        let default_response = default_response_ref.resolve(spec)?;
        let schema_json = extract_json_schema(&default_response.content, "default response")?;
        let json_only = declares_only_json(&default_response.content);
        response_validator.set_default(schema_json.as_ref(), json_only, registry)?;
    }

    Ok(response_validator)
}

fn parameter_data(parameter: &Parameter) -> (&ParameterData, &'static str) {
    match parameter {
        Parameter::Query { parameter_data, .. } => (parameter_data, "query"),
        Parameter::Header { parameter_data, .. } => (parameter_data, "header"),
        Parameter::Path { parameter_data, .. } => (parameter_data, "path"),
        Parameter::Cookie { parameter_data, .. } => (parameter_data, "cookie"),
    }
}

/// Build a ParametersValidator from path-level and operation-level
/// parameters; operation parameters override path-level ones with the same
/// name and location
fn build_parameters_validator(
    spec: &OpenAPI,
    registry: &Registry,
    path_parameters: &[ReferenceOr<Parameter>],
    operation_parameters: &[ReferenceOr<Parameter>],
) -> Result<ParametersValidator, ContractError> {
    let mut merged: IndexMap<(String, &'static str), &Parameter> = IndexMap::new();
    for parameter_ref in path_parameters.iter().chain(operation_parameters) {
        let parameter = parameter_ref.resolve(spec)?;
        let (data, location) = parameter_data(parameter);
        merged.insert((data.name.clone(), location), parameter);
    }

    let mut params_validator = ParametersValidator::new();

    for ((name, location), parameter) in merged {
        if location == "cookie" {
            continue;
        }
        let (data, _) = parameter_data(parameter);

        let schema_ref = match &data.format {
            openapiv3::ParameterSchemaOrContent::Schema(s) => s,
            openapiv3::ParameterSchemaOrContent::Content(_) => {
                tracing::debug!(parameter = %name, "Skipping content-based parameter");
                continue;
            }
        };

        let schema_json = schema_to_json(schema_ref, "parameter")?;
        let declared = schema_to_json(schema_ref.resolve(spec)?, "parameter")?;
        // Path parameters are always required, whatever the document says
        let required = data.required || location == "path";

        let param_validator = ParameterValidator::new(
            name,
            required,
            Coercion::from_schema(&declared),
            &schema_json,
            registry,
        )?;

        match parameter {
            Parameter::Query { .. } => params_validator.add_query_parameter(param_validator),
            Parameter::Header { .. } => params_validator.add_header_parameter(param_validator),
            Parameter::Path { .. } => params_validator.add_path_parameter(param_validator),
            Parameter::Cookie { .. } => {}
        }
    }

    Ok(params_validator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_json_media_types() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("application/problem+json; charset=utf-8"));
        assert!(!is_json_media_type("text/plain"));
    }

    #[test]
    fn json_only_content() {
        let content: openapiv3::Content = serde_json::from_value(serde_json::json!({
            "application/json": {"schema": {"type": "object"}}
        }))
        .unwrap();
        assert!(declares_only_json(&content));

        let mixed: openapiv3::Content = serde_json::from_value(serde_json::json!({
            "application/json": {"schema": {"type": "object"}},
            "text/csv": {}
        }))
        .unwrap();
        assert!(!declares_only_json(&mixed));
        assert!(!declares_only_json(&openapiv3::Content::new()));
    }

    #[test]
    fn document_without_components_compiles() {
        let spec: OpenAPI = serde_yaml::from_str(
            r#"
openapi: 3.0.0
info: {title: t, version: '1'}
paths:
  /health:
    get:
      responses:
        '204': {description: ok}
"#,
        )
        .unwrap();

        assert!(build_engine(&spec).is_ok());
    }
}
