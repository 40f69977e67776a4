use crate::error::ContractError;
use indexmap::IndexMap;
use openapiv3::{Components, OpenAPI, ReferenceOr};

/// Upper bound on `$ref` chains, guards against reference cycles
const MAX_REFERENCE_DEPTH: usize = 16;

/// Resolves OpenAPI structure-level `$ref`s to component definitions.
///
/// Handles references such as `#/components/parameters/PageLimit` or
/// `#/components/responses/NotFound`. References *inside* JSON schemas are
/// left to the `jsonschema` registry; the schema impl exists only so the
/// engine can inspect a parameter's declared type.
pub trait ResolveReference<T> {
    fn resolve<'a>(&'a self, spec: &'a OpenAPI) -> Result<&'a T, ContractError>;
}

fn resolve_in<'a, T, F>(
    ref_or: &'a ReferenceOr<T>,
    spec: &'a OpenAPI,
    prefix: &str,
    selector: F,
) -> Result<&'a T, ContractError>
where
    F: Fn(&'a Components) -> &'a IndexMap<String, ReferenceOr<T>>,
{
    let mut current = ref_or;
    for _ in 0..MAX_REFERENCE_DEPTH {
        let reference = match current {
            ReferenceOr::Item(item) => return Ok(item),
            ReferenceOr::Reference { reference } => reference,
        };

        let name = reference.strip_prefix(prefix).ok_or_else(|| {
            ContractError::SchemaCompilation(format!(
                "Invalid reference: {}. Expected prefix: {}",
                reference, prefix
            ))
        })?;

        current = spec
            .components
            .as_ref()
            .map(&selector)
            .and_then(|map| map.get(name))
            .ok_or_else(|| {
                ContractError::SchemaCompilation(format!("Reference not found: {}", reference))
            })?;
    }

    Err(ContractError::SchemaCompilation(format!(
        "Reference chain deeper than {} under {}",
        MAX_REFERENCE_DEPTH, prefix
    )))
}

impl ResolveReference<openapiv3::Parameter> for ReferenceOr<openapiv3::Parameter> {
    fn resolve<'a>(&'a self, spec: &'a OpenAPI) -> Result<&'a openapiv3::Parameter, ContractError> {
        resolve_in(self, spec, "#/components/parameters/", |c| &c.parameters)
    }
}

impl ResolveReference<openapiv3::RequestBody> for ReferenceOr<openapiv3::RequestBody> {
    fn resolve<'a>(
        &'a self,
        spec: &'a OpenAPI,
    ) -> Result<&'a openapiv3::RequestBody, ContractError> {
        resolve_in(self, spec, "#/components/requestBodies/", |c| &c.request_bodies)
    }
}

impl ResolveReference<openapiv3::Response> for ReferenceOr<openapiv3::Response> {
    fn resolve<'a>(&'a self, spec: &'a OpenAPI) -> Result<&'a openapiv3::Response, ContractError> {
        resolve_in(self, spec, "#/components/responses/", |c| &c.responses)
    }
}

impl ResolveReference<openapiv3::Schema> for ReferenceOr<openapiv3::Schema> {
    fn resolve<'a>(&'a self, spec: &'a OpenAPI) -> Result<&'a openapiv3::Schema, ContractError> {
        resolve_in(self, spec, "#/components/schemas/", |c| &c.schemas)
    }
}
