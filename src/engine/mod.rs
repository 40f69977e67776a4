//! OpenAPI conformance engine.
//!
//! A parsed document is compiled once into a router of operations, each
//! holding JSON Schema validators for its parameters, request body and
//! responses. Messages reach the engine only in canonical form.

pub mod compile;
pub mod helpers;
pub mod reference_resolver;
pub mod validators;

pub use compile::build_engine;
pub use reference_resolver::ResolveReference;

use self::validators::{ParametersValidator, RequestBodyValidator, ResponseValidator};
use crate::adapter::{CanonicalRequest, CanonicalResponse};
use crate::error::ContractError;
use crate::violation::{Location, Rule, Violation};
use matchit::Router;
use openapiv3::OpenAPI;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

/// HTTP methods supported by OpenAPI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
    TRACE,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GET => "GET",
            Self::POST => "POST",
            Self::PUT => "PUT",
            Self::DELETE => "DELETE",
            Self::PATCH => "PATCH",
            Self::HEAD => "HEAD",
            Self::OPTIONS => "OPTIONS",
            Self::TRACE => "TRACE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Self::GET),
            "POST" => Ok(Self::POST),
            "PUT" => Ok(Self::PUT),
            "DELETE" => Ok(Self::DELETE),
            "PATCH" => Ok(Self::PATCH),
            "HEAD" => Ok(Self::HEAD),
            "OPTIONS" => Ok(Self::OPTIONS),
            "TRACE" => Ok(Self::TRACE),
            _ => Err(()),
        }
    }
}

/// Validator for a single API operation (path + method combination)
pub struct OperationValidator {
    pub request_body: Option<RequestBodyValidator>,
    pub responses: ResponseValidator,
    pub parameters: ParametersValidator,
}

impl OperationValidator {
    pub fn new(
        request_body: Option<RequestBodyValidator>,
        responses: ResponseValidator,
        parameters: ParametersValidator,
    ) -> Self {
        Self {
            request_body,
            responses,
            parameters,
        }
    }
}

/// Map of HTTP methods to their operation validators
type OperationMap = HashMap<HttpMethod, OperationValidator>;

/// Operation matched for a request, with the path parameters it captured
struct Matched<'a> {
    operation: &'a OperationValidator,
    path_params: Vec<(String, String)>,
    query: Vec<(String, String)>,
}

/// What a message body turned out to be
enum Body {
    Absent,
    Json(Value),
    /// Sent with a non-JSON content type
    Opaque,
}

impl Body {
    fn parse(
        body: &[u8],
        content_type: Option<&str>,
        location: Location,
    ) -> Result<Self, Violation> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::Absent);
        }
        if let Some(content_type) = content_type {
            let essence = content_type.split(';').next().unwrap_or_default().trim();
            if !(essence.eq_ignore_ascii_case("application/json") || essence.ends_with("+json")) {
                return Ok(Self::Opaque);
            }
        }
        serde_json::from_slice(body).map(Self::Json).map_err(|e| {
            Violation::new(
                location,
                Rule::MalformedBody,
                "body",
                format!("Body is not valid JSON: {}", e),
            )
        })
    }
}

fn unsupported_media_type(location: Location, content_type: Option<&str>) -> Violation {
    Violation::new(
        location,
        Rule::UnsupportedMediaType,
        "content-type",
        format!(
            "Content type '{}' is not documented, expected a JSON media type",
            content_type.unwrap_or_default()
        ),
    )
}

/// Compiled, read-only conformance engine for one OpenAPI document
pub struct SchemaEngine {
    router: Router<OperationMap>,
}

impl SchemaEngine {
    pub(crate) fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    /// Compiles a parsed document
    pub fn bind(spec: &OpenAPI) -> Result<Self, ContractError> {
        build_engine(spec)
    }

    /// Adds all operations for a path at once
    pub(crate) fn add_path_operations(
        &mut self,
        path: &str,
        operations: OperationMap,
    ) -> Result<(), ContractError> {
        self.router.insert(path, operations).map_err(|e| {
            ContractError::SchemaCompilation(format!("Failed to add route '{}': {}", path, e))
        })
    }

    fn find_operation<'a>(
        &'a self,
        request: &'a CanonicalRequest,
    ) -> Result<Matched<'a>, Violation> {
        let uri: http::Uri = request.uri.parse().map_err(|e| {
            Violation::new(
                Location::Request,
                Rule::RouteNotFound,
                "uri",
                format!("Malformed request URI '{}': {}", request.uri, e),
            )
        })?;

        let matched = self.router.at(uri.path()).map_err(|_| {
            Violation::new(
                Location::Request,
                Rule::RouteNotFound,
                "path",
                format!("No route found for path: {}", uri.path()),
            )
        })?;

        let operation = HttpMethod::from_str(&request.method)
            .ok()
            .and_then(|method| matched.value.get(&method))
            .ok_or_else(|| {
                Violation::new(
                    Location::Request,
                    Rule::MethodNotAllowed,
                    "method",
                    format!(
                        "Method {} not allowed for path: {}",
                        request.method,
                        uri.path()
                    ),
                )
            })?;

        let query: Vec<(String, String)> = uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Ok(Matched {
            operation,
            path_params: matched
                .params
                .iter()
                .map(|(key, value)| {
                    let decoded = percent_decode_str(value).decode_utf8_lossy();
                    (key.to_string(), decoded.into_owned())
                })
                .collect(),
            query,
        })
    }

    fn request_violations(matched: &Matched<'_>, request: &CanonicalRequest) -> Vec<Violation> {
        let parameters = &matched.operation.parameters;
        let mut violations = parameters.validate_path(&matched.path_params);
        violations.extend(parameters.validate_query(&matched.query));
        violations.extend(parameters.validate_headers(&request.headers));

        if let Some(body_validator) = &matched.operation.request_body {
            let content_type = request.header("content-type");
            match Body::parse(&request.body, content_type, Location::Request) {
                Ok(Body::Json(value)) => violations.extend(body_validator.validate(Some(&value))),
                Ok(Body::Absent) => violations.extend(body_validator.validate(None)),
                Ok(Body::Opaque) if body_validator.json_only() => {
                    violations.push(unsupported_media_type(Location::Request, content_type))
                }
                Ok(Body::Opaque) => {}
                Err(violation) => violations.push(violation),
            }
        }
        violations
    }

    fn response_violations(matched: &Matched<'_>, response: &CanonicalResponse) -> Vec<Violation> {
        let documented = match matched.operation.responses.lookup(response.status) {
            Ok(documented) => documented,
            Err(violation) => return vec![violation],
        };
        if !documented.has_body_schema() {
            return Vec::new();
        }

        let content_type = response.header("content-type");
        match Body::parse(&response.body, content_type, Location::Response) {
            Ok(Body::Json(value)) => documented.validate(Some(&value)),
            Ok(Body::Absent) => documented.validate(None),
            Ok(Body::Opaque) if documented.json_only() => {
                vec![unsupported_media_type(Location::Response, content_type)]
            }
            Ok(Body::Opaque) => Vec::new(),
            Err(violation) => vec![violation],
        }
    }

    /// Validates a request against its documented operation
    pub fn validate_request(&self, request: &CanonicalRequest) -> Vec<Violation> {
        match self.find_operation(request) {
            Ok(matched) => Self::request_violations(&matched, request),
            Err(violation) => vec![violation],
        }
    }

    /// Validates a response against the operation its request targets
    pub fn validate_response(
        &self,
        request: &CanonicalRequest,
        response: &CanonicalResponse,
    ) -> Vec<Violation> {
        match self.find_operation(request) {
            Ok(matched) => Self::response_violations(&matched, response),
            Err(violation) => vec![violation],
        }
    }

    /// Validates both sides of an exchange, routing the request only once
    pub fn validate_exchange(
        &self,
        request: &CanonicalRequest,
        response: &CanonicalResponse,
    ) -> Vec<Violation> {
        match self.find_operation(request) {
            Ok(matched) => {
                let mut violations = Self::request_violations(&matched, request);
                violations.extend(Self::response_violations(&matched, response));
                violations
            }
            Err(violation) => vec![violation],
        }
    }
}
