use jsonschema::error::ValidationErrorKind;
use std::fmt;

/// Which side of the exchange broke the contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Request,
    Response,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
        }
    }
}

/// The contract rule a message violated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    RouteNotFound,
    MethodNotAllowed,
    UndocumentedStatus,
    MalformedBody,
    UnsupportedMediaType,
    TypeMismatch,
    MissingRequired,
    EnumViolation,
    OneOfNoMatch,
    AnyOfNoMatch,
    ConstraintViolation,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RouteNotFound => "ROUTE_NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::UndocumentedStatus => "UNDOCUMENTED_STATUS",
            Self::MalformedBody => "MALFORMED_BODY",
            Self::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::MissingRequired => "MISSING_REQUIRED",
            Self::EnumViolation => "ENUM_VIOLATION",
            Self::OneOfNoMatch => "ONE_OF_NO_MATCH",
            Self::AnyOfNoMatch => "ANY_OF_NO_MATCH",
            Self::ConstraintViolation => "CONSTRAINT_VIOLATION",
        }
    }
}

/// A single broken rule, with where in the message it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub location: Location,
    pub rule: Rule,
    /// Position inside the message, e.g. `path.id`, `query.limit` or `body/items/0`
    pub pointer: String,
    pub message: String,
}

impl Violation {
    pub fn new(
        location: Location,
        rule: Rule,
        pointer: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            location,
            rule,
            pointer: pointer.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} - {}",
            self.rule.as_str(),
            self.location.as_str(),
            self.pointer,
            self.message
        )
    }
}

/// Maps a JSON Schema error kind to the rule it breaks
pub fn map_to_rule(kind: &ValidationErrorKind) -> Rule {
    match kind {
        ValidationErrorKind::Type { .. } => Rule::TypeMismatch,
        ValidationErrorKind::Required { .. } => Rule::MissingRequired,
        ValidationErrorKind::Enum { .. } => Rule::EnumViolation,
        ValidationErrorKind::OneOfNotValid { .. } => Rule::OneOfNoMatch,
        ValidationErrorKind::AnyOf { .. } => Rule::AnyOfNoMatch,
        _ => Rule::ConstraintViolation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_rule_location_and_pointer() {
        let violation = Violation::new(
            Location::Response,
            Rule::MissingRequired,
            "body",
            "\"id\" is a required property",
        );
        assert_eq!(
            violation.to_string(),
            "[MISSING_REQUIRED] response body - \"id\" is a required property"
        );
    }
}
