use crate::adapter::{HttpMessageAdapter, MessageAdapter};
use crate::error::ContractError;
use crate::schema::LoadedSchema;
use crate::violation::Violation;
use std::sync::Arc;

/// Outcome of evaluating a message pair against the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(Vec<Violation>),
}

impl ValidationResult {
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(violations)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Valid => &[],
            Self::Invalid(violations) => violations,
        }
    }
}

/// A definition bound to a message adapter.
///
/// Holds no mutable state, so one validator can serve any number of
/// `validate` calls, from any number of threads.
#[derive(Clone)]
pub struct Validator<M = HttpMessageAdapter> {
    schema: Arc<LoadedSchema>,
    adapter: M,
}

impl<M: MessageAdapter> Validator<M> {
    pub(crate) fn new(schema: Arc<LoadedSchema>, adapter: M) -> Self {
        Self { schema, adapter }
    }

    /// Validates a request/response pair.
    ///
    /// `Err` means the pair could not be evaluated; a broken contract is
    /// `Ok(ValidationResult::Invalid(..))`.
    pub fn validate(
        &self,
        request: &M::Request,
        response: &M::Response,
    ) -> Result<ValidationResult, ContractError> {
        let request = self.adapter.adapt_request(request)?;
        let response = self.adapter.adapt_response(response)?;

        let violations = self.schema.engine().validate_exchange(&request, &response);
        Ok(self.finish(&request.method, &request.uri, violations))
    }

    /// Validates the request side only
    pub fn validate_request(
        &self,
        request: &M::Request,
    ) -> Result<ValidationResult, ContractError> {
        let request = self.adapter.adapt_request(request)?;

        let violations = self.schema.engine().validate_request(&request);
        Ok(self.finish(&request.method, &request.uri, violations))
    }

    /// Validates the response side only; the request selects the operation
    pub fn validate_response(
        &self,
        request: &M::Request,
        response: &M::Response,
    ) -> Result<ValidationResult, ContractError> {
        let request = self.adapter.adapt_request(request)?;
        let response = self.adapter.adapt_response(response)?;

        let violations = self.schema.engine().validate_response(&request, &response);
        Ok(self.finish(&request.method, &request.uri, violations))
    }

    fn finish(&self, method: &str, uri: &str, violations: Vec<Violation>) -> ValidationResult {
        if !violations.is_empty() {
            tracing::debug!(
                method = %method,
                uri = %uri,
                violations = violations.len(),
                "Contract violated"
            );
        }
        ValidationResult::from_violations(violations)
    }

    pub fn schema(&self) -> &LoadedSchema {
        &self.schema
    }

    pub fn adapter(&self) -> &M {
        &self.adapter
    }
}
