use crate::definition::Strategy;
use thiserror::Error;

/// Failures that prevent a contract from being evaluated.
///
/// A request or response that breaks the contract is not an error: it is
/// reported as [`ValidationResult::Invalid`](crate::ValidationResult::Invalid).
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Failed to load definition from {origin}: {reason}")]
    DefinitionLoad { origin: String, reason: String },

    #[error("Invalid adapter '{adapter}': {reason}")]
    InvalidAdapter { adapter: String, reason: String },

    #[error("Cannot build a validator: {0}")]
    IncompleteConfiguration(String),

    #[error("Builder is already bound to a {0} definition")]
    DefinitionAlreadyBound(Strategy),

    #[error("Failed to compile JSON schema: {0}")]
    SchemaCompilation(String),

    #[error("Failed to adapt HTTP message: {0}")]
    MessageAdaptation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ContractError {
    pub(crate) fn load(origin: impl Into<String>, reason: impl ToString) -> Self {
        Self::DefinitionLoad {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_adapter(adapter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAdapter {
            adapter: adapter.into(),
            reason: reason.into(),
        }
    }
}
