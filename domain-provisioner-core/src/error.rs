//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use domain_provisioner_provider::{CredentialValidationError, ProviderError};

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// A required credential or setting is absent
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Credential validation errors (structured, field level)
    #[error("{0}")]
    CredentialValidation(CredentialValidationError),

    /// A zone, domain authentication or widget required to proceed does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller input violates a precondition
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Provider error (converting from library)
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl CoreError {
    /// Whether it is expected behavior (user input, resource does not exist, etc.), used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::ConfigurationError(_)
            | Self::CredentialValidation(_)
            | Self::NotFound(_)
            | Self::ValidationError(_) => true,
            Self::Provider(e) => e.is_expected(),
        }
    }
}

impl From<CredentialValidationError> for CoreError {
    fn from(err: CredentialValidationError) -> Self {
        Self::CredentialValidation(err)
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
