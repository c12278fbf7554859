//! Party domain errors

use thiserror::Error;

/// Errors that can occur in the party domain
#[derive(Debug, Error)]
pub enum PartyError {
    /// Customer with the given ID was not found
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Invalid customer data provided
    #[error("Invalid party data: {0}")]
    InvalidData(String),

    /// Field level validation failed
    #[error("Party validation failed: {0}")]
    ValidationFailed(String),
}

impl PartyError {
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        PartyError::CustomerNotFound(id.to_string())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        PartyError::InvalidData(message.into())
    }
}

impl From<validator::ValidationErrors> for PartyError {
    fn from(errors: validator::ValidationErrors) -> Self {
        PartyError::ValidationFailed(errors.to_string())
    }
}
