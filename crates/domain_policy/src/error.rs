//! Policy domain errors

use thiserror::Error;

use core_kernel::{MoneyError, TemporalError};

use crate::product::ProductType;

/// Errors that can occur in the policy domain
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Invalid state transition attempted
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: String,
        to: String,
    },

    /// Policy cannot be modified in current state
    #[error("Policy cannot be modified in status {0}")]
    NotModifiable(String),

    /// Required field is missing
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// One or more required coverages for the product are absent
    #[error("Missing required coverage for {product}: {}", missing.join(", "))]
    MissingRequiredCoverage {
        product: ProductType,
        missing: Vec<String>,
    },

    /// Invalid coverage configuration
    #[error("Invalid coverage: {0}")]
    InvalidCoverage(String),

    /// Stored premium breakdown does not add up
    #[error("Premium breakdown is inconsistent: {0}")]
    InconsistentPremium(String),

    /// Financial calculation error
    #[error("Financial error: {0}")]
    Financial(#[from] MoneyError),

    /// Policy period error
    #[error("Period error: {0}")]
    Period(#[from] TemporalError),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl PolicyError {
    /// Creates a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PolicyError::Validation(message.into())
    }

    /// True for errors caused by the caller's input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PolicyError::Validation(_)
                | PolicyError::InvalidCoverage(_)
                | PolicyError::MissingRequiredField(_)
                | PolicyError::MissingRequiredCoverage { .. }
                | PolicyError::Period(_)
                | PolicyError::Financial(MoneyError::Overflow | MoneyError::OutOfRange(_))
        )
    }
}
