//! Claims domain errors

use thiserror::Error;

use core_kernel::{MoneyError, TemporalError};

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// Reported date precedes the loss date
    #[error("Claim dates are inconsistent: {0}")]
    InconsistentDates(#[from] TemporalError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Financial error: {0}")]
    Financial(#[from] MoneyError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ClaimError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClaimError::Validation(message.into())
    }

    /// True for errors caused by the caller's input
    pub fn is_validation(&self) -> bool {
        !matches!(self, ClaimError::InvalidStatusTransition { .. })
    }
}
