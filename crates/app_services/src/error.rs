//! Application service errors

use thiserror::Error;

use core_kernel::{AllocatorError, CustomerId, PortError};
use domain_claims::ClaimError;
use domain_policy::{PolicyError, ProductType};

/// Errors returned by [`crate::AssemblyService`]
///
/// Everything except `AllocatorUnavailable` and `Persistence` is raised
/// before any write and is not worth retrying.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    #[error("Policy not found: {0}")]
    PolicyNotFound(String),

    #[error("Claim not found: {0}")]
    ClaimNotFound(String),

    #[error("Missing required coverage for {product}: {}", missing.join(", "))]
    MissingRequiredCoverage {
        product: ProductType,
        missing: Vec<String>,
    },

    #[error("Identifier allocation failed: {0}")]
    AllocatorUnavailable(#[source] AllocatorError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Persistence failed: {0}")]
    Persistence(#[source] PortError),
}

impl AssemblyError {
    pub fn validation(message: impl Into<String>) -> Self {
        AssemblyError::Validation(message.into())
    }

    /// Whether the caller may retry the whole operation
    pub fn is_transient(&self) -> bool {
        match self {
            AssemblyError::AllocatorUnavailable(e) => e.is_transient(),
            AssemblyError::Persistence(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<PolicyError> for AssemblyError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::MissingRequiredCoverage { product, missing } => {
                AssemblyError::MissingRequiredCoverage { product, missing }
            }
            PolicyError::InvalidStateTransition { .. } | PolicyError::NotModifiable(_) => {
                AssemblyError::InvalidTransition(err.to_string())
            }
            PolicyError::InconsistentPremium(_) => {
                AssemblyError::Persistence(PortError::internal(err.to_string()))
            }
            other => AssemblyError::Validation(other.to_string()),
        }
    }
}

impl From<ClaimError> for AssemblyError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::InvalidStatusTransition { .. } => AssemblyError::InvalidTransition(err.to_string()),
            other => AssemblyError::Validation(other.to_string()),
        }
    }
}

impl From<AllocatorError> for AssemblyError {
    fn from(err: AllocatorError) -> Self {
        AssemblyError::AllocatorUnavailable(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::NumberKind;

    #[test]
    fn test_allocator_outage_is_transient() {
        let err: AssemblyError = AllocatorError::Unavailable {
            kind: NumberKind::Policy,
            source: PortError::connection("refused"),
        }
        .into();
        assert!(err.is_transient());
    }

    #[test]
    fn test_missing_coverage_keeps_codes() {
        let err: AssemblyError = PolicyError::MissingRequiredCoverage {
            product: ProductType::Renters,
            missing: vec!["LIABILITY".into()],
        }
        .into();
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "Missing required coverage for RENTERS: LIABILITY");
    }
}
