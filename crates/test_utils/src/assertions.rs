//! Custom Test Assertions
//!
//! Assertion helpers that print the domain context on failure.

use rust_decimal::Decimal;

use app_services::AssemblyError;
use core_kernel::{Money, NumberKind};
use domain_policy::{Policy, PolicyStatus, PremiumSummary};

/// Asserts an exact amount and currency
pub fn assert_money_eq(actual: Money, expected: Money) {
    assert_eq!(
        (actual.currency(), actual.amount()),
        (expected.currency(), expected.amount()),
        "expected {expected}, got {actual}"
    );
}

/// Asserts `total = base + fees + taxes`
pub fn assert_premium_composed(premium: &PremiumSummary) {
    let sum: Decimal = premium.base_premium.amount() + premium.fees.amount() + premium.taxes.amount();
    assert_eq!(
        premium.total_premium.amount(),
        sum,
        "total {} does not equal base {} + fees {} + taxes {}",
        premium.total_premium,
        premium.base_premium,
        premium.fees,
        premium.taxes
    );
}

/// Asserts a policy number renders as `POL-YYYY-NNNNNN` for `year`
pub fn assert_policy_number(number: &str, year: i32) {
    match NumberKind::Policy.parse(number) {
        Some((y, seq)) => {
            assert_eq!(y, year, "policy number {number} has wrong year");
            assert!(seq >= 1, "policy number {number} has zero sequence");
        }
        None => panic!("malformed policy number: {number}"),
    }
}

/// Asserts a claim number renders as `CLM-YYYYNNNNNNN` for `year`
pub fn assert_claim_number(number: &str, year: i32) {
    match NumberKind::Claim.parse(number) {
        Some((y, seq)) => {
            assert_eq!(y, year, "claim number {number} has wrong year");
            assert!(seq >= 1, "claim number {number} has zero sequence");
        }
        None => panic!("malformed claim number: {number}"),
    }
}

/// Asserts the shape of a freshly issued policy: bound or referred, with a
/// decision and a composed premium
pub fn assert_issued(policy: &Policy) {
    assert!(
        matches!(policy.status(), PolicyStatus::Bound | PolicyStatus::Referred),
        "issued policy {} is {}",
        policy.policy_number(),
        policy.status()
    );
    assert!(policy.decision().is_some(), "issued policy {} has no decision", policy.policy_number());
    assert_premium_composed(policy.premium());
}

pub fn assert_transient(error: &AssemblyError) {
    assert!(error.is_transient(), "expected a transient error, got {error}");
}

pub fn assert_not_transient(error: &AssemblyError) {
    assert!(!error.is_transient(), "expected a permanent error, got {error}");
}
