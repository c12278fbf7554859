//! Claims domain tests
//!
//! # Test Organization
//!
//! - `claim_intake` - report validation and claim filing
//! - `fraud_scoring` - rule aggregation on realistic histories
//! - `properties` - fraud evaluation is bounded and idempotent

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{ClaimId, CustomerId, Money, PolicyId};
use domain_claims::{
    Claim, ClaimError, ClaimHistoryEntry, ClaimReport, ClaimStatus, FraudEngine, Participant,
    ParticipantKind, ParticipantRole, Severity,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn reported_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 20, 14, 0, 0).unwrap()
}

fn report(loss: Option<Decimal>) -> ClaimReport {
    ClaimReport {
        policy_id: PolicyId::new(),
        customer_id: CustomerId::new(),
        loss_date: reported_at() - Duration::days(3),
        reported_date: reported_at(),
        description: "Hail damage to roof and vehicle".into(),
        loss_amount: loss.map(Money::usd),
        reserve_amount: Some(Money::usd(dec!(5000))),
        loss_location: Some("Denver, CO".into()),
        participants: vec![
            Participant::new(ParticipantKind::Individual, "Sam Ortiz", ParticipantRole::Claimant)
                .with_contact("sam@example.com"),
        ],
    }
}

fn file(loss: Option<Decimal>) -> Claim {
    Claim::file("CLM-20240000077", report(loss), None, reported_at()).unwrap()
}

fn history(claim: &Claim, days_before: &[i64]) -> Vec<ClaimHistoryEntry> {
    days_before
        .iter()
        .map(|d| ClaimHistoryEntry {
            claim_id: ClaimId::new(),
            reported_date: claim.reported_date() - Duration::days(*d),
        })
        .collect()
}

// ============================================================================
// CLAIM INTAKE
// ============================================================================

mod claim_intake {
    use super::*;

    #[test]
    fn test_file_claim() {
        let claim = file(Some(dec!(12000)));
        assert_eq!(claim.status(), ClaimStatus::Open);
        assert_eq!(claim.claim_number(), "CLM-20240000077");
        assert_eq!(claim.participants()[0].contact.as_deref(), Some("sam@example.com"));
    }

    #[test]
    fn test_reported_before_loss_is_rejected() {
        let mut bad = report(None);
        bad.loss_date = bad.reported_date + Duration::days(1);
        let err = Claim::file("CLM-20240000078", bad, None, reported_at()).unwrap_err();
        assert!(matches!(err, ClaimError::InconsistentDates(_)));
        assert!(err.is_validation());
    }

    #[test]
    fn test_negative_loss_is_rejected() {
        let bad = report(Some(dec!(-10)));
        assert!(matches!(bad.validate(), Err(ClaimError::InvalidAmount(_))));
    }

    #[test]
    fn test_blank_participant_name_is_rejected() {
        let mut bad = report(None);
        bad.participants.push(Participant::new(
            ParticipantKind::Organization,
            "  ",
            ParticipantRole::Witness,
        ));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("INVESTIGATING".parse::<ClaimStatus>().unwrap(), ClaimStatus::Investigating);
        assert!("FNOL".parse::<ClaimStatus>().is_err());
    }
}

// ============================================================================
// FRAUD SCORING
// ============================================================================

mod fraud_scoring {
    use super::*;

    #[test]
    fn test_high_value_with_frequent_claims() {
        let claim = file(Some(dec!(60000)));
        let prior = history(&claim, &[5, 20, 45, 80]);
        let assessment = FraudEngine::standard().evaluate(&claim, &prior);

        assert_eq!(assessment.indicators.len(), 2);
        assert_eq!(assessment.risk_score, 75);
        assert_eq!(assessment.severity, Some(Severity::Medium));
        assert!(assessment.investigation_required);
    }

    #[test]
    fn test_very_high_value_is_high_severity() {
        let claim = file(Some(dec!(75000.01)));
        let assessment = FraudEngine::standard().evaluate(&claim, &[]);
        assert_eq!(assessment.severity, Some(Severity::High));
    }

    #[test]
    fn test_exactly_seventy_five_thousand_is_medium() {
        let claim = file(Some(dec!(75000)));
        let assessment = FraudEngine::standard().evaluate(&claim, &[]);
        assert_eq!(assessment.severity, Some(Severity::Medium));
    }

    #[test]
    fn test_claims_reported_after_are_ignored() {
        let claim = file(None);
        let later: Vec<_> = (1..=5)
            .map(|d| ClaimHistoryEntry {
                claim_id: ClaimId::new(),
                reported_date: claim.reported_date() + Duration::days(d),
            })
            .collect();
        assert!(FraudEngine::standard().evaluate(&claim, &later).is_clean());
    }

    #[test]
    fn test_alert_description_lists_indicators() {
        let claim = file(Some(dec!(90000)));
        let prior = history(&claim, &[1, 2, 3]);
        let alert = FraudEngine::standard()
            .evaluate(&claim, &prior)
            .to_alert(&claim, reported_at())
            .unwrap();
        assert_eq!(
            alert.description,
            "Potential fraud detected: high value claim, multiple recent claims"
        );
        assert_eq!(alert.risk_score, 75);
        assert_eq!(alert.severity, Severity::High);
    }
}

// ============================================================================
// PROPERTIES
// ============================================================================

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn evaluation_is_idempotent_and_bounded(
            loss_cents in proptest::option::of(0i64..20_000_000),
            offsets in proptest::collection::vec(0i64..200, 0..10),
        ) {
            let claim = file(loss_cents.map(|c| Decimal::new(c, 2)));
            let prior = history(&claim, &offsets);
            let engine = FraudEngine::standard();

            let first = engine.evaluate(&claim, &prior);
            let second = engine.evaluate(&claim, &prior);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.risk_score <= 100);
            prop_assert_eq!(first.investigation_required, !first.indicators.is_empty());
            prop_assert_eq!(first.severity.is_some(), first.investigation_required);
        }
    }
}
