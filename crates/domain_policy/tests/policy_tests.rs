//! Policy Aggregate Tests
//!
//! Covers quote construction, rating, underwriting outcomes and lifecycle
//! transitions of the Policy aggregate root.
//!
//! # Test Organization
//!
//! - `policy_creation` - PolicyBuilder validation and composition rules
//! - `binding` - rating plus underwriting into BOUND or REFERRED
//! - `policy_lifecycle` - status transitions after binding
//! - `enum_parsing` - status and plan string forms

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{CustomerId, PolicyPeriod};
use domain_policy::{
    BindingAuthority, BuildingDetails, CoverageRequest, Driver, InsuredItem, Location,
    PaymentPlan, Policy, PolicyBuilder, PolicyError, PolicyStatus, ProductType, RatedPolicy,
    RatingEngine, Tier, UnderwritingEngine, VehicleDetails,
};
use rust_decimal_macros::dec;

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn issued_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
}

fn vehicle() -> InsuredItem {
    InsuredItem::vehicle(
        VehicleDetails {
            year: 2019,
            make: "Subaru".into(),
            model: "Outback".into(),
            vin: "4S4BSANC5K3000001".into(),
            vehicle_type: Some("SUV".into()),
            garaging_zip: Some("98101".into()),
        },
        None,
    )
}

fn auto_quote() -> Policy {
    PolicyBuilder::new()
        .policy_number("POL-2024-000042")
        .customer(CustomerId::new())
        .product(ProductType::PersonalAuto)
        .period(PolicyPeriod::annual(issued_at()).unwrap())
        .add_insured_item(vehicle())
        .add_driver(Driver::named(
            "Ana",
            "Silva",
            NaiveDate::from_ymd_opt(1985, 4, 2).unwrap(),
            "WDL1234567",
            "WA",
        ))
        .build(issued_at())
        .unwrap()
}

fn underwrite(policy: &mut Policy, premium_each: rust_decimal::Decimal) {
    let requests = vec![
        CoverageRequest::new("BI").with_limit("50000/100000").with_premium(premium_each),
        CoverageRequest::new("PD").with_limit("50000").with_premium(premium_each),
    ];
    let rating = RatingEngine::default()
        .price_for_binding(policy.product_type(), &requests, "WA")
        .unwrap();
    policy.apply_rating(rating, issued_at()).unwrap();

    let decision = UnderwritingEngine::default().decide(&RatedPolicy {
        product: policy.product_type(),
        coverages: policy.coverages(),
        total_premium: policy.premium().total_premium,
        drivers: policy.drivers(),
        effective_date: policy.period().effective().date_naive(),
        prior_claims: 0,
    });
    policy.apply_decision(decision, issued_at()).unwrap();
}

// ============================================================================
// POLICY CREATION
// ============================================================================

mod policy_creation {
    use super::*;

    #[test]
    fn test_builder_requires_policy_number() {
        let result = PolicyBuilder::new()
            .customer(CustomerId::new())
            .product(ProductType::PersonalAuto)
            .period(PolicyPeriod::annual(issued_at()).unwrap())
            .add_insured_item(vehicle())
            .build(issued_at());
        assert!(matches!(result, Err(PolicyError::MissingRequiredField(f)) if f == "policy_number"));
    }

    #[test]
    fn test_new_quote_has_zero_premium() {
        let policy = auto_quote();
        assert_eq!(policy.status(), PolicyStatus::Quote);
        assert!(policy.premium().total_premium.is_zero());
        assert!(policy.coverages().is_empty());
        assert_eq!(policy.payment_plan(), PaymentPlan::Annual);
    }

    #[test]
    fn test_homeowners_requires_property() {
        let result = PolicyBuilder::new()
            .policy_number("POL-2024-000043")
            .customer(CustomerId::new())
            .product(ProductType::Homeowners)
            .period(PolicyPeriod::annual(issued_at()).unwrap())
            .build(issued_at());
        assert!(matches!(result, Err(PolicyError::Validation(_))));
    }

    #[test]
    fn test_homeowners_with_building() {
        let policy = PolicyBuilder::new()
            .policy_number("POL-2024-000044")
            .customer(CustomerId::new())
            .product(ProductType::Homeowners)
            .period(PolicyPeriod::annual(issued_at()).unwrap())
            .add_insured_item(InsuredItem::building(
                BuildingDetails {
                    address: "8 Birch Rd, Tampa FL".into(),
                    construction_type: None,
                    occupancy_type: None,
                    square_footage: Some(1850),
                    year_built: Some(1998),
                },
                None,
            ))
            .add_location(Location::new("8 Birch Rd", "Tampa", "fl", "33601"))
            .build(issued_at())
            .unwrap();
        assert_eq!(policy.jurisdiction(), "FL");
    }

    #[test]
    fn test_renters_needs_no_property_record() {
        let result = PolicyBuilder::new()
            .policy_number("POL-2024-000045")
            .customer(CustomerId::new())
            .product(ProductType::Renters)
            .period(PolicyPeriod::annual(issued_at()).unwrap())
            .build(issued_at());
        assert!(result.is_ok());
    }

    #[test]
    fn test_underage_driver_rejected() {
        let result = PolicyBuilder::new()
            .policy_number("POL-2024-000046")
            .customer(CustomerId::new())
            .product(ProductType::PersonalAuto)
            .period(PolicyPeriod::annual(issued_at()).unwrap())
            .add_insured_item(vehicle())
            .add_driver(Driver::named(
                "Tim",
                "Ng",
                NaiveDate::from_ymd_opt(2012, 1, 1).unwrap(),
                "X1",
                "WA",
            ))
            .build(issued_at());
        assert!(result.is_err());
    }
}

// ============================================================================
// BINDING
// ============================================================================

mod binding {
    use super::*;

    #[test]
    fn test_low_risk_auto_binds() {
        let mut policy = auto_quote();
        underwrite(&mut policy, dec!(300));

        assert_eq!(policy.status(), PolicyStatus::Bound);
        let decision = policy.decision().unwrap();
        assert_eq!(decision.tier, Tier::Preferred);
        assert_eq!(decision.binding_authority, BindingAuthority::AutoBind);
        assert!(policy.check_invariants().is_ok());
    }

    #[test]
    fn test_expensive_policy_is_referred() {
        let mut policy = auto_quote();
        underwrite(&mut policy, dec!(1500));

        assert_eq!(policy.status(), PolicyStatus::Referred);
        assert_eq!(policy.decision().unwrap().tier, Tier::Standard);
    }

    #[test]
    fn test_referred_policy_can_be_approved() {
        let mut policy = auto_quote();
        underwrite(&mut policy, dec!(1500));

        let previous = policy.transition(PolicyStatus::Bound, issued_at()).unwrap();
        assert_eq!(previous, PolicyStatus::Referred);
        assert_eq!(policy.status(), PolicyStatus::Bound);
    }

    #[test]
    fn test_events_trace_assembly() {
        let mut policy = auto_quote();
        underwrite(&mut policy, dec!(300));

        let types: Vec<_> = policy.take_events().iter().map(|e| e.event_type()).collect();
        assert_eq!(
            types,
            vec!["PolicyQuoted", "PolicyRated", "UnderwritingDecided", "PolicyBound"]
        );
        assert!(policy.take_events().is_empty());
    }

    #[test]
    fn test_total_premium_matches_breakdown() {
        let mut policy = auto_quote();
        underwrite(&mut policy, dec!(250));

        let premium = policy.premium();
        assert_eq!(premium.base_premium.amount(), dec!(500));
        assert_eq!(premium.fees.amount(), dec!(25));
        assert_eq!(premium.taxes.amount(), dec!(10));
        assert_eq!(premium.total_premium.amount(), dec!(535));
    }
}

// ============================================================================
// POLICY LIFECYCLE
// ============================================================================

mod policy_lifecycle {
    use super::*;

    #[test]
    fn test_bound_to_active_to_cancelled() {
        let mut policy = auto_quote();
        underwrite(&mut policy, dec!(300));

        policy.transition(PolicyStatus::Active, issued_at()).unwrap();
        policy.transition(PolicyStatus::Cancelled, issued_at()).unwrap();
        assert_eq!(policy.status(), PolicyStatus::Cancelled);
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [PolicyStatus::Expired, PolicyStatus::Cancelled, PolicyStatus::NonRenewed] {
            let mut policy = auto_quote();
            underwrite(&mut policy, dec!(300));
            policy.transition(PolicyStatus::Active, issued_at()).unwrap();
            policy.transition(terminal, issued_at()).unwrap();

            let err = policy.transition(PolicyStatus::Active, issued_at()).unwrap_err();
            assert!(matches!(err, PolicyError::InvalidStateTransition { .. }));
        }
    }

    #[test]
    fn test_quote_can_be_cancelled() {
        let mut policy = auto_quote();
        assert!(policy.transition(PolicyStatus::Cancelled, issued_at()).is_ok());
    }

    #[test]
    fn test_quote_cannot_activate() {
        let mut policy = auto_quote();
        assert!(policy.transition(PolicyStatus::Active, issued_at()).is_err());
        assert_eq!(policy.status(), PolicyStatus::Quote);
    }
}

// ============================================================================
// ENUM PARSING
// ============================================================================

mod enum_parsing {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            PolicyStatus::Quote,
            PolicyStatus::Referred,
            PolicyStatus::Bound,
            PolicyStatus::Active,
            PolicyStatus::Expired,
            PolicyStatus::Cancelled,
            PolicyStatus::Suspended,
            PolicyStatus::NonRenewed,
        ] {
            assert_eq!(status.as_str().parse::<PolicyStatus>().unwrap(), status);
        }
        assert!("LAPSED".parse::<PolicyStatus>().is_err());
    }

    #[test]
    fn test_payment_plan_installments() {
        assert_eq!("MONTHLY".parse::<PaymentPlan>().unwrap().installments(), 12);
        assert_eq!(PaymentPlan::Quarterly.installments(), 4);
    }
}
