//! Rating Engine Tests
//!
//! Tests for premium composition, rate table lookups and required coverage
//! enforcement.
//!
//! # Test Organization
//!
//! - `premium_composition` - base, fee, tax and total arithmetic
//! - `rate_tables` - fee and tax lookups with defaults
//! - `required_coverages` - catalog enforcement at binding
//! - `properties` - proptest invariants over arbitrary selections

use core_kernel::Currency;
use domain_policy::{
    CoverageRequest, PolicyError, ProductType, RateTables, RatingEngine,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn auto_selection() -> Vec<CoverageRequest> {
    vec![
        CoverageRequest::new("BI")
            .with_limit("100000/300000")
            .with_premium(dec!(400)),
        CoverageRequest::new("PD")
            .with_limit("50000")
            .with_premium(dec!(200)),
    ]
}

// ============================================================================
// PREMIUM COMPOSITION
// ============================================================================

mod premium_composition {
    use super::*;

    #[test]
    fn test_personal_auto_in_california() {
        let result = RatingEngine::default()
            .price_for_binding(ProductType::PersonalAuto, &auto_selection(), "CA")
            .unwrap();

        assert_eq!(result.premium.base_premium.amount(), dec!(600));
        assert_eq!(result.premium.fees.amount(), dec!(25));
        assert_eq!(result.premium.taxes.amount(), dec!(15));
        assert_eq!(result.premium.total_premium.amount(), dec!(640));
        assert_eq!(result.jurisdiction, "CA");
        assert_eq!(result.rate_table_version, "2024-01");
    }

    #[test]
    fn test_missing_premium_counts_as_zero() {
        let requests = vec![
            CoverageRequest::new("BI").with_premium(dec!(100)),
            CoverageRequest::new("PD"),
        ];
        let result = RatingEngine::default()
            .price(ProductType::PersonalAuto, &requests, "TX")
            .unwrap();

        assert_eq!(result.premium.base_premium.amount(), dec!(100));
        assert_eq!(result.premium.taxes.amount(), dec!(1.85));
        assert_eq!(result.premium.total_premium.amount(), dec!(126.85));
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        // 0.25 * 0.02 = 0.005 -> 0.01
        let requests = vec![
            CoverageRequest::new("BI").with_premium(dec!(0.25)),
            CoverageRequest::new("PD"),
        ];
        let result = RatingEngine::default()
            .price(ProductType::PersonalAuto, &requests, "VT")
            .unwrap();
        assert_eq!(result.premium.taxes.amount(), dec!(0.01));
    }

    #[test]
    fn test_jurisdiction_is_normalized() {
        let result = RatingEngine::default()
            .price(ProductType::PersonalAuto, &auto_selection(), " ny ")
            .unwrap();
        assert_eq!(result.jurisdiction, "NY");
        assert_eq!(result.premium.taxes.amount(), dec!(21.6));
    }

    #[test]
    fn test_duplicate_codes_rejected() {
        let mut requests = auto_selection();
        requests.push(CoverageRequest::new("PD").with_premium(dec!(10)));
        let err = RatingEngine::default()
            .price(ProductType::PersonalAuto, &requests, "CA")
            .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidCoverage(_)));
    }

    #[test]
    fn test_negative_premium_rejected() {
        let requests = vec![CoverageRequest::new("BI").with_premium(dec!(-1))];
        assert!(RatingEngine::default()
            .price(ProductType::PersonalAuto, &requests, "CA")
            .is_err());
    }

    #[test]
    fn test_code_outside_catalog_rejected() {
        let requests = vec![CoverageRequest::new("DWELLING").with_premium(dec!(100))];
        let err = RatingEngine::default()
            .price(ProductType::PersonalAuto, &requests, "CA")
            .unwrap_err();
        assert!(err.to_string().contains("DWELLING"));
    }
}

// ============================================================================
// RATE TABLES
// ============================================================================

mod rate_tables {
    use super::*;

    #[test]
    fn test_standard_fees_per_product() {
        let tables = RateTables::standard();
        assert_eq!(tables.fee_for(ProductType::PersonalAuto).amount(), dec!(25));
        assert_eq!(tables.fee_for(ProductType::Homeowners).amount(), dec!(35));
        assert_eq!(tables.fee_for(ProductType::CommercialProperty).amount(), dec!(100));
    }

    #[test]
    fn test_unknown_state_uses_default_rate() {
        let tables = RateTables::standard();
        assert_eq!(tables.tax_rate_for("VT").as_decimal(), dec!(0.02));
        assert_eq!(tables.tax_rate_for("ca").as_decimal(), dec!(0.025));
    }

    #[test]
    fn test_custom_tables_are_used() {
        let tables = RateTables::builder("2025-03")
            .currency(Currency::USD)
            .fee(ProductType::PersonalAuto, dec!(40))
            .tax_rate("CA", dec!(0.03))
            .build();
        let result = RatingEngine::new(tables)
            .price(ProductType::PersonalAuto, &auto_selection(), "CA")
            .unwrap();

        assert_eq!(result.premium.total_premium.amount(), dec!(658));
        assert_eq!(result.rate_table_version, "2025-03");
    }
}

// ============================================================================
// REQUIRED COVERAGES
// ============================================================================

mod required_coverages {
    use super::*;

    #[test]
    fn test_quote_reports_missing_codes() {
        let requests = vec![CoverageRequest::new("BI").with_premium(dec!(300))];
        let result = RatingEngine::default()
            .price(ProductType::PersonalAuto, &requests, "CA")
            .unwrap();
        assert_eq!(result.missing_required, vec!["PD".to_string()]);
        assert!(!result.is_bindable());
    }

    #[test]
    fn test_binding_names_every_missing_code() {
        let requests = vec![CoverageRequest::new("DWELLING").with_premium(dec!(900))];
        let err = RatingEngine::default()
            .price_for_binding(ProductType::Homeowners, &requests, "FL")
            .unwrap_err();

        match err {
            PolicyError::MissingRequiredCoverage { product, missing } => {
                assert_eq!(product, ProductType::Homeowners);
                assert_eq!(missing.len(), 3);
                assert!(missing.contains(&"OTHER_STRUCTURES".to_string()));
                assert!(missing.contains(&"PERSONAL_PROPERTY".to_string()));
                assert!(missing.contains(&"LIABILITY".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_every_product_has_required_coverage() {
        for product in ProductType::ALL {
            assert!(
                domain_policy::coverage::required_codes(product).count() > 0,
                "{product} has no required coverage"
            );
        }
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
        fn total_equals_base_plus_fees_plus_taxes(
            bi_cents in 0i64..5_000_000,
            pd_cents in 0i64..5_000_000,
            state in prop::sample::select(vec!["CA", "NY", "TX", "FL", "WA", "OR"]),
        ) {
            let requests = vec![
                CoverageRequest::new("BI").with_premium(Decimal::new(bi_cents, 2)),
                CoverageRequest::new("PD").with_premium(Decimal::new(pd_cents, 2)),
            ];
            let result = RatingEngine::default()
                .price_for_binding(ProductType::PersonalAuto, &requests, state)
                .unwrap();

            let p = result.premium;
            prop_assert_eq!(
                p.base_premium.amount(),
                Decimal::new(bi_cents, 2) + Decimal::new(pd_cents, 2)
            );
            prop_assert_eq!(
                p.total_premium.amount(),
                p.base_premium.amount() + p.fees.amount() + p.taxes.amount()
            );
            prop_assert!(p.is_consistent_with(&result.coverages));
            prop_assert_eq!(p.taxes.amount().scale() <= 2, true);
        }
    }
}
