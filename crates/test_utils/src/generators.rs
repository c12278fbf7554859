//! Property-Based Test Generators
//!
//! Proptest strategies for rating and underwriting inputs that respect the
//! domain's own constraints (known products, catalog coverage codes,
//! non-negative cent amounts).

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::Money;
use domain_policy::{CoverageRequest, ProductType};

pub fn product_strategy() -> impl Strategy<Value = ProductType> {
    prop_oneof![
        Just(ProductType::PersonalAuto),
        Just(ProductType::Homeowners),
        Just(ProductType::Renters),
        Just(ProductType::CommercialAuto),
        Just(ProductType::CommercialProperty),
        Just(ProductType::Umbrella),
    ]
}

/// States with a dedicated tax rate plus a few that fall back to the default
pub fn state_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("CA"), Just("NY"), Just("TX"), Just("FL"), Just("WA"),
        Just("OR"), Just("NV"), Just("CO"),
    ]
    .prop_map(str::to_string)
}

/// Premium amounts from 0.00 to 20,000.00 in whole cents
pub fn premium_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..2_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

pub fn usd_strategy() -> impl Strategy<Value = Money> {
    premium_strategy().prop_map(Money::usd)
}

/// Every required coverage of `product` plus a random subset of the
/// optional ones, each with a random premium
pub fn complete_coverages_strategy(product: ProductType) -> impl Strategy<Value = Vec<CoverageRequest>> {
    let catalog = domain_policy::coverage::catalog(product);
    let premiums = proptest::collection::vec(premium_strategy(), catalog.len());
    let picks = proptest::collection::vec(any::<bool>(), catalog.len());
    (premiums, picks).prop_map(move |(premiums, picks)| {
        catalog
            .iter()
            .zip(premiums)
            .zip(picks)
            .filter(|((definition, _), pick)| definition.required || *pick)
            .map(|((definition, premium), _)| CoverageRequest::new(definition.code).with_premium(premium))
            .collect()
    })
}

/// A product together with a complete coverage selection for it
pub fn product_with_coverages() -> impl Strategy<Value = (ProductType, Vec<CoverageRequest>)> {
    product_strategy().prop_flat_map(|product| (Just(product), complete_coverages_strategy(product)))
}

pub fn birth_date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1940i32..2006, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn complete_selection_has_no_missing_codes((product, coverages) in product_with_coverages()) {
            let missing = domain_policy::coverage::missing_required(
                product,
                coverages.iter().map(|c| c.code.as_str()).collect::<Vec<_>>(),
            );
            prop_assert!(missing.is_empty());
        }

        #[test]
        fn premiums_are_non_negative(amount in premium_strategy()) {
            prop_assert!(amount >= Decimal::ZERO);
            prop_assert!(amount.scale() <= 2);
        }
    }
}
