//! Test Data Builders
//!
//! Builders for the two engine inputs, [`PolicyApplication`] and
//! [`ClaimSubmission`]. Defaults produce a request that succeeds, so tests
//! only set the fields they are about.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use app_services::{ClaimSubmission, PolicyApplication};
use core_kernel::{CustomerId, Money, PolicyId};
use domain_claims::{Participant, ParticipantKind, ParticipantRole};
use domain_policy::{
    CoverageRequest, Driver, InsuredItem, Location, PaymentPlan, ProductType,
};

use crate::fixtures::{fixed_now, RiskFixtures};

/// Required coverages of a product with the given per-coverage premium
pub fn required_coverages(product: ProductType, premium: Decimal) -> Vec<CoverageRequest> {
    domain_policy::coverage::required_codes(product)
        .map(|code| CoverageRequest::new(code).with_limit(default_limit(code)).with_premium(premium))
        .collect()
}

fn default_limit(code: &str) -> &'static str {
    match code {
        "BI" => "100000/300000",
        "PD" => "50000",
        "DWELLING" | "BUILDING" => "300000",
        "UMBRELLA_LIABILITY" => "1000000",
        _ => "100000",
    }
}

#[derive(Debug, Clone)]
pub struct ApplicationBuilder {
    application: PolicyApplication,
}

impl ApplicationBuilder {
    /// A twelve-month personal auto application in California: BI 400 and
    /// PD 200, one vehicle, one adult driver
    pub fn personal_auto(customer_id: CustomerId) -> Self {
        Self {
            application: PolicyApplication {
                customer_id,
                product_type: ProductType::PersonalAuto,
                effective_date: fixed_now(),
                expiration_date: fixed_now() + Duration::days(365),
                payment_plan: PaymentPlan::Annual,
                coverages: vec![
                    CoverageRequest::new("BI").with_limit("100000/300000").with_premium(dec!(400)),
                    CoverageRequest::new("PD").with_limit("50000").with_premium(dec!(200)),
                ],
                insured_items: vec![RiskFixtures::vehicle()],
                drivers: vec![RiskFixtures::adult_driver()],
                locations: vec![RiskFixtures::location_in("CA")],
            },
        }
    }

    /// A homeowners application with every required coverage at 250
    pub fn homeowners(customer_id: CustomerId) -> Self {
        Self {
            application: PolicyApplication {
                customer_id,
                product_type: ProductType::Homeowners,
                effective_date: fixed_now(),
                expiration_date: fixed_now() + Duration::days(365),
                payment_plan: PaymentPlan::Annual,
                coverages: required_coverages(ProductType::Homeowners, dec!(250)),
                insured_items: vec![RiskFixtures::dwelling("22 Valencia St")],
                drivers: Vec::new(),
                locations: vec![RiskFixtures::location_in("CA")],
            },
        }
    }

    pub fn effective(mut self, at: DateTime<Utc>) -> Self {
        let term = self.application.expiration_date - self.application.effective_date;
        self.application.effective_date = at;
        self.application.expiration_date = at + term;
        self
    }

    pub fn expiration(mut self, at: DateTime<Utc>) -> Self {
        self.application.expiration_date = at;
        self
    }

    pub fn payment_plan(mut self, plan: PaymentPlan) -> Self {
        self.application.payment_plan = plan;
        self
    }

    pub fn coverages(mut self, coverages: Vec<CoverageRequest>) -> Self {
        self.application.coverages = coverages;
        self
    }

    pub fn add_coverage(mut self, coverage: CoverageRequest) -> Self {
        self.application.coverages.push(coverage);
        self
    }

    /// Drops a coverage code from the selection
    pub fn without_coverage(mut self, code: &str) -> Self {
        self.application.coverages.retain(|c| c.code != code);
        self
    }

    pub fn insured_items(mut self, items: Vec<InsuredItem>) -> Self {
        self.application.insured_items = items;
        self
    }

    pub fn drivers(mut self, drivers: Vec<Driver>) -> Self {
        self.application.drivers = drivers;
        self
    }

    pub fn locations(mut self, locations: Vec<Location>) -> Self {
        self.application.locations = locations;
        self
    }

    pub fn build(self) -> PolicyApplication {
        self.application
    }
}

#[derive(Debug, Clone)]
pub struct ClaimSubmissionBuilder {
    submission: ClaimSubmission,
}

impl ClaimSubmissionBuilder {
    /// A loss two days before the fixed test date with a 2,500 reserve
    pub fn new(policy_id: PolicyId, customer_id: CustomerId) -> Self {
        Self {
            submission: ClaimSubmission {
                policy_id,
                customer_id,
                loss_date: fixed_now() - Duration::days(2),
                description: "Rear-ended at a stop light".into(),
                loss_amount: None,
                reserve_amount: Some(Money::usd(dec!(2500))),
                loss_location: Some("Mission St & 16th St".into()),
                participants: vec![Participant::new(
                    ParticipantKind::Individual,
                    "Lee Park",
                    ParticipantRole::ThirdParty,
                )],
            },
        }
    }

    pub fn loss_amount(mut self, amount: Decimal) -> Self {
        self.submission.loss_amount = Some(Money::usd(amount));
        self
    }

    pub fn reserve_amount(mut self, amount: Decimal) -> Self {
        self.submission.reserve_amount = Some(Money::usd(amount));
        self
    }

    pub fn loss_date(mut self, at: DateTime<Utc>) -> Self {
        self.submission.loss_date = at;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.submission.description = description.into();
        self
    }

    pub fn customer(mut self, customer_id: CustomerId) -> Self {
        self.submission.customer_id = customer_id;
        self
    }

    pub fn build(self) -> ClaimSubmission {
        self.submission
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_coverages_cover_catalog() {
        let coverages = required_coverages(ProductType::Homeowners, dec!(100));
        let codes: Vec<_> = coverages.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["DWELLING", "OTHER_STRUCTURES", "PERSONAL_PROPERTY", "LIABILITY"]);
    }

    #[test]
    fn test_effective_keeps_term() {
        let start = fixed_now() + Duration::days(30);
        let application = ApplicationBuilder::personal_auto(CustomerId::new()).effective(start).build();
        assert_eq!(application.expiration_date - application.effective_date, Duration::days(365));
    }

    #[test]
    fn test_without_coverage() {
        let application = ApplicationBuilder::personal_auto(CustomerId::new())
            .without_coverage("PD")
            .build();
        assert_eq!(application.coverages.len(), 1);
    }
}
