//! Policy Aggregate Root
//!
//! The Policy aggregate owns its coverages, insured items, drivers and
//! locations; nothing outside it holds them. All changes go through methods
//! that keep these invariants:
//!
//! - `total_premium == Σ coverage premium + fees + taxes`
//! - every required coverage for the product is present before the policy
//!   leaves `QUOTE`
//! - effective date < expiration date (enforced by [`PolicyPeriod`])
//!
//! # State Machine
//!
//! ```text
//! QUOTE --decide--> BOUND | REFERRED
//! REFERRED --approve--> BOUND
//! QUOTE | REFERRED --re-rate--> QUOTE   (decision discarded)
//! BOUND --> ACTIVE --> EXPIRED | CANCELLED | SUSPENDED | NON_RENEWED
//! SUSPENDED --> ACTIVE
//! QUOTE | REFERRED | BOUND --> CANCELLED
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{Currency, CustomerId, PolicyId, PolicyPeriod, UserId};

use crate::coverage::{self, Coverage};
use crate::error::PolicyError;
use crate::events::PolicyEvent;
use crate::product::ProductType;
use crate::rating::{PremiumSummary, RatingResult};
use crate::risk::{Driver, InsuredItem, Location};
use crate::underwriting::{BindingAuthority, UnderwritingDecision};

/// Policy lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyStatus {
    Quote,
    Referred,
    Bound,
    Active,
    Expired,
    Cancelled,
    Suspended,
    NonRenewed,
}

impl PolicyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyStatus::Quote => "QUOTE",
            PolicyStatus::Referred => "REFERRED",
            PolicyStatus::Bound => "BOUND",
            PolicyStatus::Active => "ACTIVE",
            PolicyStatus::Expired => "EXPIRED",
            PolicyStatus::Cancelled => "CANCELLED",
            PolicyStatus::Suspended => "SUSPENDED",
            PolicyStatus::NonRenewed => "NON_RENEWED",
        }
    }

    /// Quote and referred policies may still change coverages
    pub fn is_pre_bind(&self) -> bool {
        matches!(self, PolicyStatus::Quote | PolicyStatus::Referred)
    }

    /// Lifecycle moves permitted through [`Policy::transition`]
    pub fn can_transition_to(&self, to: PolicyStatus) -> bool {
        use PolicyStatus::*;
        matches!(
            (self, to),
            (Referred, Bound)
                | (Bound, Active)
                | (Active, Expired)
                | (Active, Cancelled)
                | (Active, Suspended)
                | (Active, NonRenewed)
                | (Suspended, Active)
                | (Suspended, Cancelled)
                | (Quote, Cancelled)
                | (Referred, Cancelled)
                | (Bound, Cancelled)
        )
    }
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyStatus {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUOTE" => Ok(PolicyStatus::Quote),
            "REFERRED" => Ok(PolicyStatus::Referred),
            "BOUND" => Ok(PolicyStatus::Bound),
            "ACTIVE" => Ok(PolicyStatus::Active),
            "EXPIRED" => Ok(PolicyStatus::Expired),
            "CANCELLED" => Ok(PolicyStatus::Cancelled),
            "SUSPENDED" => Ok(PolicyStatus::Suspended),
            "NON_RENEWED" => Ok(PolicyStatus::NonRenewed),
            other => Err(PolicyError::validation(format!("unknown policy status {other}"))),
        }
    }
}

/// How the premium is paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentPlan {
    #[default]
    Annual,
    SemiAnnual,
    Quarterly,
    Monthly,
}

impl PaymentPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentPlan::Annual => "ANNUAL",
            PaymentPlan::SemiAnnual => "SEMI_ANNUAL",
            PaymentPlan::Quarterly => "QUARTERLY",
            PaymentPlan::Monthly => "MONTHLY",
        }
    }

    pub fn installments(&self) -> u32 {
        match self {
            PaymentPlan::Annual => 1,
            PaymentPlan::SemiAnnual => 2,
            PaymentPlan::Quarterly => 4,
            PaymentPlan::Monthly => 12,
        }
    }
}

impl FromStr for PaymentPlan {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANNUAL" => Ok(PaymentPlan::Annual),
            "SEMI_ANNUAL" => Ok(PaymentPlan::SemiAnnual),
            "QUARTERLY" => Ok(PaymentPlan::Quarterly),
            "MONTHLY" => Ok(PaymentPlan::Monthly),
            other => Err(PolicyError::validation(format!("unknown payment plan {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    #[default]
    Pending,
    Compliant,
    NonCompliant,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Pending => "PENDING",
            ComplianceStatus::Compliant => "COMPLIANT",
            ComplianceStatus::NonCompliant => "NON_COMPLIANT",
        }
    }
}

impl FromStr for ComplianceStatus {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ComplianceStatus::Pending),
            "COMPLIANT" => Ok(ComplianceStatus::Compliant),
            "NON_COMPLIANT" => Ok(ComplianceStatus::NonCompliant),
            other => Err(PolicyError::validation(format!("unknown compliance status {other}"))),
        }
    }
}

/// The Policy aggregate root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    id: PolicyId,
    policy_number: String,
    customer_id: CustomerId,
    product_type: ProductType,
    status: PolicyStatus,
    period: PolicyPeriod,
    payment_plan: PaymentPlan,
    currency: Currency,
    jurisdiction: String,
    coverages: Vec<Coverage>,
    insured_items: Vec<InsuredItem>,
    drivers: Vec<Driver>,
    locations: Vec<Location>,
    premium: PremiumSummary,
    decision: Option<UnderwritingDecision>,
    compliance_status: ComplianceStatus,
    created_by: Option<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<PolicyEvent>,
}

impl Policy {
    pub fn id(&self) -> PolicyId {
        self.id
    }

    pub fn policy_number(&self) -> &str {
        &self.policy_number
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn product_type(&self) -> ProductType {
        self.product_type
    }

    pub fn status(&self) -> PolicyStatus {
        self.status
    }

    pub fn period(&self) -> &PolicyPeriod {
        &self.period
    }

    pub fn payment_plan(&self) -> PaymentPlan {
        self.payment_plan
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// State used for premium tax
    pub fn jurisdiction(&self) -> &str {
        &self.jurisdiction
    }

    pub fn coverages(&self) -> &[Coverage] {
        &self.coverages
    }

    pub fn insured_items(&self) -> &[InsuredItem] {
        &self.insured_items
    }

    pub fn drivers(&self) -> &[Driver] {
        &self.drivers
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn premium(&self) -> &PremiumSummary {
        &self.premium
    }

    pub fn decision(&self) -> Option<&UnderwritingDecision> {
        self.decision.as_ref()
    }

    pub fn compliance_status(&self) -> ComplianceStatus {
        self.compliance_status
    }

    pub fn created_by(&self) -> Option<UserId> {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns accumulated domain events and clears them
    pub fn take_events(&mut self) -> Vec<PolicyEvent> {
        std::mem::take(&mut self.events)
    }

    /// Required coverage codes this policy still lacks
    pub fn missing_required_coverages(&self) -> Vec<String> {
        coverage::missing_required(
            self.product_type,
            self.coverages.iter().map(|c| c.code.as_str()),
        )
    }

    /// Replaces coverages and premium with a fresh rating.
    ///
    /// Any earlier underwriting decision no longer describes the policy, so
    /// it is discarded and a referred policy returns to `QUOTE`.
    ///
    /// # Errors
    ///
    /// `NotModifiable` once the policy is bound; `InconsistentPremium` if the
    /// rating's breakdown does not add up to its coverages
    pub fn apply_rating(&mut self, rating: RatingResult, at: DateTime<Utc>) -> Result<(), PolicyError> {
        if !self.status.is_pre_bind() {
            return Err(PolicyError::NotModifiable(self.status.to_string()));
        }
        if !rating.premium.is_consistent_with(&rating.coverages) {
            return Err(PolicyError::InconsistentPremium(format!(
                "total {} does not match coverages, fees and taxes",
                rating.premium.total_premium
            )));
        }
        if rating.premium.total_premium.currency() != self.currency {
            return Err(PolicyError::validation(format!(
                "rating currency {} differs from policy currency {}",
                rating.premium.total_premium.currency(),
                self.currency
            )));
        }

        if self.decision.take().is_some() {
            self.events.push(PolicyEvent::DecisionInvalidated {
                policy_id: self.id,
                timestamp: at,
            });
        }
        self.status = PolicyStatus::Quote;
        self.jurisdiction = rating.jurisdiction;
        self.premium = rating.premium;
        self.coverages = rating.coverages;
        self.updated_at = at;

        self.events.push(PolicyEvent::PolicyRated {
            policy_id: self.id,
            coverage_codes: self.coverages.iter().map(|c| c.code.clone()).collect(),
            total_premium: self.premium.total_premium.amount(),
            rate_table_version: rating.rate_table_version,
            timestamp: at,
        });
        Ok(())
    }

    /// Records an underwriting decision, moving the quote to `BOUND` when the
    /// decision grants automatic binding and to `REFERRED` otherwise.
    ///
    /// # Errors
    ///
    /// `InvalidStateTransition` unless the policy is a quote;
    /// `MissingRequiredCoverage` if a required coverage is absent
    pub fn apply_decision(
        &mut self,
        decision: UnderwritingDecision,
        at: DateTime<Utc>,
    ) -> Result<(), PolicyError> {
        if self.status != PolicyStatus::Quote {
            return Err(PolicyError::InvalidStateTransition {
                from: self.status.to_string(),
                to: "BOUND or REFERRED".to_string(),
            });
        }
        let missing = self.missing_required_coverages();
        if !missing.is_empty() {
            return Err(PolicyError::MissingRequiredCoverage {
                product: self.product_type,
                missing,
            });
        }
        self.ensure_premium_consistent()?;

        self.events.push(PolicyEvent::UnderwritingDecided {
            policy_id: self.id,
            risk_score: decision.risk_score,
            tier: decision.tier,
            binding_authority: decision.binding_authority,
            timestamp: at,
        });

        self.status = match decision.binding_authority {
            BindingAuthority::AutoBind => {
                self.events.push(PolicyEvent::PolicyBound { policy_id: self.id, timestamp: at });
                PolicyStatus::Bound
            }
            BindingAuthority::UnderwriterReview => {
                self.events.push(PolicyEvent::PolicyReferred { policy_id: self.id, timestamp: at });
                PolicyStatus::Referred
            }
        };
        self.decision = Some(decision);
        self.updated_at = at;
        Ok(())
    }

    /// Moves the policy along its lifecycle and returns the previous status
    ///
    /// # Errors
    ///
    /// `InvalidStateTransition` for moves outside the lifecycle graph
    pub fn transition(&mut self, to: PolicyStatus, at: DateTime<Utc>) -> Result<PolicyStatus, PolicyError> {
        let from = self.status;
        if !from.can_transition_to(to) {
            return Err(PolicyError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        if to == PolicyStatus::Bound && self.decision.is_none() {
            return Err(PolicyError::InvalidStateTransition {
                from: from.to_string(),
                to: "BOUND without an underwriting decision".to_string(),
            });
        }

        self.status = to;
        self.updated_at = at;
        self.events.push(PolicyEvent::StatusChanged {
            policy_id: self.id,
            from: from.to_string(),
            to: to.to_string(),
            timestamp: at,
        });
        Ok(from)
    }

    /// Records the outcome of a compliance review; a no-op when unchanged
    pub fn set_compliance_status(&mut self, status: ComplianceStatus, at: DateTime<Utc>) {
        if self.compliance_status == status {
            return;
        }
        let from = self.compliance_status;
        self.compliance_status = status;
        self.updated_at = at;
        self.events.push(PolicyEvent::ComplianceChanged {
            policy_id: self.id,
            from: from.as_str().to_string(),
            to: status.as_str().to_string(),
            timestamp: at,
        });
    }

    /// Moves the policy period. Dates are fixed once the policy is active.
    ///
    /// # Errors
    ///
    /// `NotModifiable` unless the policy is a quote, referred or bound
    pub fn reschedule(&mut self, period: PolicyPeriod, at: DateTime<Utc>) -> Result<(), PolicyError> {
        if !matches!(
            self.status,
            PolicyStatus::Quote | PolicyStatus::Referred | PolicyStatus::Bound
        ) {
            return Err(PolicyError::NotModifiable(self.status.to_string()));
        }
        if self.period == period {
            return Ok(());
        }
        self.period = period;
        self.updated_at = at;
        self.events.push(PolicyEvent::PeriodChanged {
            policy_id: self.id,
            effective: period.effective(),
            expiration: period.expiration(),
            timestamp: at,
        });
        Ok(())
    }

    /// Verifies every aggregate invariant; used when loading from storage
    pub fn check_invariants(&self) -> Result<(), PolicyError> {
        self.ensure_premium_consistent()?;
        if !self.status.is_pre_bind() {
            let missing = self.missing_required_coverages();
            if !missing.is_empty() {
                return Err(PolicyError::MissingRequiredCoverage {
                    product: self.product_type,
                    missing,
                });
            }
        }
        Ok(())
    }

    fn ensure_premium_consistent(&self) -> Result<(), PolicyError> {
        if !self.premium.is_consistent_with(&self.coverages) {
            return Err(PolicyError::InconsistentPremium(format!(
                "policy {} total {}",
                self.policy_number, self.premium.total_premium
            )));
        }
        Ok(())
    }

    /// Rebuilds a policy from stored parts, checking invariants
    pub fn restore(parts: PolicyParts) -> Result<Self, PolicyError> {
        let policy = Self {
            id: parts.id,
            policy_number: parts.policy_number,
            customer_id: parts.customer_id,
            product_type: parts.product_type,
            status: parts.status,
            period: parts.period,
            payment_plan: parts.payment_plan,
            currency: parts.currency,
            jurisdiction: parts.jurisdiction,
            coverages: parts.coverages,
            insured_items: parts.insured_items,
            drivers: parts.drivers,
            locations: parts.locations,
            premium: parts.premium,
            decision: parts.decision,
            compliance_status: parts.compliance_status,
            created_by: parts.created_by,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
            events: Vec::new(),
        };
        policy.check_invariants()?;
        Ok(policy)
    }
}

/// Plain field bag used by storage adapters to rebuild a [`Policy`]
#[derive(Debug, Clone)]
pub struct PolicyParts {
    pub id: PolicyId,
    pub policy_number: String,
    pub customer_id: CustomerId,
    pub product_type: ProductType,
    pub status: PolicyStatus,
    pub period: PolicyPeriod,
    pub payment_plan: PaymentPlan,
    pub currency: Currency,
    pub jurisdiction: String,
    pub coverages: Vec<Coverage>,
    pub insured_items: Vec<InsuredItem>,
    pub drivers: Vec<Driver>,
    pub locations: Vec<Location>,
    pub premium: PremiumSummary,
    pub decision: Option<UnderwritingDecision>,
    pub compliance_status: ComplianceStatus,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Builder for new policies in `QUOTE` status
///
/// # Example
///
/// ```rust,ignore
/// let policy = PolicyBuilder::new()
///     .policy_number(number)
///     .customer(customer_id)
///     .product(ProductType::PersonalAuto)
///     .period(period)
///     .add_insured_item(car)
///     .build(now)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct PolicyBuilder {
    policy_number: Option<String>,
    customer_id: Option<CustomerId>,
    product_type: Option<ProductType>,
    period: Option<PolicyPeriod>,
    payment_plan: PaymentPlan,
    currency: Currency,
    insured_items: Vec<InsuredItem>,
    drivers: Vec<Driver>,
    locations: Vec<Location>,
    created_by: Option<UserId>,
}

impl PolicyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn policy_number(mut self, number: impl Into<String>) -> Self {
        self.policy_number = Some(number.into());
        self
    }

    pub fn customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn product(mut self, product: ProductType) -> Self {
        self.product_type = Some(product);
        self
    }

    pub fn period(mut self, period: PolicyPeriod) -> Self {
        self.period = Some(period);
        self
    }

    pub fn payment_plan(mut self, plan: PaymentPlan) -> Self {
        self.payment_plan = plan;
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn add_insured_item(mut self, item: InsuredItem) -> Self {
        self.insured_items.push(item);
        self
    }

    pub fn insured_items(mut self, items: Vec<InsuredItem>) -> Self {
        self.insured_items = items;
        self
    }

    pub fn add_driver(mut self, driver: Driver) -> Self {
        self.drivers.push(driver);
        self
    }

    pub fn drivers(mut self, drivers: Vec<Driver>) -> Self {
        self.drivers = drivers;
        self
    }

    pub fn add_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    pub fn locations(mut self, locations: Vec<Location>) -> Self {
        self.locations = locations;
        self
    }

    pub fn created_by(mut self, user: UserId) -> Self {
        self.created_by = Some(user);
        self
    }

    /// Checks everything except the policy number, so that callers can
    /// reject an application before a number is allocated
    ///
    /// # Errors
    ///
    /// `MissingRequiredField` for absent identity fields, `Validation` when a
    /// child entity is invalid or the product's composition rules are not met
    /// (auto lines need a vehicle, homeowners and commercial property need a
    /// building or location)
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.customer_id.is_none() {
            return Err(PolicyError::MissingRequiredField("customer_id".to_string()));
        }
        let product_type = self
            .product_type
            .ok_or(PolicyError::MissingRequiredField("product_type".to_string()))?;
        let period = self
            .period
            .ok_or(PolicyError::MissingRequiredField("period".to_string()))?;

        let as_of = period.effective().date_naive();
        for item in &self.insured_items {
            item.validate()?;
        }
        for driver in &self.drivers {
            driver.validate(as_of)?;
        }
        for location in &self.locations {
            location.validate()?;
        }

        if product_type.is_auto() && !self.insured_items.iter().any(InsuredItem::is_vehicle) {
            return Err(PolicyError::validation(format!(
                "{product_type} requires at least one vehicle"
            )));
        }
        let needs_property = matches!(
            product_type,
            ProductType::Homeowners | ProductType::CommercialProperty
        );
        if needs_property
            && self.locations.is_empty()
            && !self.insured_items.iter().any(|i| !i.is_vehicle())
        {
            return Err(PolicyError::validation(format!(
                "{product_type} requires property information"
            )));
        }
        Ok(())
    }

    /// Builds the quote
    ///
    /// # Errors
    ///
    /// `MissingRequiredField` when the policy number is absent, plus
    /// everything [`PolicyBuilder::validate`] reports
    pub fn build(self, at: DateTime<Utc>) -> Result<Policy, PolicyError> {
        self.validate()?;
        let (Some(policy_number), Some(customer_id), Some(product_type), Some(period)) =
            (self.policy_number, self.customer_id, self.product_type, self.period)
        else {
            return Err(PolicyError::MissingRequiredField("policy_number".to_string()));
        };

        let id = PolicyId::new_v7();
        let jurisdiction = self
            .locations
            .first()
            .map(|l| l.state.clone())
            .unwrap_or_default();

        Ok(Policy {
            id,
            events: vec![PolicyEvent::PolicyQuoted {
                policy_id: id,
                policy_number: policy_number.clone(),
                timestamp: at,
            }],
            policy_number,
            customer_id,
            product_type,
            status: PolicyStatus::Quote,
            period,
            payment_plan: self.payment_plan,
            currency: self.currency,
            jurisdiction,
            coverages: Vec::new(),
            insured_items: self.insured_items,
            drivers: self.drivers,
            locations: self.locations,
            premium: PremiumSummary::zero(self.currency),
            decision: None,
            compliance_status: ComplianceStatus::Pending,
            created_by: self.created_by,
            created_at: at,
            updated_at: at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::CoverageRequest;
    use crate::rating::RatingEngine;
    use crate::risk::VehicleDetails;
    use crate::underwriting::{Tier, UnderwritingDecision};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn car() -> InsuredItem {
        InsuredItem::vehicle(
            VehicleDetails {
                year: 2020,
                make: "Honda".into(),
                model: "Civic".into(),
                vin: "2HGFC2F59LH000001".into(),
                vehicle_type: None,
                garaging_zip: None,
            },
            None,
        )
    }

    fn quote() -> Policy {
        PolicyBuilder::new()
            .policy_number("POL-2024-000001")
            .customer(CustomerId::new())
            .product(ProductType::PersonalAuto)
            .period(PolicyPeriod::annual(now()).unwrap())
            .add_insured_item(car())
            .build(now())
            .unwrap()
    }

    fn rating(codes: &[&str]) -> RatingResult {
        let requests: Vec<_> = codes
            .iter()
            .map(|c| CoverageRequest::new(*c).with_premium(dec!(300)))
            .collect();
        RatingEngine::default()
            .price(ProductType::PersonalAuto, &requests, "CA")
            .unwrap()
    }

    fn decision(authority: BindingAuthority) -> UnderwritingDecision {
        UnderwritingDecision {
            risk_score: 20,
            tier: Tier::Preferred,
            binding_authority: authority,
            factors: Vec::new(),
        }
    }

    #[test]
    fn test_new_policy_is_quote() {
        let mut policy = quote();
        assert_eq!(policy.status(), PolicyStatus::Quote);
        assert_eq!(policy.take_events().len(), 1);
    }

    #[test]
    fn test_auto_requires_vehicle() {
        let result = PolicyBuilder::new()
            .policy_number("POL-2024-000002")
            .customer(CustomerId::new())
            .product(ProductType::PersonalAuto)
            .period(PolicyPeriod::annual(now()).unwrap())
            .build(now());
        assert!(matches!(result, Err(PolicyError::Validation(_))));
    }

    #[test]
    fn test_auto_bind_decision_binds() {
        let mut policy = quote();
        policy.apply_rating(rating(&["BI", "PD"]), now()).unwrap();
        policy.apply_decision(decision(BindingAuthority::AutoBind), now()).unwrap();
        assert_eq!(policy.status(), PolicyStatus::Bound);
    }

    #[test]
    fn test_review_decision_refers() {
        let mut policy = quote();
        policy.apply_rating(rating(&["BI", "PD"]), now()).unwrap();
        policy
            .apply_decision(decision(BindingAuthority::UnderwriterReview), now())
            .unwrap();
        assert_eq!(policy.status(), PolicyStatus::Referred);
    }

    #[test]
    fn test_cannot_leave_quote_without_required_coverage() {
        let mut policy = quote();
        policy.apply_rating(rating(&["BI"]), now()).unwrap();
        let err = policy
            .apply_decision(decision(BindingAuthority::AutoBind), now())
            .unwrap_err();
        assert!(matches!(err, PolicyError::MissingRequiredCoverage { .. }));
        assert_eq!(policy.status(), PolicyStatus::Quote);
    }

    #[test]
    fn test_rerating_referred_policy_discards_decision() {
        let mut policy = quote();
        policy.apply_rating(rating(&["BI", "PD"]), now()).unwrap();
        policy
            .apply_decision(decision(BindingAuthority::UnderwriterReview), now())
            .unwrap();

        policy.apply_rating(rating(&["BI", "PD", "COLL"]), now()).unwrap();
        assert_eq!(policy.status(), PolicyStatus::Quote);
        assert!(policy.decision().is_none());
        assert!(policy
            .take_events()
            .iter()
            .any(|e| e.event_type() == "DecisionInvalidated"));
    }

    #[test]
    fn test_bound_policy_cannot_be_rerated() {
        let mut policy = quote();
        policy.apply_rating(rating(&["BI", "PD"]), now()).unwrap();
        policy.apply_decision(decision(BindingAuthority::AutoBind), now()).unwrap();
        assert!(matches!(
            policy.apply_rating(rating(&["BI", "PD"]), now()),
            Err(PolicyError::NotModifiable(_))
        ));
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut policy = quote();
        policy.apply_rating(rating(&["BI", "PD"]), now()).unwrap();
        policy.apply_decision(decision(BindingAuthority::AutoBind), now()).unwrap();

        assert_eq!(policy.transition(PolicyStatus::Active, now()).unwrap(), PolicyStatus::Bound);
        policy.transition(PolicyStatus::Suspended, now()).unwrap();
        policy.transition(PolicyStatus::Active, now()).unwrap();
        assert!(policy.transition(PolicyStatus::Quote, now()).is_err());
        policy.transition(PolicyStatus::Expired, now()).unwrap();
        assert!(policy.transition(PolicyStatus::Active, now()).is_err());
    }

    #[test]
    fn test_compliance_and_period_updates() {
        let mut policy = quote();
        policy.apply_rating(rating(&["BI", "PD"]), now()).unwrap();
        policy.apply_decision(decision(BindingAuthority::AutoBind), now()).unwrap();
        policy.take_events();

        policy.set_compliance_status(ComplianceStatus::Compliant, now());
        policy.set_compliance_status(ComplianceStatus::Compliant, now());
        let later = PolicyPeriod::annual(now() + chrono::Duration::days(30)).unwrap();
        policy.reschedule(later, now()).unwrap();

        assert_eq!(policy.compliance_status(), ComplianceStatus::Compliant);
        assert_eq!(policy.period(), &later);
        let events: Vec<_> = policy.take_events().iter().map(|e| e.event_type()).collect();
        assert_eq!(events, vec!["ComplianceChanged", "PeriodChanged"]);

        policy.transition(PolicyStatus::Active, now()).unwrap();
        assert!(matches!(
            policy.reschedule(PolicyPeriod::annual(now()).unwrap(), now()),
            Err(PolicyError::NotModifiable(_))
        ));
    }

    #[test]
    fn test_quote_cannot_jump_to_bound() {
        let mut policy = quote();
        assert!(policy.transition(PolicyStatus::Bound, now()).is_err());
    }

    #[test]
    fn test_restore_rejects_inconsistent_premium() {
        let mut policy = quote();
        policy.apply_rating(rating(&["BI", "PD"]), now()).unwrap();
        let mut premium = *policy.premium();
        premium.total_premium = core_kernel::Money::usd(dec!(1));

        let parts = PolicyParts {
            id: policy.id(),
            policy_number: policy.policy_number().to_string(),
            customer_id: policy.customer_id(),
            product_type: policy.product_type(),
            status: policy.status(),
            period: *policy.period(),
            payment_plan: policy.payment_plan(),
            currency: policy.currency(),
            jurisdiction: policy.jurisdiction().to_string(),
            coverages: policy.coverages().to_vec(),
            insured_items: policy.insured_items().to_vec(),
            drivers: policy.drivers().to_vec(),
            locations: policy.locations().to_vec(),
            premium,
            decision: None,
            compliance_status: policy.compliance_status(),
            created_by: None,
            created_at: now(),
            updated_at: now(),
        };
        assert!(matches!(Policy::restore(parts), Err(PolicyError::InconsistentPremium(_))));
    }
}
