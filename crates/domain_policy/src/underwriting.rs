//! Underwriting decision engine
//!
//! Scores a rated application and places it in a tier. The score is a
//! deterministic sum of named factors, clamped to 0..=100:
//!
//! | factor | points |
//! |---|---|
//! | product base | auto 20, homeowners 15, renters 5, commercial auto 30, commercial property 25, umbrella 20 |
//! | selected limits (sum of highest figures) | ≥ 1,000,000: 20; ≥ 500,000: 10; ≥ 250,000: 5 |
//! | total premium | > 5,000: 15; > 2,000: 8 |
//! | prior claims, trailing 3 years | 10 each, at most 30 |
//! | rated drivers under 25 (auto only) | 5 each, at most 15 |
//!
//! Tier ladder, first match wins:
//!
//! ```text
//! score <= 30 and total premium <= 2000  -> PREFERRED     / AUTO_BIND
//! score <= 50                            -> STANDARD      / UNDERWRITER_REVIEW
//! otherwise                              -> NON_STANDARD  / UNDERWRITER_REVIEW
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::Money;

use crate::coverage::Coverage;
use crate::error::PolicyError;
use crate::product::ProductType;
use crate::risk::Driver;

/// Underwriting tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Preferred,
    Standard,
    NonStandard,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Preferred => "PREFERRED",
            Tier::Standard => "STANDARD",
            Tier::NonStandard => "NON_STANDARD",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PREFERRED" => Ok(Tier::Preferred),
            "STANDARD" => Ok(Tier::Standard),
            "NON_STANDARD" => Ok(Tier::NonStandard),
            other => Err(PolicyError::validation(format!("unknown tier {other}"))),
        }
    }
}

/// Who may bind the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BindingAuthority {
    AutoBind,
    UnderwriterReview,
}

impl BindingAuthority {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingAuthority::AutoBind => "AUTO_BIND",
            BindingAuthority::UnderwriterReview => "UNDERWRITER_REVIEW",
        }
    }
}

impl fmt::Display for BindingAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingAuthority {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUTO_BIND" => Ok(BindingAuthority::AutoBind),
            "UNDERWRITER_REVIEW" => Ok(BindingAuthority::UnderwriterReview),
            other => Err(PolicyError::validation(format!("unknown binding authority {other}"))),
        }
    }
}

/// A named contribution to the risk score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub points: u32,
}

impl RiskFactor {
    fn new(name: impl Into<String>, points: u32) -> Self {
        Self { name: name.into(), points }
    }
}

/// Result of underwriting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderwritingDecision {
    pub risk_score: u8,
    pub tier: Tier,
    pub binding_authority: BindingAuthority,
    pub factors: Vec<RiskFactor>,
}

impl UnderwritingDecision {
    pub fn is_auto_bind(&self) -> bool {
        self.binding_authority == BindingAuthority::AutoBind
    }
}

/// Declared facts about a rated application
#[derive(Debug, Clone, Copy)]
pub struct RatedPolicy<'a> {
    pub product: ProductType,
    pub coverages: &'a [Coverage],
    pub total_premium: Money,
    pub drivers: &'a [Driver],
    pub effective_date: NaiveDate,
    /// Claims filed by the customer in the three years before the effective date
    pub prior_claims: u32,
}

/// Tier thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderwritingGuidelines {
    pub preferred_max_score: u8,
    pub preferred_max_premium: Decimal,
    pub standard_max_score: u8,
}

impl Default for UnderwritingGuidelines {
    fn default() -> Self {
        Self {
            preferred_max_score: 30,
            preferred_max_premium: dec!(2000),
            standard_max_score: 50,
        }
    }
}

/// Scores applications and assigns a tier
#[derive(Debug, Clone, Default)]
pub struct UnderwritingEngine {
    guidelines: UnderwritingGuidelines,
}

impl UnderwritingEngine {
    pub fn new(guidelines: UnderwritingGuidelines) -> Self {
        Self { guidelines }
    }

    pub fn guidelines(&self) -> &UnderwritingGuidelines {
        &self.guidelines
    }

    /// Scores and tiers a rated application
    pub fn decide(&self, policy: &RatedPolicy<'_>) -> UnderwritingDecision {
        let factors = risk_factors(policy);
        let risk_score = factors.iter().map(|f| f.points).sum::<u32>().min(100) as u8;
        let (tier, binding_authority) = self.classify(risk_score, policy.total_premium.amount());

        tracing::debug!(
            product = %policy.product,
            risk_score,
            tier = %tier,
            "Underwriting decision"
        );

        UnderwritingDecision { risk_score, tier, binding_authority, factors }
    }

    /// Applies the tier ladder to a score and total premium
    pub fn classify(&self, risk_score: u8, total_premium: Decimal) -> (Tier, BindingAuthority) {
        let g = &self.guidelines;
        if risk_score <= g.preferred_max_score && total_premium <= g.preferred_max_premium {
            (Tier::Preferred, BindingAuthority::AutoBind)
        } else if risk_score <= g.standard_max_score {
            (Tier::Standard, BindingAuthority::UnderwriterReview)
        } else {
            (Tier::NonStandard, BindingAuthority::UnderwriterReview)
        }
    }
}

fn product_base_points(product: ProductType) -> u32 {
    match product {
        ProductType::PersonalAuto => 20,
        ProductType::Homeowners => 15,
        ProductType::Renters => 5,
        ProductType::CommercialAuto => 30,
        ProductType::CommercialProperty => 25,
        ProductType::Umbrella => 20,
    }
}

fn risk_factors(policy: &RatedPolicy<'_>) -> Vec<RiskFactor> {
    let mut factors = vec![RiskFactor::new(
        format!("product base ({})", policy.product),
        product_base_points(policy.product),
    )];

    let exposure = policy
        .coverages
        .iter()
        .filter_map(|c| c.limit.map(|l| l.highest()))
        .fold(Decimal::ZERO, |total, limit| total.saturating_add(limit));
    let exposure_points = if exposure >= dec!(1000000) {
        20
    } else if exposure >= dec!(500000) {
        10
    } else if exposure >= dec!(250000) {
        5
    } else {
        0
    };
    if exposure_points > 0 {
        factors.push(RiskFactor::new("high selected limits", exposure_points));
    }

    let premium = policy.total_premium.amount();
    let premium_points = if premium > dec!(5000) {
        15
    } else if premium > dec!(2000) {
        8
    } else {
        0
    };
    if premium_points > 0 {
        factors.push(RiskFactor::new("high total premium", premium_points));
    }

    if policy.prior_claims > 0 {
        factors.push(RiskFactor::new(
            "prior claims in last 3 years",
            (policy.prior_claims.saturating_mul(10)).min(30),
        ));
    }

    if policy.product.is_auto() {
        let youthful = policy
            .drivers
            .iter()
            .filter(|d| d.is_rated() && d.age_on(policy.effective_date) < 25)
            .count() as u32;
        if youthful > 0 {
            factors.push(RiskFactor::new("drivers under 25", (youthful * 5).min(15)));
        }
    }

    factors
}
