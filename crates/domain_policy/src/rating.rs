//! Rating engine
//!
//! Turns coverage selections into a priced premium breakdown:
//!
//! ```text
//! base_premium  = Σ coverage premium (missing premium counts as 0)
//! fees          = fee schedule[product]            (default 25.00)
//! taxes         = base_premium × tax rate[state]   (default 2%), rounded to cents
//! total_premium = base_premium + fees + taxes
//! ```
//!
//! Fee and tax tables live in an immutable [`RateTables`] value handed to the
//! engine at construction, so several table versions can be used side by side
//! (for example a new filing effective next quarter). Rating is pure.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use core_kernel::{Currency, Money, Rate};

use crate::coverage::{self, Coverage, CoverageRequest};
use crate::error::PolicyError;
use crate::product::ProductType;

/// Immutable fee and tax configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTables {
    version: String,
    currency: Currency,
    fees: HashMap<ProductType, Decimal>,
    default_fee: Decimal,
    tax_rates: HashMap<String, Decimal>,
    default_tax_rate: Decimal,
}

impl RateTables {
    /// The carrier's current filing
    pub fn standard() -> Self {
        RateTablesBuilder::new("2024-01")
            .fee(ProductType::PersonalAuto, dec!(25))
            .fee(ProductType::Homeowners, dec!(35))
            .fee(ProductType::Renters, dec!(15))
            .fee(ProductType::CommercialAuto, dec!(75))
            .fee(ProductType::CommercialProperty, dec!(100))
            .fee(ProductType::Umbrella, dec!(25))
            .tax_rate("CA", dec!(0.025))
            .tax_rate("NY", dec!(0.036))
            .tax_rate("TX", dec!(0.0185))
            .tax_rate("FL", dec!(0.0175))
            .tax_rate("WA", dec!(0.02))
            .build()
    }

    pub fn builder(version: impl Into<String>) -> RateTablesBuilder {
        RateTablesBuilder::new(version)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Policy fee for a product; products without an entry pay the default fee
    pub fn fee_for(&self, product: ProductType) -> Money {
        let fee = self.fees.get(&product).copied().unwrap_or(self.default_fee);
        Money::new(fee, self.currency)
    }

    /// Premium tax rate for a state; unknown states use the default rate
    pub fn tax_rate_for(&self, state: &str) -> Rate {
        let key = state.trim().to_ascii_uppercase();
        Rate::new(self.tax_rates.get(&key).copied().unwrap_or(self.default_tax_rate))
    }
}

impl Default for RateTables {
    fn default() -> Self {
        Self::standard()
    }
}

/// Builder for [`RateTables`]
#[derive(Debug, Clone)]
pub struct RateTablesBuilder {
    tables: RateTables,
}

impl RateTablesBuilder {
    /// Starts from empty schedules with the default fee of 25 and tax of 2%
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            tables: RateTables {
                version: version.into(),
                currency: Currency::USD,
                fees: HashMap::new(),
                default_fee: dec!(25),
                tax_rates: HashMap::new(),
                default_tax_rate: dec!(0.02),
            },
        }
    }

    /// Starts from an existing table set, e.g. to publish a revision
    pub fn from_tables(tables: &RateTables, version: impl Into<String>) -> Self {
        let mut tables = tables.clone();
        tables.version = version.into();
        Self { tables }
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.tables.currency = currency;
        self
    }

    pub fn fee(mut self, product: ProductType, amount: Decimal) -> Self {
        self.tables.fees.insert(product, amount);
        self
    }

    pub fn default_fee(mut self, amount: Decimal) -> Self {
        self.tables.default_fee = amount;
        self
    }

    pub fn tax_rate(mut self, state: &str, rate: Decimal) -> Self {
        self.tables.tax_rates.insert(state.to_ascii_uppercase(), rate);
        self
    }

    pub fn default_tax_rate(mut self, rate: Decimal) -> Self {
        self.tables.default_tax_rate = rate;
        self
    }

    pub fn build(self) -> RateTables {
        self.tables
    }
}

/// Premium breakdown carried by a rated policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumSummary {
    pub base_premium: Money,
    pub fees: Money,
    pub taxes: Money,
    pub total_premium: Money,
}

impl PremiumSummary {
    /// Composes a summary, deriving the total from its parts
    ///
    /// # Errors
    ///
    /// `Financial` when the total overflows or exceeds [`core_kernel::MAX_AMOUNT`]
    pub fn compose(base_premium: Money, fees: Money, taxes: Money) -> Result<Self, PolicyError> {
        let total_premium = base_premium
            .checked_add(&fees)
            .and_then(|m| m.checked_add(&taxes))
            .and_then(|m| m.ensure_within_limit())?;
        Ok(Self { base_premium, fees, taxes, total_premium })
    }

    /// All zero, used before a policy is rated
    pub fn zero(currency: Currency) -> Self {
        let zero = Money::zero(currency);
        Self { base_premium: zero, fees: zero, taxes: zero, total_premium: zero }
    }

    /// True when `total = Σ coverage premiums + fees + taxes`
    pub fn is_consistent_with(&self, coverages: &[Coverage]) -> bool {
        let currency = self.base_premium.currency();
        let Ok(base) = Money::sum(currency, coverages.iter().map(|c| &c.premium)) else {
            return false;
        };
        let Ok(expected) = PremiumSummary::compose(base, self.fees, self.taxes) else {
            return false;
        };
        expected == *self
    }
}

/// Outcome of rating an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingResult {
    pub coverages: Vec<Coverage>,
    pub premium: PremiumSummary,
    pub jurisdiction: String,
    pub rate_table_version: String,
    /// Required coverage codes absent from the selection
    pub missing_required: Vec<String>,
}

impl RatingResult {
    pub fn is_bindable(&self) -> bool {
        self.missing_required.is_empty()
    }
}

/// Prices coverage selections against a set of [`RateTables`]
#[derive(Debug, Clone)]
pub struct RatingEngine {
    tables: Arc<RateTables>,
}

impl RatingEngine {
    pub fn new(tables: RateTables) -> Self {
        Self { tables: Arc::new(tables) }
    }

    pub fn tables(&self) -> &RateTables {
        &self.tables
    }

    /// Prices the selection without enforcing required coverages, so that
    /// partial selections can be quoted. Missing codes are reported on the
    /// result.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoverage` for duplicate codes, codes outside the
    /// product's catalog, malformed limits, and negative deductibles or premiums
    pub fn price(
        &self,
        product: ProductType,
        requests: &[CoverageRequest],
        jurisdiction: &str,
    ) -> Result<RatingResult, PolicyError> {
        let currency = self.tables.currency();

        let mut seen = HashSet::new();
        let mut coverages = Vec::with_capacity(requests.len());
        for request in requests {
            if !seen.insert(request.code.as_str()) {
                return Err(PolicyError::InvalidCoverage(format!(
                    "coverage {} selected more than once",
                    request.code
                )));
            }
            coverages.push(Coverage::from_request(product, request, currency)?);
        }

        let base_premium = Money::sum(currency, coverages.iter().map(|c| &c.premium))?;
        let fees = self.tables.fee_for(product);
        let taxes = self.tables.tax_rate_for(jurisdiction).apply(&base_premium)?;
        let premium = PremiumSummary::compose(base_premium, fees, taxes)?;

        let missing_required =
            coverage::missing_required(product, coverages.iter().map(|c| c.code.as_str()));

        Ok(RatingResult {
            coverages,
            premium,
            jurisdiction: jurisdiction.trim().to_ascii_uppercase(),
            rate_table_version: self.tables.version().to_string(),
            missing_required,
        })
    }

    /// Fails with every required code of the product absent from the
    /// selection. Runs before pricing so that the check does not depend on
    /// the rest of the application being well formed.
    pub fn validate_required(
        &self,
        product: ProductType,
        requests: &[CoverageRequest],
    ) -> Result<(), PolicyError> {
        let missing = coverage::missing_required(product, requests.iter().map(|r| r.code.as_str()));
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PolicyError::MissingRequiredCoverage { product, missing })
        }
    }

    /// Prices the selection and fails if any required coverage is absent
    ///
    /// # Errors
    ///
    /// Everything [`RatingEngine::price`] returns, plus
    /// `MissingRequiredCoverage` naming every absent required code
    pub fn price_for_binding(
        &self,
        product: ProductType,
        requests: &[CoverageRequest],
        jurisdiction: &str,
    ) -> Result<RatingResult, PolicyError> {
        self.validate_required(product, requests)?;
        self.price(product, requests, jurisdiction)
    }
}

impl Default for RatingEngine {
    fn default() -> Self {
        Self::new(RateTables::standard())
    }
}
