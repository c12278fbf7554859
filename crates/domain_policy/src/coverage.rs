//! Coverages and the per-product coverage catalog
//!
//! A coverage is identified by a short code (`BI`, `PD`, `DWELLING`, ...).
//! Each product type has a catalog listing the codes it may carry and which
//! of them are required before the policy can leave quote status.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{CoverageId, Currency, Money, MAX_AMOUNT};

use crate::error::PolicyError;
use crate::product::ProductType;

/// Broad classification of a coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageType {
    Liability,
    PhysicalDamage,
    Property,
    Medical,
    Cargo,
}

impl CoverageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageType::Liability => "LIABILITY",
            CoverageType::PhysicalDamage => "PHYSICAL_DAMAGE",
            CoverageType::Property => "PROPERTY",
            CoverageType::Medical => "MEDICAL",
            CoverageType::Cargo => "CARGO",
        }
    }
}

impl FromStr for CoverageType {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIABILITY" => Ok(CoverageType::Liability),
            "PHYSICAL_DAMAGE" => Ok(CoverageType::PhysicalDamage),
            "PROPERTY" => Ok(CoverageType::Property),
            "MEDICAL" => Ok(CoverageType::Medical),
            "CARGO" => Ok(CoverageType::Cargo),
            other => Err(PolicyError::validation(format!("unknown coverage type {other}"))),
        }
    }
}

/// A coverage limit in either single (`"50000"`) or split
/// (`"100000/300000"`, per person / per occurrence) notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CoverageLimit {
    Single(Decimal),
    Split { per_person: Decimal, per_occurrence: Decimal },
}

impl CoverageLimit {
    /// The largest figure in the limit, used to gauge exposure
    pub fn highest(&self) -> Decimal {
        match self {
            CoverageLimit::Single(amount) => *amount,
            CoverageLimit::Split { per_person, per_occurrence } => (*per_person).max(*per_occurrence),
        }
    }
}

impl FromStr for CoverageLimit {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_amount = |part: &str| -> Result<Decimal, PolicyError> {
            let amount = Decimal::from_str(part.trim())
                .map_err(|_| PolicyError::InvalidCoverage(format!("malformed limit '{s}'")))?;
            if amount <= Decimal::ZERO {
                return Err(PolicyError::InvalidCoverage(format!("limit must be positive: '{s}'")));
            }
            if amount > MAX_AMOUNT {
                return Err(PolicyError::InvalidCoverage(format!("limit exceeds {MAX_AMOUNT}: '{s}'")));
            }
            Ok(amount)
        };

        match s.split_once('/') {
            None => Ok(CoverageLimit::Single(parse_amount(s)?)),
            Some((person, occurrence)) => {
                let per_person = parse_amount(person)?;
                let per_occurrence = parse_amount(occurrence)?;
                if per_person > per_occurrence {
                    return Err(PolicyError::InvalidCoverage(format!(
                        "per-person limit exceeds per-occurrence limit in '{s}'"
                    )));
                }
                Ok(CoverageLimit::Split { per_person, per_occurrence })
            }
        }
    }
}

impl fmt::Display for CoverageLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageLimit::Single(amount) => write!(f, "{}", amount.normalize()),
            CoverageLimit::Split { per_person, per_occurrence } => {
                write!(f, "{}/{}", per_person.normalize(), per_occurrence.normalize())
            }
        }
    }
}

impl TryFrom<String> for CoverageLimit {
    type Error = PolicyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CoverageLimit> for String {
    fn from(limit: CoverageLimit) -> Self {
        limit.to_string()
    }
}

/// Catalog entry describing a coverage a product may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageDefinition {
    pub code: &'static str,
    pub name: &'static str,
    pub coverage_type: CoverageType,
    pub required: bool,
}

const fn def(
    code: &'static str,
    name: &'static str,
    coverage_type: CoverageType,
    required: bool,
) -> CoverageDefinition {
    CoverageDefinition { code, name, coverage_type, required }
}

const PERSONAL_AUTO: &[CoverageDefinition] = &[
    def("BI", "Bodily Injury Liability", CoverageType::Liability, true),
    def("PD", "Property Damage Liability", CoverageType::Liability, true),
    def("COMP", "Comprehensive", CoverageType::PhysicalDamage, false),
    def("COLL", "Collision", CoverageType::PhysicalDamage, false),
    def("UM", "Uninsured Motorist", CoverageType::Liability, false),
    def("PIP", "Personal Injury Protection", CoverageType::Medical, false),
];

const HOMEOWNERS: &[CoverageDefinition] = &[
    def("DWELLING", "Dwelling Coverage", CoverageType::Property, true),
    def("OTHER_STRUCTURES", "Other Structures", CoverageType::Property, true),
    def("PERSONAL_PROPERTY", "Personal Property", CoverageType::Property, true),
    def("LIABILITY", "Personal Liability", CoverageType::Liability, true),
    def("MEDICAL_PAYMENTS", "Medical Payments to Others", CoverageType::Medical, false),
];

const RENTERS: &[CoverageDefinition] = &[
    def("PERSONAL_PROPERTY", "Personal Property", CoverageType::Property, true),
    def("LIABILITY", "Personal Liability", CoverageType::Liability, true),
    def("LOSS_OF_USE", "Loss of Use", CoverageType::Property, false),
    def("MEDICAL_PAYMENTS", "Medical Payments to Others", CoverageType::Medical, false),
];

const COMMERCIAL_AUTO: &[CoverageDefinition] = &[
    def("BI", "Bodily Injury Liability", CoverageType::Liability, true),
    def("PD", "Property Damage Liability", CoverageType::Liability, true),
    def("COMP", "Comprehensive", CoverageType::PhysicalDamage, false),
    def("COLL", "Collision", CoverageType::PhysicalDamage, false),
    def("CARGO", "Cargo Coverage", CoverageType::Cargo, false),
];

const COMMERCIAL_PROPERTY: &[CoverageDefinition] = &[
    def("BUILDING", "Building Coverage", CoverageType::Property, true),
    def("BUSINESS_PERSONAL_PROPERTY", "Business Personal Property", CoverageType::Property, true),
    def("BUSINESS_INCOME", "Business Income", CoverageType::Property, false),
    def("GENERAL_LIABILITY", "General Liability", CoverageType::Liability, false),
];

const UMBRELLA: &[CoverageDefinition] = &[
    def("UMBRELLA_LIABILITY", "Umbrella Liability", CoverageType::Liability, true),
    def("UNINSURED_MOTORIST_EXCESS", "Excess Uninsured Motorist", CoverageType::Liability, false),
];

/// The coverage catalog of a product
pub fn catalog(product: ProductType) -> &'static [CoverageDefinition] {
    match product {
        ProductType::PersonalAuto => PERSONAL_AUTO,
        ProductType::Homeowners => HOMEOWNERS,
        ProductType::Renters => RENTERS,
        ProductType::CommercialAuto => COMMERCIAL_AUTO,
        ProductType::CommercialProperty => COMMERCIAL_PROPERTY,
        ProductType::Umbrella => UMBRELLA,
    }
}

/// Looks up a code in a product's catalog
pub fn definition(product: ProductType, code: &str) -> Option<&'static CoverageDefinition> {
    catalog(product).iter().find(|d| d.code == code)
}

/// Codes that must be present before the policy may be bound
pub fn required_codes(product: ProductType) -> impl Iterator<Item = &'static str> {
    catalog(product).iter().filter(|d| d.required).map(|d| d.code)
}

/// Required codes absent from `present`, in catalog order
pub fn missing_required<'a, I>(product: ProductType, present: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    required_codes(product)
        .filter(|code| !present.clone().into_iter().any(|p| p == *code))
        .map(str::to_string)
        .collect()
}

/// A coverage selection as submitted on an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRequest {
    pub code: String,
    pub limit: Option<String>,
    pub deductible: Option<Decimal>,
    pub premium: Option<Decimal>,
}

impl CoverageRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            limit: None,
            deductible: None,
            premium: None,
        }
    }

    pub fn with_limit(mut self, limit: impl Into<String>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn with_deductible(mut self, deductible: Decimal) -> Self {
        self.deductible = Some(deductible);
        self
    }

    pub fn with_premium(mut self, premium: Decimal) -> Self {
        self.premium = Some(premium);
        self
    }
}

/// A coverage carried on a policy, owned by the policy aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    pub id: CoverageId,
    pub code: String,
    pub name: String,
    pub coverage_type: CoverageType,
    pub limit: Option<CoverageLimit>,
    pub deductible: Option<Money>,
    pub premium: Money,
}

impl Coverage {
    /// Resolves a request against the product catalog
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoverage` for codes outside the catalog, malformed
    /// limits, and negative or oversized deductibles and premiums. Amounts
    /// are kept to the cent.
    pub fn from_request(
        product: ProductType,
        request: &CoverageRequest,
        currency: Currency,
    ) -> Result<Self, PolicyError> {
        let definition = definition(product, &request.code).ok_or_else(|| {
            PolicyError::InvalidCoverage(format!(
                "coverage {} is not offered on {}",
                request.code, product
            ))
        })?;

        let limit = request
            .limit
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .map(CoverageLimit::from_str)
            .transpose()?;

        if let Some(deductible) = request.deductible {
            check_amount(&request.code, "deductible", deductible)?;
        }

        let premium = request.premium.unwrap_or(Decimal::ZERO);
        check_amount(&request.code, "premium", premium)?;

        Ok(Self {
            id: CoverageId::new_v7(),
            code: definition.code.to_string(),
            name: definition.name.to_string(),
            coverage_type: definition.coverage_type,
            limit,
            deductible: request.deductible.map(|d| Money::new(d, currency).round_to_currency()),
            premium: Money::new(premium, currency).round_to_currency(),
        })
    }
}

fn check_amount(code: &str, field: &str, amount: Decimal) -> Result<(), PolicyError> {
    if amount < Decimal::ZERO {
        return Err(PolicyError::InvalidCoverage(format!("{field} for {code} cannot be negative")));
    }
    if amount > MAX_AMOUNT {
        return Err(PolicyError::InvalidCoverage(format!("{field} for {code} exceeds {MAX_AMOUNT}")));
    }
    Ok(())
}
