//! Row types and their mapping into domain aggregates
//!
//! Enumerations are stored as their upper-case wire names. Nested value
//! objects that are only ever read back whole (insured item details, the
//! underwriting decision) are stored as JSONB.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

use app_services::{ClaimSummary, OutboxMessage, PolicySummary};
use core_kernel::{
    ClaimId, CoverageId, Currency, CustomerId, DriverId, InsuredItemId, LocationId, Money,
    OutboxMessageId, ParticipantId, PolicyId, PolicyPeriod, UserId,
};
use domain_claims::{AdjusterLoad, Claim, ClaimHistoryEntry, ClaimParts, Participant};
use domain_party::{Address, Customer};
use domain_policy::{
    Coverage, CoverageLimit, Driver, InsuredItem, InsuredItemKind, Location, Policy, PolicyParts,
    PremiumSummary, UnderwritingDecision,
};

use crate::error::DatabaseError;

/// Parses a stored enumeration through its `FromStr` impl
pub(crate) fn parse<T>(table: &'static str, value: &str) -> Result<T, DatabaseError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e: T::Err| DatabaseError::corrupt(table, format!("'{value}': {e}")))
}

/// Wire name of a unit-variant enum that only derives serde
pub(crate) fn to_text<T: Serialize>(value: &T) -> Result<String, DatabaseError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => Ok(s),
        Ok(other) => Err(DatabaseError::corrupt("enum", format!("not a unit variant: {other}"))),
        Err(e) => Err(DatabaseError::corrupt("enum", e.to_string())),
    }
}

pub(crate) fn from_text<T: DeserializeOwned>(table: &'static str, value: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|e| DatabaseError::corrupt(table, format!("'{value}': {e}")))
}

/// `%term%` for ILIKE with the wildcard characters escaped; `None` for a blank term
pub(crate) fn like_pattern(term: &str) -> Option<String> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}

fn money(amount: Decimal, currency: Currency) -> Money {
    Money::new(amount, currency)
}

// ============================================================================
// Customers
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct CustomerRow {
    pub customer_id: Uuid,
    pub customer_type: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub business_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = DatabaseError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        Ok(Customer {
            id: CustomerId::from_uuid(row.customer_id),
            customer_type: parse("customers", &row.customer_type)?,
            first_name: row.first_name,
            last_name: row.last_name,
            business_name: row.business_name,
            email: row.email,
            phone: row.phone,
            date_of_birth: row.date_of_birth,
            address: Address::new(row.street, row.city, row.state.trim(), row.zip_code),
            created_at: row.created_at,
        })
    }
}

// ============================================================================
// Policies
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct PolicyRow {
    pub policy_id: Uuid,
    pub policy_number: String,
    pub customer_id: Uuid,
    pub product_type: String,
    pub status: String,
    pub effective_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    pub payment_plan: String,
    pub currency: String,
    pub jurisdiction: String,
    pub base_premium: Decimal,
    pub fees: Decimal,
    pub taxes: Decimal,
    pub total_premium: Decimal,
    pub underwriting: Option<Json<UnderwritingDecision>>,
    pub compliance_status: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CoverageRow {
    pub coverage_id: Uuid,
    pub code: String,
    pub name: String,
    pub coverage_type: String,
    pub coverage_limit: Option<String>,
    pub deductible: Option<Decimal>,
    pub premium: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct InsuredItemRow {
    pub item_id: Uuid,
    pub description: String,
    pub details: Json<InsuredItemKind>,
    pub covered_amount: Option<Decimal>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DriverRow {
    pub driver_id: Uuid,
    pub driver_type: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub license_number: String,
    pub license_state: String,
    pub years_licensed: Option<i32>,
}

#[derive(Debug, Clone, FromRow)]
pub struct LocationRow {
    pub location_id: Uuid,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub construction_type: Option<String>,
    pub occupancy_type: Option<String>,
    pub year_built: Option<i32>,
}

/// A policy row together with its child rows, in stored order
#[derive(Debug, Clone)]
pub struct PolicyRecord {
    pub policy: PolicyRow,
    pub coverages: Vec<CoverageRow>,
    pub insured_items: Vec<InsuredItemRow>,
    pub drivers: Vec<DriverRow>,
    pub locations: Vec<LocationRow>,
}

impl PolicyRecord {
    pub fn into_policy(self) -> Result<Policy, DatabaseError> {
        let row = self.policy;
        let currency: Currency = parse("policies", &row.currency)?;
        let period = PolicyPeriod::new(row.effective_date, row.expiration_date)
            .map_err(|e| DatabaseError::corrupt("policies", e.to_string()))?;

        let coverages = self
            .coverages
            .into_iter()
            .map(|c| {
                Ok(Coverage {
                    id: CoverageId::from_uuid(c.coverage_id),
                    code: c.code,
                    name: c.name,
                    coverage_type: parse("coverages", &c.coverage_type)?,
                    limit: c
                        .coverage_limit
                        .as_deref()
                        .map(|l| parse::<CoverageLimit>("coverages", l))
                        .transpose()?,
                    deductible: c.deductible.map(|d| money(d, currency)),
                    premium: money(c.premium, currency),
                })
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;

        let insured_items = self
            .insured_items
            .into_iter()
            .map(|i| InsuredItem {
                id: InsuredItemId::from_uuid(i.item_id),
                kind: i.details.0,
                description: i.description,
                covered_amount: i.covered_amount.map(|a| money(a, currency)),
            })
            .collect();

        let drivers = self
            .drivers
            .into_iter()
            .map(|d| {
                Ok(Driver {
                    id: DriverId::from_uuid(d.driver_id),
                    driver_type: from_text("drivers", &d.driver_type)?,
                    first_name: d.first_name,
                    last_name: d.last_name,
                    date_of_birth: d.date_of_birth,
                    license_number: d.license_number,
                    license_state: d.license_state,
                    years_licensed: d.years_licensed.and_then(|y| u32::try_from(y).ok()),
                })
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;

        let locations = self
            .locations
            .into_iter()
            .map(|l| {
                Ok(Location {
                    id: LocationId::from_uuid(l.location_id),
                    street: l.street,
                    city: l.city,
                    state: l.state,
                    zip_code: l.zip_code,
                    construction_type: l
                        .construction_type
                        .as_deref()
                        .map(|v| from_text("locations", v))
                        .transpose()?,
                    occupancy_type: l
                        .occupancy_type
                        .as_deref()
                        .map(|v| from_text("locations", v))
                        .transpose()?,
                    year_built: l.year_built,
                })
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;

        Policy::restore(PolicyParts {
            id: PolicyId::from_uuid(row.policy_id),
            policy_number: row.policy_number,
            customer_id: CustomerId::from_uuid(row.customer_id),
            product_type: parse("policies", &row.product_type)?,
            status: parse("policies", &row.status)?,
            period,
            payment_plan: parse("policies", &row.payment_plan)?,
            currency,
            jurisdiction: row.jurisdiction.trim().to_string(),
            coverages,
            insured_items,
            drivers,
            locations,
            premium: PremiumSummary {
                base_premium: money(row.base_premium, currency),
                fees: money(row.fees, currency),
                taxes: money(row.taxes, currency),
                total_premium: money(row.total_premium, currency),
            },
            decision: row.underwriting.map(|d| d.0),
            compliance_status: parse("policies", &row.compliance_status)?,
            created_by: row.created_by.map(UserId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .map_err(|e| DatabaseError::corrupt("policies", e.to_string()))
    }
}

// ============================================================================
// Claims
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct ClaimRow {
    pub claim_id: Uuid,
    pub claim_number: String,
    pub policy_id: Uuid,
    pub customer_id: Uuid,
    pub status: String,
    pub loss_date: DateTime<Utc>,
    pub reported_date: DateTime<Utc>,
    pub description: String,
    pub loss_amount: Option<Decimal>,
    pub reserve_amount: Option<Decimal>,
    pub currency: String,
    pub loss_location: Option<String>,
    pub assigned_adjuster: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ParticipantRow {
    pub participant_id: Uuid,
    pub kind: String,
    pub name: String,
    pub role: String,
    pub contact: Option<String>,
}

impl ClaimRow {
    pub fn into_claim(self, participants: Vec<ParticipantRow>) -> Result<Claim, DatabaseError> {
        let currency: Currency = parse("claims", &self.currency)?;
        let participants = participants
            .into_iter()
            .map(|p| {
                Ok(Participant {
                    id: ParticipantId::from_uuid(p.participant_id),
                    kind: parse("claim_participants", &p.kind)?,
                    name: p.name,
                    role: parse("claim_participants", &p.role)?,
                    contact: p.contact,
                })
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;

        Claim::restore(ClaimParts {
            id: ClaimId::from_uuid(self.claim_id),
            claim_number: self.claim_number,
            policy_id: PolicyId::from_uuid(self.policy_id),
            customer_id: CustomerId::from_uuid(self.customer_id),
            status: parse("claims", &self.status)?,
            loss_date: self.loss_date,
            reported_date: self.reported_date,
            description: self.description,
            loss_amount: self.loss_amount.map(|a| money(a, currency)),
            reserve_amount: self.reserve_amount.map(|a| money(a, currency)),
            loss_location: self.loss_location,
            assigned_adjuster: self.assigned_adjuster.map(UserId::from_uuid),
            participants,
            created_by: self.created_by.map(UserId::from_uuid),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
        .map_err(|e| DatabaseError::corrupt("claims", e.to_string()))
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ClaimHistoryRow {
    pub claim_id: Uuid,
    pub reported_date: DateTime<Utc>,
}

impl From<ClaimHistoryRow> for ClaimHistoryEntry {
    fn from(row: ClaimHistoryRow) -> Self {
        ClaimHistoryEntry {
            claim_id: ClaimId::from_uuid(row.claim_id),
            reported_date: row.reported_date,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AdjusterLoadRow {
    pub user_id: Uuid,
    pub name: String,
    pub open_claims: i64,
}

impl From<AdjusterLoadRow> for AdjusterLoad {
    fn from(row: AdjusterLoadRow) -> Self {
        AdjusterLoad {
            adjuster_id: UserId::from_uuid(row.user_id),
            name: row.name,
            open_claims: u32::try_from(row.open_claims).unwrap_or(u32::MAX),
        }
    }
}

// ============================================================================
// List projections
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct PolicySummaryRow {
    pub policy_id: Uuid,
    pub policy_number: String,
    pub product_type: String,
    pub status: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub effective_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    pub currency: String,
    pub total_premium: Decimal,
    pub risk_score: Option<i16>,
    pub compliance_status: String,
    pub claim_count: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PolicySummaryRow> for PolicySummary {
    type Error = DatabaseError;

    fn try_from(row: PolicySummaryRow) -> Result<Self, Self::Error> {
        let currency: Currency = parse("policies", &row.currency)?;
        Ok(PolicySummary {
            id: PolicyId::from_uuid(row.policy_id),
            policy_number: row.policy_number,
            product_type: parse("policies", &row.product_type)?,
            status: parse("policies", &row.status)?,
            customer_id: CustomerId::from_uuid(row.customer_id),
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            effective_date: row.effective_date,
            expiration_date: row.expiration_date,
            total_premium: money(row.total_premium, currency),
            risk_score: row.risk_score.and_then(|s| u8::try_from(s).ok()),
            compliance_status: parse("policies", &row.compliance_status)?,
            claim_count: u32::try_from(row.claim_count).unwrap_or(u32::MAX),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ClaimSummaryRow {
    pub claim_id: Uuid,
    pub claim_number: String,
    pub policy_id: Uuid,
    pub policy_number: String,
    pub customer_id: Uuid,
    pub status: String,
    pub description: String,
    pub loss_date: DateTime<Utc>,
    pub reported_date: DateTime<Utc>,
    pub loss_amount: Option<Decimal>,
    pub reserve_amount: Option<Decimal>,
    pub currency: String,
    pub assigned_adjuster: Option<Uuid>,
}

impl TryFrom<ClaimSummaryRow> for ClaimSummary {
    type Error = DatabaseError;

    fn try_from(row: ClaimSummaryRow) -> Result<Self, Self::Error> {
        let currency: Currency = parse("claims", &row.currency)?;
        Ok(ClaimSummary {
            id: ClaimId::from_uuid(row.claim_id),
            claim_number: row.claim_number,
            policy_id: PolicyId::from_uuid(row.policy_id),
            policy_number: row.policy_number,
            customer_id: CustomerId::from_uuid(row.customer_id),
            status: parse("claims", &row.status)?,
            description: row.description,
            loss_date: row.loss_date,
            reported_date: row.reported_date,
            loss_amount: row.loss_amount.map(|a| money(a, currency)),
            reserve_amount: row.reserve_amount.map(|a| money(a, currency)),
            assigned_adjuster: row.assigned_adjuster.map(UserId::from_uuid),
        })
    }
}

// ============================================================================
// Outbox
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct OutboxRow {
    pub message_id: Uuid,
    pub kind: String,
    pub aggregate_id: Uuid,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub status: String,
    pub claimed_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<OutboxRow> for OutboxMessage {
    type Error = DatabaseError;

    fn try_from(row: OutboxRow) -> Result<Self, Self::Error> {
        Ok(OutboxMessage {
            id: OutboxMessageId::from_uuid(row.message_id),
            kind: parse("outbox_messages", &row.kind)?,
            aggregate_id: row.aggregate_id,
            attempts: u32::try_from(row.attempts).unwrap_or_default(),
            last_error: row.last_error,
            status: parse("outbox_messages", &row.status)?,
            claimed_until: row.claimed_until,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_policy::{ConstructionType, DriverType, PolicyStatus};

    #[test]
    fn test_enum_text_round_trip() {
        assert_eq!(to_text(&DriverType::Occasional).unwrap(), "OCCASIONAL");
        let parsed: ConstructionType = from_text("locations", &to_text(&ConstructionType::Frame).unwrap()).unwrap();
        assert_eq!(parsed, ConstructionType::Frame);
    }

    #[test]
    fn test_unknown_status_is_corrupt_row() {
        let err = parse::<PolicyStatus>("policies", "PENDING_REVIEW").unwrap_err();
        assert!(matches!(err, DatabaseError::CorruptRow { table: "policies", .. }));
    }

    #[test]
    fn test_adjuster_load_conversion() {
        let id = Uuid::new_v4();
        let load: AdjusterLoad = AdjusterLoadRow { user_id: id, name: "Avery".into(), open_claims: 3 }.into();
        assert_eq!(load.adjuster_id, UserId::from_uuid(id));
        assert_eq!(load.open_claims, 3);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("  "), None);
        assert_eq!(like_pattern("Acme").as_deref(), Some("%Acme%"));
        assert_eq!(like_pattern("50%_off").as_deref(), Some("%50\\%\\_off%"));
    }
}
