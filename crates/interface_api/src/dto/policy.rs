//! Policy DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use app_services::{IssuedPolicy, PolicyApplication, PolicyQuery, PolicySummary, PolicyUpdate, QuoteResult};
use core_kernel::Paginated;
use core_kernel::{CustomerId, Money};
use domain_policy::{
    BuildingDetails, ComplianceStatus, ConstructionType, Coverage, CoverageRequest, Driver, DriverType, InsuredItem,
    Location, OccupancyType, PaymentPlan, Policy, PolicyStatus, PremiumSummary, ProductType,
    UnderwritingDecision, VehicleDetails,
};

use crate::dto::PaginationDto;
use crate::error::ApiError;

// ----------------------------------------------------------------------------
// Requests
// ----------------------------------------------------------------------------

/// Body of `POST /policies` and `POST /policies/quote`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PolicyApplicationRequest {
    pub customer_id: Uuid,
    #[validate(length(min = 1, max = 30))]
    pub product_type: String,
    pub effective_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    #[validate(length(min = 1, max = 20))]
    pub payment_plan: Option<String>,
    #[validate(length(min = 1, max = 20), nested)]
    pub coverages: Vec<CoverageDto>,
    #[serde(default)]
    pub insured_items: Vec<InsuredItemDto>,
    #[serde(default)]
    #[validate(nested)]
    pub drivers: Vec<DriverDto>,
    #[serde(default)]
    #[validate(nested)]
    pub locations: Vec<LocationDto>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CoverageDto {
    #[validate(length(min = 1, max = 40))]
    pub code: String,
    /// `"100000"` or `"100000/300000"`
    #[validate(length(min = 1, max = 40))]
    pub limit: Option<String>,
    #[validate(custom(function = "crate::dto::validate_amount"))]
    pub deductible: Option<Decimal>,
    #[validate(custom(function = "crate::dto::validate_amount"))]
    pub premium: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsuredItemDto {
    #[serde(rename_all = "camelCase")]
    Vehicle {
        year: i32,
        make: String,
        model: String,
        vin: String,
        vehicle_type: Option<String>,
        garaging_zip: Option<String>,
        covered_amount: Option<Decimal>,
    },
    #[serde(rename_all = "camelCase")]
    Building {
        address: String,
        construction_type: Option<ConstructionType>,
        occupancy_type: Option<OccupancyType>,
        square_footage: Option<u32>,
        year_built: Option<i32>,
        covered_amount: Option<Decimal>,
    },
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DriverDto {
    pub driver_type: Option<DriverType>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    #[validate(length(min = 1, max = 50))]
    pub license_number: String,
    #[validate(length(equal = 2))]
    pub license_state: String,
    #[validate(range(max = 80))]
    pub years_licensed: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LocationDto {
    #[validate(length(min = 1, max = 200))]
    pub street: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(equal = 2))]
    pub state: String,
    #[validate(length(min = 5, max = 10))]
    pub zip_code: String,
    pub construction_type: Option<ConstructionType>,
    pub occupancy_type: Option<OccupancyType>,
    pub year_built: Option<i32>,
}

/// Body of `PUT /policies/:id/status`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1, max = 20))]
    pub status: String,
}

/// Body of `PUT /policies/:id`; premium and risk score are not editable
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePolicyRequest {
    #[validate(length(min = 1, max = 20))]
    pub compliance_status: Option<String>,
    pub effective_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
}

impl UpdatePolicyRequest {
    pub fn into_update(self) -> Result<PolicyUpdate, ApiError> {
        let compliance_status = self
            .compliance_status
            .as_deref()
            .map(ComplianceStatus::from_str)
            .transpose()
            .map_err(|e| ApiError::validation(e.to_string()))?;

        Ok(PolicyUpdate {
            compliance_status,
            effective_date: self.effective_date,
            expiration_date: self.expiration_date,
        })
    }
}

/// Filters of `GET /policies`
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PolicyListParams {
    #[validate(length(min = 1, max = 20))]
    pub status: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 30))]
    pub product_type: Option<String>,
    #[validate(length(max = 100))]
    pub search: Option<String>,
}

impl PolicyListParams {
    pub fn into_query(self) -> Result<PolicyQuery, ApiError> {
        let status = self
            .status
            .as_deref()
            .map(PolicyStatus::from_str)
            .transpose()
            .map_err(|e| ApiError::validation(e.to_string()))?;
        let product_type = self
            .product_type
            .as_deref()
            .map(ProductType::from_str)
            .transpose()
            .map_err(|e| ApiError::validation(e.to_string()))?;

        Ok(PolicyQuery { status, product_type, search: self.search })
    }
}

impl PolicyApplicationRequest {
    /// Converts to the service input, rejecting unknown enum codes
    pub fn into_application(self) -> Result<PolicyApplication, ApiError> {
        let product_type =
            ProductType::from_str(&self.product_type).map_err(|e| ApiError::validation(e.to_string()))?;
        let payment_plan = match self.payment_plan.as_deref() {
            Some(plan) => PaymentPlan::from_str(plan).map_err(|e| ApiError::validation(e.to_string()))?,
            None => PaymentPlan::default(),
        };

        Ok(PolicyApplication {
            customer_id: CustomerId::from_uuid(self.customer_id),
            product_type,
            effective_date: self.effective_date,
            expiration_date: self.expiration_date,
            payment_plan,
            coverages: self.coverages.into_iter().map(CoverageRequest::from).collect(),
            insured_items: self.insured_items.into_iter().map(InsuredItem::from).collect(),
            drivers: self.drivers.into_iter().map(Driver::from).collect(),
            locations: self.locations.into_iter().map(Location::from).collect(),
        })
    }
}

impl From<CoverageDto> for CoverageRequest {
    fn from(dto: CoverageDto) -> Self {
        CoverageRequest {
            code: dto.code,
            limit: dto.limit,
            deductible: dto.deductible,
            premium: dto.premium,
        }
    }
}

impl From<InsuredItemDto> for InsuredItem {
    fn from(dto: InsuredItemDto) -> Self {
        match dto {
            InsuredItemDto::Vehicle { year, make, model, vin, vehicle_type, garaging_zip, covered_amount } => {
                InsuredItem::vehicle(
                    VehicleDetails { year, make, model, vin, vehicle_type, garaging_zip },
                    covered_amount.map(Money::usd),
                )
            }
            InsuredItemDto::Building {
                address,
                construction_type,
                occupancy_type,
                square_footage,
                year_built,
                covered_amount,
            } => InsuredItem::building(
                BuildingDetails { address, construction_type, occupancy_type, square_footage, year_built },
                covered_amount.map(Money::usd),
            ),
        }
    }
}

impl From<DriverDto> for Driver {
    fn from(dto: DriverDto) -> Self {
        let mut driver = Driver::named(
            dto.first_name,
            dto.last_name,
            dto.date_of_birth,
            dto.license_number,
            dto.license_state,
        );
        if let Some(driver_type) = dto.driver_type {
            driver.driver_type = driver_type;
        }
        driver.years_licensed = dto.years_licensed;
        driver
    }
}

impl From<LocationDto> for Location {
    fn from(dto: LocationDto) -> Self {
        let mut location = Location::new(dto.street, dto.city, dto.state, dto.zip_code);
        location.construction_type = dto.construction_type;
        location.occupancy_type = dto.occupancy_type;
        location.year_built = dto.year_built;
        location
    }
}

// ----------------------------------------------------------------------------
// Responses
// ----------------------------------------------------------------------------

/// Body of a successful `POST /policies`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePolicyResponse {
    pub policy_id: Uuid,
    pub policy_number: String,
    pub status: String,
    pub total_premium: Decimal,
    pub currency: String,
    pub risk_score: Option<u8>,
    pub tier: Option<String>,
    pub binding_authority: Option<String>,
    pub documents_generated: bool,
}

impl From<&IssuedPolicy> for IssuePolicyResponse {
    fn from(issued: &IssuedPolicy) -> Self {
        let policy = &issued.policy;
        let decision = policy.decision();
        Self {
            policy_id: *policy.id().as_uuid(),
            policy_number: policy.policy_number().to_string(),
            status: policy.status().as_str().to_string(),
            total_premium: policy.premium().total_premium.amount(),
            currency: policy.currency().code().to_string(),
            risk_score: decision.map(|d| d.risk_score),
            tier: decision.map(|d| d.tier.as_str().to_string()),
            binding_authority: decision.map(|d| d.binding_authority.as_str().to_string()),
            documents_generated: issued.documents_generated,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumDto {
    pub base_premium: Decimal,
    pub fees: Decimal,
    pub taxes: Decimal,
    pub total_premium: Decimal,
    pub currency: String,
}

impl From<&PremiumSummary> for PremiumDto {
    fn from(premium: &PremiumSummary) -> Self {
        Self {
            base_premium: premium.base_premium.amount(),
            fees: premium.fees.amount(),
            taxes: premium.taxes.amount(),
            total_premium: premium.total_premium.amount(),
            currency: premium.total_premium.currency().code().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageResponse {
    pub code: String,
    pub name: String,
    pub coverage_type: String,
    pub limit: Option<String>,
    pub deductible: Option<Decimal>,
    pub premium: Decimal,
}

impl From<&Coverage> for CoverageResponse {
    fn from(coverage: &Coverage) -> Self {
        Self {
            code: coverage.code.clone(),
            name: coverage.name.clone(),
            coverage_type: coverage.coverage_type.as_str().to_string(),
            limit: coverage.limit.as_ref().map(ToString::to_string),
            deductible: coverage.deductible.map(|d| d.amount()),
            premium: coverage.premium.amount(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderwritingDto {
    pub risk_score: u8,
    pub tier: String,
    pub binding_authority: String,
    pub factors: Vec<String>,
}

impl From<&UnderwritingDecision> for UnderwritingDto {
    fn from(decision: &UnderwritingDecision) -> Self {
        Self {
            risk_score: decision.risk_score,
            tier: decision.tier.as_str().to_string(),
            binding_authority: decision.binding_authority.as_str().to_string(),
            factors: decision.factors.iter().map(|f| f.name.clone()).collect(),
        }
    }
}

/// Body of `GET /policies/:id` and `PUT /policies/:id/status`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyResponse {
    pub id: Uuid,
    pub policy_number: String,
    pub customer_id: Uuid,
    pub product_type: String,
    pub status: String,
    pub compliance_status: String,
    pub effective_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    pub payment_plan: String,
    pub jurisdiction: String,
    pub premium: PremiumDto,
    pub underwriting: Option<UnderwritingDto>,
    pub coverages: Vec<CoverageResponse>,
    pub insured_item_count: usize,
    pub driver_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&Policy> for PolicyResponse {
    fn from(policy: &Policy) -> Self {
        Self {
            id: *policy.id().as_uuid(),
            policy_number: policy.policy_number().to_string(),
            customer_id: *policy.customer_id().as_uuid(),
            product_type: policy.product_type().as_str().to_string(),
            status: policy.status().as_str().to_string(),
            compliance_status: policy.compliance_status().as_str().to_string(),
            effective_date: policy.period().effective(),
            expiration_date: policy.period().expiration(),
            payment_plan: policy.payment_plan().as_str().to_string(),
            jurisdiction: policy.jurisdiction().to_string(),
            premium: policy.premium().into(),
            underwriting: policy.decision().map(UnderwritingDto::from),
            coverages: policy.coverages().iter().map(CoverageResponse::from).collect(),
            insured_item_count: policy.insured_items().len(),
            driver_count: policy.drivers().len(),
            created_at: policy.created_at(),
        }
    }
}

/// Body of `POST /policies/quote`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub jurisdiction: String,
    pub rate_table_version: String,
    pub premium: PremiumDto,
    pub coverages: Vec<CoverageResponse>,
    pub missing_required: Vec<String>,
    pub underwriting: UnderwritingDto,
}

impl From<&QuoteResult> for QuoteResponse {
    fn from(quote: &QuoteResult) -> Self {
        Self {
            jurisdiction: quote.rating.jurisdiction.clone(),
            rate_table_version: quote.rating.rate_table_version.clone(),
            premium: (&quote.rating.premium).into(),
            coverages: quote.rating.coverages.iter().map(CoverageResponse::from).collect(),
            missing_required: quote.rating.missing_required.clone(),
            underwriting: (&quote.decision).into(),
        }
    }
}

/// One entry of `GET /policies`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySummaryDto {
    pub id: Uuid,
    pub policy_number: String,
    pub product_type: String,
    pub status: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub effective_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    pub total_premium: Decimal,
    pub currency: String,
    pub risk_score: Option<u8>,
    pub compliance_status: String,
    pub claim_count: u32,
    pub created_at: DateTime<Utc>,
}

impl From<&PolicySummary> for PolicySummaryDto {
    fn from(summary: &PolicySummary) -> Self {
        Self {
            id: *summary.id.as_uuid(),
            policy_number: summary.policy_number.clone(),
            product_type: summary.product_type.as_str().to_string(),
            status: summary.status.as_str().to_string(),
            customer_id: *summary.customer_id.as_uuid(),
            customer_name: summary.customer_name.clone(),
            customer_email: summary.customer_email.clone(),
            effective_date: summary.effective_date,
            expiration_date: summary.expiration_date,
            total_premium: summary.total_premium.amount(),
            currency: summary.total_premium.currency().code().to_string(),
            risk_score: summary.risk_score,
            compliance_status: summary.compliance_status.as_str().to_string(),
            claim_count: summary.claim_count,
            created_at: summary.created_at,
        }
    }
}

/// Body of `GET /policies`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyListResponse {
    pub policies: Vec<PolicySummaryDto>,
    pub pagination: PaginationDto,
}

impl From<&Paginated<PolicySummary>> for PolicyListResponse {
    fn from(result: &Paginated<PolicySummary>) -> Self {
        Self {
            policies: result.items.iter().map(PolicySummaryDto::from).collect(),
            pagination: result.into(),
        }
    }
}
