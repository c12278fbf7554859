//! Claims DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use app_services::{ClaimQuery, ClaimSubmission, ClaimSummary, FiledClaim};
use core_kernel::{CustomerId, Money, Paginated, PolicyId};
use domain_claims::{Claim, ClaimStatus, Participant, ParticipantKind, ParticipantRole};

use crate::dto::PaginationDto;
use crate::error::ApiError;

/// Body of `POST /claims`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FileClaimRequest {
    pub policy_id: Uuid,
    pub customer_id: Uuid,
    pub loss_date: DateTime<Utc>,
    #[validate(length(min = 1, max = 4000))]
    pub description: String,
    #[validate(custom(function = "crate::dto::validate_amount"))]
    pub loss_amount: Option<Decimal>,
    #[validate(custom(function = "crate::dto::validate_amount"))]
    pub reserve_amount: Option<Decimal>,
    #[validate(length(max = 500))]
    pub location: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub participants: Vec<ParticipantDto>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub kind: ParticipantKind,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub role: ParticipantRole,
    #[validate(length(max = 255))]
    pub contact: Option<String>,
}

impl From<FileClaimRequest> for ClaimSubmission {
    fn from(request: FileClaimRequest) -> Self {
        ClaimSubmission {
            policy_id: PolicyId::from_uuid(request.policy_id),
            customer_id: CustomerId::from_uuid(request.customer_id),
            loss_date: request.loss_date,
            description: request.description,
            loss_amount: request.loss_amount.map(Money::usd),
            reserve_amount: request.reserve_amount.map(Money::usd),
            loss_location: request.location,
            participants: request.participants.into_iter().map(Participant::from).collect(),
        }
    }
}

impl From<ParticipantDto> for Participant {
    fn from(dto: ParticipantDto) -> Self {
        let participant = Participant::new(dto.kind, dto.name, dto.role);
        match dto.contact {
            Some(contact) => participant.with_contact(contact),
            None => participant,
        }
    }
}

/// Body of a successful `POST /claims`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileClaimResponse {
    pub claim_id: Uuid,
    pub claim_number: String,
    pub status: String,
    pub assigned_adjuster_id: Option<Uuid>,
    /// Absent when fraud scoring was deferred to the outbox
    pub fraud_risk_score: Option<u8>,
    pub fraud_severity: Option<String>,
}

impl From<&FiledClaim> for FileClaimResponse {
    fn from(filed: &FiledClaim) -> Self {
        let claim = &filed.claim;
        Self {
            claim_id: *claim.id().as_uuid(),
            claim_number: claim.claim_number().to_string(),
            status: claim.status().as_str().to_string(),
            assigned_adjuster_id: claim.assigned_adjuster().map(|u| *u.as_uuid()),
            fraud_risk_score: filed.fraud.as_ref().map(|f| f.risk_score),
            fraud_severity: filed
                .fraud
                .as_ref()
                .and_then(|f| f.severity)
                .map(|s| s.as_str().to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResponse {
    pub kind: ParticipantKind,
    pub name: String,
    pub role: ParticipantRole,
    pub contact: Option<String>,
}

/// Body of `GET /claims/:id`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub id: Uuid,
    pub claim_number: String,
    pub policy_id: Uuid,
    pub customer_id: Uuid,
    pub status: String,
    pub loss_date: DateTime<Utc>,
    pub reported_date: DateTime<Utc>,
    pub description: String,
    pub loss_amount: Option<Decimal>,
    pub reserve_amount: Option<Decimal>,
    pub location: Option<String>,
    pub assigned_adjuster_id: Option<Uuid>,
    pub participants: Vec<ParticipantResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<&Claim> for ClaimResponse {
    fn from(claim: &Claim) -> Self {
        Self {
            id: *claim.id().as_uuid(),
            claim_number: claim.claim_number().to_string(),
            policy_id: *claim.policy_id().as_uuid(),
            customer_id: *claim.customer_id().as_uuid(),
            status: claim.status().as_str().to_string(),
            loss_date: claim.loss_date(),
            reported_date: claim.reported_date(),
            description: claim.description().to_string(),
            loss_amount: claim.loss_amount().map(|m| m.amount()),
            reserve_amount: claim.reserve_amount().map(|m| m.amount()),
            location: claim.loss_location().map(str::to_string),
            assigned_adjuster_id: claim.assigned_adjuster().map(|u| *u.as_uuid()),
            participants: claim
                .participants()
                .iter()
                .map(|p| ParticipantResponse {
                    kind: p.kind,
                    name: p.name.clone(),
                    role: p.role,
                    contact: p.contact.clone(),
                })
                .collect(),
            created_at: claim.created_at(),
        }
    }
}

/// Filters of `GET /claims`
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClaimListParams {
    #[validate(length(min = 1, max = 20))]
    pub status: Option<String>,
    #[validate(length(max = 100))]
    pub search: Option<String>,
}

impl ClaimListParams {
    pub fn into_query(self) -> Result<ClaimQuery, ApiError> {
        let status = self
            .status
            .as_deref()
            .map(ClaimStatus::from_str)
            .transpose()
            .map_err(|e| ApiError::validation(e.to_string()))?;
        Ok(ClaimQuery { status, search: self.search })
    }
}

/// One entry of `GET /claims`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSummaryDto {
    pub id: Uuid,
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
    pub assigned_adjuster_id: Option<Uuid>,
}

impl From<&ClaimSummary> for ClaimSummaryDto {
    fn from(summary: &ClaimSummary) -> Self {
        Self {
            id: *summary.id.as_uuid(),
            claim_number: summary.claim_number.clone(),
            policy_id: *summary.policy_id.as_uuid(),
            policy_number: summary.policy_number.clone(),
            customer_id: *summary.customer_id.as_uuid(),
            status: summary.status.as_str().to_string(),
            description: summary.description.clone(),
            loss_date: summary.loss_date,
            reported_date: summary.reported_date,
            loss_amount: summary.loss_amount.map(|m| m.amount()),
            reserve_amount: summary.reserve_amount.map(|m| m.amount()),
            assigned_adjuster_id: summary.assigned_adjuster.map(|u| *u.as_uuid()),
        }
    }
}

/// Body of `GET /claims`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimListResponse {
    pub claims: Vec<ClaimSummaryDto>,
    pub pagination: PaginationDto,
}

impl From<&Paginated<ClaimSummary>> for ClaimListResponse {
    fn from(result: &Paginated<ClaimSummary>) -> Self {
        Self {
            claims: result.items.iter().map(ClaimSummaryDto::from).collect(),
            pagination: result.into(),
        }
    }
}
