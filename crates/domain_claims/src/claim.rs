//! Claim aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{temporal::ensure_not_before, ClaimId, CustomerId, Money, PolicyId, UserId, MAX_AMOUNT};

use crate::error::ClaimError;
use crate::participant::Participant;

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    /// Filed, awaiting work
    Open,
    Investigating,
    Processing,
    Closed,
    Denied,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Open => "OPEN",
            ClaimStatus::Investigating => "INVESTIGATING",
            ClaimStatus::Processing => "PROCESSING",
            ClaimStatus::Closed => "CLOSED",
            ClaimStatus::Denied => "DENIED",
        }
    }

    /// Open claims count toward an adjuster's workload
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            ClaimStatus::Open | ClaimStatus::Investigating | ClaimStatus::Processing
        )
    }

    pub fn can_transition_to(&self, target: ClaimStatus) -> bool {
        use ClaimStatus::*;
        matches!(
            (self, target),
            (Open, Investigating)
                | (Open, Processing)
                | (Investigating, Processing)
                | (Open, Closed)
                | (Investigating, Closed)
                | (Processing, Closed)
                | (Open, Denied)
                | (Investigating, Denied)
                | (Processing, Denied)
        )
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(ClaimStatus::Open),
            "INVESTIGATING" => Ok(ClaimStatus::Investigating),
            "PROCESSING" => Ok(ClaimStatus::Processing),
            "CLOSED" => Ok(ClaimStatus::Closed),
            "DENIED" => Ok(ClaimStatus::Denied),
            other => Err(ClaimError::validation(format!("unknown claim status {other}"))),
        }
    }
}

/// A first notice of loss as reported by the customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReport {
    pub policy_id: PolicyId,
    pub customer_id: CustomerId,
    pub loss_date: DateTime<Utc>,
    pub reported_date: DateTime<Utc>,
    pub description: String,
    pub loss_amount: Option<Money>,
    pub reserve_amount: Option<Money>,
    pub loss_location: Option<String>,
    pub participants: Vec<Participant>,
}

impl ClaimReport {
    /// Checks the report before anything is allocated or written
    ///
    /// # Errors
    ///
    /// `InconsistentDates` when the reported date precedes the loss date,
    /// `InvalidAmount` for negative or oversized loss and reserve amounts and
    /// `Validation` for blank descriptions or participants
    pub fn validate(&self) -> Result<(), ClaimError> {
        ensure_not_before(self.reported_date, self.loss_date)?;

        for (label, amount) in [("loss", &self.loss_amount), ("reserve", &self.reserve_amount)] {
            let Some(amount) = amount else { continue };
            if amount.is_negative() {
                return Err(ClaimError::InvalidAmount(format!("{label} amount {amount} is negative")));
            }
            if amount.ensure_within_limit().is_err() {
                return Err(ClaimError::InvalidAmount(format!(
                    "{label} amount {amount} exceeds {MAX_AMOUNT}"
                )));
            }
        }
        if self.description.trim().is_empty() {
            return Err(ClaimError::validation("claim description is required"));
        }
        for participant in &self.participants {
            participant.validate()?;
        }
        Ok(())
    }
}

/// A claim against a policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    id: ClaimId,
    claim_number: String,
    policy_id: PolicyId,
    customer_id: CustomerId,
    status: ClaimStatus,
    loss_date: DateTime<Utc>,
    reported_date: DateTime<Utc>,
    description: String,
    loss_amount: Option<Money>,
    reserve_amount: Option<Money>,
    loss_location: Option<String>,
    assigned_adjuster: Option<UserId>,
    participants: Vec<Participant>,
    created_by: Option<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Claim {
    /// Opens a claim from a validated report, keeping amounts to the cent
    pub fn file(
        claim_number: impl Into<String>,
        report: ClaimReport,
        created_by: Option<UserId>,
        at: DateTime<Utc>,
    ) -> Result<Self, ClaimError> {
        report.validate()?;
        Ok(Self {
            id: ClaimId::new_v7(),
            claim_number: claim_number.into(),
            policy_id: report.policy_id,
            customer_id: report.customer_id,
            status: ClaimStatus::Open,
            loss_date: report.loss_date,
            reported_date: report.reported_date,
            description: report.description,
            loss_amount: report.loss_amount.map(|m| m.round_to_currency()),
            reserve_amount: report.reserve_amount.map(|m| m.round_to_currency()),
            loss_location: report.loss_location,
            assigned_adjuster: None,
            participants: report.participants,
            created_by,
            created_at: at,
            updated_at: at,
        })
    }

    pub fn id(&self) -> ClaimId {
        self.id
    }

    pub fn claim_number(&self) -> &str {
        &self.claim_number
    }

    pub fn policy_id(&self) -> PolicyId {
        self.policy_id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn status(&self) -> ClaimStatus {
        self.status
    }

    pub fn loss_date(&self) -> DateTime<Utc> {
        self.loss_date
    }

    pub fn reported_date(&self) -> DateTime<Utc> {
        self.reported_date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn loss_amount(&self) -> Option<Money> {
        self.loss_amount
    }

    pub fn reserve_amount(&self) -> Option<Money> {
        self.reserve_amount
    }

    pub fn loss_location(&self) -> Option<&str> {
        self.loss_location.as_deref()
    }

    pub fn assigned_adjuster(&self) -> Option<UserId> {
        self.assigned_adjuster
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
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

    pub fn assign_adjuster(&mut self, adjuster: UserId, at: DateTime<Utc>) {
        self.assigned_adjuster = Some(adjuster);
        self.updated_at = at;
    }

    /// Updates the status
    pub fn transition(&mut self, status: ClaimStatus, at: DateTime<Utc>) -> Result<ClaimStatus, ClaimError> {
        if !self.status.can_transition_to(status) {
            return Err(ClaimError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: status.to_string(),
            });
        }
        let previous = self.status;
        self.status = status;
        self.updated_at = at;
        Ok(previous)
    }

    /// Rebuilds a stored claim, re-checking date and amount invariants
    pub fn restore(parts: ClaimParts) -> Result<Self, ClaimError> {
        let claim = Self {
            id: parts.id,
            claim_number: parts.claim_number,
            policy_id: parts.policy_id,
            customer_id: parts.customer_id,
            status: parts.status,
            loss_date: parts.loss_date,
            reported_date: parts.reported_date,
            description: parts.description,
            loss_amount: parts.loss_amount,
            reserve_amount: parts.reserve_amount,
            loss_location: parts.loss_location,
            assigned_adjuster: parts.assigned_adjuster,
            participants: parts.participants,
            created_by: parts.created_by,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
        };
        ensure_not_before(claim.reported_date, claim.loss_date)?;
        if claim.reserve_amount.is_some_and(|r| r.is_negative()) {
            return Err(ClaimError::InvalidAmount("stored reserve is negative".to_string()));
        }
        Ok(claim)
    }
}

/// Field bag used by storage adapters to rebuild a [`Claim`]
#[derive(Debug, Clone)]
pub struct ClaimParts {
    pub id: ClaimId,
    pub claim_number: String,
    pub policy_id: PolicyId,
    pub customer_id: CustomerId,
    pub status: ClaimStatus,
    pub loss_date: DateTime<Utc>,
    pub reported_date: DateTime<Utc>,
    pub description: String,
    pub loss_amount: Option<Money>,
    pub reserve_amount: Option<Money>,
    pub loss_location: Option<String>,
    pub assigned_adjuster: Option<UserId>,
    pub participants: Vec<Participant>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
