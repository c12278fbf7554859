//! Post-commit work queued in the same transaction as its aggregate
//!
//! A message is written as `PENDING` together with the policy or claim it
//! refers to. The service tries the work right after commit; on failure the
//! message keeps its attempt count and last error until
//! [`crate::AssemblyService::drain_outbox`] succeeds with it.
//!
//! A worker owns a message while `claimed_until` lies in the future. New
//! messages start claimed by the request that wrote them; a recorded
//! failure releases the claim, and an expired claim is picked up again.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use core_kernel::OutboxMessageId;

use crate::error::AssemblyError;

/// How long a claimed message is hidden from other workers
pub const OUTBOX_LEASE_SECONDS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboxKind {
    GenerateDeclarationDocuments,
    EvaluateFraud,
}

impl OutboxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxKind::GenerateDeclarationDocuments => "GENERATE_DECLARATION_DOCUMENTS",
            OutboxKind::EvaluateFraud => "EVALUATE_FRAUD",
        }
    }
}

impl FromStr for OutboxKind {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GENERATE_DECLARATION_DOCUMENTS" => Ok(OutboxKind::GenerateDeclarationDocuments),
            "EVALUATE_FRAUD" => Ok(OutboxKind::EvaluateFraud),
            other => Err(AssemblyError::validation(format!("unknown outbox kind {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboxStatus {
    Pending,
    Completed,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "PENDING",
            OutboxStatus::Completed => "COMPLETED",
        }
    }
}

impl FromStr for OutboxStatus {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OutboxStatus::Pending),
            "COMPLETED" => Ok(OutboxStatus::Completed),
            other => Err(AssemblyError::validation(format!("unknown outbox status {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub id: OutboxMessageId,
    pub kind: OutboxKind,
    pub aggregate_id: Uuid,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub status: OutboxStatus,
    pub claimed_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OutboxMessage {
    pub fn pending(kind: OutboxKind, aggregate_id: impl Into<Uuid>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: OutboxMessageId::new_v7(),
            kind,
            aggregate_id: aggregate_id.into(),
            attempts: 0,
            last_error: None,
            status: OutboxStatus::Pending,
            claimed_until: Some(lease_expiry(created_at)),
            created_at,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OutboxStatus::Pending
    }

    /// Pending and not held by a live claim at `now`
    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && self.claimed_until.map_or(true, |until| until <= now)
    }
}

/// End of a claim taken at `now`
pub fn lease_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::seconds(OUTBOX_LEASE_SECONDS)
}

/// Result of one [`crate::AssemblyService::drain_outbox`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    pub completed: usize,
    pub failed: usize,
}
