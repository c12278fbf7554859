//! Financial transaction journal of a policy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{Money, PolicyId, PolicyTransactionId};

use crate::error::PolicyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    NewBusiness,
    Endorsement,
    Cancellation,
    Reinstatement,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::NewBusiness => "NEW_BUSINESS",
            TransactionType::Endorsement => "ENDORSEMENT",
            TransactionType::Cancellation => "CANCELLATION",
            TransactionType::Reinstatement => "REINSTATEMENT",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW_BUSINESS" => Ok(TransactionType::NewBusiness),
            "ENDORSEMENT" => Ok(TransactionType::Endorsement),
            "CANCELLATION" => Ok(TransactionType::Cancellation),
            "REINSTATEMENT" => Ok(TransactionType::Reinstatement),
            other => Err(PolicyError::validation(format!("unknown transaction type {other}"))),
        }
    }
}

/// One entry in a policy's premium journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTransaction {
    pub id: PolicyTransactionId,
    pub policy_id: PolicyId,
    pub transaction_type: TransactionType,
    pub premium: Money,
    pub effective_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PolicyTransaction {
    /// The journal entry written when a policy is first issued
    pub fn new_business(
        policy_id: PolicyId,
        premium: Money,
        effective_date: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PolicyTransactionId::new_v7(),
            policy_id,
            transaction_type: TransactionType::NewBusiness,
            premium,
            effective_date,
            created_at,
        }
    }
}
