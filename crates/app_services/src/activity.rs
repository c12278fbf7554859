//! Append-only audit log entries written alongside every mutation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

use core_kernel::{ActivityId, UserId};

use crate::error::AssemblyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Policy,
    Claim,
    FraudAlert,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Policy => "POLICY",
            EntityType::Claim => "CLAIM",
            EntityType::FraudAlert => "FRAUD_ALERT",
        }
    }
}

impl FromStr for EntityType {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POLICY" => Ok(EntityType::Policy),
            "CLAIM" => Ok(EntityType::Claim),
            "FRAUD_ALERT" => Ok(EntityType::FraudAlert),
            other => Err(AssemblyError::validation(format!("unknown entity type {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    Created,
    Updated,
    StatusChanged,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Created => "CREATED",
            ActivityAction::Updated => "UPDATED",
            ActivityAction::StatusChanged => "STATUS_CHANGED",
        }
    }
}

impl FromStr for ActivityAction {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(ActivityAction::Created),
            "UPDATED" => Ok(ActivityAction::Updated),
            "STATUS_CHANGED" => Ok(ActivityAction::StatusChanged),
            other => Err(AssemblyError::validation(format!("unknown activity action {other}"))),
        }
    }
}

/// One audit entry. Never updated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub user_id: Option<UserId>,
    pub action: ActivityAction,
    pub description: String,
    pub metadata: Value,
    pub timestamp: DateTime<Utc>,
}

impl Activity {
    pub fn new(
        entity_type: EntityType,
        entity_id: impl Into<Uuid>,
        action: ActivityAction,
        description: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActivityId::new_v7(),
            entity_type,
            entity_id: entity_id.into(),
            user_id: None,
            action,
            description: description.into(),
            metadata: Value::Null,
            timestamp,
        }
    }

    pub fn by(mut self, user: Option<UserId>) -> Self {
        self.user_id = user;
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}
