//! People and organizations involved in a claim

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use core_kernel::ParticipantId;

use crate::error::ClaimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantKind {
    Individual,
    Organization,
}

impl ParticipantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantKind::Individual => "INDIVIDUAL",
            ParticipantKind::Organization => "ORGANIZATION",
        }
    }
}

impl FromStr for ParticipantKind {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INDIVIDUAL" => Ok(ParticipantKind::Individual),
            "ORGANIZATION" => Ok(ParticipantKind::Organization),
            other => Err(ClaimError::validation(format!("unknown participant kind {other}"))),
        }
    }
}

/// A participant's part in the loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantRole {
    Claimant,
    Driver,
    Passenger,
    Witness,
    ThirdParty,
    Other,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Claimant => "CLAIMANT",
            ParticipantRole::Driver => "DRIVER",
            ParticipantRole::Passenger => "PASSENGER",
            ParticipantRole::Witness => "WITNESS",
            ParticipantRole::ThirdParty => "THIRD_PARTY",
            ParticipantRole::Other => "OTHER",
        }
    }
}

impl FromStr for ParticipantRole {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLAIMANT" => Ok(ParticipantRole::Claimant),
            "DRIVER" => Ok(ParticipantRole::Driver),
            "PASSENGER" => Ok(ParticipantRole::Passenger),
            "WITNESS" => Ok(ParticipantRole::Witness),
            "THIRD_PARTY" => Ok(ParticipantRole::ThirdParty),
            "OTHER" => Ok(ParticipantRole::Other),
            other => Err(ClaimError::validation(format!("unknown participant role {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub kind: ParticipantKind,
    pub name: String,
    pub role: ParticipantRole,
    pub contact: Option<String>,
}

impl Participant {
    pub fn new(kind: ParticipantKind, name: impl Into<String>, role: ParticipantRole) -> Self {
        Self {
            id: ParticipantId::new_v7(),
            kind,
            name: name.into(),
            role,
            contact: None,
        }
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    pub fn validate(&self) -> Result<(), ClaimError> {
        if self.name.trim().is_empty() {
            return Err(ClaimError::validation("participant name is required"));
        }
        Ok(())
    }
}
