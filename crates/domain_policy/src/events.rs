//! Domain events for the policy aggregate
//!
//! Events are collected on the aggregate while it is assembled and drained
//! with `Policy::take_events` by the service, which logs them and uses them
//! to describe audit activity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::PolicyId;

use crate::underwriting::{BindingAuthority, Tier};

/// Domain events emitted by the Policy aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PolicyEvent {
    /// Policy has been created in quote status
    PolicyQuoted {
        policy_id: PolicyId,
        policy_number: String,
        timestamp: DateTime<Utc>,
    },

    /// Coverages were (re)selected and priced
    PolicyRated {
        policy_id: PolicyId,
        coverage_codes: Vec<String>,
        total_premium: Decimal,
        rate_table_version: String,
        timestamp: DateTime<Utc>,
    },

    /// A previous underwriting decision was discarded after re-rating
    DecisionInvalidated {
        policy_id: PolicyId,
        timestamp: DateTime<Utc>,
    },

    /// Underwriting scored the policy
    UnderwritingDecided {
        policy_id: PolicyId,
        risk_score: u8,
        tier: Tier,
        binding_authority: BindingAuthority,
        timestamp: DateTime<Utc>,
    },

    /// Policy has been bound
    PolicyBound {
        policy_id: PolicyId,
        timestamp: DateTime<Utc>,
    },

    /// Policy awaits underwriter approval
    PolicyReferred {
        policy_id: PolicyId,
        timestamp: DateTime<Utc>,
    },

    /// Lifecycle status changed after binding
    StatusChanged {
        policy_id: PolicyId,
        from: String,
        to: String,
        timestamp: DateTime<Utc>,
    },

    /// Effective or expiration date moved before the policy took effect
    PeriodChanged {
        policy_id: PolicyId,
        effective: DateTime<Utc>,
        expiration: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    ComplianceChanged {
        policy_id: PolicyId,
        from: String,
        to: String,
        timestamp: DateTime<Utc>,
    },
}

impl PolicyEvent {
    /// Returns the policy ID associated with this event
    pub fn policy_id(&self) -> PolicyId {
        match self {
            PolicyEvent::PolicyQuoted { policy_id, .. }
            | PolicyEvent::PolicyRated { policy_id, .. }
            | PolicyEvent::DecisionInvalidated { policy_id, .. }
            | PolicyEvent::UnderwritingDecided { policy_id, .. }
            | PolicyEvent::PolicyBound { policy_id, .. }
            | PolicyEvent::PolicyReferred { policy_id, .. }
            | PolicyEvent::StatusChanged { policy_id, .. }
            | PolicyEvent::PeriodChanged { policy_id, .. }
            | PolicyEvent::ComplianceChanged { policy_id, .. } => *policy_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            PolicyEvent::PolicyQuoted { timestamp, .. }
            | PolicyEvent::PolicyRated { timestamp, .. }
            | PolicyEvent::DecisionInvalidated { timestamp, .. }
            | PolicyEvent::UnderwritingDecided { timestamp, .. }
            | PolicyEvent::PolicyBound { timestamp, .. }
            | PolicyEvent::PolicyReferred { timestamp, .. }
            | PolicyEvent::StatusChanged { timestamp, .. }
            | PolicyEvent::PeriodChanged { timestamp, .. }
            | PolicyEvent::ComplianceChanged { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            PolicyEvent::PolicyQuoted { .. } => "PolicyQuoted",
            PolicyEvent::PolicyRated { .. } => "PolicyRated",
            PolicyEvent::DecisionInvalidated { .. } => "DecisionInvalidated",
            PolicyEvent::UnderwritingDecided { .. } => "UnderwritingDecided",
            PolicyEvent::PolicyBound { .. } => "PolicyBound",
            PolicyEvent::PolicyReferred { .. } => "PolicyReferred",
            PolicyEvent::StatusChanged { .. } => "StatusChanged",
            PolicyEvent::PeriodChanged { .. } => "PeriodChanged",
            PolicyEvent::ComplianceChanged { .. } => "ComplianceChanged",
        }
    }
}
