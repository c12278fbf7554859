//! Strongly-typed identifiers for domain entities
//!
//! Every entity of the policy and claim aggregates, and every record written
//! alongside them, is keyed by a UUID newtype. Display form is `PREFIX-uuid`;
//! parsing accepts either that form or the bare UUID.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new time-ordered identifier (v7), the form used for
            /// persisted rows so that primary keys stay index friendly
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }

            /// Returns true for the all-zero UUID, which is never issued
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Policy aggregate
define_id!(PolicyId, "POL");
define_id!(CoverageId, "COV");
define_id!(InsuredItemId, "ITEM");
define_id!(DriverId, "DRV");
define_id!(LocationId, "LOC");
define_id!(PolicyTransactionId, "PTXN");

// Claim aggregate
define_id!(ClaimId, "CLM");
define_id!(ParticipantId, "PART");
define_id!(FraudAlertId, "FRA");

// Parties and users
define_id!(CustomerId, "CUST");
define_id!(UserId, "USR");

// Audit and post-commit work
define_id!(ActivityId, "ACT");
define_id!(OutboxMessageId, "OBX");
