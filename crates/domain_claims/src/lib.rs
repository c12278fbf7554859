//! Claims Domain
//!
//! This crate covers claim intake: the Claim aggregate and its participants,
//! adjuster selection, and the fraud signal engine that scores a filed claim
//! against the customer's claim history.
//!
//! # Claim Lifecycle
//!
//! ```text
//! OPEN -> INVESTIGATING -> PROCESSING -> CLOSED
//!    \          \               \-> DENIED
//! ```

pub mod assignment;
pub mod claim;
pub mod error;
pub mod fraud;
pub mod participant;

pub use assignment::{select_adjuster, AdjusterLoad};
pub use claim::{Claim, ClaimParts, ClaimReport, ClaimStatus};
pub use error::ClaimError;
pub use fraud::{
    AlertStatus, AlertType, ClaimHistoryEntry, FraudAlert, FraudAssessment, FraudContext,
    FraudEngine, FraudIndicator, FraudRule, Severity,
};
pub use participant::{Participant, ParticipantKind, ParticipantRole};
