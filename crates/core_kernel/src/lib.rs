//! Core Kernel - Foundational types for the policy assembly engine
//!
//! This crate provides the building blocks shared by every domain crate:
//! - Money and rate types with precise decimal arithmetic
//! - Strongly-typed identifiers
//! - Clocks and policy periods
//! - The port error model used by persistence boundaries
//! - The identifier allocator that mints policy and claim numbers
//! - Page requests and paged results for list queries

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod numbering;
pub mod pagination;

pub use money::{Money, Currency, MoneyError, Rate, MAX_AMOUNT};
pub use temporal::{Clock, SystemClock, FixedClock, PolicyPeriod, TemporalError};
pub use identifiers::{
    PolicyId, CoverageId, InsuredItemId, DriverId, LocationId, PolicyTransactionId,
    ClaimId, ParticipantId, FraudAlertId, CustomerId, UserId, ActivityId, OutboxMessageId,
};
pub use ports::{DomainPort, OperationMetadata, PortError};
pub use numbering::{AllocatorError, IdentifierAllocator, NumberKind, SequencePort};
pub use pagination::{Page, Paginated};
