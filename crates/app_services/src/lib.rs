//! Application Services
//!
//! Orchestrates the domain crates into the two write operations of the
//! engine, issuing a policy and filing a claim, plus the reads, list
//! queries, lifecycle changes and outbox retries around them. All I/O goes through ports:
//!
//! - [`domain_party::CustomerPort`] for customer lookup
//! - [`core_kernel::SequencePort`] behind the identifier allocator
//! - [`AssemblyStore`] as the atomic write boundary
//! - [`DocumentGenerator`] for post-commit declaration documents
//!
//! # Example
//!
//! ```rust,ignore
//! let service = AssemblyService::new(customers, store, allocator, documents, clock)
//!     .with_default_state("CA");
//! let issued = service.issue_policy(application, &OperationMetadata::for_user(user)).await?;
//! ```

pub mod activity;
pub mod error;
pub mod outbox;
pub mod ports;
pub mod query;
pub mod service;

pub use activity::{Activity, ActivityAction, EntityType};
pub use error::AssemblyError;
pub use outbox::{DrainReport, OutboxKind, OutboxMessage, OutboxStatus, OUTBOX_LEASE_SECONDS};
pub use ports::{AssemblyStore, ClaimFiling, DocumentGenerator, LoggingDocumentGenerator, PolicyIssue};
pub use query::{ClaimQuery, ClaimSummary, PolicyQuery, PolicySummary, PolicyUpdate};
pub use service::{
    AssemblyService, ClaimSubmission, FiledClaim, IssuedPolicy, PolicyApplication, QuoteResult,
};

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{InMemoryAssemblyStore, RecordingDocumentGenerator};
