//! Policy Assembly Domain
//!
//! This crate holds the business logic for assembling a property and
//! casualty policy from an application, following Domain-Driven Design
//! and Hexagonal Architecture principles. It has no knowledge of storage.
//!
//! # Architecture
//!
//! - **Aggregate**: [`Policy`] owns its coverages, insured items, drivers
//!   and locations
//! - **Catalog**: per-product coverage definitions with required flags
//! - **Rating**: [`RatingEngine`] prices coverage selections against
//!   versioned [`RateTables`]
//! - **Underwriting**: [`UnderwritingEngine`] scores a rated application
//!   and assigns a tier and binding authority
//! - **Domain Events**: collected on the aggregate and drained by the
//!   application service
//!
//! # Policy Lifecycle
//!
//! ```text
//! QUOTE -> BOUND -> ACTIVE -> EXPIRED | CANCELLED | SUSPENDED | NON_RENEWED
//!      \-> REFERRED -> BOUND
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_policy::{PolicyBuilder, ProductType, RatingEngine, UnderwritingEngine};
//!
//! let mut policy = PolicyBuilder::new()
//!     .policy_number("POL-2024-000001")
//!     .customer(customer_id)
//!     .product(ProductType::PersonalAuto)
//!     .period(period)
//!     .add_insured_item(vehicle)
//!     .build(now)?;
//!
//! let rating = RatingEngine::default().price_for_binding(policy.product_type(), &requests, "CA")?;
//! policy.apply_rating(rating, now)?;
//! ```

pub mod aggregate;
pub mod coverage;
pub mod error;
pub mod events;
pub mod product;
pub mod rating;
pub mod risk;
pub mod transaction;
pub mod underwriting;

pub use aggregate::{ComplianceStatus, PaymentPlan, Policy, PolicyBuilder, PolicyParts, PolicyStatus};
pub use coverage::{Coverage, CoverageDefinition, CoverageLimit, CoverageRequest, CoverageType};
pub use error::PolicyError;
pub use events::PolicyEvent;
pub use product::ProductType;
pub use rating::{PremiumSummary, RateTables, RateTablesBuilder, RatingEngine, RatingResult};
pub use risk::{
    BuildingDetails, ConstructionType, Driver, DriverType, InsuredItem, InsuredItemKind, Location,
    OccupancyType, VehicleDetails,
};
pub use transaction::{PolicyTransaction, TransactionType};
pub use underwriting::{
    BindingAuthority, RatedPolicy, RiskFactor, Tier, UnderwritingDecision, UnderwritingEngine,
    UnderwritingGuidelines,
};
