//! Test Utilities Crate
//!
//! Shared test infrastructure for the assembly engine test suites.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built customers, adjusters and risks
//! - `builders`: Application and claim submission builders
//! - `harness`: The service wired to in-memory ports
//! - `database`: PostgreSQL test containers
//! - `assertions`: Domain-aware assertion helpers
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod harness;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use harness::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
