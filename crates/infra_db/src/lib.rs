//! Infrastructure Database Layer
//!
//! PostgreSQL adapters for the assembly engine's ports, built on SQLx with
//! runtime-checked queries:
//!
//! - [`PostgresAssemblyStore`] writes each issued policy or filed claim,
//!   with its children, journal entry, activity and outbox message, in a
//!   single transaction
//! - [`PostgresSequence`] backs the identifier allocator with per-year
//!   counters
//! - [`PostgresCustomerPort`] reads customers
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresAssemblyStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/assembly")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresAssemblyStore::new(pool.clone());
//! ```

pub mod customers;
pub mod error;
pub mod pool;
pub mod rows;
pub mod sequence;
pub mod store;

pub use customers::{insert_user, PostgresCustomerPort};
pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, ping, run_migrations, DatabaseConfig, DatabasePool, MIGRATOR};
pub use sequence::PostgresSequence;
pub use store::PostgresAssemblyStore;
