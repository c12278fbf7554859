//! Party Domain
//!
//! Customers who hold policies and file claims, and the back-office users
//! (underwriters, adjusters) who act on them. The assembly engine only ever
//! reads customers; they are created and maintained elsewhere.

pub mod customer;
pub mod address;
pub mod user;
pub mod error;
pub mod ports;

pub use customer::{Customer, CustomerType};
pub use address::Address;
pub use user::{User, UserRole};
pub use error::PartyError;
pub use ports::{CustomerPort, CustomerQuery};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockCustomerPort;
