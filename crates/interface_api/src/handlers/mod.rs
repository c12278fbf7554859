pub mod claims;
pub mod customers;
pub mod health;
pub mod policy;
