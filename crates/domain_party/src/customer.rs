//! Customers

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::CustomerId;

use crate::address::Address;
use crate::error::PartyError;

/// Whether the customer is a natural person or a business
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerType {
    Individual,
    Business,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::Individual => "INDIVIDUAL",
            CustomerType::Business => "BUSINESS",
        }
    }
}

impl std::str::FromStr for CustomerType {
    type Err = PartyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INDIVIDUAL" => Ok(CustomerType::Individual),
            "BUSINESS" => Ok(CustomerType::Business),
            other => Err(PartyError::invalid(format!("unknown customer type {other}"))),
        }
    }
}

/// A policyholder or claimant
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Customer {
    pub id: CustomerId,
    pub customer_type: CustomerType,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 200))]
    pub business_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(nested)]
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Creates an individual customer
    pub fn individual(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        address: Address,
    ) -> Self {
        Self {
            id: CustomerId::new_v7(),
            customer_type: CustomerType::Individual,
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            business_name: None,
            email: None,
            phone: None,
            date_of_birth: None,
            address,
            created_at: Utc::now(),
        }
    }

    /// Creates a business customer
    pub fn business(name: impl Into<String>, address: Address) -> Self {
        Self {
            id: CustomerId::new_v7(),
            customer_type: CustomerType::Business,
            first_name: None,
            last_name: None,
            business_name: Some(name.into()),
            email: None,
            phone: None,
            date_of_birth: None,
            address,
            created_at: Utc::now(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Name shown on documents and activity descriptions
    pub fn display_name(&self) -> String {
        match self.customer_type {
            CustomerType::Business => self.business_name.clone().unwrap_or_default(),
            CustomerType::Individual => {
                let first = self.first_name.as_deref().unwrap_or_default();
                let last = self.last_name.as_deref().unwrap_or_default();
                format!("{first} {last}").trim().to_string()
            }
        }
    }

    /// Case-insensitive substring match on names and email
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        [&self.first_name, &self.last_name, &self.business_name, &self.email]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&term))
    }

    /// Mailing-address state, the fallback tax jurisdiction
    pub fn home_state(&self) -> &str {
        &self.address.state
    }

    /// Checks field rules and that the name matching the customer type is present
    pub fn check(&self) -> Result<(), PartyError> {
        self.validate()?;
        let named = match self.customer_type {
            CustomerType::Individual => self.first_name.is_some() && self.last_name.is_some(),
            CustomerType::Business => self.business_name.is_some(),
        };
        if !named {
            return Err(PartyError::invalid(format!(
                "{} customer requires a name",
                self.customer_type.as_str()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address::new("500 Market St", "San Francisco", "CA", "94105")
    }

    #[test]
    fn test_display_name() {
        assert_eq!(Customer::individual("Ada", "Lovelace", address()).display_name(), "Ada Lovelace");
        assert_eq!(Customer::business("Acme Freight", address()).display_name(), "Acme Freight");
    }

    #[test]
    fn test_search_matches_names_and_email() {
        let customer = Customer::individual("Ada", "Lovelace", address()).with_email("ada@example.com");
        assert!(customer.matches_search("love"));
        assert!(customer.matches_search("EXAMPLE.com"));
        assert!(!customer.matches_search("turing"));
    }

    #[test]
    fn test_check_rejects_bad_email() {
        let customer = Customer::individual("Ada", "Lovelace", address()).with_email("not-an-email");
        assert!(matches!(customer.check(), Err(PartyError::ValidationFailed(_))));
    }

    #[test]
    fn test_business_requires_name() {
        let mut customer = Customer::business("Acme", address());
        customer.business_name = None;
        assert!(matches!(customer.check(), Err(PartyError::InvalidData(_))));
    }
}
