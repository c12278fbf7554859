//! Postal addresses

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// A US postal address. `state` is the two-letter postal abbreviation and
/// doubles as the tax jurisdiction when a policy has no locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Address {
    #[validate(length(min = 1, max = 200))]
    pub street: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(custom(function = "validate_state_code"))]
    pub state: String,
    #[validate(length(min = 5, max = 10))]
    pub zip_code: String,
}

impl Address {
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip_code: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            state: state.into().to_ascii_uppercase(),
            zip_code: zip_code.into(),
        }
    }

    /// Single-line rendering used in activity descriptions
    pub fn one_line(&self) -> String {
        format!("{}, {}, {} {}", self.street, self.city, self.state, self.zip_code)
    }
}

/// Two ASCII uppercase letters
pub fn validate_state_code(state: &str) -> Result<(), ValidationError> {
    if state.len() == 2 && state.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ValidationError::new("state_code"))
    }
}
