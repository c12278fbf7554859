//! Product lines written by the carrier

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PolicyError;

/// The product line of a policy. Determines the coverage catalog, the fee
/// charged and the base risk points used by underwriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    PersonalAuto,
    Homeowners,
    Renters,
    CommercialAuto,
    CommercialProperty,
    Umbrella,
}

impl ProductType {
    pub const ALL: [ProductType; 6] = [
        ProductType::PersonalAuto,
        ProductType::Homeowners,
        ProductType::Renters,
        ProductType::CommercialAuto,
        ProductType::CommercialProperty,
        ProductType::Umbrella,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::PersonalAuto => "PERSONAL_AUTO",
            ProductType::Homeowners => "HOMEOWNERS",
            ProductType::Renters => "RENTERS",
            ProductType::CommercialAuto => "COMMERCIAL_AUTO",
            ProductType::CommercialProperty => "COMMERCIAL_PROPERTY",
            ProductType::Umbrella => "UMBRELLA",
        }
    }

    /// Auto lines carry drivers and vehicles
    pub fn is_auto(&self) -> bool {
        matches!(self, ProductType::PersonalAuto | ProductType::CommercialAuto)
    }

    /// Property lines need at least one location or building
    pub fn is_property(&self) -> bool {
        matches!(
            self,
            ProductType::Homeowners | ProductType::Renters | ProductType::CommercialProperty
        )
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductType::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| PolicyError::validation(format!("unknown product type {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_str() {
        for product in ProductType::ALL {
            assert_eq!(product.as_str().parse::<ProductType>().unwrap(), product);
        }
        assert!("LIFE".parse::<ProductType>().is_err());
    }

    #[test]
    fn test_serde_name() {
        let json = serde_json::to_string(&ProductType::CommercialAuto).unwrap();
        assert_eq!(json, "\"COMMERCIAL_AUTO\"");
    }
}
