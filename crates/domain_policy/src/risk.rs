//! Insured items, drivers and locations owned by a policy

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{temporal::age_at, DriverId, InsuredItemId, LocationId, Money};

use crate::error::PolicyError;

/// What an insured item is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsuredItemKind {
    Vehicle(VehicleDetails),
    Building(BuildingDetails),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleDetails {
    pub year: i32,
    pub make: String,
    pub model: String,
    pub vin: String,
    pub vehicle_type: Option<String>,
    pub garaging_zip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingDetails {
    pub address: String,
    pub construction_type: Option<ConstructionType>,
    pub occupancy_type: Option<OccupancyType>,
    pub square_footage: Option<u32>,
    pub year_built: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstructionType {
    Frame,
    Masonry,
    Brick,
    Concrete,
    Steel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OccupancyType {
    OwnerOccupied,
    TenantOccupied,
    Vacant,
    Commercial,
}

/// A vehicle or building insured by the policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuredItem {
    pub id: InsuredItemId,
    pub kind: InsuredItemKind,
    pub description: String,
    pub covered_amount: Option<Money>,
}

impl InsuredItem {
    pub fn vehicle(details: VehicleDetails, covered_amount: Option<Money>) -> Self {
        let description = format!("{} {} {}", details.year, details.make, details.model);
        Self {
            id: InsuredItemId::new_v7(),
            kind: InsuredItemKind::Vehicle(details),
            description,
            covered_amount: covered_amount.map(|m| m.round_to_currency()),
        }
    }

    pub fn building(details: BuildingDetails, covered_amount: Option<Money>) -> Self {
        let description = details.address.clone();
        Self {
            id: InsuredItemId::new_v7(),
            kind: InsuredItemKind::Building(details),
            description,
            covered_amount: covered_amount.map(|m| m.round_to_currency()),
        }
    }

    pub fn is_vehicle(&self) -> bool {
        matches!(self.kind, InsuredItemKind::Vehicle(_))
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if let Some(amount) = self.covered_amount {
            if amount.is_negative() {
                return Err(PolicyError::validation(format!(
                    "covered amount for {} cannot be negative",
                    self.description
                )));
            }
            amount.ensure_within_limit()?;
        }
        match &self.kind {
            InsuredItemKind::Vehicle(v) => {
                if v.vin.trim().is_empty() || v.make.trim().is_empty() {
                    return Err(PolicyError::validation("vehicle requires make and VIN"));
                }
                if !(1900..=2100).contains(&v.year) {
                    return Err(PolicyError::validation(format!("implausible vehicle year {}", v.year)));
                }
            }
            InsuredItemKind::Building(b) => {
                if b.address.trim().is_empty() {
                    return Err(PolicyError::validation("building requires an address"));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverType {
    Named,
    Occasional,
    Excluded,
}

/// A driver listed on an auto policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub driver_type: DriverType,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub license_number: String,
    pub license_state: String,
    pub years_licensed: Option<u32>,
}

impl Driver {
    pub fn named(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: NaiveDate,
        license_number: impl Into<String>,
        license_state: impl Into<String>,
    ) -> Self {
        Self {
            id: DriverId::new_v7(),
            driver_type: DriverType::Named,
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth,
            license_number: license_number.into(),
            license_state: license_state.into(),
            years_licensed: None,
        }
    }

    pub fn age_on(&self, date: NaiveDate) -> i32 {
        age_at(self.date_of_birth, date)
    }

    /// Excluded drivers are listed but not rated
    pub fn is_rated(&self) -> bool {
        self.driver_type != DriverType::Excluded
    }

    pub fn validate(&self, as_of: NaiveDate) -> Result<(), PolicyError> {
        if self.license_number.trim().is_empty() {
            return Err(PolicyError::validation(format!(
                "driver {} {} requires a license number",
                self.first_name, self.last_name
            )));
        }
        if self.age_on(as_of) < 15 {
            return Err(PolicyError::validation(format!(
                "driver {} {} is below driving age",
                self.first_name, self.last_name
            )));
        }
        Ok(())
    }
}

/// A risk location; the first one supplies the tax jurisdiction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub construction_type: Option<ConstructionType>,
    pub occupancy_type: Option<OccupancyType>,
    pub year_built: Option<i32>,
}

impl Location {
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip_code: impl Into<String>,
    ) -> Self {
        Self {
            id: LocationId::new_v7(),
            street: street.into(),
            city: city.into(),
            state: state.into().to_ascii_uppercase(),
            zip_code: zip_code.into(),
            construction_type: None,
            occupancy_type: None,
            year_built: None,
        }
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.state.len() != 2 || !self.state.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(PolicyError::validation(format!("invalid location state '{}'", self.state)));
        }
        if self.street.trim().is_empty() {
            return Err(PolicyError::validation("location requires a street"));
        }
        Ok(())
    }
}
