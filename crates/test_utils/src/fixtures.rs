//! Pre-built Test Fixtures
//!
//! Consistent, predictable data for the entities the engine reads:
//! customers, adjusters, vehicles, drivers and locations. Names and emails
//! come from `fake` where a test only needs *some* plausible value.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rust_decimal_macros::dec;

use core_kernel::Money;
use domain_party::{Address, Customer, User, UserRole};
use domain_policy::{
    BuildingDetails, ConstructionType, Driver, InsuredItem, Location, OccupancyType, VehicleDetails,
};

/// The instant every fixed-clock test runs at: 2024-06-01 12:00 UTC
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub struct CustomerFixtures;

impl CustomerFixtures {
    /// A named individual living in `state`
    pub fn individual_in(state: &str) -> Customer {
        Customer::individual(
            "Jordan",
            "Reyes",
            Address::new("410 Elm St", "Springfield", state, "12207"),
        )
        .with_email("jordan.reyes@example.com")
    }

    /// An individual with generated name and email
    pub fn random_individual(state: &str) -> Customer {
        let first: String = FirstName().fake();
        let last: String = LastName().fake();
        let email: String = SafeEmail().fake();
        Customer::individual(first, last, Address::new("1 Main St", "Riverton", state, "84065"))
            .with_email(email)
    }

    pub fn business_in(state: &str) -> Customer {
        Customer::business(
            "Harbor Freight Logistics LLC",
            Address::new("900 Dock Rd", "Tacoma", state, "98421"),
        )
    }
}

pub struct AdjusterFixtures;

impl AdjusterFixtures {
    pub fn named(name: &str) -> User {
        let email = format!("{}@claims.example.com", name.to_lowercase().replace(' ', "."));
        User::new(name, email, UserRole::Adjuster)
    }

    /// `count` adjusters with generated names, in roster order
    pub fn roster(count: usize) -> Vec<User> {
        (0..count)
            .map(|i| {
                let first: String = FirstName().fake();
                User::new(first, format!("adjuster{i}@claims.example.com"), UserRole::Adjuster)
            })
            .collect()
    }
}

pub struct RiskFixtures;

impl RiskFixtures {
    pub fn vehicle() -> InsuredItem {
        InsuredItem::vehicle(
            VehicleDetails {
                year: 2022,
                make: "Ford".into(),
                model: "Escape".into(),
                vin: "1FMCU9G60NUA00001".into(),
                vehicle_type: Some("SUV".into()),
                garaging_zip: Some("94110".into()),
            },
            Some(Money::usd(dec!(28000))),
        )
    }

    pub fn dwelling(address: &str) -> InsuredItem {
        InsuredItem::building(
            BuildingDetails {
                address: address.to_string(),
                construction_type: Some(ConstructionType::Frame),
                occupancy_type: Some(OccupancyType::OwnerOccupied),
                square_footage: Some(2100),
                year_built: Some(1998),
            },
            Some(Money::usd(dec!(350000))),
        )
    }

    /// A driver aged 44 on the fixed test date
    pub fn adult_driver() -> Driver {
        Driver::named(
            "Jordan",
            "Reyes",
            NaiveDate::from_ymd_opt(1980, 2, 29).unwrap(),
            "D1234567",
            "CA",
        )
    }

    /// A driver aged 20 on the fixed test date
    pub fn young_driver() -> Driver {
        Driver::named(
            "Casey",
            "Reyes",
            NaiveDate::from_ymd_opt(2004, 3, 10).unwrap(),
            "D7654321",
            "CA",
        )
    }

    pub fn location_in(state: &str) -> Location {
        Location::new("22 Valencia St", "San Francisco", state, "94110")
    }
}
