//! Money types with precise decimal arithmetic
//!
//! Premiums, fees, taxes, loss amounts and reserves are all carried as
//! [`Money`], a `rust_decimal` amount tagged with its currency. Arithmetic
//! between two amounts is checked so that currencies never mix silently.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest amount the engine accepts or stores, the ceiling of a
/// `NUMERIC(14, 2)` column
pub const MAX_AMOUNT: Decimal = dec!(999_999_999_999.99);

/// Currency codes following ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    USD,
    CAD,
    EUR,
    GBP,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::CAD => "C$",
            Currency::EUR => "€",
            Currency::GBP => "£",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::CAD => "CAD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "CAD" => Ok(Currency::CAD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            other => Err(MoneyError::UnknownCurrency(other.to_string())),
        }
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Amount {0} exceeds the maximum of {MAX_AMOUNT}")]
    OutOfRange(Decimal),
}

/// A monetary amount with associated currency
///
/// Amounts are held at 4 decimal places internally; anything that is shown
/// to a customer or persisted as a premium goes through
/// [`Money::round_to_currency`] first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(4),
            currency,
        }
    }

    /// Shorthand for a US dollar amount
    pub fn usd(amount: Decimal) -> Self {
        Self::new(amount, Currency::USD)
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Rounds half away from zero to the currency's minor unit
    pub fn round_to_currency(&self) -> Self {
        Self {
            amount: self.amount.round_dp_with_strategy(
                self.currency.decimal_places(),
                RoundingStrategy::MidpointAwayFromZero,
            ),
            currency: self.currency,
        }
    }

    /// Fails with `OutOfRange` when the magnitude exceeds [`MAX_AMOUNT`]
    pub fn ensure_within_limit(&self) -> Result<Self, MoneyError> {
        if self.amount.abs() > MAX_AMOUNT {
            return Err(MoneyError::OutOfRange(self.amount));
        }
        Ok(*self)
    }

    /// Addition that fails on currency mismatch or overflow
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let amount = self.amount.checked_add(other.amount).ok_or(MoneyError::Overflow)?;
        Ok(Self::new(amount, self.currency))
    }

    /// Subtraction that fails on currency mismatch or overflow
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let amount = self.amount.checked_sub(other.amount).ok_or(MoneyError::Overflow)?;
        Ok(Self::new(amount, self.currency))
    }

    /// Multiplies by a scalar (e.g., for rate calculations)
    pub fn checked_multiply(&self, factor: Decimal) -> Result<Self, MoneyError> {
        let amount = self.amount.checked_mul(factor).ok_or(MoneyError::Overflow)?;
        Ok(Self::new(amount, self.currency))
    }

    /// Sums a sequence of amounts, all of which must share `currency`
    pub fn sum<'a>(
        currency: Currency,
        amounts: impl IntoIterator<Item = &'a Money>,
    ) -> Result<Money, MoneyError> {
        amounts
            .into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.checked_add(m))
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        write!(
            f,
            "{} {:.dp$}",
            self.currency.symbol(),
            self.amount,
            dp = dp as usize
        )
    }
}

/// A percentage rate such as a premium tax rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    /// The rate as a decimal (e.g., 0.025 for 2.5%)
    value: Decimal,
}

impl Rate {
    /// Creates a rate from a decimal value (e.g., 0.05 for 5%)
    pub fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Creates a rate from a percentage (e.g., 5.0 for 5%)
    pub fn from_percentage(percentage: Decimal) -> Self {
        Self {
            value: percentage / dec!(100),
        }
    }

    pub fn as_decimal(&self) -> Decimal {
        self.value
    }

    pub fn as_percentage(&self) -> Decimal {
        self.value * dec!(100)
    }

    /// Applies this rate to a money amount, rounded to the currency's minor unit
    pub fn apply(&self, money: &Money) -> Result<Money, MoneyError> {
        Ok(money.checked_multiply(self.value)?.round_to_currency())
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        let m = Money::usd(dec!(10.005));
        assert_eq!(m.round_to_currency().amount(), dec!(10.01));

        let m = Money::usd(dec!(-10.005));
        assert_eq!(m.round_to_currency().amount(), dec!(-10.01));
    }

    #[test]
    fn test_currency_mismatch() {
        let usd = Money::usd(dec!(100.00));
        let eur = Money::new(dec!(100.00), Currency::EUR);

        let result = usd.checked_add(&eur);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_sum_of_empty_is_zero() {
        let total = Money::sum(Currency::USD, []).unwrap();
        assert!(total.is_zero());
    }

    #[test]
    fn test_rate_application() {
        let rate = Rate::from_percentage(dec!(2.5));
        let charge = rate.apply(&Money::usd(dec!(600))).unwrap();
        assert_eq!(charge.amount(), dec!(15.00));
    }

    #[test]
    fn test_addition_overflow_is_an_error() {
        let max = Money::usd(Decimal::MAX);
        assert_eq!(max.checked_add(&Money::usd(dec!(1))), Err(MoneyError::Overflow));
        assert_eq!(Money::sum(Currency::USD, &[max, max]), Err(MoneyError::Overflow));
        assert_eq!(max.checked_multiply(dec!(2)), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_limit_check() {
        assert!(Money::usd(MAX_AMOUNT).ensure_within_limit().is_ok());
        assert!(matches!(
            Money::usd(dec!(1_000_000_000_000)).ensure_within_limit(),
            Err(MoneyError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::USD);
        assert!("XYZ".parse::<Currency>().is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn sum_matches_decimal_sum(cents in proptest::collection::vec(0i64..10_000_000, 0..20)) {
            let amounts: Vec<Money> = cents
                .iter()
                .map(|c| Money::usd(Decimal::new(*c, 2)))
                .collect();
            let expected: Decimal = cents.iter().map(|c| Decimal::new(*c, 2)).sum();

            prop_assert_eq!(Money::sum(Currency::USD, &amounts).unwrap().amount(), expected);
        }
    }
}
