//! Unit tests for Money and Rate as used in premium arithmetic

use core_kernel::{Currency, Money, MoneyError, Rate};
use rust_decimal_macros::dec;

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_add_same_currency() {
        let a = Money::usd(dec!(400));
        let b = Money::usd(dec!(200));
        assert_eq!(a.checked_add(&b).unwrap().amount(), dec!(600));
    }

    #[test]
    fn test_checked_sub_currency_mismatch() {
        let usd = Money::usd(dec!(10));
        let cad = Money::new(dec!(10), Currency::CAD);
        assert!(matches!(usd.checked_sub(&cad), Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_sum_rejects_mixed_currencies() {
        let amounts = [Money::usd(dec!(1)), Money::new(dec!(1), Currency::GBP)];
        assert!(Money::sum(Currency::USD, &amounts).is_err());
    }

    #[test]
    fn test_new_keeps_four_decimal_places() {
        assert_eq!(Money::usd(dec!(1.234567)).amount(), dec!(1.2346));
    }
}

mod rate {
    use super::*;

    /// Default 2% tax on 1234.56
    #[test]
    fn test_apply_rounds_to_cents() {
        let tax = Rate::new(dec!(0.02)).apply(&Money::usd(dec!(1234.56))).unwrap();
        assert_eq!(tax.amount(), dec!(24.69));
    }

    #[test]
    fn test_display() {
        assert_eq!(Rate::from_percentage(dec!(2.5)).to_string(), "2.5%");
    }
}

mod display {
    use super::*;

    #[test]
    fn test_money_display() {
        assert_eq!(Money::usd(dec!(640)).to_string(), "$ 640.00");
    }

    #[test]
    fn test_serde_uses_uppercase_currency() {
        let json = serde_json::to_string(&Money::usd(dec!(15))).unwrap();
        assert!(json.contains("\"USD\""));
    }
}
