//! Decimal arithmetic and the non-negative money types.
//!
//! All cash, quantity and value math runs on [`Decimal`]. The helpers here
//! report overflow and division by zero as [`MoneyError`] rather than
//! panicking, and [`Amount`] / [`Price`] refuse to hold a negative value.

use std::fmt;
use std::str::FromStr;

pub use rust_decimal::Decimal;

use super::error::MoneyError;

pub fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal, MoneyError> {
    a.checked_add(b).ok_or(MoneyError::Overflow)
}

pub fn checked_sub(a: Decimal, b: Decimal) -> Result<Decimal, MoneyError> {
    a.checked_sub(b).ok_or(MoneyError::Overflow)
}

pub fn checked_mul(a: Decimal, b: Decimal) -> Result<Decimal, MoneyError> {
    a.checked_mul(b).ok_or(MoneyError::Overflow)
}

/// `a / b`, failing on a zero divisor instead of producing a value.
pub fn checked_div(a: Decimal, b: Decimal) -> Result<Decimal, MoneyError> {
    if b.is_zero() {
        return Err(MoneyError::DivisionByZero);
    }
    a.checked_div(b).ok_or(MoneyError::Overflow)
}

pub fn parse_decimal(input: &str) -> Result<Decimal, MoneyError> {
    let trimmed = input.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| MoneyError::Parse {
            input: input.to_string(),
            reason: e.to_string(),
        })
}

fn non_negative(kind: &'static str, value: Decimal) -> Result<Decimal, MoneyError> {
    if value < Decimal::ZERO {
        Err(MoneyError::Negative { kind, value })
    } else {
        Ok(value)
    }
}

/// A non-negative quantity or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        non_negative("amount", value).map(Amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Amount) -> Result<Amount, MoneyError> {
        Ok(Amount(checked_add(self.0, other.0)?))
    }

    /// Fails with [`MoneyError::Negative`] when `other` exceeds `self`.
    pub fn checked_sub(self, other: Amount) -> Result<Amount, MoneyError> {
        Amount::new(checked_sub(self.0, other.0)?)
    }

    /// Multiplies by a non-negative factor, e.g. an allocation fraction.
    pub fn scale(self, factor: Decimal) -> Result<Amount, MoneyError> {
        Amount::new(checked_mul(self.0, factor)?)
    }

    /// Converts into the other leg of a pair: `self / price`.
    pub fn convert_at(self, price: Price) -> Result<Amount, MoneyError> {
        Ok(Amount(checked_div(self.0, price.0)?))
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::new(parse_decimal(s)?)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A non-negative unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        non_negative("price", value).map(Price)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `price * quantity`: the quote-denominated value of `quantity` units.
    pub fn times(self, quantity: Amount) -> Result<Amount, MoneyError> {
        Ok(Amount(checked_mul(self.0, quantity.0)?))
    }
}

impl TryFrom<Decimal> for Price {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Price::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Price::new(parse_decimal(s)?)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn checked_div_reports_division_by_zero() {
        assert_eq!(
            checked_div(dec!(1), Decimal::ZERO),
            Err(MoneyError::DivisionByZero)
        );
        assert_eq!(checked_div(dec!(1), dec!(4)), Ok(dec!(0.25)));
    }

    #[test]
    fn checked_mul_reports_overflow() {
        assert_eq!(
            checked_mul(Decimal::MAX, dec!(2)),
            Err(MoneyError::Overflow)
        );
    }

    #[test]
    fn amount_rejects_negative() {
        assert!(Amount::new(dec!(0)).is_ok());
        assert!(Amount::new(dec!(12.5)).is_ok());
        assert_eq!(
            Amount::new(dec!(-0.01)),
            Err(MoneyError::Negative {
                kind: "amount",
                value: dec!(-0.01)
            })
        );
    }

    #[test]
    fn price_rejects_negative() {
        assert!(matches!(
            Price::new(dec!(-1)),
            Err(MoneyError::Negative { kind: "price", .. })
        ));
    }

    #[test]
    fn amount_sub_fails_instead_of_clamping() {
        let a = Amount::new(dec!(5)).unwrap();
        let b = Amount::new(dec!(7)).unwrap();
        assert!(matches!(a.checked_sub(b), Err(MoneyError::Negative { .. })));
        assert_eq!(b.checked_sub(a).unwrap().value(), dec!(2));
    }

    #[test]
    fn price_times_amount_is_amount() {
        let price = Price::new(dec!(2500.5)).unwrap();
        let qty = Amount::new(dec!(2)).unwrap();
        assert_eq!(price.times(qty).unwrap().value(), dec!(5001.0));
    }

    #[test]
    fn amount_convert_at_price() {
        let quote = Amount::new(dec!(1000)).unwrap();
        let price = Price::new(dec!(250)).unwrap();
        assert_eq!(quote.convert_at(price).unwrap().value(), dec!(4));
        assert_eq!(
            quote.convert_at(Price::ZERO),
            Err(MoneyError::DivisionByZero)
        );
    }

    #[test]
    fn amount_scale() {
        let cash = Amount::new(dec!(10000)).unwrap();
        assert_eq!(cash.scale(dec!(0.25)).unwrap().value(), dec!(2500.00));
        assert!(cash.scale(dec!(-1)).is_err());
    }

    #[test]
    fn parse_amount_and_price() {
        assert_eq!("10000".parse::<Amount>().unwrap().value(), dec!(10000));
        assert_eq!(" 1.5 ".parse::<Price>().unwrap().value(), dec!(1.5));
        assert_eq!("1e3".parse::<Amount>().unwrap().value(), dec!(1000));
        assert!(matches!(
            "abc".parse::<Amount>(),
            Err(MoneyError::Parse { .. })
        ));
        assert!(matches!(
            "-3".parse::<Price>(),
            Err(MoneyError::Negative { .. })
        ));
    }

    #[test]
    fn display_passes_through() {
        assert_eq!(Amount::new(dec!(1.50)).unwrap().to_string(), "1.50");
        assert_eq!(Price::new(dec!(100)).unwrap().to_string(), "100");
    }
}
