//! Currency-accurate monetary amounts.
//!
//! `Money` wraps a [`Decimal`] limited to [`CURRENCY_SCALE`] fractional digits.
//! Amounts typed by a user are parsed strictly (over-precise input is an
//! error); amounts received from the backend are rounded to the currency scale.

use core::iter::Sum;
use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// Number of fractional digits of the currency (cents).
pub const CURRENCY_SCALE: u32 = 2;

/// A monetary amount in the receivables currency.
///
/// Negative values only occur as derived quantities (e.g. an over-allocated
/// remaining balance).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Largest magnitude accepted from user input: 999,999,999,999.99.
    pub const MAX_INPUT: Money = Money(Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, CURRENCY_SCALE));

    /// Build from a decimal that must already fit the currency scale.
    pub fn from_decimal(amount: Decimal) -> Result<Self, DomainError> {
        if amount.normalize().scale() > CURRENCY_SCALE {
            return Err(DomainError::invalid_amount(format!(
                "{amount} has more than {CURRENCY_SCALE} decimal places"
            )));
        }
        Ok(Self(amount))
    }

    /// Build from any decimal, rounding half away from zero to the currency scale.
    pub fn from_decimal_rounded(amount: Decimal) -> Self {
        Self(amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Build from an integer number of minor units (cents).
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, CURRENCY_SCALE))
    }

    /// Parse user-entered text such as `"250"`, `"250.5"` or `" 250.50 "`.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_amount("empty input"));
        }
        let amount = Decimal::from_str(trimmed)
            .map_err(|_| DomainError::invalid_amount(format!("not a number: {trimmed:?}")))?;
        if amount.abs() > Self::MAX_INPUT.0 {
            return Err(DomainError::invalid_amount(format!(
                "{trimmed} exceeds {}",
                Self::MAX_INPUT
            )));
        }
        Self::from_decimal(amount)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// `percent`% of this amount, rounded to the currency scale.
    pub fn percent(&self, percent: Decimal) -> Money {
        Self::from_decimal_rounded(self.0 * percent / Decimal::ONE_HUNDRED)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

// The backend speaks JSON numbers; some legacy fields arrive as numeric strings.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Ok(Money::from_decimal_rounded(amount))
    }
}
