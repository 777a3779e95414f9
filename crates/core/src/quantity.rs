//! Fixed-precision material quantities (grams or milliliters).
//!
//! Quantities are decimals rounded to [`QUANTITY_SCALE`] places the moment they
//! are constructed, so long chains of cascaded draw-downs never accumulate
//! binary floating-point drift.

use core::fmt;
use core::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Number of decimal places every quantity is rounded to.
pub const QUANTITY_SCALE: u32 = 2;

/// Non-negative material quantity with fixed precision.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl ValueObject for Quantity {}

fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

impl Quantity {
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);

    /// Build a quantity, rounding to the fixed scale. Negative values are rejected.
    pub fn new(value: Decimal) -> DomainResult<Self> {
        let value = round(value);
        if value < Decimal::ZERO {
            return Err(DomainError::invalid_quantity(format!(
                "quantity cannot be negative: {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Build a strictly positive quantity (after rounding).
    pub fn positive(value: Decimal) -> DomainResult<Self> {
        let q = Self::new(value)?;
        if q.is_zero() {
            return Err(DomainError::invalid_quantity(format!(
                "quantity must be positive: {value}"
            )));
        }
        Ok(q)
    }

    /// Convert user-entered floating point input. NaN and infinities are rejected.
    pub fn from_f64(value: f64) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::invalid_quantity(format!(
                "quantity must be finite: {value}"
            )));
        }
        let decimal = Decimal::from_f64(value).ok_or_else(|| {
            DomainError::invalid_quantity(format!("quantity out of range: {value}"))
        })?;
        Self::new(decimal)
    }

    /// Whole-number quantity; always valid.
    pub fn whole(value: u32) -> Self {
        Self(Decimal::from(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::MAX)
    }

    /// `self - rhs`, or `None` if the result would be negative.
    pub fn checked_sub(self, rhs: Quantity) -> Option<Quantity> {
        if rhs > self {
            return None;
        }
        Some(Self(self.0 - rhs.0))
    }

    /// `self + rhs`; fails instead of leaving the decimal range.
    pub fn checked_add(self, rhs: Quantity) -> DomainResult<Quantity> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or_else(|| DomainError::invariant(format!("quantity overflow: {self} + {rhs}")))
    }

    /// `self * count`; fails instead of leaving the decimal range.
    pub fn checked_times(self, count: u32) -> DomainResult<Quantity> {
        self.0
            .checked_mul(Decimal::from(count))
            .map(|product| Self(round(product)))
            .ok_or_else(|| DomainError::invariant(format!("quantity overflow: {self} x {count}")))
    }

    /// Sum of `items`, failing on the first overflow.
    pub fn checked_sum<I: IntoIterator<Item = Quantity>>(items: I) -> DomainResult<Quantity> {
        items
            .into_iter()
            .try_fold(Quantity::ZERO, |total, q| total.checked_add(q))
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl FromStr for Quantity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim())
            .map_err(|e| DomainError::invalid_quantity(format!("{s:?}: {e}")))?;
        Self::new(decimal)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.normalize(), f)
    }
}
