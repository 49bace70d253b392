//! Fractional rate type for commission and markup math.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! A `Rate` wraps `rust_decimal::Decimal` and is expressed as a fraction
//! (0.20 = 20%), matching how commission and markup percentages are stored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A non-negative fractional rate (0.20 = 20%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(Decimal);

/// Errors raised when constructing a [`Rate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateError {
    /// Rates cannot be negative.
    #[error("Rate cannot be negative: {0}")]
    Negative(Decimal),

    /// The rate exceeds 1 where a share of a whole was expected.
    #[error("Rate {0} exceeds 1")]
    AboveUnit(Decimal),
}

impl Rate {
    /// A zero rate.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a rate from a fraction. Any non-negative value is accepted
    /// (markups may exceed 100%).
    pub fn new(fraction: Decimal) -> Result<Self, RateError> {
        if fraction.is_sign_negative() {
            return Err(RateError::Negative(fraction));
        }
        Ok(Self(fraction))
    }

    /// Creates a rate that must be a share of a whole (commission, platform
    /// cut): non-negative and at most 1.
    pub fn share(fraction: Decimal) -> Result<Self, RateError> {
        if fraction.is_sign_negative() {
            return Err(RateError::Negative(fraction));
        }
        if fraction > Decimal::ONE {
            return Err(RateError::AboveUnit(fraction));
        }
        Ok(Self(fraction))
    }

    /// Returns the inner fraction.
    #[must_use]
    pub const fn fraction(self) -> Decimal {
        self.0
    }

    /// Returns true if the rate is zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Applies the rate to an amount without rounding.
    ///
    /// Callers that persist the result are responsible for rounding it
    /// through the settlement calculator.
    #[must_use]
    pub fn of(self, amount: Decimal) -> Decimal {
        amount * self.0
    }
}

impl std::fmt::Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
