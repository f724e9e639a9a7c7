//! Monetary amounts in integer minor units.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Minor units per major unit (cents per dollar).
pub const MINOR_PER_MAJOR: i64 = 100;

/// An amount of money in the smallest currency unit.
///
/// The ledger is single-currency, so only the count of minor units is kept.
/// Amounts arrive on the wire as floating-point major units and are converted
/// once, at the boundary, with [`Money::from_major`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Converts a major-unit float (e.g. `150.25`) into minor units.
    ///
    /// Rounds half away from zero so that values like `100.10`, which are not
    /// exactly representable, land on `10010` instead of `10009`.
    pub fn from_major(major: f64) -> Result<Self, DomainError> {
        if !major.is_finite() {
            return Err(DomainError::invalid("amount", major, "must be a finite number"));
        }

        let minor = (major * MINOR_PER_MAJOR as f64).round();
        if minor >= i64::MAX as f64 || minor <= i64::MIN as f64 {
            return Err(DomainError::invalid("amount", major, "is out of range"));
        }

        Ok(Self(minor as i64))
    }

    /// Returns the amount in minor units.
    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Returns the amount in major units, for display on the wire.
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / MINOR_PER_MAJOR as f64
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = MINOR_PER_MAJOR as u64;
        write!(f, "{}{}.{:02}", sign, abs / per, abs % per)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major_exact() {
        assert_eq!(Money::from_major(150.0).unwrap().minor_units(), 15000);
    }

    #[test]
    fn test_from_major_rounds_instead_of_truncating() {
        // 100.10 * 100.0 == 10009.999999999998
        assert_eq!(Money::from_major(100.10).unwrap().minor_units(), 10010);
        assert_eq!(Money::from_major(0.29).unwrap().minor_units(), 29);
    }

    #[test]
    fn test_from_major_rejects_non_finite() {
        assert!(Money::from_major(f64::NAN).is_err());
        assert!(Money::from_major(f64::INFINITY).is_err());
    }

    #[test]
    fn test_from_major_rejects_overflow() {
        assert!(Money::from_major(1e18).is_err());
    }

    #[test]
    fn test_to_major() {
        assert_eq!(Money::from_minor(15050).to_major(), 150.5);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_minor(1050).to_string(), "10.50");
        assert_eq!(Money::from_minor(-5).to_string(), "-0.05");
    }
}
