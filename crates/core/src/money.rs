//! Monetary amounts in the club's smallest currency unit.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Amount of money in minor units (no fractional part).
///
/// Balances are never negative in this domain; reductions go through
/// [`Amount::reduce_clamped`], which floors at zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl ValueObject for Amount {}

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_minor(value: i64) -> Self {
        Self(value)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Validate that this amount can be used as an operation amount.
    pub fn ensure_positive(self, field: &str) -> DomainResult<Self> {
        if self.is_positive() {
            Ok(self)
        } else {
            Err(DomainError::validation(format!("{field} must be greater than zero")))
        }
    }

    /// Negative values count as zero.
    pub fn clamped(self) -> Self {
        Self(self.0.max(0))
    }

    pub fn checked_add(self, rhs: Amount) -> DomainResult<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or_else(|| DomainError::invariant("amount overflow"))
    }

    /// Used when replaying events whose sums were already checked on decision.
    pub fn saturating_add(self, rhs: Amount) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Subtract `by`, flooring at zero.
    ///
    /// Returns the new amount and the part of `by` that was actually applied;
    /// anything beyond the current amount is absorbed.
    pub fn reduce_clamped(self, by: Amount) -> (Amount, Amount) {
        let current = self.clamped();
        let applied = by.clamped().min(current);
        (Amount(current.0 - applied.0), applied)
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl core::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        Amount(iter.map(|a| a.0).sum())
    }
}
