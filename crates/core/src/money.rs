//! Money in integer minor units.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::value_object::ValueObject;

/// An amount of money in the smallest currency unit (e.g. cents).
///
/// Signed so that balances and test fixtures can express negative values;
/// commands only ever accept positive amounts.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl ValueObject for Amount {}

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn new(minor_units: i64) -> Self {
        Self(minor_units)
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Amount) -> Result<Amount, LedgerError> {
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or_else(|| LedgerError::integrity(format!("amount overflow: {self} + {other}")))
    }

    pub fn checked_sub(self, other: Amount) -> Result<Amount, LedgerError> {
        self.0
            .checked_sub(other.0)
            .map(Amount)
            .ok_or_else(|| LedgerError::integrity(format!("amount overflow: {self} - {other}")))
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_is_checked() {
        assert_eq!(Amount::new(50).checked_sub(Amount::new(25)), Ok(Amount::new(25)));
        assert!(matches!(
            Amount::new(i64::MAX).checked_add(Amount::new(1)),
            Err(LedgerError::Integrity(_))
        ));
    }

    #[test]
    fn serializes_as_a_bare_integer() {
        assert_eq!(serde_json::to_string(&Amount::new(2500)).unwrap(), "2500");
        assert_eq!(serde_json::from_str::<Amount>("-3").unwrap(), Amount::new(-3));
    }
}
