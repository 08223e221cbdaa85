//! Calldata cost of packed signatures and comparisons between gas figures

use crate::constants::calldata::{NON_ZERO_BYTE_GAS, ZERO_BYTE_GAS};
use ethers::types::U256;
use std::fmt;

/// Intrinsic gas charged for `data` when sent as calldata
pub fn calldata_gas(data: &[u8]) -> u64 {
    data.iter().map(|b| if *b == 0 { ZERO_BYTE_GAS } else { NON_ZERO_BYTE_GAS }).sum()
}

/// Which of two gas figures is larger and by how much
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GasComparison {
    /// Both figures are equal
    Equal,
    /// The first figure is larger; `percent` is relative to the second
    FirstLarger { difference: U256, percent: Option<U256> },
    /// The second figure is larger; `percent` is relative to the first
    SecondLarger { difference: U256, percent: Option<U256> },
}

impl GasComparison {
    /// Compares `first` with `second`.
    ///
    /// The percentage is `(larger - smaller) * 100 / smaller`, rounded toward zero, and absent
    /// when the smaller figure is zero.
    pub fn compare(first: U256, second: U256) -> Self {
        if first == second {
            return Self::Equal;
        }

        let (larger, smaller) = if first > second { (first, second) } else { (second, first) };
        let difference = larger - smaller;
        let percent = if smaller.is_zero() {
            None
        } else {
            difference.checked_mul(100.into()).map(|scaled| scaled / smaller)
        };

        if first > second {
            Self::FirstLarger { difference, percent }
        } else {
            Self::SecondLarger { difference, percent }
        }
    }
}

impl fmt::Display for GasComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (side, difference, percent) = match self {
            Self::Equal => return write!(f, "both cost the same"),
            Self::FirstLarger { difference, percent } => ("first", difference, percent),
            Self::SecondLarger { difference, percent } => ("second", difference, percent),
        };
        match percent {
            Some(percent) => write!(f, "{side} costs {difference} more gas ({percent}% more)"),
            None => write!(f, "{side} costs {difference} more gas"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calldata_pricing() {
        assert_eq!(calldata_gas(&[]), 0);
        assert_eq!(calldata_gas(&[0, 0, 1]), 4 + 4 + 16);
        assert_eq!(calldata_gas(&[0xff; 32]), 512);
    }

    #[test]
    fn percentage_rounds_toward_zero() {
        assert_eq!(
            GasComparison::compare(150.into(), 100.into()),
            GasComparison::FirstLarger { difference: 50.into(), percent: Some(50.into()) }
        );
        assert_eq!(
            GasComparison::compare(3.into(), 5.into()),
            GasComparison::SecondLarger { difference: 2.into(), percent: Some(66.into()) }
        );
    }

    #[test]
    fn equal_and_zero_figures() {
        assert_eq!(GasComparison::compare(7.into(), 7.into()), GasComparison::Equal);
        assert_eq!(
            GasComparison::compare(0.into(), 10.into()),
            GasComparison::SecondLarger { difference: 10.into(), percent: None }
        );
    }

    #[test]
    fn display() {
        assert_eq!(
            GasComparison::compare(200.into(), 100.into()).to_string(),
            "first costs 100 more gas (100% more)"
        );
        assert_eq!(GasComparison::Equal.to_string(), "both cost the same");
    }
}
