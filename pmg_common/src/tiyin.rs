use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const UZS_CURRENCY_CODE: &str = "UZS";
pub const UZS_CURRENCY_CODE_LOWER: &str = "uzs";

/// The number of tiyin in one so'm (UZS).
const TIYIN_PER_UZS: i64 = 100;

//--------------------------------------      Tiyin        -----------------------------------------------------------
/// An amount of Uzbek so'm expressed in tiyin, the minor unit (100 tiyin = 1 UZS).
///
/// Payment amounts are always carried as integer minor units, never as floating point.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Tiyin(i64);

op!(binary Tiyin, Add, add);
op!(binary Tiyin, Sub, sub);
op!(inplace Tiyin, SubAssign, sub_assign);
op!(unary Tiyin, Neg, neg);

impl Mul<i64> for Tiyin {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Tiyin {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in tiyin: {0}")]
pub struct TiyinConversionError(String);

impl From<i64> for Tiyin {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Tiyin {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Tiyin {}

impl TryFrom<u64> for Tiyin {
    type Error = TiyinConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(TiyinConversionError(format!("Value {} is too large to convert to Tiyin", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Tiyin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.abs() < TIYIN_PER_UZS {
            write!(f, "{} tiyin", self.0)
        } else {
            let uzs = self.0 as f64 / TIYIN_PER_UZS as f64;
            write!(f, "{uzs:0.2} {UZS_CURRENCY_CODE}")
        }
    }
}

impl Tiyin {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_uzs(uzs: i64) -> Self {
        Self(uzs * TIYIN_PER_UZS)
    }

    /// The amount in major units. Only intended for display and price-table matching.
    pub fn to_uzs(&self) -> f64 {
        self.0 as f64 / TIYIN_PER_UZS as f64
    }
}
