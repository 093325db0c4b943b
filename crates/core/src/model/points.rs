use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PointsError {
    #[error("points must be a finite number")]
    NotFinite,
}

/// Mark value of a question, a part, or a whole paper.
///
/// Always finite. Negative values are representable so that budgets can be
/// computed by subtraction; banks with negative marks are rejected on load.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Points(f64);

impl Points {
    pub const ZERO: Self = Self(0.0);

    /// Creates a points value.
    ///
    /// # Errors
    ///
    /// Returns `PointsError::NotFinite` for NaN or infinite input.
    pub fn new(value: f64) -> Result<Self, PointsError> {
        if !value.is_finite() {
            return Err(PointsError::NotFinite);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0 < 0.0
    }

    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > 0.0
    }
}

impl From<u32> for Points {
    fn from(value: u32) -> Self {
        Self(f64::from(value))
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl Add for Points {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Points {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Points {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Whole marks print without a fractional part (`4`, not `4.0`).
impl fmt::Display for Points {
    #[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}
