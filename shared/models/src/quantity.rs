//! Unit-checked scalar quantities.
//!
//! A [`Quantity`] combines either with another quantity of the same unit or
//! with a bare scalar, which is applied directly to the value. Every
//! operation returns a new quantity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LciError, LciResult};
use crate::unit::Unit;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

/// Right-hand side of a quantity operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Quantity(Quantity),
    Scalar(f64),
}

impl From<Quantity> for Operand {
    fn from(quantity: Quantity) -> Self {
        Self::Quantity(quantity)
    }
}

impl From<&Quantity> for Operand {
    fn from(quantity: &Quantity) -> Self {
        Self::Quantity(quantity.clone())
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Self::Scalar(f64::from(value))
    }
}

impl Operand {
    pub fn value(&self) -> f64 {
        match self {
            Self::Quantity(q) => q.value,
            Self::Scalar(v) => *v,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value() == 0.0
    }
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn zero(unit: Unit) -> Self {
        Self::new(0.0, unit)
    }

    /// Resolves the operand's value, rejecting quantities of another unit.
    fn compatible_value(&self, other: &Operand) -> LciResult<f64> {
        match other {
            Operand::Quantity(q) if q.unit != self.unit => {
                Err(LciError::unit_mismatch(&self.unit.name, &q.unit.name))
            }
            _ => Ok(other.value()),
        }
    }

    pub fn add(&self, other: impl Into<Operand>) -> LciResult<Quantity> {
        let value = self.compatible_value(&other.into())?;
        Ok(Quantity::new(self.value + value, self.unit.clone()))
    }

    pub fn subtract(&self, other: impl Into<Operand>) -> LciResult<Quantity> {
        let value = self.compatible_value(&other.into())?;
        Ok(Quantity::new(self.value - value, self.unit.clone()))
    }

    /// Scales this quantity. Multiplying two quantities models "a fraction of
    /// a quantity", so the result keeps the unit of `self`.
    pub fn multiply(&self, other: impl Into<Operand>) -> LciResult<Quantity> {
        let value = self.compatible_value(&other.into())?;
        Ok(Quantity::new(self.value * value, self.unit.clone()))
    }

    pub fn is_greater_than(&self, other: impl Into<Operand>) -> LciResult<bool> {
        let value = self.compatible_value(&other.into())?;
        Ok(self.value > value)
    }

    /// Addition where a zero operand (bare `0` or a zero quantity of the same
    /// unit) is the neutral element, so sums can be folded from `0`.
    pub fn identity_add(&self, other: impl Into<Operand>) -> LciResult<Quantity> {
        let other = other.into();
        self.compatible_value(&other)?;
        if other.is_zero() {
            return Ok(self.clone());
        }
        self.add(other)
    }

    /// Folds quantities starting from a bare zero. Returns `None` for an
    /// empty input since no unit can be inferred.
    pub fn sum<'a, I>(quantities: I) -> LciResult<Option<Quantity>>
    where
        I: IntoIterator<Item = &'a Quantity>,
    {
        let mut total: Option<Quantity> = None;
        for quantity in quantities {
            total = Some(match total {
                None => quantity.identity_add(0.0)?,
                Some(acc) => quantity.identity_add(acc)?,
            });
        }
        Ok(total)
    }

    /// Value rounded to five decimals, as used for display.
    pub fn rounded_value(&self) -> f64 {
        (self.value * 1e5).round() / 1e5
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded_value();
        if rounded.is_finite() && rounded.fract() == 0.0 {
            write!(f, "{:.1} {}", rounded, self.unit.name)
        } else {
            write!(f, "{} {}", rounded, self.unit.name)
        }
    }
}
