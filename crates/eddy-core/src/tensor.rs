//! Symmetric rank-2 tensor fields in two dimensions.

use std::ops::{Add, Sub};

use crate::error::ConfigError;
use crate::field::PeriodicField;
use crate::grid::GridSize;

/// A symmetric 2×2 tensor stored as its three independent components.
///
/// Used for strain rates, Germano residuals and stresses. `t21` is
/// implicitly equal to `t12`.
#[derive(Clone, Debug, PartialEq)]
pub struct SymmetricTensor {
    /// The `11` component.
    pub t11: PeriodicField,
    /// The `12` (= `21`) component.
    pub t12: PeriodicField,
    /// The `22` component.
    pub t22: PeriodicField,
}

impl SymmetricTensor {
    /// Assemble a tensor from three components on the same grid.
    pub fn new(
        t11: PeriodicField,
        t12: PeriodicField,
        t22: PeriodicField,
    ) -> Result<Self, ConfigError> {
        t11.check_same_size(&t12)?;
        t11.check_same_size(&t22)?;
        Ok(Self { t11, t12, t22 })
    }

    /// The zero tensor.
    pub fn zeros(size: GridSize) -> Self {
        Self {
            t11: PeriodicField::zeros(size),
            t12: PeriodicField::zeros(size),
            t22: PeriodicField::zeros(size),
        }
    }

    /// Grid shared by all three components.
    pub fn size(&self) -> GridSize {
        self.t11.size()
    }

    /// The components in `[t11, t12, t22]` order.
    pub fn components(&self) -> [&PeriodicField; 3] {
        [&self.t11, &self.t12, &self.t22]
    }

    /// Pointwise trace `t11 + t22`.
    pub fn trace(&self) -> PeriodicField {
        &self.t11 + &self.t22
    }

    /// The trace-free part: `t11 - tr/2`, `t12`, `t22 - tr/2`.
    pub fn deviatoric(&self) -> Self {
        let half_trace = self.trace().scale(0.5);
        Self {
            t11: &self.t11 - &half_trace,
            t12: self.t12.clone(),
            t22: &self.t22 - &half_trace,
        }
    }

    /// Pointwise double contraction `A:B = a11 b11 + 2 a12 b12 + a22 b22`.
    pub fn contract(&self, other: &Self) -> PeriodicField {
        let diag = &(&self.t11 * &other.t11) + &(&self.t22 * &other.t22);
        let off = (&self.t12 * &other.t12).scale(2.0);
        &diag + &off
    }

    /// Apply the same field operation to every component.
    pub fn map_components(&self, mut f: impl FnMut(&PeriodicField) -> PeriodicField) -> Self {
        Self {
            t11: f(&self.t11),
            t12: f(&self.t12),
            t22: f(&self.t22),
        }
    }

    /// Fallible variant of [`map_components`](Self::map_components).
    pub fn try_map_components<E>(
        &self,
        mut f: impl FnMut(&PeriodicField) -> Result<PeriodicField, E>,
    ) -> Result<Self, E> {
        Ok(Self {
            t11: f(&self.t11)?,
            t12: f(&self.t12)?,
            t22: f(&self.t22)?,
        })
    }

    /// Multiply every component pointwise by a scalar field.
    pub fn weighted(&self, weight: &PeriodicField) -> Self {
        self.map_components(|c| c * weight)
    }

    /// Multiply every component by a constant.
    pub fn scale(&self, s: f64) -> Self {
        self.map_components(|c| c.scale(s))
    }
}

impl Add for &SymmetricTensor {
    type Output = SymmetricTensor;

    fn add(self, rhs: &SymmetricTensor) -> SymmetricTensor {
        SymmetricTensor {
            t11: &self.t11 + &rhs.t11,
            t12: &self.t12 + &rhs.t12,
            t22: &self.t22 + &rhs.t22,
        }
    }
}

impl Sub for &SymmetricTensor {
    type Output = SymmetricTensor;

    fn sub(self, rhs: &SymmetricTensor) -> SymmetricTensor {
        SymmetricTensor {
            t11: &self.t11 - &rhs.t11,
            t12: &self.t12 - &rhs.t12,
            t22: &self.t22 - &rhs.t22,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(size: GridSize) -> SymmetricTensor {
        SymmetricTensor::new(
            PeriodicField::from_fn(size, |i, j| (i + 2 * j) as f64),
            PeriodicField::from_fn(size, |i, _| i as f64 * 0.5),
            PeriodicField::from_fn(size, |_, j| -(j as f64) + 3.0),
        )
        .unwrap()
    }

    #[test]
    fn deviatoric_is_trace_free() {
        let t = sample(GridSize::square(6)).deviatoric();
        assert!(t.trace().max_abs() < 1e-12);
    }

    #[test]
    fn deviatoric_keeps_off_diagonal() {
        let t = sample(GridSize::square(4));
        assert_eq!(t.deviatoric().t12, t.t12);
    }

    #[test]
    fn contraction_counts_off_diagonal_twice() {
        let size = GridSize::square(2);
        let one = PeriodicField::constant(size, 1.0);
        let t = SymmetricTensor::new(one.clone(), one.clone(), one).unwrap();
        let c = t.contract(&t);
        assert!(c.interior().all(|v| (v - 4.0).abs() < 1e-15));
    }

    #[test]
    fn new_rejects_mixed_grids() {
        let err = SymmetricTensor::new(
            PeriodicField::zeros(GridSize::square(4)),
            PeriodicField::zeros(GridSize::square(4)),
            PeriodicField::zeros(GridSize::square(8)),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::SizeMismatch { .. }));
    }
}
