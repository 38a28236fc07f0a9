//! The wrapped periodic scalar field.
//!
//! A [`PeriodicField`] on an `nx × ny` grid stores `(nx + 1) × (ny + 1)`
//! samples in row-major order (row index = x index). The last row and
//! column duplicate the first, and the corner duplicates `[0, 0]`:
//!
//! ```text
//! f[i, ny] == f[i, 0]     f[nx, j] == f[0, j]     f[nx, ny] == f[0, 0]
//! ```
//!
//! The wrap is always derived from the interior. Every constructor
//! re-applies it, and no method exposes mutable access to the samples,
//! so the invariant holds for every field in existence.

use std::ops::{Add, Mul, Neg, Sub};

use crate::error::{ConfigError, SgsError};
use crate::grid::GridSize;

/// An immutable real field on a doubly periodic grid.
#[derive(Clone, Debug, PartialEq)]
pub struct PeriodicField {
    size: GridSize,
    data: Vec<f64>,
}

impl PeriodicField {
    /// A field of zeros.
    pub fn zeros(size: GridSize) -> Self {
        Self::constant(size, 0.0)
    }

    /// A spatially constant field.
    pub fn constant(size: GridSize, value: f64) -> Self {
        Self {
            size,
            data: vec![value; size.wrapped_len()],
        }
    }

    /// Build a field by evaluating `f(i, j)` on the interior
    /// (`i < nx`, `j < ny`); the wrap is filled in afterwards.
    pub fn from_fn(size: GridSize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let stride = size.ny + 1;
        let mut data = vec![0.0; size.wrapped_len()];
        for i in 0..size.nx {
            for j in 0..size.ny {
                data[i * stride + j] = f(i, j);
            }
        }
        let mut field = Self { size, data };
        field.apply_wrap();
        field
    }

    /// Build a field from `nx * ny` interior samples in row-major order.
    pub fn from_interior(size: GridSize, interior: &[f64]) -> Result<Self, ConfigError> {
        if interior.len() != size.cell_count() {
            return Err(ConfigError::LengthMismatch {
                expected: size.cell_count(),
                got: interior.len(),
            });
        }
        Ok(Self::from_fn(size, |i, j| interior[i * size.ny + j]))
    }

    /// Build a field from a flattened `(nx + 1) × (ny + 1)` row-major matrix,
    /// the layout produced by the upstream DNS.
    ///
    /// The supplied wrap row and column are discarded and re-derived from
    /// the interior.
    pub fn from_wrapped(size: GridSize, data: Vec<f64>) -> Result<Self, ConfigError> {
        if data.len() != size.wrapped_len() {
            return Err(ConfigError::LengthMismatch {
                expected: size.wrapped_len(),
                got: data.len(),
            });
        }
        let mut field = Self { size, data };
        field.apply_wrap();
        Ok(field)
    }

    /// Interior grid size.
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// All stored samples, including the wrap, in row-major order.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume the field, returning the wrapped row-major samples.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Sample at `(i, j)` with `i <= nx`, `j <= ny`.
    ///
    /// # Panics
    ///
    /// Panics if the index is outside the wrapped array.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(
            i <= self.size.nx && j <= self.size.ny,
            "index ({i}, {j}) out of range for wrapped {} field",
            self.size
        );
        self.data[i * (self.size.ny + 1) + j]
    }

    /// Interior samples (`nx * ny`) in row-major order.
    pub fn interior(&self) -> impl Iterator<Item = f64> + '_ {
        let stride = self.size.ny + 1;
        let ny = self.size.ny;
        self.data
            .chunks_exact(stride)
            .take(self.size.nx)
            .flat_map(move |row| row[..ny].iter().copied())
    }

    /// Interior samples collected into a vector.
    pub fn interior_vec(&self) -> Vec<f64> {
        self.interior().collect()
    }

    /// Apply `f` to every sample.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            size: self.size,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two fields pointwise.
    ///
    /// # Panics
    ///
    /// Panics if the two fields live on different grids. Use
    /// [`check_same_size`](Self::check_same_size) first when the sizes
    /// come from outside the pipeline.
    pub fn zip_map(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        assert_eq!(
            self.size, other.size,
            "pointwise operation on mismatched grids"
        );
        Self {
            size: self.size,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    /// Return `Err(SizeMismatch)` unless `other` shares this field's grid.
    pub fn check_same_size(&self, other: &Self) -> Result<(), ConfigError> {
        if self.size != other.size {
            return Err(ConfigError::SizeMismatch {
                expected: self.size,
                got: other.size,
            });
        }
        Ok(())
    }

    /// Multiply every sample by `s`.
    pub fn scale(&self, s: f64) -> Self {
        self.map(|v| v * s)
    }

    /// Sum over the interior.
    pub fn sum(&self) -> f64 {
        self.interior().sum()
    }

    /// Mean over the interior.
    pub fn mean(&self) -> f64 {
        self.sum() / self.size.cell_count() as f64
    }

    /// Largest absolute value over the interior.
    pub fn max_abs(&self) -> f64 {
        self.interior().fold(0.0, |m, v| m.max(v.abs()))
    }

    /// Flat index of the first NaN or infinite sample, if any.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.data.iter().position(|v| !v.is_finite())
    }

    /// Pass the field through unchanged if every sample is finite,
    /// otherwise report [`SgsError::NumericalInstability`] for `stage`.
    pub fn ensure_finite(self, stage: &'static str) -> Result<Self, SgsError> {
        match self.first_non_finite() {
            Some(index) => Err(SgsError::NumericalInstability { stage, index }),
            None => Ok(self),
        }
    }

    /// True if the wrap row, column and corner exactly equal their sources.
    pub fn is_wrap_consistent(&self) -> bool {
        let (nx, ny) = (self.size.nx, self.size.ny);
        (0..=nx).all(|i| self.get(i, ny).to_bits() == self.get(i, 0).to_bits())
            && (0..=ny).all(|j| self.get(nx, j).to_bits() == self.get(0, j).to_bits())
    }

    fn apply_wrap(&mut self) {
        let (nx, ny) = (self.size.nx, self.size.ny);
        if self.size.is_empty() {
            return;
        }
        let stride = ny + 1;
        for i in 0..nx {
            self.data[i * stride + ny] = self.data[i * stride];
        }
        let (head, tail) = self.data.split_at_mut(nx * stride);
        tail.copy_from_slice(&head[..stride]);
    }
}

// ── Pointwise arithmetic ───────────────────────────────────────────

impl Add for &PeriodicField {
    type Output = PeriodicField;

    fn add(self, rhs: &PeriodicField) -> PeriodicField {
        self.zip_map(rhs, |a, b| a + b)
    }
}

impl Sub for &PeriodicField {
    type Output = PeriodicField;

    fn sub(self, rhs: &PeriodicField) -> PeriodicField {
        self.zip_map(rhs, |a, b| a - b)
    }
}

impl Mul for &PeriodicField {
    type Output = PeriodicField;

    fn mul(self, rhs: &PeriodicField) -> PeriodicField {
        self.zip_map(rhs, |a, b| a * b)
    }
}

impl Mul<f64> for &PeriodicField {
    type Output = PeriodicField;

    fn mul(self, rhs: f64) -> PeriodicField {
        self.scale(rhs)
    }
}

impl Neg for &PeriodicField {
    type Output = PeriodicField;

    fn neg(self) -> PeriodicField {
        self.map(|v| -v)
    }
}
