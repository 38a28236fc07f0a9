//! Discrete wavenumbers in standard FFT ordering.

use eddy_core::{Domain, GridSize};

/// Signed FFT index of bin `i` out of `n`: `0, 1, …, ⌈n/2⌉-1, -⌊n/2⌋, …, -1`.
///
/// Matches numpy's `fftfreq(n) * n`, including odd `n` (test grids
/// derived from a non-integer ratio can be odd).
pub fn signed_index(i: usize, n: usize) -> i64 {
    if i <= (n - 1) / 2 {
        i as i64
    } else {
        i as i64 - n as i64
    }
}

/// The `kx`, `ky` tables for one resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct WavenumberGrid {
    size: GridSize,
    kx: Vec<f64>,
    ky: Vec<f64>,
}

impl WavenumberGrid {
    /// Build the tables for `size`, scaled by `2π/L` per axis.
    pub fn new(size: GridSize, domain: &Domain) -> Self {
        let (sx, sy) = domain.wavenumber_scale();
        Self {
            size,
            kx: (0..size.nx)
                .map(|i| signed_index(i, size.nx) as f64 * sx)
                .collect(),
            ky: (0..size.ny)
                .map(|j| signed_index(j, size.ny) as f64 * sy)
                .collect(),
        }
    }

    /// The resolution these tables belong to.
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Wavenumbers along x, indexed by spectral row.
    pub fn kx(&self) -> &[f64] {
        &self.kx
    }

    /// Wavenumbers along y, indexed by spectral column.
    pub fn ky(&self) -> &[f64] {
        &self.ky
    }

    /// `|k|² = kx[i]² + ky[j]²`.
    pub fn k_squared(&self, i: usize, j: usize) -> f64 {
        self.kx[i] * self.kx[i] + self.ky[j] * self.ky[j]
    }
}
