//! Grid resolutions and the physical extent of the periodic box.

use std::f64::consts::PI;
use std::fmt;

use crate::error::ConfigError;

// ── GridSize ───────────────────────────────────────────────────────

/// Interior sample counts of a doubly periodic grid.
///
/// A field on a grid of size `nx × ny` is stored with one extra wrap
/// row and column, i.e. `(nx + 1) × (ny + 1)` samples. `GridSize`
/// always refers to the interior counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridSize {
    /// Samples along x (rows of the stored array).
    pub nx: usize,
    /// Samples along y (columns of the stored array).
    pub ny: usize,
}

impl GridSize {
    /// Create a grid size with `nx × ny` interior samples.
    pub const fn new(nx: usize, ny: usize) -> Self {
        Self { nx, ny }
    }

    /// Create a square `n × n` grid size.
    pub const fn square(n: usize) -> Self {
        Self { nx: n, ny: n }
    }

    /// Number of interior samples, `nx * ny`.
    pub fn cell_count(&self) -> usize {
        self.nx * self.ny
    }

    /// Number of stored samples including the wrap row and column.
    pub fn wrapped_len(&self) -> usize {
        (self.nx + 1) * (self.ny + 1)
    }

    /// True if either axis has zero samples.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }

    /// True if both axes have an even sample count.
    pub fn is_even(&self) -> bool {
        self.nx % 2 == 0 && self.ny % 2 == 0
    }

    /// True if `self` is no larger than `other` on either axis.
    pub fn fits_within(&self, other: GridSize) -> bool {
        self.nx <= other.nx && self.ny <= other.ny
    }

    /// The grid obtained by dividing each axis by `ratio` and rounding down.
    ///
    /// This is how the test-filter resolution is derived from the working
    /// coarse grid. The caller is responsible for validating `ratio`.
    pub fn scaled_down(&self, ratio: f64) -> GridSize {
        GridSize {
            nx: (self.nx as f64 / ratio).floor() as usize,
            ny: (self.ny as f64 / ratio).floor() as usize,
        }
    }

    /// Reject grids with an empty axis.
    pub fn check_non_empty(&self) -> Result<(), ConfigError> {
        if self.is_empty() {
            return Err(ConfigError::EmptyGrid { size: *self });
        }
        Ok(())
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.nx, self.ny)
    }
}

// ── Domain ─────────────────────────────────────────────────────────

/// Physical side lengths of the periodic box.
///
/// Defaults to `[0, 2π) × [0, 2π)`, for which the discrete wavenumbers
/// are integers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Domain {
    /// Length along x.
    pub lx: f64,
    /// Length along y.
    pub ly: f64,
}

impl Default for Domain {
    fn default() -> Self {
        Self {
            lx: 2.0 * PI,
            ly: 2.0 * PI,
        }
    }
}

impl Domain {
    /// Grid spacing `(dx, dy)` for the given resolution.
    pub fn spacing(&self, size: GridSize) -> (f64, f64) {
        (self.lx / size.nx as f64, self.ly / size.ny as f64)
    }

    /// Characteristic filter width `δ = sqrt(dx · dy)` at the given resolution.
    pub fn filter_width(&self, size: GridSize) -> f64 {
        let (dx, dy) = self.spacing(size);
        (dx * dy).sqrt()
    }

    /// Factors converting FFT index wavenumbers into physical wavenumbers.
    pub fn wavenumber_scale(&self) -> (f64, f64) {
        (2.0 * PI / self.lx, 2.0 * PI / self.ly)
    }

    /// Both lengths must be finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.lx.is_finite() || self.lx <= 0.0 || !self.ly.is_finite() || self.ly <= 0.0 {
            return Err(ConfigError::InvalidDomain {
                lx: self.lx,
                ly: self.ly,
            });
        }
        Ok(())
    }
}
