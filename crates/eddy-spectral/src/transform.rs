//! 2D discrete Fourier transforms over periodic fields.
//!
//! The forward transform is unnormalized and the inverse divides by
//! `nx · ny`, so `inverse(forward(f)) == f` up to rounding. The wrap
//! row and column are stripped before the forward pass and re-derived
//! after the inverse.
//!
//! Plans are built once per resolution and memoized in a
//! [`SpectralCache`]. The cache is safe to share between threads; after
//! [`precompute`](SpectralCache::precompute) every lookup is a read.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use indexmap::IndexMap;
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use eddy_core::{ConfigError, Domain, GridSize, PeriodicField, SgsError};

use crate::wavenumber::WavenumberGrid;

// ── Spectrum ───────────────────────────────────────────────────────

/// Complex Fourier coefficients on an `nx × ny` grid, row-major.
///
/// Row `i` holds x-wavenumber `kx[i]`, column `j` holds `ky[j]` of the
/// matching [`WavenumberGrid`].
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrum {
    size: GridSize,
    data: Vec<Complex64>,
}

impl Spectrum {
    /// All-zero spectrum.
    pub fn zeros(size: GridSize) -> Self {
        Self {
            size,
            data: vec![Complex64::new(0.0, 0.0); size.cell_count()],
        }
    }

    /// Resolution of the spectrum.
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Coefficient at spectral row `i`, column `j`.
    pub fn get(&self, i: usize, j: usize) -> Complex64 {
        self.data[i * self.size.ny + j]
    }

    /// Overwrite the coefficient at `(i, j)`.
    pub fn set(&mut self, i: usize, j: usize, value: Complex64) {
        self.data[i * self.size.ny + j] = value;
    }

    /// Coefficients in row-major order.
    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    /// Multiply every coefficient by `f(i, j)`.
    pub fn scale_by(&mut self, mut f: impl FnMut(usize, usize) -> f64) {
        let ny = self.size.ny;
        for (idx, c) in self.data.iter_mut().enumerate() {
            *c *= f(idx / ny, idx % ny);
        }
    }

    /// Multiply every coefficient by the complex factor `f(i, j)`.
    pub fn multiply_by(&mut self, mut f: impl FnMut(usize, usize) -> Complex64) {
        let ny = self.size.ny;
        for (idx, c) in self.data.iter_mut().enumerate() {
            *c *= f(idx / ny, idx % ny);
        }
    }
}

// ── SpectralPlan ───────────────────────────────────────────────────

/// FFT plans and wavenumbers for one resolution.
pub struct SpectralPlan {
    size: GridSize,
    rows_forward: Arc<dyn Fft<f64>>,
    rows_inverse: Arc<dyn Fft<f64>>,
    cols_forward: Arc<dyn Fft<f64>>,
    cols_inverse: Arc<dyn Fft<f64>>,
    wavenumbers: WavenumberGrid,
}

impl std::fmt::Debug for SpectralPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralPlan")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl SpectralPlan {
    fn build(planner: &mut FftPlanner<f64>, size: GridSize, domain: &Domain) -> Self {
        Self {
            size,
            rows_forward: planner.plan_fft_forward(size.ny),
            rows_inverse: planner.plan_fft_inverse(size.ny),
            cols_forward: planner.plan_fft_forward(size.nx),
            cols_inverse: planner.plan_fft_inverse(size.nx),
            wavenumbers: WavenumberGrid::new(size, domain),
        }
    }

    /// Resolution this plan transforms.
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Wavenumber tables for this resolution.
    pub fn wavenumbers(&self) -> &WavenumberGrid {
        &self.wavenumbers
    }

    /// Unnormalized forward transform of the field's interior.
    pub fn forward(&self, field: &PeriodicField) -> Result<Spectrum, ConfigError> {
        self.check_size(field.size())?;
        let mut data: Vec<Complex64> = field
            .interior()
            .map(|v| Complex64::new(v, 0.0))
            .collect();
        self.process(&mut data, &self.rows_forward, &self.cols_forward);
        Ok(Spectrum {
            size: self.size,
            data,
        })
    }

    /// Inverse transform normalized by `1 / (nx · ny)`; the imaginary
    /// residue is discarded and the wrap re-applied.
    pub fn inverse(&self, spectrum: &Spectrum) -> Result<PeriodicField, ConfigError> {
        self.check_size(spectrum.size())?;
        let mut data = spectrum.data.clone();
        self.process(&mut data, &self.rows_inverse, &self.cols_inverse);
        let norm = 1.0 / self.size.cell_count() as f64;
        let real: Vec<f64> = data.iter().map(|c| c.re * norm).collect();
        PeriodicField::from_interior(self.size, &real)
    }

    // Row pass along y, then a column pass along x through a transpose.
    fn process(
        &self,
        data: &mut Vec<Complex64>,
        rows: &Arc<dyn Fft<f64>>,
        cols: &Arc<dyn Fft<f64>>,
    ) {
        let GridSize { nx, ny } = self.size;
        rows.process(data);
        let mut transposed = transpose(data, nx, ny);
        cols.process(&mut transposed);
        *data = transpose(&transposed, ny, nx);
    }

    fn check_size(&self, got: GridSize) -> Result<(), ConfigError> {
        if got != self.size {
            return Err(ConfigError::SizeMismatch {
                expected: self.size,
                got,
            });
        }
        Ok(())
    }
}

fn transpose(src: &[Complex64], rows: usize, cols: usize) -> Vec<Complex64> {
    let mut out = vec![Complex64::new(0.0, 0.0); src.len()];
    for r in 0..rows {
        for c in 0..cols {
            out[c * rows + r] = src[r * cols + c];
        }
    }
    out
}

// ── SpectralCache ──────────────────────────────────────────────────

/// Memoized [`SpectralPlan`]s keyed by resolution, for one domain.
///
/// Lookups take a read lock; a missing plan is built under the planner
/// mutex and inserted under a short write lock. Entries are never
/// removed, so an `Arc<SpectralPlan>` handed out stays valid.
pub struct SpectralCache {
    domain: Domain,
    planner: Mutex<FftPlanner<f64>>,
    plans: RwLock<IndexMap<GridSize, Arc<SpectralPlan>>>,
}

impl std::fmt::Debug for SpectralCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralCache")
            .field("domain", &self.domain)
            .field("sizes", &self.cached_sizes())
            .finish()
    }
}

// Compile-time assertion: SpectralCache must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<SpectralCache>();
};

impl SpectralCache {
    /// Create an empty cache for `domain`.
    pub fn new(domain: Domain) -> Result<Self, ConfigError> {
        domain.validate()?;
        Ok(Self {
            domain,
            planner: Mutex::new(FftPlanner::new()),
            plans: RwLock::new(IndexMap::new()),
        })
    }

    /// The periodic box these plans were built for.
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Fetch (building on first use) the plan for `size`.
    pub fn plan(&self, size: GridSize) -> Result<Arc<SpectralPlan>, ConfigError> {
        size.check_non_empty()?;
        if let Some(plan) = self
            .plans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&size)
        {
            return Ok(Arc::clone(plan));
        }

        let plan = {
            let mut planner = self.planner.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::new(SpectralPlan::build(&mut planner, size, &self.domain))
        };
        let mut plans = self.plans.write().unwrap_or_else(PoisonError::into_inner);
        let entry = plans.entry(size).or_insert_with(|| {
            log::debug!("built spectral plan for {size}");
            plan
        });
        Ok(Arc::clone(entry))
    }

    /// Build plans for every listed resolution up front.
    pub fn precompute(&self, sizes: &[GridSize]) -> Result<(), ConfigError> {
        for &size in sizes {
            self.plan(size)?;
        }
        Ok(())
    }

    /// Resolutions currently cached, in insertion order.
    pub fn cached_sizes(&self) -> Vec<GridSize> {
        self.plans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    /// Forward transform at the field's own resolution.
    pub fn forward(&self, field: &PeriodicField) -> Result<Spectrum, SgsError> {
        Ok(self.plan(field.size())?.forward(field)?)
    }

    /// Inverse transform at the spectrum's resolution, rejecting
    /// non-finite output.
    pub fn inverse(
        &self,
        spectrum: &Spectrum,
        stage: &'static str,
    ) -> Result<PeriodicField, SgsError> {
        self.plan(spectrum.size())?
            .inverse(spectrum)?
            .ensure_finite(stage)
    }
}
