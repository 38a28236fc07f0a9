//! Run configuration and validation.
//!
//! [`RunParameters`] is the ordered scalar parameter list a run is
//! described by. [`into_config()`](RunParameters::into_config) parses
//! its selectors and produces an [`AnalysisConfig`], whose
//! [`validate()`](AnalysisConfig::validate) checks every grid and ratio
//! precondition before any transform runs.

use eddy_closure::{ClosureModel, ClosureSettings, CoefficientMode, DynamicSettings};
use eddy_core::{ConfigError, Domain, GridSize};
use eddy_spectral::{check_coarsening, FilterKind};

// ── AnalysisConfig ─────────────────────────────────────────────────

/// Everything an [`Analyzer`](crate::analyzer::Analyzer) needs.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisConfig {
    /// Resolution of the snapshots supplied by the source.
    pub fine: GridSize,
    /// Working (LES) resolution. Must be even and no larger than `fine`.
    pub coarse: GridSize,
    /// Physical box. Default: `[0, 2π)²`.
    pub domain: Domain,
    /// Closure family, coefficient mode and test-filter settings.
    pub closure: ClosureSettings,
    /// `|d_ij|` at or below this is flagged in the true viscosity.
    /// Default: 1e-12.
    pub strain_tolerance: f64,
    /// Snapshots are numbered `1..=snapshot_count`. Default: 1.
    pub snapshot_count: usize,
}

impl AnalysisConfig {
    /// Default settings for the given fine and coarse resolutions.
    pub fn new(fine: GridSize, coarse: GridSize) -> Self {
        Self {
            fine,
            coarse,
            domain: Domain::default(),
            closure: ClosureSettings::default(),
            strain_tolerance: 1e-12,
            snapshot_count: 1,
        }
    }

    /// Check structural invariants.
    ///
    /// Verifies:
    /// - the domain lengths are finite and positive,
    /// - both grids are non-empty and even, with `coarse` within `fine`,
    /// - the test ratio and tolerances are valid,
    /// - the test grid keeps at least two samples per axis when needed,
    /// - the strain tolerance is finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.domain.validate()?;
        check_coarsening(self.fine, self.coarse)?;
        self.closure.validate()?;
        self.test_grid()?;
        if !self.strain_tolerance.is_finite() || self.strain_tolerance < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "strain_tolerance",
                reason: format!(
                    "must be finite and non-negative, got {}",
                    self.strain_tolerance
                ),
            });
        }
        Ok(())
    }

    /// The test-filter resolution, if this configuration uses one.
    pub fn test_grid(&self) -> Result<Option<GridSize>, ConfigError> {
        if self.closure.needs_test_scale() {
            self.closure.dynamic.test_grid(self.coarse).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Every resolution the spectral cache will be asked for.
    pub fn resolutions(&self) -> Result<Vec<GridSize>, ConfigError> {
        let mut sizes = vec![self.fine, self.coarse];
        if let Some(test) = self.test_grid()? {
            sizes.push(test);
        }
        sizes.dedup();
        Ok(sizes)
    }

    /// Snapshot indices processed by a run.
    pub fn snapshot_indices(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.snapshot_count
    }
}

// ── RunParameters ──────────────────────────────────────────────────

/// The ordered run parameters.
///
/// Field order follows the parameter list: resolution, total steps,
/// Reynolds number, time step, snapshot count, solver selector, closure
/// selector, coefficient-mode selector, filter selector, coarse
/// resolution, test ratio, and finally the Horiuti variant.
#[derive(Clone, Debug, PartialEq)]
pub struct RunParameters {
    /// Fine (DNS) resolution per axis.
    pub resolution: usize,
    /// Total time steps of the producing run.
    pub total_steps: u64,
    /// Reynolds number of the producing run.
    pub reynolds: f64,
    /// Time step of the producing run.
    pub dt: f64,
    /// Number of stored snapshots.
    pub snapshot_count: usize,
    /// Solver used by the producing run. Recorded, not interpreted.
    pub solver: i64,
    /// Closure selector, `1..=5`.
    pub closure: i64,
    /// `1` = dynamic, `2` = static.
    pub coefficient_mode: i64,
    /// Filter selector, `1..=4`.
    pub filter: i64,
    /// Coarse (LES) resolution per axis.
    pub coarse_resolution: usize,
    /// Test-filter ratio α.
    pub test_ratio: f64,
    /// Horiuti variant selector, `1..=3`. Default: 3.
    pub horiuti_variant: i64,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            resolution: 1024,
            total_steps: 4000,
            reynolds: 8000.0,
            dt: 1e-3,
            snapshot_count: 400,
            solver: 3,
            closure: 1,
            coefficient_mode: 1,
            filter: 1,
            coarse_resolution: 64,
            test_ratio: 2.0,
            horiuti_variant: 3,
        }
    }
}

/// Number of scalars in the ordered list, excluding the optional variant.
pub const ORDERED_LEN: usize = 11;

impl RunParameters {
    /// Parse the ordered scalar list.
    ///
    /// Accepts 11 values, or 12 with the Horiuti variant appended.
    /// Integer-valued entries must be whole and non-negative.
    pub fn from_ordered(values: &[f64]) -> Result<Self, ConfigError> {
        if values.len() != ORDERED_LEN && values.len() != ORDERED_LEN + 1 {
            return Err(ConfigError::LengthMismatch {
                expected: ORDERED_LEN,
                got: values.len(),
            });
        }
        let whole = |name: &'static str, v: f64| -> Result<u64, ConfigError> {
            if v.is_finite() && v >= 0.0 && v.fract() == 0.0 {
                Ok(v as u64)
            } else {
                Err(ConfigError::InvalidParameter {
                    name,
                    reason: format!("expected a non-negative integer, got {v}"),
                })
            }
        };
        let horiuti_variant = match values.get(ORDERED_LEN) {
            Some(&v) => whole("horiuti_variant", v)? as i64,
            None => 3,
        };
        Ok(Self {
            resolution: whole("resolution", values[0])? as usize,
            total_steps: whole("total_steps", values[1])?,
            reynolds: values[2],
            dt: values[3],
            snapshot_count: whole("snapshot_count", values[4])? as usize,
            solver: whole("solver", values[5])? as i64,
            closure: whole("closure", values[6])? as i64,
            coefficient_mode: whole("coefficient_mode", values[7])? as i64,
            filter: whole("filter", values[8])? as i64,
            coarse_resolution: whole("coarse_resolution", values[9])? as usize,
            test_ratio: values[10],
            horiuti_variant,
        })
    }

    /// Steps between consecutive snapshots, `total_steps / snapshot_count`.
    pub fn snapshot_interval(&self) -> u64 {
        match self.snapshot_count {
            0 => 0,
            n => self.total_steps / n as u64,
        }
    }

    /// Parse selectors and build a validated [`AnalysisConfig`] on the
    /// default `[0, 2π)²` box.
    pub fn into_config(self) -> Result<AnalysisConfig, ConfigError> {
        for (name, value) in [("reynolds", self.reynolds), ("dt", self.dt)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: format!("must be finite and positive, got {value}"),
                });
            }
        }
        if self.snapshot_count == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "snapshot_count",
                reason: "at least one snapshot is required".into(),
            });
        }
        let config = AnalysisConfig {
            fine: GridSize::square(self.resolution),
            coarse: GridSize::square(self.coarse_resolution),
            domain: Domain::default(),
            closure: ClosureSettings {
                model: ClosureModel::from_selectors(self.closure, self.horiuti_variant)?,
                mode: CoefficientMode::from_selector(self.coefficient_mode)?,
                dynamic: DynamicSettings {
                    test_ratio: self.test_ratio,
                    filter: FilterKind::from_selector(self.filter)?,
                    ..Default::default()
                },
            },
            strain_tolerance: 1e-12,
            snapshot_count: self.snapshot_count,
        };
        config.validate()?;
        Ok(config)
    }
}
