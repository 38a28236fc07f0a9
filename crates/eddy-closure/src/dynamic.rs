//! The Germano–Lilly dynamic procedure.
//!
//! Given the working coarse velocity `(u, v)`, the test filter at ratio
//! `α` yields the resolved residual
//!
//! ```text
//! L_ij = dev( filt(u_i u_j) − filt(u_i) filt(u_j) )
//! ```
//!
//! and, for each basis with power `p`,
//!
//! ```text
//! M_ij = 2 δ^p ( filt(B_ij[coarse]) − α^p B_ij[test] )
//! ```
//!
//! A single-basis family takes the domain least-squares estimate
//! `C = Σ L:M / Σ M:M`. The hybrid family solves the 3×3 system
//! `Σ_f M^f_ij C_f = L_ij` (rows 11, 12, 22) at every point.

use smallvec::SmallVec;

use eddy_core::{ConfigError, GridSize, PeriodicField, SgsError, SymmetricTensor};
use eddy_spectral::{FilterKind, SpectralCache};

use crate::kinematics::Kinematics;
use crate::model::{Basis, ClosureModel, CoefficientMode, ModelCoefficient};

// ── DynamicSettings ────────────────────────────────────────────────

/// Parameters of the dynamic procedure.
#[derive(Clone, Debug, PartialEq)]
pub struct DynamicSettings {
    /// Test-filter ratio `α > 1`. Default: 2.
    pub test_ratio: f64,
    /// Kernel used for test filtering. Default: sharp.
    pub filter: FilterKind,
    /// Replace `L:M` by `½(L:M + |L:M|)` in the numerator, discarding
    /// backscatter. Default: off.
    pub clip_backscatter: bool,
    /// Single-basis solves fail if `mean(M:M)` is at or below this
    /// fraction of `mean(u² + v²)²`. Both scale as the fourth power of
    /// the velocity amplitude. Default: 1e-20.
    pub degeneracy_tolerance: f64,
    /// The hybrid solve fails at any point where `|det M|` is at or
    /// below this fraction of the product of the row norms.
    /// Default: 1e-10.
    pub conditioning_tolerance: f64,
}

impl Default for DynamicSettings {
    fn default() -> Self {
        Self {
            test_ratio: 2.0,
            filter: FilterKind::Sharp,
            clip_backscatter: false,
            degeneracy_tolerance: 1e-20,
            conditioning_tolerance: 1e-10,
        }
    }
}

impl DynamicSettings {
    /// Check ratios and tolerances.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.test_ratio.is_finite() || self.test_ratio <= 1.0 {
            return Err(ConfigError::InvalidTestRatio {
                value: self.test_ratio,
            });
        }
        for (name, value) in [
            ("degeneracy_tolerance", self.degeneracy_tolerance),
            ("conditioning_tolerance", self.conditioning_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: format!("must be finite and non-negative, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Test-filter resolution `floor(coarse / α)` per axis.
    pub fn test_grid(&self, coarse: GridSize) -> Result<GridSize, ConfigError> {
        self.validate()?;
        let test = coarse.scaled_down(self.test_ratio);
        if test.nx < 2 || test.ny < 2 {
            return Err(ConfigError::TestGridTooSmall {
                coarse,
                ratio: self.test_ratio,
            });
        }
        Ok(test)
    }
}

// ── TestScale ──────────────────────────────────────────────────────

/// Test-filtered quantities shared by every basis of one snapshot.
#[derive(Clone, Debug)]
pub struct TestScale {
    /// The test-filter cutoff resolution.
    pub size: GridSize,
    /// Deviatoric resolved residual `L`.
    pub leonard: SymmetricTensor,
    /// Kinematics of the test-filtered velocity.
    pub kinematics: Kinematics,
    /// `mean(u² + v²)` of the working-grid velocity.
    pub velocity_scale: f64,
}

impl TestScale {
    /// Test-filter `(u, v)` and their products on the working grid.
    pub fn compute(
        cache: &SpectralCache,
        settings: &DynamicSettings,
        u: &PeriodicField,
        v: &PeriodicField,
    ) -> Result<Self, SgsError> {
        u.check_same_size(v)?;
        let size = settings.test_grid(u.size())?;
        let filt = |f: &PeriodicField| settings.filter.apply(cache, f, size);

        let ut = filt(u)?;
        let vt = filt(v)?;
        let residual = SymmetricTensor {
            t11: &filt(&(u * u))? - &(&ut * &ut),
            t12: &filt(&(u * v))? - &(&ut * &vt),
            t22: &filt(&(v * v))? - &(&vt * &vt),
        };
        let kinematics = Kinematics::compute(cache, &ut, &vt)?;
        Ok(Self {
            size,
            leonard: residual.deviatoric(),
            kinematics,
            velocity_scale: (&(u * u) + &(v * v)).mean(),
        })
    }

    /// The Germano basis tensor `M` for `basis` with filter width `delta`.
    pub fn model_basis(
        &self,
        cache: &SpectralCache,
        settings: &DynamicSettings,
        basis: Basis,
        coarse: &Kinematics,
        delta: f64,
    ) -> Result<SymmetricTensor, SgsError> {
        let p = basis.length_power();
        let filtered = basis
            .tensor(coarse)
            .try_map_components(|c| settings.filter.apply(cache, c, self.size))?;
        let test = basis.tensor(&self.kinematics);
        let diff = &filtered - &test.scale(settings.test_ratio.powi(p));
        Ok(diff.scale(2.0 * delta.powi(p)))
    }
}

// ── Solution ───────────────────────────────────────────────────────

/// Pointwise Germano fields kept for diagnostics.
#[derive(Clone, Debug)]
pub struct GermanoDiagnostics {
    /// Deviatoric resolved residual `L`.
    pub leonard: SymmetricTensor,
    /// `L:M^f`, one field per basis.
    pub lm: SmallVec<[PeriodicField; 3]>,
    /// `M^f:M^f`, one field per basis.
    pub mm: SmallVec<[PeriodicField; 3]>,
}

/// Coefficients for one snapshot, in [`ClosureModel::bases`] order.
#[derive(Clone, Debug)]
pub struct CoefficientSolution {
    /// One coefficient per basis.
    pub coefficients: SmallVec<[ModelCoefficient; 3]>,
    /// Present in dynamic mode.
    pub diagnostics: Option<GermanoDiagnostics>,
}

/// Obtain closure coefficients for `model`.
///
/// `test` is required in dynamic mode and ignored in static mode.
/// Bardina always yields an empty solution.
pub fn solve(
    cache: &SpectralCache,
    model: ClosureModel,
    mode: CoefficientMode,
    settings: &DynamicSettings,
    coarse: &Kinematics,
    test: Option<&TestScale>,
    delta: f64,
) -> Result<CoefficientSolution, SgsError> {
    let bases = model.bases();
    let test = match (mode, test) {
        _ if bases.is_empty() => {
            return Ok(CoefficientSolution {
                coefficients: SmallVec::new(),
                diagnostics: None,
            })
        }
        (CoefficientMode::Static, _) => {
            return Ok(CoefficientSolution {
                coefficients: model
                    .static_coefficients()
                    .into_iter()
                    .map(ModelCoefficient::Uniform)
                    .collect(),
                diagnostics: None,
            })
        }
        (CoefficientMode::Dynamic, Some(test)) => test,
        (CoefficientMode::Dynamic, None) => {
            return Err(ConfigError::InvalidParameter {
                name: "test_scale",
                reason: "dynamic mode needs test-filtered quantities".into(),
            }
            .into())
        }
    };

    let m: SmallVec<[SymmetricTensor; 3]> = bases
        .iter()
        .map(|&b| test.model_basis(cache, settings, b, coarse, delta))
        .collect::<Result<_, _>>()?;
    let l = &test.leonard;
    let diagnostics = GermanoDiagnostics {
        leonard: l.clone(),
        lm: m.iter().map(|mf| l.contract(mf)).collect(),
        mm: m.iter().map(|mf| mf.contract(mf)).collect(),
    };

    let coefficients = if m.len() == 1 {
        smallvec::smallvec![ModelCoefficient::Uniform(least_squares(
            &diagnostics.lm[0],
            &diagnostics.mm[0],
            test.velocity_scale * test.velocity_scale,
            settings,
        )?)]
    } else {
        joint_solve(l, &m, settings)?
            .into_iter()
            .map(ModelCoefficient::Field)
            .collect()
    };

    Ok(CoefficientSolution {
        coefficients,
        diagnostics: Some(diagnostics),
    })
}

fn least_squares(
    lm: &PeriodicField,
    mm: &PeriodicField,
    reference: f64,
    settings: &DynamicSettings,
) -> Result<f64, SgsError> {
    let denom = mm.mean();
    if !(denom > settings.degeneracy_tolerance * reference) {
        return Err(SgsError::ArithmeticDegeneracy {
            quantity: "mean(M:M)",
            value: denom,
            point: None,
        });
    }
    let numer = if settings.clip_backscatter {
        lm.interior().map(|v| 0.5 * (v + v.abs())).sum::<f64>() / lm.size().cell_count() as f64
    } else {
        lm.mean()
    };
    let c = numer / denom;
    if !c.is_finite() {
        return Err(SgsError::ArithmeticDegeneracy {
            quantity: "coefficient",
            value: c,
            point: None,
        });
    }
    Ok(c)
}

fn det3(a: [[f64; 3]; 3]) -> f64 {
    a[0][0] * (a[1][1] * a[2][2] - a[1][2] * a[2][1])
        - a[0][1] * (a[1][0] * a[2][2] - a[1][2] * a[2][0])
        + a[0][2] * (a[1][0] * a[2][1] - a[1][1] * a[2][0])
}

fn norm3(r: [f64; 3]) -> f64 {
    (r[0] * r[0] + r[1] * r[1] + r[2] * r[2]).sqrt()
}

/// Cramer's rule at every point; rows are tensor components, columns bases.
fn joint_solve(
    l: &SymmetricTensor,
    m: &[SymmetricTensor],
    settings: &DynamicSettings,
) -> Result<Vec<PeriodicField>, SgsError> {
    debug_assert_eq!(m.len(), 3);
    let size = l.size();
    let mut out = vec![Vec::with_capacity(size.cell_count()); 3];

    for i in 0..size.nx {
        for j in 0..size.ny {
            let mut a = [[0.0; 3]; 3];
            for (col, mf) in m.iter().enumerate() {
                for (row, comp) in mf.components().into_iter().enumerate() {
                    a[row][col] = comp.get(i, j);
                }
            }
            let b = [l.t11.get(i, j), l.t12.get(i, j), l.t22.get(i, j)];

            let det = det3(a);
            let bound = norm3(a[0]) * norm3(a[1]) * norm3(a[2]);
            if !det.is_finite() || det.abs() <= settings.conditioning_tolerance * bound {
                return Err(SgsError::ArithmeticDegeneracy {
                    quantity: "det(M)",
                    value: det,
                    point: Some(i * size.ny + j),
                });
            }
            for (col, coeffs) in out.iter_mut().enumerate() {
                let mut ac = a;
                for (row, &rhs) in ac.iter_mut().zip(&b) {
                    row[col] = rhs;
                }
                coeffs.push(det3(ac) / det);
            }
        }
    }

    out.into_iter()
        .map(|c| {
            PeriodicField::from_interior(size, &c)
                .map_err(SgsError::from)
                .and_then(|f| f.ensure_finite("hybrid solve"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::HoriutiVariant;
    use eddy_core::Domain;
    use eddy_test_utils::band_limited;

    fn cache() -> SpectralCache {
        SpectralCache::new(Domain::default()).unwrap()
    }

    fn velocity(size: GridSize, seed: u64) -> (PeriodicField, PeriodicField) {
        let c = cache();
        let psi = band_limited(size, size.nx / 3, seed);
        let (px, py) = eddy_spectral::gradient(&c, &psi).unwrap();
        (py, -&px)
    }

    #[test]
    fn test_grid_floors_and_validates() {
        let s = DynamicSettings::default();
        assert_eq!(s.test_grid(GridSize::square(64)), Ok(GridSize::square(32)));
        let s = DynamicSettings {
            test_ratio: 1.6,
            ..Default::default()
        };
        assert_eq!(s.test_grid(GridSize::square(30)), Ok(GridSize::square(18)));
        let s = DynamicSettings {
            test_ratio: 1.0,
            ..Default::default()
        };
        assert_eq!(
            s.test_grid(GridSize::square(32)),
            Err(ConfigError::InvalidTestRatio { value: 1.0 })
        );
        let s = DynamicSettings {
            test_ratio: 8.0,
            ..Default::default()
        };
        assert!(matches!(
            s.test_grid(GridSize::square(8)),
            Err(ConfigError::TestGridTooSmall { .. })
        ));
    }

    #[test]
    fn negative_tolerance_rejected() {
        let s = DynamicSettings {
            degeneracy_tolerance: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            s.validate(),
            Err(ConfigError::InvalidParameter {
                name: "degeneracy_tolerance",
                ..
            })
        ));
    }

    #[test]
    fn quiescent_flow_is_degenerate_for_every_single_family() {
        let size = GridSize::square(16);
        let c = cache();
        let settings = DynamicSettings::default();
        for (u0, v0) in [(0.0, 0.0), (1.3, -0.4)] {
            let u = PeriodicField::constant(size, u0);
            let v = PeriodicField::constant(size, v0);
            let kin = Kinematics::compute(&c, &u, &v).unwrap();
            let test = TestScale::compute(&c, &settings, &u, &v).unwrap();
            for model in [
                ClosureModel::Smagorinsky,
                ClosureModel::Leith,
                ClosureModel::Horiuti(HoriutiVariant::Combined),
            ] {
                let delta = c.domain().filter_width(size);
                let result = solve(
                    &c,
                    model,
                    CoefficientMode::Dynamic,
                    &settings,
                    &kin,
                    Some(&test),
                    delta,
                );
                match result {
                    Err(SgsError::ArithmeticDegeneracy { quantity, .. }) => {
                        assert_eq!(quantity, "mean(M:M)", "{model}");
                    }
                    other => panic!("{model}: expected ArithmeticDegeneracy, got {other:?}"),
                }
            }
        }
    }

    #[test]
    fn quiescent_hybrid_is_degenerate_at_a_point() {
        let size = GridSize::square(8);
        let c = cache();
        let settings = DynamicSettings::default();
        let u = PeriodicField::zeros(size);
        let kin = Kinematics::compute(&c, &u, &u).unwrap();
        let test = TestScale::compute(&c, &settings, &u, &u).unwrap();
        let model = ClosureModel::Hybrid(HoriutiVariant::Combined);
        let result = solve(
            &c,
            model,
            CoefficientMode::Dynamic,
            &settings,
            &kin,
            Some(&test),
            0.5,
        );
        match result {
            Err(SgsError::ArithmeticDegeneracy { quantity, point, .. }) => {
                assert_eq!(quantity, "det(M)");
                assert_eq!(point, Some(0));
            }
            other => panic!("expected ArithmeticDegeneracy, got {other:?}"),
        }
    }

    #[test]
    fn static_mode_needs_no_test_scale() {
        let size = GridSize::square(8);
        let c = cache();
        let u = PeriodicField::zeros(size);
        let kin = Kinematics::compute(&c, &u, &u).unwrap();
        let sol = solve(
            &c,
            ClosureModel::Leith,
            CoefficientMode::Static,
            &DynamicSettings::default(),
            &kin,
            None,
            0.1,
        )
        .unwrap();
        assert_eq!(sol.coefficients.len(), 1);
        assert_eq!(sol.coefficients[0], ModelCoefficient::Uniform(0.11 * 0.11 * 0.11));
        assert!(sol.diagnostics.is_none());
    }

    #[test]
    fn dynamic_without_test_scale_is_config_error() {
        let size = GridSize::square(8);
        let c = cache();
        let u = PeriodicField::zeros(size);
        let kin = Kinematics::compute(&c, &u, &u).unwrap();
        let err = solve(
            &c,
            ClosureModel::Smagorinsky,
            CoefficientMode::Dynamic,
            &DynamicSettings::default(),
            &kin,
            None,
            0.1,
        )
        .unwrap_err();
        assert!(matches!(err, SgsError::Config(_)));
    }

    #[test]
    fn dynamic_smagorinsky_matches_germano_ratio() {
        let size = GridSize::square(32);
        let c = cache();
        let settings = DynamicSettings::default();
        let (u, v) = velocity(size, 5);
        let kin = Kinematics::compute(&c, &u, &v).unwrap();
        let test = TestScale::compute(&c, &settings, &u, &v).unwrap();
        let delta = c.domain().filter_width(size);
        let sol = solve(
            &c,
            ClosureModel::Smagorinsky,
            CoefficientMode::Dynamic,
            &settings,
            &kin,
            Some(&test),
            delta,
        )
        .unwrap();
        let diag = sol.diagnostics.unwrap();
        let expected = diag.lm[0].sum() / diag.mm[0].sum();
        match &sol.coefficients[0] {
            ModelCoefficient::Uniform(cs2) => {
                assert!((cs2 - expected).abs() < 1e-12 * expected.abs().max(1.0))
            }
            other => panic!("expected a uniform coefficient, got {other:?}"),
        }
        assert!(diag.leonard.trace().max_abs() < 1e-12);
    }

    #[test]
    fn single_family_coefficients_ignore_velocity_amplitude() {
        let size = GridSize::square(32);
        let c = cache();
        let settings = DynamicSettings::default();
        let delta = c.domain().filter_width(size);
        let (u, v) = velocity(size, 1);
        let coefficient = |model: ClosureModel, scale: f64| {
            let (u, v) = (u.scale(scale), v.scale(scale));
            let kin = Kinematics::compute(&c, &u, &v).unwrap();
            let test = TestScale::compute(&c, &settings, &u, &v).unwrap();
            let sol = solve(
                &c,
                model,
                CoefficientMode::Dynamic,
                &settings,
                &kin,
                Some(&test),
                delta,
            )
            .unwrap_or_else(|e| panic!("{model} at amplitude {scale:e}: {e}"));
            sol.coefficients[0].mean()
        };
        for model in [
            ClosureModel::Smagorinsky,
            ClosureModel::Leith,
            ClosureModel::Horiuti(HoriutiVariant::Combined),
        ] {
            let reference = coefficient(model, 1.0);
            assert!(reference.is_finite() && reference != 0.0);
            for scale in [1e-4, 1e-8, 1e-10, 1e-12, 1e3] {
                let got = coefficient(model, scale);
                assert!(
                    (got - reference).abs() <= 1e-8 * reference.abs(),
                    "{model} at amplitude {scale:e}: {got} vs {reference}"
                );
            }
        }
    }

    #[test]
    fn zero_strain_with_moving_fluid_is_degenerate() {
        let size = GridSize::square(16);
        let c = cache();
        let settings = DynamicSettings::default();
        let u = PeriodicField::constant(size, 1e-9);
        let v = PeriodicField::constant(size, 2e-9);
        let kin = Kinematics::compute(&c, &u, &v).unwrap();
        let test = TestScale::compute(&c, &settings, &u, &v).unwrap();
        assert!(test.velocity_scale > 0.0);
        let result = solve(
            &c,
            ClosureModel::Smagorinsky,
            CoefficientMode::Dynamic,
            &settings,
            &kin,
            Some(&test),
            c.domain().filter_width(size),
        );
        assert!(matches!(
            result,
            Err(SgsError::ArithmeticDegeneracy {
                quantity: "mean(M:M)",
                ..
            })
        ));
    }

    #[test]
    fn clipping_never_lowers_the_coefficient() {
        let size = GridSize::square(32);
        let c = cache();
        let (u, v) = velocity(size, 17);
        let kin = Kinematics::compute(&c, &u, &v).unwrap();
        let delta = c.domain().filter_width(size);
        let run = |clip| {
            let settings = DynamicSettings {
                clip_backscatter: clip,
                ..Default::default()
            };
            let test = TestScale::compute(&c, &settings, &u, &v).unwrap();
            let sol = solve(
                &c,
                ClosureModel::Leith,
                CoefficientMode::Dynamic,
                &settings,
                &kin,
                Some(&test),
                delta,
            )
            .unwrap();
            sol.coefficients[0].mean()
        };
        assert!(run(true) >= run(false));
    }

    #[test]
    fn cramer_solves_known_system() {
        let size = GridSize::square(2);
        let f = |v: f64| PeriodicField::constant(size, v);
        // Columns: M^0 = (1, 0, 0), M^1 = (0, 2, 0), M^2 = (1, 0, 4).
        let m = [
            SymmetricTensor::new(f(1.0), f(0.0), f(0.0)).unwrap(),
            SymmetricTensor::new(f(0.0), f(2.0), f(0.0)).unwrap(),
            SymmetricTensor::new(f(1.0), f(0.0), f(4.0)).unwrap(),
        ];
        // Solution (1, 2, 3): L = (1 + 3, 4, 12).
        let l = SymmetricTensor::new(f(4.0), f(4.0), f(12.0)).unwrap();
        let c = joint_solve(&l, &m, &DynamicSettings::default()).unwrap();
        assert!((c[0].mean() - 1.0).abs() < 1e-14);
        assert!((c[1].mean() - 2.0).abs() < 1e-14);
        assert!((c[2].mean() - 3.0).abs() < 1e-14);
        assert!(c.iter().all(|f| f.is_wrap_consistent()));
    }
}
