//! True and modeled subgrid stress on the working coarse grid.

use log::{debug, warn};
use smallvec::SmallVec;

use eddy_core::{ConfigError, PeriodicField, SgsError, SymmetricTensor};
use eddy_spectral::SpectralCache;

use crate::dynamic::{self, DynamicSettings, GermanoDiagnostics, TestScale};
use crate::kinematics::{HoriutiVariant, Kinematics};
use crate::model::{ClosureModel, CoefficientMode, ModelCoefficient};

// ── ClosureSettings ────────────────────────────────────────────────

/// Which closure to evaluate and how its coefficients are obtained.
#[derive(Clone, Debug, PartialEq)]
pub struct ClosureSettings {
    /// Closure family. Default: Smagorinsky.
    pub model: ClosureModel,
    /// Dynamic or static coefficients. Default: dynamic.
    pub mode: CoefficientMode,
    /// Test-filter parameters. Also used by Bardina in either mode.
    pub dynamic: DynamicSettings,
}

impl Default for ClosureSettings {
    fn default() -> Self {
        Self {
            model: ClosureModel::Smagorinsky,
            mode: CoefficientMode::Dynamic,
            dynamic: DynamicSettings::default(),
        }
    }
}

impl ClosureSettings {
    /// Validate the dynamic parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dynamic.validate()
    }

    /// Whether a snapshot needs test-filtered quantities.
    pub fn needs_test_scale(&self) -> bool {
        self.mode == CoefficientMode::Dynamic || self.model == ClosureModel::Bardina
    }

    /// The Horiuti variant, if the family uses one.
    pub fn horiuti_variant(&self) -> Option<HoriutiVariant> {
        match self.model {
            ClosureModel::Horiuti(v) | ClosureModel::Hybrid(v) => Some(v),
            _ => None,
        }
    }
}

// ── True stress ────────────────────────────────────────────────────

/// Deviatoric true SGS stress `coarsen(u_i u_j) − u_i u_j` from coarse
/// velocity and coarsened products.
pub fn true_stress(
    uc: &PeriodicField,
    vc: &PeriodicField,
    uu: &PeriodicField,
    uv: &PeriodicField,
    vv: &PeriodicField,
) -> Result<SymmetricTensor, ConfigError> {
    for f in [vc, uu, uv, vv] {
        uc.check_same_size(f)?;
    }
    let raw = SymmetricTensor {
        t11: uu - &(uc * uc),
        t12: uv - &(uc * vc),
        t22: vv - &(vc * vc),
    };
    Ok(raw.deviatoric())
}

/// Pointwise ratio of true stress to strain rate.
///
/// Division is raw: points where `|d_ij|` is at or below `tolerance`
/// are counted in `near_zero` but their values are kept as computed.
#[derive(Clone, Debug)]
pub struct TrueViscosity {
    /// `t'_11 / d11`, `t12 / d12`, `t'_22 / d22`.
    pub nu: SymmetricTensor,
    /// Near-zero strain counts for components 11, 12, 22.
    pub near_zero: [usize; 3],
    /// Threshold used for `near_zero`.
    pub tolerance: f64,
}

impl TrueViscosity {
    /// Divide `stress` by `strain` component-wise.
    pub fn compute(
        stress: &SymmetricTensor,
        strain: &SymmetricTensor,
        tolerance: f64,
    ) -> Result<Self, ConfigError> {
        stress.t11.check_same_size(&strain.t11)?;
        let ratio = |t: &PeriodicField, d: &PeriodicField| t.zip_map(d, |t, d| t / d);
        let nu = SymmetricTensor {
            t11: ratio(&stress.t11, &strain.t11),
            t12: ratio(&stress.t12, &strain.t12),
            t22: ratio(&stress.t22, &strain.t22),
        };
        let count = |d: &PeriodicField| d.interior().filter(|x| x.abs() <= tolerance).count();
        let near_zero = [
            count(&strain.t11),
            count(&strain.t12),
            count(&strain.t22),
        ];
        if near_zero.iter().any(|&n| n > 0) {
            warn!(
                "true viscosity: near-zero strain at {near_zero:?} points (11, 12, 22), tolerance {tolerance:e}"
            );
        }
        Ok(Self {
            nu,
            near_zero,
            tolerance,
        })
    }

    /// Total flagged points over all components.
    pub fn flagged(&self) -> usize {
        self.near_zero.iter().sum()
    }
}

// ── Modeled stress ─────────────────────────────────────────────────

/// Everything the closure produces for one snapshot.
#[derive(Clone, Debug)]
pub struct ClosureOutput {
    /// One coefficient per basis; empty for Bardina.
    pub coefficients: SmallVec<[ModelCoefficient; 3]>,
    /// Deviatoric modeled stress.
    pub modeled_stress: SymmetricTensor,
    /// `Σ C_f δ^p s_f`; absent for Bardina.
    pub model_viscosity: Option<PeriodicField>,
    /// Germano fields; present in dynamic mode for eddy-viscosity families.
    pub diagnostics: Option<GermanoDiagnostics>,
}

/// Evaluate the configured closure on the coarse velocity `(u, v)`.
///
/// `kin` must be the kinematics of `(u, v)`.
pub fn assemble(
    cache: &SpectralCache,
    settings: &ClosureSettings,
    kin: &Kinematics,
    u: &PeriodicField,
    v: &PeriodicField,
) -> Result<ClosureOutput, SgsError> {
    settings.validate()?;
    u.check_same_size(v)?;
    u.check_same_size(&kin.ux)?;
    let size = u.size();
    let delta = cache.domain().filter_width(size);

    let test = if settings.needs_test_scale() {
        Some(TestScale::compute(cache, &settings.dynamic, u, v)?)
    } else {
        None
    };

    let solution = dynamic::solve(
        cache,
        settings.model,
        settings.mode,
        &settings.dynamic,
        kin,
        test.as_ref(),
        delta,
    )?;

    if settings.model == ClosureModel::Bardina {
        let leonard = test
            .map(|t| t.leonard)
            .ok_or_else(|| ConfigError::InvalidParameter {
                name: "test_scale",
                reason: "bardina needs test-filtered quantities".into(),
            })?;
        return Ok(ClosureOutput {
            coefficients: solution.coefficients,
            modeled_stress: leonard,
            model_viscosity: None,
            diagnostics: None,
        });
    }

    let mut stress = SymmetricTensor::zeros(size);
    let mut viscosity = PeriodicField::zeros(size);
    for (basis, c) in settings.model.bases().into_iter().zip(&solution.coefficients) {
        let width = delta.powi(basis.length_power());
        let term = c.times_tensor(&basis.tensor(kin)).scale(-2.0 * width);
        stress = &stress + &term;
        viscosity = &viscosity + &c.times(&basis.viscosity_scale(kin)).scale(width);
        debug!(
            "{} coefficient ({}): {:.6e}",
            basis.name(),
            settings.model,
            c.mean()
        );
    }

    Ok(ClosureOutput {
        coefficients: solution.coefficients,
        modeled_stress: stress
            .deviatoric()
            .try_map_components(|f| f.clone().ensure_finite("modeled stress"))?,
        model_viscosity: Some(viscosity),
        diagnostics: solution.diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use eddy_core::{Domain, GridSize};
    use eddy_spectral::{coarsen, gradient};
    use eddy_test_utils::{band_limited, grid_coords};

    fn cache() -> SpectralCache {
        SpectralCache::new(Domain::default()).unwrap()
    }

    fn velocity(c: &SpectralCache, size: GridSize, seed: u64) -> (PeriodicField, PeriodicField) {
        let psi = band_limited(size, size.nx / 3, seed);
        let (px, py) = gradient(c, &psi).unwrap();
        (py, -&px)
    }

    #[test]
    fn true_stress_is_deviatoric() {
        let c = cache();
        let fine = GridSize::square(32);
        let coarse = GridSize::square(16);
        let (u, v) = velocity(&c, fine, 3);
        let cs = |f: &PeriodicField| coarsen(&c, f, coarse).unwrap();
        let t = true_stress(&cs(&u), &cs(&v), &cs(&(&u * &u)), &cs(&(&u * &v)), &cs(&(&v * &v)))
            .unwrap();
        assert!(t.trace().max_abs() < 1e-12);
        assert!(t.t12.max_abs() > 0.0);
    }

    #[test]
    fn true_stress_rejects_mixed_grids() {
        let a = PeriodicField::zeros(GridSize::square(8));
        let b = PeriodicField::zeros(GridSize::square(4));
        assert!(matches!(
            true_stress(&a, &a, &a, &b, &a),
            Err(ConfigError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn assemble_rejects_kinematics_from_another_grid() {
        let c = cache();
        let fine = PeriodicField::zeros(GridSize::square(16));
        let coarse = PeriodicField::zeros(GridSize::square(8));
        let kin = Kinematics::compute(&c, &coarse, &coarse).unwrap();
        for mode in [CoefficientMode::Static, CoefficientMode::Dynamic] {
            let settings = ClosureSettings {
                mode,
                ..Default::default()
            };
            match assemble(&c, &settings, &kin, &fine, &fine) {
                Err(SgsError::Config(ConfigError::SizeMismatch { expected, got })) => {
                    assert_eq!(expected, GridSize::square(16));
                    assert_eq!(got, GridSize::square(8));
                }
                other => panic!("{mode:?}: expected SizeMismatch, got {other:?}"),
            }
        }
        assert!(matches!(
            assemble(&c, &ClosureSettings::default(), &kin, &coarse, &fine),
            Err(SgsError::Config(ConfigError::SizeMismatch { .. }))
        ));
    }

    #[test]
    fn static_smagorinsky_matches_closed_form() {
        let c = cache();
        let size = GridSize::square(16);
        let u = PeriodicField::from_fn(size, |i, j| {
            let (x, y) = grid_coords(size, i, j);
            x.sin() * y.cos()
        });
        let v = PeriodicField::from_fn(size, |i, j| {
            let (x, y) = grid_coords(size, i, j);
            -x.cos() * y.sin()
        });
        let kin = Kinematics::compute(&c, &u, &v).unwrap();
        let settings = ClosureSettings {
            mode: CoefficientMode::Static,
            ..Default::default()
        };
        let out = assemble(&c, &settings, &kin, &u, &v).unwrap();

        let dx = 2.0 * std::f64::consts::PI / 16.0;
        let delta2 = dx * dx;
        for i in 0..16 {
            for j in 0..16 {
                let (x, y) = grid_coords(size, i, j);
                let d11 = x.cos() * y.cos();
                let s = 2.0 * d11.abs();
                let tau11 = -2.0 * 0.0324 * delta2 * s * d11;
                // d22 = −d11, so the deviatoric part equals the raw tensor.
                assert!((out.modeled_stress.t11.get(i, j) - tau11).abs() < 1e-12);
                assert!((out.modeled_stress.t22.get(i, j) + tau11).abs() < 1e-12);
                assert!(out.modeled_stress.t12.get(i, j).abs() < 1e-12);
                let nu = out.model_viscosity.as_ref().unwrap().get(i, j);
                assert!((nu - 0.0324 * delta2 * s).abs() < 1e-12);
            }
        }
        assert!(out.diagnostics.is_none());
    }

    #[test]
    fn modeled_stress_is_deviatoric_for_every_static_family() {
        let c = cache();
        let size = GridSize::square(16);
        let (u, v) = velocity(&c, size, 8);
        let kin = Kinematics::compute(&c, &u, &v).unwrap();
        for model in [
            ClosureModel::Smagorinsky,
            ClosureModel::Leith,
            ClosureModel::Horiuti(HoriutiVariant::GradientSquare),
            ClosureModel::Hybrid(HoriutiVariant::Combined),
            ClosureModel::Bardina,
        ] {
            let settings = ClosureSettings {
                model,
                mode: CoefficientMode::Static,
                ..Default::default()
            };
            let out = assemble(&c, &settings, &kin, &u, &v).unwrap();
            assert!(out.modeled_stress.trace().max_abs() < 1e-12, "{model}");
            assert_eq!(out.coefficients.len(), model.bases().len());
        }
    }

    #[test]
    fn bardina_is_the_test_scale_leonard_tensor() {
        let c = cache();
        let size = GridSize::square(16);
        let (u, v) = velocity(&c, size, 21);
        let kin = Kinematics::compute(&c, &u, &v).unwrap();
        let settings = ClosureSettings {
            model: ClosureModel::Bardina,
            ..Default::default()
        };
        let out = assemble(&c, &settings, &kin, &u, &v).unwrap();
        let test = TestScale::compute(&c, &settings.dynamic, &u, &v).unwrap();
        assert_eq!(out.modeled_stress.t11, test.leonard.t11);
        assert_eq!(out.modeled_stress.t12, test.leonard.t12);
        assert!(out.coefficients.is_empty());
        assert!(out.model_viscosity.is_none());
    }

    #[test]
    fn near_zero_strain_is_counted_not_suppressed() {
        let size = GridSize::square(4);
        let stress = SymmetricTensor::new(
            PeriodicField::constant(size, 1.0),
            PeriodicField::constant(size, 2.0),
            PeriodicField::constant(size, -1.0),
        )
        .unwrap();
        let strain = SymmetricTensor::new(
            PeriodicField::constant(size, 0.5),
            PeriodicField::from_fn(size, |i, _| if i == 0 { 0.0 } else { 1.0 }),
            PeriodicField::constant(size, -0.5),
        )
        .unwrap();
        let tv = TrueViscosity::compute(&stress, &strain, 1e-12).unwrap();
        assert_eq!(tv.near_zero, [0, 4, 0]);
        assert_eq!(tv.flagged(), 4);
        assert_eq!(tv.nu.t11.get(1, 1), 2.0);
        assert!(tv.nu.t12.get(0, 2).is_infinite());
        assert_eq!(tv.nu.t12.get(2, 2), 2.0);
    }

    #[test]
    fn dynamic_smagorinsky_produces_diagnostics() {
        let c = cache();
        let size = GridSize::square(32);
        let (u, v) = velocity(&c, size, 4);
        let kin = Kinematics::compute(&c, &u, &v).unwrap();
        let out = assemble(&c, &ClosureSettings::default(), &kin, &u, &v).unwrap();
        let diag = out.diagnostics.expect("dynamic mode keeps diagnostics");
        assert_eq!(diag.lm.len(), 1);
        assert!(out.coefficients[0].mean().is_finite());
        assert!(out.modeled_stress.trace().max_abs() < 1e-12);
    }
}
