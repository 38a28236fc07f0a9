//! Integration test: every closure family on a coarsened turbulent field.
//!
//! Builds a band-limited streamfunction on a fine grid, derives and
//! coarsens the velocity, then runs each closure family in static and
//! dynamic mode and checks the structural invariants of the output.

use eddy_closure::stress::{assemble, true_stress};
use eddy_closure::{
    ClosureModel, ClosureSettings, CoefficientMode, DynamicSettings, HoriutiVariant, Kinematics,
    ModelCoefficient, TrueViscosity,
};
use eddy_core::{Domain, GridSize, PeriodicField, SgsError};
use eddy_spectral::{coarsen, gradient, FilterKind, SpectralCache};
use eddy_test_utils::band_limited;

struct Coarse {
    u: PeriodicField,
    v: PeriodicField,
    uu: PeriodicField,
    uv: PeriodicField,
    vv: PeriodicField,
}

fn coarse_flow(cache: &SpectralCache, seed: u64) -> Coarse {
    let fine = GridSize::square(64);
    let coarse = GridSize::square(32);
    let psi = band_limited(fine, 24, seed);
    let (px, py) = gradient(cache, &psi).unwrap();
    let (u, v) = (py, -&px);
    let c = |f: &PeriodicField| coarsen(cache, f, coarse).unwrap();
    Coarse {
        uu: c(&(&u * &u)),
        uv: c(&(&u * &v)),
        vv: c(&(&v * &v)),
        u: c(&u),
        v: c(&v),
    }
}

const FAMILIES: [ClosureModel; 7] = [
    ClosureModel::Smagorinsky,
    ClosureModel::Leith,
    ClosureModel::Horiuti(HoriutiVariant::StrainRotation),
    ClosureModel::Horiuti(HoriutiVariant::GradientSquare),
    ClosureModel::Horiuti(HoriutiVariant::Combined),
    ClosureModel::Hybrid(HoriutiVariant::Combined),
    ClosureModel::Bardina,
];

#[test]
fn every_family_yields_deviatoric_finite_stress() {
    let cache = SpectralCache::new(Domain::default()).unwrap();
    let flow = coarse_flow(&cache, 1);
    let kin = Kinematics::compute(&cache, &flow.u, &flow.v).unwrap();

    for model in FAMILIES {
        for mode in [CoefficientMode::Static, CoefficientMode::Dynamic] {
            let settings = ClosureSettings {
                model,
                mode,
                ..Default::default()
            };
            let out = assemble(&cache, &settings, &kin, &flow.u, &flow.v)
                .unwrap_or_else(|e| panic!("{model} {mode:?}: {e}"));
            let tau = &out.modeled_stress;
            assert!(tau.trace().max_abs() < 1e-12, "{model} {mode:?}");
            assert!(tau.t11.first_non_finite().is_none());
            assert!(tau.t12.is_wrap_consistent());
            assert_eq!(out.coefficients.len(), model.bases().len());
            assert_eq!(out.model_viscosity.is_some(), model != ClosureModel::Bardina);
        }
    }
}

#[test]
fn hybrid_dynamic_coefficients_are_pointwise() {
    let cache = SpectralCache::new(Domain::default()).unwrap();
    let flow = coarse_flow(&cache, 2);
    let kin = Kinematics::compute(&cache, &flow.u, &flow.v).unwrap();
    let settings = ClosureSettings {
        model: ClosureModel::Hybrid(HoriutiVariant::GradientSquare),
        ..Default::default()
    };
    let out = assemble(&cache, &settings, &kin, &flow.u, &flow.v).unwrap();
    assert_eq!(out.coefficients.len(), 3);
    for c in &out.coefficients {
        match c {
            ModelCoefficient::Field(f) => assert_eq!(f.size(), GridSize::square(32)),
            other => panic!("expected a pointwise coefficient, got {other:?}"),
        }
    }
    let diag = out.diagnostics.unwrap();
    assert_eq!(diag.lm.len(), 3);
    assert_eq!(diag.mm.len(), 3);
}

#[test]
fn trace_free_hybrid_is_rejected_as_degenerate() {
    // With variant 1 every basis is trace-free, so the 11 and 22 rows
    // of the Germano system coincide up to sign.
    let cache = SpectralCache::new(Domain::default()).unwrap();
    let flow = coarse_flow(&cache, 3);
    let kin = Kinematics::compute(&cache, &flow.u, &flow.v).unwrap();
    let settings = ClosureSettings {
        model: ClosureModel::Hybrid(HoriutiVariant::StrainRotation),
        ..Default::default()
    };
    match assemble(&cache, &settings, &kin, &flow.u, &flow.v) {
        Err(SgsError::ArithmeticDegeneracy { quantity, point, .. }) => {
            assert_eq!(quantity, "det(M)");
            assert!(point.is_some());
        }
        other => panic!("expected ArithmeticDegeneracy, got {other:?}"),
    }
}

#[test]
fn dynamic_coefficients_respond_to_test_filter_choice() {
    let cache = SpectralCache::new(Domain::default()).unwrap();
    let flow = coarse_flow(&cache, 4);
    let kin = Kinematics::compute(&cache, &flow.u, &flow.v).unwrap();
    let coefficient = |filter| {
        let settings = ClosureSettings {
            dynamic: DynamicSettings {
                filter,
                ..Default::default()
            },
            ..Default::default()
        };
        assemble(&cache, &settings, &kin, &flow.u, &flow.v)
            .unwrap()
            .coefficients[0]
            .mean()
    };
    let sharp = coefficient(FilterKind::Sharp);
    let gaussian = coefficient(FilterKind::Gaussian);
    assert!(sharp.is_finite() && gaussian.is_finite());
    assert_ne!(sharp, gaussian);
}

#[test]
fn true_stress_and_viscosity_on_coarse_grid() {
    let cache = SpectralCache::new(Domain::default()).unwrap();
    let flow = coarse_flow(&cache, 5);
    let kin = Kinematics::compute(&cache, &flow.u, &flow.v).unwrap();
    let t = true_stress(&flow.u, &flow.v, &flow.uu, &flow.uv, &flow.vv).unwrap();
    assert!(t.trace().max_abs() < 1e-12);
    let nu = TrueViscosity::compute(&t, &kin.strain, 1e-14).unwrap();
    assert_eq!(nu.nu.size(), GridSize::square(32));
    assert!(nu.flagged() < GridSize::square(32).cell_count());
}
