//! Single-snapshot analysis pipeline.
//!
//! [`Analyzer`] owns a validated [`AnalysisConfig`] and a shared
//! [`SpectralCache`] precomputed for every resolution the configuration
//! touches. [`analyze()`](Analyzer::analyze) is a pure function of the
//! snapshot: it never mutates the analyzer, so one instance serves any
//! number of threads.
//!
//! # Stages
//!
//! 1. Fine velocity `u = ∂ψ/∂y`, `v = −∂ψ/∂x`.
//! 2. Coarsen `u`, `v`, `uu`, `uv`, `vv`, `ψ` and `ω`.
//! 3. True stress, coarse kinematics and second derivatives.
//! 4. Closure evaluation, then the true-viscosity diagnostic.

use std::sync::Arc;
use std::time::Instant;

use log::debug;

use eddy_closure::stress::{assemble, true_stress};
use eddy_closure::{Kinematics, SecondDerivatives, TrueViscosity};
use eddy_core::{ConfigError, PeriodicField, SgsError, Snapshot};
use eddy_spectral::{coarsen, gradient, SpectralCache};

use crate::config::AnalysisConfig;
use crate::metrics::SnapshotMetrics;
use crate::result::SnapshotResult;

/// Runs the a-priori pipeline on individual snapshots.
#[derive(Debug)]
pub struct Analyzer {
    config: AnalysisConfig,
    cache: Arc<SpectralCache>,
}

// Compile-time assertion: Analyzer must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Analyzer>();
};

impl Analyzer {
    /// Validate `config` and build a cache for its resolutions.
    pub fn new(config: AnalysisConfig) -> Result<Self, ConfigError> {
        let cache = Arc::new(SpectralCache::new(config.domain)?);
        Self::with_cache(config, cache)
    }

    /// Validate `config` and reuse an existing cache.
    ///
    /// The cache must have been built for the same domain.
    pub fn with_cache(
        config: AnalysisConfig,
        cache: Arc<SpectralCache>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if *cache.domain() != config.domain {
            return Err(ConfigError::InvalidParameter {
                name: "cache",
                reason: format!(
                    "built for domain {:?}, configuration uses {:?}",
                    cache.domain(),
                    config.domain
                ),
            });
        }
        cache.precompute(&config.resolutions()?)?;
        Ok(Self { config, cache })
    }

    /// The validated configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// The shared spectral cache.
    pub fn cache(&self) -> &Arc<SpectralCache> {
        &self.cache
    }

    /// Run the full pipeline on one snapshot.
    pub fn analyze(&self, snapshot: &Snapshot) -> Result<SnapshotResult, SgsError> {
        let total_start = Instant::now();
        let cache = &*self.cache;
        let fine = self.config.fine;
        let coarse = self.config.coarse;

        let psi = &snapshot.streamfunction;
        if psi.size() != fine {
            return Err(ConfigError::SizeMismatch {
                expected: fine,
                got: psi.size(),
            }
            .into());
        }
        if let Some(w) = &snapshot.vorticity {
            psi.check_same_size(w)?;
        }

        let velocity_start = Instant::now();
        let (psi_x, psi_y) = gradient(cache, psi)?;
        let u = psi_y;
        let v = -&psi_x;
        let velocity_us = velocity_start.elapsed().as_micros() as u64;

        let coarsen_start = Instant::now();
        let c = |f: &PeriodicField| coarsen(cache, f, coarse);
        let uu = c(&(&u * &u))?;
        let uv = c(&(&u * &v))?;
        let vv = c(&(&v * &v))?;
        let uc = c(&u)?;
        let vc = c(&v)?;
        let streamfunction = c(psi)?;
        let coarse_vorticity = snapshot.vorticity.as_ref().map(c).transpose()?;
        let coarsen_us = coarsen_start.elapsed().as_micros() as u64;

        let kinematics_start = Instant::now();
        let true_stress = true_stress(&uc, &vc, &uu, &uv, &vv)?;
        let kinematics = Kinematics::compute(cache, &uc, &vc)?;
        let second_derivatives = SecondDerivatives::compute(cache, &kinematics)?;
        let kinematics_us = kinematics_start.elapsed().as_micros() as u64;

        let closure_start = Instant::now();
        let closure = assemble(cache, &self.config.closure, &kinematics, &uc, &vc)?;
        let closure_us = closure_start.elapsed().as_micros() as u64;

        let true_viscosity = TrueViscosity::compute(
            &true_stress,
            &kinematics.strain,
            self.config.strain_tolerance,
        )?;

        // Without a stored vorticity, fall back to the coarse-velocity curl.
        let vorticity = coarse_vorticity.unwrap_or_else(|| kinematics.vorticity.clone());

        let metrics = SnapshotMetrics {
            total_us: total_start.elapsed().as_micros() as u64,
            velocity_us,
            coarsen_us,
            kinematics_us,
            closure_us,
            flagged_strain_points: true_viscosity.flagged(),
        };
        debug!(
            "snapshot {}: {} coefficients {:?} in {}us",
            snapshot.index,
            self.config.closure.model,
            closure
                .coefficients
                .iter()
                .map(|c| c.mean())
                .collect::<Vec<_>>(),
            metrics.total_us
        );

        Ok(SnapshotResult {
            index: snapshot.index,
            u: uc,
            v: vc,
            uu,
            uv,
            vv,
            kinematics,
            second_derivatives,
            true_stress,
            true_viscosity,
            closure,
            streamfunction,
            vorticity,
            metrics,
        })
    }
}
