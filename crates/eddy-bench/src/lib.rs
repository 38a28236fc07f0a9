//! Benchmark profiles and utilities for the eddy analysis pipeline.
//!
//! Provides pre-built configurations and snapshot sources for benchmarks:
//!
//! - [`reference_profile`]: 256² fine grid coarsened to 64², dynamic closure
//! - [`stress_profile`]: 1024² fine grid coarsened to 128²
//! - [`reference_source`]: seeded band-limited snapshots matching a profile

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use eddy_closure::{ClosureModel, CoefficientMode};
use eddy_core::GridSize;
use eddy_engine::AnalysisConfig;
use eddy_test_utils::MockSource;

/// Build a reference profile: 256² → 64², test grid 32².
pub fn reference_profile(model: ClosureModel, mode: CoefficientMode) -> AnalysisConfig {
    let mut config = AnalysisConfig::new(GridSize::square(256), GridSize::square(64));
    config.closure.model = model;
    config.closure.mode = mode;
    config
}

/// Build a stress profile: 1024² → 128², dynamic Smagorinsky.
pub fn stress_profile() -> AnalysisConfig {
    AnalysisConfig::new(GridSize::square(1024), GridSize::square(128))
}

/// `count` band-limited snapshots on the fine grid of `config`.
///
/// Energy extends to a third of the fine resolution, well past the
/// coarse cutoff, so the true SGS stress is non-trivial.
pub fn reference_source(config: &AnalysisConfig, count: usize, seed: u64) -> MockSource {
    MockSource::random(config.fine, count, config.fine.nx / 3, seed)
}
