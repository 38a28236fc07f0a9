//! Eddy: a-priori subgrid-scale closure analysis for 2D periodic turbulence.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! eddy sub-crates. For most users, adding `eddy` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use eddy::prelude::*;
//!
//! // A source holding one cellular-flow snapshot on a 32×32 grid.
//! struct OneSnapshot(PeriodicField);
//! impl SnapshotSource for OneSnapshot {
//!     fn load(&self, index: usize) -> Result<Snapshot, SourceError> {
//!         Ok(Snapshot {
//!             index,
//!             streamfunction: self.0.clone(),
//!             vorticity: None,
//!         })
//!     }
//! }
//!
//! let fine = GridSize::square(32);
//! let psi = PeriodicField::from_fn(fine, |i, j| {
//!     let x = 2.0 * std::f64::consts::PI * i as f64 / 32.0;
//!     let y = 2.0 * std::f64::consts::PI * j as f64 / 32.0;
//!     x.sin() * y.sin()
//! });
//!
//! let mut config = AnalysisConfig::new(fine, GridSize::square(16));
//! config.closure.mode = CoefficientMode::Static;
//! let analyzer = Analyzer::new(config).unwrap();
//!
//! let mut sink = VecSink::new();
//! let report = analyzer.run(&OneSnapshot(psi), &mut sink);
//! assert!(report.is_clean());
//! assert_eq!(sink.results[0].u.size(), GridSize::square(16));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `eddy-core` | Periodic fields, grids, tensors, errors, snapshot source |
//! | [`spectral`] | `eddy-spectral` | FFT cache, coarsening, filters, differentiation |
//! | [`closure`] | `eddy-closure` | Kinematics, closure families, dynamic procedure |
//! | [`engine`] | `eddy-engine` | Configuration, analyzer, batch runs, results |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and errors (`eddy-core`).
///
/// Contains [`types::PeriodicField`], [`types::GridSize`],
/// [`types::SymmetricTensor`], the error enums and the
/// [`types::SnapshotSource`] collaborator trait.
pub use eddy_core as types;

/// Spectral operations (`eddy-spectral`).
///
/// The shared [`spectral::SpectralCache`], [`spectral::coarsen`],
/// [`spectral::FilterKind`] and [`spectral::gradient`].
pub use eddy_spectral as spectral;

/// SGS closures (`eddy-closure`).
///
/// [`closure::Kinematics`], the [`closure::ClosureModel`] families, and
/// the dynamic procedure in [`closure::dynamic`].
pub use eddy_closure as closure;

/// Analysis orchestration (`eddy-engine`).
///
/// [`engine::Analyzer`] for single snapshots and whole runs,
/// [`engine::RunParameters`] for the ordered parameter list.
pub use eddy_engine as engine;

/// Common imports for typical eddy usage.
///
/// ```rust
/// use eddy::prelude::*;
/// ```
///
/// This imports the most frequently used types: configuration, the
/// analyzer, closure selectors, fields and the collaborator traits.
pub mod prelude {
    // Core types and traits
    pub use eddy_core::{
        Domain, GridSize, PeriodicField, Snapshot, SnapshotSource, SourceError, SymmetricTensor,
    };

    // Errors
    pub use eddy_core::{ConfigError, SgsError};

    // Spectral
    pub use eddy_spectral::{FilterKind, SpectralCache};

    // Closure
    pub use eddy_closure::{
        ClosureModel, ClosureSettings, CoefficientMode, DynamicSettings, HoriutiVariant,
        ModelCoefficient,
    };

    // Engine
    pub use eddy_engine::{
        AnalysisConfig, Analyzer, ResultSink, RunParameters, RunReport, SinkError, SnapshotError,
        SnapshotMetrics, SnapshotResult, VecSink,
    };
}
