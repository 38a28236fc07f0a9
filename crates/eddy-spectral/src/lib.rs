//! Spectral machinery for the eddy workspace.
//!
//! Everything here operates on doubly periodic [`PeriodicField`]s and is
//! a pure function of its inputs plus the shared, read-only
//! [`SpectralCache`]:
//!
//! - [`transform`]: 2D forward/inverse FFT with numpy normalization
//! - [`wavenumber`]: per-resolution wavenumber tables
//! - [`coarsen`]: spectral truncation onto a coarser grid
//! - [`filter`]: the four low-pass kernels of [`FilterKind`]
//! - [`diff`]: spectral gradients and second derivatives
//!
//! [`PeriodicField`]: eddy_core::PeriodicField

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod coarsen;
pub mod diff;
pub mod filter;
pub mod transform;
pub mod wavenumber;

pub use coarsen::{check_coarsening, coarsen};
pub use diff::{gradient, second_derivatives};
pub use filter::FilterKind;
pub use transform::{SpectralCache, SpectralPlan, Spectrum};
pub use wavenumber::WavenumberGrid;

