//! Subgrid-scale closures for coarse 2D velocity fields.
//!
//! Pipeline for one coarse velocity pair `(u, v)`:
//!
//! 1. [`Kinematics::compute`]: velocity gradients, strain, vorticity
//!    and rotation correlations.
//! 2. [`dynamic::TestScale::compute`]: test filtering and the deviatoric
//!    Leonard tensor `L`.
//! 3. [`dynamic::solve`]: closure coefficients, dynamic (Germano–Lilly)
//!    or static.
//! 4. [`stress::assemble`]: modeled stress and eddy viscosity.
//!
//! Closure families are the closed set [`ClosureModel`]; each is a list
//! of [`Basis`] records, and one generic solve serves all of them.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dynamic;
pub mod kinematics;
pub mod model;
pub mod stress;

pub use dynamic::{CoefficientSolution, DynamicSettings, GermanoDiagnostics, TestScale};
pub use kinematics::{HoriutiVariant, Kinematics, SecondDerivatives};
pub use model::{Basis, ClosureModel, CoefficientMode, ModelCoefficient};
pub use stress::{ClosureOutput, ClosureSettings, TrueViscosity};
