//! Per-snapshot output bundle, the sink collaborator and batch errors.

use std::error::Error;
use std::fmt;

use eddy_closure::{ClosureOutput, Kinematics, SecondDerivatives, TrueViscosity};
use eddy_core::{PeriodicField, SgsError, SourceError, SymmetricTensor};

use crate::metrics::SnapshotMetrics;

// ── SnapshotResult ─────────────────────────────────────────────────

/// Everything produced for one snapshot. All fields live on the coarse
/// grid.
#[derive(Clone, Debug)]
pub struct SnapshotResult {
    /// Snapshot index as reported by the source.
    pub index: usize,
    /// Coarse `u`.
    pub u: PeriodicField,
    /// Coarse `v`.
    pub v: PeriodicField,
    /// Coarsened `u·u`.
    pub uu: PeriodicField,
    /// Coarsened `u·v`.
    pub uv: PeriodicField,
    /// Coarsened `v·v`.
    pub vv: PeriodicField,
    /// Coarse velocity gradients, strain, `|S|` and vorticity.
    pub kinematics: Kinematics,
    /// Coarse unmixed second derivatives.
    pub second_derivatives: SecondDerivatives,
    /// Deviatoric true SGS stress.
    pub true_stress: SymmetricTensor,
    /// True stress divided by strain rate.
    pub true_viscosity: TrueViscosity,
    /// Coefficients, modeled stress, model viscosity, diagnostics.
    pub closure: ClosureOutput,
    /// Coarsened streamfunction.
    pub streamfunction: PeriodicField,
    /// Coarsened vorticity.
    pub vorticity: PeriodicField,
    /// Stage timings.
    pub metrics: SnapshotMetrics,
}

// ── ResultSink ─────────────────────────────────────────────────────

/// Failure reported by a [`ResultSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkError {
    /// Why the result could not be stored.
    pub reason: String,
}

impl SinkError {
    /// Create a sink error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "result sink: {}", self.reason)
    }
}

impl Error for SinkError {}

/// Receives finished snapshot results.
///
/// Always called from the thread that started the run, one result at a
/// time, so implementations need not be thread-safe.
pub trait ResultSink {
    /// Store one result.
    fn persist(&mut self, result: SnapshotResult) -> Result<(), SinkError>;
}

/// A sink that keeps every result in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    /// Results in arrival order.
    pub results: Vec<SnapshotResult>,
}

impl VecSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Results sorted by snapshot index.
    pub fn sorted(mut self) -> Vec<SnapshotResult> {
        self.results.sort_by_key(|r| r.index);
        self.results
    }
}

impl ResultSink for VecSink {
    fn persist(&mut self, result: SnapshotResult) -> Result<(), SinkError> {
        self.results.push(result);
        Ok(())
    }
}

// ── SnapshotError ──────────────────────────────────────────────────

/// A snapshot that could not be processed, tagged with its index.
#[derive(Clone, Debug, PartialEq)]
pub enum SnapshotError {
    /// The source could not provide the snapshot.
    Load {
        /// Requested snapshot index.
        index: usize,
        /// The underlying source error.
        error: SourceError,
    },
    /// The analysis pipeline failed.
    Analysis {
        /// Requested snapshot index.
        index: usize,
        /// The underlying pipeline error.
        error: SgsError,
    },
    /// The sink rejected the result.
    Persist {
        /// Requested snapshot index.
        index: usize,
        /// The underlying sink error.
        error: SinkError,
    },
}

impl SnapshotError {
    /// The snapshot this error belongs to.
    pub fn index(&self) -> usize {
        match *self {
            Self::Load { index, .. } => index,
            Self::Analysis { index, .. } => index,
            Self::Persist { index, .. } => index,
        }
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { index, error } => write!(f, "snapshot {index}: load failed: {error}"),
            Self::Analysis { index, error } => {
                write!(f, "snapshot {index}: analysis failed: {error}")
            }
            Self::Persist { index, error } => {
                write!(f, "snapshot {index}: persist failed: {error}")
            }
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load { error, .. } => Some(error),
            Self::Analysis { error, .. } => Some(error),
            Self::Persist { error, .. } => Some(error),
        }
    }
}
