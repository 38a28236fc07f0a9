//! Error types for the eddy analysis pipeline.
//!
//! Split by when the failure can be detected: [`ConfigError`] covers
//! preconditions checked before any transform runs, and [`SgsError`]
//! covers everything that can go wrong while a snapshot is processed.

use std::error::Error;
use std::fmt;

use crate::grid::GridSize;

// ── ConfigError ────────────────────────────────────────────────────

/// Precondition failures: incompatible resolutions, invalid ratios,
/// unknown selectors and malformed input shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A grid has zero samples along one axis.
    EmptyGrid {
        /// The offending size.
        size: GridSize,
    },
    /// Spectral truncation needs an even sample count on both axes.
    OddGrid {
        /// Which grid (e.g. `"fine"`, `"coarse"`).
        name: &'static str,
        /// The offending size.
        size: GridSize,
    },
    /// The coarse grid is larger than the fine grid on some axis.
    CoarseExceedsFine {
        /// Fine-grid size.
        fine: GridSize,
        /// Coarse-grid size.
        coarse: GridSize,
    },
    /// A filter cutoff is finer than the field it is applied to.
    CutoffExceedsGrid {
        /// Size of the filtered field.
        size: GridSize,
        /// Requested cutoff resolution.
        cutoff: GridSize,
    },
    /// The test-filter ratio α must be finite and greater than one.
    InvalidTestRatio {
        /// The invalid value.
        value: f64,
    },
    /// `floor(coarse / α)` leaves fewer than two samples on some axis.
    TestGridTooSmall {
        /// Working coarse grid.
        coarse: GridSize,
        /// Configured ratio.
        ratio: f64,
    },
    /// A flat sample buffer does not match the declared grid.
    LengthMismatch {
        /// Expected number of samples.
        expected: usize,
        /// Number of samples supplied.
        got: usize,
    },
    /// Two fields that must share a grid do not.
    SizeMismatch {
        /// Expected grid size.
        expected: GridSize,
        /// Grid size found.
        got: GridSize,
    },
    /// An integer selector does not name a known option.
    UnknownSelector {
        /// Name of the selector (e.g. `"filter"`).
        name: &'static str,
        /// The unrecognized value.
        value: i64,
    },
    /// A scalar parameter is out of range.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the violated constraint.
        reason: String,
    },
    /// Domain lengths must be finite and positive.
    InvalidDomain {
        /// Length along x.
        lx: f64,
        /// Length along y.
        ly: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid { size } => write!(f, "grid {size} has an empty axis"),
            Self::OddGrid { name, size } => {
                write!(f, "{name} grid {size} must have an even size on both axes")
            }
            Self::CoarseExceedsFine { fine, coarse } => {
                write!(f, "coarse grid {coarse} exceeds fine grid {fine}")
            }
            Self::CutoffExceedsGrid { size, cutoff } => {
                write!(f, "filter cutoff {cutoff} exceeds field grid {size}")
            }
            Self::InvalidTestRatio { value } => {
                write!(f, "test-filter ratio must be finite and > 1, got {value}")
            }
            Self::TestGridTooSmall { coarse, ratio } => {
                write!(
                    f,
                    "test-filter ratio {ratio} leaves fewer than 2 samples per axis on {coarse}"
                )
            }
            Self::LengthMismatch { expected, got } => {
                write!(f, "expected {expected} samples, got {got}")
            }
            Self::SizeMismatch { expected, got } => {
                write!(f, "expected a {expected} field, got {got}")
            }
            Self::UnknownSelector { name, value } => {
                write!(f, "unknown {name} selector {value}")
            }
            Self::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter '{name}': {reason}")
            }
            Self::InvalidDomain { lx, ly } => {
                write!(f, "domain lengths must be finite and positive, got ({lx}, {ly})")
            }
        }
    }
}

impl Error for ConfigError {}

// ── SgsError ───────────────────────────────────────────────────────

/// Failures while processing one snapshot.
///
/// None of these are retried; the orchestrator isolates the failing
/// snapshot and continues with the rest of the batch.
#[derive(Clone, Debug, PartialEq)]
pub enum SgsError {
    /// A precondition was violated.
    Config(ConfigError),
    /// A dynamic-coefficient denominator vanished or is ill-conditioned.
    ///
    /// Signals a degenerate (e.g. quiescent) flow state or a mis-set
    /// test-filter ratio. Never replaced by a silent zero.
    ArithmeticDegeneracy {
        /// Which quantity degenerated (e.g. `"sum(M:M)"`).
        quantity: &'static str,
        /// The offending value.
        value: f64,
        /// Flat interior index of the point, for pointwise solves.
        point: Option<usize>,
    },
    /// A non-finite value appeared after a transform or filter pass.
    NumericalInstability {
        /// Pipeline stage that produced the value.
        stage: &'static str,
        /// Flat index of the first non-finite sample.
        index: usize,
    },
}

impl fmt::Display for SgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::ArithmeticDegeneracy {
                quantity,
                value,
                point,
            } => {
                write!(f, "arithmetic degeneracy: {quantity} = {value:e}")?;
                if let Some(p) = point {
                    write!(f, " at point {p}")?;
                }
                Ok(())
            }
            Self::NumericalInstability { stage, index } => {
                write!(f, "non-finite value after {stage} at sample {index}")
            }
        }
    }
}

impl Error for SgsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for SgsError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
