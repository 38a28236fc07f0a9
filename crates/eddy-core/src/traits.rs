//! Collaborator traits through which raw DNS snapshots enter the pipeline.
//!
//! Reading files, choosing directory layouts and parsing on-disk formats
//! all live outside this workspace. The analysis only sees fully formed
//! [`Snapshot`]s handed over by a [`SnapshotSource`].

use std::error::Error;
use std::fmt;

use crate::field::PeriodicField;

/// One saved DNS state on the fine grid.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Snapshot number (1-based in a standard run).
    pub index: usize,
    /// Streamfunction ψ on the fine grid.
    pub streamfunction: PeriodicField,
    /// Vorticity ω on the fine grid, if the producer saved it.
    ///
    /// When present it is coarsened and carried through to the result;
    /// it is never used to derive the velocity.
    pub vorticity: Option<PeriodicField>,
}

/// Supplies snapshots by index.
///
/// Implementations must be `Sync`: the parallel runner calls
/// [`load`](SnapshotSource::load) from several worker threads at once.
pub trait SnapshotSource: Sync {
    /// Load snapshot `index`.
    fn load(&self, index: usize) -> Result<Snapshot, SourceError>;
}

/// A snapshot could not be produced by its source.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceError {
    /// Human-readable description of the failure.
    pub reason: String,
}

impl SourceError {
    /// Create a source error from any displayable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "snapshot source: {}", self.reason)
    }
}

impl Error for SourceError {}
