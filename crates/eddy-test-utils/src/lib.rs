//! Test utilities and mock collaborators for eddy development.
//!
//! Provides analytic and seeded-random periodic fields (see
//! [`fixtures`]), a field comparison helper, and [`MockSource`], an
//! in-memory [`SnapshotSource`] with configurable failures.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{band_limited, cos_mode, grid_coords, sin_sum, taylor_green_streamfunction};

use eddy_core::{GridSize, PeriodicField, Snapshot, SnapshotSource, SourceError};

/// Assert two fields share a grid and agree to `tol` at every sample,
/// wrap included.
///
/// # Panics
///
/// Panics with the first offending sample if they differ.
#[track_caller]
pub fn assert_fields_close(actual: &PeriodicField, expected: &PeriodicField, tol: f64) {
    assert_eq!(
        actual.size(),
        expected.size(),
        "fields live on different grids"
    );
    let stride = actual.size().ny + 1;
    for (idx, (a, e)) in actual
        .as_slice()
        .iter()
        .zip(expected.as_slice())
        .enumerate()
    {
        assert!(
            (a - e).abs() <= tol,
            "sample ({}, {}): got {a}, expected {e} (tol {tol})",
            idx / stride,
            idx % stride
        );
    }
}

/// In-memory snapshot source.
///
/// Pre-populate with [`with_snapshot`](MockSource::with_snapshot) or
/// [`random`](MockSource::random); mark indices that should fail with
/// [`failing_at`](MockSource::failing_at).
#[derive(Clone, Debug, Default)]
pub struct MockSource {
    snapshots: Vec<Snapshot>,
    failing: Vec<usize>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` snapshots numbered `1..=count`, each a band-limited random
    /// streamfunction with a matching vorticity field.
    pub fn random(size: GridSize, count: usize, kmax: usize, seed: u64) -> Self {
        let mut source = Self::new();
        for index in 1..=count {
            let psi = band_limited(size, kmax, seed.wrapping_add(index as u64));
            let omega = psi.scale(-1.0);
            source.snapshots.push(Snapshot {
                index,
                streamfunction: psi,
                vorticity: Some(omega),
            });
        }
        source
    }

    pub fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.snapshots.push(snapshot);
        self
    }

    /// Make [`load`](SnapshotSource::load) fail for `index`.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.failing.push(index);
        self
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SnapshotSource for MockSource {
    fn load(&self, index: usize) -> Result<Snapshot, SourceError> {
        if self.failing.contains(&index) {
            return Err(SourceError::new(format!("injected failure at {index}")));
        }
        self.snapshots
            .iter()
            .find(|s| s.index == index)
            .cloned()
            .ok_or_else(|| SourceError::new(format!("no snapshot {index}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_source_serves_and_fails() {
        let src = MockSource::random(GridSize::square(8), 3, 2, 1).failing_at(2);
        assert_eq!(src.len(), 3);
        assert_eq!(src.load(1).unwrap().index, 1);
        assert!(src.load(2).is_err());
        assert!(src.load(4).is_err());
    }

    #[test]
    #[should_panic(expected = "sample (1, 0)")]
    fn close_assertion_reports_location() {
        let size = GridSize::square(2);
        let a = PeriodicField::zeros(size);
        let b = PeriodicField::from_fn(size, |i, _| i as f64);
        assert_fields_close(&a, &b, 1e-12);
    }
}
