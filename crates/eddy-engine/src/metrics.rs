//! Per-snapshot performance metrics.
//!
//! [`SnapshotMetrics`] captures stage timings for one analyzed snapshot,
//! for profiling and for the per-run summary in
//! [`RunReport`](crate::batched::RunReport).

/// Timing data collected while analyzing a single snapshot.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotMetrics {
    /// Wall-clock time for the whole snapshot, in microseconds.
    pub total_us: u64,
    /// Fine-grid velocity from the streamfunction, in microseconds.
    pub velocity_us: u64,
    /// Coarsening of velocity, products, streamfunction and vorticity,
    /// in microseconds.
    pub coarsen_us: u64,
    /// Coarse kinematics and second derivatives, in microseconds.
    pub kinematics_us: u64,
    /// Closure evaluation including any test filtering, in microseconds.
    pub closure_us: u64,
    /// Points flagged with near-zero strain in the true viscosity.
    pub flagged_strain_points: usize,
}

impl SnapshotMetrics {
    /// Sum of the individual stage timings.
    pub fn staged_us(&self) -> u64 {
        self.velocity_us + self.coarsen_us + self.kinematics_us + self.closure_us
    }
}
