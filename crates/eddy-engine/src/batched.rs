//! Batch runs over every snapshot of a configuration.
//!
//! [`Analyzer::run`] processes snapshots in index order on the calling
//! thread. [`Analyzer::run_parallel`] fans snapshots out over the rayon
//! pool and funnels finished results through a bounded crossbeam channel
//! back to the calling thread, which alone touches the sink.
//!
//! In both modes a failing snapshot is logged and recorded in the
//! [`RunReport`]; the batch always continues.

use std::thread;
use std::time::Instant;

use log::{info, warn};
use rayon::prelude::*;

use eddy_core::SnapshotSource;

use crate::analyzer::Analyzer;
use crate::metrics::SnapshotMetrics;
use crate::result::{ResultSink, SnapshotError, SnapshotResult};

/// Results in flight between workers and the sink. Bounds memory when
/// the sink is slower than the analysis.
const CHANNEL_CAPACITY: usize = 4;

// ── RunReport ──────────────────────────────────────────────────────

/// Outcome of a batch run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReport {
    /// Indices stored by the sink, ascending.
    pub processed: Vec<usize>,
    /// Snapshots that failed, ascending by index.
    pub failures: Vec<SnapshotError>,
    /// Metrics of every processed snapshot, ascending by index.
    pub metrics: Vec<(usize, SnapshotMetrics)>,
    /// Wall-clock time of the whole run, in microseconds.
    pub total_us: u64,
}

impl RunReport {
    /// True if every snapshot was processed and stored.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Indices of the failed snapshots.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(SnapshotError::index).collect()
    }

    fn record(
        &mut self,
        sink: &mut (impl ResultSink + ?Sized),
        index: usize,
        outcome: Result<SnapshotResult, SnapshotError>,
    ) {
        let outcome = outcome.and_then(|result| {
            let metrics = result.metrics.clone();
            sink.persist(result)
                .map(|()| metrics)
                .map_err(|error| SnapshotError::Persist { index, error })
        });
        match outcome {
            Ok(metrics) => {
                self.processed.push(index);
                self.metrics.push((index, metrics));
            }
            Err(e) => {
                warn!("skipping {e}");
                self.failures.push(e);
            }
        }
    }

    fn finish(&mut self, start: Instant) {
        self.processed.sort_unstable();
        self.metrics.sort_by_key(|(i, _)| *i);
        self.failures.sort_by_key(SnapshotError::index);
        self.total_us = start.elapsed().as_micros() as u64;
        info!(
            "run finished: {} processed, {} failed in {}us",
            self.processed.len(),
            self.failures.len(),
            self.total_us
        );
    }
}

// ── Runners ────────────────────────────────────────────────────────

impl Analyzer {
    /// Load and analyze one snapshot.
    pub fn process(
        &self,
        source: &(impl SnapshotSource + ?Sized),
        index: usize,
    ) -> Result<SnapshotResult, SnapshotError> {
        let snapshot = source
            .load(index)
            .map_err(|error| SnapshotError::Load { index, error })?;
        self.analyze(&snapshot)
            .map_err(|error| SnapshotError::Analysis { index, error })
    }

    /// Process every configured snapshot sequentially.
    pub fn run(
        &self,
        source: &(impl SnapshotSource + ?Sized),
        sink: &mut (impl ResultSink + ?Sized),
    ) -> RunReport {
        let start = Instant::now();
        info!(
            "run started: {} snapshots, {} -> {}, {}",
            self.config().snapshot_count,
            self.config().fine,
            self.config().coarse,
            self.config().closure.model
        );
        let mut report = RunReport::default();
        for index in self.config().snapshot_indices() {
            let outcome = self.process(source, index);
            report.record(sink, index, outcome);
        }
        report.finish(start);
        report
    }

    /// Process every configured snapshot on the rayon pool.
    ///
    /// Results reach `sink` in completion order, on the calling thread.
    pub fn run_parallel(
        &self,
        source: &(impl SnapshotSource + ?Sized),
        sink: &mut (impl ResultSink + ?Sized),
    ) -> RunReport {
        let start = Instant::now();
        info!(
            "parallel run started: {} snapshots on {} threads",
            self.config().snapshot_count,
            rayon::current_num_threads()
        );
        let mut report = RunReport::default();
        let (tx, rx) = crossbeam_channel::bounded(CHANNEL_CAPACITY);
        let indices = self.config().snapshot_indices();

        thread::scope(|scope| {
            scope.spawn(move || {
                indices.into_par_iter().for_each_with(tx, |tx, index| {
                    let outcome = self.process(source, index);
                    if tx.send((index, outcome)).is_err() {
                        warn!("snapshot {index}: result receiver closed");
                    }
                });
            });
            for (index, outcome) in rx {
                report.record(sink, index, outcome);
            }
        });

        report.finish(start);
        report
    }
}
