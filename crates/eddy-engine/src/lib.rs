//! A-priori SGS analysis orchestration.
//!
//! Turns a stream of fine-grid DNS snapshots into per-snapshot
//! coarse-grid SGS analyses. The [`Analyzer`] is configured once from an
//! [`AnalysisConfig`] (or the ordered [`RunParameters`]) and then
//! processes snapshots sequentially ([`Analyzer::run`]) or across the
//! rayon pool ([`Analyzer::run_parallel`]), handing each
//! [`SnapshotResult`] to a caller-supplied [`ResultSink`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod analyzer;
pub mod batched;
pub mod config;
pub mod metrics;
pub mod result;

pub use analyzer::Analyzer;
pub use batched::RunReport;
pub use config::{AnalysisConfig, RunParameters};
pub use metrics::SnapshotMetrics;
pub use result::{ResultSink, SinkError, SnapshotError, SnapshotResult, VecSink};
