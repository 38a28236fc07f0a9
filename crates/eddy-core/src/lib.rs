//! Core types and traits for the eddy subgrid-scale analysis workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the workspace: grid
//! sizes and domain geometry, the wrapped [`PeriodicField`], symmetric
//! tensor fields, error types, and the snapshot-source trait through
//! which raw DNS fields enter the pipeline.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod grid;
pub mod tensor;
pub mod traits;

pub use error::{ConfigError, SgsError};
pub use field::PeriodicField;
pub use grid::{Domain, GridSize};
pub use tensor::SymmetricTensor;
pub use traits::{Snapshot, SnapshotSource, SourceError};
