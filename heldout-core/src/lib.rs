//! Held-out trigram probability estimation.
//!
//! This crate turns a large trigram corpus into smoothed probabilities and
//! per-prefix completion rankings:
//! - The corpus is split into two random halves
//! - Trigrams are bucketed into frequency classes per half
//! - Type and instance counts are cross-tabulated between the halves
//! - Each trigram gets a held-out probability from its class statistics
//! - Completions are ranked per two-word prefix
//!
//! The four stages are written as map / combine / reduce jobs and run on a
//! local multi-threaded grouping engine.

/// Error and result types.
pub mod error;

/// Shared data model: trigrams, corpus halves, stage rows, rankings.
pub mod model;

/// Fixed stopword vocabulary used at ingestion.
pub mod stopwords;

/// Local map / combine / reduce engine.
pub mod engine;

/// The four estimation stages.
pub mod stages;

/// Stage chaining, options and run summary.
pub mod pipeline;

/// I/O utilities (line files, output paths).
pub mod io;

pub use error::{HeldOutError, HeldOutResult};
pub use pipeline::{HeldOutPipeline, PipelineOptions, PipelineRun, PipelineSummary};
