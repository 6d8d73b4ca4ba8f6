//! Data model shared by all stages.
//!
//! - `Trigram`: the ordered word triple being estimated
//! - `OccurrenceRecord`: one parsed corpus line
//! - `CorpusHalf` and `HalfAssigner`: the held-out split
//! - typed stage rows (`HalfCountRow`, `ClassStatRow`, `Estimate`)
//! - `Rankings`: per-prefix completions, the pipeline's final product

/// Ordered word triple.
pub mod trigram;

/// Raw corpus line parsing.
pub mod record;

/// Corpus halves and the split strategies.
pub mod half;

/// Stage output rows and their line format.
pub mod rows;

/// Per-prefix completion rankings and snapshots.
pub mod rankings;

pub use half::{ConfiguredSplitter, CorpusHalf, HalfAssigner, RandomSplitter, SeededSplitter};
pub use rankings::{BigramGroup, Completion, Rankings};
pub use record::OccurrenceRecord;
pub use rows::{ClassStatRow, Estimate, HalfCountRow};
pub use trigram::Trigram;
