//! The four estimation stages, each a [`Job`](crate::engine::Job).
//!
//! Data flows strictly forward:
//! `CountJob` → `ClassifyJob` → `EstimateJob` → `RankJob`.

/// Stage 1: corpus split and per-half occurrence counts.
pub mod count;

/// Stage 2: frequency classes and type / instance cross-tabulation.
pub mod classify;

/// Stage 3: per-trigram held-out probability.
pub mod estimate;

/// Stage 4: per-prefix completion ranking.
pub mod rank;

pub use classify::ClassifyJob;
pub use count::CountJob;
pub use estimate::{ClassStats, EstimateJob};
pub use rank::RankJob;
