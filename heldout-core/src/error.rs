//! Error types for the held-out estimation pipeline.
//!
//! Aggregation logic never fails: malformed records are filtered and
//! unparsable values are skipped. Errors only come from the edges
//! (file I/O, snapshots, options, worker threads).

/// Errors from held-out pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum HeldOutError {
	/// I/O error while reading a corpus or writing stage output.
	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// Rankings snapshot could not be encoded or decoded.
	#[error("snapshot codec error: {0}")]
	Snapshot(#[from] postcard::Error),

	/// Pipeline options are out of range.
	#[error("invalid options: {0}")]
	InvalidOptions(String),

	/// A map or reduce worker panicked.
	#[error("{phase} worker {index} panicked")]
	WorkerPanicked {
		/// `"map"` or `"reduce"`.
		phase: &'static str,
		/// Chunk or partition index handled by the worker.
		index: usize,
	},
}

/// Result type for held-out pipeline operations.
pub type HeldOutResult<T> = Result<T, HeldOutError>;
