use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::record::OccurrenceRecord;

/// One of the two corpus halves used for held-out estimation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CorpusHalf {
	/// Half `0`.
	First,
	/// Half `1`.
	Second,
}

impl CorpusHalf {
	/// Both halves, in label order.
	pub const BOTH: [CorpusHalf; 2] = [CorpusHalf::First, CorpusHalf::Second];

	/// Returns the numeric label (`0` or `1`).
	pub fn index(self) -> usize {
		match self {
			CorpusHalf::First => 0,
			CorpusHalf::Second => 1,
		}
	}

	/// Returns the opposite half.
	pub fn other(self) -> Self {
		match self {
			CorpusHalf::First => CorpusHalf::Second,
			CorpusHalf::Second => CorpusHalf::First,
		}
	}

	/// Parses a numeric label. Only `"0"` and `"1"` are accepted.
	pub fn parse(label: &str) -> Option<Self> {
		match label {
			"0" => Some(CorpusHalf::First),
			"1" => Some(CorpusHalf::Second),
			_ => None,
		}
	}
}

impl fmt::Display for CorpusHalf {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.index())
	}
}

/// Assigns each occurrence record to a corpus half.
///
/// This is the only source of randomness in the pipeline. The same trigram
/// seen on several input lines may land in different halves: the split is
/// over occurrences, not over trigram identities.
///
/// Any `Fn(&OccurrenceRecord) -> CorpusHalf` closure is an assigner, which
/// is how tests inject a fixed split.
pub trait HalfAssigner: Sync {
	/// Picks the half for one record.
	fn assign(&self, record: &OccurrenceRecord) -> CorpusHalf;
}

impl<F> HalfAssigner for F
where
	F: Fn(&OccurrenceRecord) -> CorpusHalf + Sync,
{
	fn assign(&self, record: &OccurrenceRecord) -> CorpusHalf {
		self(record)
	}
}

/// Unbiased coin flip on the thread-local generator.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomSplitter;

impl HalfAssigner for RandomSplitter {
	fn assign(&self, _record: &OccurrenceRecord) -> CorpusHalf {
		coin_to_half(rand::rng().random_bool(0.5))
	}
}

/// Reproducible coin flip derived from a seed and the record's source line.
///
/// The draw only depends on `(seed, source_line)`, so the split is the same
/// whatever the number of workers or the chunking of the input.
#[derive(Clone, Copy, Debug)]
pub struct SeededSplitter {
	seed: u64,
}

impl SeededSplitter {
	/// Creates a splitter for the given seed.
	pub fn new(seed: u64) -> Self {
		Self { seed }
	}
}

impl HalfAssigner for SeededSplitter {
	fn assign(&self, record: &OccurrenceRecord) -> CorpusHalf {
		let stream = self.seed ^ record.source_line.wrapping_mul(0x9E37_79B9_7F4A_7C15);
		coin_to_half(StdRng::seed_from_u64(stream).random_bool(0.5))
	}
}

/// Split strategy picked from an optional seed.
///
/// - `Some(seed)` gives a [`SeededSplitter`]
/// - `None` gives a [`RandomSplitter`]
#[derive(Clone, Copy, Debug)]
pub enum ConfiguredSplitter {
	/// Fresh coin flips on every run.
	Random(RandomSplitter),
	/// Coin flips reproducible from a seed.
	Seeded(SeededSplitter),
}

impl From<Option<u64>> for ConfiguredSplitter {
	fn from(seed: Option<u64>) -> Self {
		match seed {
			Some(seed) => ConfiguredSplitter::Seeded(SeededSplitter::new(seed)),
			None => ConfiguredSplitter::Random(RandomSplitter),
		}
	}
}

impl HalfAssigner for ConfiguredSplitter {
	fn assign(&self, record: &OccurrenceRecord) -> CorpusHalf {
		match self {
			ConfiguredSplitter::Random(splitter) => splitter.assign(record),
			ConfiguredSplitter::Seeded(splitter) => splitter.assign(record),
		}
	}
}

fn coin_to_half(heads: bool) -> CorpusHalf {
	if heads { CorpusHalf::Second } else { CorpusHalf::First }
}
