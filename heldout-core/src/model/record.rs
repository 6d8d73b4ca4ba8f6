use serde::{Deserialize, Serialize};

use super::rows::parse_count;
use super::trigram::Trigram;

/// One line of the raw corpus, reduced to what the estimator needs.
///
/// Input lines look like `w1 w2 w3 \t year \t count \t pages \t books`;
/// only the trigram and the occurrence count are kept.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OccurrenceRecord {
	/// The trigram read from the first field.
	pub trigram: Trigram,
	/// Occurrence count from the third field.
	pub count: u64,
	/// Zero-based index of the line in its input.
	pub source_line: u64,
}

impl OccurrenceRecord {
	/// Parses a raw corpus line.
	///
	/// Returns `None` for lines with fewer than three tab-separated fields or
	/// fewer than three words in the trigram field; those are filtered, not
	/// reported. A count that is not a number is logged and the line skipped.
	pub fn parse_line(source_line: u64, line: &str) -> Option<Self> {
		let fields: Vec<&str> = line.split('\t').collect();
		if fields.len() < 3 {
			return None;
		}
		let trigram = Trigram::parse(fields[0])?;
		let count = parse_count(fields[2], "occurrence count")?;
		Some(Self { trigram, count, source_line })
	}
}
