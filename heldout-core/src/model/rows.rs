//! Typed output rows of each stage and their textual line format.
//!
//! Every row renders as `key \t value` and can be parsed back, so a stage
//! can be fed from the text output of the previous one. Keys starting with
//! `ALL`, `TYPE` or `INSTANCE` are reserved sentinels.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::half::CorpusHalf;
use super::trigram::Trigram;

const ALL: &str = "ALL";
const TYPE: &str = "TYPE";
const INSTANCE: &str = "INSTANCE";

/// Parses a non-negative count, logging and discarding unparsable values.
pub(crate) fn parse_count(field: &str, what: &str) -> Option<u64> {
	match field.trim().parse::<u64>() {
		Ok(value) => Some(value),
		Err(e) => {
			log::warn!("skipping {what} {field:?}: {e}");
			None
		}
	}
}

/// Adds two counts, saturating at `u64::MAX` with a warning instead of
/// overflowing.
pub(crate) fn add_count(total: u64, count: u64) -> u64 {
	total.checked_add(count).unwrap_or_else(|| {
		log::warn!("count overflow: {total} + {count}, saturating");
		u64::MAX
	})
}

fn parse_probability(field: &str) -> Option<f64> {
	match field.trim().parse::<f64>() {
		Ok(value) => Some(value),
		Err(e) => {
			log::warn!("skipping probability {field:?}: {e}");
			None
		}
	}
}

/// Splits `key \t value...` into the space-separated key words and the
/// remaining tab-separated fields.
fn split_line(line: &str) -> Option<(Vec<&str>, Vec<&str>)> {
	let mut fields = line.split('\t');
	let key = fields.next()?;
	let values: Vec<&str> = fields.collect();
	if values.is_empty() {
		return None;
	}
	Some((key.split(' ').collect(), values))
}

/// Stage 1 output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum HalfCountRow {
	/// `ALL \t occurrences`: every surviving occurrence in the corpus.
	Total(u64),
	/// `w1 w2 w3 \t r \t R0 \t R1`: per-half occurrence counts of one trigram.
	Counts {
		trigram: Trigram,
		/// Total count, always `r0 + r1`.
		r: u64,
		r0: u64,
		r1: u64,
	},
}

impl HalfCountRow {
	/// Builds a counts row, deriving `r` from the two halves.
	pub fn counts(trigram: Trigram, r0: u64, r1: u64) -> Self {
		HalfCountRow::Counts { trigram, r: add_count(r0, r1), r0, r1 }
	}

	/// Parses a Stage 1 output line.
	pub fn parse_line(line: &str) -> Option<Self> {
		let (key, values) = split_line(line)?;
		if key == [ALL] {
			return Some(HalfCountRow::Total(parse_count(values[0], "total")?));
		}
		let trigram = Trigram::parse(&key.join(" "))?;
		if values.len() < 3 {
			return None;
		}
		Some(HalfCountRow::Counts {
			trigram,
			r: parse_count(values[0], "r")?,
			r0: parse_count(values[1], "R0")?,
			r1: parse_count(values[2], "R1")?,
		})
	}
}

impl fmt::Display for HalfCountRow {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			HalfCountRow::Total(total) => write!(f, "{ALL}\t{total}"),
			HalfCountRow::Counts { trigram, r, r0, r1 } => write!(f, "{trigram}\t{r}\t{r0}\t{r1}"),
		}
	}
}

/// Stage 2 output: the frequency-class statistics tables.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ClassStatRow {
	/// `ALL ALL \t occurrences`.
	Total(u64),
	/// `ALL r \t occurrences`: one per distinct total count `r`, carrying the
	/// global occurrence total into that frequency class.
	ClassTotal { class: u64, total: u64 },
	/// `w1 w2 w3 \t r`: a trigram and its own total count.
	TrigramTotal { trigram: Trigram, r: u64 },
	/// `TYPE h v \t N`: number of trigrams whose half-`h` count is `v`.
	TypeCount { half: CorpusHalf, value: u64, count: u64 },
	/// `INSTANCE h v \t T`: summed half-`h` counts of the trigrams whose
	/// count in the other half is `v`.
	InstanceCount { half: CorpusHalf, value: u64, count: u64 },
}

impl ClassStatRow {
	/// Parses a Stage 2 output line.
	///
	/// `ALL`, `TYPE` and `INSTANCE` in first position are reserved on this
	/// text path: a trigram like `TYPE 0 5` reads back as a type count, and
	/// `TYPE x y` is dropped. The typed in-memory path has no such collision.
	pub fn parse_line(line: &str) -> Option<Self> {
		let (key, values) = split_line(line)?;
		let value = values[0];
		match key.as_slice() {
			[ALL, ALL] => Some(ClassStatRow::Total(parse_count(value, "total")?)),
			[ALL, class] => Some(ClassStatRow::ClassTotal {
				class: parse_count(class, "frequency class")?,
				total: parse_count(value, "total")?,
			}),
			[TYPE, half, class] => Some(ClassStatRow::TypeCount {
				half: CorpusHalf::parse(half)?,
				value: parse_count(class, "frequency class")?,
				count: parse_count(value, "type count")?,
			}),
			[INSTANCE, half, class] => Some(ClassStatRow::InstanceCount {
				half: CorpusHalf::parse(half)?,
				value: parse_count(class, "frequency class")?,
				count: parse_count(value, "instance count")?,
			}),
			_ => Some(ClassStatRow::TrigramTotal {
				trigram: Trigram::parse(&key.join(" "))?,
				r: parse_count(value, "r")?,
			}),
		}
	}
}

impl fmt::Display for ClassStatRow {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ClassStatRow::Total(total) => write!(f, "{ALL} {ALL}\t{total}"),
			ClassStatRow::ClassTotal { class, total } => write!(f, "{ALL} {class}\t{total}"),
			ClassStatRow::TrigramTotal { trigram, r } => write!(f, "{trigram}\t{r}"),
			ClassStatRow::TypeCount { half, value, count } => write!(f, "{TYPE} {half} {value}\t{count}"),
			ClassStatRow::InstanceCount { half, value, count } => write!(f, "{INSTANCE} {half} {value}\t{count}"),
		}
	}
}

/// Stage 3 output: one smoothed probability per trigram.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Estimate {
	pub trigram: Trigram,
	pub probability: f64,
}

impl Estimate {
	/// Parses a `w1 w2 w3 \t probability` line.
	pub fn parse_line(line: &str) -> Option<Self> {
		let (key, values) = split_line(line)?;
		let trigram = Trigram::parse(&key.join(" "))?;
		let probability = parse_probability(values[0])?;
		Some(Self { trigram, probability })
	}
}

impl fmt::Display for Estimate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}\t{}", self.trigram, self.probability)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counts_saturate_instead_of_overflowing() {
		assert_eq!(add_count(2, 3), 5);
		assert_eq!(add_count(u64::MAX - 1, 5), u64::MAX);
		let row = HalfCountRow::counts(Trigram::new("a", "b", "c"), u64::MAX, 1);
		assert!(matches!(row, HalfCountRow::Counts { r: u64::MAX, .. }));
	}

	#[test]
	fn reserved_words_shadow_trigrams_in_text() {
		let row = ClassStatRow::TrigramTotal { trigram: Trigram::new("TYPE", "0", "5"), r: 2 };
		assert_eq!(
			ClassStatRow::parse_line(&row.to_string()),
			Some(ClassStatRow::TypeCount { half: CorpusHalf::First, value: 5, count: 2 })
		);
		assert_eq!(ClassStatRow::parse_line("TYPE x y\t2"), None);
		assert_eq!(
			ClassStatRow::parse_line("TYPEWRITER x y\t2"),
			Some(ClassStatRow::TrigramTotal { trigram: Trigram::new("TYPEWRITER", "x", "y"), r: 2 })
		);
	}

	#[test]
	fn half_count_lines() {
		let row = HalfCountRow::counts(Trigram::new("dog", "run", "fast"), 10, 0);
		assert_eq!(row.to_string(), "dog run fast\t10\t10\t0");
		assert_eq!(HalfCountRow::parse_line(&row.to_string()), Some(row));
		assert_eq!(HalfCountRow::parse_line("ALL\t15"), Some(HalfCountRow::Total(15)));
		assert_eq!(HalfCountRow::parse_line("dog run fast\t10"), None);
		assert_eq!(HalfCountRow::parse_line("ALL"), None);
	}

	#[test]
	fn class_stat_lines() {
		let lines = [
			"ALL ALL\t15",
			"ALL 10\t15",
			"dog run fast\t10",
			"TYPE 0 10\t1",
			"INSTANCE 1 10\t0",
		];
		for line in lines {
			let row = ClassStatRow::parse_line(line).unwrap();
			assert_eq!(row.to_string(), line);
		}
		assert_eq!(
			ClassStatRow::parse_line("TYPE 1 5\t2"),
			Some(ClassStatRow::TypeCount { half: CorpusHalf::Second, value: 5, count: 2 })
		);
	}

	#[test]
	fn unparsable_values_are_skipped() {
		assert_eq!(ClassStatRow::parse_line("TYPE 0 10\tmany"), None);
		assert_eq!(ClassStatRow::parse_line("TYPE 2 10\t1"), None);
		assert_eq!(Estimate::parse_line("dog run fast\tlikely"), None);
	}

	#[test]
	fn estimate_lines() {
		let estimate = Estimate { trigram: Trigram::new("dog", "run", "fast"), probability: 0.25 };
		assert_eq!(estimate.to_string(), "dog run fast\t0.25");
		assert_eq!(Estimate::parse_line("dog run fast\t0.25"), Some(estimate));
		let zero = Estimate { trigram: Trigram::new("a", "b", "c"), probability: 0.0 };
		assert_eq!(zero.to_string(), "a b c\t0");
	}
}
