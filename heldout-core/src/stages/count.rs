use crate::engine::Job;
use crate::model::rows::add_count;
use crate::model::{CorpusHalf, HalfAssigner, HalfCountRow, OccurrenceRecord, Trigram};
use crate::stopwords::StopwordFilter;

/// Grouping key of the counting stage.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CountKey {
	/// Global occurrence total.
	All,
	Trigram(Trigram),
}

/// Values flowing into [`CountKey`] groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountValue {
	/// Occurrences contributing to the global total.
	Occurrences(u64),
	/// Occurrences of one trigram assigned to one half.
	Half { count: u64, half: CorpusHalf },
}

/// Stage 1: splits the corpus and counts occurrences per trigram and half.
///
/// # Input
/// `(line number, raw corpus line)`
///
/// # Output
/// - one [`HalfCountRow::Total`] with every surviving occurrence
/// - one [`HalfCountRow::Counts`] per surviving trigram
///
/// Lines that do not parse and trigrams with a stopword are dropped.
pub struct CountJob<'a, A: HalfAssigner> {
	stopwords: &'a StopwordFilter,
	assigner: &'a A,
}

impl<'a, A: HalfAssigner> CountJob<'a, A> {
	/// Creates a job dropping trigrams caught by `stopwords` and splitting
	/// occurrences with `assigner`.
	pub fn new(stopwords: &'a StopwordFilter, assigner: &'a A) -> Self {
		Self { stopwords, assigner }
	}
}

/// Sums occurrence values, ignoring values of the wrong kind.
fn sum_occurrences(values: &[CountValue]) -> u64 {
	values
		.iter()
		.filter_map(|value| match value {
			CountValue::Occurrences(count) => Some(*count),
			CountValue::Half { .. } => {
				log::warn!("ignoring per-half value in the global total");
				None
			}
		})
		.fold(0, add_count)
}

/// Sums per-half values into `[R0, R1]`.
fn sum_halves(values: &[CountValue]) -> [u64; 2] {
	let mut sums = [0u64; 2];
	for value in values {
		match value {
			CountValue::Half { count, half } => sums[half.index()] = add_count(sums[half.index()], *count),
			CountValue::Occurrences(_) => log::warn!("ignoring global total value in a trigram group"),
		}
	}
	sums
}

impl<A: HalfAssigner> Job for CountJob<'_, A> {
	type Input = (u64, String);
	type Key = CountKey;
	type Value = CountValue;
	type Output = HalfCountRow;

	fn map(&self, (line_number, line): Self::Input, emit: &mut Vec<(CountKey, CountValue)>) {
		let Some(record) = OccurrenceRecord::parse_line(line_number, &line) else {
			return;
		};
		if !self.stopwords.admits(&record.trigram) {
			return;
		}

		let half = self.assigner.assign(&record);
		emit.push((CountKey::All, CountValue::Occurrences(record.count)));
		emit.push((CountKey::Trigram(record.trigram), CountValue::Half { count: record.count, half }));
	}

	/// Pre-sums the global total, and folds per-trigram values into one
	/// `(R0, half 0)` and one `(R1, half 1)` value.
	fn combine(&self, key: &CountKey, values: Vec<CountValue>) -> Vec<CountValue> {
		match key {
			CountKey::All => vec![CountValue::Occurrences(sum_occurrences(&values))],
			CountKey::Trigram(_) => {
				let [r0, r1] = sum_halves(&values);
				vec![
					CountValue::Half { count: r0, half: CorpusHalf::First },
					CountValue::Half { count: r1, half: CorpusHalf::Second },
				]
			}
		}
	}

	fn reduce(&self, key: CountKey, values: Vec<CountValue>, out: &mut Vec<HalfCountRow>) {
		match key {
			CountKey::All => out.push(HalfCountRow::Total(sum_occurrences(&values))),
			CountKey::Trigram(trigram) => {
				let [r0, r1] = sum_halves(&values);
				out.push(HalfCountRow::counts(trigram, r0, r1));
			}
		}
	}
}
