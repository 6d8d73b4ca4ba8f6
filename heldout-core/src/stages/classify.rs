use crate::engine::Job;
use crate::model::rows::add_count;
use crate::model::{ClassStatRow, CorpusHalf, HalfCountRow, Trigram};

/// Grouping key of the classification stage.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClassKey {
	/// Global occurrence total and the per-trigram frequency class markers.
	Total,
	/// Pass-through of a trigram's own total count.
	TrigramTotal(Trigram),
	/// Trigrams whose `half` count equals `value`.
	TypeCount { half: CorpusHalf, value: u64 },
	/// Held-out `half` occurrences of the trigrams whose other-half count
	/// equals `value`.
	InstanceCount { half: CorpusHalf, value: u64 },
}

/// Values flowing into [`ClassKey`] groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassValue {
	/// Global occurrence total (or a partial sum of it).
	Occurrences(u64),
	/// One trigram has total count `r`.
	Marker(u64),
	/// A count to pass through or sum.
	Count(u64),
}

/// Stage 2: buckets trigrams into frequency classes and cross-tabulates the
/// two halves.
///
/// For a trigram with counts `(r, R0, R1)`:
/// - `R0 > 0` adds one type to `TYPE 0 R0` and `R1` instances to `INSTANCE 1 R0`
/// - `R1 > 0` adds one type to `TYPE 1 R1` and `R0` instances to `INSTANCE 0 R1`
/// - its own total `r` is passed through and marks class `r` as present
///
/// The global total is re-emitted once for every distinct `r`, which is how
/// the estimation stage receives it in each class it resolves.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClassifyJob;

fn sum_counts(values: &[ClassValue]) -> u64 {
	values
		.iter()
		.filter_map(|value| match value {
			ClassValue::Count(count) => Some(*count),
			other => {
				log::warn!("ignoring {other:?} in a statistics group");
				None
			}
		})
		.fold(0, add_count)
}

impl Job for ClassifyJob {
	type Input = HalfCountRow;
	type Key = ClassKey;
	type Value = ClassValue;
	type Output = ClassStatRow;

	fn map(&self, row: HalfCountRow, emit: &mut Vec<(ClassKey, ClassValue)>) {
		match row {
			HalfCountRow::Total(total) => emit.push((ClassKey::Total, ClassValue::Occurrences(total))),
			HalfCountRow::Counts { trigram, r, r0, r1 } => {
				emit.push((ClassKey::TrigramTotal(trigram), ClassValue::Count(r)));
				if r0 > 0 {
					emit.push((ClassKey::TypeCount { half: CorpusHalf::First, value: r0 }, ClassValue::Count(1)));
					emit.push((ClassKey::InstanceCount { half: CorpusHalf::Second, value: r0 }, ClassValue::Count(r1)));
				}
				if r1 > 0 {
					emit.push((ClassKey::TypeCount { half: CorpusHalf::Second, value: r1 }, ClassValue::Count(1)));
					emit.push((ClassKey::InstanceCount { half: CorpusHalf::First, value: r1 }, ClassValue::Count(r0)));
				}
				emit.push((ClassKey::Total, ClassValue::Marker(r)));
			}
		}
	}

	/// Sums statistics and partial totals, and collapses repeated class
	/// markers. Pass-through counts are left alone.
	///
	/// Markers are a set union: the global group receives one marker per
	/// distinct class and chunk, not one per trigram.
	fn combine(&self, key: &ClassKey, values: Vec<ClassValue>) -> Vec<ClassValue> {
		match key {
			ClassKey::TypeCount { .. } | ClassKey::InstanceCount { .. } => vec![ClassValue::Count(sum_counts(&values))],
			ClassKey::Total => {
				let mut occurrences = None;
				let mut markers = Vec::new();
				let mut others = Vec::new();
				for value in values {
					match value {
						ClassValue::Occurrences(count) => {
							occurrences = Some(add_count(occurrences.unwrap_or(0), count));
						}
						ClassValue::Marker(r) => markers.push(r),
						other => others.push(other),
					}
				}
				markers.sort_unstable();
				markers.dedup();

				let mut combined = Vec::with_capacity(markers.len() + others.len() + 1);
				combined.extend(occurrences.map(ClassValue::Occurrences));
				combined.extend(markers.into_iter().map(ClassValue::Marker));
				combined.extend(others);
				combined
			}
			ClassKey::TrigramTotal(_) => values,
		}
	}

	fn reduce(&self, key: ClassKey, values: Vec<ClassValue>, out: &mut Vec<ClassStatRow>) {
		match key {
			ClassKey::Total => reduce_total(values, out),
			ClassKey::TrigramTotal(trigram) => {
				if values.len() > 1 {
					log::debug!("trigram {trigram} seen {} times, keeping the first count", values.len());
				}
				match values.first() {
					Some(ClassValue::Count(r)) => out.push(ClassStatRow::TrigramTotal { trigram, r: *r }),
					other => log::warn!("ignoring {other:?} for trigram {trigram}"),
				}
			}
			ClassKey::TypeCount { half, value } => {
				out.push(ClassStatRow::TypeCount { half, value, count: sum_counts(&values) })
			}
			ClassKey::InstanceCount { half, value } => {
				out.push(ClassStatRow::InstanceCount { half, value, count: sum_counts(&values) })
			}
		}
	}
}

/// Two passes over the global group: first the occurrence total, then one
/// class row per distinct marker.
fn reduce_total(values: Vec<ClassValue>, out: &mut Vec<ClassStatRow>) {
	let mut total = 0u64;
	let mut classes = Vec::new();
	for value in values {
		match value {
			ClassValue::Occurrences(count) => total = add_count(total, count),
			ClassValue::Marker(r) => classes.push(r),
			ClassValue::Count(_) => log::warn!("ignoring stray count in the global group"),
		}
	}

	// Collapse repeated markers so each class gets the total exactly once
	classes.sort_unstable();
	classes.dedup();

	out.push(ClassStatRow::Total(total));
	out.extend(classes.into_iter().map(|class| ClassStatRow::ClassTotal { class, total }));
}
