use crate::engine::Job;
use crate::model::rows::add_count;
use crate::model::{ClassStatRow, CorpusHalf, Estimate, Trigram};

/// Everything that lands in one frequency-class group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassEvidence {
	/// Global occurrence total `N`.
	Occurrences(u64),
	/// `N_v_h`: types whose `half` count is the class value.
	Types { half: CorpusHalf, count: u64 },
	/// `T_v_h`: held-out instances in `half`.
	Instances { half: CorpusHalf, count: u64 },
	/// A trigram whose own total count is the class value.
	Trigram(Trigram),
}

/// Per-class accumulator: `N`, `N0`, `N1`, `T0`, `T1`.
///
/// Lives for one reduce group only.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClassStats {
	pub occurrences: u64,
	pub types: [u64; 2],
	pub instances: [u64; 2],
}

impl ClassStats {
	/// Folds one statistics value in. Trigram values are ignored.
	pub fn absorb(&mut self, evidence: &ClassEvidence) {
		match evidence {
			ClassEvidence::Occurrences(total) => self.occurrences = *total,
			ClassEvidence::Types { half, count } => {
				self.types[half.index()] = add_count(self.types[half.index()], *count);
			}
			ClassEvidence::Instances { half, count } => {
				self.instances[half.index()] = add_count(self.instances[half.index()], *count);
			}
			ClassEvidence::Trigram(_) => (),
		}
	}

	/// Held-out estimate `(T0 + T1) / (N * (N0 + N1))`.
	///
	/// Defined as `0` when `N == 0` or `N0 + N1 == 0`.
	pub fn probability(&self) -> f64 {
		let n = self.occurrences as f64;
		let types = self.types[0] as f64 + self.types[1] as f64;
		if n == 0.0 || types == 0.0 {
			return 0.0;
		}
		let instances = self.instances[0] as f64 + self.instances[1] as f64;
		instances / (n * types)
	}
}

/// Stage 3: joins the class statistics onto each trigram and computes its
/// smoothed probability.
///
/// Every row is re-keyed by its frequency-class value. Statistics tables are
/// keyed by half-specific counts while trigrams are keyed by their total
/// count `r = R0 + R1`, so a trigram only meets statistics built from
/// trigrams whose count in one half equals its own total.
#[derive(Clone, Copy, Debug, Default)]
pub struct EstimateJob;

impl Job for EstimateJob {
	type Input = ClassStatRow;
	type Key = u64;
	type Value = ClassEvidence;
	type Output = Estimate;

	fn map(&self, row: ClassStatRow, emit: &mut Vec<(u64, ClassEvidence)>) {
		match row {
			// Each class already carries the total through its ClassTotal row
			ClassStatRow::Total(_) => (),
			ClassStatRow::ClassTotal { class, total } => emit.push((class, ClassEvidence::Occurrences(total))),
			ClassStatRow::TrigramTotal { trigram, r } => emit.push((r, ClassEvidence::Trigram(trigram))),
			ClassStatRow::TypeCount { half, value, count } => emit.push((value, ClassEvidence::Types { half, count })),
			ClassStatRow::InstanceCount { half, value, count } => {
				emit.push((value, ClassEvidence::Instances { half, count }))
			}
		}
	}

	/// Statistics first, trigrams second: the group is buffered so arrival
	/// order does not matter.
	fn reduce(&self, class: u64, values: Vec<ClassEvidence>, out: &mut Vec<Estimate>) {
		let mut stats = ClassStats::default();
		for value in &values {
			stats.absorb(value);
		}

		let probability = stats.probability();
		log::trace!("class {class}: {stats:?} -> {probability}");
		out.extend(values.into_iter().filter_map(|value| match value {
			ClassEvidence::Trigram(trigram) => Some(Estimate { trigram, probability }),
			_ => None,
		}));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::Engine;

	#[test]
	fn probability_formula() {
		let stats = ClassStats { occurrences: 100, types: [2, 3], instances: [4, 6] };
		assert!((stats.probability() - 10.0 / 500.0).abs() < 1e-12);
	}

	#[test]
	fn probability_is_zero_without_evidence() {
		assert_eq!(ClassStats::default().probability(), 0.0);
		let no_types = ClassStats { occurrences: 10, types: [0, 0], instances: [3, 3] };
		assert_eq!(no_types.probability(), 0.0);
		let no_total = ClassStats { occurrences: 0, types: [1, 1], instances: [3, 3] };
		assert_eq!(no_total.probability(), 0.0);
	}

	#[test]
	fn joins_statistics_by_class() {
		let rows = vec![
			ClassStatRow::Total(20),
			ClassStatRow::ClassTotal { class: 2, total: 20 },
			ClassStatRow::TrigramTotal { trigram: Trigram::new("a", "b", "c"), r: 2 },
			ClassStatRow::TrigramTotal { trigram: Trigram::new("a", "b", "d"), r: 2 },
			ClassStatRow::TypeCount { half: CorpusHalf::First, value: 2, count: 3 },
			ClassStatRow::TypeCount { half: CorpusHalf::Second, value: 2, count: 1 },
			ClassStatRow::InstanceCount { half: CorpusHalf::First, value: 2, count: 4 },
			ClassStatRow::InstanceCount { half: CorpusHalf::Second, value: 2, count: 4 },
			// Statistics for a class no trigram belongs to produce nothing
			ClassStatRow::TypeCount { half: CorpusHalf::First, value: 7, count: 1 },
		];

		let mut estimates = Engine::new(2, true).run(&EstimateJob, rows).unwrap();
		estimates.sort_by(|a, b| a.trigram.cmp(&b.trigram));
		let expected = 8.0 / (20.0 * 4.0);
		assert_eq!(estimates.len(), 2);
		for estimate in &estimates {
			assert!((estimate.probability - expected).abs() < 1e-12);
		}
	}

	#[test]
	fn trigram_rows_before_statistics_still_resolve() {
		let rows = vec![
			ClassStatRow::TrigramTotal { trigram: Trigram::new("a", "b", "c"), r: 3 },
			ClassStatRow::InstanceCount { half: CorpusHalf::Second, value: 3, count: 6 },
			ClassStatRow::TypeCount { half: CorpusHalf::First, value: 3, count: 2 },
			ClassStatRow::ClassTotal { class: 3, total: 10 },
		];
		let estimates = Engine::new(1, false).run(&EstimateJob, rows).unwrap();
		assert_eq!(estimates, vec![Estimate { trigram: Trigram::new("a", "b", "c"), probability: 6.0 / 20.0 }]);
	}
}
