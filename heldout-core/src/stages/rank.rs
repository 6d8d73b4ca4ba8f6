use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::engine::Job;
use crate::model::{Estimate, Trigram};

/// Sort key of the ranking stage.
///
/// Orders by prefix `(w1, w2)` ascending, then probability descending, then
/// `w3` ascending so ties come out in a reproducible order.
#[derive(Clone, Debug)]
pub struct RankKey {
	pub w1: String,
	pub w2: String,
	pub probability: f64,
	pub w3: String,
}

impl From<Estimate> for RankKey {
	fn from(estimate: Estimate) -> Self {
		let [w1, w2, w3] = estimate.trigram.into_words();
		Self { w1, w2, probability: estimate.probability, w3 }
	}
}

impl Ord for RankKey {
	fn cmp(&self, other: &Self) -> Ordering {
		self.w1
			.cmp(&other.w1)
			.then_with(|| self.w2.cmp(&other.w2))
			.then_with(|| other.probability.total_cmp(&self.probability))
			.then_with(|| self.w3.cmp(&other.w3))
	}
}

impl PartialOrd for RankKey {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl PartialEq for RankKey {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for RankKey {}

impl Hash for RankKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.w1.hash(state);
		self.w2.hash(state);
		self.probability.to_bits().hash(state);
		self.w3.hash(state);
	}
}

/// Stage 4: orders completions per prefix by descending probability.
///
/// Runs on a single partition so the whole output comes out as one sorted
/// sequence.
#[derive(Clone, Copy, Debug, Default)]
pub struct RankJob;

impl Job for RankJob {
	type Input = Estimate;
	type Key = RankKey;
	type Value = ();
	type Output = Estimate;

	fn map(&self, estimate: Estimate, emit: &mut Vec<(RankKey, ())>) {
		emit.push((RankKey::from(estimate), ()));
	}

	fn single_partition(&self) -> bool {
		true
	}

	fn reduce(&self, key: RankKey, values: Vec<()>, out: &mut Vec<Estimate>) {
		for _ in values {
			out.push(Estimate {
				trigram: Trigram::new(key.w1.as_str(), key.w2.as_str(), key.w3.as_str()),
				probability: key.probability,
			});
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::Engine;

	fn estimate(text: &str, probability: f64) -> Estimate {
		Estimate { trigram: Trigram::parse(text).unwrap(), probability }
	}

	#[test]
	fn ranks_per_prefix() {
		let input = vec![
			estimate("big dog runs", 0.1),
			estimate("red car stops", 0.0),
			estimate("big dog barks", 0.5),
			estimate("big dog sleeps", 0.1),
			estimate("big cat naps", 0.2),
		];
		let ranked = Engine::new(4, true).run(&RankJob, input).unwrap();
		let lines: Vec<String> = ranked.iter().map(ToString::to_string).collect();
		assert_eq!(
			lines,
			vec![
				"big cat naps\t0.2",
				"big dog barks\t0.5",
				"big dog runs\t0.1",
				"big dog sleeps\t0.1",
				"red car stops\t0",
			]
		);
	}

	#[test]
	fn key_ordering() {
		let high = RankKey::from(estimate("a b z", 0.9));
		let low = RankKey::from(estimate("a b a", 0.1));
		assert!(high < low);
		assert_eq!(high.clone(), high);
		assert!(RankKey::from(estimate("a b c", 0.5)) < RankKey::from(estimate("a b d", 0.5)));
	}
}
