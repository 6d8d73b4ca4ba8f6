//! In-process grouping engine.
//!
//! Stages are written against the [`Job`] trait: `map` turns one input into
//! keyed values, an optional `combine` pre-aggregates values per key inside a
//! map chunk, `partition` routes keys, and `reduce` turns one key and all of
//! its values into output rows.
//!
//! [`Engine`] runs a job on local threads:
//! 1. inputs are cut into `workers * CHUNK_FACTOR` chunks, each mapped on its
//!    own thread and grouped per partition
//! 2. partial groups are merged in chunk order, so the values of a key always
//!    arrive in the same order (chunk order, then emission order)
//! 3. partitions are reduced in parallel and concatenated in partition order,
//!    keys ascending within a partition

use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::mpsc;
use std::thread;

use crate::error::{HeldOutError, HeldOutResult};

/// Number of map chunks per worker.
const CHUNK_FACTOR: usize = 8;

/// Values grouped by key, in key order.
type Groups<K, V> = BTreeMap<K, Vec<V>>;

/// A map / combine / reduce step.
///
/// # Invariants
/// - `combine` must be associative and commutative over the values it folds:
///   running with or without it has to produce the same output
/// - `reduce` only keeps state for the key it is given
pub trait Job: Sync {
	type Input: Send;
	type Key: Ord + Hash + Send;
	type Value: Send;
	type Output: Send;

	/// Emits zero or more `(key, value)` pairs for one input.
	fn map(&self, input: Self::Input, emit: &mut Vec<(Self::Key, Self::Value)>);

	/// Pre-aggregates the values of one key within a map chunk.
	///
	/// Defaults to passing the values through.
	fn combine(&self, _key: &Self::Key, values: Vec<Self::Value>) -> Vec<Self::Value> {
		values
	}

	/// Routes a key to one of `partitions` reducers.
	fn partition(&self, key: &Self::Key, partitions: usize) -> usize {
		let mut hasher = DefaultHasher::new();
		key.hash(&mut hasher);
		(hasher.finish() % partitions as u64) as usize
	}

	/// Forces every key through a single reducer, giving one global order.
	fn single_partition(&self) -> bool {
		false
	}

	/// Produces output rows for one key and all of its values.
	fn reduce(&self, key: Self::Key, values: Vec<Self::Value>, out: &mut Vec<Self::Output>);
}

/// Runs [`Job`]s on a fixed number of local worker threads.
#[derive(Clone, Copy, Debug)]
pub struct Engine {
	workers: usize,
	combine: bool,
}

impl Default for Engine {
	/// One worker per CPU, combiner enabled.
	fn default() -> Self {
		Self::new(num_cpus::get(), true)
	}
}

impl Engine {
	/// Creates an engine. `workers` is clamped to at least 1.
	pub fn new(workers: usize, combine: bool) -> Self {
		Self { workers: workers.max(1), combine }
	}

	/// Number of workers (and of reduce partitions).
	pub fn workers(&self) -> usize {
		self.workers
	}

	/// Whether `Job::combine` runs after each map chunk.
	pub fn combine(&self) -> bool {
		self.combine
	}

	/// Runs `job` over `inputs` and returns all reducer outputs.
	///
	/// # Errors
	/// Returns [`HeldOutError::WorkerPanicked`] if a map or reduce worker panics.
	pub fn run<J: Job>(&self, job: &J, inputs: Vec<J::Input>) -> HeldOutResult<Vec<J::Output>> {
		let partitions = if job.single_partition() { 1 } else { self.workers };
		let grouped = self.map_phase(job, inputs, partitions)?;
		Self::reduce_phase(job, grouped)
	}

	/// Maps every chunk on its own thread and merges the partial groups.
	fn map_phase<J: Job>(
		&self,
		job: &J,
		inputs: Vec<J::Input>,
		partitions: usize,
	) -> HeldOutResult<Vec<Groups<J::Key, J::Value>>> {
		let chunks = self.split_chunks(inputs);

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| -> HeldOutResult<()> {
			let mut handles = Vec::with_capacity(chunks.len());
			for (index, chunk) in chunks.into_iter().enumerate() {
				let tx = tx.clone();
				handles.push(scope.spawn(move || {
					let partial = self.map_chunk(job, chunk, partitions);
					if tx.send((index, partial)).is_err() {
						log::error!("map chunk {index}: collector is gone");
					}
				}));
			}
			// Every handle must be joined before returning
			let joined: Vec<_> = handles.into_iter().map(|handle| handle.join()).collect();
			match joined.iter().position(Result::is_err) {
				Some(index) => Err(HeldOutError::WorkerPanicked { phase: "map", index }),
				None => Ok(()),
			}
		})?;
		drop(tx);

		// Merge in chunk order, whatever order the threads finished in
		let mut partials: Vec<(usize, Vec<Groups<J::Key, J::Value>>)> = rx.iter().collect();
		partials.sort_by_key(|(index, _)| *index);

		let mut merged: Vec<Groups<J::Key, J::Value>> = (0..partitions).map(|_| BTreeMap::new()).collect();
		for (_, routed) in partials {
			for (target, groups) in merged.iter_mut().zip(routed) {
				for (key, mut values) in groups {
					target.entry(key).or_default().append(&mut values);
				}
			}
		}
		Ok(merged)
	}

	/// Splits inputs into at most `workers * CHUNK_FACTOR` ordered chunks.
	fn split_chunks<T>(&self, inputs: Vec<T>) -> Vec<Vec<T>> {
		let chunk_count = self.workers * CHUNK_FACTOR;
		let chunk_size = inputs.len().div_ceil(chunk_count).max(1);

		let mut chunks = Vec::new();
		let mut inputs = inputs.into_iter();
		loop {
			let chunk: Vec<T> = inputs.by_ref().take(chunk_size).collect();
			if chunk.is_empty() {
				break;
			}
			chunks.push(chunk);
		}
		chunks
	}

	/// Maps one chunk, groups by key, combines, and routes to partitions.
	fn map_chunk<J: Job>(&self, job: &J, chunk: Vec<J::Input>, partitions: usize) -> Vec<Groups<J::Key, J::Value>> {
		let mut emitted = Vec::new();
		let mut groups: Groups<J::Key, J::Value> = BTreeMap::new();
		for input in chunk {
			job.map(input, &mut emitted);
			for (key, value) in emitted.drain(..) {
				groups.entry(key).or_default().push(value);
			}
		}

		let mut routed: Vec<Groups<J::Key, J::Value>> = (0..partitions).map(|_| BTreeMap::new()).collect();
		for (key, values) in groups {
			let values = if self.combine { job.combine(&key, values) } else { values };
			let index = job.partition(&key, partitions).min(partitions - 1);
			routed[index].insert(key, values);
		}
		routed
	}

	/// Reduces every partition on its own thread.
	fn reduce_phase<J: Job>(job: &J, partitions: Vec<Groups<J::Key, J::Value>>) -> HeldOutResult<Vec<J::Output>> {
		thread::scope(|scope| -> HeldOutResult<Vec<J::Output>> {
			let handles: Vec<_> = partitions
				.into_iter()
				.map(|groups| {
					scope.spawn(move || {
						let mut out = Vec::new();
						for (key, values) in groups {
							job.reduce(key, values, &mut out);
						}
						out
					})
				})
				.collect();

			let joined: Vec<_> = handles.into_iter().map(|handle| handle.join()).collect();
			let mut outputs = Vec::new();
			for (index, result) in joined.into_iter().enumerate() {
				let mut out = result.map_err(|_| HeldOutError::WorkerPanicked { phase: "reduce", index })?;
				outputs.append(&mut out);
			}
			Ok(outputs)
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Counts words; the combiner pre-sums.
	struct WordCount;

	impl Job for WordCount {
		type Input = &'static str;
		type Key = String;
		type Value = u64;
		type Output = (String, u64);

		fn map(&self, input: Self::Input, emit: &mut Vec<(String, u64)>) {
			for word in input.split_whitespace() {
				emit.push((word.to_owned(), 1));
			}
		}

		fn combine(&self, _key: &String, values: Vec<u64>) -> Vec<u64> {
			vec![values.iter().sum()]
		}

		fn reduce(&self, key: String, values: Vec<u64>, out: &mut Vec<(String, u64)>) {
			out.push((key, values.iter().sum()));
		}
	}

	/// Records the value order each key sees.
	struct ValueOrder;

	impl Job for ValueOrder {
		type Input = u32;
		type Key = u32;
		type Value = u32;
		type Output = (u32, Vec<u32>);

		fn map(&self, input: u32, emit: &mut Vec<(u32, u32)>) {
			emit.push((input % 3, input));
		}

		fn single_partition(&self) -> bool {
			true
		}

		fn reduce(&self, key: u32, values: Vec<u32>, out: &mut Vec<(u32, Vec<u32>)>) {
			out.push((key, values));
		}
	}

	struct Exploding;

	impl Job for Exploding {
		type Input = u32;
		type Key = u32;
		type Value = u32;
		type Output = u32;

		fn map(&self, input: u32, emit: &mut Vec<(u32, u32)>) {
			assert!(input != 13, "unlucky input");
			emit.push((input, input));
		}

		fn reduce(&self, key: u32, _values: Vec<u32>, out: &mut Vec<u32>) {
			out.push(key);
		}
	}

	const TEXT: [&str; 4] = ["a b a", "c a", "b b b", "d"];

	fn sorted(mut counts: Vec<(String, u64)>) -> Vec<(String, u64)> {
		counts.sort();
		counts
	}

	#[test]
	fn word_count() {
		let counts = sorted(Engine::new(2, true).run(&WordCount, TEXT.to_vec()).unwrap());
		let expected: Vec<(String, u64)> =
			vec![("a".into(), 3), ("b".into(), 4), ("c".into(), 1), ("d".into(), 1)];
		assert_eq!(counts, expected);
	}

	#[test]
	fn combiner_and_workers_do_not_change_results() {
		let baseline = sorted(Engine::new(1, false).run(&WordCount, TEXT.to_vec()).unwrap());
		for workers in 1..=4 {
			for combine in [false, true] {
				let counts = sorted(Engine::new(workers, combine).run(&WordCount, TEXT.to_vec()).unwrap());
				assert_eq!(counts, baseline, "workers={workers} combine={combine}");
			}
		}
	}

	#[test]
	fn values_arrive_in_input_order() {
		let inputs: Vec<u32> = (0..200).collect();
		let groups = Engine::new(3, false).run(&ValueOrder, inputs).unwrap();
		assert_eq!(groups.iter().map(|(key, _)| *key).collect::<Vec<_>>(), vec![0, 1, 2]);
		for (key, values) in groups {
			assert!(values.windows(2).all(|w| w[0] < w[1]), "key {key} out of order");
			assert!(values.iter().all(|v| v % 3 == key));
		}
	}

	#[test]
	fn empty_input_gives_empty_output() {
		assert!(Engine::new(4, true).run(&WordCount, Vec::new()).unwrap().is_empty());
	}

	#[test]
	fn map_panic_is_an_error() {
		let result = Engine::new(2, true).run(&Exploding, (0..20).collect());
		assert!(matches!(result, Err(HeldOutError::WorkerPanicked { phase: "map", .. })));
	}

	#[test]
	fn workers_are_clamped() {
		assert_eq!(Engine::new(0, true).workers(), 1);
		assert!(Engine::default().workers() >= 1);
	}
}
