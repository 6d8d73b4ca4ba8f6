use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::{HeldOutError, HeldOutResult};
use crate::model::{ClassStatRow, ConfiguredSplitter, Estimate, HalfAssigner, HalfCountRow, Rankings};
use crate::stages::{ClassifyJob, CountJob, EstimateJob, RankJob};
use crate::stopwords::StopwordFilter;

/// Execution parameters of a pipeline run.
///
/// # Invariants
/// - `workers >= 1` (checked by the setters and by [`HeldOutPipeline::new`])
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PipelineOptions {
	/// Worker threads, and number of reduce partitions.
	workers: usize,

	/// Whether additive values are pre-aggregated after each map chunk.
	combine: bool,

	/// Seed for a reproducible corpus split; `None` draws fresh randomness.
	seed: Option<u64>,
}

impl Default for PipelineOptions {
	fn default() -> Self {
		Self { workers: num_cpus::get(), combine: true, seed: None }
	}
}

impl PipelineOptions {
	pub fn workers(&self) -> usize {
		self.workers
	}

	pub fn combine(&self) -> bool {
		self.combine
	}

	pub fn seed(&self) -> Option<u64> {
		self.seed
	}

	/// Sets the number of workers.
	///
	/// # Errors
	/// Returns an error if `workers` is 0.
	pub fn set_workers(&mut self, workers: usize) -> HeldOutResult<()> {
		if workers == 0 {
			return Err(HeldOutError::InvalidOptions("workers must be >= 1".to_owned()));
		}
		self.workers = workers;
		Ok(())
	}

	pub fn set_combine(&mut self, combine: bool) {
		self.combine = combine;
	}

	pub fn set_seed(&mut self, seed: Option<u64>) {
		self.seed = seed;
	}

	fn validate(&self) -> HeldOutResult<()> {
		if self.workers == 0 {
			return Err(HeldOutError::InvalidOptions("workers must be >= 1".to_owned()));
		}
		Ok(())
	}
}

/// Every intermediate and final output of one run.
#[derive(Clone, Debug)]
pub struct PipelineRun {
	pub half_counts: Vec<HalfCountRow>,
	pub class_stats: Vec<ClassStatRow>,
	pub estimates: Vec<Estimate>,
	pub rankings: Rankings,
}

impl PipelineRun {
	/// Summarizes the run.
	pub fn summary(&self) -> PipelineSummary {
		let mut summary = PipelineSummary { ranked: self.rankings.len(), ..PipelineSummary::default() };
		let mut classes = BTreeSet::new();
		for row in &self.half_counts {
			match row {
				HalfCountRow::Total(total) => summary.total_occurrences += total,
				HalfCountRow::Counts { r, .. } => {
					summary.trigram_types += 1;
					classes.insert(*r);
				}
			}
		}
		summary.frequency_classes = classes.len();
		summary
	}
}

/// Headline numbers of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineSummary {
	/// Surviving trigram occurrences in the corpus.
	pub total_occurrences: u64,
	/// Distinct trigrams.
	pub trigram_types: usize,
	/// Distinct total counts `r`.
	pub frequency_classes: usize,
	/// Trigrams in the final rankings.
	pub ranked: usize,
}

impl fmt::Display for PipelineSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} occurrences, {} trigram types, {} frequency classes, {} ranked",
			self.total_occurrences, self.trigram_types, self.frequency_classes, self.ranked
		)
	}
}

/// Held-out trigram estimator: stage 1 → 2 → 3 → 4 over one engine.
///
/// Each stage can also be run on its own, from the previous stage's rows.
///
/// # Example
/// ```
/// use heldout_core::{HeldOutPipeline, PipelineOptions};
///
/// let mut options = PipelineOptions::default();
/// options.set_seed(Some(7));
/// let pipeline = HeldOutPipeline::new(&options)?;
/// let run = pipeline.run(vec!["dog run fast\t2000\t3\t1\t1".to_owned()])?;
/// assert_eq!(run.rankings.len(), 1);
/// # Ok::<(), heldout_core::HeldOutError>(())
/// ```
pub struct HeldOutPipeline<A: HalfAssigner> {
	engine: Engine,
	stopwords: StopwordFilter,
	assigner: A,
}

impl HeldOutPipeline<ConfiguredSplitter> {
	/// Creates a pipeline splitting the corpus as `options.seed()` dictates.
	///
	/// # Errors
	/// Returns an error if the options are invalid.
	pub fn new(options: &PipelineOptions) -> HeldOutResult<Self> {
		Self::with_assigner(options, ConfiguredSplitter::from(options.seed()))
	}
}

impl<A: HalfAssigner> HeldOutPipeline<A> {
	/// Creates a pipeline with an explicit corpus split.
	///
	/// # Errors
	/// Returns an error if the options are invalid.
	pub fn with_assigner(options: &PipelineOptions, assigner: A) -> HeldOutResult<Self> {
		options.validate()?;
		Ok(Self {
			engine: Engine::new(options.workers(), options.combine()),
			stopwords: StopwordFilter::default(),
			assigner,
		})
	}

	/// Stage 1 over raw corpus lines, numbered from 0.
	pub fn count(&self, lines: Vec<String>) -> HeldOutResult<Vec<HalfCountRow>> {
		let inputs: Vec<(u64, String)> = lines.into_iter().enumerate().map(|(i, line)| (i as u64, line)).collect();
		let rows = self.engine.run(&CountJob::new(&self.stopwords, &self.assigner), inputs)?;
		log::debug!("stage 1: {} rows", rows.len());
		Ok(rows)
	}

	/// Stage 2 over stage 1 rows.
	pub fn classify(&self, rows: Vec<HalfCountRow>) -> HeldOutResult<Vec<ClassStatRow>> {
		let rows = self.engine.run(&ClassifyJob, rows)?;
		log::debug!("stage 2: {} rows", rows.len());
		Ok(rows)
	}

	/// Stage 3 over stage 2 rows.
	pub fn estimate(&self, rows: Vec<ClassStatRow>) -> HeldOutResult<Vec<Estimate>> {
		let estimates = self.engine.run(&EstimateJob, rows)?;
		log::debug!("stage 3: {} estimates", estimates.len());
		Ok(estimates)
	}

	/// Stage 4 over stage 3 estimates.
	pub fn rank(&self, estimates: Vec<Estimate>) -> HeldOutResult<Rankings> {
		let ordered = self.engine.run(&RankJob, estimates)?;
		let rankings = Rankings::from_ordered(ordered);
		log::debug!("stage 4: {} prefixes", rankings.groups().len());
		Ok(rankings)
	}

	/// Runs all four stages over raw corpus lines.
	///
	/// An empty or fully filtered corpus yields empty outputs.
	pub fn run(&self, lines: Vec<String>) -> HeldOutResult<PipelineRun> {
		log::info!("counting {} corpus lines", lines.len());
		let half_counts = self.count(lines)?;
		log::info!("classifying {} trigram rows", half_counts.len());
		let class_stats = self.classify(half_counts.clone())?;
		log::info!("estimating from {} statistics rows", class_stats.len());
		let estimates = self.estimate(class_stats.clone())?;
		log::info!("ranking {} estimates", estimates.len());
		let rankings = self.rank(estimates.clone())?;

		let run = PipelineRun { half_counts, class_stats, estimates, rankings };
		log::info!("done: {}", run.summary());
		Ok(run)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn workers_must_be_positive() {
		let mut options = PipelineOptions::default();
		assert!(matches!(options.set_workers(0), Err(HeldOutError::InvalidOptions(_))));
		options.set_workers(3).unwrap();
		assert_eq!(options.workers(), 3);
	}

	#[test]
	fn deserialized_options_are_validated() {
		let options = PipelineOptions { workers: 0, combine: true, seed: None };
		assert!(HeldOutPipeline::new(&options).is_err());
	}

	#[test]
	fn empty_corpus_gives_empty_run() {
		let pipeline = HeldOutPipeline::new(&PipelineOptions::default()).unwrap();
		let run = pipeline.run(Vec::new()).unwrap();
		assert!(run.half_counts.is_empty());
		assert!(run.estimates.is_empty());
		assert!(run.rankings.is_empty());
		assert_eq!(run.summary(), PipelineSummary::default());
	}

	#[test]
	fn summary_counts() {
		let mut options = PipelineOptions::default();
		options.set_seed(Some(1));
		let pipeline = HeldOutPipeline::new(&options).unwrap();
		let lines = vec![
			"dog run fast\t2000\t3\t1\t1".to_owned(),
			"dog run slow\t2000\t3\t1\t1".to_owned(),
			"cat sat quiet\t2000\t1\t1\t1".to_owned(),
			"the cat sat\t2000\t9\t1\t1".to_owned(),
		];
		let summary = pipeline.run(lines).unwrap().summary();
		assert_eq!(
			summary,
			PipelineSummary { total_occurrences: 7, trigram_types: 3, frequency_classes: 2, ranked: 3 }
		);
	}
}
