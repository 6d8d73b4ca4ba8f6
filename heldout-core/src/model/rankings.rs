use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HeldOutResult;
use super::rows::Estimate;

/// A completion word `w3` and its smoothed probability.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Completion {
	pub word: String,
	pub probability: f64,
}

/// All completions of one two-word prefix, best first.
///
/// # Invariants
/// - `completions` is non-increasing in probability
/// - equal probabilities are ordered by `word` ascending
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BigramGroup {
	pub w1: String,
	pub w2: String,
	pub completions: Vec<Completion>,
}

impl BigramGroup {
	/// Returns the `(w1, w2)` prefix.
	pub fn prefix(&self) -> (&str, &str) {
		(&self.w1, &self.w2)
	}
}

impl fmt::Display for BigramGroup {
	/// Renders one `w1 w2 w3 \t probability` line per completion.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, completion) in self.completions.iter().enumerate() {
			if i > 0 {
				writeln!(f)?;
			}
			write!(f, "{} {} {}\t{}", self.w1, self.w2, completion.word, completion.probability)?;
		}
		Ok(())
	}
}

/// Final output of the pipeline: completions grouped per prefix.
///
/// Groups are sorted by prefix, so lookups are a binary search.
/// `Rankings` can be persisted as a compact `postcard` snapshot.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Rankings {
	groups: Vec<BigramGroup>,
}

impl Rankings {
	/// Groups estimates that are already in ranking order
	/// (prefix ascending, then probability descending).
	///
	/// Consecutive estimates sharing a prefix are folded into one group.
	pub fn from_ordered(estimates: impl IntoIterator<Item = Estimate>) -> Self {
		let mut groups: Vec<BigramGroup> = Vec::new();
		for estimate in estimates {
			let [w1, w2, w3] = estimate.trigram.into_words();
			let completion = Completion { word: w3, probability: estimate.probability };
			match groups.last_mut() {
				Some(group) if group.w1 == w1 && group.w2 == w2 => group.completions.push(completion),
				_ => groups.push(BigramGroup { w1, w2, completions: vec![completion] }),
			}
		}
		Self { groups }
	}

	/// Returns the groups in output order.
	pub fn groups(&self) -> &[BigramGroup] {
		&self.groups
	}

	/// Returns `true` if nothing was ranked.
	pub fn is_empty(&self) -> bool {
		self.groups.is_empty()
	}

	/// Returns the number of ranked trigrams.
	pub fn len(&self) -> usize {
		self.groups.iter().map(|g| g.completions.len()).sum()
	}

	/// Returns the ranked completions of `(w1, w2)`, best first.
	///
	/// Returns an empty slice for an unknown prefix.
	pub fn completions(&self, w1: &str, w2: &str) -> &[Completion] {
		match self.groups.binary_search_by(|g| g.prefix().cmp(&(w1, w2))) {
			Ok(index) => &self.groups[index].completions,
			Err(_) => &[],
		}
	}

	/// Iterates `(w1, w2, w3, probability)` in output order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str, f64)> {
		self.groups.iter().flat_map(|g| {
			g.completions
				.iter()
				.map(move |c| (g.w1.as_str(), g.w2.as_str(), c.word.as_str(), c.probability))
		})
	}

	/// Renders every ranked trigram as a `w1 w2 w3 \t probability` line.
	pub fn to_lines(&self) -> Vec<String> {
		self.iter().map(|(w1, w2, w3, p)| format!("{w1} {w2} {w3}\t{p}")).collect()
	}

	/// Writes the rankings as a `postcard` snapshot.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> HeldOutResult<()> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(path, bytes)?;
		Ok(())
	}

	/// Loads rankings from a `postcard` snapshot written by [`Rankings::save`].
	pub fn load<P: AsRef<Path>>(path: P) -> HeldOutResult<Self> {
		let bytes = std::fs::read(path)?;
		Ok(postcard::from_bytes(&bytes)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::Trigram;

	fn estimate(w1: &str, w2: &str, w3: &str, probability: f64) -> Estimate {
		Estimate { trigram: Trigram::new(w1, w2, w3), probability }
	}

	fn sample() -> Rankings {
		Rankings::from_ordered([
			estimate("big", "dog", "barks", 0.5),
			estimate("big", "dog", "runs", 0.1),
			estimate("dog", "run", "fast", 0.0),
		])
	}

	#[test]
	fn groups_consecutive_prefixes() {
		let rankings = sample();
		assert_eq!(rankings.groups().len(), 2);
		assert_eq!(rankings.len(), 3);
		assert_eq!(rankings.completions("big", "dog")[0].word, "barks");
		assert_eq!(rankings.completions("dog", "run").len(), 1);
		assert!(rankings.completions("cat", "sat").is_empty());
	}

	#[test]
	fn renders_lines_in_order() {
		assert_eq!(
			sample().to_lines(),
			vec!["big dog barks\t0.5", "big dog runs\t0.1", "dog run fast\t0"]
		);
		assert_eq!(sample().groups()[0].to_string(), "big dog barks\t0.5\nbig dog runs\t0.1");
	}

	#[test]
	fn empty_rankings() {
		let rankings = Rankings::from_ordered(Vec::new());
		assert!(rankings.is_empty());
		assert_eq!(rankings.len(), 0);
		assert!(rankings.to_lines().is_empty());
	}
}
