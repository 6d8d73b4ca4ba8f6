use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered triple of word tokens `(w1, w2, w3)`.
///
/// Equality and ordering are positional: `"a b c"` and `"c b a"` are
/// different trigrams, and sorting is lexicographic on `w1`, then `w2`,
/// then `w3`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Trigram {
	words: [String; 3],
}

impl Trigram {
	/// Creates a trigram from its three words.
	pub fn new(w1: impl Into<String>, w2: impl Into<String>, w3: impl Into<String>) -> Self {
		Self { words: [w1.into(), w2.into(), w3.into()] }
	}

	/// Parses a space-separated trigram.
	///
	/// Returns `None` when fewer than three tokens are present, or when one
	/// of the first three is empty (`"dog run "`, `"dog  run"`).
	/// Extra tokens after the third are ignored.
	pub fn parse(text: &str) -> Option<Self> {
		let mut tokens = text.split(' ');
		let mut next = || tokens.next().filter(|token| !token.is_empty());
		let w1 = next()?;
		let w2 = next()?;
		let w3 = next()?;
		Some(Self::new(w1, w2, w3))
	}

	/// Returns the three words in order.
	pub fn words(&self) -> &[String; 3] {
		&self.words
	}

	/// Returns the two-word prefix `(w1, w2)`.
	pub fn prefix(&self) -> (&str, &str) {
		(&self.words[0], &self.words[1])
	}

	/// Returns the completion word `w3`.
	pub fn last(&self) -> &str {
		&self.words[2]
	}

	/// Consumes the trigram and returns its words.
	pub fn into_words(self) -> [String; 3] {
		self.words
	}
}

impl fmt::Display for Trigram {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {} {}", self.words[0], self.words[1], self.words[2])
	}
}
