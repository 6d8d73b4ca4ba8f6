use std::collections::HashSet;

use crate::model::Trigram;

/// Fixed English stopword vocabulary.
///
/// Matching is exact and case-sensitive: `"The"` is not a stopword.
pub const STOPWORDS: [&str; 319] = [
	"a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost", "alone", "along", "already", "also",
	"although", "always", "am", "among", "amongst", "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything",
	"anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become", "becomes", "becoming", "been", "before",
	"beforehand", "behind", "being", "below", "beside", "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
	"cannot", "cant", "co", "computer", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do", "done", "down", "due", "during", "each",
	"eg", "eight", "either", "eleven", "else", "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
	"everywhere", "except", "few", "fifteen", "fify", "fill", "find", "fire", "first", "five", "for", "former", "formerly", "forty", "found",
	"four", "from", "front", "full", "further", "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here", "hereafter", "hereby",
	"herein", "hereupon", "hers", "herself", "him", "himself", "his", "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest",
	"into", "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd", "made", "many", "may", "me", "meanwhile", "might",
	"mill", "mine", "more", "moreover", "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither", "never",
	"nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of", "off", "often", "on", "once",
	"one", "only", "onto", "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part", "per", "perhaps", "please",
	"put", "rather", "re", "same", "see", "seem", "seemed", "seeming", "seems", "serious", "several", "she", "should", "show", "side", "since",
	"sincere", "six", "sixty", "so", "some", "somehow", "someone", "something", "sometime", "sometimes", "somewhere", "still", "such",
	"system", "take", "ten", "than", "that", "the", "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
	"therefore", "therein", "thereupon", "these", "they", "thick", "thin", "third", "this", "those", "though", "three", "through",
	"throughout", "thru", "thus", "to", "together", "too", "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up",
	"upon", "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas",
	"whereby", "wherein", "whereupon", "wherever", "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why",
	"will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

/// Static set membership test over the stopword vocabulary.
///
/// Used at ingestion time: a trigram with a stopword in any position is
/// dropped before it reaches any statistic.
#[derive(Clone, Debug)]
pub struct StopwordFilter {
	words: HashSet<&'static str>,
}

impl Default for StopwordFilter {
	fn default() -> Self {
		Self { words: STOPWORDS.iter().copied().collect() }
	}
}

impl StopwordFilter {
	/// Returns `true` if `word` is a stopword.
	pub fn contains(&self, word: &str) -> bool {
		self.words.contains(word)
	}

	/// Returns `true` if none of the three words is a stopword.
	pub fn admits(&self, trigram: &Trigram) -> bool {
		!trigram.words().iter().any(|word| self.contains(word))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stopword_in_any_position_rejects() {
		let filter = StopwordFilter::default();
		assert!(!filter.admits(&Trigram::new("the", "dog", "runs")));
		assert!(!filter.admits(&Trigram::new("dog", "the", "runs")));
		assert!(!filter.admits(&Trigram::new("dog", "runs", "the")));
		assert!(filter.admits(&Trigram::new("dog", "run", "fast")));
	}

	#[test]
	fn matching_is_case_sensitive() {
		let filter = StopwordFilter::default();
		assert!(filter.contains("the"));
		assert!(!filter.contains("The"));
		assert!(filter.admits(&Trigram::new("The", "dog", "barks")));
	}

	#[test]
	fn vocabulary_has_no_duplicates() {
		assert_eq!(StopwordFilter::default().words.len(), STOPWORDS.len());
	}
}
