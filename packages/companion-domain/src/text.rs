use std::collections::BTreeSet;

use unicode_normalization::UnicodeNormalization;

const STOPWORDS: &[&str] = &[
	"a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be",
	"because", "been", "before", "being", "but", "by", "can", "could", "did", "do", "does", "for",
	"from", "had", "has", "have", "he", "her", "here", "him", "his", "how", "i", "if", "in",
	"into", "is", "it", "its", "just", "me", "more", "my", "no", "not", "of", "on", "or", "our",
	"out", "she", "so", "some", "than", "that", "the", "their", "them", "then", "there", "these",
	"they", "this", "those", "to", "too", "up", "us", "very", "was", "we", "were", "what", "when",
	"which", "while", "who", "will", "with", "would", "you", "your",
];

pub fn is_stopword(token: &str) -> bool {
	STOPWORDS.binary_search(&token).is_ok()
}

/// NFKC-folds and lowercases `text`, splits on every non-alphanumeric character, and drops
/// stopwords. Token order is preserved and duplicates are kept.
pub fn tokenize(text: &str) -> Vec<String> {
	let mut normalized = String::with_capacity(text.len());

	for ch in text.nfkc().flat_map(char::to_lowercase) {
		if ch.is_alphanumeric() {
			normalized.push(ch);
		} else {
			normalized.push(' ');
		}
	}

	normalized
		.split_whitespace()
		.filter(|token| !is_stopword(token))
		.map(str::to_string)
		.collect()
}

/// Distinct tokens of `text`, ignoring stopwords.
pub fn token_set(text: &str) -> BTreeSet<String> {
	tokenize(text).into_iter().collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stopword_table_is_sorted() {
		assert!(STOPWORDS.windows(2).all(|pair| pair[0] < pair[1]));
	}

	#[test]
	fn tokenizes_on_non_alphanumeric() {
		assert_eq!(tokenize("Morning-light, 10 min!"), vec!["morning", "light", "10", "min"]);
	}

	#[test]
	fn drops_stopwords() {
		assert!(tokenize("the and of").is_empty());
		assert_eq!(tokenize("The Sleep of kings"), vec!["sleep", "kings"]);
	}

	#[test]
	fn folds_compatibility_forms() {
		assert_eq!(tokenize("ＳＬＥＥＰ"), vec!["sleep"]);
	}
}
