use unicode_segmentation::UnicodeSegmentation;

/// Collapses every whitespace run, newlines included, to a single space.
pub fn normalize_whitespace(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Unicode sentence boundaries over whitespace-normalized text, trimmed, blanks dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
	let normalized = normalize_whitespace(text);

	normalized
		.split_sentence_bounds()
		.map(str::trim)
		.filter(|sentence| !sentence.is_empty())
		.map(str::to_string)
		.collect()
}
