use std::collections::{BTreeMap, HashMap};

use companion_domain::text;

use crate::{
	CorpusIndex,
	ranking::{self, Normalization, RankedPage},
};

/// L2-normalized sparse vector keyed by vocabulary id, entries sorted by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
	entries: Vec<(u32, f32)>,
}
impl SparseVector {
	pub fn entries(&self) -> &[(u32, f32)] {
		&self.entries
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn dot(&self, other: &Self) -> f32 {
		let (mut left, mut right) = (0, 0);
		let mut sum = 0.0_f32;

		while left < self.entries.len() && right < other.entries.len() {
			let (left_id, left_value) = self.entries[left];
			let (right_id, right_value) = other.entries[right];

			match left_id.cmp(&right_id) {
				std::cmp::Ordering::Less => left += 1,
				std::cmp::Ordering::Greater => right += 1,
				std::cmp::Ordering::Equal => {
					sum += left_value * right_value;
					left += 1;
					right += 1;
				},
			}
		}

		sum
	}

	pub fn norm(&self) -> f32 {
		self.entries.iter().map(|(_, value)| value * value).sum::<f32>().sqrt()
	}

	/// Cosine similarity, or `None` when either side has no weight.
	pub fn cosine_similarity(&self, other: &Self) -> Option<f32> {
		let (left_norm, right_norm) = (self.norm(), other.norm());

		if left_norm <= f32::EPSILON || right_norm <= f32::EPSILON {
			return None;
		}

		Some((self.dot(other) / (left_norm * right_norm)).clamp(-1.0, 1.0))
	}
}

/// Word n-gram TF-IDF model with smoothed IDF, fitted once per index build.
///
/// Vocabulary ids follow lexicographic term order. When the corpus has more distinct terms than
/// `max_features`, the most frequent terms are kept, ties broken lexicographically.
#[derive(Debug, Clone)]
pub struct TfidfModel {
	vocabulary: HashMap<String, u32>,
	idf: Vec<f32>,
	ngram_max: usize,
}
impl TfidfModel {
	pub fn fit(token_lists: &[Vec<String>], ngram_max: usize, max_features: usize) -> Self {
		let ngram_max = ngram_max.clamp(1, 2);
		let mut doc_freq: BTreeMap<String, u32> = BTreeMap::new();
		let mut corpus_freq: BTreeMap<String, u64> = BTreeMap::new();

		for tokens in token_lists {
			let mut seen: BTreeMap<String, u32> = BTreeMap::new();

			for term in ngrams(tokens, ngram_max) {
				*seen.entry(term).or_insert(0) += 1;
			}

			for (term, count) in seen {
				*corpus_freq.entry(term.clone()).or_insert(0) += count as u64;
				*doc_freq.entry(term).or_insert(0) += 1;
			}
		}

		let mut kept: Vec<String> = if doc_freq.len() > max_features {
			let mut by_freq: Vec<(&String, u64)> =
				corpus_freq.iter().map(|(term, count)| (term, *count)).collect();

			by_freq.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(right.0)));
			by_freq.truncate(max_features);

			by_freq.into_iter().map(|(term, _)| term.clone()).collect()
		} else {
			doc_freq.keys().cloned().collect()
		};

		kept.sort();

		let n = token_lists.len() as f32;
		let mut vocabulary = HashMap::with_capacity(kept.len());
		let mut idf = Vec::with_capacity(kept.len());

		for (id, term) in kept.into_iter().enumerate() {
			let df = doc_freq.get(&term).copied().unwrap_or(0) as f32;

			idf.push(((1.0 + n) / (1.0 + df)).ln() + 1.0);
			vocabulary.insert(term, id as u32);
		}

		Self { vocabulary, idf, ngram_max }
	}

	pub fn feature_count(&self) -> usize {
		self.idf.len()
	}

	pub fn transform(&self, text: &str) -> SparseVector {
		self.transform_tokens(&text::tokenize(text))
	}

	/// Projects already-tokenized text. Terms outside the fitted vocabulary are ignored.
	pub fn transform_tokens(&self, tokens: &[String]) -> SparseVector {
		let mut counts: BTreeMap<u32, f32> = BTreeMap::new();

		for term in ngrams(tokens, self.ngram_max) {
			if let Some(&id) = self.vocabulary.get(&term) {
				*counts.entry(id).or_insert(0.0) += 1.0;
			}
		}

		let mut entries: Vec<(u32, f32)> =
			counts.into_iter().map(|(id, count)| (id, count * self.idf[id as usize])).collect();
		let norm = entries.iter().map(|(_, value)| value * value).sum::<f32>().sqrt();

		if norm > 0.0 {
			for (_, value) in entries.iter_mut() {
				*value /= norm;
			}
		}

		SparseVector { entries }
	}
}

fn ngrams(tokens: &[String], ngram_max: usize) -> Vec<String> {
	let mut out: Vec<String> = tokens.to_vec();

	if ngram_max >= 2 {
		out.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
	}

	out
}

/// Cosine similarity between a projected query and the chunk vectors of a [`CorpusIndex`].
pub struct SemanticScorer<'a> {
	index: &'a CorpusIndex,
}
impl<'a> SemanticScorer<'a> {
	pub fn new(index: &'a CorpusIndex) -> Self {
		Self { index }
	}

	/// Positive similarities against every chunk, or only `filter` positions when given.
	pub fn score(&self, query: &str, filter: Option<&[usize]>) -> Vec<(usize, f32)> {
		let query = self.index.tfidf().transform(query);

		if query.is_empty() {
			return Vec::new();
		}

		let candidates: Box<dyn Iterator<Item = usize>> = match filter {
			Some(docs) => Box::new(docs.iter().copied()),
			None => Box::new(0..self.index.len()),
		};

		candidates
			.filter_map(|doc| {
				let vector = self.index.vector_at(doc)?;
				let similarity = query.cosine_similarity(vector)?;

				(similarity > 0.0).then_some((doc, similarity))
			})
			.collect()
	}

	pub fn rank(
		&self,
		query: &str,
		filter: Option<&[usize]>,
		offset: usize,
		limit: usize,
	) -> RankedPage {
		ranking::rank(self.score(query, filter), Normalization::Clamp, offset, limit)
	}
}
