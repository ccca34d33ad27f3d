use companion_domain::text;

use crate::{
	CorpusIndex,
	ranking::{self, Normalization, RankedPage},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
	/// Term-frequency saturation.
	pub k1: f32,
	/// Length normalization.
	pub b: f32,
}
impl Default for Bm25Params {
	fn default() -> Self {
		Self { k1: 1.5, b: 0.75 }
	}
}

/// Okapi BM25 over the postings of a [`CorpusIndex`].
pub struct LexicalScorer<'a> {
	index: &'a CorpusIndex,
	params: Bm25Params,
}
impl<'a> LexicalScorer<'a> {
	pub fn new(index: &'a CorpusIndex) -> Self {
		Self { index, params: index.settings().bm25 }
	}

	/// Raw BM25 scores for every chunk sharing a token with `query`, ascending by position.
	///
	/// Repeated query tokens contribute once per occurrence. `filter`, when present, must be
	/// sorted ascending.
	pub fn score(&self, query: &str, filter: Option<&[usize]>) -> Vec<(usize, f32)> {
		let tokens = text::tokenize(query);

		if tokens.is_empty() {
			return Vec::new();
		}

		let idfs: Vec<f32> =
			tokens.iter().map(|token| self.index.idf(token).unwrap_or(0.0)).collect();
		let Bm25Params { k1, b } = self.params;
		let avg_len = self.index.avg_len().max(f32::EPSILON);
		let mut out = Vec::new();

		for candidate in self.index.lookup_by_tokens(&tokens) {
			if let Some(filter) = filter
				&& filter.binary_search(&candidate.doc).is_err()
			{
				continue;
			}

			let len_norm = 1.0 - b + b * candidate.doc_len as f32 / avg_len;
			let score = candidate
				.term_freqs
				.iter()
				.map(|&(position, tf)| {
					let tf = tf as f32;

					idfs[position] * (tf * (k1 + 1.0)) / (tf + k1 * len_norm)
				})
				.sum();

			out.push((candidate.doc, score));
		}

		out
	}

	pub fn rank(
		&self,
		query: &str,
		filter: Option<&[usize]>,
		offset: usize,
		limit: usize,
	) -> RankedPage {
		ranking::rank(self.score(query, filter), Normalization::DivideByMax, offset, limit)
	}
}
