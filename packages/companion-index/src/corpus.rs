use std::collections::{BTreeMap, HashMap, HashSet};

use companion_domain::{ChunkRecord, profile::normalize_labels, text};

use crate::{
	Error, Result,
	bm25::Bm25Params,
	tfidf::{SparseVector, TfidfModel},
};

#[derive(Debug, Clone, Copy)]
pub struct IndexSettings {
	pub bm25: Bm25Params,
	pub ngram_max: usize,
	pub max_features: usize,
}
impl IndexSettings {
	pub fn from_config(cfg: &companion_config::Search) -> Self {
		Self {
			bm25: Bm25Params { k1: cfg.bm25.k1, b: cfg.bm25.b },
			ngram_max: cfg.tfidf.ngram_max as usize,
			max_features: cfg.tfidf.max_features as usize,
		}
	}
}
impl Default for IndexSettings {
	fn default() -> Self {
		Self { bm25: Bm25Params::default(), ngram_max: 2, max_features: 50_000 }
	}
}

/// An indexed chunk. Tags are normalized at build time.
#[derive(Debug, Clone)]
pub struct Chunk {
	pub record: ChunkRecord,
	pub doc_len: u32,
}
impl Chunk {
	pub fn chunk_id(&self) -> &str {
		&self.record.chunk_id
	}
}

#[derive(Debug, Clone, Copy)]
struct Posting {
	doc: usize,
	tf: u32,
}

#[derive(Debug, Clone)]
struct TermEntry {
	idf: f32,
	postings: Vec<Posting>,
}

/// Raw statistics for one candidate returned by [`CorpusIndex::lookup_by_tokens`].
#[derive(Debug, Clone, PartialEq)]
pub struct TermMatch {
	pub doc: usize,
	pub doc_len: u32,
	/// `(query token position, term frequency)` for every query token present in the chunk.
	pub term_freqs: Vec<(usize, u32)>,
}

/// Immutable chunk collection with lexical postings, tag postings, and TF-IDF vectors.
///
/// Chunks are stored sorted by `chunk_id`, so a document position doubles as the deterministic
/// tie-break order used by every scorer.
#[derive(Debug)]
pub struct CorpusIndex {
	chunks: Vec<Chunk>,
	by_id: HashMap<String, usize>,
	by_position: HashMap<(String, u32), usize>,
	terms: HashMap<String, TermEntry>,
	avg_len: f32,
	tags: BTreeMap<String, Vec<usize>>,
	tfidf: TfidfModel,
	vectors: Vec<SparseVector>,
	settings: IndexSettings,
}
impl CorpusIndex {
	pub fn build(records: Vec<ChunkRecord>, settings: IndexSettings) -> Result<Self> {
		let mut records = records;

		for (line, record) in records.iter().enumerate() {
			if let Some(field) = record.missing_field() {
				return Err(Error::IndexBuild {
					message: format!(
						"Chunk {:?} (record {}) is missing required field {field}.",
						record.chunk_id,
						line + 1
					),
				});
			}
		}

		records.sort_by(|left, right| left.chunk_id.cmp(&right.chunk_id));

		let mut by_id = HashMap::with_capacity(records.len());
		let mut by_position = HashMap::with_capacity(records.len());

		for (doc, record) in records.iter().enumerate() {
			if by_id.insert(record.chunk_id.clone(), doc).is_some() {
				return Err(Error::IndexBuild {
					message: format!("Duplicate chunk_id {:?}.", record.chunk_id),
				});
			}
			if by_position
				.insert((record.episode_id.clone(), record.chunk_index), doc)
				.is_some()
			{
				return Err(Error::IndexBuild {
					message: format!(
						"Episode {:?} has more than one chunk at index {}.",
						record.episode_id, record.chunk_index
					),
				});
			}
		}

		let token_lists: Vec<Vec<String>> =
			records.iter().map(|record| text::tokenize(&record.text)).collect();
		let terms = build_terms(&token_lists);
		let total_len: u64 = token_lists.iter().map(|tokens| tokens.len() as u64).sum();
		let avg_len =
			if token_lists.is_empty() { 0.0 } else { total_len as f32 / token_lists.len() as f32 };
		let tfidf = TfidfModel::fit(&token_lists, settings.ngram_max, settings.max_features);
		let vectors = token_lists.iter().map(|tokens| tfidf.transform_tokens(tokens)).collect();
		let mut chunks = Vec::with_capacity(records.len());
		let mut tags: BTreeMap<String, Vec<usize>> = BTreeMap::new();

		for (doc, (mut record, tokens)) in records.into_iter().zip(token_lists).enumerate() {
			record.tags = normalize_labels(&record.tags);

			for tag in &record.tags {
				tags.entry(tag.clone()).or_default().push(doc);
			}

			chunks.push(Chunk { record, doc_len: tokens.len() as u32 });
		}

		tracing::debug!(
			chunks = chunks.len(),
			terms = terms.len(),
			features = tfidf.feature_count(),
			tags = tags.len(),
			"Corpus index built."
		);

		Ok(Self { chunks, by_id, by_position, terms, avg_len, tags, tfidf, vectors, settings })
	}

	pub fn len(&self) -> usize {
		self.chunks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chunks.is_empty()
	}

	pub fn chunks(&self) -> &[Chunk] {
		&self.chunks
	}

	pub fn chunk(&self, doc: usize) -> Option<&Chunk> {
		self.chunks.get(doc)
	}

	pub fn settings(&self) -> &IndexSettings {
		&self.settings
	}

	pub fn avg_len(&self) -> f32 {
		self.avg_len
	}

	pub fn tfidf(&self) -> &TfidfModel {
		&self.tfidf
	}

	pub fn doc_of(&self, chunk_id: &str) -> Option<usize> {
		self.by_id.get(chunk_id).copied()
	}

	pub fn doc_at(&self, episode_id: &str, chunk_index: u32) -> Option<usize> {
		self.by_position.get(&(episode_id.to_string(), chunk_index)).copied()
	}

	/// Precomputed BM25 inverse document frequency, if the token occurs in the corpus.
	pub fn idf(&self, token: &str) -> Option<f32> {
		self.terms.get(token).map(|entry| entry.idf)
	}

	/// Chunks containing at least one of `tokens`, ascending by document position.
	pub fn lookup_by_tokens(&self, tokens: &[String]) -> Vec<TermMatch> {
		let mut by_doc: BTreeMap<usize, Vec<(usize, u32)>> = BTreeMap::new();

		for (position, token) in tokens.iter().enumerate() {
			let Some(entry) = self.terms.get(token) else { continue };

			for posting in &entry.postings {
				by_doc.entry(posting.doc).or_default().push((position, posting.tf));
			}
		}

		by_doc
			.into_iter()
			.map(|(doc, term_freqs)| TermMatch {
				doc,
				doc_len: self.chunks[doc].doc_len,
				term_freqs,
			})
			.collect()
	}

	/// Chunks whose tag set intersects `tags`; every chunk when `tags` is empty.
	pub fn lookup_by_tags(&self, tags: &[String]) -> Vec<usize> {
		if tags.is_empty() {
			return (0..self.chunks.len()).collect();
		}

		let mut docs = HashSet::new();

		for tag in normalize_labels(tags) {
			if let Some(postings) = self.tags.get(&tag) {
				docs.extend(postings.iter().copied());
			}
		}

		let mut out: Vec<usize> = docs.into_iter().collect();

		out.sort_unstable();

		out
	}

	/// Number of chunks carrying `tag`.
	pub fn tag_frequency(&self, tag: &str) -> usize {
		self.tags.get(tag).map(Vec::len).unwrap_or(0)
	}

	pub fn vector_of(&self, chunk_id: &str) -> Result<&SparseVector> {
		let doc = self.doc_of(chunk_id).ok_or_else(|| Error::NotFound {
			message: format!("Unknown chunk_id {chunk_id:?}."),
		})?;

		Ok(&self.vectors[doc])
	}

	pub fn vector_at(&self, doc: usize) -> Option<&SparseVector> {
		self.vectors.get(doc)
	}
}

fn build_terms(token_lists: &[Vec<String>]) -> HashMap<String, TermEntry> {
	let mut terms: HashMap<String, TermEntry> = HashMap::new();

	for (doc, tokens) in token_lists.iter().enumerate() {
		let mut counts: BTreeMap<&str, u32> = BTreeMap::new();

		for token in tokens {
			*counts.entry(token.as_str()).or_insert(0) += 1;
		}

		for (token, tf) in counts {
			terms
				.entry(token.to_string())
				.or_insert_with(|| TermEntry { idf: 0.0, postings: Vec::new() })
				.postings
				.push(Posting { doc, tf });
		}
	}

	let n = token_lists.len() as f32;

	for entry in terms.values_mut() {
		let df = entry.postings.len() as f32;

		entry.idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
	}

	terms
}

#[cfg(test)]
mod tests {
	use super::*;

	fn record(chunk_id: &str, episode_id: &str, chunk_index: u32, text: &str) -> ChunkRecord {
		ChunkRecord {
			chunk_id: chunk_id.to_string(),
			episode_id: episode_id.to_string(),
			episode_title: String::new(),
			chunk_index,
			title_sent: text.to_string(),
			why_sent: String::new(),
			text: text.to_string(),
			tags: Vec::new(),
		}
	}

	#[test]
	fn rejects_missing_text() {
		let mut bad = record("c1", "e1", 0, "Sleep.");

		bad.text.clear();

		let err = CorpusIndex::build(vec![bad], IndexSettings::default())
			.expect_err("Expected missing field error.");

		assert!(err.to_string().contains("missing required field text"), "Unexpected: {err}");
	}

	#[test]
	fn rejects_duplicate_positions() {
		let err = CorpusIndex::build(
			vec![record("c1", "e1", 0, "Sleep."), record("c2", "e1", 0, "Light.")],
			IndexSettings::default(),
		)
		.expect_err("Expected duplicate position error.");

		assert!(err.to_string().contains("more than one chunk"), "Unexpected: {err}");
	}

	#[test]
	fn token_lookup_reports_frequencies() {
		let index = CorpusIndex::build(
			vec![
				record("b", "e1", 1, "light light sleep"),
				record("a", "e1", 0, "caffeine timing"),
			],
			IndexSettings::default(),
		)
		.expect("Failed to build index.");
		let matches = index.lookup_by_tokens(&["light".to_string(), "missing".to_string()]);

		assert_eq!(matches.len(), 1);
		assert_eq!(index.chunk(matches[0].doc).map(Chunk::chunk_id), Some("b"));
		assert_eq!(matches[0].term_freqs, vec![(0, 2)]);
		assert_eq!(matches[0].doc_len, 3);
	}

	#[test]
	fn idf_is_positive_even_for_common_terms() {
		let index = CorpusIndex::build(
			vec![record("a", "e1", 0, "sleep"), record("b", "e1", 1, "sleep")],
			IndexSettings::default(),
		)
		.expect("Failed to build index.");

		assert!(index.idf("sleep").map(|idf| idf > 0.0).unwrap_or(false));
	}
}
