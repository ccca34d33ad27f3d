use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use companion_domain::chunk::excerpt;
use companion_index::{Chunk, LexicalScorer, RankedChunk, SemanticScorer};

use crate::{CompanionService, Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
	#[default]
	Bm25,
	Tfidf,
}
impl SearchMode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Bm25 => "bm25",
			Self::Tfidf => "tfidf",
		}
	}
}
impl FromStr for SearchMode {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"bm25" => Ok(Self::Bm25),
			"tfidf" => Ok(Self::Tfidf),
			other => Err(Error::InvalidRequest {
				message: format!("mode must be one of bm25 or tfidf; got {other:?}."),
			}),
		}
	}
}
impl fmt::Display for SearchMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
	pub q: String,
	#[serde(default)]
	pub mode: SearchMode,
	pub limit: Option<u32>,
	pub offset: Option<u32>,
	/// Restricts candidates to chunks carrying any of these tags.
	#[serde(default)]
	pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
	pub chunk_id: String,
	pub episode_id: String,
	pub episode_title: String,
	pub chunk_index: u32,
	pub title_sent: String,
	pub why_sent: String,
	pub snippet: String,
	pub score: f32,
}
impl SearchItem {
	pub(crate) fn from_chunk(chunk: &Chunk, score: f32, snippet_chars: usize) -> Self {
		let record = &chunk.record;

		Self {
			chunk_id: record.chunk_id.clone(),
			episode_id: record.episode_id.clone(),
			episode_title: record.episode_title.clone(),
			chunk_index: record.chunk_index,
			title_sent: record.title_sent.clone(),
			why_sent: record.why_sent.clone(),
			snippet: excerpt(&record.text, snippet_chars),
			score,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
	pub items: Vec<SearchItem>,
	pub mode: SearchMode,
	/// Scored candidates before pagination.
	pub count: usize,
}

impl CompanionService {
	pub fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let limit = crate::page_size(
			req.limit,
			self.cfg.search.default_limit,
			self.cfg.search.max_limit,
			"limit",
		)?;
		let offset = req.offset.unwrap_or(0) as usize;
		let snapshot = self.index.current();
		let index = &snapshot.index;
		let filter = (!req.tags.is_empty()).then(|| index.lookup_by_tags(&req.tags));
		let page = match req.mode {
			SearchMode::Bm25 =>
				LexicalScorer::new(index).rank(&req.q, filter.as_deref(), offset, limit),
			SearchMode::Tfidf =>
				SemanticScorer::new(index).rank(&req.q, filter.as_deref(), offset, limit),
		};
		let snippet_chars = self.cfg.search.snippet_chars as usize;
		let items = page
			.items
			.iter()
			.filter_map(|RankedChunk { doc, score }| {
				index.chunk(*doc).map(|chunk| SearchItem::from_chunk(chunk, *score, snippet_chars))
			})
			.collect();

		tracing::debug!(
			mode = %req.mode,
			count = page.total,
			offset,
			limit,
			version = snapshot.version,
			"Search served."
		);

		Ok(SearchResponse { items, mode: req.mode, count: page.total })
	}
}
