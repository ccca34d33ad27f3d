use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use companion_domain::{EventKind, profile::normalize_labels};
use companion_index::{CorpusIndex, ranking::cmp_f32_desc};
use companion_storage::events;

use crate::{CompanionService, Result, SearchItem};

pub const POPULAR_REASON: &str = "popular with other users";
pub const LIBRARY_REASON: &str = "from the protocol library";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendRequest {
	#[serde(default)]
	pub tags: Vec<String>,
	pub top_k: Option<u32>,
	/// Supplies profile tags, then goals, when `tags` is empty.
	pub user_id: Option<String>,
}

/// `reasons[i]` explains `items[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendResponse {
	pub items: Vec<SearchItem>,
	pub reasons: Vec<String>,
}

#[derive(Debug, Clone)]
struct TagCandidate {
	doc: usize,
	base: f32,
	origins: Vec<String>,
}

impl CompanionService {
	pub async fn recommend(&self, req: RecommendRequest) -> Result<RecommendResponse> {
		let top_k = crate::page_size(
			req.top_k,
			self.cfg.recommend.default_top_k,
			self.cfg.recommend.max_top_k,
			"topk",
		)?;
		let mut tags = normalize_labels(&req.tags);

		if tags.is_empty()
			&& let Some(user_id) = req.user_id.as_deref().filter(|id| !id.trim().is_empty())
		{
			let profile = companion_storage::profiles::get_or_create(&self.db, user_id).await?;

			tags = normalize_labels(profile.interest_tags());
		}

		if tags.is_empty() {
			return self.recommend_popular(top_k).await;
		}

		Ok(self.recommend_by_tags(&tags, top_k))
	}

	fn recommend_by_tags(&self, tags: &[String], top_k: usize) -> RecommendResponse {
		let snapshot = self.index.current();
		let index = &snapshot.index;
		let expanded = self.expansion.expand(tags);
		let chunk_tags: Vec<String> = expanded.iter().map(|(tag, _)| tag.clone()).collect();
		let candidates = score_tag_candidates(index, &expanded, &index.lookup_by_tags(&chunk_tags));
		let picked = diversify(index, candidates, self.cfg.recommend.episode_penalty, top_k);
		let max = picked.first().map(|(_, score)| *score).unwrap_or(0.0);
		let snippet_chars = self.cfg.search.snippet_chars as usize;
		let mut items = Vec::with_capacity(picked.len());
		let mut reasons = Vec::with_capacity(picked.len());

		for (candidate, score) in picked {
			let Some(chunk) = index.chunk(candidate.doc) else { continue };
			let score = if max > 0.0 { (score / max).clamp(0.0, 1.0) } else { 0.0 };

			items.push(SearchItem::from_chunk(chunk, score, snippet_chars));
			reasons.push(format!("matches your focus on {}", candidate.origins.join(", ")));
		}

		tracing::debug!(tags = ?tags, items = items.len(), "Tag recommendation served.");

		RecommendResponse { items, reasons }
	}

	/// Ranks chunks by positive engagement (`like`, `completed`) across all users, counting both
	/// events that name a chunk and events on a protocol sourced from that chunk. Chunks without
	/// engagement fill the remainder in `chunk_id` order.
	async fn recommend_popular(&self, top_k: usize) -> Result<RecommendResponse> {
		let upto = events::watermark(&self.db).await?;
		let by_chunk = events::chunk_counts(&self.db, upto).await?;
		let by_protocol = events::protocol_counts(&self.db, upto).await?;
		let snapshot = self.index.current();
		let index = &snapshot.index;
		let mut popularity: HashMap<usize, i64> = HashMap::new();

		for count in by_chunk.iter().filter(|count| is_positive(&count.event)) {
			if let Some(doc) = index.doc_of(&count.key) {
				*popularity.entry(doc).or_insert(0) += count.count;
			}
		}
		for count in by_protocol.iter().filter(|count| is_positive(&count.event)) {
			let doc = snapshot
				.protocol(&count.key)
				.and_then(|protocol| protocol.source.as_ref())
				.and_then(|source| index.doc_at(&source.episode_id, source.chunk_index));

			if let Some(doc) = doc {
				*popularity.entry(doc).or_insert(0) += count.count;
			}
		}

		let mut ranked: Vec<(usize, i64)> = (0..index.len())
			.map(|doc| (doc, popularity.get(&doc).copied().unwrap_or(0)))
			.collect();

		ranked.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));
		ranked.truncate(top_k);

		let max = ranked.first().map(|(_, count)| *count).unwrap_or(0);
		let snippet_chars = self.cfg.search.snippet_chars as usize;
		let mut items = Vec::with_capacity(ranked.len());
		let mut reasons = Vec::with_capacity(ranked.len());

		for (doc, count) in ranked {
			let Some(chunk) = index.chunk(doc) else { continue };
			let score = if max > 0 { count as f32 / max as f32 } else { 0.0 };

			items.push(SearchItem::from_chunk(chunk, score, snippet_chars));
			reasons.push(if count > 0 { POPULAR_REASON } else { LIBRARY_REASON }.to_string());
		}

		tracing::debug!(items = items.len(), watermark = upto, "Popularity recommendation served.");

		Ok(RecommendResponse { items, reasons })
	}
}

fn is_positive(event: &str) -> bool {
	event.parse::<EventKind>().map(EventKind::is_positive).unwrap_or(false)
}

/// Scores each candidate by the rarity of the expanded tags it carries: every matched chunk tag
/// adds `ln(1 + N / df)`.
fn score_tag_candidates(
	index: &CorpusIndex,
	expanded: &[(String, String)],
	docs: &[usize],
) -> Vec<TagCandidate> {
	let n = index.len() as f32;
	let mut out = Vec::with_capacity(docs.len());

	for &doc in docs {
		let Some(chunk) = index.chunk(doc) else { continue };
		let mut base = 0.0_f32;
		let mut origins: Vec<String> = Vec::new();

		for (tag, origin) in expanded {
			if !chunk.record.tags.contains(tag) {
				continue;
			}

			let df = index.tag_frequency(tag).max(1) as f32;

			base += (1.0 + n / df).ln();

			if !origins.contains(origin) {
				origins.push(origin.clone());
			}
		}

		if base > 0.0 {
			out.push(TagCandidate { doc, base, origins });
		}
	}

	out
}

/// Greedy selection where each pick is discounted by `(1 - penalty)` once for every chunk of the
/// same episode already selected. Returns picks with their discounted scores, best first.
fn diversify(
	index: &CorpusIndex,
	mut remaining: Vec<TagCandidate>,
	penalty: f32,
	top_k: usize,
) -> Vec<(TagCandidate, f32)> {
	let keep = 1.0 - penalty;
	let mut per_episode: HashMap<String, i32> = HashMap::new();
	let mut picked = Vec::with_capacity(top_k.min(remaining.len()));

	while picked.len() < top_k && !remaining.is_empty() {
		let adjusted = |candidate: &TagCandidate| {
			let seen = index
				.chunk(candidate.doc)
				.and_then(|chunk| per_episode.get(&chunk.record.episode_id))
				.copied()
				.unwrap_or(0);

			candidate.base * keep.powi(seen)
		};
		let mut best = 0;

		for position in 1..remaining.len() {
			let order = cmp_f32_desc(adjusted(&remaining[position]), adjusted(&remaining[best]))
				.then_with(|| remaining[position].doc.cmp(&remaining[best].doc));

			if order.is_lt() {
				best = position;
			}
		}

		let score = adjusted(&remaining[best]);
		let candidate = remaining.swap_remove(best);

		if let Some(chunk) = index.chunk(candidate.doc) {
			*per_episode.entry(chunk.record.episode_id.clone()).or_insert(0) += 1;
		}

		picked.push((candidate, score));
	}

	picked
}
