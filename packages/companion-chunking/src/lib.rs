//! Offline segmentation of episode transcripts into indexable chunks.

pub mod keywords;
pub mod sentences;
pub mod textrank;

pub use keywords::KeywordTagger;

use serde::{Deserialize, Serialize};

use companion_domain::ChunkRecord;

pub const DEFAULT_SENTENCES_PER_CHUNK: usize = 5;

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub sentences_per_chunk: usize,
}
impl Default for ChunkingConfig {
	fn default() -> Self {
		Self { sentences_per_chunk: DEFAULT_SENTENCES_PER_CHUNK }
	}
}

/// Per-episode output written to `processed/<episode_id>.chunks.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentedEpisode {
	pub episode_id: String,
	pub title: String,
	pub chunks: Vec<ChunkRecord>,
}

/// `ep_` followed by the lowercased title with every non-alphanumeric run collapsed to `_`,
/// capped at 100 characters.
pub fn episode_id_for(title: &str) -> String {
	let mut slug = String::with_capacity(title.len());

	for ch in title.to_lowercase().chars() {
		if ch.is_ascii_alphanumeric() {
			slug.push(ch);
		} else if !slug.ends_with('_') {
			slug.push('_');
		}
	}

	let mut slug: String = slug.trim_matches('_').chars().take(100).collect();

	while slug.ends_with('_') {
		slug.pop();
	}

	if slug.is_empty() { "ep_untitled".to_string() } else { format!("ep_{slug}") }
}

/// Splits `raw_text` into sentence groups and derives each chunk's title, why, and tags.
/// Blank transcripts yield no chunks.
pub fn segment_episode(
	episode_id: &str,
	title: &str,
	raw_text: &str,
	cfg: &ChunkingConfig,
	tagger: &KeywordTagger,
) -> SegmentedEpisode {
	let sentences = sentences::split_sentences(raw_text);
	let per_chunk = cfg.sentences_per_chunk.max(1);
	let mut chunks = Vec::with_capacity(sentences.len().div_ceil(per_chunk));

	for (index, group) in sentences.chunks(per_chunk).enumerate() {
		let chosen = textrank::choose(group, 2);
		let pick = |rank: usize| {
			chosen.get(rank).map(|&position| group[position].clone()).unwrap_or_default()
		};
		let title_sent = pick(0);
		let why_sent = pick(1);
		let text = group.join(" ");
		let tags = tagger.tags_for(&text);
		let chunk_index = index as u32;

		chunks.push(ChunkRecord {
			chunk_id: ChunkRecord::chunk_id_for(episode_id, chunk_index),
			episode_id: episode_id.to_string(),
			episode_title: title.to_string(),
			chunk_index,
			title_sent,
			why_sent,
			text,
			tags,
		});
	}

	tracing::debug!(
		episode_id,
		sentences = sentences.len(),
		chunks = chunks.len(),
		"Episode segmented."
	);

	SegmentedEpisode { episode_id: episode_id.to_string(), title: title.to_string(), chunks }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn episode_ids_are_slugged_from_titles() {
		assert_eq!(episode_id_for("Sleep Toolkit: Part 2!"), "ep_sleep_toolkit_part_2");
		assert_eq!(episode_id_for("  ---  "), "ep_untitled");
		assert_eq!(episode_id_for(&"a".repeat(150)).len(), 103);
	}

	#[test]
	fn groups_five_sentences_per_chunk() {
		let tagger = KeywordTagger::default_lexicon().expect("Failed to build tagger.");
		let text = "One sleep fact. Two. Three. Four. Five. Six about caffeine. Seven.";
		let episode =
			segment_episode("ep_test", "Test", text, &ChunkingConfig::default(), &tagger);

		assert_eq!(episode.chunks.len(), 2);
		assert_eq!(episode.chunks[0].chunk_id, "ep_test__0000");
		assert_eq!(episode.chunks[0].text, "One sleep fact. Two. Three. Four. Five.");
		assert_eq!(episode.chunks[0].tags, vec!["sleep"]);
		assert_eq!(episode.chunks[1].chunk_index, 1);
		assert_eq!(episode.chunks[1].title_sent, "Six about caffeine.");
		assert_eq!(episode.chunks[1].why_sent, "Seven.");
		assert_eq!(episode.chunks[1].tags, vec!["energy"]);
	}

	#[test]
	fn blank_transcripts_have_no_chunks() {
		let tagger = KeywordTagger::default_lexicon().expect("Failed to build tagger.");
		let episode =
			segment_episode("ep_blank", "Blank", " \n\t ", &ChunkingConfig::default(), &tagger);

		assert!(episode.chunks.is_empty());
	}
}
