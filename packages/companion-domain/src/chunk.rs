use serde::{Deserialize, Serialize};

/// One line of `chunks.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
	pub chunk_id: String,
	pub episode_id: String,
	#[serde(default)]
	pub episode_title: String,
	pub chunk_index: u32,
	#[serde(default)]
	pub title_sent: String,
	#[serde(default)]
	pub why_sent: String,
	#[serde(default)]
	pub text: String,
	#[serde(default)]
	pub tags: Vec<String>,
}
impl ChunkRecord {
	pub fn chunk_id_for(episode_id: &str, chunk_index: u32) -> String {
		format!("{episode_id}__{chunk_index:04}")
	}

	/// Returns the name of the first required field that is blank.
	pub fn missing_field(&self) -> Option<&'static str> {
		if self.chunk_id.trim().is_empty() {
			return Some("chunk_id");
		}
		if self.episode_id.trim().is_empty() {
			return Some("episode_id");
		}
		if self.title_sent.trim().is_empty() {
			return Some("title_sent");
		}
		if self.text.trim().is_empty() {
			return Some("text");
		}

		None
	}
}

/// Truncates to `max_chars` characters, flattening newlines and appending an ellipsis when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
	let mut out = String::with_capacity(text.len().min(max_chars * 4));
	let mut chars = text.chars();

	for ch in chars.by_ref().take(max_chars) {
		out.push(if ch == '\n' { ' ' } else { ch });
	}

	if chars.next().is_some() {
		out.push('…');
	}

	out
}

/// Plain prefix of at most `max_chars` characters.
pub fn prefix(text: &str, max_chars: usize) -> String {
	text.chars().take(max_chars).collect()
}
