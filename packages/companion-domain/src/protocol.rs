use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub const DEFAULT_VARIANT: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
	Sleep,
	Focus,
	Energy,
}
impl Track {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Sleep => "sleep",
			Self::Focus => "focus",
			Self::Energy => "energy",
		}
	}
}
impl FromStr for Track {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"sleep" => Ok(Self::Sleep),
			"focus" => Ok(Self::Focus),
			"energy" => Ok(Self::Energy),
			other => Err(format!("Unknown track {other:?}.")),
		}
	}
}
impl fmt::Display for Track {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolSource {
	pub episode_id: String,
	pub chunk_index: u32,
}

/// A curated protocol card from `protocol_cards.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
	pub slug: String,
	pub title: String,
	pub action: String,
	pub why: String,
	#[serde(default)]
	pub how: String,
	#[serde(default)]
	pub track: Option<Track>,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub citations: Vec<String>,
	#[serde(default)]
	pub variants: Vec<String>,
	#[serde(default)]
	pub source: Option<ProtocolSource>,
}
impl Protocol {
	pub fn matches_goal(&self, goal: &str) -> bool {
		self.track.map(|track| track.as_str() == goal).unwrap_or(false)
			|| self.tags.iter().any(|tag| tag == goal)
	}

	/// Presentation variants; a card without any has the single `default` variant.
	pub fn variants(&self) -> Vec<&str> {
		if self.variants.is_empty() {
			return vec![DEFAULT_VARIANT];
		}

		self.variants.iter().map(String::as_str).collect()
	}
}
