use std::{collections::BTreeMap, path::PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub recommend: Recommend,
	#[serde(default)]
	pub bandit: Bandit,
	pub security: Security,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	/// Directory holding `chunks.jsonl` and the optional `protocol_cards.json`.
	pub artifacts_dir: PathBuf,
	pub sqlite: Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sqlite {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	pub default_limit: u32,
	pub max_limit: u32,
	pub snippet_chars: u32,
	pub explain_snippet_chars: u32,
	pub bm25: SearchBm25,
	pub tfidf: SearchTfidf,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			default_limit: 10,
			max_limit: 100,
			snippet_chars: 240,
			explain_snippet_chars: 500,
			bm25: SearchBm25::default(),
			tfidf: SearchTfidf::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchBm25 {
	pub k1: f32,
	pub b: f32,
}
impl Default for SearchBm25 {
	fn default() -> Self {
		Self { k1: 1.5, b: 0.75 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchTfidf {
	pub ngram_max: u32,
	pub max_features: u32,
}
impl Default for SearchTfidf {
	fn default() -> Self {
		Self { ngram_max: 2, max_features: 50_000 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Recommend {
	pub default_top_k: u32,
	pub max_top_k: u32,
	/// Multiplicative discount applied once per higher-ranked chunk from the same episode.
	pub episode_penalty: f32,
	/// Optional. Replaces the built-in track expansion table when present.
	pub tag_expansion: Option<BTreeMap<String, Vec<String>>>,
}
impl Default for Recommend {
	fn default() -> Self {
		Self { default_top_k: 10, max_top_k: 50, episode_penalty: 0.15, tag_expansion: None }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Bandit {
	pub policy: String,
	pub min_observations: u32,
	pub epsilon: f64,
	pub ucb_exploration: f64,
	/// Optional. Seeds the exploration source; unset means OS entropy.
	pub seed: Option<u64>,
	/// Optional. Slug chosen on cold start when it is in the candidate pool.
	pub default_protocol: Option<String>,
	pub rewards: BanditRewards,
}
impl Default for Bandit {
	fn default() -> Self {
		Self {
			policy: "ucb".to_string(),
			min_observations: 3,
			epsilon: 0.1,
			ucb_exploration: 1.0,
			seed: None,
			default_protocol: None,
			rewards: BanditRewards::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BanditRewards {
	pub completed: f64,
	pub like: f64,
	pub skip: f64,
}
impl Default for BanditRewards {
	fn default() -> Self {
		Self { completed: 1.0, like: 0.5, skip: -0.5 }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	pub api_key: Option<String>,
	#[serde(default = "default_protect_writes")]
	pub protect_writes: bool,
}

fn default_protect_writes() -> bool {
	true
}
