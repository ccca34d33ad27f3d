mod error;

pub use error::{Error, Result};

use std::{fs, path::Path};

use tempfile::TempDir;

use companion_config::{Bandit, Config, Recommend, Search, Security, Service, Sqlite, Storage};
use companion_domain::{ChunkRecord, Protocol, ProtocolSource, Track};

pub const TEST_API_KEY: &str = "test-key";
pub const MEMORY_DSN: &str = "sqlite::memory:";

/// Temporary artifacts directory removed on drop.
pub struct TestArtifacts {
	dir: TempDir,
}
impl TestArtifacts {
	pub fn new(chunks: &[ChunkRecord], protocols: &[Protocol]) -> Result<Self> {
		let artifacts = Self { dir: TempDir::new()? };

		artifacts.write_chunks(chunks)?;
		artifacts.write_protocols(protocols)?;

		Ok(artifacts)
	}

	/// The sample corpus and protocol catalogue.
	pub fn sample() -> Result<Self> {
		Self::new(&sample_chunks(), &sample_protocols())
	}

	pub fn path(&self) -> &Path {
		self.dir.path()
	}

	pub fn write_chunks(&self, chunks: &[ChunkRecord]) -> Result<()> {
		let mut out = String::new();

		for chunk in chunks {
			out.push_str(&serde_json::to_string(chunk)?);
			out.push('\n');
		}

		fs::write(self.dir.path().join("chunks.jsonl"), out)?;

		Ok(())
	}

	/// Writes raw text as `chunks.jsonl`, for corrupt-artifact tests.
	pub fn write_raw_chunks(&self, raw: &str) -> Result<()> {
		fs::write(self.dir.path().join("chunks.jsonl"), raw)?;

		Ok(())
	}

	/// An empty slice removes the catalogue file.
	pub fn write_protocols(&self, protocols: &[Protocol]) -> Result<()> {
		let path = self.dir.path().join("protocol_cards.json");

		if protocols.is_empty() {
			if path.exists() {
				fs::remove_file(path)?;
			}

			return Ok(());
		}

		fs::write(path, serde_json::to_string_pretty(protocols)?)?;

		Ok(())
	}

	/// A config pointing at this directory and a single-connection in-memory database.
	pub fn config(&self) -> Config {
		test_config(self.path())
	}
}

pub fn test_config(artifacts_dir: &Path) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			artifacts_dir: artifacts_dir.to_path_buf(),
			sqlite: Sqlite { dsn: MEMORY_DSN.to_string(), pool_max_conns: 1 },
		},
		search: Search::default(),
		recommend: Recommend::default(),
		bandit: Bandit { seed: Some(7), ..Bandit::default() },
		security: Security {
			bind_localhost_only: true,
			api_key: Some(TEST_API_KEY.to_string()),
			protect_writes: false,
		},
	}
}

pub fn chunk(episode_id: &str, chunk_index: u32, text: &str, tags: &[&str]) -> ChunkRecord {
	let title_sent = text.split_inclusive('.').next().unwrap_or(text).trim().to_string();
	let why_sent = text.split_inclusive('.').nth(1).unwrap_or_default().trim().to_string();

	ChunkRecord {
		chunk_id: ChunkRecord::chunk_id_for(episode_id, chunk_index),
		episode_id: episode_id.to_string(),
		episode_title: episode_title(episode_id),
		chunk_index,
		title_sent,
		why_sent,
		text: text.to_string(),
		tags: tags.iter().map(|tag| tag.to_string()).collect(),
	}
}

fn episode_title(episode_id: &str) -> String {
	let stem = episode_id.trim_start_matches("ep_").replace('_', " ");
	let mut chars = stem.chars();

	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

pub fn sample_chunks() -> Vec<ChunkRecord> {
	vec![
		chunk(
			"ep_light",
			0,
			"Morning sunlight exposure sets the circadian clock. Viewing light within an hour of waking improves sleep at night.",
			&["sleep", "circadian"],
		),
		chunk(
			"ep_light",
			1,
			"Avoid bright light late in the evening. Dim lights support melatonin release and deeper sleep.",
			&["sleep"],
		),
		chunk(
			"ep_light",
			2,
			"Caffeine timing matters for energy. Delay caffeine by ninety minutes after waking to avoid the afternoon crash.",
			&["energy"],
		),
		chunk(
			"ep_focus",
			0,
			"Focus improves with short bouts of deliberate attention. Work in ninety minute blocks and then rest.",
			&["focus", "attention"],
		),
		chunk(
			"ep_focus",
			1,
			"Non sleep deep rest restores focus. Ten minutes of deliberate rest lifts cognitive performance.",
			&["focus", "recovery"],
		),
		chunk(
			"ep_cold",
			0,
			"Cold exposure raises dopamine and energy for hours. A deliberate cold plunge in the morning boosts alertness.",
			&["energy", "metabolic"],
		),
	]
}

pub fn protocol(slug: &str, track: Track, source: Option<(&str, u32)>) -> Protocol {
	Protocol {
		slug: slug.to_string(),
		title: slug.replace('-', " "),
		action: format!("Do {slug} today."),
		why: format!("{slug} supports your {track} goal."),
		how: String::new(),
		track: Some(track),
		tags: vec![track.as_str().to_string()],
		citations: Vec::new(),
		variants: Vec::new(),
		source: source.map(|(episode_id, chunk_index)| ProtocolSource {
			episode_id: episode_id.to_string(),
			chunk_index,
		}),
	}
}

pub fn sample_protocols() -> Vec<Protocol> {
	let mut morning_light = protocol("morning-light", Track::Sleep, Some(("ep_light", 0)));
	let mut focus_blocks = protocol("focus-blocks", Track::Focus, Some(("ep_focus", 0)));

	morning_light.variants = vec!["default".to_string(), "short".to_string()];
	morning_light.tags.push("circadian".to_string());
	focus_blocks.variants = vec!["default".to_string(), "timer".to_string()];

	vec![
		morning_light,
		protocol("evening-dim", Track::Sleep, Some(("ep_light", 1))),
		protocol("caffeine-delay", Track::Energy, Some(("ep_light", 2))),
		focus_blocks,
		protocol("cold-plunge", Track::Energy, Some(("ep_cold", 0))),
	]
}
