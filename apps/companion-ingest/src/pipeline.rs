use std::{
	collections::BTreeMap,
	fs,
	io::ErrorKind,
	path::{Path, PathBuf},
};

use color_eyre::{
	Result,
	eyre::{self, WrapErr},
};

use companion_chunking::{ChunkingConfig, KeywordTagger, SegmentedEpisode};
use companion_domain::ChunkRecord;
use companion_index::artifacts::{self, CHUNKS_FILE};

use crate::manifest::{FileEntry, MANIFEST_FILE, Manifest};

pub const PROCESSED_DIR: &str = "processed";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
	pub scanned: usize,
	pub segmented: usize,
	pub unchanged: usize,
	pub removed: usize,
	pub chunks: usize,
}

/// A raw transcript discovered in the input directory.
#[derive(Debug)]
struct RawTranscript {
	name: String,
	title: String,
	episode_id: String,
	path: PathBuf,
}

pub struct Pipeline {
	raw_dir: PathBuf,
	artifacts_dir: PathBuf,
	chunking: ChunkingConfig,
	tagger: KeywordTagger,
}
impl Pipeline {
	pub fn new(raw_dir: PathBuf, artifacts_dir: PathBuf) -> Result<Self> {
		Ok(Self {
			raw_dir,
			artifacts_dir,
			chunking: ChunkingConfig::default(),
			tagger: KeywordTagger::default_lexicon()?,
		})
	}

	pub fn processed_path(&self, episode_id: &str) -> PathBuf {
		self.artifacts_dir.join(PROCESSED_DIR).join(format!("{episode_id}.chunks.json"))
	}

	/// Segments new or changed transcripts, drops outputs of deleted ones, and rewrites
	/// `chunks.jsonl` from every processed episode.
	pub fn run(&self, force: bool) -> Result<IngestReport> {
		fs::create_dir_all(self.artifacts_dir.join(PROCESSED_DIR)).wrap_err_with(|| {
			format!("Failed to create {}.", self.artifacts_dir.join(PROCESSED_DIR).display())
		})?;

		let manifest_path = self.artifacts_dir.join(MANIFEST_FILE);
		let previous = Manifest::load(&manifest_path)?;
		let transcripts = self.discover()?;
		let mut report = IngestReport { scanned: transcripts.len(), ..Default::default() };
		let mut next = Manifest::default();

		for transcript in &transcripts {
			let bytes = fs::read(&transcript.path)
				.wrap_err_with(|| format!("Failed to read {}.", transcript.path.display()))?;
			let entry = FileEntry::of(&bytes);
			let output = self.processed_path(&transcript.episode_id);

			if !force && previous.is_unchanged(&transcript.name, &entry) && output.exists() {
				report.unchanged += 1;
			} else {
				let text = String::from_utf8_lossy(&bytes);
				let episode = companion_chunking::segment_episode(
					&transcript.episode_id,
					&transcript.title,
					&text,
					&self.chunking,
					&self.tagger,
				);

				write_episode(&output, &episode)?;

				tracing::info!(
					file = %transcript.name,
					episode_id = %transcript.episode_id,
					chunks = episode.chunks.len(),
					"Transcript segmented."
				);

				report.segmented += 1;
			}

			next.files.insert(transcript.name.clone(), entry);
		}

		for name in previous.files.keys().filter(|name| !next.files.contains_key(*name)) {
			let episode_id = companion_chunking::episode_id_for(&stem_of(name));

			report.removed += 1;

			// A renamed transcript can keep its episode id.
			if transcripts.iter().any(|transcript| transcript.episode_id == episode_id) {
				continue;
			}
			if remove_if_present(&self.processed_path(&episode_id))? {
				tracing::info!(file = %name, %episode_id, "Removed output of deleted transcript.");
			}
		}

		next.count = next.files.len();
		next.save(&manifest_path)?;

		let chunks = self.merge(&transcripts)?;

		report.chunks = chunks.len();

		artifacts::write_chunks(&self.artifacts_dir.join(CHUNKS_FILE), &chunks)?;

		Ok(report)
	}

	fn discover(&self) -> Result<Vec<RawTranscript>> {
		let entries = fs::read_dir(&self.raw_dir)
			.wrap_err_with(|| format!("Failed to list {}.", self.raw_dir.display()))?;
		let mut transcripts = Vec::new();
		let mut owners: BTreeMap<String, String> = BTreeMap::new();

		for entry in entries {
			let path = entry?.path();

			if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("txt") {
				continue;
			}

			let Some(name) = path.file_name().and_then(|name| name.to_str()).map(str::to_string)
			else {
				tracing::warn!(
					path = %path.display(),
					"Skipping transcript with a non-UTF-8 name."
				);

				continue;
			};
			let title = stem_of(&name);
			let episode_id = companion_chunking::episode_id_for(&title);

			if let Some(other) = owners.insert(episode_id.clone(), name.clone()) {
				return Err(eyre::eyre!(
					"Transcripts {other:?} and {name:?} both map to episode {episode_id:?}."
				));
			}

			transcripts.push(RawTranscript { name, title, episode_id, path });
		}

		transcripts.sort_by(|left, right| left.name.cmp(&right.name));

		Ok(transcripts)
	}

	fn merge(&self, transcripts: &[RawTranscript]) -> Result<Vec<ChunkRecord>> {
		let mut chunks = Vec::new();

		for transcript in transcripts {
			let path = self.processed_path(&transcript.episode_id);
			let raw = fs::read_to_string(&path)
				.wrap_err_with(|| format!("Failed to read {}.", path.display()))?;
			let episode: SegmentedEpisode = serde_json::from_str(&raw)
				.wrap_err_with(|| format!("Failed to parse {}.", path.display()))?;

			chunks.extend(episode.chunks);
		}

		chunks.sort_by(|left, right| left.chunk_id.cmp(&right.chunk_id));

		Ok(chunks)
	}
}

fn stem_of(name: &str) -> String {
	Path::new(name).file_stem().and_then(|stem| stem.to_str()).unwrap_or(name).to_string()
}

fn write_episode(path: &Path, episode: &SegmentedEpisode) -> Result<()> {
	let raw = serde_json::to_string_pretty(episode)?;

	fs::write(path, raw).wrap_err_with(|| format!("Failed to write {}.", path.display()))
}

fn remove_if_present(path: &Path) -> Result<bool> {
	match fs::remove_file(path) {
		Ok(()) => Ok(true),
		Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
		Err(err) => Err(err).wrap_err_with(|| format!("Failed to remove {}.", path.display())),
	}
}
