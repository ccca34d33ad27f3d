use std::{collections::BTreeMap, fs, io::ErrorKind, path::Path};

use color_eyre::{Result, eyre::WrapErr};
use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "input_manifest.json";

/// Content fingerprint of one raw transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
	pub blake3: String,
	pub size: u64,
}
impl FileEntry {
	pub fn of(bytes: &[u8]) -> Self {
		Self { blake3: blake3::hash(bytes).to_hex().to_string(), size: bytes.len() as u64 }
	}
}

/// Fingerprints of the transcripts seen by the last ingestion run, keyed by file name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
	pub files: BTreeMap<String, FileEntry>,
	pub count: usize,
}
impl Manifest {
	/// A missing manifest is an empty one.
	pub fn load(path: &Path) -> Result<Self> {
		let raw = match fs::read_to_string(path) {
			Ok(raw) => raw,
			Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
			Err(err) => {
				return Err(err).wrap_err_with(|| format!("Failed to read {}.", path.display()));
			},
		};

		serde_json::from_str(&raw).wrap_err_with(|| format!("Failed to parse {}.", path.display()))
	}

	pub fn save(&self, path: &Path) -> Result<()> {
		let raw = serde_json::to_string_pretty(self)?;

		fs::write(path, raw).wrap_err_with(|| format!("Failed to write {}.", path.display()))
	}

	pub fn is_unchanged(&self, name: &str, entry: &FileEntry) -> bool {
		self.files.get(name) == Some(entry)
	}
}
