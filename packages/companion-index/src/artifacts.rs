use std::{
	fs,
	io::ErrorKind,
	path::{Path, PathBuf},
};

use companion_domain::{ChunkRecord, Protocol};

use crate::{Error, Result};

pub const CHUNKS_FILE: &str = "chunks.jsonl";
pub const PROTOCOLS_FILE: &str = "protocol_cards.json";

/// Parsed contents of an artifacts directory.
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
	pub chunks: Vec<ChunkRecord>,
	pub protocols: Vec<Protocol>,
}
impl Artifacts {
	/// Reads `chunks.jsonl` (required) and `protocol_cards.json` (optional) from `dir`.
	pub fn load(dir: &Path) -> Result<Self> {
		let chunks = read_chunks(&dir.join(CHUNKS_FILE))?;
		let protocols = read_protocols(&dir.join(PROTOCOLS_FILE))?;

		Ok(Self { chunks, protocols })
	}
}

pub fn read_chunks(path: &Path) -> Result<Vec<ChunkRecord>> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadArtifact { path: path.to_path_buf(), source: err })?;
	let mut chunks = Vec::new();

	for (line_no, line) in raw.lines().enumerate() {
		let line = line.trim();

		if line.is_empty() {
			continue;
		}

		let record = serde_json::from_str(line).map_err(|err| Error::ParseArtifact {
			path: path.to_path_buf(),
			line: line_no + 1,
			source: err,
		})?;

		chunks.push(record);
	}

	Ok(chunks)
}

/// A missing protocol file is an empty catalogue.
pub fn read_protocols(path: &Path) -> Result<Vec<Protocol>> {
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => {
			tracing::warn!(
				path = %path.display(),
				"Protocol catalogue not found. Serving without protocols."
			);

			return Ok(Vec::new());
		},
		Err(err) => return Err(Error::ReadArtifact { path: path.to_path_buf(), source: err }),
	};

	serde_json::from_str(&raw).map_err(|err| Error::ParseArtifact {
		path: PathBuf::from(path),
		line: err.line(),
		source: err,
	})
}

/// Writes `chunks` as JSON lines, replacing `path` atomically through a sibling temp file.
pub fn write_chunks(path: &Path, chunks: &[ChunkRecord]) -> Result<()> {
	let mut out = String::new();

	for chunk in chunks {
		let line = serde_json::to_string(chunk)?;

		out.push_str(&line);
		out.push('\n');
	}

	let tmp = path.with_extension("jsonl.tmp");

	fs::write(&tmp, out).map_err(|err| Error::WriteArtifact { path: tmp.clone(), source: err })?;
	fs::rename(&tmp, path)
		.map_err(|err| Error::WriteArtifact { path: path.to_path_buf(), source: err })?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn skips_blank_lines_and_reports_bad_line_numbers() {
		let dir = tempfile::tempdir().expect("Failed to create temp dir.");
		let path = dir.path().join(CHUNKS_FILE);

		fs::write(
			&path,
			"{\"chunk_id\":\"a\",\"episode_id\":\"e\",\"chunk_index\":0,\"title_sent\":\"t\",\"text\":\"x\"}\n\n{oops}\n",
		)
		.expect("Failed to write chunks.");

		let err = read_chunks(&path).expect_err("Expected parse error.");

		assert!(matches!(err, Error::ParseArtifact { line: 3, .. }), "Unexpected: {err:?}");
	}

	#[test]
	fn missing_protocol_file_is_empty() {
		let dir = tempfile::tempdir().expect("Failed to create temp dir.");

		assert!(read_protocols(&dir.path().join(PROTOCOLS_FILE)).expect("read").is_empty());
	}

	#[test]
	fn missing_chunks_file_is_an_error() {
		let dir = tempfile::tempdir().expect("Failed to create temp dir.");

		assert!(matches!(Artifacts::load(dir.path()), Err(Error::ReadArtifact { .. })));
	}
}
