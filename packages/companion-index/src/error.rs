use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Index build failed: {message}")]
	IndexBuild { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Failed to read artifact at {path:?}.")]
	ReadArtifact { path: PathBuf, source: std::io::Error },
	#[error("Failed to parse artifact at {path:?} (line {line}): {source}")]
	ParseArtifact { path: PathBuf, line: usize, source: serde_json::Error },
	#[error("Failed to write artifact at {path:?}.")]
	WriteArtifact { path: PathBuf, source: std::io::Error },
	#[error(transparent)]
	Encode(#[from] serde_json::Error),
}
