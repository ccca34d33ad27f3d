use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{CompanionService, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
	pub status: String,
	pub chunks: usize,
	pub protocols: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
	pub status: String,
	pub chunks: usize,
}

impl CompanionService {
	pub fn health(&self) -> HealthResponse {
		let snapshot = self.index.current();

		HealthResponse {
			status: "ok".to_string(),
			chunks: snapshot.index.len(),
			protocols: snapshot.protocols.len(),
		}
	}

	/// Rebuilds the index from the artifact directory off the async runtime and publishes it.
	/// On failure the previous snapshot keeps serving.
	pub async fn refresh(&self) -> Result<RefreshResponse> {
		let handle = Arc::clone(&self.index);
		let dir = self.cfg.storage.artifacts_dir.clone();
		let settings = self.index_settings();
		let rebuilt = tokio::task::spawn_blocking(move || handle.rebuild(&dir, settings))
			.await
			.map_err(|err| Error::IndexBuild {
				message: format!("Index rebuild task failed: {err}."),
			})?;
		let snapshot = match rebuilt {
			Ok(snapshot) => snapshot,
			Err(err) => {
				tracing::error!(error = %err, "Index refresh failed; keeping the live snapshot.");

				return Err(Error::IndexBuild { message: err.to_string() });
			},
		};

		tracing::info!(
			version = snapshot.version,
			chunks = snapshot.index.len(),
			protocols = snapshot.protocols.len(),
			"Corpus index refreshed."
		);

		Ok(RefreshResponse { status: "reloaded".to_string(), chunks: snapshot.index.len() })
	}
}
