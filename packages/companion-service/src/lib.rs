pub mod admin;
pub mod bandit;
pub mod events;
pub mod explain;
pub mod next;
pub mod profile;
pub mod recommend;
pub mod search;
pub mod time_serde;

mod error;

pub use admin::{HealthResponse, RefreshResponse};
pub use error::{Error, Result};
pub use events::{EventRequest, EventResponse};
pub use explain::{ExplainRequest, ExplainResponse};
pub use next::{NextRequest, NextResponse, ProtocolCopy};
pub use profile::ProfilePatch;
pub use recommend::{RecommendRequest, RecommendResponse};
pub use search::{SearchItem, SearchMode, SearchRequest, SearchResponse};

use std::sync::{Arc, Mutex};

use rand::{RngCore, SeedableRng, rngs::StdRng};

use companion_config::Config;
use companion_domain::TagExpansion;
use companion_index::{IndexSettings, SnapshotHandle};
use companion_storage::db::Db;

pub struct CompanionService {
	pub cfg: Config,
	pub db: Db,
	pub index: Arc<SnapshotHandle>,
	expansion: TagExpansion,
	rng: Mutex<Box<dyn RngCore + Send>>,
}
impl CompanionService {
	/// Exploration draws come from `bandit.seed` when set, OS entropy otherwise.
	pub fn new(cfg: Config, db: Db, index: SnapshotHandle) -> Self {
		let rng: Box<dyn RngCore + Send> = match cfg.bandit.seed {
			Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
			None => Box::new(StdRng::from_entropy()),
		};

		Self::with_rng(cfg, db, index, rng)
	}

	pub fn with_rng(
		cfg: Config,
		db: Db,
		index: SnapshotHandle,
		rng: Box<dyn RngCore + Send>,
	) -> Self {
		let expansion = TagExpansion::from_config(&cfg.recommend);

		Self { cfg, db, index: Arc::new(index), expansion, rng: Mutex::new(rng) }
	}

	/// Opens the database, applies the schema, and builds the first index snapshot.
	pub async fn bootstrap(cfg: Config) -> Result<Self> {
		let db = Db::connect(&cfg.storage.sqlite).await?;

		db.ensure_schema().await?;

		let dir = cfg.storage.artifacts_dir.clone();
		let settings = IndexSettings::from_config(&cfg.search);
		let index = tokio::task::spawn_blocking(move || SnapshotHandle::load(&dir, settings))
			.await
			.map_err(|err| Error::IndexBuild {
				message: format!("Index load task failed: {err}."),
			})??;
		let snapshot = index.current();

		tracing::info!(
			chunks = snapshot.index.len(),
			protocols = snapshot.protocols.len(),
			"Corpus index loaded."
		);

		Ok(Self::new(cfg, db, index))
	}

	pub(crate) fn index_settings(&self) -> IndexSettings {
		IndexSettings::from_config(&self.cfg.search)
	}
}

pub(crate) fn page_size(
	requested: Option<u32>,
	default: u32,
	max: u32,
	field: &str,
) -> Result<usize> {
	let value = requested.unwrap_or(default);

	if value == 0 || value > max {
		return Err(Error::InvalidRequest {
			message: format!("{field} must be between 1 and {max}."),
		});
	}

	Ok(value as usize)
}

pub(crate) fn require_user_id(user_id: &str) -> Result<&str> {
	let trimmed = user_id.trim();

	if trimmed.is_empty() {
		return Err(Error::InvalidRequest { message: "user_id must be non-empty.".to_string() });
	}

	Ok(trimmed)
}
