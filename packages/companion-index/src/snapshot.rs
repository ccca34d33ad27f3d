use std::{
	collections::HashMap,
	path::Path,
	sync::{
		Arc, PoisonError, RwLock,
		atomic::{AtomicU64, Ordering},
	},
};

use time::OffsetDateTime;

use companion_domain::Protocol;

use crate::{Artifacts, CorpusIndex, Error, IndexSettings, Result};

/// One consistent, immutable view of the corpus and the protocol catalogue.
#[derive(Debug)]
pub struct IndexSnapshot {
	pub version: u64,
	pub index: CorpusIndex,
	pub protocols: Vec<Protocol>,
	pub loaded_at: OffsetDateTime,
	by_slug: HashMap<String, usize>,
}
impl IndexSnapshot {
	pub fn build(version: u64, artifacts: Artifacts, settings: IndexSettings) -> Result<Self> {
		let index = CorpusIndex::build(artifacts.chunks, settings)?;
		let mut protocols = artifacts.protocols;

		protocols.sort_by(|left, right| left.slug.cmp(&right.slug));

		let mut by_slug = HashMap::with_capacity(protocols.len());

		for (position, protocol) in protocols.iter().enumerate() {
			if protocol.slug.trim().is_empty() {
				return Err(Error::IndexBuild {
					message: format!("Protocol at position {position} has an empty slug."),
				});
			}
			if by_slug.insert(protocol.slug.clone(), position).is_some() {
				return Err(Error::IndexBuild {
					message: format!("Duplicate protocol slug {:?}.", protocol.slug),
				});
			}
			if let Some(source) = protocol.source.as_ref()
				&& index.doc_at(&source.episode_id, source.chunk_index).is_none()
			{
				tracing::warn!(
					slug = %protocol.slug,
					episode_id = %source.episode_id,
					chunk_index = source.chunk_index,
					"Protocol source chunk is not in the corpus."
				);
			}
		}

		Ok(Self { version, index, protocols, loaded_at: OffsetDateTime::now_utc(), by_slug })
	}

	pub fn protocol(&self, slug: &str) -> Option<&Protocol> {
		self.by_slug.get(slug).map(|&position| &self.protocols[position])
	}
}

/// Single swappable reference to the live [`IndexSnapshot`].
///
/// Readers clone the `Arc` and keep it for the whole request; a refresh builds the replacement
/// completely before taking the write lock, so readers see either the old or the new snapshot.
#[derive(Debug)]
pub struct SnapshotHandle {
	current: RwLock<Arc<IndexSnapshot>>,
	next_version: AtomicU64,
}
impl SnapshotHandle {
	pub fn new(snapshot: IndexSnapshot) -> Self {
		let next_version = snapshot.version + 1;

		Self {
			current: RwLock::new(Arc::new(snapshot)),
			next_version: AtomicU64::new(next_version),
		}
	}

	pub fn load(dir: &Path, settings: IndexSettings) -> Result<Self> {
		let snapshot = IndexSnapshot::build(1, Artifacts::load(dir)?, settings)?;

		Ok(Self::new(snapshot))
	}

	pub fn current(&self) -> Arc<IndexSnapshot> {
		self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
	}

	/// Builds a fresh snapshot from `dir` and publishes it. On failure the live snapshot is left
	/// untouched.
	pub fn rebuild(&self, dir: &Path, settings: IndexSettings) -> Result<Arc<IndexSnapshot>> {
		let artifacts = Artifacts::load(dir)?;
		let version = self.next_version.fetch_add(1, Ordering::SeqCst);
		let snapshot = IndexSnapshot::build(version, artifacts, settings)?;

		Ok(self.publish(snapshot))
	}

	/// Replaces the live snapshot unless a newer one was published concurrently.
	pub fn publish(&self, snapshot: IndexSnapshot) -> Arc<IndexSnapshot> {
		let snapshot = Arc::new(snapshot);
		let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);

		if snapshot.version > current.version {
			*current = snapshot;
		}

		current.clone()
	}
}
