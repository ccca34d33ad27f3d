use companion_index::{
	Artifacts, CorpusIndex, Error, IndexSettings, LexicalScorer, RankedChunk, SemanticScorer,
	SnapshotHandle,
};
use companion_testkit::{TestArtifacts, chunk, sample_chunks};

fn sample_index() -> CorpusIndex {
	CorpusIndex::build(sample_chunks(), IndexSettings::default()).expect("Failed to build index.")
}

fn chunk_ids(index: &CorpusIndex, items: &[RankedChunk]) -> Vec<String> {
	items
		.iter()
		.filter_map(|item| index.chunk(item.doc).map(|chunk| chunk.chunk_id().to_string()))
		.collect()
}

#[test]
fn repeated_queries_are_identical() {
	let index = sample_index();

	for _ in 0..3 {
		assert_eq!(
			LexicalScorer::new(&index).rank("light sleep", None, 0, 10),
			LexicalScorer::new(&index).rank("light sleep", None, 0, 10)
		);
		assert_eq!(
			SemanticScorer::new(&index).rank("deliberate rest", None, 0, 10),
			SemanticScorer::new(&index).rank("deliberate rest", None, 0, 10)
		);
	}
}

#[test]
fn scores_are_normalized_with_a_top_of_one() {
	let index = sample_index();
	let lexical = LexicalScorer::new(&index).rank("caffeine energy", None, 0, 10);
	let semantic = SemanticScorer::new(&index).rank("cold plunge energy", None, 0, 10);

	for page in [&lexical, &semantic] {
		assert!(!page.items.is_empty());
		assert!(page.items.iter().all(|item| (0.0..=1.0).contains(&item.score)));
	}

	assert_eq!(lexical.items[0].score, 1.0);
}

#[test]
fn pages_concatenate_for_both_modes() {
	let index = sample_index();

	for limit in 1..=2 {
		let lexical = LexicalScorer::new(&index);
		let mut joined = lexical.rank("light deliberate energy", None, 0, limit).items;

		joined.extend(lexical.rank("light deliberate energy", None, limit, limit).items);

		assert_eq!(joined, lexical.rank("light deliberate energy", None, 0, 2 * limit).items);

		let semantic = SemanticScorer::new(&index);
		let mut joined = semantic.rank("morning light", None, 0, limit).items;

		joined.extend(semantic.rank("morning light", None, limit, limit).items);

		assert_eq!(joined, semantic.rank("morning light", None, 0, 2 * limit).items);
	}
}

#[test]
fn tag_lookup_intersects_and_empty_returns_everything() {
	let index = CorpusIndex::build(
		vec![
			chunk("ep_a", 0, "First chunk.", &["sleep"]),
			chunk("ep_a", 1, "Second chunk.", &["focus"]),
			chunk("ep_b", 0, "Third chunk.", &["Sleep", "energy"]),
		],
		IndexSettings::default(),
	)
	.expect("Failed to build index.");
	let docs = index.lookup_by_tags(&["sleep".to_string()]);
	let ids: Vec<&str> =
		docs.iter().filter_map(|&doc| index.chunk(doc).map(|chunk| chunk.chunk_id())).collect();

	assert_eq!(ids, vec!["ep_a__0000", "ep_b__0000"]);
	assert_eq!(index.lookup_by_tags(&[]).len(), 3);
	assert!(index.lookup_by_tags(&["nutrition".to_string()]).is_empty());
}

#[test]
fn semantic_filter_limits_candidates() {
	let index = sample_index();
	let filter = index.lookup_by_tags(&["focus".to_string()]);
	let page = SemanticScorer::new(&index).rank("deliberate", Some(&filter), 0, 10);
	let ids = chunk_ids(&index, &page.items);

	assert!(!ids.is_empty());
	assert!(ids.iter().all(|id| id.starts_with("ep_focus")), "Unexpected: {ids:?}");
}

#[test]
fn vector_lookup_reports_unknown_ids() {
	let index = sample_index();

	assert!(index.vector_of("ep_light__0000").is_ok());
	assert!(matches!(index.vector_of("ep_missing__0000"), Err(Error::NotFound { .. })));
}

#[test]
fn duplicate_chunk_ids_fail_the_build() {
	let mut chunks = sample_chunks();

	chunks.push(chunks[0].clone());

	assert!(matches!(
		CorpusIndex::build(chunks, IndexSettings::default()),
		Err(Error::IndexBuild { .. })
	));
}

#[test]
fn failed_rebuild_keeps_the_live_snapshot() {
	let artifacts = TestArtifacts::sample().expect("Failed to write artifacts.");
	let handle = SnapshotHandle::load(artifacts.path(), IndexSettings::default())
		.expect("Failed to load snapshot.");
	let before = handle.current();

	artifacts.write_raw_chunks("{\"chunk_id\": \"broken\"").expect("Failed to corrupt chunks.");

	assert!(handle.rebuild(artifacts.path(), IndexSettings::default()).is_err());
	assert_eq!(handle.current().version, before.version);
	assert_eq!(handle.current().index.len(), sample_chunks().len());

	artifacts.write_chunks(&sample_chunks()[..2]).expect("Failed to rewrite chunks.");

	let after =
		handle.rebuild(artifacts.path(), IndexSettings::default()).expect("Failed to rebuild.");

	assert!(after.version > before.version);
	assert_eq!(handle.current().index.len(), 2);
	assert_eq!(before.index.len(), sample_chunks().len());
}

#[test]
fn protocols_are_indexed_by_slug() {
	let artifacts = TestArtifacts::sample().expect("Failed to write artifacts.");
	let loaded = Artifacts::load(artifacts.path()).expect("Failed to read artifacts.");
	let handle = SnapshotHandle::load(artifacts.path(), IndexSettings::default())
		.expect("Failed to load snapshot.");
	let snapshot = handle.current();

	assert_eq!(snapshot.protocols.len(), loaded.protocols.len());
	assert!(snapshot.protocol("morning-light").is_some());
	assert!(snapshot.protocol("unknown").is_none());
}
