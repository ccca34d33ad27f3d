use companion_domain::{
	ChunkRecord, EventKind, Protocol, Track, event::UnknownEventKind, protocol::DEFAULT_VARIANT,
};

#[test]
fn protocol_card_parses_with_optional_fields() {
	let raw = serde_json::json!({
		"slug": "morning-light",
		"title": "Morning sunlight",
		"action": "Get 10 minutes of outdoor light after waking.",
		"why": "Light anchors the circadian clock.",
		"track": "sleep",
		"tags": ["sleep", "circadian"],
		"source": { "episode_id": "ep_light", "chunk_index": 3 }
	});
	let card: Protocol = serde_json::from_value(raw).expect("Failed to parse protocol card.");

	assert_eq!(card.track, Some(Track::Sleep));
	assert!(card.how.is_empty());
	assert!(card.citations.is_empty());
	assert_eq!(card.variants(), vec![DEFAULT_VARIANT]);
	assert_eq!(card.source.as_ref().map(|source| source.chunk_index), Some(3));
}

#[test]
fn unknown_track_is_rejected() {
	let raw = serde_json::json!({
		"slug": "s",
		"title": "t",
		"action": "a",
		"why": "w",
		"track": "mood"
	});

	assert!(serde_json::from_value::<Protocol>(raw).is_err());
}

#[test]
fn chunk_record_reports_missing_text_fields() {
	let raw = serde_json::json!({
		"chunk_id": "ep_a__0000",
		"episode_id": "ep_a",
		"chunk_index": 0,
		"title_sent": "Sleep matters.",
		"text": ""
	});
	let record: ChunkRecord = serde_json::from_value(raw).expect("Failed to parse chunk record.");

	assert_eq!(record.missing_field(), Some("text"));
	assert!(record.tags.is_empty());
}

#[test]
fn event_kinds_round_trip_through_strings() {
	for kind in EventKind::ALL {
		assert_eq!(kind.as_str().parse::<EventKind>(), Ok(kind));
	}

	let err = "share".parse::<EventKind>().expect_err("Expected unknown event kind.");

	assert_eq!(err, UnknownEventKind("share".into()));
	assert_eq!(err.to_string(), "event must be one of completed, like, or skip; got \"share\".");
	assert!(EventKind::Like.is_positive());
	assert!(!EventKind::Skip.is_positive());
}
