use time::{OffsetDateTime, macros::datetime};

use companion_config::Sqlite;
use companion_domain::EventKind;
use companion_storage::{
	Error,
	db::Db,
	events,
	models::{DailyPick, NewEvent},
	picks, profiles,
};
use companion_testkit::MEMORY_DSN;

async fn memory_db() -> Db {
	let cfg = Sqlite { dsn: MEMORY_DSN.to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to open in-memory database.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

fn event(user_id: &str, kind: EventKind, slug: Option<&str>, variant: Option<&str>) -> NewEvent {
	NewEvent {
		user_id: user_id.to_string(),
		kind,
		protocol_slug: slug.map(str::to_string),
		variant: variant.map(str::to_string),
		score: None,
		chunk_id: None,
		ts: OffsetDateTime::now_utc(),
	}
}

#[tokio::test]
async fn schema_bootstrap_is_idempotent() {
	let db = memory_db().await;

	db.ensure_schema().await.expect("Failed to re-run schema.");
}

#[tokio::test]
async fn appended_events_keep_order_and_utc_timestamps() {
	let db = memory_db().await;
	let mut first = event("u1", EventKind::Like, Some("morning-light"), None);

	first.ts = datetime!(2026-03-01 08:30:00 +2);

	let first_id = events::append(&db, &first).await.expect("Failed to append.");
	let second_id = events::append(&db, &event("u1", EventKind::Skip, None, None))
		.await
		.expect("Failed to append.");
	let rows = events::list_for_user(&db, "u1").await.expect("Failed to list events.");

	assert!(second_id > first_id);
	assert_eq!(rows.len(), 2);
	assert_eq!(rows[0].event, "like");
	assert_eq!(rows[0].ts, "2026-03-01T06:30:00Z");
	assert_eq!(rows[1].protocol_slug, None);
}

#[tokio::test]
async fn empty_user_is_rejected() {
	let db = memory_db().await;
	let err = events::append(&db, &event(" ", EventKind::Like, None, None))
		.await
		.expect_err("Expected invalid argument.");

	assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn protocol_counts_sum_logged_events() {
	let db = memory_db().await;

	for _ in 0..3 {
		events::append(&db, &event("u1", EventKind::Completed, Some("cold-plunge"), None))
			.await
			.expect("Failed to append.");
	}

	events::append(&db, &event("u2", EventKind::Completed, Some("cold-plunge"), None))
		.await
		.expect("Failed to append.");
	events::append(&db, &event("u2", EventKind::Skip, Some("cold-plunge"), None))
		.await
		.expect("Failed to append.");

	let upto = events::watermark(&db).await.expect("Failed to read watermark.");
	let counts = events::protocol_counts(&db, upto).await.expect("Failed to count.");
	let completed: i64 = counts
		.iter()
		.filter(|count| count.key == "cold-plunge" && count.event == "completed")
		.map(|count| count.count)
		.sum();

	assert_eq!(completed, 4);

	events::append(&db, &event("u3", EventKind::Completed, Some("cold-plunge"), None))
		.await
		.expect("Failed to append.");

	let stale = events::protocol_counts(&db, upto).await.expect("Failed to count.");

	assert_eq!(stale, counts);
}

#[tokio::test]
async fn arm_counts_group_by_variant_per_user() {
	let db = memory_db().await;

	events::append(&db, &event("u1", EventKind::Completed, Some("focus-blocks"), Some("timer")))
		.await
		.expect("Failed to append.");
	events::append(&db, &event("u1", EventKind::Skip, Some("focus-blocks"), None))
		.await
		.expect("Failed to append.");
	events::append(&db, &event("u1", EventKind::Like, Some("focus-blocks"), None))
		.await
		.expect("Failed to append.");
	events::append(&db, &event("u2", EventKind::Like, Some("focus-blocks"), None))
		.await
		.expect("Failed to append.");

	let upto = events::watermark(&db).await.expect("Failed to read watermark.");
	let arms = events::arm_counts(&db, "u1", upto).await.expect("Failed to count arms.");

	assert_eq!(arms.len(), 2);
	assert_eq!(arms[0].variant, "default");
	assert_eq!((arms[0].likes, arms[0].skips, arms[0].total()), (1, 1, 2));
	assert_eq!(arms[1].variant, "timer");
	assert_eq!(arms[1].completed, 1);
}

#[tokio::test]
async fn profiles_are_created_on_read_and_patched_partially() {
	let db = memory_db().await;
	let profile = profiles::get_or_create(&db, "u1").await.expect("Failed to read profile.");

	assert!(profile.goals.is_empty() && profile.tags.is_empty());

	let goals = vec!["sleep".to_string()];
	let updated = profiles::update(&db, "u1", Some(goals.as_slice()), None)
		.await
		.expect("Failed to update profile.");

	assert_eq!(updated.goals, goals);

	let tags = vec!["breathing".to_string()];
	let updated = profiles::update(&db, "u1", None, Some(tags.as_slice()))
		.await
		.expect("Failed to update profile.");

	assert_eq!(updated.goals, goals);
	assert_eq!(updated.tags, tags);
}

#[tokio::test]
async fn first_daily_pick_wins() {
	let db = memory_db().await;
	let pick = |slug: &str| DailyPick {
		user_id: "u1".to_string(),
		pick_date: "2026-03-01".to_string(),
		protocol_slug: slug.to_string(),
		variant: "default".to_string(),
		reason: "bandit:cold_start:random".to_string(),
		created_at: "2026-03-01T06:00:00Z".to_string(),
	};
	let (winner, inserted) =
		picks::insert_if_absent(&db, &pick("morning-light")).await.expect("Failed to insert.");

	assert!(inserted);
	assert_eq!(winner.protocol_slug, "morning-light");

	let (winner, inserted) =
		picks::insert_if_absent(&db, &pick("cold-plunge")).await.expect("Failed to insert.");

	assert!(!inserted);
	assert_eq!(winner.protocol_slug, "morning-light");
	assert_eq!(
		picks::get(&db, "u1", "2026-03-01").await.expect("Failed to read pick."),
		Some(winner)
	);
	assert_eq!(picks::get(&db, "u1", "2026-03-02").await.expect("Failed to read pick."), None);
}

#[tokio::test]
async fn shown_counts_cover_earlier_days_only() {
	let db = memory_db().await;
	let pick = |date: &str, variant: &str| DailyPick {
		user_id: "u1".to_string(),
		pick_date: date.to_string(),
		protocol_slug: "focus-blocks".to_string(),
		variant: variant.to_string(),
		reason: "bandit:learning:untried".to_string(),
		created_at: format!("{date}T06:00:00Z"),
	};

	for (date, variant) in
		[("2026-03-01", "default"), ("2026-03-02", "default"), ("2026-03-03", "timer")]
	{
		picks::insert_if_absent(&db, &pick(date, variant)).await.expect("Failed to insert.");
	}

	let shown = picks::shown_counts(&db, "u1", "2026-03-03").await.expect("Failed to count.");

	assert_eq!(shown.len(), 1);
	assert_eq!((shown[0].variant.as_str(), shown[0].shown), ("default", 2));
	assert!(
		picks::shown_counts(&db, "u2", "2026-03-04").await.expect("Failed to count.").is_empty()
	);
}
