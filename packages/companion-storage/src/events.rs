use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};

use companion_domain::protocol::DEFAULT_VARIANT;

use crate::{
	Error, Result,
	db::Db,
	models::{ArmCounts, EventCount, EventRow, NewEvent},
};

pub fn format_ts(ts: OffsetDateTime) -> Result<String> {
	ts.to_offset(UtcOffset::UTC)
		.format(&Rfc3339)
		.map_err(|err| Error::InvalidArgument(format!("Timestamp cannot be stored: {err}.")))
}

/// Appends one event and returns its log position.
pub async fn append(db: &Db, event: &NewEvent) -> Result<i64> {
	if event.user_id.trim().is_empty() {
		return Err(Error::InvalidArgument("user_id must be non-empty.".to_string()));
	}

	let ts = format_ts(event.ts)?;
	let result = sqlx::query(
		"\
INSERT INTO events (user_id, event, protocol_slug, variant, score, chunk_id, ts)
VALUES (?, ?, ?, ?, ?, ?, ?)",
	)
	.bind(event.user_id.as_str())
	.bind(event.kind.as_str())
	.bind(event.protocol_slug.as_deref())
	.bind(event.variant.as_deref())
	.bind(event.score)
	.bind(event.chunk_id.as_deref())
	.bind(ts)
	.execute(&db.pool)
	.await?;

	Ok(result.last_insert_rowid())
}

/// Highest committed log position. Aggregates read up to a captured watermark so they see one
/// consistent prefix of the log while appends continue.
pub async fn watermark(db: &Db) -> Result<i64> {
	let max: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(event_id), 0) FROM events")
		.fetch_one(&db.pool)
		.await?;

	Ok(max)
}

pub async fn list_for_user(db: &Db, user_id: &str) -> Result<Vec<EventRow>> {
	let rows = sqlx::query_as::<_, EventRow>(
		"\
SELECT event_id, user_id, event, protocol_slug, variant, score, chunk_id, ts
FROM events
WHERE user_id = ?
ORDER BY event_id",
	)
	.bind(user_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Per-arm counts of one user's events up to `upto`. Events without a variant belong to the
/// default variant.
pub async fn arm_counts(db: &Db, user_id: &str, upto: i64) -> Result<Vec<ArmCounts>> {
	let rows = sqlx::query_as::<_, ArmCounts>(
		"\
SELECT
	protocol_slug,
	variant,
	SUM(CASE WHEN event = 'completed' THEN 1 ELSE 0 END) AS completed,
	SUM(CASE WHEN event = 'like' THEN 1 ELSE 0 END) AS likes,
	SUM(CASE WHEN event = 'skip' THEN 1 ELSE 0 END) AS skips
FROM (
	SELECT protocol_slug, COALESCE(variant, ?) AS variant, event
	FROM events
	WHERE user_id = ? AND event_id <= ? AND protocol_slug IS NOT NULL
)
GROUP BY protocol_slug, variant
ORDER BY protocol_slug, variant",
	)
	.bind(DEFAULT_VARIANT)
	.bind(user_id)
	.bind(upto)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Event counts per `(protocol_slug, event)` across all users up to `upto`.
pub async fn protocol_counts(db: &Db, upto: i64) -> Result<Vec<EventCount>> {
	let rows = sqlx::query_as::<_, EventCount>(
		"\
SELECT protocol_slug AS key, event, COUNT(*) AS count
FROM events
WHERE event_id <= ? AND protocol_slug IS NOT NULL
GROUP BY protocol_slug, event
ORDER BY protocol_slug, event",
	)
	.bind(upto)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Event counts per `(chunk_id, event)` across all users up to `upto`.
pub async fn chunk_counts(db: &Db, upto: i64) -> Result<Vec<EventCount>> {
	let rows = sqlx::query_as::<_, EventCount>(
		"\
SELECT chunk_id AS key, event, COUNT(*) AS count
FROM events
WHERE event_id <= ? AND chunk_id IS NOT NULL
GROUP BY chunk_id, event
ORDER BY chunk_id, event",
	)
	.bind(upto)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}
