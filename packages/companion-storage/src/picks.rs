use crate::{
	Result,
	db::Db,
	models::{ArmShown, DailyPick},
};

pub async fn get(db: &Db, user_id: &str, pick_date: &str) -> Result<Option<DailyPick>> {
	let row = sqlx::query_as::<_, DailyPick>(
		"\
SELECT user_id, pick_date, protocol_slug, variant, reason, created_at
FROM daily_picks
WHERE user_id = ? AND pick_date = ?",
	)
	.bind(user_id)
	.bind(pick_date)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row)
}

/// Stores `pick` unless one already exists for its `(user_id, pick_date)`, then returns whichever
/// pick is committed. The flag is true when `pick` itself was stored.
pub async fn insert_if_absent(db: &Db, pick: &DailyPick) -> Result<(DailyPick, bool)> {
	let result = sqlx::query(
		"\
INSERT INTO daily_picks (user_id, pick_date, protocol_slug, variant, reason, created_at)
VALUES (?, ?, ?, ?, ?, ?)
ON CONFLICT (user_id, pick_date) DO NOTHING",
	)
	.bind(pick.user_id.as_str())
	.bind(pick.pick_date.as_str())
	.bind(pick.protocol_slug.as_str())
	.bind(pick.variant.as_str())
	.bind(pick.reason.as_str())
	.bind(pick.created_at.as_str())
	.execute(&db.pool)
	.await?;
	let inserted = result.rows_affected() == 1;
	let committed = sqlx::query_as::<_, DailyPick>(
		"\
SELECT user_id, pick_date, protocol_slug, variant, reason, created_at
FROM daily_picks
WHERE user_id = ? AND pick_date = ?",
	)
	.bind(pick.user_id.as_str())
	.bind(pick.pick_date.as_str())
	.fetch_one(&db.pool)
	.await?;

	Ok((committed, inserted))
}

/// Per-arm counts of the user's committed picks dated strictly before `before_date`.
pub async fn shown_counts(db: &Db, user_id: &str, before_date: &str) -> Result<Vec<ArmShown>> {
	let rows = sqlx::query_as::<_, ArmShown>(
		"\
SELECT protocol_slug, variant, COUNT(*) AS shown
FROM daily_picks
WHERE user_id = ? AND pick_date < ?
GROUP BY protocol_slug, variant
ORDER BY protocol_slug, variant",
	)
	.bind(user_id)
	.bind(before_date)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}
