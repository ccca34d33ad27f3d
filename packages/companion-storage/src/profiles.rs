use time::OffsetDateTime;

use companion_domain::UserProfile;

use crate::{Error, Result, db::Db, events::format_ts, models::ProfileRow};

/// Returns the stored profile, creating an empty one first when absent.
pub async fn get_or_create(db: &Db, user_id: &str) -> Result<UserProfile> {
	if user_id.trim().is_empty() {
		return Err(Error::InvalidArgument("user_id must be non-empty.".to_string()));
	}

	let now = format_ts(OffsetDateTime::now_utc())?;

	sqlx::query(
		"\
INSERT INTO user_profiles (user_id, goals, tags, created_at, updated_at)
VALUES (?, '[]', '[]', ?, ?)
ON CONFLICT (user_id) DO NOTHING",
	)
	.bind(user_id)
	.bind(now.as_str())
	.bind(now.as_str())
	.execute(&db.pool)
	.await?;

	let row = sqlx::query_as::<_, ProfileRow>(
		"SELECT user_id, goals, tags FROM user_profiles WHERE user_id = ?",
	)
	.bind(user_id)
	.fetch_one(&db.pool)
	.await?;

	decode(row)
}

/// Applies a partial update. `None` leaves the stored list unchanged.
pub async fn update(
	db: &Db,
	user_id: &str,
	goals: Option<&[String]>,
	tags: Option<&[String]>,
) -> Result<UserProfile> {
	get_or_create(db, user_id).await?;

	let goals = goals.map(encode).transpose()?;
	let tags = tags.map(encode).transpose()?;
	let now = format_ts(OffsetDateTime::now_utc())?;

	sqlx::query(
		"\
UPDATE user_profiles
SET
	goals = COALESCE(?, goals),
	tags = COALESCE(?, tags),
	updated_at = ?
WHERE user_id = ?",
	)
	.bind(goals)
	.bind(tags)
	.bind(now)
	.bind(user_id)
	.execute(&db.pool)
	.await?;

	get_or_create(db, user_id).await
}

fn encode(labels: &[String]) -> Result<String> {
	serde_json::to_string(labels).map_err(|err| Error::Decode(err.to_string()))
}

fn decode(row: ProfileRow) -> Result<UserProfile> {
	let goals = serde_json::from_str(&row.goals)
		.map_err(|err| Error::Decode(format!("user_profiles.goals for {}: {err}", row.user_id)))?;
	let tags = serde_json::from_str(&row.tags)
		.map_err(|err| Error::Decode(format!("user_profiles.tags for {}: {err}", row.user_id)))?;

	Ok(UserProfile { user_id: row.user_id, goals, tags })
}
