use time::OffsetDateTime;

use companion_domain::EventKind;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct EventRow {
	pub event_id: i64,
	pub user_id: String,
	pub event: String,
	pub protocol_slug: Option<String>,
	pub variant: Option<String>,
	pub score: Option<f64>,
	pub chunk_id: Option<String>,
	/// RFC 3339, UTC.
	pub ts: String,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
	pub user_id: String,
	pub kind: EventKind,
	pub protocol_slug: Option<String>,
	pub variant: Option<String>,
	pub score: Option<f64>,
	pub chunk_id: Option<String>,
	pub ts: OffsetDateTime,
}

/// Per-kind event counts for one `(protocol_slug, variant)` arm of one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct ArmCounts {
	pub protocol_slug: String,
	pub variant: String,
	pub completed: i64,
	pub likes: i64,
	pub skips: i64,
}
impl ArmCounts {
	pub fn total(&self) -> i64 {
		self.completed + self.likes + self.skips
	}
}

/// Number of committed daily picks that served one `(protocol_slug, variant)` arm.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ArmShown {
	pub protocol_slug: String,
	pub variant: String,
	pub shown: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EventCount {
	pub key: String,
	pub event: String,
	pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DailyPick {
	pub user_id: String,
	/// Calendar date, `YYYY-MM-DD`.
	pub pick_date: String,
	pub protocol_slug: String,
	pub variant: String,
	pub reason: String,
	pub created_at: String,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProfileRow {
	pub user_id: String,
	pub goals: String,
	pub tags: String,
}
