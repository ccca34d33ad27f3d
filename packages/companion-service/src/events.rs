use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use companion_domain::EventKind;
use companion_storage::models::NewEvent;

use crate::{CompanionService, Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventRequest {
	pub user_id: String,
	/// Kept as text so an unknown kind is reported as an invalid event, not a malformed body.
	pub event: String,
	pub protocol_slug: Option<String>,
	pub variant: Option<String>,
	pub score: Option<f64>,
	pub chunk_id: Option<String>,
	/// Server time when omitted.
	#[serde(default, with = "crate::time_serde::option")]
	pub ts: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResponse {
	pub status: String,
}

impl CompanionService {
	pub async fn log_event(&self, req: EventRequest) -> Result<EventResponse> {
		let kind = req
			.event
			.parse::<EventKind>()
			.map_err(|err| Error::InvalidEvent { message: err.to_string() })?;
		let user_id = crate::require_user_id(&req.user_id)?;

		if let Some(score) = req.score
			&& !score.is_finite()
		{
			return Err(Error::InvalidRequest {
				message: "score must be a finite number.".to_string(),
			});
		}

		let event = NewEvent {
			user_id: user_id.to_string(),
			kind,
			protocol_slug: non_blank(req.protocol_slug),
			variant: non_blank(req.variant),
			score: req.score,
			chunk_id: non_blank(req.chunk_id),
			ts: req.ts.unwrap_or_else(OffsetDateTime::now_utc),
		};
		let event_id = companion_storage::events::append(&self.db, &event).await?;

		tracing::info!(
			event_id,
			user_id = %event.user_id,
			event = %kind,
			protocol_slug = event.protocol_slug.as_deref(),
			"Event logged."
		);

		Ok(EventResponse { status: "ok".to_string() })
	}
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
