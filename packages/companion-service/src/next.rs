use std::sync::PoisonError;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use companion_domain::{EventKind, Protocol, ProtocolSource, profile::normalize_labels};
use companion_index::IndexSnapshot;
use companion_storage::{events, models::DailyPick, picks, profiles};

use crate::{
	CompanionService, Error, Result,
	bandit::{self, Arm, BanditParams},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NextRequest {
	pub user_id: String,
	#[serde(default)]
	pub goals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolCopy {
	pub title: String,
	pub action: String,
	pub why: String,
	pub how: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextResponse {
	/// UTC calendar date of the pick, `YYYY-MM-DD`.
	pub date: String,
	pub protocol_slug: String,
	pub variant: String,
	pub reason: String,
	pub copy: ProtocolCopy,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source: Option<ProtocolSource>,
}

impl CompanionService {
	pub async fn next(&self, req: NextRequest) -> Result<NextResponse> {
		self.next_at(req, OffsetDateTime::now_utc()).await
	}

	/// Returns the user's protocol for the UTC day containing `now`.
	///
	/// The first committed pick of a day wins; every later call that day, concurrent or not,
	/// returns it unchanged.
	pub async fn next_at(&self, req: NextRequest, now: OffsetDateTime) -> Result<NextResponse> {
		let user_id = crate::require_user_id(&req.user_id)?;
		let snapshot = self.index.current();

		if snapshot.protocols.is_empty() {
			return Err(Error::Unavailable { message: "No protocol cards loaded yet.".to_string() });
		}

		let now = now.to_offset(UtcOffset::UTC);
		let date = now.date().to_string();

		if let Some(pick) = picks::get(&self.db, user_id, &date).await? {
			return respond(&snapshot, pick);
		}

		let mut goals = normalize_labels(&req.goals);

		if goals.is_empty() {
			goals = normalize_labels(&profiles::get_or_create(&self.db, user_id).await?.goals);
		}

		let mut arms = candidate_arms(&snapshot.protocols, &goals);
		let params = BanditParams::from_config(&self.cfg.bandit);
		let upto = events::watermark(&self.db).await?;

		for counts in events::arm_counts(&self.db, user_id, upto).await? {
			let Some(arm) = arms
				.iter_mut()
				.find(|arm| arm.slug == counts.protocol_slug && arm.variant == counts.variant)
			else {
				continue;
			};

			arm.record(EventKind::Completed, counts.completed.max(0) as u64, &params.rewards);
			arm.record(EventKind::Like, counts.likes.max(0) as u64, &params.rewards);
			arm.record(EventKind::Skip, counts.skips.max(0) as u64, &params.rewards);
		}

		for shown in picks::shown_counts(&self.db, user_id, &date).await? {
			if let Some(arm) = arms
				.iter_mut()
				.find(|arm| arm.slug == shown.protocol_slug && arm.variant == shown.variant)
			{
				arm.record_shown(shown.shown.max(0) as u64);
			}
		}

		let decision = {
			let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

			bandit::select(&arms, &params, &mut **rng)
		};
		let Some(decision) = decision else {
			return Err(Error::Unavailable { message: "No protocol cards loaded yet.".to_string() });
		};
		let arm = &arms[decision.arm];
		let pick = DailyPick {
			user_id: user_id.to_string(),
			pick_date: date.clone(),
			protocol_slug: arm.slug.clone(),
			variant: arm.variant.clone(),
			reason: decision.reason.clone(),
			created_at: events::format_ts(now)?,
		};
		let (committed, inserted) = picks::insert_if_absent(&self.db, &pick).await?;

		if inserted {
			tracing::info!(
				user_id,
				date = %date,
				protocol_slug = %committed.protocol_slug,
				variant = %committed.variant,
				reason = %committed.reason,
				phase = ?decision.phase,
				"Daily protocol selected."
			);
		} else {
			tracing::debug!(user_id, date = %date, "Concurrent daily pick already committed.");
		}

		respond(&snapshot, committed)
	}
}

/// Arms for every variant of the protocols matching `goals`, in catalogue order. Goals that
/// match nothing, like no goals at all, open the whole catalogue.
fn candidate_arms(protocols: &[Protocol], goals: &[String]) -> Vec<Arm> {
	let matching: Vec<&Protocol> = protocols
		.iter()
		.filter(|protocol| goals.iter().any(|goal| protocol.matches_goal(goal)))
		.collect();
	let pool: Vec<&Protocol> =
		if matching.is_empty() { protocols.iter().collect() } else { matching };

	pool.into_iter()
		.flat_map(|protocol| {
			protocol.variants().into_iter().map(|variant| {
				Arm::new(protocol.slug.as_str(), variant).with_track(protocol.track)
			})
		})
		.collect()
}

fn respond(snapshot: &IndexSnapshot, pick: DailyPick) -> Result<NextResponse> {
	let Some(protocol) = snapshot.protocol(&pick.protocol_slug) else {
		return Err(Error::NotFound {
			message: format!(
				"Protocol {:?} picked for {} is no longer in the catalogue.",
				pick.protocol_slug, pick.pick_date
			),
		});
	};

	Ok(NextResponse {
		date: pick.pick_date,
		protocol_slug: pick.protocol_slug,
		variant: pick.variant,
		reason: pick.reason,
		copy: ProtocolCopy {
			title: protocol.title.clone(),
			action: protocol.action.clone(),
			why: protocol.why.clone(),
			how: protocol.how.clone(),
		},
		source: protocol.source.clone(),
	})
}

#[cfg(test)]
mod tests {
	use companion_domain::Track;

	use super::*;

	fn card(slug: &str, track: Track, variants: &[&str]) -> Protocol {
		Protocol {
			slug: slug.to_string(),
			title: slug.to_string(),
			action: String::new(),
			why: String::new(),
			how: String::new(),
			track: Some(track),
			tags: Vec::new(),
			citations: Vec::new(),
			variants: variants.iter().map(|variant| variant.to_string()).collect(),
			source: None,
		}
	}

	#[test]
	fn goals_narrow_the_pool_and_unmatched_goals_open_it() {
		let protocols = [
			card("evening-dim", Track::Sleep, &[]),
			card("focus-blocks", Track::Focus, &["default", "timer"]),
		];
		let focus = candidate_arms(&protocols, &["focus".to_string()]);

		assert_eq!(
			focus.iter().map(|arm| arm.variant.as_str()).collect::<Vec<_>>(),
			vec!["default", "timer"]
		);
		assert!(
			focus.iter().all(|arm| arm.slug == "focus-blocks" && arm.track == Some(Track::Focus))
		);
		assert_eq!(candidate_arms(&protocols, &["mood".to_string()]).len(), 3);
		assert_eq!(candidate_arms(&protocols, &[]).len(), 3);
	}
}
