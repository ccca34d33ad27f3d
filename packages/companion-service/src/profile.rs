use serde::{Deserialize, Serialize};

use companion_domain::{UserProfile, profile::normalize_labels};
use companion_storage::profiles;

use crate::{CompanionService, Error, Result};

/// Partial profile update; absent lists stay unchanged, present ones replace the stored list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
	/// Must match the path user when given.
	pub user_id: Option<String>,
	pub goals: Option<Vec<String>>,
	pub tags: Option<Vec<String>>,
}

impl CompanionService {
	/// Profiles always exist logically: the first read stores an empty one.
	pub async fn get_profile(&self, user_id: &str) -> Result<UserProfile> {
		let user_id = crate::require_user_id(user_id)?;

		Ok(profiles::get_or_create(&self.db, user_id).await?)
	}

	pub async fn update_profile(&self, user_id: &str, patch: ProfilePatch) -> Result<UserProfile> {
		let user_id = crate::require_user_id(user_id)?;

		if let Some(body_user) = patch.user_id.as_deref().map(str::trim)
			&& !body_user.is_empty()
			&& body_user != user_id
		{
			return Err(Error::InvalidRequest {
				message: format!("user_id {body_user:?} does not match the path user {user_id:?}."),
			});
		}

		let goals = patch.goals.as_ref().map(|goals| normalize_labels(goals));
		let tags = patch.tags.as_ref().map(|tags| normalize_labels(tags));
		let profile =
			profiles::update(&self.db, user_id, goals.as_deref(), tags.as_deref()).await?;

		tracing::debug!(
			user_id,
			goals = profile.goals.len(),
			tags = profile.tags.len(),
			"Profile updated."
		);

		Ok(profile)
	}
}
