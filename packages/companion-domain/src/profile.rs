use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
	pub user_id: String,
	#[serde(default)]
	pub goals: Vec<String>,
	#[serde(default)]
	pub tags: Vec<String>,
}
impl UserProfile {
	pub fn empty(user_id: impl Into<String>) -> Self {
		Self { user_id: user_id.into(), goals: Vec::new(), tags: Vec::new() }
	}

	/// Interest tags used for personalization: explicit tags first, goals otherwise.
	pub fn interest_tags(&self) -> &[String] {
		if self.tags.is_empty() { &self.goals } else { &self.tags }
	}
}

/// Trims, lowercases, and de-duplicates labels while keeping first-seen order.
pub fn normalize_labels<I, S>(labels: I) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut out: Vec<String> = Vec::new();

	for label in labels {
		let label = label.as_ref().trim().to_lowercase();

		if label.is_empty() || out.contains(&label) {
			continue;
		}

		out.push(label);
	}

	out
}
