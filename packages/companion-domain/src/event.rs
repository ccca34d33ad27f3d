use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
	Completed,
	Like,
	Skip,
}
impl EventKind {
	pub const ALL: [Self; 3] = [Self::Completed, Self::Like, Self::Skip];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Completed => "completed",
			Self::Like => "like",
			Self::Skip => "skip",
		}
	}

	/// `completed` and `like` count toward popularity.
	pub fn is_positive(self) -> bool {
		matches!(self, Self::Completed | Self::Like)
	}
}
impl FromStr for EventKind {
	type Err = UnknownEventKind;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim() {
			"completed" => Ok(Self::Completed),
			"like" => Ok(Self::Like),
			"skip" => Ok(Self::Skip),
			other => Err(UnknownEventKind(other.to_string())),
		}
	}
}
impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("event must be one of completed, like, or skip; got {0:?}.")]
pub struct UnknownEventKind(pub String);
