use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
	Draft,
	Pending,
	Published,
	Archived,
}
impl ContentStatus {
	pub const ALL: [Self; 4] = [Self::Draft, Self::Pending, Self::Published, Self::Archived];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Draft => "draft",
			Self::Pending => "pending",
			Self::Published => "published",
			Self::Archived => "archived",
		}
	}

	/// Publish timestamp after moving to `self`.
	///
	/// The first transition to `Published` stamps `now`; an existing stamp survives every later
	/// transition, including moves away from `Published`.
	pub fn published_at_after(
		self,
		current: Option<OffsetDateTime>,
		now: OffsetDateTime,
	) -> Option<OffsetDateTime> {
		match (current, self) {
			(Some(at), _) => Some(at),
			(None, Self::Published) => Some(now),
			(None, _) => None,
		}
	}
}
impl fmt::Display for ContentStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for ContentStatus {
	type Err = UnknownStatus;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let normalized = raw.trim().to_ascii_lowercase();

		Self::ALL
			.into_iter()
			.find(|status| status.as_str() == normalized)
			.ok_or_else(|| UnknownStatus(raw.to_string()))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown content status {0:?}.")]
pub struct UnknownStatus(pub String);
