use std::fmt;

use serde::{
	Deserialize, Deserializer, Serialize,
	de::{self, Visitor},
};
use uuid::Uuid;

use crate::content::ContentStatus;

/// Caller-supplied discovery parameters, before any clamping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDiscoveryQuery {
	pub author_id: Option<Uuid>,
	pub category_id: Option<Uuid>,
	pub status: Option<String>,
	pub keyword: Option<String>,
	pub sort: Option<String>,
	pub order: Option<String>,
	#[serde(default, deserialize_with = "lenient_count")]
	pub limit: Option<i64>,
	#[serde(default, deserialize_with = "lenient_count")]
	pub offset: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
	pub limit: u32,
	pub offset: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
	pub default_limit: u32,
	pub max_limit: u32,
}
impl PageLimits {
	/// Listing and search limits. Never above [`folio_config::MAX_PAGE_LIMIT`].
	pub fn listing(cfg: &folio_config::Discovery) -> Self {
		let max_limit = cfg.max_limit.min(folio_config::MAX_PAGE_LIMIT);

		Self { default_limit: cfg.default_limit.min(max_limit), max_limit }
	}

	/// Trending limits. Never above [`folio_config::MAX_TRENDING_LIMIT`].
	pub fn trending(cfg: &folio_config::Discovery) -> Self {
		let max_limit = cfg.trending_max_limit.min(folio_config::MAX_TRENDING_LIMIT);

		Self { default_limit: cfg.default_limit.min(max_limit), max_limit }
	}

	pub fn clamp_limit(self, raw: Option<i64>) -> u32 {
		match raw {
			Some(limit) if limit > 0 =>
				u32::try_from(limit).unwrap_or(u32::MAX).min(self.max_limit),
			_ => self.default_limit,
		}
	}

	pub fn page(self, limit: Option<i64>, offset: Option<i64>) -> Page {
		Page { limit: self.clamp_limit(limit), offset: clamp_offset(offset) }
	}
}
impl Default for PageLimits {
	fn default() -> Self {
		Self {
			default_limit: folio_config::DEFAULT_PAGE_LIMIT,
			max_limit: folio_config::MAX_PAGE_LIMIT,
		}
	}
}

/// Canonical discovery query. Sort text stays raw; the compiler resolves it against the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryQuery {
	pub author_id: Option<Uuid>,
	pub category_id: Option<Uuid>,
	pub status: Option<ContentStatus>,
	pub keyword: Option<String>,
	pub sort: Option<String>,
	pub order: Option<String>,
	pub page: Page,
}
impl DiscoveryQuery {
	pub fn normalize(raw: RawDiscoveryQuery, limits: PageLimits) -> Self {
		Self {
			author_id: raw.author_id,
			category_id: raw.category_id,
			status: raw.status.as_deref().and_then(|status| status.parse().ok()),
			keyword: normalize_keyword(raw.keyword.as_deref()),
			sort: raw.sort,
			order: raw.order,
			page: limits.page(raw.limit, raw.offset),
		}
	}
}

pub fn clamp_offset(raw: Option<i64>) -> u64 {
	raw.and_then(|offset| u64::try_from(offset).ok()).unwrap_or(0)
}

pub fn normalize_keyword(raw: Option<&str>) -> Option<String> {
	let trimmed = raw?.trim();

	if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

/// Reads a page count from a number or from text. Text that is not an integer reads as absent,
/// so the page limits apply their defaults instead of rejecting the request.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: Deserializer<'de>,
{
	struct CountVisitor;
	impl<'de> Visitor<'de> for CountVisitor {
		type Value = Option<i64>;

		fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			f.write_str("an integer or integer text")
		}

		fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
		where
			E: de::Error,
		{
			Ok(Some(value))
		}

		fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
		where
			E: de::Error,
		{
			Ok(Some(i64::try_from(value).unwrap_or(i64::MAX)))
		}

		fn visit_f64<E>(self, _value: f64) -> Result<Self::Value, E>
		where
			E: de::Error,
		{
			Ok(None)
		}

		fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
		where
			E: de::Error,
		{
			Ok(value.trim().parse().ok())
		}

		fn visit_bool<E>(self, _value: bool) -> Result<Self::Value, E>
		where
			E: de::Error,
		{
			Ok(None)
		}

		fn visit_none<E>(self) -> Result<Self::Value, E>
		where
			E: de::Error,
		{
			Ok(None)
		}

		fn visit_unit<E>(self) -> Result<Self::Value, E>
		where
			E: de::Error,
		{
			Ok(None)
		}

		fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
		where
			D: Deserializer<'de>,
		{
			deserializer.deserialize_any(self)
		}
	}

	deserializer.deserialize_any(CountVisitor)
}
