//! Relevance formula for the substring fallback search.
//!
//! The score is a plain sum of independent bonuses, so every component can be inspected on its
//! own. The Postgres store renders the same tiers into SQL from these constants.

use time::{Duration, OffsetDateTime};

pub const EXACT_TITLE_BONUS: i32 = 100;
pub const TITLE_MATCH_BONUS: i32 = 50;
pub const BODY_MATCH_BONUS: i32 = 20;
/// `(view_count strictly above, bonus)`, highest tier first.
pub const POPULARITY_TIERS: [(i64, i32); 3] = [(1_000, 10), (100, 5), (10, 2)];
/// `(published within the last N days, bonus)`, freshest tier first.
pub const FRESHNESS_TIERS: [(i64, i32); 2] = [(7, 3), (30, 2)];

#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
	pub title: &'a str,
	pub body: &'a str,
	pub view_count: i64,
	pub published_at: Option<OffsetDateTime>,
}

pub fn matches_keyword(title: &str, body: &str, keyword: &str) -> bool {
	let needle = keyword.to_lowercase();

	title.to_lowercase().contains(&needle) || body.to_lowercase().contains(&needle)
}

pub fn text_match_bonus(title: &str, body: &str, keyword: &str) -> i32 {
	let needle = keyword.to_lowercase();
	let title = title.to_lowercase();
	let title_bonus = if title == needle {
		EXACT_TITLE_BONUS
	} else if title.contains(&needle) {
		TITLE_MATCH_BONUS
	} else {
		0
	};
	let body_bonus = if body.to_lowercase().contains(&needle) { BODY_MATCH_BONUS } else { 0 };

	title_bonus + body_bonus
}

pub fn popularity_bonus(view_count: i64) -> i32 {
	POPULARITY_TIERS
		.iter()
		.find(|(threshold, _)| view_count > *threshold)
		.map(|(_, bonus)| *bonus)
		.unwrap_or(0)
}

pub fn freshness_bonus(published_at: Option<OffsetDateTime>, now: OffsetDateTime) -> i32 {
	let Some(published_at) = published_at else { return 0 };

	FRESHNESS_TIERS
		.iter()
		.find(|(days, _)| published_at >= now - Duration::days(*days))
		.map(|(_, bonus)| *bonus)
		.unwrap_or(0)
}

pub fn fallback_score(input: ScoreInput<'_>, keyword: &str, now: OffsetDateTime) -> i32 {
	text_match_bonus(input.title, input.body, keyword)
		+ popularity_bonus(input.view_count)
		+ freshness_bonus(input.published_at, now)
}
