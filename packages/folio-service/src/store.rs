//! Persistence seams for the service. [`crate::PgStore`] backs them with Postgres and
//! [`crate::MemoryStore`] keeps everything in process.

use std::collections::HashMap;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use folio_domain::{
	compile::{CompiledQuery, Predicate},
	query::Page,
};

use crate::{BoxFuture, Category, Content, Result};

/// A search hit and the relevance the strategy that found it assigned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
	pub content: Content,
	pub score: f32,
}

pub trait ContentStore
where
	Self: Send + Sync,
{
	fn list<'a>(&'a self, query: &'a CompiledQuery) -> BoxFuture<'a, Result<Vec<Content>>>;

	fn count<'a>(&'a self, predicates: &'a [Predicate]) -> BoxFuture<'a, Result<u64>>;

	/// Visible content, newest publication first.
	fn list_published<'a>(
		&'a self,
		page: Page,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<Content>>>;

	fn trending<'a>(&'a self, limit: u32, now: OffsetDateTime)
	-> BoxFuture<'a, Result<Vec<Content>>>;

	/// Full-text relevance search over visible content.
	fn search_ranked<'a>(
		&'a self,
		keyword: &'a str,
		page: Page,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<RankedCandidate>>>;

	/// Substring search over visible content, scored with [`folio_domain::scoring`].
	fn search_scored<'a>(
		&'a self,
		keyword: &'a str,
		page: Page,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<RankedCandidate>>>;

	fn get(&self, content_id: Uuid) -> BoxFuture<'_, Result<Option<Content>>>;

	fn insert<'a>(&'a self, content: &'a Content) -> BoxFuture<'a, Result<()>>;

	/// Returns `false` when the content does not exist.
	fn update<'a>(&'a self, content: &'a Content) -> BoxFuture<'a, Result<bool>>;

	fn delete(&self, content_id: Uuid) -> BoxFuture<'_, Result<bool>>;

	fn increment_views(&self, content_id: Uuid) -> BoxFuture<'_, Result<Option<i64>>>;
}

pub trait CategoryStore
where
	Self: Send + Sync,
{
	fn get(&self, category_id: Uuid) -> BoxFuture<'_, Result<Option<Category>>>;

	fn list(&self) -> BoxFuture<'_, Result<Vec<Category>>>;

	fn parent_links(&self) -> BoxFuture<'_, Result<HashMap<Uuid, Option<Uuid>>>>;

	/// Fails with `NotFound` when the parent does not exist.
	fn insert<'a>(&'a self, category: &'a Category) -> BoxFuture<'a, Result<()>>;

	/// Re-checks the parent link atomically. Fails with `Conflict` on a cycle.
	fn update<'a>(&'a self, category: &'a Category) -> BoxFuture<'a, Result<()>>;

	/// Fails with `Conflict` while children or content still reference the category.
	fn delete(&self, category_id: Uuid) -> BoxFuture<'_, Result<()>>;
}
