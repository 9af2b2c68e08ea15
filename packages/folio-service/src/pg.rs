use std::collections::HashMap;

use time::OffsetDateTime;
use uuid::Uuid;

use folio_domain::{
	compile::{CompiledQuery, Predicate},
	query::Page,
};
use folio_storage::{
	categories, contents,
	db::Db,
	models::{CategoryRow, ContentRow, ScoredContentRow},
};

use crate::{
	BoxFuture, Category, CategoryStore, Content, ContentStore, Result, store::RankedCandidate,
};

/// Postgres-backed store for both content and categories.
pub struct PgStore {
	db: Db,
	text_search_config: String,
}
impl PgStore {
	pub fn new(db: Db, text_search_config: String) -> Self {
		Self { db, text_search_config }
	}

	pub fn db(&self) -> &Db {
		&self.db
	}
}
impl ContentStore for PgStore {
	fn list<'a>(&'a self, query: &'a CompiledQuery) -> BoxFuture<'a, Result<Vec<Content>>> {
		Box::pin(async move { to_contents(contents::list(&self.db.pool, query).await?) })
	}

	fn count<'a>(&'a self, predicates: &'a [Predicate]) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move { Ok(contents::count(&self.db.pool, predicates).await?) })
	}

	fn list_published<'a>(
		&'a self,
		page: Page,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<Content>>> {
		Box::pin(async move {
			to_contents(contents::list_published(&self.db.pool, page, now).await?)
		})
	}

	fn trending<'a>(
		&'a self,
		limit: u32,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<Content>>> {
		Box::pin(async move { to_contents(contents::trending(&self.db.pool, limit, now).await?) })
	}

	fn search_ranked<'a>(
		&'a self,
		keyword: &'a str,
		page: Page,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<RankedCandidate>>> {
		Box::pin(async move {
			let rows = contents::search_ranked(
				&self.db.pool,
				&self.text_search_config,
				keyword,
				page,
				now,
			)
			.await?;

			to_candidates(rows)
		})
	}

	fn search_scored<'a>(
		&'a self,
		keyword: &'a str,
		page: Page,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<RankedCandidate>>> {
		Box::pin(async move {
			to_candidates(contents::search_scored(&self.db.pool, keyword, page, now).await?)
		})
	}

	fn get(&self, content_id: Uuid) -> BoxFuture<'_, Result<Option<Content>>> {
		Box::pin(async move {
			let row = contents::get(&self.db.pool, content_id).await?;

			Ok(row.map(Content::try_from).transpose()?)
		})
	}

	fn insert<'a>(&'a self, content: &'a Content) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			contents::insert(&self.db.pool, &ContentRow::from(content)).await?;

			Ok(())
		})
	}

	fn update<'a>(&'a self, content: &'a Content) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			Ok(contents::update(&self.db.pool, &ContentRow::from(content)).await?)
		})
	}

	fn delete(&self, content_id: Uuid) -> BoxFuture<'_, Result<bool>> {
		Box::pin(async move { Ok(contents::delete(&self.db.pool, content_id).await?) })
	}

	fn increment_views(&self, content_id: Uuid) -> BoxFuture<'_, Result<Option<i64>>> {
		Box::pin(async move { Ok(contents::increment_views(&self.db.pool, content_id).await?) })
	}
}
impl CategoryStore for PgStore {
	fn get(&self, category_id: Uuid) -> BoxFuture<'_, Result<Option<Category>>> {
		Box::pin(async move {
			Ok(categories::get(&self.db.pool, category_id).await?.map(Category::from))
		})
	}

	fn list(&self) -> BoxFuture<'_, Result<Vec<Category>>> {
		Box::pin(async move {
			let rows = categories::list(&self.db.pool).await?;

			Ok(rows.into_iter().map(Category::from).collect())
		})
	}

	fn parent_links(&self) -> BoxFuture<'_, Result<HashMap<Uuid, Option<Uuid>>>> {
		Box::pin(async move { Ok(categories::parent_links(&self.db.pool).await?) })
	}

	fn insert<'a>(&'a self, category: &'a Category) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			categories::insert(&self.db.pool, &CategoryRow::from(category)).await?;

			Ok(())
		})
	}

	fn update<'a>(&'a self, category: &'a Category) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			categories::update(&self.db.pool, &CategoryRow::from(category)).await?;

			Ok(())
		})
	}

	fn delete(&self, category_id: Uuid) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			categories::delete(&self.db.pool, category_id).await?;

			Ok(())
		})
	}
}

fn to_contents(rows: Vec<ContentRow>) -> Result<Vec<Content>> {
	let contents = rows.into_iter().map(Content::try_from).collect::<Result<Vec<_>, _>>()?;

	Ok(contents)
}

fn to_candidates(rows: Vec<ScoredContentRow>) -> Result<Vec<RankedCandidate>> {
	let mut candidates = Vec::with_capacity(rows.len());

	for row in rows {
		let content = Content::try_from(row.content)?;

		candidates.push(RankedCandidate { content, score: row.score });
	}

	Ok(candidates)
}
