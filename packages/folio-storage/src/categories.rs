use std::collections::HashMap;

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use folio_domain::category;

use crate::{Error, Result, models::CategoryRow};

/// Serialises parent changes so two re-parentings cannot pass the cycle check together.
const REPARENT_LOCK_ID: i64 = 4_417_002;

pub async fn get<'e, E>(executor: E, category_id: Uuid) -> Result<Option<CategoryRow>>
where
	E: Executor<'e, Database = Postgres>,
{
	let row = sqlx::query_as::<_, CategoryRow>(
		"\
SELECT category_id, name, description, parent_id, created_at, updated_at
FROM categories
WHERE category_id = $1",
	)
	.bind(category_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn list<'e, E>(executor: E) -> Result<Vec<CategoryRow>>
where
	E: Executor<'e, Database = Postgres>,
{
	let rows = sqlx::query_as::<_, CategoryRow>(
		"\
SELECT category_id, name, description, parent_id, created_at, updated_at
FROM categories
ORDER BY name, category_id",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Every `category_id -> parent_id` edge of the forest.
pub async fn parent_links<'e, E>(executor: E) -> Result<HashMap<Uuid, Option<Uuid>>>
where
	E: Executor<'e, Database = Postgres>,
{
	let rows: Vec<(Uuid, Option<Uuid>)> =
		sqlx::query_as("SELECT category_id, parent_id FROM categories")
			.fetch_all(executor)
			.await?;

	Ok(rows.into_iter().collect())
}

pub async fn insert(pool: &PgPool, row: &CategoryRow) -> Result<()> {
	let mut tx = pool.begin().await?;

	if let Some(parent_id) = row.parent_id {
		sqlx::query("SELECT pg_advisory_xact_lock($1)")
			.bind(REPARENT_LOCK_ID)
			.execute(&mut *tx)
			.await?;

		if get(&mut *tx, parent_id).await?.is_none() {
			return Err(Error::NotFound(format!("parent category {parent_id}")));
		}
	}

	sqlx::query(
		"\
INSERT INTO categories (category_id, name, description, parent_id, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6)",
	)
	.bind(row.category_id)
	.bind(row.name.as_str())
	.bind(row.description.as_str())
	.bind(row.parent_id)
	.bind(row.created_at)
	.bind(row.updated_at)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(())
}

/// Updates a category, re-running the cycle check under the re-parent lock.
pub async fn update(pool: &PgPool, row: &CategoryRow) -> Result<()> {
	let mut tx = pool.begin().await?;

	sqlx::query("SELECT pg_advisory_xact_lock($1)")
		.bind(REPARENT_LOCK_ID)
		.execute(&mut *tx)
		.await?;

	if let Some(parent_id) = row.parent_id {
		let links = parent_links(&mut *tx).await?;

		if !links.contains_key(&parent_id) {
			return Err(Error::NotFound(format!("parent category {parent_id}")));
		}
		if category::would_create_cycle(&links, row.category_id, parent_id) {
			return Err(Error::Conflict(format!(
				"category {} cannot move under {parent_id}; that would create a cycle",
				row.category_id
			)));
		}
	}

	let result = sqlx::query(
		"\
UPDATE categories
SET
	name = $1,
	description = $2,
	parent_id = $3,
	updated_at = $4
WHERE category_id = $5",
	)
	.bind(row.name.as_str())
	.bind(row.description.as_str())
	.bind(row.parent_id)
	.bind(row.updated_at)
	.bind(row.category_id)
	.execute(&mut *tx)
	.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("category {}", row.category_id)));
	}

	tx.commit().await?;

	Ok(())
}

/// Deletes a leaf category that no content references.
pub async fn delete(pool: &PgPool, category_id: Uuid) -> Result<()> {
	let mut tx = pool.begin().await?;
	let locked: Option<Uuid> =
		sqlx::query_scalar("SELECT category_id FROM categories WHERE category_id = $1 FOR UPDATE")
			.bind(category_id)
			.fetch_optional(&mut *tx)
			.await?;

	if locked.is_none() {
		return Err(Error::NotFound(format!("category {category_id}")));
	}

	let children: i64 = sqlx::query_scalar("SELECT count(*) FROM categories WHERE parent_id = $1")
		.bind(category_id)
		.fetch_one(&mut *tx)
		.await?;
	let contents: i64 = sqlx::query_scalar("SELECT count(*) FROM contents WHERE category_id = $1")
		.bind(category_id)
		.fetch_one(&mut *tx)
		.await?;

	if children > 0 || contents > 0 {
		return Err(Error::Conflict(format!(
			"category {category_id} still has {children} child categories and {contents} content items"
		)));
	}

	sqlx::query("DELETE FROM categories WHERE category_id = $1")
		.bind(category_id)
		.execute(&mut *tx)
		.await?;

	tx.commit().await?;

	Ok(())
}
