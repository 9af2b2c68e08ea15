use sqlx::{Executor, Postgres, QueryBuilder};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use folio_domain::{
	compile::{CompiledQuery, Predicate},
	content::ContentStatus,
	query::Page,
	scoring,
};

use crate::{
	Result,
	models::{ContentRow, ScoredContentRow},
};

const CONTENT_COLUMNS: &str = "\
content_id, title, body, author_id, category_id, status, view_count, published_at, created_at, \
updated_at";

pub async fn list<'e, E>(executor: E, query: &CompiledQuery) -> Result<Vec<ContentRow>>
where
	E: Executor<'e, Database = Postgres>,
{
	let mut builder = QueryBuilder::new(format!("SELECT {CONTENT_COLUMNS} FROM contents"));

	push_predicates(&mut builder, &query.predicates);

	let column = query.order.field.column();
	let direction = query.order.direction.as_sql();

	// Both identifiers come from closed enums, never from caller text.
	builder.push(format!(" ORDER BY {column} {direction} NULLS LAST, content_id {direction}"));
	push_page(&mut builder, query.page);

	let rows = builder.build_query_as::<ContentRow>().fetch_all(executor).await?;

	Ok(rows)
}

pub async fn count<'e, E>(executor: E, predicates: &[Predicate]) -> Result<u64>
where
	E: Executor<'e, Database = Postgres>,
{
	let mut builder = QueryBuilder::new("SELECT count(*) FROM contents");

	push_predicates(&mut builder, predicates);

	let total = builder.build_query_scalar::<i64>().fetch_one(executor).await?;

	Ok(u64::try_from(total).unwrap_or(0))
}

/// Published, already-visible content, newest publication first.
pub async fn list_published<'e, E>(
	executor: E,
	page: Page,
	now: OffsetDateTime,
) -> Result<Vec<ContentRow>>
where
	E: Executor<'e, Database = Postgres>,
{
	let mut builder = QueryBuilder::new(format!("SELECT {CONTENT_COLUMNS} FROM contents"));

	push_visible(&mut builder, now);
	builder.push(" ORDER BY published_at DESC, content_id DESC");
	push_page(&mut builder, page);

	let rows = builder.build_query_as::<ContentRow>().fetch_all(executor).await?;

	Ok(rows)
}

pub async fn trending<'e, E>(
	executor: E,
	limit: u32,
	now: OffsetDateTime,
) -> Result<Vec<ContentRow>>
where
	E: Executor<'e, Database = Postgres>,
{
	let mut builder = QueryBuilder::new(format!("SELECT {CONTENT_COLUMNS} FROM contents"));

	push_visible(&mut builder, now);
	builder.push(" ORDER BY view_count DESC, published_at DESC, content_id DESC LIMIT ");
	builder.push_bind(i64::from(limit));

	let rows = builder.build_query_as::<ContentRow>().fetch_all(executor).await?;

	Ok(rows)
}

/// Full-text search through the weighted `search_vector` column.
///
/// Fails when `text_search_config` does not name an installed text search configuration.
pub async fn search_ranked<'e, E>(
	executor: E,
	text_search_config: &str,
	keyword: &str,
	page: Page,
	now: OffsetDateTime,
) -> Result<Vec<ScoredContentRow>>
where
	E: Executor<'e, Database = Postgres>,
{
	let mut builder = QueryBuilder::new(format!(
		"SELECT {CONTENT_COLUMNS}, ts_rank(search_vector, ts_query)::real AS score \
		FROM contents, plainto_tsquery("
	));

	builder.push_bind(text_search_config.to_string());
	builder.push("::text::regconfig, ");
	builder.push_bind(keyword.to_string());
	builder.push(") AS ts_query");
	push_visible(&mut builder, now);
	builder.push(
		" AND search_vector @@ ts_query ORDER BY score DESC, published_at DESC, content_id DESC",
	);
	push_page(&mut builder, page);

	let rows = builder.build_query_as::<ScoredContentRow>().fetch_all(executor).await?;

	Ok(rows)
}

/// Substring search scored with the tiers in [`folio_domain::scoring`].
pub async fn search_scored<'e, E>(
	executor: E,
	keyword: &str,
	page: Page,
	now: OffsetDateTime,
) -> Result<Vec<ScoredContentRow>>
where
	E: Executor<'e, Database = Postgres>,
{
	let mut builder = QueryBuilder::new(format!("SELECT {CONTENT_COLUMNS}, ("));

	builder.push("CASE WHEN lower(title) = lower(");
	builder.push_bind(keyword.to_string());
	builder.push(") THEN ");
	builder.push_bind(scoring::EXACT_TITLE_BONUS);
	builder.push(" WHEN strpos(lower(title), lower(");
	builder.push_bind(keyword.to_string());
	builder.push(")) > 0 THEN ");
	builder.push_bind(scoring::TITLE_MATCH_BONUS);
	builder.push(" ELSE 0 END + CASE WHEN strpos(lower(body), lower(");
	builder.push_bind(keyword.to_string());
	builder.push(")) > 0 THEN ");
	builder.push_bind(scoring::BODY_MATCH_BONUS);
	builder.push(" ELSE 0 END + CASE");

	for (threshold, bonus) in scoring::POPULARITY_TIERS {
		builder.push(" WHEN view_count > ");
		builder.push_bind(threshold);
		builder.push(" THEN ");
		builder.push_bind(bonus);
	}

	builder.push(" ELSE 0 END + CASE");

	for (days, bonus) in scoring::FRESHNESS_TIERS {
		builder.push(" WHEN published_at >= ");
		builder.push_bind(now - Duration::days(days));
		builder.push(" THEN ");
		builder.push_bind(bonus);
	}

	builder.push(" ELSE 0 END)::real AS score FROM contents");
	push_visible(&mut builder, now);
	push_keyword_match(&mut builder, keyword);
	builder.push(" ORDER BY score DESC, view_count DESC, published_at DESC, content_id DESC");
	push_page(&mut builder, page);

	let rows = builder.build_query_as::<ScoredContentRow>().fetch_all(executor).await?;

	Ok(rows)
}

pub async fn get<'e, E>(executor: E, content_id: Uuid) -> Result<Option<ContentRow>>
where
	E: Executor<'e, Database = Postgres>,
{
	let row = sqlx::query_as::<_, ContentRow>(&format!(
		"SELECT {CONTENT_COLUMNS} FROM contents WHERE content_id = $1"
	))
	.bind(content_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn insert<'e, E>(executor: E, row: &ContentRow) -> Result<()>
where
	E: Executor<'e, Database = Postgres>,
{
	sqlx::query(
		"\
INSERT INTO contents (
	content_id,
	title,
	body,
	author_id,
	category_id,
	status,
	view_count,
	published_at,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
	)
	.bind(row.content_id)
	.bind(row.title.as_str())
	.bind(row.body.as_str())
	.bind(row.author_id)
	.bind(row.category_id)
	.bind(row.status.as_str())
	.bind(row.view_count)
	.bind(row.published_at)
	.bind(row.created_at)
	.bind(row.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

/// Writes every mutable column. `published_at` is stored as given; callers apply
/// [`ContentStatus::published_at_after`] first.
pub async fn update<'e, E>(executor: E, row: &ContentRow) -> Result<bool>
where
	E: Executor<'e, Database = Postgres>,
{
	let result = sqlx::query(
		"\
UPDATE contents
SET
	title = $1,
	body = $2,
	category_id = $3,
	status = $4,
	published_at = $5,
	updated_at = $6
WHERE content_id = $7",
	)
	.bind(row.title.as_str())
	.bind(row.body.as_str())
	.bind(row.category_id)
	.bind(row.status.as_str())
	.bind(row.published_at)
	.bind(row.updated_at)
	.bind(row.content_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn delete<'e, E>(executor: E, content_id: Uuid) -> Result<bool>
where
	E: Executor<'e, Database = Postgres>,
{
	let result = sqlx::query("DELETE FROM contents WHERE content_id = $1")
		.bind(content_id)
		.execute(executor)
		.await?;

	Ok(result.rows_affected() > 0)
}

/// Bumps the view counter and returns the new value.
pub async fn increment_views<'e, E>(executor: E, content_id: Uuid) -> Result<Option<i64>>
where
	E: Executor<'e, Database = Postgres>,
{
	let views = sqlx::query_scalar::<_, i64>(
		"UPDATE contents SET view_count = view_count + 1 WHERE content_id = $1 RETURNING view_count",
	)
	.bind(content_id)
	.fetch_optional(executor)
	.await?;

	Ok(views)
}

fn push_predicates(builder: &mut QueryBuilder<'_, Postgres>, predicates: &[Predicate]) {
	builder.push(" WHERE TRUE");

	for predicate in predicates {
		match predicate {
			Predicate::AuthorIs(author_id) => {
				builder.push(" AND author_id = ");
				builder.push_bind(*author_id);
			},
			Predicate::CategoryIs(category_id) => {
				builder.push(" AND category_id = ");
				builder.push_bind(*category_id);
			},
			Predicate::StatusIs(status) => {
				builder.push(" AND status = ");
				builder.push_bind(status.as_str());
			},
			Predicate::KeywordMatches(keyword) => push_keyword_match(builder, keyword),
		}
	}
}

fn push_visible(builder: &mut QueryBuilder<'_, Postgres>, now: OffsetDateTime) {
	builder.push(" WHERE status = ");
	builder.push_bind(ContentStatus::Published.as_str());
	builder.push(" AND published_at <= ");
	builder.push_bind(now);
}

fn push_keyword_match(builder: &mut QueryBuilder<'_, Postgres>, keyword: &str) {
	builder.push(" AND (strpos(lower(title), lower(");
	builder.push_bind(keyword.to_string());
	builder.push(")) > 0 OR strpos(lower(body), lower(");
	builder.push_bind(keyword.to_string());
	builder.push(")) > 0)");
}

fn push_page(builder: &mut QueryBuilder<'_, Postgres>, page: Page) {
	builder.push(" LIMIT ");
	builder.push_bind(i64::from(page.limit));
	builder.push(" OFFSET ");
	builder.push_bind(i64::try_from(page.offset).unwrap_or(i64::MAX));
}
