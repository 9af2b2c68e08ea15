use time::OffsetDateTime;
use uuid::Uuid;

use folio_domain::content::ContentStatus;

use crate::{Error, Result};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContentRow {
	pub content_id: Uuid,
	pub title: String,
	pub body: String,
	pub author_id: Uuid,
	pub category_id: Uuid,
	pub status: String,
	pub view_count: i64,
	pub published_at: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl ContentRow {
	pub fn status(&self) -> Result<ContentStatus> {
		self.status.parse().map_err(|err: folio_domain::content::UnknownStatus| {
			Error::InvalidArgument(format!("content {}: {err}", self.content_id))
		})
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScoredContentRow {
	#[sqlx(flatten)]
	pub content: ContentRow,
	pub score: f32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
	pub category_id: Uuid,
	pub name: String,
	pub description: String,
	pub parent_id: Option<Uuid>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
