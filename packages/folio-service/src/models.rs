use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use folio_domain::{content::ContentStatus, scoring::ScoreInput};
use folio_storage::models::{CategoryRow, ContentRow};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
	pub content_id: Uuid,
	pub title: String,
	pub body: String,
	pub author_id: Uuid,
	pub category_id: Uuid,
	pub status: ContentStatus,
	pub view_count: i64,
	#[serde(with = "time::serde::rfc3339::option")]
	pub published_at: Option<OffsetDateTime>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}
impl Content {
	/// Published with a publish time that has already passed.
	pub fn is_visible(&self, now: OffsetDateTime) -> bool {
		self.status == ContentStatus::Published
			&& self.published_at.is_some_and(|published_at| published_at <= now)
	}

	pub fn score_input(&self) -> ScoreInput<'_> {
		ScoreInput {
			title: &self.title,
			body: &self.body,
			view_count: self.view_count,
			published_at: self.published_at,
		}
	}
}
impl TryFrom<ContentRow> for Content {
	type Error = folio_storage::Error;

	fn try_from(row: ContentRow) -> Result<Self, Self::Error> {
		let status = row.status()?;

		Ok(Self {
			content_id: row.content_id,
			title: row.title,
			body: row.body,
			author_id: row.author_id,
			category_id: row.category_id,
			status,
			view_count: row.view_count,
			published_at: row.published_at,
			created_at: row.created_at,
			updated_at: row.updated_at,
		})
	}
}
impl From<&Content> for ContentRow {
	fn from(content: &Content) -> Self {
		Self {
			content_id: content.content_id,
			title: content.title.clone(),
			body: content.body.clone(),
			author_id: content.author_id,
			category_id: content.category_id,
			status: content.status.as_str().to_string(),
			view_count: content.view_count,
			published_at: content.published_at,
			created_at: content.created_at,
			updated_at: content.updated_at,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
	pub category_id: Uuid,
	pub name: String,
	pub description: String,
	pub parent_id: Option<Uuid>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}
impl From<CategoryRow> for Category {
	fn from(row: CategoryRow) -> Self {
		Self {
			category_id: row.category_id,
			name: row.name,
			description: row.description,
			parent_id: row.parent_id,
			created_at: row.created_at,
			updated_at: row.updated_at,
		}
	}
}
impl From<&Category> for CategoryRow {
	fn from(category: &Category) -> Self {
		Self {
			category_id: category.category_id,
			name: category.name.clone(),
			description: category.description.clone(),
			parent_id: category.parent_id,
			created_at: category.created_at,
			updated_at: category.updated_at,
		}
	}
}
