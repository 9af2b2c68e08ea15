use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use folio_domain::content::ContentStatus;

use crate::{Content, Error, FolioService, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContentRequest {
	pub title: String,
	#[serde(default)]
	pub body: String,
	pub author_id: Uuid,
	pub category_id: Uuid,
	/// Defaults to draft.
	pub status: Option<ContentStatus>,
}

/// Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateContentRequest {
	pub title: Option<String>,
	pub body: Option<String>,
	pub category_id: Option<Uuid>,
	pub status: Option<ContentStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewCountResponse {
	pub content_id: Uuid,
	pub view_count: i64,
}

impl FolioService {
	pub async fn create_content(&self, req: CreateContentRequest) -> Result<Content> {
		let title = required_title(&req.title)?;

		self.require_category(req.category_id).await?;

		let now = OffsetDateTime::now_utc();
		let status = req.status.unwrap_or(ContentStatus::Draft);
		let content = Content {
			content_id: Uuid::new_v4(),
			title,
			body: req.body,
			author_id: req.author_id,
			category_id: req.category_id,
			status,
			view_count: 0,
			published_at: status.published_at_after(None, now),
			created_at: now,
			updated_at: now,
		};

		self.stores.contents.insert(&content).await?;

		tracing::info!(content_id = %content.content_id, status = %status, "Content created.");

		Ok(content)
	}

	pub async fn get_content(&self, content_id: Uuid) -> Result<Content> {
		self.stores
			.contents
			.get(content_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: format!("content {content_id}") })
	}

	pub async fn update_content(
		&self,
		content_id: Uuid,
		req: UpdateContentRequest,
	) -> Result<Content> {
		let current = self.get_content(content_id).await?;
		let title = match req.title.as_deref() {
			Some(title) => required_title(title)?,
			None => current.title.clone(),
		};

		if let Some(category_id) = req.category_id
			&& category_id != current.category_id
		{
			self.require_category(category_id).await?;
		}

		let now = OffsetDateTime::now_utc();
		let status = req.status.unwrap_or(current.status);
		let updated = Content {
			title,
			body: req.body.unwrap_or_else(|| current.body.clone()),
			category_id: req.category_id.unwrap_or(current.category_id),
			status,
			published_at: status.published_at_after(current.published_at, now),
			updated_at: now,
			..current
		};

		if !self.stores.contents.update(&updated).await? {
			return Err(Error::NotFound { message: format!("content {content_id}") });
		}

		Ok(updated)
	}

	pub async fn delete_content(&self, content_id: Uuid) -> Result<()> {
		if !self.stores.contents.delete(content_id).await? {
			return Err(Error::NotFound { message: format!("content {content_id}") });
		}

		tracing::info!(%content_id, "Content deleted.");

		Ok(())
	}

	pub async fn record_view(&self, content_id: Uuid) -> Result<ViewCountResponse> {
		let view_count = self
			.stores
			.contents
			.increment_views(content_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: format!("content {content_id}") })?;

		Ok(ViewCountResponse { content_id, view_count })
	}

	async fn require_category(&self, category_id: Uuid) -> Result<()> {
		match self.stores.categories.get(category_id).await? {
			Some(_) => Ok(()),
			None => Err(Error::NotFound { message: format!("category {category_id}") }),
		}
	}
}

fn required_title(raw: &str) -> Result<String> {
	let title = raw.trim();

	if title.is_empty() {
		return Err(Error::InvalidRequest { message: "title must not be empty.".to_string() });
	}

	Ok(title.to_string())
}
