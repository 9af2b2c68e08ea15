use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use folio_domain::category;

use crate::{Category, Error, FolioService, Result, until_cancelled};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
	pub name: String,
	#[serde(default)]
	pub description: String,
	pub parent_id: Option<Uuid>,
}

/// Absent fields keep their current value. `"parent_id": null` detaches the category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategoryRequest {
	pub name: Option<String>,
	pub description: Option<String>,
	#[serde(
		default,
		deserialize_with = "present",
		skip_serializing_if = "Option::is_none"
	)]
	pub parent_id: Option<Option<Uuid>>,
}

impl FolioService {
	/// Whether attaching `category_id` under `candidate_parent_id` would close a loop.
	pub async fn would_create_cycle(
		&self,
		category_id: Uuid,
		candidate_parent_id: Uuid,
		cancel: &CancellationToken,
	) -> Result<bool> {
		if category_id == candidate_parent_id {
			return Ok(true);
		}

		let links = until_cancelled(cancel, self.stores.categories.parent_links()).await?;

		Ok(category::would_create_cycle(&links, category_id, candidate_parent_id))
	}

	pub async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category> {
		let now = OffsetDateTime::now_utc();
		let category = Category {
			category_id: Uuid::new_v4(),
			name: required_name(&req.name)?,
			description: req.description,
			parent_id: req.parent_id,
			created_at: now,
			updated_at: now,
		};

		self.stores.categories.insert(&category).await?;

		tracing::info!(category_id = %category.category_id, "Category created.");

		Ok(category)
	}

	pub async fn get_category(&self, category_id: Uuid) -> Result<Category> {
		self.stores
			.categories
			.get(category_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: format!("category {category_id}") })
	}

	pub async fn list_categories(&self) -> Result<Vec<Category>> {
		self.stores.categories.list().await
	}

	/// Applies the changes. A new parent must exist and must not sit below the category.
	pub async fn update_category(
		&self,
		category_id: Uuid,
		req: UpdateCategoryRequest,
		cancel: &CancellationToken,
	) -> Result<Category> {
		let current = self.get_category(category_id).await?;
		let parent_id = req.parent_id.unwrap_or(current.parent_id);

		if let Some(parent_id) = parent_id
			&& current.parent_id != Some(parent_id)
		{
			self.get_category(parent_id).await?;

			if self.would_create_cycle(category_id, parent_id, cancel).await? {
				tracing::warn!(
					%category_id,
					%parent_id,
					"Rejected category move that forms a cycle."
				);

				return Err(Error::Conflict {
					message: format!(
						"category {category_id} cannot move under {parent_id}; that would create a cycle"
					),
				});
			}
		}

		let name = match req.name.as_deref() {
			Some(name) => required_name(name)?,
			None => current.name.clone(),
		};
		let updated = Category {
			name,
			description: req.description.unwrap_or_else(|| current.description.clone()),
			parent_id,
			updated_at: OffsetDateTime::now_utc(),
			..current
		};

		self.stores.categories.update(&updated).await?;

		Ok(updated)
	}

	pub async fn delete_category(&self, category_id: Uuid) -> Result<()> {
		self.stores.categories.delete(category_id).await?;

		tracing::info!(%category_id, "Category deleted.");

		Ok(())
	}
}

fn required_name(raw: &str) -> Result<String> {
	let name = raw.trim();

	if name.is_empty() {
		return Err(Error::InvalidRequest { message: "name must not be empty.".to_string() });
	}

	Ok(name.to_string())
}

/// Maps a present field, `null` included, to `Some`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	T::deserialize(deserializer).map(Some)
}
