use serde::Serialize;
use uuid::Uuid;

use crate::{
	content::ContentStatus,
	query::{DiscoveryQuery, Page},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
	Id,
	Title,
	Author,
	Category,
	Status,
	ViewCount,
	PublishedAt,
	CreatedAt,
	UpdatedAt,
}
impl SortField {
	pub const DEFAULT: Self = Self::CreatedAt;

	pub fn column(self) -> &'static str {
		match self {
			Self::Id => "content_id",
			Self::Title => "title",
			Self::Author => "author_id",
			Self::Category => "category_id",
			Self::Status => "status",
			Self::ViewCount => "view_count",
			Self::PublishedAt => "published_at",
			Self::CreatedAt => "created_at",
			Self::UpdatedAt => "updated_at",
		}
	}

	/// Resolves caller text against the allow-list. Anything unknown yields the default field.
	pub fn resolve(raw: Option<&str>) -> Self {
		raw.and_then(Self::parse).unwrap_or(Self::DEFAULT)
	}

	fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"id" | "content_id" => Some(Self::Id),
			"title" => Some(Self::Title),
			"author" | "author_id" => Some(Self::Author),
			"category" | "category_id" => Some(Self::Category),
			"status" => Some(Self::Status),
			"view_count" | "views" => Some(Self::ViewCount),
			"published_at" => Some(Self::PublishedAt),
			"created_at" => Some(Self::CreatedAt),
			"updated_at" => Some(Self::UpdatedAt),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
	Asc,
	Desc,
}
impl SortDirection {
	pub fn resolve(raw: Option<&str>) -> Self {
		match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
			Some("asc" | "ascending") => Self::Asc,
			_ => Self::Desc,
		}
	}

	pub fn as_sql(self) -> &'static str {
		match self {
			Self::Asc => "ASC",
			Self::Desc => "DESC",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderSpec {
	pub field: SortField,
	pub direction: SortDirection,
}

/// One independent condition. A compiled query ANDs all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
	AuthorIs(Uuid),
	CategoryIs(Uuid),
	StatusIs(ContentStatus),
	/// Case-insensitive substring match against title or body.
	KeywordMatches(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
	pub predicates: Vec<Predicate>,
	pub order: OrderSpec,
	pub page: Page,
}

pub fn compile(query: &DiscoveryQuery) -> CompiledQuery {
	let mut predicates = Vec::with_capacity(4);

	if let Some(author_id) = query.author_id {
		predicates.push(Predicate::AuthorIs(author_id));
	}
	if let Some(category_id) = query.category_id {
		predicates.push(Predicate::CategoryIs(category_id));
	}

	match (query.status, query.keyword.as_ref()) {
		(Some(status), _) => predicates.push(Predicate::StatusIs(status)),
		// Keyword discovery is public-facing and must not surface unpublished content.
		(None, Some(_)) => predicates.push(Predicate::StatusIs(ContentStatus::Published)),
		(None, None) => {},
	}

	if let Some(keyword) = query.keyword.as_ref() {
		predicates.push(Predicate::KeywordMatches(keyword.clone()));
	}

	CompiledQuery {
		predicates,
		order: OrderSpec {
			field: SortField::resolve(query.sort.as_deref()),
			direction: SortDirection::resolve(query.order.as_deref()),
		},
		page: query.page,
	}
}
