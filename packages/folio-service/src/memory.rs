//! In-process store. Keeps every row in memory and answers the same queries the Postgres store
//! does, including a small term-weighted relevance search in place of `ts_rank`.

use std::{
	cmp::Ordering,
	collections::HashMap,
	sync::{Mutex, MutexGuard},
};

use time::OffsetDateTime;
use uuid::Uuid;

use folio_domain::{
	category,
	compile::{CompiledQuery, Predicate, SortDirection, SortField},
	query::Page,
	scoring,
};

use crate::{
	BoxFuture, Category, CategoryStore, Content, ContentStore, Error, Result,
	store::RankedCandidate,
};

const TITLE_TERM_WEIGHT: f32 = 1.0;
const BODY_TERM_WEIGHT: f32 = 0.4;

#[derive(Default)]
struct State {
	contents: HashMap<Uuid, Content>,
	categories: HashMap<Uuid, Category>,
}

pub struct MemoryStore {
	state: Mutex<State>,
	ranked_search: bool,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self { state: Mutex::new(State::default()), ranked_search: true }
	}

	/// A store whose relevance search always reports itself unavailable.
	pub fn without_ranked_search() -> Self {
		Self { state: Mutex::new(State::default()), ranked_search: false }
	}

	fn state(&self) -> MutexGuard<'_, State> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn visible(&self, now: OffsetDateTime) -> Vec<Content> {
		self.state().contents.values().filter(|content| content.is_visible(now)).cloned().collect()
	}
}
impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}
impl ContentStore for MemoryStore {
	fn list<'a>(&'a self, query: &'a CompiledQuery) -> BoxFuture<'a, Result<Vec<Content>>> {
		Box::pin(async move {
			let mut rows: Vec<Content> = self
				.state()
				.contents
				.values()
				.filter(|content| matches_all(content, &query.predicates))
				.cloned()
				.collect();

			rows.sort_by(|a, b| compare_by(a, b, query.order.field, query.order.direction));

			Ok(paginate(rows, query.page))
		})
	}

	fn count<'a>(&'a self, predicates: &'a [Predicate]) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let total = self
				.state()
				.contents
				.values()
				.filter(|content| matches_all(content, predicates))
				.count();

			Ok(u64::try_from(total).unwrap_or(u64::MAX))
		})
	}

	fn list_published<'a>(
		&'a self,
		page: Page,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<Content>>> {
		Box::pin(async move {
			let mut rows = self.visible(now);

			rows.sort_by(newest_first);

			Ok(paginate(rows, page))
		})
	}

	fn trending<'a>(
		&'a self,
		limit: u32,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<Content>>> {
		Box::pin(async move {
			let mut rows = self.visible(now);

			rows.sort_by(|a, b| b.view_count.cmp(&a.view_count).then_with(|| newest_first(a, b)));

			Ok(paginate(rows, Page { limit, offset: 0 }))
		})
	}

	fn search_ranked<'a>(
		&'a self,
		keyword: &'a str,
		page: Page,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<RankedCandidate>>> {
		Box::pin(async move {
			if !self.ranked_search {
				return Err(Error::Unavailable {
					message: "Relevance search is not available in this store.".to_string(),
				});
			}

			let terms = terms(keyword);
			let mut candidates: Vec<RankedCandidate> = self
				.visible(now)
				.into_iter()
				.filter_map(|content| {
					term_rank(&content, &terms).map(|score| RankedCandidate { content, score })
				})
				.collect();

			candidates.sort_by(|a, b| {
				b.score.total_cmp(&a.score).then_with(|| newest_first(&a.content, &b.content))
			});

			Ok(paginate(candidates, page))
		})
	}

	fn search_scored<'a>(
		&'a self,
		keyword: &'a str,
		page: Page,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<RankedCandidate>>> {
		Box::pin(async move {
			let mut candidates: Vec<RankedCandidate> = self
				.visible(now)
				.into_iter()
				.filter(|content| scoring::matches_keyword(&content.title, &content.body, keyword))
				.map(|content| {
					let score = scoring::fallback_score(content.score_input(), keyword, now);

					RankedCandidate { content, score: score as f32 }
				})
				.collect();

			candidates.sort_by(|a, b| {
				b.score
					.total_cmp(&a.score)
					.then_with(|| b.content.view_count.cmp(&a.content.view_count))
					.then_with(|| newest_first(&a.content, &b.content))
			});

			Ok(paginate(candidates, page))
		})
	}

	fn get(&self, content_id: Uuid) -> BoxFuture<'_, Result<Option<Content>>> {
		Box::pin(async move { Ok(self.state().contents.get(&content_id).cloned()) })
	}

	fn insert<'a>(&'a self, content: &'a Content) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut state = self.state();

			if !state.categories.contains_key(&content.category_id) {
				return Err(Error::NotFound {
					message: format!("category {}", content.category_id),
				});
			}
			if state.contents.contains_key(&content.content_id) {
				return Err(Error::Conflict {
					message: format!("content {} already exists", content.content_id),
				});
			}

			state.contents.insert(content.content_id, content.clone());

			Ok(())
		})
	}

	fn update<'a>(&'a self, content: &'a Content) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			let mut state = self.state();

			if !state.categories.contains_key(&content.category_id) {
				return Err(Error::NotFound {
					message: format!("category {}", content.category_id),
				});
			}

			let Some(current) = state.contents.get_mut(&content.content_id) else {
				return Ok(false);
			};
			let view_count = current.view_count;

			*current = Content { view_count, ..content.clone() };

			Ok(true)
		})
	}

	fn delete(&self, content_id: Uuid) -> BoxFuture<'_, Result<bool>> {
		Box::pin(async move { Ok(self.state().contents.remove(&content_id).is_some()) })
	}

	fn increment_views(&self, content_id: Uuid) -> BoxFuture<'_, Result<Option<i64>>> {
		Box::pin(async move {
			let mut state = self.state();
			let views = state.contents.get_mut(&content_id).map(|content| {
				content.view_count += 1;

				content.view_count
			});

			Ok(views)
		})
	}
}
impl CategoryStore for MemoryStore {
	fn get(&self, category_id: Uuid) -> BoxFuture<'_, Result<Option<Category>>> {
		Box::pin(async move { Ok(self.state().categories.get(&category_id).cloned()) })
	}

	fn list(&self) -> BoxFuture<'_, Result<Vec<Category>>> {
		Box::pin(async move {
			let mut rows: Vec<Category> = self.state().categories.values().cloned().collect();

			rows.sort_by(|a, b| {
				a.name.cmp(&b.name).then_with(|| a.category_id.cmp(&b.category_id))
			});

			Ok(rows)
		})
	}

	fn parent_links(&self) -> BoxFuture<'_, Result<HashMap<Uuid, Option<Uuid>>>> {
		Box::pin(async move { Ok(links_of(&self.state())) })
	}

	fn insert<'a>(&'a self, category: &'a Category) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut state = self.state();

			if let Some(parent_id) = category.parent_id
				&& !state.categories.contains_key(&parent_id)
			{
				return Err(Error::NotFound { message: format!("parent category {parent_id}") });
			}
			if state.categories.contains_key(&category.category_id) {
				return Err(Error::Conflict {
					message: format!("category {} already exists", category.category_id),
				});
			}

			state.categories.insert(category.category_id, category.clone());

			Ok(())
		})
	}

	fn update<'a>(&'a self, category: &'a Category) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut state = self.state();

			if let Some(parent_id) = category.parent_id {
				let links = links_of(&state);

				if !links.contains_key(&parent_id) {
					return Err(Error::NotFound {
						message: format!("parent category {parent_id}"),
					});
				}
				if category::would_create_cycle(&links, category.category_id, parent_id) {
					return Err(Error::Conflict {
						message: format!(
							"category {} cannot move under {parent_id}; that would create a cycle",
							category.category_id
						),
					});
				}
			}

			let Some(current) = state.categories.get_mut(&category.category_id) else {
				return Err(Error::NotFound {
					message: format!("category {}", category.category_id),
				});
			};

			*current = Category { created_at: current.created_at, ..category.clone() };

			Ok(())
		})
	}

	fn delete(&self, category_id: Uuid) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			let mut state = self.state();

			if !state.categories.contains_key(&category_id) {
				return Err(Error::NotFound { message: format!("category {category_id}") });
			}

			let children =
				state.categories.values().filter(|row| row.parent_id == Some(category_id)).count();
			let contents =
				state.contents.values().filter(|row| row.category_id == category_id).count();

			if children > 0 || contents > 0 {
				return Err(Error::Conflict {
					message: format!(
						"category {category_id} still has {children} child categories and {contents} content items"
					),
				});
			}

			state.categories.remove(&category_id);

			Ok(())
		})
	}
}

fn links_of(state: &State) -> HashMap<Uuid, Option<Uuid>> {
	state.categories.values().map(|row| (row.category_id, row.parent_id)).collect()
}

fn matches_all(content: &Content, predicates: &[Predicate]) -> bool {
	predicates.iter().all(|predicate| match predicate {
		Predicate::AuthorIs(author_id) => content.author_id == *author_id,
		Predicate::CategoryIs(category_id) => content.category_id == *category_id,
		Predicate::StatusIs(status) => content.status == *status,
		Predicate::KeywordMatches(keyword) =>
			scoring::matches_keyword(&content.title, &content.body, keyword),
	})
}

/// Orders by `field` in `direction` with missing values last, then by id in the same direction.
fn compare_by(a: &Content, b: &Content, field: SortField, direction: SortDirection) -> Ordering {
	let directed = |ordering: Ordering| match direction {
		SortDirection::Asc => ordering,
		SortDirection::Desc => ordering.reverse(),
	};
	let primary = match field {
		SortField::Id => Ordering::Equal,
		SortField::Title => directed(a.title.cmp(&b.title)),
		SortField::Author => directed(a.author_id.cmp(&b.author_id)),
		SortField::Category => directed(a.category_id.cmp(&b.category_id)),
		SortField::Status => directed(a.status.as_str().cmp(b.status.as_str())),
		SortField::ViewCount => directed(a.view_count.cmp(&b.view_count)),
		SortField::PublishedAt => match (a.published_at, b.published_at) {
			(Some(left), Some(right)) => directed(left.cmp(&right)),
			(Some(_), None) => Ordering::Less,
			(None, Some(_)) => Ordering::Greater,
			(None, None) => Ordering::Equal,
		},
		SortField::CreatedAt => directed(a.created_at.cmp(&b.created_at)),
		SortField::UpdatedAt => directed(a.updated_at.cmp(&b.updated_at)),
	};

	primary.then_with(|| directed(a.content_id.cmp(&b.content_id)))
}

fn newest_first(a: &Content, b: &Content) -> Ordering {
	compare_by(a, b, SortField::PublishedAt, SortDirection::Desc)
}

fn paginate<T>(rows: Vec<T>, page: Page) -> Vec<T> {
	let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
	let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);

	rows.into_iter().skip(offset).take(limit).collect()
}

fn terms(keyword: &str) -> Vec<String> {
	keyword
		.split(|ch: char| !ch.is_alphanumeric())
		.filter(|term| !term.is_empty())
		.map(str::to_lowercase)
		.collect()
}

/// Every term must appear as a word in the title or body. Title hits weigh more than body hits.
fn term_rank(content: &Content, terms: &[String]) -> Option<f32> {
	if terms.is_empty() {
		return None;
	}

	let title = self::terms(&content.title);
	let body = self::terms(&content.body);
	let mut score = 0.0;

	for term in terms {
		let title_hits = title.iter().filter(|word| *word == term).count();
		let body_hits = body.iter().filter(|word| *word == term).count();

		if title_hits + body_hits == 0 {
			return None;
		}

		score += title_hits as f32 * TITLE_TERM_WEIGHT + body_hits as f32 * BODY_TERM_WEIGHT;
	}

	Some(score)
}
