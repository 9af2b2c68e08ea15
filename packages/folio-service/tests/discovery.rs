use std::{
	future,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};

use time::{Duration, OffsetDateTime};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use folio_config::{Config, Discovery, Postgres, Service, Storage};
use folio_domain::{
	compile::{CompiledQuery, Predicate},
	content::ContentStatus,
	query::{Page, RawDiscoveryQuery},
	scoring,
};
use folio_service::{
	BoxFuture, Category, CategoryStore, Content, ContentStore, Error, FolioService, MemoryStore,
	Result, SearchRequest, Stores, TrendingRequest, store::RankedCandidate,
};

#[derive(Debug, Clone, Copy)]
enum Mode {
	Delegate,
	Empty,
	Fail,
	Hang,
}

struct SpyStore {
	inner: Arc<MemoryStore>,
	ranked: Mode,
	scored: Mode,
	ranked_calls: AtomicUsize,
	scored_calls: AtomicUsize,
	listing_calls: AtomicUsize,
}
impl SpyStore {
	fn new(inner: Arc<MemoryStore>, ranked: Mode, scored: Mode) -> Self {
		Self {
			inner,
			ranked,
			scored,
			ranked_calls: AtomicUsize::new(0),
			scored_calls: AtomicUsize::new(0),
			listing_calls: AtomicUsize::new(0),
		}
	}

	fn calls(&self) -> (usize, usize, usize) {
		(
			self.ranked_calls.load(Ordering::SeqCst),
			self.scored_calls.load(Ordering::SeqCst),
			self.listing_calls.load(Ordering::SeqCst),
		)
	}
}
impl ContentStore for SpyStore {
	fn list<'a>(&'a self, query: &'a CompiledQuery) -> BoxFuture<'a, Result<Vec<Content>>> {
		ContentStore::list(self.inner.as_ref(), query)
	}

	fn count<'a>(&'a self, predicates: &'a [Predicate]) -> BoxFuture<'a, Result<u64>> {
		self.inner.count(predicates)
	}

	fn list_published<'a>(
		&'a self,
		page: Page,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<Content>>> {
		self.listing_calls.fetch_add(1, Ordering::SeqCst);

		self.inner.list_published(page, now)
	}

	fn trending<'a>(
		&'a self,
		limit: u32,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<Content>>> {
		self.inner.trending(limit, now)
	}

	fn search_ranked<'a>(
		&'a self,
		keyword: &'a str,
		page: Page,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<RankedCandidate>>> {
		self.ranked_calls.fetch_add(1, Ordering::SeqCst);

		scripted(self.ranked, self.inner.search_ranked(keyword, page, now))
	}

	fn search_scored<'a>(
		&'a self,
		keyword: &'a str,
		page: Page,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<RankedCandidate>>> {
		self.scored_calls.fetch_add(1, Ordering::SeqCst);

		scripted(self.scored, self.inner.search_scored(keyword, page, now))
	}

	fn get(&self, content_id: Uuid) -> BoxFuture<'_, Result<Option<Content>>> {
		ContentStore::get(self.inner.as_ref(), content_id)
	}

	fn insert<'a>(&'a self, content: &'a Content) -> BoxFuture<'a, Result<()>> {
		ContentStore::insert(self.inner.as_ref(), content)
	}

	fn update<'a>(&'a self, content: &'a Content) -> BoxFuture<'a, Result<bool>> {
		ContentStore::update(self.inner.as_ref(), content)
	}

	fn delete(&self, content_id: Uuid) -> BoxFuture<'_, Result<bool>> {
		ContentStore::delete(self.inner.as_ref(), content_id)
	}

	fn increment_views(&self, content_id: Uuid) -> BoxFuture<'_, Result<Option<i64>>> {
		self.inner.increment_views(content_id)
	}
}

fn scripted<'a>(
	mode: Mode,
	delegate: BoxFuture<'a, Result<Vec<RankedCandidate>>>,
) -> BoxFuture<'a, Result<Vec<RankedCandidate>>> {
	match mode {
		Mode::Delegate => delegate,
		Mode::Empty => Box::pin(async { Ok(Vec::new()) }),
		Mode::Fail =>
			Box::pin(async { Err(Error::Storage { message: "backend offline".to_string() }) }),
		Mode::Hang => Box::pin(future::pending()),
	}
}

fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			request_timeout_ms: 1_000,
		},
		storage: Storage {
			postgres: Postgres {
				dsn: "postgres://postgres@127.0.0.1:5432/folio".to_string(),
				pool_max_conns: 1,
			},
		},
		discovery: Discovery::default(),
	}
}

fn content(category_id: Uuid, title: &str, body: &str, views: i64, days_ago: i64) -> Content {
	let now = OffsetDateTime::now_utc();
	let published_at = now - Duration::days(days_ago);

	Content {
		content_id: Uuid::new_v4(),
		title: title.to_string(),
		body: body.to_string(),
		author_id: Uuid::new_v4(),
		category_id,
		status: ContentStatus::Published,
		view_count: views,
		published_at: Some(published_at),
		created_at: published_at,
		updated_at: published_at,
	}
}

async fn seed_category(store: &MemoryStore) -> Uuid {
	let now = OffsetDateTime::now_utc();
	let category = Category {
		category_id: Uuid::new_v4(),
		name: "Programming".to_string(),
		description: String::new(),
		parent_id: None,
		created_at: now,
		updated_at: now,
	};

	CategoryStore::insert(store, &category).await.expect("Failed to insert category.");

	category.category_id
}

async fn seed(store: &MemoryStore, rows: &[Content]) {
	for row in rows {
		ContentStore::insert(store, row).await.expect("Failed to insert content.");
	}
}

/// Exact title match "Go Basics" plus a post that only mentions it in the body.
async fn go_basics(store: &MemoryStore) -> (Content, Content) {
	let category_id = seed_category(store).await;
	let exact = content(category_id, "Go Basics", "Syntax tour.", 500, 3);
	let mention = content(category_id, "Advanced Go", "Assumes you know go basics already.", 50, 40);

	seed(store, &[exact.clone(), mention.clone()]).await;

	(exact, mention)
}

fn service_over(store: Arc<MemoryStore>) -> FolioService {
	FolioService::with_stores(test_config(), Stores::memory(store))
}

fn service_with_spy(spy: Arc<SpyStore>) -> FolioService {
	let categories = spy.inner.clone();

	FolioService::with_stores(test_config(), Stores::new(spy, categories))
}

fn ids(items: &[Content]) -> Vec<Uuid> {
	items.iter().map(|item| item.content_id).collect()
}

fn keyword(keyword: &str) -> SearchRequest {
	SearchRequest { keyword: Some(keyword.to_string()), ..Default::default() }
}

#[tokio::test]
async fn scored_fallback_ranks_exact_title_first() {
	let store = Arc::new(MemoryStore::without_ranked_search());
	let (exact, mention) = go_basics(&store).await;
	let service = service_over(store);
	let response =
		service.search(keyword("Go Basics"), &CancellationToken::new()).await.expect("Search failed.");

	assert_eq!(ids(&response.items), vec![exact.content_id, mention.content_id]);
}

#[tokio::test]
async fn equal_scores_break_ties_by_views_then_recency() {
	let store = Arc::new(MemoryStore::without_ranked_search());
	let category_id = seed_category(&store).await;
	let popular = content(category_id, "Tokio Runtime Notes", "", 50, 40);
	let recent = content(category_id, "Tokio Runtime Notes", "", 20, 40);
	let older = content(category_id, "Tokio Runtime Notes", "", 20, 60);

	seed(&store, &[older.clone(), recent.clone(), popular.clone()]).await;

	let now = OffsetDateTime::now_utc();
	let scores: Vec<i32> = [&popular, &recent, &older]
		.iter()
		.map(|row| scoring::fallback_score(row.score_input(), "runtime", now))
		.collect();

	assert_eq!(scores, vec![52, 52, 52]);

	let service = service_over(store);
	let response =
		service.search(keyword("runtime"), &CancellationToken::new()).await.expect("Search failed.");

	assert_eq!(
		ids(&response.items),
		vec![popular.content_id, recent.content_id, older.content_id]
	);
}

#[tokio::test]
async fn ranked_results_never_reach_the_fallback() {
	let inner = Arc::new(MemoryStore::new());
	let (exact, _) = go_basics(&inner).await;
	let spy = Arc::new(SpyStore::new(inner, Mode::Delegate, Mode::Delegate));
	let service = service_with_spy(spy.clone());
	let response =
		service.search(keyword("go basics"), &CancellationToken::new()).await.expect("Search failed.");

	assert_eq!(response.items.first().map(|item| item.content_id), Some(exact.content_id));
	assert_eq!(spy.calls(), (1, 0, 0));
}

#[tokio::test]
async fn empty_ranked_result_falls_through_to_scored() {
	let inner = Arc::new(MemoryStore::new());
	let (exact, mention) = go_basics(&inner).await;
	let spy = Arc::new(SpyStore::new(inner, Mode::Empty, Mode::Delegate));
	let service = service_with_spy(spy.clone());
	let response =
		service.search(keyword("go basics"), &CancellationToken::new()).await.expect("Search failed.");

	assert_eq!(ids(&response.items), vec![exact.content_id, mention.content_id]);
	assert_eq!(spy.calls(), (1, 1, 0));
}

#[tokio::test]
async fn empty_scored_result_is_final() {
	let inner = Arc::new(MemoryStore::new());

	go_basics(&inner).await;

	let spy = Arc::new(SpyStore::new(inner, Mode::Fail, Mode::Delegate));
	let service = service_with_spy(spy.clone());
	let response =
		service.search(keyword("haskell"), &CancellationToken::new()).await.expect("Search failed.");

	assert!(response.items.is_empty());
	assert_eq!(spy.calls(), (1, 1, 0));
}

#[tokio::test]
async fn failing_strategies_degrade_to_plain_listing() {
	let inner = Arc::new(MemoryStore::new());
	let (exact, mention) = go_basics(&inner).await;
	let spy = Arc::new(SpyStore::new(inner, Mode::Fail, Mode::Fail));
	let service = service_with_spy(spy.clone());
	let response =
		service.search(keyword("go basics"), &CancellationToken::new()).await.expect("Search failed.");

	// Newest publication first.
	assert_eq!(ids(&response.items), vec![exact.content_id, mention.content_id]);
	assert_eq!(spy.calls(), (1, 1, 1));
}

#[tokio::test]
async fn disabled_ranked_search_starts_at_the_fallback() {
	let inner = Arc::new(MemoryStore::new());

	go_basics(&inner).await;

	let spy = Arc::new(SpyStore::new(inner, Mode::Delegate, Mode::Delegate));
	let mut cfg = test_config();

	cfg.discovery.ranked_search = false;

	let service =
		FolioService::with_stores(cfg, Stores::new(spy.clone(), spy.inner.clone()));

	service.search(keyword("go"), &CancellationToken::new()).await.expect("Search failed.");

	assert_eq!(spy.calls(), (0, 1, 0));
}

#[tokio::test]
async fn blank_keyword_is_a_plain_listing() {
	let inner = Arc::new(MemoryStore::new());

	go_basics(&inner).await;

	let spy = Arc::new(SpyStore::new(inner, Mode::Delegate, Mode::Delegate));
	let service = service_with_spy(spy.clone());
	let cancel = CancellationToken::new();
	let blank = service.search(keyword("   "), &cancel).await.expect("Search failed.");
	let absent = service.search(SearchRequest::default(), &cancel).await.expect("Search failed.");

	assert_eq!(ids(&blank.items), ids(&absent.items));
	assert_eq!(blank.items.len(), 2);
	assert_eq!(spy.calls(), (0, 0, 2));
}

#[tokio::test]
async fn hidden_content_never_surfaces() {
	let store = Arc::new(MemoryStore::new());
	let category_id = seed_category(&store).await;
	let visible = content(category_id, "Rust Ownership", "Borrowing rules.", 10, 1);
	let mut draft = content(category_id, "Rust Drafts", "Rust notes.", 9_000, 1);
	let mut scheduled = content(category_id, "Rust Futures", "Rust async.", 9_000, 0);

	draft.status = ContentStatus::Draft;
	draft.published_at = None;
	scheduled.published_at = Some(OffsetDateTime::now_utc() + Duration::days(2));

	seed(&store, &[visible.clone(), draft, scheduled]).await;

	let service = service_over(store);
	let cancel = CancellationToken::new();
	let found = service.search(keyword("rust"), &cancel).await.expect("Search failed.");
	let hot = service.trending(TrendingRequest::default(), &cancel).await.expect("Trending failed.");

	assert_eq!(ids(&found.items), vec![visible.content_id]);
	assert_eq!(ids(&hot.items), vec![visible.content_id]);
}

#[tokio::test]
async fn trending_orders_by_views_and_clamps() {
	let store = Arc::new(MemoryStore::new());
	let category_id = seed_category(&store).await;
	let rows: Vec<Content> = (0..60)
		.map(|views| content(category_id, &format!("Post {views}"), "", views, 1))
		.collect();

	seed(&store, &rows).await;

	let service = service_over(store);
	let cancel = CancellationToken::new();
	let capped = service
		.trending(TrendingRequest { limit: Some(500) }, &cancel)
		.await
		.expect("Trending failed.");
	let default = service
		.trending(TrendingRequest { limit: Some(0) }, &cancel)
		.await
		.expect("Trending failed.");

	assert_eq!(capped.limit, 50);
	assert_eq!(capped.items.len(), 50);
	assert_eq!(capped.items.first().map(|item| item.view_count), Some(59));
	assert!(capped.items.windows(2).all(|pair| pair[0].view_count >= pair[1].view_count));
	assert_eq!(default.limit, 10);
	assert_eq!(default.items.len(), 10);
}

#[tokio::test]
async fn oversized_configured_limits_are_held_to_the_caps() {
	let store = Arc::new(MemoryStore::new());
	let category_id = seed_category(&store).await;
	let rows: Vec<Content> = (0..150)
		.map(|index| content(category_id, &format!("Post {index}"), "", index, 1))
		.collect();

	seed(&store, &rows).await;

	let mut cfg = test_config();

	cfg.discovery.max_limit = 1_000;
	cfg.discovery.trending_max_limit = 1_000;

	let service = FolioService::with_stores(cfg, Stores::memory(store));
	let cancel = CancellationToken::new();
	let listing = service
		.list(RawDiscoveryQuery { limit: Some(500), ..Default::default() }, &cancel)
		.await
		.expect("List failed.");
	let hot = service
		.trending(TrendingRequest { limit: Some(500) }, &cancel)
		.await
		.expect("Trending failed.");
	let found = service
		.search(
			SearchRequest { keyword: Some("post".to_string()), limit: Some(500), offset: None },
			&cancel,
		)
		.await
		.expect("Search failed.");

	assert_eq!(listing.limit, 100);
	assert_eq!(listing.items.len(), 100);
	assert_eq!(listing.total, 150);
	assert_eq!(hot.limit, 50);
	assert_eq!(hot.items.len(), 50);
	assert_eq!(found.limit, 100);
	assert_eq!(found.items.len(), 100);
}

#[tokio::test]
async fn list_pages_cover_the_total_exactly_once() {
	let store = Arc::new(MemoryStore::new());
	let category_id = seed_category(&store).await;
	let rows: Vec<Content> = (0..25)
		.map(|index| content(category_id, &format!("Post {index}"), "", index, index))
		.collect();

	seed(&store, &rows).await;

	let service = service_over(store);
	let cancel = CancellationToken::new();
	let mut seen = Vec::new();

	for offset in [0, 10, 20] {
		let page = service
			.list(
				RawDiscoveryQuery { limit: Some(10), offset: Some(offset), ..Default::default() },
				&cancel,
			)
			.await
			.expect("List failed.");

		assert_eq!(page.total, 25);

		seen.extend(ids(&page.items));
	}

	let mut unique = seen.clone();

	unique.sort();
	unique.dedup();

	assert_eq!(seen.len(), 25);
	assert_eq!(unique.len(), 25);
}

#[tokio::test]
async fn list_clamps_limit_and_defaults_sort() {
	let store = Arc::new(MemoryStore::new());
	let category_id = seed_category(&store).await;
	let rows: Vec<Content> = (0..120)
		.map(|index| content(category_id, &format!("Post {index}"), "", 0, index))
		.collect();

	seed(&store, &rows).await;

	let service = service_over(store);
	let response = service
		.list(
			RawDiscoveryQuery {
				sort: Some("password".to_string()),
				limit: Some(1_000),
				offset: Some(-3),
				..Default::default()
			},
			&CancellationToken::new(),
		)
		.await
		.expect("List failed.");

	assert_eq!(response.limit, 100);
	assert_eq!(response.offset, 0);
	assert_eq!(response.items.len(), 100);
	assert_eq!(response.total, 120);
	assert!(response.items.windows(2).all(|pair| pair[0].created_at >= pair[1].created_at));
}

#[tokio::test]
async fn keyword_listing_only_returns_published_matches() {
	let store = Arc::new(MemoryStore::new());
	let category_id = seed_category(&store).await;
	let published = content(category_id, "Tokio Tips", "", 0, 1);
	let mut pending = content(category_id, "Tokio Tricks", "", 0, 1);

	pending.status = ContentStatus::Pending;

	seed(&store, &[published.clone(), pending.clone()]).await;

	let service = service_over(store);
	let cancel = CancellationToken::new();
	let implicit = service
		.list(RawDiscoveryQuery { keyword: Some("tokio".to_string()), ..Default::default() }, &cancel)
		.await
		.expect("List failed.");
	let explicit = service
		.list(
			RawDiscoveryQuery {
				keyword: Some("tokio".to_string()),
				status: Some("pending".to_string()),
				..Default::default()
			},
			&cancel,
		)
		.await
		.expect("List failed.");

	assert_eq!(ids(&implicit.items), vec![published.content_id]);
	assert_eq!(ids(&explicit.items), vec![pending.content_id]);
	assert_eq!(explicit.total, 1);
}

#[tokio::test]
async fn cancelled_requests_stop_waiting() {
	let inner = Arc::new(MemoryStore::new());

	go_basics(&inner).await;

	let spy = Arc::new(SpyStore::new(inner, Mode::Hang, Mode::Delegate));
	let service = service_with_spy(spy.clone());
	let cancel = CancellationToken::new();
	let trigger = cancel.clone();

	tokio::spawn(async move {
		tokio::time::sleep(StdDuration::from_millis(20)).await;
		trigger.cancel();
	});

	let err = service.search(keyword("go"), &cancel).await.expect_err("Search should be cancelled.");

	assert!(matches!(err, Error::Cancelled));
	assert_eq!(spy.calls(), (1, 0, 0));

	let err = service
		.list(RawDiscoveryQuery::default(), &cancel)
		.await
		.expect_err("List should be cancelled.");

	assert!(matches!(err, Error::Cancelled));
}
