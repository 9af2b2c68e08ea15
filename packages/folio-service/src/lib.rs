pub mod categories;
pub mod contents;
pub mod discovery;
pub mod memory;
pub mod models;
pub mod pg;
pub mod store;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

use tokio_util::sync::CancellationToken;

pub use categories::{CreateCategoryRequest, UpdateCategoryRequest};
pub use contents::{CreateContentRequest, UpdateContentRequest, ViewCountResponse};
pub use discovery::{
	ListResponse, SearchRequest, SearchResponse, TrendingRequest, TrendingResponse,
};
pub use error::{Error, Result};
use folio_config::Config;
use folio_storage::db::Db;
pub use memory::MemoryStore;
pub use models::{Category, Content};
pub use pg::PgStore;
pub use store::{CategoryStore, ContentStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Clone)]
pub struct Stores {
	pub contents: Arc<dyn ContentStore>,
	pub categories: Arc<dyn CategoryStore>,
}
impl Stores {
	pub fn new(contents: Arc<dyn ContentStore>, categories: Arc<dyn CategoryStore>) -> Self {
		Self { contents, categories }
	}

	pub fn postgres(cfg: &Config, db: Db) -> Self {
		let store = Arc::new(PgStore::new(db, cfg.discovery.text_search_config.clone()));

		Self { contents: store.clone(), categories: store }
	}

	pub fn memory(store: Arc<MemoryStore>) -> Self {
		Self { contents: store.clone(), categories: store }
	}
}

pub struct FolioService {
	pub cfg: Config,
	pub stores: Stores,
	strategies: Vec<Box<dyn discovery::strategy::SearchStrategy>>,
}
impl FolioService {
	pub fn new(cfg: Config, db: Db) -> Self {
		let stores = Stores::postgres(&cfg, db);

		Self::with_stores(cfg, stores)
	}

	pub fn with_stores(cfg: Config, stores: Stores) -> Self {
		let strategies = discovery::strategy::keyword_chain(&cfg.discovery);

		Self { cfg, stores, strategies }
	}
}

/// Races `fut` against `cancel`. Whichever finishes first decides the outcome.
pub(crate) async fn until_cancelled<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	tokio::select! {
		biased;
		() = cancel.cancelled() => Err(Error::Cancelled),
		result = fut => result,
	}
}
