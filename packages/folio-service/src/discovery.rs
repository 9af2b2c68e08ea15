pub(crate) mod strategy;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::Instrument as _;

use folio_domain::{
	compile,
	query::{DiscoveryQuery, PageLimits, RawDiscoveryQuery, lenient_count, normalize_keyword},
};

use crate::{Content, FolioService, Result, until_cancelled};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
	pub keyword: Option<String>,
	#[serde(default, deserialize_with = "lenient_count")]
	pub limit: Option<i64>,
	#[serde(default, deserialize_with = "lenient_count")]
	pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
	pub items: Vec<Content>,
	pub limit: u32,
	pub offset: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
	pub items: Vec<Content>,
	/// Matches for the filters alone, ignoring the page.
	pub total: u64,
	pub limit: u32,
	pub offset: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendingRequest {
	#[serde(default, deserialize_with = "lenient_count")]
	pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingResponse {
	pub items: Vec<Content>,
	pub limit: u32,
}

impl FolioService {
	/// Keyword search over visible content.
	///
	/// A blank keyword is a plain listing. Otherwise the keyword runs through the strategy chain:
	/// relevance search, then scored substring search, then plain listing, each taking over when
	/// the previous one cannot serve.
	pub async fn search(
		&self,
		req: SearchRequest,
		cancel: &CancellationToken,
	) -> Result<SearchResponse> {
		let page = PageLimits::listing(&self.cfg.discovery).page(req.limit, req.offset);
		let keyword = normalize_keyword(req.keyword.as_deref());
		let span = tracing::info_span!(
			"discovery.search",
			limit = page.limit,
			offset = page.offset,
			has_keyword = keyword.is_some()
		);

		async move {
			let now = OffsetDateTime::now_utc();
			let items = match keyword {
				Some(keyword) => {
					let search = strategy::KeywordSearch { keyword: &keyword, page, now };

					strategy::run(&self.strategies, self.stores.contents.as_ref(), &search, cancel)
						.await?
				},
				None =>
					until_cancelled(cancel, self.stores.contents.list_published(page, now)).await?,
			};

			Ok(SearchResponse { items, limit: page.limit, offset: page.offset })
		}
		.instrument(span)
		.await
	}

	/// Filtered, sorted, paginated listing plus the total match count.
	pub async fn list(
		&self,
		raw: RawDiscoveryQuery,
		cancel: &CancellationToken,
	) -> Result<ListResponse> {
		let status_given = raw.status.is_some();
		let query = DiscoveryQuery::normalize(raw, PageLimits::listing(&self.cfg.discovery));
		let compiled = compile::compile(&query);
		let span = tracing::info_span!(
			"discovery.list",
			limit = compiled.page.limit,
			offset = compiled.page.offset,
			predicates = compiled.predicates.len()
		);

		async move {
			if status_given && query.status.is_none() {
				tracing::warn!("Ignoring unknown status filter.");
			}

			let contents = self.stores.contents.as_ref();
			let (items, total) = until_cancelled(cancel, async {
				tokio::try_join!(contents.list(&compiled), contents.count(&compiled.predicates))
			})
			.await?;

			Ok(ListResponse {
				items,
				total,
				limit: compiled.page.limit,
				offset: compiled.page.offset,
			})
		}
		.instrument(span)
		.await
	}

	/// Most viewed visible content.
	pub async fn trending(
		&self,
		req: TrendingRequest,
		cancel: &CancellationToken,
	) -> Result<TrendingResponse> {
		let limit = PageLimits::trending(&self.cfg.discovery).clamp_limit(req.limit);
		let span = tracing::info_span!("discovery.trending", limit);

		async move {
			let now = OffsetDateTime::now_utc();
			let items = until_cancelled(cancel, self.stores.contents.trending(limit, now)).await?;

			Ok(TrendingResponse { items, limit })
		}
		.instrument(span)
		.await
	}
}
