use std::cmp::Ordering;

use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use folio_domain::query::Page;

use crate::{
	BoxFuture, Content, ContentStore, Error, Result, store::RankedCandidate, until_cancelled,
};

pub(crate) struct KeywordSearch<'a> {
	pub(crate) keyword: &'a str,
	pub(crate) page: Page,
	pub(crate) now: OffsetDateTime,
}

/// One way of answering a keyword search.
pub(crate) trait SearchStrategy
where
	Self: Send + Sync,
{
	fn name(&self) -> &'static str;

	/// Whether an empty answer hands the search to the next strategy.
	fn yields_on_empty(&self) -> bool;

	fn attempt<'a>(
		&'a self,
		store: &'a dyn ContentStore,
		search: &'a KeywordSearch<'a>,
	) -> BoxFuture<'a, Result<Vec<RankedCandidate>>>;

	/// Final result order.
	fn compare(&self, a: &RankedCandidate, b: &RankedCandidate) -> Ordering;
}

struct RankedSearch;

struct ScoredSearch;

struct PublishedListing;

impl SearchStrategy for RankedSearch {
	fn name(&self) -> &'static str {
		"ranked"
	}

	fn yields_on_empty(&self) -> bool {
		true
	}

	fn attempt<'a>(
		&'a self,
		store: &'a dyn ContentStore,
		search: &'a KeywordSearch<'a>,
	) -> BoxFuture<'a, Result<Vec<RankedCandidate>>> {
		store.search_ranked(search.keyword, search.page, search.now)
	}

	fn compare(&self, a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
		b.score.total_cmp(&a.score).then_with(|| newest_first(&a.content, &b.content))
	}
}

impl SearchStrategy for ScoredSearch {
	fn name(&self) -> &'static str {
		"scored"
	}

	fn yields_on_empty(&self) -> bool {
		false
	}

	fn attempt<'a>(
		&'a self,
		store: &'a dyn ContentStore,
		search: &'a KeywordSearch<'a>,
	) -> BoxFuture<'a, Result<Vec<RankedCandidate>>> {
		store.search_scored(search.keyword, search.page, search.now)
	}

	fn compare(&self, a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
		b.score
			.total_cmp(&a.score)
			.then_with(|| b.content.view_count.cmp(&a.content.view_count))
			.then_with(|| newest_first(&a.content, &b.content))
	}
}

impl SearchStrategy for PublishedListing {
	fn name(&self) -> &'static str {
		"listing"
	}

	fn yields_on_empty(&self) -> bool {
		false
	}

	fn attempt<'a>(
		&'a self,
		store: &'a dyn ContentStore,
		search: &'a KeywordSearch<'a>,
	) -> BoxFuture<'a, Result<Vec<RankedCandidate>>> {
		Box::pin(async move {
			let rows = store.list_published(search.page, search.now).await?;

			Ok(rows.into_iter().map(|content| RankedCandidate { content, score: 0.0 }).collect())
		})
	}

	fn compare(&self, a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
		newest_first(&a.content, &b.content)
	}
}

/// Strategies in the order a keyword search tries them.
pub(crate) fn keyword_chain(cfg: &folio_config::Discovery) -> Vec<Box<dyn SearchStrategy>> {
	let mut chain: Vec<Box<dyn SearchStrategy>> = Vec::with_capacity(3);

	if cfg.ranked_search {
		chain.push(Box::new(RankedSearch));
	}

	chain.push(Box::new(ScoredSearch));
	chain.push(Box::new(PublishedListing));

	chain
}

/// Runs `chain` until one strategy serves. Errors from the last strategy propagate.
pub(crate) async fn run(
	chain: &[Box<dyn SearchStrategy>],
	store: &dyn ContentStore,
	search: &KeywordSearch<'_>,
	cancel: &CancellationToken,
) -> Result<Vec<Content>> {
	let last = chain.len().saturating_sub(1);

	for (index, strategy) in chain.iter().enumerate() {
		let terminal = index == last;

		match until_cancelled(cancel, strategy.attempt(store, search)).await {
			Ok(candidates) if candidates.is_empty() && strategy.yields_on_empty() && !terminal => {
				tracing::info!(
					strategy = strategy.name(),
					"Strategy found nothing. Trying the next one."
				);
			},
			Ok(mut candidates) => {
				candidates.sort_by(|a, b| strategy.compare(a, b));

				tracing::info!(
					strategy = strategy.name(),
					results = candidates.len(),
					"Keyword search served."
				);

				return Ok(candidates.into_iter().map(|candidate| candidate.content).collect());
			},
			Err(Error::Cancelled) => return Err(Error::Cancelled),
			Err(err) if terminal => return Err(err),
			Err(err) => {
				tracing::warn!(
					strategy = strategy.name(),
					error = %err,
					"Strategy failed. Trying the next one."
				);
			},
		}
	}

	Ok(Vec::new())
}

fn newest_first(a: &Content, b: &Content) -> Ordering {
	b.published_at.cmp(&a.published_at).then_with(|| b.content_id.cmp(&a.content_id))
}
