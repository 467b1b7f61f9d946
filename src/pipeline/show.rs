// src/pipeline/show.rs

//! Single-card lookup without database access.

use crate::error::Result;
use crate::models::{CardId, CardRecord, Config};
use crate::services::{CardExtractor, HttpFetcher, RetryCoordinator, RetryPolicy};
use crate::utils::TokioSleeper;

/// Fetch and extract one card.
///
/// Returns `None` if the page does not have the expected shape.
pub async fn run_show(config: &Config, id: CardId) -> Result<Option<CardRecord>> {
    let extractor = CardExtractor::new(&config.extract)?;
    let fetcher = HttpFetcher::new(&config.fetch)?;
    log::info!("Fetching {}", fetcher.url_for(id));

    let coordinator = RetryCoordinator::new(fetcher, TokioSleeper, RetryPolicy::from(&config.retry));
    let body = coordinator.fetch_with_retry(id).await?;

    Ok(extractor.extract(id, &body))
}
