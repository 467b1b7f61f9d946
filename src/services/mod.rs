//! Service layer for the card crawler.
//!
//! This module contains the business logic for:
//! - Page fetching (`HttpFetcher`)
//! - Retry with exponential backoff (`RetryCoordinator`)
//! - Field extraction (`CardExtractor`, `CardLayout`)

mod extractor;
mod fetcher;
mod layout;
mod retry;

pub use extractor::CardExtractor;
pub use fetcher::{FetchFailure, HttpFetcher, PageFetcher};
pub use layout::{ATTACK_SEPARATOR, CardFields, CardLayout};
pub use retry::{RetryCoordinator, RetryPolicy, RetryState};
