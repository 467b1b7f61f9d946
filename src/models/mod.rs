// src/models/mod.rs

//! Domain models for the card crawler.
//!
//! This module contains the data structures shared by the fetch, extraction
//! and storage layers, plus the application configuration.

mod card;
mod config;

// Re-export all public types
pub use card::{CardId, CardRecord};
pub use config::{
    Config, DatabaseSettings, ExtractConfig, FetchConfig, LabelVocabulary, PageSelectors,
    PipelineConfig, RetryConfig, StoreConfig, WorklistConfig,
};
