// src/pipeline/ingest.rs

//! Card ingest pipeline.
//!
//! Processes the worklist strictly in order: fetch (with retry), extract,
//! upsert, pause. A card whose page never loads aborts the run; every other
//! per-card failure is logged and skipped.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{CardId, CardRecord, Config, DatabaseSettings};
use crate::services::{CardExtractor, HttpFetcher, PageFetcher, RetryCoordinator, RetryPolicy};
use crate::storage::{CardTable, CardWriter, PgCardStore, UpsertOutcome, Worklist};
use crate::utils::{Sleeper, TokioSleeper};

/// Options for a single ingest run.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Process these ids instead of querying the worklist.
    pub ids: Option<Vec<CardId>>,
    /// Fetch and extract, but write nothing.
    pub dry_run: bool,
}

/// Counters for one ingest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Cards whose page was fetched
    pub processed: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Records whose write failed
    pub failed: usize,
    /// Pages that did not have the expected shape
    pub skipped: usize,
}

impl IngestSummary {
    fn started() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            processed: 0,
            inserted: 0,
            updated: 0,
            failed: 0,
            skipped: 0,
        }
    }

    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Failed => self.failed += 1,
        }
    }

    pub fn log(&self) {
        let elapsed = self.finished_at - self.started_at;
        log::info!(
            "Ingest finished in {}s: {} processed, {} inserted, {} updated, {} failed writes, {} skipped pages",
            elapsed.num_seconds(),
            self.processed,
            self.inserted,
            self.updated,
            self.failed,
            self.skipped
        );
    }
}

/// Runs cards through fetch, extraction and persistence.
pub struct Ingestor<F, T, S> {
    coordinator: RetryCoordinator<F, S>,
    extractor: CardExtractor,
    writer: Option<CardWriter<T>>,
    sleeper: S,
    item_delay: Duration,
}

impl<F, T, S> Ingestor<F, T, S>
where
    F: PageFetcher,
    T: CardTable,
    S: Sleeper + Clone,
{
    /// Create an ingestor. With no writer, records are only reported.
    pub fn new(
        fetcher: F,
        sleeper: S,
        policy: RetryPolicy,
        extractor: CardExtractor,
        writer: Option<CardWriter<T>>,
        item_delay: Duration,
    ) -> Self {
        Self {
            coordinator: RetryCoordinator::new(fetcher, sleeper.clone(), policy),
            extractor,
            writer,
            sleeper,
            item_delay,
        }
    }

    pub fn into_writer(self) -> Option<CardWriter<T>> {
        self.writer
    }

    /// Process `ids` in order.
    ///
    /// Returns [`AppError::RetriesExhausted`] as soon as one card cannot be
    /// fetched; later cards are not touched.
    pub async fn run(&mut self, ids: &[CardId]) -> Result<IngestSummary> {
        let mut summary = IngestSummary::started();
        let total = ids.len();

        for (index, &id) in ids.iter().enumerate() {
            log::info!("[{}/{}] Card {id}", index + 1, total);

            let body = self.coordinator.fetch_with_retry(id).await?;
            summary.processed += 1;

            match self.extractor.extract(id, &body) {
                Some(record) => {
                    if let Some(writer) = self.writer.as_mut() {
                        summary.record(writer.upsert(&record).await);
                    }
                    self.report(&record);
                }
                None => summary.skipped += 1,
            }

            self.sleeper.sleep(self.item_delay).await;
        }

        summary.finished_at = Utc::now();
        Ok(summary)
    }

    fn report(&self, record: &CardRecord) {
        let labels = self.extractor.labels();
        log::info!("{}", record.name);
        log::info!("{}: {}", labels.ability, record.ability);
        log::info!("{}: {}", labels.move_, record.attack);
    }
}

/// Run the ingest batch against the configured site and database.
pub async fn run_ingest(config: &Config, options: IngestOptions) -> Result<IngestSummary> {
    let extractor = CardExtractor::new(&config.extract)?;
    let fetcher = HttpFetcher::new(&config.fetch)?;

    // A dry run over explicit ids never touches the database.
    let needs_db = !(options.dry_run && options.ids.is_some());
    let mut store = if needs_db {
        let settings = DatabaseSettings::from_env()?;
        Some(PgCardStore::connect(&settings, &config.store, &config.worklist).await?)
    } else {
        None
    };

    let ids = match (options.ids, store.as_mut()) {
        (Some(ids), _) => ids,
        (None, Some(store)) => store.card_ids().await?,
        (None, None) => {
            return Err(AppError::config(
                "no card ids given and no database to read the worklist from",
            ));
        }
    };
    log::info!("Worklist holds {} cards", ids.len());

    let writer = match store {
        Some(store) if !options.dry_run => Some(CardWriter::new(store)),
        Some(store) => {
            store.close().await?;
            None
        }
        None => None,
    };

    let mut ingestor = Ingestor::new(
        fetcher,
        TokioSleeper,
        RetryPolicy::from(&config.retry),
        extractor,
        writer,
        config.pipeline.item_delay(),
    );
    let summary = ingestor.run(&ids).await?;
    summary.log();

    if let Some(writer) = ingestor.into_writer() {
        writer.into_inner().close().await?;
    }

    Ok(summary)
}
