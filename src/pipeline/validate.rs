// src/pipeline/validate.rs

use crate::error::Result;
use crate::models::Config;
use crate::services::CardExtractor;

/// Validate the configuration and report the effective settings.
pub fn run_validate(config: &Config) -> Result<()> {
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {e}");
        return Err(e);
    }
    CardExtractor::new(&config.extract)?;

    log::info!("Config OK");
    log::info!("    Base URL: {}", config.fetch.base_url);
    log::info!("    Timeout: {}ms", config.fetch.timeout_ms);
    log::info!(
        "    Retry: {} attempts, first wait {}ms",
        config.retry.max_attempts,
        config.retry.initial_interval_ms
    );
    log::info!("    Item delay: {}ms", config.pipeline.item_delay_ms);
    log::info!(
        "    Worklist: {} (category {}, marks {:?})",
        config.worklist.source_table,
        config.worklist.card_category,
        config.worklist.regulation_marks
    );
    log::info!("    Destination: {}", config.store.table);
    Ok(())
}
