//! Pipeline entry points for crawler operations.
//!
//! - `run_ingest`: Fetch, extract and store every card on the worklist
//! - `run_show`: Fetch and extract a single card
//! - `run_validate`: Check the configuration

pub mod ingest;
pub mod show;
pub mod validate;

pub use ingest::{IngestOptions, IngestSummary, Ingestor, run_ingest};
pub use show::run_show;
pub use validate::run_validate;
