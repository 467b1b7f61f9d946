//! Card Crawler CLI
//!
//! Batch entry point. Exits non-zero when a card page cannot be fetched
//! after all retries.

use std::path::PathBuf;

use card_crawler::{
    error::Result,
    models::{CardId, Config},
    pipeline::{self, IngestOptions},
};
use clap::{Parser, Subcommand};

/// card-crawler - Card detail ingest
#[derive(Parser, Debug)]
#[command(name = "card-crawler", version, about = "Card detail page ingest")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "storage/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch every card on the worklist and upsert it
    Ingest {
        /// Process these card ids instead of querying the worklist
        #[arg(long = "id")]
        ids: Vec<i64>,

        /// Fetch and extract only; write nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Fetch and print a single card
    Show {
        id: i64,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Ingest { ids, dry_run } => {
            config.validate()?;
            let options = IngestOptions {
                ids: (!ids.is_empty()).then(|| ids.into_iter().map(CardId).collect()),
                dry_run,
            };
            pipeline::run_ingest(&config, options).await?;
        }

        Command::Show { id, json } => {
            config.validate()?;
            match pipeline::run_show(&config, CardId(id)).await? {
                Some(record) if json => println!("{}", serde_json::to_string_pretty(&record)?),
                Some(record) => {
                    let labels = &config.extract.labels;
                    println!("{}", record.name);
                    println!("{}: {}", labels.ability, record.ability);
                    println!("{}: {}", labels.move_, record.attack);
                }
                None => log::warn!("Card {id}: page did not match the expected layout"),
            }
        }

        Command::Validate => pipeline::run_validate(&config)?,
    }

    log::info!("Done!");

    Ok(())
}
