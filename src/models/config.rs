//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Backoff policy for failed fetches
    #[serde(default)]
    pub retry: RetryConfig,

    /// Batch pacing
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Worklist query parameters
    #[serde(default)]
    pub worklist: WorklistConfig,

    /// Destination table
    #[serde(default)]
    pub store: StoreConfig,

    /// Page structure and label vocabulary
    #[serde(default)]
    pub extract: ExtractConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        url::Url::parse(&self.fetch.base_url)
            .map_err(|e| AppError::validation(format!("fetch.base_url is invalid: {e}")))?;
        if self.fetch.timeout_ms == 0 {
            return Err(AppError::validation("fetch.timeout_ms must be > 0"));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::validation("retry.max_attempts must be > 0"));
        }
        if self.retry.initial_interval_ms == 0 {
            return Err(AppError::validation(
                "retry.initial_interval_ms must be > 0",
            ));
        }
        check_identifier("worklist.source_table", &self.worklist.source_table)?;
        check_identifier("store.table", &self.store.table)?;
        if self.worklist.regulation_marks.is_empty() {
            return Err(AppError::validation("worklist.regulation_marks is empty"));
        }
        self.extract.validate()
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
fn check_identifier(field: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "{field} '{name}' is not a valid SQL identifier"
        )))
    }
}

/// HTTP client settings for detail page requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Detail page URL prefix; the card id is appended verbatim
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "defaults::timeout")]
    pub timeout_ms: u64,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_ms: defaults::timeout(),
        }
    }
}

/// Bounded exponential backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total fetch attempts per card before the run is aborted
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Wait after the first failed attempt; doubles after each further failure
    #[serde(default = "defaults::initial_interval")]
    pub initial_interval_ms: u64,
}

impl RetryConfig {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            initial_interval_ms: defaults::initial_interval(),
        }
    }
}

/// Batch pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Delay after each card, in milliseconds
    #[serde(default = "defaults::item_delay")]
    pub item_delay_ms: u64,
}

impl PipelineConfig {
    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            item_delay_ms: defaults::item_delay(),
        }
    }
}

/// Which catalog rows make up the worklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorklistConfig {
    /// Table holding the catalog card ids
    #[serde(default = "defaults::source_table")]
    pub source_table: String,

    /// `card_category` value to select
    #[serde(default = "defaults::card_category")]
    pub card_category: i32,

    /// Accepted `regulation_mark` values
    #[serde(default = "defaults::regulation_marks")]
    pub regulation_marks: Vec<String>,
}

impl Default for WorklistConfig {
    fn default() -> Self {
        Self {
            source_table: defaults::source_table(),
            card_category: defaults::card_category(),
            regulation_marks: defaults::regulation_marks(),
        }
    }
}

/// Destination table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Table receiving `(id, card_name, ability, attack)` rows
    #[serde(default = "defaults::store_table")]
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table: defaults::store_table(),
        }
    }
}

/// Page structure and label settings for field extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default)]
    pub selectors: PageSelectors,

    #[serde(default)]
    pub labels: LabelVocabulary,
}

impl ExtractConfig {
    fn validate(&self) -> Result<()> {
        for (field, selector) in self.selectors.iter() {
            Selector::parse(selector).map_err(|e| {
                AppError::validation(format!(
                    "extract.selectors.{field} is invalid: {}",
                    AppError::selector(selector, format!("{e:?}"))
                ))
            })?;
        }
        for (field, token) in self.labels.iter() {
            if token.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "extract.labels.{field} is empty"
                )));
            }
        }
        Ok(())
    }
}

/// CSS selectors locating each structural part of a detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSelectors {
    /// The single region holding all card data
    #[serde(default = "defaults::section")]
    pub section: String,

    /// Card name heading inside the section
    #[serde(default = "defaults::heading")]
    pub heading: String,

    /// Right-hand box holding abilities and moves
    #[serde(default = "defaults::info_box")]
    pub info_box: String,

    /// Badges inside the info box that are ignored
    #[serde(default = "defaults::decoration")]
    pub decoration: String,

    /// Section labels inside the info box
    #[serde(default = "defaults::label")]
    pub label: String,

    /// Entry names inside the info box
    #[serde(default = "defaults::entry")]
    pub entry: String,
}

impl PageSelectors {
    fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("section", self.section.as_str()),
            ("heading", self.heading.as_str()),
            ("info_box", self.info_box.as_str()),
            ("decoration", self.decoration.as_str()),
            ("label", self.label.as_str()),
            ("entry", self.entry.as_str()),
        ]
        .into_iter()
    }
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            section: defaults::section(),
            heading: defaults::heading(),
            info_box: defaults::info_box(),
            decoration: defaults::decoration(),
            label: defaults::label(),
            entry: defaults::entry(),
        }
    }
}

/// Label tokens as they appear on the catalog site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelVocabulary {
    /// "Ability"
    #[serde(default = "defaults::ability_label")]
    pub ability: String,

    /// "Move"
    #[serde(default = "defaults::move_label", rename = "move")]
    pub move_: String,

    /// "VSTAR Power"
    #[serde(default = "defaults::vstar_power_label")]
    pub vstar_power: String,
}

impl LabelVocabulary {
    fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("ability", self.ability.as_str()),
            ("move", self.move_.as_str()),
            ("vstar_power", self.vstar_power.as_str()),
        ]
        .into_iter()
    }
}

impl Default for LabelVocabulary {
    fn default() -> Self {
        Self {
            ability: defaults::ability_label(),
            move_: defaults::move_label(),
            vstar_power: defaults::vstar_power_label(),
        }
    }
}

/// Connection settings for the Postgres database.
///
/// Read from the environment rather than the config file so that
/// credentials stay out of version control.
#[derive(Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// libpq-style sslmode, `disable` unless overridden
    pub ssl_mode: String,
}

impl DatabaseSettings {
    /// Read settings from the process environment, loading `.env` first.
    pub fn from_env() -> Result<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::config(format!("missing env var {key}")))
        };

        let port = required("DB_PORT")?;
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|e| AppError::config(format!("DB_PORT '{port}' is not a port: {e}")))?;

        Ok(Self {
            host: required("DB_HOSTNAME")?,
            port,
            user: required("DB_USER_NAME")?,
            password: required("DB_USER_PASSWORD")?,
            database: required("DB_NAME")?,
            ssl_mode: lookup("DB_SSLMODE").unwrap_or_else(|| "disable".to_string()),
        })
    }
}

// Keep the password out of logs.
impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

mod defaults {
    // Fetch defaults
    pub fn base_url() -> String {
        "https://www.pokemon-card.com/card-search/details.php/card/".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; card-crawler/0.1)".into()
    }
    pub fn timeout() -> u64 {
        3_000
    }

    // Retry defaults
    pub fn max_attempts() -> u32 {
        10
    }
    pub fn initial_interval() -> u64 {
        2_000
    }

    // Pipeline defaults
    pub fn item_delay() -> u64 {
        300
    }

    // Worklist defaults
    pub fn source_table() -> String {
        "cards".into()
    }
    pub fn card_category() -> i32 {
        1
    }
    pub fn regulation_marks() -> Vec<String> {
        vec!["H".into(), "I".into(), "J".into()]
    }

    // Store defaults
    pub fn store_table() -> String {
        "pokemon_cards".into()
    }

    // Page structure defaults
    pub fn section() -> String {
        "section.Section".into()
    }
    pub fn heading() -> String {
        "h1.Heading1.mt20".into()
    }
    pub fn info_box() -> String {
        "div.RightBox".into()
    }
    pub fn decoration() -> String {
        "span.f_right.Text-fjalla".into()
    }
    pub fn label() -> String {
        "h2.mt20".into()
    }
    pub fn entry() -> String {
        "h4:not([class]), h4[class=\"\"]".into()
    }

    // Label defaults
    pub fn ability_label() -> String {
        "特性".into()
    }
    pub fn move_label() -> String {
        "ワザ".into()
    }
    pub fn vstar_power_label() -> String {
        "VSTARパワー".into()
    }
}
