// src/utils/http.rs

//! HTTP client utilities.

use reqwest::Client;

use crate::error::Result;
use crate::models::{CardId, FetchConfig};

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &FetchConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Build the detail page URL for a card by appending its id to the base URL.
pub fn card_url(base_url: &str, id: CardId) -> String {
    format!("{base_url}{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_url_appends_id() {
        assert_eq!(
            card_url("https://example.com/details.php/card/", CardId(42)),
            "https://example.com/details.php/card/42"
        );
    }

    #[test]
    fn test_create_client_with_defaults() {
        assert!(create_async_client(&FetchConfig::default()).is_ok());
    }
}
