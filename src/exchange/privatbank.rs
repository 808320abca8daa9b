//! PrivatBank archive rate provider.
//!
//! One GET per day against the public archive endpoint, with the day passed as
//! `date=DD.MM.YYYY`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::fetcher::RateProvider;
use super::types::{CurrencyQuote, FetchError, DATE_FORMAT};
use crate::config::ExchangeConfig;
use crate::error::{FxChatError, Result};

/// User agent string for rate requests.
const USER_AGENT: &str = "fxchat/0.1 (exchange rates)";

/// Archive response body. A missing `exchangeRate` list means no quotes.
#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    #[serde(default, rename = "exchangeRate")]
    exchange_rate: Vec<ArchiveRate>,
}

/// One archive line. The first line usually carries only the base currency.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchiveRate {
    currency: Option<String>,
    sale_rate: Option<f64>,
    purchase_rate: Option<f64>,
}

/// HTTP provider for the PrivatBank exchange rate archive.
pub struct PrivatBankProvider {
    client: Client,
    api_url: Url,
}

impl PrivatBankProvider {
    /// Create a provider from the exchange configuration.
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        let api_url = Url::parse(&config.api_url).map_err(|e| {
            FxChatError::Validation(format!("invalid exchange URL {}: {e}", config.api_url))
        })?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FxChatError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, api_url })
    }

    /// Request URL for a given day.
    fn url_for(&self, date: NaiveDate) -> Url {
        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .append_pair("date", &date.format(DATE_FORMAT).to_string());
        url
    }
}

#[async_trait]
impl RateProvider for PrivatBankProvider {
    async fn quotes_for(
        &self,
        date: NaiveDate,
    ) -> std::result::Result<Vec<CurrencyQuote>, FetchError> {
        let response = self
            .client
            .get(self.url_for(date))
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let bytes = response.bytes().await.map_err(request_error)?;

        parse_archive(&bytes)
    }
}

/// Map transport errors to the connection class, noting timeouts.
fn request_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Connection(format!("request timed out: {e}"))
    } else {
        FetchError::Connection(e.to_string())
    }
}

/// Parse an archive body into currency quotes.
fn parse_archive(bytes: &[u8]) -> std::result::Result<Vec<CurrencyQuote>, FetchError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let response: ArchiveResponse =
        serde_json::from_value(value).map_err(|e| FetchError::Schema(e.to_string()))?;

    Ok(response
        .exchange_rate
        .into_iter()
        .filter_map(|rate| {
            rate.currency.map(|currency| CurrencyQuote {
                currency,
                sale: rate.sale_rate,
                purchase: rate.purchase_rate,
            })
        })
        .collect())
}
