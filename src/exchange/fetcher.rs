//! Lookback-window rate fetching.
//!
//! `RateFetcher` turns a lookback window into one provider request per day and
//! assembles the results into a [`RateSeries`], newest day first.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use futures::future::try_join_all;
use tracing::debug;

use super::types::{CurrencyQuote, DayRates, FetchError, RateSeries, MAX_LOOKBACK_DAYS};

/// Source of per-day currency quotes.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetch every currency quote the provider has for `date`.
    async fn quotes_for(&self, date: NaiveDate) -> Result<Vec<CurrencyQuote>, FetchError>;
}

/// Fetches EUR/USD rates for a window of days.
#[derive(Clone)]
pub struct RateFetcher {
    provider: Arc<dyn RateProvider>,
}

impl RateFetcher {
    /// Create a fetcher backed by the given provider.
    pub fn new(provider: Arc<dyn RateProvider>) -> Self {
        Self { provider }
    }

    /// Fetch rates for today and the `lookback_days` days before it.
    pub async fn fetch(&self, lookback_days: u32) -> Result<RateSeries, FetchError> {
        self.fetch_from(Local::now().date_naive(), lookback_days).await
    }

    /// Fetch rates for `today` and the `lookback_days` days before it.
    ///
    /// Requests run concurrently; the series keeps request order. Days where
    /// the provider lacks EUR or USD are left out. Any request failure fails
    /// the whole lookup.
    pub async fn fetch_from(
        &self,
        today: NaiveDate,
        lookback_days: u32,
    ) -> Result<RateSeries, FetchError> {
        let lookback_days = lookback_days.min(MAX_LOOKBACK_DAYS);

        let dates: Vec<NaiveDate> = (0..=lookback_days)
            .filter_map(|day| today.checked_sub_days(Days::new(u64::from(day))))
            .collect();

        let responses = try_join_all(dates.iter().map(|date| async move {
            let quotes = self.provider.quotes_for(*date).await?;
            DayRates::from_quotes(*date, &quotes)
        }))
        .await?;

        let days: Vec<DayRates> = responses.into_iter().flatten().collect();
        debug!(
            requested = dates.len(),
            complete = days.len(),
            "Fetched exchange rates"
        );

        Ok(RateSeries::new(days))
    }
}
