//! Exchange rate module for fxchat.
//!
//! This module provides EUR/USD rate lookups over a lookback window:
//! - Rate data types and their chat serialization
//! - The `RateProvider` seam and the window fetcher
//! - The PrivatBank archive HTTP provider

pub mod fetcher;
pub mod privatbank;
pub mod types;

pub use fetcher::{RateFetcher, RateProvider};
pub use privatbank::PrivatBankProvider;
pub use types::{
    CurrencyQuote, DayRates, FetchError, Rate, RateSeries, DATE_FORMAT, EUR, MAX_LOOKBACK_DAYS,
    USD,
};
