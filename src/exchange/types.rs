//! Data types for exchange rate lookups.

use chrono::NaiveDate;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Date format used by the rate archive and in serialized series.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Largest lookback window accepted by the fetcher.
pub const MAX_LOOKBACK_DAYS: u32 = 10;

/// Euro currency code.
pub const EUR: &str = "EUR";

/// US dollar currency code.
pub const USD: &str = "USD";

/// Failure of an exchange rate lookup.
///
/// Any of these aborts the whole lookup; no partial series is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection could not be made or timed out.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Provider answered with a non-success status.
    #[error("rate service returned HTTP {0}")]
    Status(u16),

    /// Response body is not JSON.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Response is JSON but not shaped as expected.
    #[error("unexpected response schema: {0}")]
    Schema(String),
}

/// One currency line as reported by the provider for a single day.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyQuote {
    /// ISO currency code.
    pub currency: String,
    /// Sale rate, if the provider reported one.
    pub sale: Option<f64>,
    /// Purchase rate, if the provider reported one.
    pub purchase: Option<f64>,
}

impl CurrencyQuote {
    /// Create a quote with both rates present.
    pub fn new(currency: impl Into<String>, sale: f64, purchase: f64) -> Self {
        Self {
            currency: currency.into(),
            sale: Some(sale),
            purchase: Some(purchase),
        }
    }
}

/// Sale and purchase rate of one currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rate {
    pub sale: f64,
    pub purchase: f64,
}

impl Rate {
    /// Build a rate from a provider quote.
    ///
    /// A tracked currency without both rates is a schema violation.
    pub fn from_quote(quote: &CurrencyQuote) -> Result<Self, FetchError> {
        match (quote.sale, quote.purchase) {
            (Some(sale), Some(purchase)) => Ok(Self { sale, purchase }),
            _ => Err(FetchError::Schema(format!(
                "{} entry lacks sale or purchase rate",
                quote.currency
            ))),
        }
    }
}

/// EUR and USD rates for one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayRates {
    pub date: NaiveDate,
    pub eur: Rate,
    pub usd: Rate,
}

impl DayRates {
    /// Pick EUR and USD out of a day's quotes.
    ///
    /// Returns `Ok(None)` when either currency is absent for that day.
    pub fn from_quotes(
        date: NaiveDate,
        quotes: &[CurrencyQuote],
    ) -> Result<Option<Self>, FetchError> {
        let find = |code: &str| quotes.iter().find(|q| q.currency == code);

        match (find(EUR), find(USD)) {
            (Some(eur), Some(usd)) => Ok(Some(Self {
                date,
                eur: Rate::from_quote(eur)?,
                usd: Rate::from_quote(usd)?,
            })),
            _ => Ok(None),
        }
    }
}

struct CurrencyPair<'a>(&'a DayRates);

impl Serialize for CurrencyPair<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CurrencyPair", 2)?;
        state.serialize_field(EUR, &self.0.eur)?;
        state.serialize_field(USD, &self.0.usd)?;
        state.end()
    }
}

/// Serialized as `{"DD.MM.YYYY": {"EUR": {...}, "USD": {...}}}`.
impl Serialize for DayRates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.date.format(DATE_FORMAT).to_string(), &CurrencyPair(self))?;
        map.end()
    }
}

/// Rates for a lookback window, newest day first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RateSeries {
    days: Vec<DayRates>,
}

impl RateSeries {
    /// Create a series from days already in descending date order.
    pub fn new(days: Vec<DayRates>) -> Self {
        Self { days }
    }

    pub fn days(&self) -> &[DayRates] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Pretty-printed JSON used in chat broadcasts.
    pub fn to_json(&self) -> String {
        // Serializing plain floats and strings into a String cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "[]".to_string())
    }
}
