//! Wire rows and the canonical in-memory bar.
//!
//! [`RawBarRow`] is what one page of the quote service yields, verbatim.
//! [`NormalizedBar`] is the standard output of every
//! [`DataProvider`](crate::providers::DataProvider) and the unit the storage
//! layer accepts.

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::models::{exchange::Exchange, interval::Interval};

/// Formats the vendor uses for row timestamps.
const ROW_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

/// One bar row as returned by the vendor.
///
/// The timestamp is the vendor's wall-clock label for the bar, in venue time.
/// A `None` open means the instrument did not trade in that bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBarRow {
    pub datetime: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    #[serde(rename = "vol")]
    pub volume: f64,
    #[serde(rename = "amount", default)]
    pub turnover: Option<f64>,
    #[serde(rename = "oi", default)]
    pub open_interest: Option<f64>,
}

impl RawBarRow {
    /// Parses [`RawBarRow::datetime`]; `None` when the vendor sent garbage.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let text = self.datetime.trim();
        ROW_TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    }
}

/// A single normalized OHLCV bar.
///
/// `datetime` is venue-local and, once a series is finalized, labels the bar
/// consistently across pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedBar {
    pub symbol: String,
    pub exchange: Exchange,
    pub interval: Interval,
    pub datetime: DateTime<Tz>,

    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,

    pub volume: f64,
    /// Traded value. Zero when the vendor does not supply it.
    pub turnover: f64,
    /// Zero for instruments without open interest.
    pub open_interest: f64,

    /// Which feed produced the bar.
    pub source: &'static str,
}
