//! A collection of normalized bars for one request.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::models::{asset::AssetClass, bar::NormalizedBar, exchange::Exchange, interval::Interval};

/// The result of one history request.
///
/// Groups the oldest-first [`NormalizedBar`]s with the identifiers they were
/// fetched under, making the data set self-describing for sinks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    /// Internal symbol, e.g. `"000001"`.
    pub symbol: String,
    pub exchange: Exchange,
    pub interval: Interval,
    /// Vendor-side symbol, e.g. `"000001.SZ"`.
    pub vendor_symbol: String,
    pub asset_class: AssetClass,
    /// Bars ordered oldest first. Never empty.
    pub bars: Vec<NormalizedBar>,
}

impl BarSeries {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_datetime(&self) -> Option<DateTime<Tz>> {
        self.bars.first().map(|b| b.datetime)
    }

    pub fn last_datetime(&self) -> Option<DateTime<Tz>> {
        self.bars.last().map(|b| b.datetime)
    }

    pub fn vt_symbol(&self) -> String {
        format!("{}.{}", self.symbol, self.exchange)
    }
}
