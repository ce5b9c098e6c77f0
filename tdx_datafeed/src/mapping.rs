//! Symbol, exchange and interval lookup tables.
//!
//! Everything the rest of the crate needs to know about how an internal
//! `(symbol, exchange, interval)` triple is spelled on the vendor side lives
//! here, in two tables: [`venue`] keyed by exchange and [`frequency`] keyed by
//! interval. Lookups never fail; an unmapped input yields `None`, which callers
//! treat as "no data available".

use chrono::TimeDelta;

use crate::models::{asset::AssetClass, exchange::Exchange, interval::Interval};

/// Which quote service hosts a market.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteService {
    /// Shanghai/Shenzhen securities.
    Standard,
    /// Futures and other derivatives.
    Extended,
}

/// How a venue is addressed on the vendor side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Venue {
    /// Suffix appended to the symbol by the vendor's symbol convention.
    pub suffix: &'static str,
    /// Market code in the quote protocol.
    pub market: u16,
    pub service: QuoteService,
}

impl Venue {
    pub fn is_futures(&self) -> bool {
        self.service == QuoteService::Extended
    }
}

/// The authoritative exchange table.
pub fn venue(exchange: Exchange) -> Option<Venue> {
    use QuoteService::*;
    let (suffix, market, service) = match exchange {
        Exchange::Cffex => ("CFX", 47, Extended),
        Exchange::Shfe => ("SHF", 30, Extended),
        Exchange::Czce => ("ZCE", 28, Extended),
        Exchange::Dce => ("DCE", 29, Extended),
        Exchange::Ine => ("INE", 30, Extended),
        Exchange::Sse => ("SH", 1, Standard),
        Exchange::Szse => ("SZ", 0, Standard),
        Exchange::Bse | Exchange::Sehk | Exchange::Local => return None,
    };
    Some(Venue {
        suffix,
        market,
        service,
    })
}

/// Vendor spelling of `symbol` on `exchange`, e.g. `"000001.SZ"` or `"IF2401.CFX"`.
///
/// Futures symbols are upper-cased as a whole; equity symbols are left alone.
pub fn map_symbol(symbol: &str, exchange: Exchange) -> Option<String> {
    let venue = venue(exchange)?;
    let vendor = format!("{symbol}.{}", venue.suffix);
    if venue.is_futures() {
        Some(vendor.to_uppercase())
    } else {
        Some(vendor)
    }
}

/// Classify `symbol` on `exchange`.
///
/// Shanghai codes starting with `6` and Shenzhen codes starting with `0` or `3`
/// are equities; every other code on those two venues is treated as an index.
pub fn map_asset_class(symbol: &str, exchange: Exchange) -> Option<AssetClass> {
    let venue = venue(exchange)?;
    if venue.is_futures() {
        return Some(AssetClass::Futures);
    }
    let equity = match exchange {
        Exchange::Sse => symbol.starts_with('6'),
        Exchange::Szse => symbol.starts_with('0') || symbol.starts_with('3'),
        _ => false,
    };
    Some(if equity {
        AssetClass::Equity
    } else {
        AssetClass::Index
    })
}

/// Everything the pipeline needs to know about an interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frequency {
    /// Vendor frequency label, e.g. `"1min"`.
    pub label: &'static str,
    /// Bar category code in the quote protocol.
    pub category: u16,
    /// Bucket width in minutes for intraday frequencies, used to re-stamp the
    /// final bar of a series. `None` for daily and coarser.
    pub bucket_minutes: Option<u32>,
    /// Subtracted from every row timestamp before it becomes a bar.
    pub adjustment: TimeDelta,
}

impl Frequency {
    pub fn is_intraday(&self) -> bool {
        self.bucket_minutes.is_some()
    }
}

/// The authoritative interval table.
pub fn frequency(interval: Interval) -> Frequency {
    match interval {
        Interval::Minute | Interval::Tick => Frequency {
            label: "1min",
            category: 8,
            bucket_minutes: Some(1),
            adjustment: TimeDelta::minutes(1),
        },
        Interval::Hour => Frequency {
            label: "60min",
            category: 3,
            bucket_minutes: Some(60),
            adjustment: TimeDelta::hours(1),
        },
        Interval::Daily => Frequency {
            label: "D",
            category: 4,
            bucket_minutes: None,
            adjustment: TimeDelta::zero(),
        },
        Interval::Weekly => Frequency {
            label: "W",
            category: 5,
            bucket_minutes: None,
            adjustment: TimeDelta::zero(),
        },
    }
}
