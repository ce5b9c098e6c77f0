use chrono::{DateTime, Days, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;
use thiserror::Error;

use crate::{
    models::{exchange::Exchange, interval::Interval},
    tz::start_of_day,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Empty symbol")]
    EmptySymbol,

    #[error("Start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

/// An immutable historical bar query.
///
/// Dates are venue-local calendar dates and both ends are inclusive: the
/// request covers `start 00:00` up to and including `end + 1 day 00:00`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryRequest {
    symbol: String,
    exchange: Exchange,
    interval: Interval,
    start: NaiveDate,
    end: NaiveDate,
}

impl HistoryRequest {
    pub fn new(
        symbol: impl Into<String>,
        exchange: Exchange,
        interval: Interval,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, RequestError> {
        let symbol = symbol.into().trim().to_string();
        if symbol.is_empty() {
            return Err(RequestError::EmptySymbol);
        }
        if start > end {
            return Err(RequestError::InvertedRange { start, end });
        }
        Ok(Self {
            symbol,
            exchange,
            interval,
            start,
            end,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn vt_symbol(&self) -> String {
        format!("{}.{}", self.symbol, self.exchange)
    }

    /// Inclusive lower bound of the bar timestamps this request accepts.
    pub fn start_bound(&self) -> DateTime<Tz> {
        start_of_day(self.start)
    }

    /// Inclusive upper bound: midnight after the end date.
    pub fn end_bound(&self) -> DateTime<Tz> {
        let next = self.end.checked_add_days(Days::new(1)).unwrap_or(self.end);
        start_of_day(next)
    }

    /// Calendar span in days, counting the end date.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}
