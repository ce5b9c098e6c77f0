#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use tdx_datafeed::{
    models::bar::RawBarRow,
    providers::{
        BarQuery, ConnectSnafu, ProtocolSnafu, ProviderError, QuoteSession, SessionConnector,
        TransportSnafu, tdx::protocol::ProtocolError,
    },
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn row(datetime: &str, open: Option<f64>, volume: f64) -> RawBarRow {
    RawBarRow {
        datetime: datetime.to_string(),
        open,
        high: open.map(|o| o + 0.31),
        low: open.map(|o| o - 0.27),
        close: open.map(|o| o + 0.123_456_789),
        volume,
        turnover: Some(volume * 10.0),
        open_interest: None,
    }
}

/// Daily rows for every weekday in `[first, last]`.
pub fn weekday_history(first: NaiveDate, last: NaiveDate) -> Vec<RawBarRow> {
    first
        .iter_days()
        .take_while(|d| *d <= last)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .enumerate()
        .map(|(i, d)| {
            row(
                &format!("{} 15:00", d.format("%Y-%m-%d")),
                Some(10.0 + i as f64 * 0.01),
                1_000.0 + i as f64,
            )
        })
        .collect()
}

/// One daily row per calendar day, `days` long.
pub fn calendar_history(first: NaiveDate, days: u64) -> Vec<RawBarRow> {
    (0..days)
        .map(|i| {
            let d = first.checked_add_days(Days::new(i)).unwrap();
            row(&format!("{} 15:00", d.format("%Y-%m-%d")), Some(8.0), 500.0)
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct VendorStats {
    pub connects: usize,
    pub disconnects: usize,
    pub calls: Vec<(u32, u32)>,
}

#[derive(Clone, Copy, Debug)]
pub enum Failure {
    /// `connect` is refused.
    Refuse,
    /// The n-th page request (0-based) drops the connection.
    DropAt(usize),
    /// The n-th page request (0-based) returns undecodable bytes.
    GarbleAt(usize),
}

/// An in-memory vendor serving a fixed oldest-first history.
#[derive(Clone)]
pub struct ScriptedVendor {
    history: Arc<Vec<RawBarRow>>,
    failure: Option<Failure>,
    /// From the n-th page request (0-based) on, these newer rows exist too.
    growth: Option<(usize, Arc<Vec<RawBarRow>>)>,
    pub stats: Arc<Mutex<VendorStats>>,
}

impl ScriptedVendor {
    pub fn new(history: Vec<RawBarRow>) -> Self {
        Self {
            history: Arc::new(history),
            failure: None,
            growth: None,
            stats: Arc::default(),
        }
    }

    pub fn failing(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// New bars print once `at_call` page requests have been served.
    pub fn growing(mut self, at_call: usize, newer: Vec<RawBarRow>) -> Self {
        self.growth = Some((at_call, Arc::new(newer)));
        self
    }

    pub fn connects(&self) -> usize {
        self.stats.lock().unwrap().connects
    }

    pub fn disconnects(&self) -> usize {
        self.stats.lock().unwrap().disconnects
    }

    pub fn calls(&self) -> Vec<(u32, u32)> {
        self.stats.lock().unwrap().calls.clone()
    }
}

pub struct ScriptedSession {
    vendor: ScriptedVendor,
}

#[async_trait]
impl SessionConnector for ScriptedVendor {
    type Session = ScriptedSession;

    async fn connect(&self) -> Result<ScriptedSession, ProviderError> {
        if let Some(Failure::Refuse) = self.failure {
            let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
            return Err(snafu::IntoError::into_error(
                ConnectSnafu {
                    address: "scripted:7709",
                },
                refused,
            ));
        }
        self.stats.lock().unwrap().connects += 1;
        Ok(ScriptedSession {
            vendor: self.clone(),
        })
    }
}

#[async_trait]
impl QuoteSession for ScriptedSession {
    async fn get_security_bars(
        &mut self,
        _query: &BarQuery,
        offset: u32,
        count: u32,
    ) -> Result<Vec<RawBarRow>, ProviderError> {
        let n = {
            let mut stats = self.vendor.stats.lock().unwrap();
            stats.calls.push((offset, count));
            stats.calls.len() - 1
        };
        match self.vendor.failure {
            Some(Failure::DropAt(at)) if at == n => {
                let reset = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
                return Err(snafu::IntoError::into_error(TransportSnafu, reset));
            }
            Some(Failure::GarbleAt(at)) if at == n => {
                return Err(snafu::IntoError::into_error(
                    ProtocolSnafu,
                    ProtocolError::Truncated {
                        needed: 16,
                        available: 3,
                    },
                ));
            }
            _ => {}
        }

        let history: Vec<RawBarRow> = match &self.vendor.growth {
            Some((at, newer)) if n >= *at => {
                self.vendor.history.iter().chain(newer.iter()).cloned().collect()
            }
            _ => self.vendor.history.to_vec(),
        };
        let end = history.len().saturating_sub(offset as usize);
        let begin = end.saturating_sub(count as usize);
        Ok(history[begin..end].to_vec())
    }

    async fn disconnect(&mut self) {
        self.vendor.stats.lock().unwrap().disconnects += 1;
    }
}
