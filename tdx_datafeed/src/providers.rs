//! Provider abstraction for historical bar sources.
//!
//! Three traits describe the seams of a fetch:
//!
//! - [`DataProvider`] answers a [`HistoryRequest`] with an optional
//!   [`BarSeries`]. `Ok(None)` is the normal "no data" outcome (unsupported
//!   symbol, offset not found, vendor unreachable).
//! - [`SessionConnector`] opens a vendor session. One session serves exactly one
//!   request and is always released through [`QuoteSession::disconnect`].
//! - [`QuoteSession`] issues the one command the history engine needs: "give
//!   me `count` bars, `offset` bars back from now".
//!
//! The TDX implementation lives in [`tdx`]; tests swap in scripted sessions.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use tdx_datafeed::models::{bar_series::BarSeries, request::HistoryRequest};
//! use tdx_datafeed::providers::{DataProvider, ProviderError};
//!
//! struct Offline;
//!
//! #[async_trait]
//! impl DataProvider for Offline {
//!     async fn query_bar_history(
//!         &self,
//!         _request: &HistoryRequest,
//!     ) -> Result<Option<BarSeries>, ProviderError> {
//!         Ok(None)
//!     }
//! }
//! ```

pub mod tdx;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::{
    models::{bar::RawBarRow, bar_series::BarSeries, request::HistoryRequest},
    providers::tdx::protocol::ProtocolError,
};

/// Fetches a date-bounded bar series for one instrument and interval.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Returns the bars covering `request`, oldest first.
    ///
    /// * `Ok(Some(series))` - at least one bar inside the requested window.
    /// * `Ok(None)` - nothing to load; the reason is logged.
    /// * `Err(_)` - the vendor answered with something the decoder rejected,
    ///   or the request could not be expressed on the vendor side.
    async fn query_bar_history(
        &self,
        request: &HistoryRequest,
    ) -> Result<Option<BarSeries>, ProviderError>;
}

/// What to ask the quote service for, independent of paging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarQuery {
    /// Market code from the exchange table.
    pub market: u16,
    /// Six character instrument code.
    pub code: String,
    /// Bar category from the interval table.
    pub category: u16,
}

/// A live, exclusively owned vendor session.
///
/// Calls are strictly sequential; implementations never pipeline requests.
#[async_trait]
pub trait QuoteSession: Send {
    /// Up to `count` rows ending `offset` bars back from the newest bar,
    /// ordered oldest first. An empty vector means nothing is left.
    async fn get_security_bars(
        &mut self,
        query: &BarQuery,
        offset: u32,
        count: u32,
    ) -> Result<Vec<RawBarRow>, ProviderError>;

    /// Release the session. Never fails; problems are logged.
    async fn disconnect(&mut self);
}

/// Opens [`QuoteSession`]s.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    type Session: QuoteSession;

    async fn connect(&self) -> Result<Self::Session, ProviderError>;
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// The TCP connection could not be established.
    #[snafu(display("Failed to connect to {address}: {source}"))]
    Connect {
        address: String,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The TCP connection did not complete in time.
    #[snafu(display("Connecting to {address} timed out after {timeout_ms} ms"))]
    ConnectTimeout {
        address: String,
        timeout_ms: u64,
        backtrace: Backtrace,
    },

    /// Reading from or writing to an established session failed.
    #[snafu(display("Transport failure: {source}"))]
    Transport {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The vendor sent bytes the decoder does not understand.
    #[snafu(display("Protocol error: {source}"))]
    Protocol {
        source: ProtocolError,
        backtrace: Backtrace,
    },

    /// The request cannot be expressed for this provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },
}

impl ProviderError {
    /// Connection-level failures. A request that hits one of these yields no
    /// data instead of an error.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ProviderError::Connect { .. }
                | ProviderError::ConnectTimeout { .. }
                | ProviderError::Transport { .. }
        )
    }
}
