//! [`DataProvider`] backed by the TDX quote service.

pub mod client;
pub mod protocol;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    config::DatafeedConfig,
    history,
    mapping::{self, QuoteService},
    models::{bar_series::BarSeries, request::HistoryRequest},
    providers::{
        BarQuery, DataProvider, ProviderError, QuoteSession, SessionConnector, ValidationSnafu,
    },
};

use self::client::TcpConnector;

/// Name recorded on every bar this provider produces.
pub const SOURCE: &str = "TDX";

/// Requests longer than this many trading days are likely to run out of
/// pages before reaching their start date.
const LONG_RANGE_TRADING_DAYS: i64 = 1000;

pub struct TdxProvider<C = TcpConnector> {
    connector: C,
}

impl TdxProvider<TcpConnector> {
    /// Provider talking TCP to the configured quote server.
    pub fn from_config(config: &DatafeedConfig) -> Self {
        info!(
            address = %config.address(),
            authenticated = config.username.is_some(),
            "TDX datafeed configured"
        );
        Self::with_connector(TcpConnector::new(
            config.address(),
            config.connect_timeout,
            config.requests_per_second,
        ))
    }
}

impl<C: SessionConnector> TdxProvider<C> {
    pub fn with_connector(connector: C) -> Self {
        Self { connector }
    }
}

/// Rough trading-day count: five sessions per seven calendar days.
pub fn approx_trading_days(request: &HistoryRequest) -> i64 {
    request.span_days() * 5 / 7
}

/// Instrument code as sent on the wire.
fn wire_code(symbol: &str) -> Result<String, ProviderError> {
    let code: String = symbol.chars().take(6).collect();
    if !code.is_ascii() {
        return ValidationSnafu {
            message: format!("symbol {symbol:?} is not an ASCII instrument code"),
        }
        .fail();
    }
    Ok(code)
}

#[async_trait]
impl<C: SessionConnector> DataProvider for TdxProvider<C> {
    async fn query_bar_history(
        &self,
        request: &HistoryRequest,
    ) -> Result<Option<BarSeries>, ProviderError> {
        let vt_symbol = request.vt_symbol();
        let symbol = request.symbol();
        let exchange = request.exchange();

        let (Some(vendor_symbol), Some(asset_class), Some(venue)) = (
            mapping::map_symbol(symbol, exchange),
            mapping::map_asset_class(symbol, exchange),
            mapping::venue(exchange),
        ) else {
            warn!(%vt_symbol, "exchange not supported by the TDX datafeed");
            return Ok(None);
        };
        if venue.service != QuoteService::Standard {
            warn!(%vt_symbol, %vendor_symbol, "futures need the extended quote service, skipping");
            return Ok(None);
        }

        let frequency = mapping::frequency(request.interval());
        let trading_days = approx_trading_days(request);
        if trading_days > LONG_RANGE_TRADING_DAYS {
            warn!(
                %vt_symbol,
                trading_days,
                "requested range exceeds ~{LONG_RANGE_TRADING_DAYS} trading days, result may be truncated"
            );
        }

        let query = BarQuery {
            market: venue.market,
            code: wire_code(symbol)?,
            category: frequency.category,
        };

        let mut session = match self.connector.connect().await {
            Ok(session) => session,
            Err(e) if e.is_transport() => {
                warn!(%vt_symbol, error = %e, "TDX quote server unreachable, no data");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let fetched = history::fetch_history(&mut session, &query, request, &frequency).await;
        session.disconnect().await;

        let bars = match fetched {
            Ok(bars) => bars,
            Err(e) if e.is_transport() => {
                warn!(%vt_symbol, error = %e, "quote session dropped mid-request, no data");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if bars.is_empty() {
            info!(%vt_symbol, interval = %request.interval(), "no bars in requested window");
            return Ok(None);
        }
        info!(
            %vt_symbol,
            interval = %request.interval(),
            bars = bars.len(),
            "bar history loaded"
        );
        Ok(Some(BarSeries {
            symbol: symbol.to_string(),
            exchange,
            interval: request.interval(),
            vendor_symbol,
            asset_class,
            bars,
        }))
    }
}
