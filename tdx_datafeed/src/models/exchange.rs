//! Trading venues and `vt_symbol` parsing.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExchangeParseError {
    #[error("Unknown exchange: {0}")]
    UnknownExchange(String),

    #[error("Invalid vt_symbol {0:?}, expected \"<symbol>.<EXCHANGE>\"")]
    InvalidVtSymbol(String),
}

/// Venues a request may name.
///
/// Only the Shanghai/Shenzhen stock exchanges and the five futures exchanges
/// are mapped to the quote service; the rest exist so that callers can express
/// requests the mapper then reports as unsupported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    /// China Financial Futures Exchange
    Cffex,
    /// Shanghai Futures Exchange
    Shfe,
    /// Zhengzhou Commodity Exchange
    Czce,
    /// Dalian Commodity Exchange
    Dce,
    /// Shanghai International Energy Exchange
    Ine,
    /// Shanghai Stock Exchange
    Sse,
    /// Shenzhen Stock Exchange
    Szse,
    /// Beijing Stock Exchange
    Bse,
    /// Stock Exchange of Hong Kong
    Sehk,
    /// Local/synthetic instruments
    Local,
}

impl Exchange {
    pub const ALL: [Exchange; 10] = [
        Exchange::Cffex,
        Exchange::Shfe,
        Exchange::Czce,
        Exchange::Dce,
        Exchange::Ine,
        Exchange::Sse,
        Exchange::Szse,
        Exchange::Bse,
        Exchange::Sehk,
        Exchange::Local,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Exchange::Cffex => "CFFEX",
            Exchange::Shfe => "SHFE",
            Exchange::Czce => "CZCE",
            Exchange::Dce => "DCE",
            Exchange::Ine => "INE",
            Exchange::Sse => "SSE",
            Exchange::Szse => "SZSE",
            Exchange::Bse => "BSE",
            Exchange::Sehk => "SEHK",
            Exchange::Local => "LOCAL",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = ExchangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Exchange::ALL
            .into_iter()
            .find(|e| e.as_str() == upper)
            .ok_or_else(|| ExchangeParseError::UnknownExchange(s.to_string()))
    }
}

/// Split a `vt_symbol` into symbol and exchange.
///
/// Accepts the canonical `"000001.SZSE"` form and the vendor-suffixed
/// `"000001.SZ"` / `"600000.SH"` forms listing services hand out. The split is
/// on the last dot, so futures symbols containing dots are not supported.
pub fn parse_vt_symbol(vt_symbol: &str) -> Result<(String, Exchange), ExchangeParseError> {
    let (symbol, suffix) = vt_symbol
        .trim()
        .rsplit_once('.')
        .filter(|(sym, sfx)| !sym.is_empty() && !sfx.is_empty())
        .ok_or_else(|| ExchangeParseError::InvalidVtSymbol(vt_symbol.to_string()))?;

    let exchange = match suffix.to_ascii_uppercase().as_str() {
        "SZ" => Exchange::Szse,
        "SH" => Exchange::Sse,
        _ => suffix.parse()?,
    };
    Ok((symbol.to_string(), exchange))
}
