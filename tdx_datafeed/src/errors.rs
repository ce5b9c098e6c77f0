use thiserror::Error;

use crate::{
    config::ConfigError,
    io::sink::SinkError,
    models::{exchange::ExchangeParseError, interval::IntervalParseError, request::RequestError},
    providers::ProviderError,
};

/// The unified error type for the `tdx_datafeed` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An error originating from a data provider (e.g., protocol error, validation).
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// An error originating from a data sink (e.g., file I/O).
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// An error related to configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A request could not be built.
    #[error("Invalid request: {0}")]
    Request(#[from] RequestError),

    #[error("Invalid symbol: {0}")]
    Symbol(#[from] ExchangeParseError),

    #[error("Invalid interval: {0}")]
    Interval(#[from] IntervalParseError),

    #[error("Invalid date: {0}")]
    Date(#[from] chrono::ParseError),

    /// A generic I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}
