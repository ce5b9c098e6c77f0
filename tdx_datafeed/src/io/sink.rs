use std::path::PathBuf;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::models::bar_series::BarSeries;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// A bar could not be converted into the destination format.
    #[snafu(display("Data conversion error: {source}"))]
    Conversion {
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// A filesystem operation failed.
    #[snafu(display("I/O error on {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

/// Destination for normalized bars.
#[async_trait]
pub trait BarSink: Send + Sync {
    /// The type of output returned after a successful write operation.
    ///
    /// A file sink returns the path it created, an in-memory sink the number
    /// of bars it now holds.
    type Output: Send;

    /// Store one series. The series is never empty and its bars are ordered
    /// oldest first.
    async fn save_bars(&self, series: &BarSeries) -> Result<Self::Output, SinkError>;
}
