use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use snafu::ResultExt;
use tracing::debug;
use uuid::Uuid;

use crate::{
    io::sink::{BarSink, ConversionSnafu, IoSnafu, SinkError},
    models::bar_series::BarSeries,
};

/// Writes each series to its own JSON Lines file, one bar per line.
///
/// Files are named `{symbol}_{exchange}_{interval}_{timestamp}_{uuid}.jsonl`
/// so repeated runs never overwrite each other.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    dir: PathBuf,
}

impl JsonLinesSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// A sink under the system temp directory, e.g. `/tmp/tdx_datafeed`.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir().join("tdx_datafeed"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(series: &BarSeries) -> String {
        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        format!(
            "{}_{}_{}_{}_{}.jsonl",
            series.symbol,
            series.exchange,
            series.interval,
            timestamp,
            Uuid::new_v4()
        )
    }
}

#[async_trait]
impl BarSink for JsonLinesSink {
    type Output = PathBuf;

    async fn save_bars(&self, series: &BarSeries) -> Result<PathBuf, SinkError> {
        let mut body = String::new();
        for bar in &series.bars {
            body.push_str(&serde_json::to_string(bar).context(ConversionSnafu)?);
            body.push('\n');
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .context(IoSnafu { path: &self.dir })?;
        let path = self.dir.join(Self::file_name(series));
        tokio::fs::write(&path, body)
            .await
            .context(IoSnafu { path: &path })?;

        debug!(path = %path.display(), bars = series.len(), "wrote bar batch");
        Ok(path)
    }
}
