use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    io::sink::{BarSink, SinkError},
    models::bar_series::BarSeries,
};

/// Keeps every saved series in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Mutex<Vec<BarSeries>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn batches(&self) -> Vec<BarSeries> {
        self.batches.lock().await.clone()
    }

    pub async fn total_bars(&self) -> usize {
        self.batches.lock().await.iter().map(BarSeries::len).sum()
    }
}

#[async_trait]
impl BarSink for MemorySink {
    type Output = usize;

    async fn save_bars(&self, series: &BarSeries) -> Result<usize, SinkError> {
        let mut batches = self.batches.lock().await;
        batches.push(series.clone());
        Ok(batches.iter().map(BarSeries::len).sum())
    }
}
