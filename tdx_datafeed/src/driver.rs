//! Batch download of many symbols and intervals.
//!
//! [`BatchDriver::run`] walks a [`BatchJob`] strictly sequentially: one
//! request at a time, each written to the sink before the next starts. A
//! [`CancelFlag`] is checked between requests only, so a request in flight
//! always completes. Progress is reported through `tracing` and, when a
//! channel is attached, as [`DriverEvent`]s.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use chrono::{DateTime, Months, NaiveDate};
use chrono_tz::Tz;
use indexmap::IndexSet;
use snafu::Report;
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};
use tracing::{error, info, warn};

use crate::{
    io::sink::BarSink,
    models::{
        exchange::parse_vt_symbol,
        interval::Interval,
        request::HistoryRequest,
    },
    providers::DataProvider,
};

/// Intervals fetched when a job does not name any.
pub const DEFAULT_INTERVALS: [Interval; 3] = [Interval::Minute, Interval::Hour, Interval::Daily];

/// Years of history fetched by [`BatchJob::last_years`] callers by default.
pub const DEFAULT_YEARS: u32 = 10;

/// A universe of symbols crossed with a list of intervals over one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    vt_symbols: Vec<String>,
    intervals: Vec<Interval>,
    start: NaiveDate,
    end: NaiveDate,
}

impl BatchJob {
    /// Duplicate symbols and intervals are dropped, first occurrence wins.
    pub fn new<I, S>(vt_symbols: I, intervals: &[Interval], start: NaiveDate, end: NaiveDate) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let vt_symbols: IndexSet<String> = vt_symbols
            .into_iter()
            .map(|s| s.into().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let intervals: IndexSet<Interval> = if intervals.is_empty() {
            DEFAULT_INTERVALS.into_iter().collect()
        } else {
            intervals.iter().copied().collect()
        };
        Self {
            vt_symbols: vt_symbols.into_iter().collect(),
            intervals: intervals.into_iter().collect(),
            start,
            end,
        }
    }

    /// Window ending `today` and starting `years` calendar years earlier.
    pub fn last_years<I, S>(vt_symbols: I, intervals: &[Interval], years: u32, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let start = today
            .checked_sub_months(Months::new(years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN);
        Self::new(vt_symbols, intervals, start, today)
    }

    pub fn vt_symbols(&self) -> &[String] {
        &self.vt_symbols
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of requests a full run issues, assuming every symbol parses.
    pub fn len(&self) -> usize {
        self.vt_symbols.len() * self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared stop switch for a running batch.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress notifications for an attached consumer (a UI, a progress bar).
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    Started {
        total: usize,
    },
    Loaded {
        vt_symbol: String,
        interval: Interval,
        bars: usize,
        first: Option<DateTime<Tz>>,
        last: Option<DateTime<Tz>>,
    },
    Empty {
        vt_symbol: String,
        interval: Interval,
    },
    Failed {
        vt_symbol: String,
        interval: Interval,
        error: String,
    },
    Skipped {
        vt_symbol: String,
        reason: String,
    },
    Cancelled,
    Finished(RunSummary),
}

/// Outcome counts of one batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Provider calls issued.
    pub requests: usize,
    /// Requests whose bars reached the sink.
    pub loaded: usize,
    /// Requests that returned no data.
    pub empty: usize,
    /// Requests that errored in the provider or the sink.
    pub failed: usize,
    /// Symbols or windows that could not be turned into requests.
    pub skipped: usize,
    /// Bars written.
    pub rows: usize,
    pub earliest: Option<DateTime<Tz>>,
    pub latest: Option<DateTime<Tz>>,
    pub cancelled: bool,
}

impl RunSummary {
    fn record_loaded(&mut self, rows: usize, first: Option<DateTime<Tz>>, last: Option<DateTime<Tz>>) {
        self.loaded += 1;
        self.rows += rows;
        self.earliest = match (self.earliest, first) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.latest = match (self.latest, last) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "requests={} loaded={} empty={} failed={} skipped={} rows={}",
            self.requests, self.loaded, self.empty, self.failed, self.skipped, self.rows
        )?;
        if let (Some(first), Some(last)) = (self.earliest, self.latest) {
            write!(
                f,
                " range={}..{}",
                first.format("%Y-%m-%d %H:%M"),
                last.format("%Y-%m-%d %H:%M")
            )?;
        }
        if self.cancelled {
            f.write_str(" (cancelled)")?;
        }
        Ok(())
    }
}

/// Runs [`BatchJob`]s against one provider and one sink.
pub struct BatchDriver<P, S> {
    provider: P,
    sink: S,
    cancel: CancelFlag,
    events: Option<UnboundedSender<DriverEvent>>,
}

impl<P, S> BatchDriver<P, S>
where
    P: DataProvider,
    S: BarSink,
{
    pub fn new(provider: P, sink: S) -> Self {
        Self {
            provider,
            sink,
            cancel: CancelFlag::new(),
            events: None,
        }
    }

    pub fn with_events(mut self, events: UnboundedSender<DriverEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// A handle that stops the run before its next request.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn emit(&self, event: DriverEvent) {
        if let Some(tx) = &self.events {
            // a dropped receiver only means nobody is listening
            let _ = tx.send(event);
        }
    }

    pub async fn run(&self, job: &BatchJob) -> RunSummary {
        let mut summary = RunSummary::default();
        info!(
            symbols = job.vt_symbols().len(),
            intervals = job.intervals().len(),
            start = %job.start(),
            end = %job.end(),
            "batch download started"
        );
        self.emit(DriverEvent::Started { total: job.len() });

        'symbols: for vt_symbol in job.vt_symbols() {
            let (symbol, exchange) = match parse_vt_symbol(vt_symbol) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(%vt_symbol, error = %e, "skipping unparseable symbol");
                    summary.skipped += 1;
                    self.emit(DriverEvent::Skipped {
                        vt_symbol: vt_symbol.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            for &interval in job.intervals() {
                if self.cancel.is_cancelled() {
                    warn!(completed = summary.requests, "batch download cancelled");
                    summary.cancelled = true;
                    self.emit(DriverEvent::Cancelled);
                    break 'symbols;
                }

                let request =
                    match HistoryRequest::new(&symbol, exchange, interval, job.start(), job.end()) {
                        Ok(request) => request,
                        Err(e) => {
                            warn!(%vt_symbol, error = %e, "skipping invalid request");
                            summary.skipped += 1;
                            self.emit(DriverEvent::Skipped {
                                vt_symbol: vt_symbol.clone(),
                                reason: e.to_string(),
                            });
                            continue;
                        }
                    };

                summary.requests += 1;
                self.fetch_one(vt_symbol, interval, &request, &mut summary)
                    .await;
            }
        }

        info!(%summary, "batch download finished");
        self.emit(DriverEvent::Finished(summary.clone()));
        summary
    }

    async fn fetch_one(
        &self,
        vt_symbol: &str,
        interval: Interval,
        request: &HistoryRequest,
        summary: &mut RunSummary,
    ) {
        let series = match self.provider.query_bar_history(request).await {
            Ok(Some(series)) => series,
            Ok(None) => {
                info!(%vt_symbol, %interval, "no data");
                summary.empty += 1;
                self.emit(DriverEvent::Empty {
                    vt_symbol: vt_symbol.to_string(),
                    interval,
                });
                return;
            }
            Err(e) => {
                error!(%vt_symbol, %interval, error = %Report::from_error(&e), "bar history request failed");
                summary.failed += 1;
                self.emit(DriverEvent::Failed {
                    vt_symbol: vt_symbol.to_string(),
                    interval,
                    error: e.to_string(),
                });
                return;
            }
        };

        match self.sink.save_bars(&series).await {
            Ok(_) => {
                let (first, last) = (series.first_datetime(), series.last_datetime());
                info!(%vt_symbol, %interval, bars = series.len(), "bars saved");
                summary.record_loaded(series.len(), first, last);
                self.emit(DriverEvent::Loaded {
                    vt_symbol: vt_symbol.to_string(),
                    interval,
                    bars: series.len(),
                    first,
                    last,
                });
            }
            Err(e) => {
                error!(%vt_symbol, %interval, error = %Report::from_error(&e), "saving bars failed");
                summary.failed += 1;
                self.emit(DriverEvent::Failed {
                    vt_symbol: vt_symbol.to_string(),
                    interval,
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Run `job` on a background task.
pub fn spawn<P, S>(driver: BatchDriver<P, S>, job: BatchJob) -> JoinHandle<RunSummary>
where
    P: DataProvider + 'static,
    S: BarSink + 'static,
{
    tokio::spawn(async move { driver.run(&job).await })
}
