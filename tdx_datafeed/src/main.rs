use std::error::Error;

use chrono::Utc;
use clap::Parser;
use tdx_datafeed::{
    cli::{
        commands::{Cli, Commands},
        params::parse_universe_from_file,
    },
    config::{DatafeedConfig, load_config_path},
    driver::{self, BatchDriver, BatchJob, DriverEvent},
    io::{jsonl::JsonLinesSink, sink::BarSink},
    models::{exchange::parse_vt_symbol, request::HistoryRequest},
    providers::{DataProvider, tdx::TdxProvider},
    tz::CHINA_TZ,
};
use tokio::sync::mpsc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_path(path)?,
        None => DatafeedConfig::default(),
    }
    .with_env_overrides()?;
    let provider = TdxProvider::from_config(&config);

    match cli.command {
        Commands::Single {
            vt_symbol,
            interval,
            start,
            end,
            output,
        } => {
            let (symbol, exchange) = parse_vt_symbol(&vt_symbol)?;
            let request = HistoryRequest::new(symbol, exchange, interval, start, end)?;
            let sink = output
                .map(JsonLinesSink::new)
                .unwrap_or_else(JsonLinesSink::in_temp_dir);

            match provider.query_bar_history(&request).await? {
                Some(series) => {
                    let path = sink.save_bars(&series).await?;
                    // paths on stdout, everything else on stderr
                    println!("{}", path.display());
                    eprintln!(
                        "SUMMARY: {} {} bars={} first={:?} last={:?}",
                        series.vt_symbol(),
                        series.interval,
                        series.len(),
                        series.first_datetime(),
                        series.last_datetime()
                    );
                }
                None => eprintln!("SUMMARY: no data for {} {}", request.vt_symbol(), interval),
            }
        }

        Commands::Batch {
            input,
            intervals,
            years,
            output,
        } => {
            let universe = parse_universe_from_file(&input)?;
            let today = Utc::now().with_timezone(&CHINA_TZ).date_naive();
            let job = BatchJob::last_years(universe, &intervals, years, today);
            let sink = output
                .map(JsonLinesSink::new)
                .unwrap_or_else(JsonLinesSink::in_temp_dir);
            let out_dir = sink.dir().to_path_buf();

            let (tx, mut rx) = mpsc::unbounded_channel();
            let driver = BatchDriver::new(provider, sink).with_events(tx);

            let cancel = driver.cancel_flag();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received, stopping after the current request");
                    cancel.cancel();
                }
            });

            let handle = driver::spawn(driver, job);
            while let Some(event) = rx.recv().await {
                if let DriverEvent::Loaded {
                    vt_symbol,
                    interval,
                    bars,
                    ..
                } = event
                {
                    println!("{vt_symbol}\t{interval}\t{bars}");
                }
            }
            let summary = handle.await?;
            eprintln!("SUMMARY: {summary} output={}", out_dir.display());
        }
    }
    Ok(())
}
