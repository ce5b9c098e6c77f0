use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::{cli::params::parse_date, driver::DEFAULT_YEARS, models::interval::Interval};

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the config file (tdx.toml). Defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch one symbol and interval over a date range
    Single {
        /// Symbol with exchange, e.g. "000001.SZSE" or "600000.SH"
        #[arg(long)]
        vt_symbol: String,

        /// Bar interval: 1m, 1h, d, w or tick
        #[arg(long, default_value = "d")]
        interval: Interval,

        /// First date, YYYY-MM-DD or YYYYMMDD
        #[arg(long, value_parser = parse_date)]
        start: NaiveDate,

        /// Last date (inclusive), YYYY-MM-DD or YYYYMMDD
        #[arg(short, long, value_parser = parse_date)]
        end: NaiveDate,

        /// Directory for the .jsonl output (defaults to the system temp dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch a universe of symbols over the last N years
    Batch {
        /// JSON file holding an array of vt_symbols
        #[arg(long)]
        input: PathBuf,

        /// Comma-separated intervals
        #[arg(long, value_delimiter = ',', default_values = ["1m", "1h", "d"])]
        intervals: Vec<Interval>,

        /// Years of history to fetch, counted back from today
        #[arg(long, default_value_t = DEFAULT_YEARS)]
        years: u32,

        /// Directory for the .jsonl output (defaults to the system temp dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_single() {
        let cli = Cli::try_parse_from([
            "tdx_datafeed",
            "single",
            "--vt-symbol",
            "000001.SZSE",
            "--interval",
            "1m",
            "--start",
            "20200101",
            "--end",
            "2020-01-10",
        ])
        .unwrap();
        let Commands::Single {
            interval,
            start,
            end,
            output,
            ..
        } = cli.command
        else {
            panic!("expected single");
        };
        assert_eq!(interval, Interval::Minute);
        assert_eq!(start, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2020, 1, 10).unwrap());
        assert!(output.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn batch_defaults() {
        let cli = Cli::try_parse_from(["tdx_datafeed", "batch", "--input", "u.json"]).unwrap();
        let Commands::Batch {
            intervals, years, ..
        } = cli.command
        else {
            panic!("expected batch");
        };
        assert_eq!(intervals, [Interval::Minute, Interval::Hour, Interval::Daily]);
        assert_eq!(years, DEFAULT_YEARS);

        let cli = Cli::try_parse_from([
            "tdx_datafeed",
            "-c",
            "tdx.toml",
            "batch",
            "--input",
            "u.json",
            "--intervals",
            "d,w",
        ])
        .unwrap();
        let Commands::Batch { intervals, .. } = cli.command else {
            panic!("expected batch");
        };
        assert_eq!(intervals, [Interval::Daily, Interval::Weekly]);
    }
}
