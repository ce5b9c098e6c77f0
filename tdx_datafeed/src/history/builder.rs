//! Turns vendor rows into [`NormalizedBar`]s.

use tracing::debug;

use crate::{
    mapping::Frequency,
    models::{
        bar::{NormalizedBar, RawBarRow},
        request::HistoryRequest,
    },
    providers::tdx::SOURCE,
    tz::localize,
};

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Build one bar, or `None` for rows that must not produce one: no trade in
/// the bucket (null prices or zero volume) or an unreadable timestamp.
pub fn build_bar(
    row: &RawBarRow,
    request: &HistoryRequest,
    frequency: &Frequency,
) -> Option<NormalizedBar> {
    let (Some(open), Some(high), Some(low), Some(close)) = (row.open, row.high, row.low, row.close)
    else {
        return None;
    };
    if row.volume.trunc() <= 0.0 {
        return None;
    }
    let timestamp = row.timestamp()? - frequency.adjustment;

    Some(NormalizedBar {
        symbol: request.symbol().to_string(),
        exchange: request.exchange(),
        interval: request.interval(),
        datetime: localize(timestamp),
        open: round6(open),
        high: round6(high),
        low: round6(low),
        close: round6(close),
        volume: row.volume,
        turnover: row.turnover.unwrap_or(0.0),
        open_interest: row.open_interest.unwrap_or(0.0),
        source: SOURCE,
    })
}

/// Build every row of a page, preserving order.
pub fn build_bars(
    rows: &[RawBarRow],
    request: &HistoryRequest,
    frequency: &Frequency,
) -> Vec<NormalizedBar> {
    let bars: Vec<_> = rows
        .iter()
        .filter_map(|row| build_bar(row, request, frequency))
        .collect();
    let skipped = rows.len() - bars.len();
    if skipped > 0 {
        debug!(skipped, kept = bars.len(), "dropped rows without trades");
    }
    bars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mapping::frequency,
        models::{exchange::Exchange, interval::Interval},
    };
    use chrono::NaiveDate;

    fn request(interval: Interval) -> HistoryRequest {
        let d = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
        HistoryRequest::new("000001", Exchange::Szse, interval, d, d).unwrap()
    }

    fn row(datetime: &str, open: Option<f64>, volume: f64) -> RawBarRow {
        RawBarRow {
            datetime: datetime.into(),
            open,
            high: Some(10.0),
            low: Some(9.0),
            close: Some(9.5),
            volume,
            turnover: None,
            open_interest: None,
        }
    }

    #[test]
    fn null_open_produces_no_bar() {
        let req = request(Interval::Minute);
        let freq = frequency(Interval::Minute);
        assert!(build_bar(&row("2020-01-02 09:31:00", None, 100.0), &req, &freq).is_none());
    }

    #[test]
    fn fractional_or_zero_volume_is_skipped() {
        let req = request(Interval::Daily);
        let freq = frequency(Interval::Daily);
        assert!(build_bar(&row("2020-01-02 15:00", Some(9.2), 0.0), &req, &freq).is_none());
        assert!(build_bar(&row("2020-01-02 15:00", Some(9.2), 0.9), &req, &freq).is_none());
        assert!(build_bar(&row("2020-01-02 15:00", Some(9.2), -3.0), &req, &freq).is_none());
        assert!(build_bar(&row("2020-01-02 15:00", Some(9.2), 1.0), &req, &freq).is_some());
    }

    #[test]
    fn any_missing_price_is_skipped() {
        let req = request(Interval::Daily);
        let freq = frequency(Interval::Daily);
        let mut r = row("2020-01-02 15:00", Some(9.2), 10.0);
        r.low = None;
        assert!(build_bar(&r, &req, &freq).is_none());
    }

    #[test]
    fn unparseable_timestamp_is_skipped() {
        let req = request(Interval::Daily);
        let freq = frequency(Interval::Daily);
        assert!(build_bar(&row("yesterday", Some(9.2), 10.0), &req, &freq).is_none());
    }

    #[test]
    fn intraday_timestamps_shift_back_one_bucket() {
        let minute = build_bar(
            &row("2020-01-02 09:31", Some(9.2), 10.0),
            &request(Interval::Minute),
            &frequency(Interval::Minute),
        )
        .unwrap();
        assert_eq!(minute.datetime.format("%H:%M").to_string(), "09:30");

        let hour = build_bar(
            &row("2020-01-02 10:30", Some(9.2), 10.0),
            &request(Interval::Hour),
            &frequency(Interval::Hour),
        )
        .unwrap();
        assert_eq!(hour.datetime.format("%H:%M").to_string(), "09:30");

        let daily = build_bar(
            &row("2020-01-02 15:00", Some(9.2), 10.0),
            &request(Interval::Daily),
            &frequency(Interval::Daily),
        )
        .unwrap();
        assert_eq!(daily.datetime.format("%H:%M").to_string(), "15:00");
    }

    #[test]
    fn prices_rounded_and_optionals_defaulted() {
        let mut r = row("2020-01-02 15:00", Some(9.123_456_789), 1234.0);
        r.close = Some(9.000_000_4);
        let bar = build_bar(&r, &request(Interval::Daily), &frequency(Interval::Daily)).unwrap();
        assert_eq!(bar.open, 9.123457);
        assert_eq!(bar.close, 9.0);
        assert_eq!(bar.volume, 1234.0);
        assert_eq!(bar.turnover, 0.0);
        assert_eq!(bar.open_interest, 0.0);
        assert_eq!(bar.source, "TDX");
        assert_eq!(bar.symbol, "000001");
    }

    #[test]
    fn build_bars_drops_exactly_the_skipped_rows() {
        let rows = vec![
            row("2020-01-02 09:31", Some(9.2), 10.0),
            row("2020-01-02 09:32", None, 10.0),
            row("2020-01-02 09:33", Some(9.2), 0.0),
            row("2020-01-02 09:34", Some(9.2), 10.0),
        ];
        let bars = build_bars(&rows, &request(Interval::Minute), &frequency(Interval::Minute));
        assert_eq!(bars.len(), rows.len() - 2);
    }
}
