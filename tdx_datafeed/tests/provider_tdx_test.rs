mod common;

use common::{Failure, ScriptedVendor, calendar_history, date, row, weekday_history};
use tdx_datafeed::{
    models::{
        asset::AssetClass, exchange::Exchange, interval::Interval, request::HistoryRequest,
    },
    providers::{DataProvider, ProviderError, tdx::TdxProvider},
};

fn daily(symbol: &str, exchange: Exchange, start: (i32, u32, u32), end: (i32, u32, u32)) -> HistoryRequest {
    HistoryRequest::new(
        symbol,
        exchange,
        Interval::Daily,
        date(start.0, start.1, start.2),
        date(end.0, end.1, end.2),
    )
    .unwrap()
}

#[tokio::test]
async fn daily_scenario_000001_szse() {
    let vendor = ScriptedVendor::new(weekday_history(date(2019, 6, 3), date(2020, 3, 31)));
    let provider = TdxProvider::with_connector(vendor.clone());
    let request = daily("000001", Exchange::Szse, (2020, 1, 1), (2020, 1, 10));

    let series = provider.query_bar_history(&request).await.unwrap().unwrap();

    assert_eq!(series.vendor_symbol, "000001.SZ");
    assert_eq!(series.asset_class, AssetClass::Equity);
    assert!(!series.is_empty() && series.len() <= 10);
    for bar in &series.bars {
        assert!(bar.volume > 0.0);
        assert_eq!((bar.close * 1e6).round() / 1e6, bar.close);
        assert!(bar.datetime >= request.start_bound());
        assert!(bar.datetime <= request.end_bound());
        assert_eq!(bar.source, "TDX");
    }
    assert!(series.bars.windows(2).all(|w| w[0].datetime <= w[1].datetime));
    assert_eq!(vendor.connects(), 1);
    assert_eq!(vendor.disconnects(), 1);
}

#[tokio::test]
async fn null_open_row_yields_no_bar() {
    let vendor = ScriptedVendor::new(vec![row("2020-01-02 09:31:00", None, 100.0)]);
    let provider = TdxProvider::with_connector(vendor.clone());
    let day = date(2020, 1, 2);
    let request = HistoryRequest::new("000001", Exchange::Szse, Interval::Minute, day, day).unwrap();

    assert!(provider.query_bar_history(&request).await.unwrap().is_none());
    assert_eq!(vendor.disconnects(), 1);
}

#[tokio::test]
async fn skip_rule_drops_exactly_the_untraded_rows() {
    let mut history = weekday_history(date(2020, 1, 1), date(2020, 1, 31));
    let total = history.len();
    history[3].open = None;
    history[7].volume = 0.0;
    history[11].volume = 0.4;
    let vendor = ScriptedVendor::new(history);
    let provider = TdxProvider::with_connector(vendor);
    let request = daily("600000", Exchange::Sse, (2020, 1, 1), (2020, 1, 31));

    let series = provider.query_bar_history(&request).await.unwrap().unwrap();
    assert_eq!(series.len(), total - 3);
    assert_eq!(series.vendor_symbol, "600000.SH");
}

#[tokio::test]
async fn refused_connection_is_no_data() {
    let vendor = ScriptedVendor::new(Vec::new()).failing(Failure::Refuse);
    let provider = TdxProvider::with_connector(vendor.clone());
    let request = daily("000001", Exchange::Szse, (2020, 1, 1), (2020, 1, 10));

    let result = provider.query_bar_history(&request).await;
    assert!(matches!(result, Ok(None)));
    assert_eq!(vendor.disconnects(), 0);
}

#[tokio::test]
async fn dropped_session_mid_walk_is_no_data_and_released() {
    let vendor = ScriptedVendor::new(calendar_history(date(2015, 1, 1), 3000))
        .failing(Failure::DropAt(2));
    let provider = TdxProvider::with_connector(vendor.clone());
    let request = daily("000001", Exchange::Szse, (2016, 1, 1), (2020, 1, 10));

    assert!(provider.query_bar_history(&request).await.unwrap().is_none());
    assert_eq!(vendor.calls().len(), 3);
    assert_eq!(vendor.disconnects(), 1);
}

#[tokio::test]
async fn protocol_error_surfaces_after_release() {
    let vendor = ScriptedVendor::new(calendar_history(date(2015, 1, 1), 3000))
        .failing(Failure::GarbleAt(0));
    let provider = TdxProvider::with_connector(vendor.clone());
    let request = daily("000001", Exchange::Szse, (2016, 1, 1), (2020, 1, 10));

    let err = provider.query_bar_history(&request).await.unwrap_err();
    assert!(matches!(err, ProviderError::Protocol { .. }));
    assert!(!err.is_transport());
    assert_eq!(vendor.disconnects(), 1);
}

#[tokio::test]
async fn unsupported_exchanges_never_connect() {
    let vendor = ScriptedVendor::new(weekday_history(date(2020, 1, 1), date(2020, 1, 31)));
    let provider = TdxProvider::with_connector(vendor.clone());

    for (symbol, exchange) in [("00700", Exchange::Sehk), ("430047", Exchange::Bse), ("rb2410", Exchange::Shfe)] {
        let request = daily(symbol, exchange, (2020, 1, 1), (2020, 1, 10));
        assert!(provider.query_bar_history(&request).await.unwrap().is_none());
    }
    assert_eq!(vendor.connects(), 0);
}

#[tokio::test]
async fn end_date_before_history_is_no_data() {
    let vendor = ScriptedVendor::new(weekday_history(date(2020, 1, 1), date(2020, 1, 31)));
    let provider = TdxProvider::with_connector(vendor.clone());
    let request = daily("000001", Exchange::Szse, (2019, 1, 1), (2019, 1, 10));

    assert!(provider.query_bar_history(&request).await.unwrap().is_none());
    assert_eq!(vendor.disconnects(), 1);
}

#[tokio::test]
async fn bars_printed_between_locate_and_walk_do_not_shift_the_window() {
    // 3000 days from 2015-01-01; the locator needs two probes
    let newer = calendar_history(date(2023, 3, 20), 5);
    let vendor = ScriptedVendor::new(calendar_history(date(2015, 1, 1), 3000)).growing(2, newer);
    let provider = TdxProvider::with_connector(vendor.clone());
    let request = daily("000001", Exchange::Szse, (2020, 1, 1), (2020, 1, 10));

    let series = provider.query_bar_history(&request).await.unwrap().unwrap();

    assert_eq!(vendor.calls()[..2], [(0, 800), (800, 800)]);
    assert_eq!(series.len(), 10);
    assert!(series.bars.windows(2).all(|w| w[0].datetime < w[1].datetime));
    assert!(series.first_datetime().unwrap() >= request.start_bound());
    assert!(series.last_datetime().unwrap() <= request.end_bound());
    assert_eq!(
        series.last_datetime().unwrap().format("%Y-%m-%d %H:%M").to_string(),
        "2020-01-10 15:00"
    );
}

#[tokio::test]
async fn offset_probes_are_bounded() {
    // 40 pages of history newer than the requested end date
    let vendor = ScriptedVendor::new(calendar_history(date(1930, 1, 1), 800 * 40));
    let provider = TdxProvider::with_connector(vendor.clone());
    let request = daily("000001", Exchange::Szse, (1930, 1, 1), (1930, 1, 5));

    assert!(provider.query_bar_history(&request).await.unwrap().is_none());
    assert_eq!(vendor.calls().len(), 31);
}

#[tokio::test]
async fn long_window_is_contained_and_ordered() {
    let vendor = ScriptedVendor::new(calendar_history(date(2012, 1, 1), 5000));
    let provider = TdxProvider::with_connector(vendor);
    let request = daily("399001", Exchange::Szse, (2014, 3, 1), (2020, 6, 30));

    let series = provider.query_bar_history(&request).await.unwrap().unwrap();
    assert_eq!(series.asset_class, AssetClass::Index);
    assert_eq!(series.len() as i64, request.span_days());
    assert!(series.bars.windows(2).all(|w| w[0].datetime <= w[1].datetime));
    assert!(series.first_datetime().unwrap() >= request.start_bound());
    assert!(series.last_datetime().unwrap() <= request.end_bound());
}
