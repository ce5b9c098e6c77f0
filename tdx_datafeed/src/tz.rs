//! Venue time zone helpers.
//!
//! Every exchange served by the quote service quotes in China Standard Time,
//! so bars carry `DateTime<Tz>` pinned to `Asia/Shanghai`. Wall-clock values
//! coming off the wire are naive and are localized here.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

/// Venue time zone for all supported exchanges.
pub const CHINA_TZ: Tz = chrono_tz::Asia::Shanghai;

/// Localize a naive venue wall-clock timestamp.
///
/// Shanghai has not observed DST since 1991, so the mapping is unique for any
/// date the vendor serves. For the historical gap/overlap hours the earliest
/// valid instant is chosen, and a fixed +08:00 offset is used as a last resort
/// so that the function stays total.
pub fn localize(naive: NaiveDateTime) -> DateTime<Tz> {
    CHINA_TZ
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| CHINA_TZ.from_utc_datetime(&(naive - chrono::TimeDelta::hours(8))))
}

/// Midnight (venue time) at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Tz> {
    localize(date.and_time(NaiveTime::MIN))
}
