//! Bar end-time alignment.
//!
//! The vendor labels intraday bars with the *start* of their bucket, while
//! bars are stored under the *end* of the bucket they cover (right-open
//! intervals). [`bar_end_time`] maps a timestamp onto that end label:
//!
//! - widths below an hour round the minute up to the next multiple of the
//!   width, advancing a full bucket when already aligned, except on the two
//!   session closes (11:30 and 15:00) which are already bucket ends;
//! - hourly and coarser widths snap forward to the next named session
//!   boundary for that width.
//!
//! All functions are pure and total.

use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use chrono_tz::Tz;

use crate::tz::localize;

/// Morning and afternoon session closes of the stock exchanges.
const SESSION_CLOSES: [(u32, u32); 2] = [(11, 30), (15, 0)];

/// Bucket ends for 60-minute bars, covering day and night sessions.
const HOURLY_BOUNDARIES: [(u32, u32); 10] = [
    (1, 0),
    (2, 0),
    (3, 0),
    (10, 30),
    (11, 30),
    (14, 0),
    (15, 0),
    (22, 0),
    (23, 0),
    (23, 59),
];

fn session_boundaries(width_minutes: u32) -> Option<&'static [(u32, u32)]> {
    match width_minutes {
        60 => Some(&HOURLY_BOUNDARIES),
        _ => None,
    }
}

fn hm(time: NaiveTime) -> (u32, u32) {
    (time.hour(), time.minute())
}

/// Drop seconds and sub-second precision.
pub fn truncate_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(dt)
}

/// End-of-bucket label for `dt` at `width_minutes`.
///
/// A width of zero is treated as one minute. Widths of an hour or more without
/// a boundary table, and timestamps past the last boundary, come back
/// unchanged (after truncation to the minute).
pub fn bar_end_time(dt: NaiveDateTime, width_minutes: u32) -> NaiveDateTime {
    let dt = truncate_to_minute(dt);

    if width_minutes < 60 {
        if SESSION_CLOSES.contains(&hm(dt.time())) {
            return dt;
        }
        let width = width_minutes.max(1);
        let rem = dt.minute() % width;
        let step = if rem != 0 { width - rem } else { width };
        return dt + TimeDelta::minutes(i64::from(step));
    }

    session_boundaries(width_minutes)
        .into_iter()
        .flatten()
        .filter_map(|&(h, m)| NaiveTime::from_hms_opt(h, m, 0))
        .map(|t| dt.date().and_time(t))
        .find(|edt| dt <= *edt)
        .unwrap_or(dt)
}

/// [`bar_end_time`] on a venue-local timestamp.
pub fn bar_end_time_tz(dt: DateTime<Tz>, width_minutes: u32) -> DateTime<Tz> {
    localize(bar_end_time(dt.naive_local(), width_minutes))
}
