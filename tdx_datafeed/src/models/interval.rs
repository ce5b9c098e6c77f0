use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntervalParseError {
    #[error("Invalid interval: {0:?} (expected one of 1m, 1h, d, w, tick)")]
    InvalidInput(String),
}

/// Bar interval of a history request.
///
/// `Tick` has no tick-level history on the quote service; it is served from
/// 1-minute bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    Minute,
    #[serde(rename = "1h")]
    Hour,
    #[serde(rename = "d")]
    Daily,
    #[serde(rename = "w")]
    Weekly,
    #[serde(rename = "tick")]
    Tick,
}

impl Interval {
    pub fn as_str(self) -> &'static str {
        match self {
            Interval::Minute => "1m",
            Interval::Hour => "1h",
            Interval::Daily => "d",
            Interval::Weekly => "w",
            Interval::Tick => "tick",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = IntervalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" | "m" | "min" | "minute" => Ok(Interval::Minute),
            "1h" | "h" | "hour" => Ok(Interval::Hour),
            "d" | "D" | "1d" | "day" | "daily" => Ok(Interval::Daily),
            "w" | "W" | "1w" | "week" | "weekly" => Ok(Interval::Weekly),
            "tick" => Ok(Interval::Tick),
            other => Err(IntervalParseError::InvalidInput(other.to_string())),
        }
    }
}
