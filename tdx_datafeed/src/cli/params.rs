use std::{fs, path::Path};

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::Error;

/// One universe entry: a bare vt_symbol or an object carrying one.
#[derive(Deserialize)]
#[serde(untagged)]
enum UniverseItem {
    Plain(String),
    Entry { vt_symbol: String },
}

/// Accepts `2020-01-31` and `20200131`.
pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d").or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
}

pub fn parse_universe_from_json_value(json_value: Value) -> Result<Vec<String>, Error> {
    let items: Vec<UniverseItem> = serde_json::from_value(json_value)?;
    Ok(items
        .into_iter()
        .map(|item| match item {
            UniverseItem::Plain(vt_symbol) | UniverseItem::Entry { vt_symbol } => vt_symbol,
        })
        .collect())
}

pub fn parse_universe_from_json_string(json_str: &str) -> Result<Vec<String>, Error> {
    let json_value: Value = serde_json::from_str(json_str)?;
    parse_universe_from_json_value(json_value)
}

pub fn parse_universe_from_file(file_path: impl AsRef<Path>) -> Result<Vec<String>, Error> {
    let content = fs::read_to_string(file_path)?;
    parse_universe_from_json_string(&content)
}
