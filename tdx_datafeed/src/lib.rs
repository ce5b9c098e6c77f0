//! Historical bar datafeed for the TDX quote service.
//!
//! The vendor only serves fixed-size pages of bars counted backward from
//! "now". [`history`] turns that into a date-bounded, oldest-first bar series:
//! it locates the page offset for the requested end date, walks pages back
//! towards the start date, normalizes every row and re-stamps the final bar to
//! its bucket end. [`providers::tdx::TdxProvider`] wires this to a real TCP
//! session, and [`driver::BatchDriver`] runs many requests into a
//! [`io::sink::BarSink`].

#[cfg(feature = "cli")]
pub mod cli;
pub mod bucket;
pub mod config;
pub mod driver;
pub mod errors;
pub mod history;
pub mod io;
pub mod mapping;
pub mod models;
pub mod providers;
pub mod tz;
