//! Downstream storage for fetched bar series.

pub mod jsonl;
pub mod memory;
pub mod sink;
