pub mod asset;
pub mod bar;
pub mod bar_series;
pub mod exchange;
pub mod interval;
pub mod request;
