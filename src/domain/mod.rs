//! Core domain types and logic: bars, indicators, the signal state machine and
//! the trading session that ties them together.

pub mod aggregator;
pub mod bar;
pub mod bar_series;
pub mod config;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod indicator_cache;
pub mod position;
pub mod session;
pub mod signal_engine;
