//! CSV replay market data adapter.
//!
//! History file: `timestamp,open,high,low,close,volume`, one closed bar per row.
//! Ticks file: `timestamp,price`. Timestamps use `%Y-%m-%d %H:%M:%S`. A blank or
//! `nan` price is passed through as a NaN tick so the aggregator drops it.

use chrono::NaiveDateTime;
use crossbeam_channel::Sender;
use std::path::PathBuf;

use crate::domain::bar::{bucket_start, Bar, Tick};
use crate::domain::error::TsiTraderError;
use crate::ports::market_data_port::MarketDataPort;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvMarketData {
    history_path: PathBuf,
    ticks_path: Option<PathBuf>,
}

impl CsvMarketData {
    pub fn new(history_path: PathBuf, ticks_path: Option<PathBuf>) -> Self {
        Self {
            history_path,
            ticks_path,
        }
    }

    fn reader(path: &PathBuf) -> Result<csv::Reader<std::fs::File>, TsiTraderError> {
        csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| TsiTraderError::Data {
                reason: format!("failed to read {}: {}", path.display(), e),
            })
    }
}

fn field<'a>(
    record: &'a csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<&'a str, TsiTraderError> {
    record.get(index).ok_or_else(|| TsiTraderError::Data {
        reason: format!("missing {} column", name),
    })
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, TsiTraderError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|e| TsiTraderError::Data {
        reason: format!("invalid timestamp '{}': {}", value, e),
    })
}

fn parse_number(value: &str, name: &str) -> Result<f64, TsiTraderError> {
    value.parse().map_err(|e| TsiTraderError::Data {
        reason: format!("invalid {} value '{}': {}", name, value, e),
    })
}

/// Blank and `nan` cells become NaN; anything else must parse as a number.
fn parse_price(value: &str) -> Result<f64, TsiTraderError> {
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    parse_number(value, "price")
}

fn parse_bar(record: &csv::StringRecord) -> Result<Bar, TsiTraderError> {
    let volume = match record.get(5) {
        Some(v) if !v.is_empty() => parse_number(v, "volume")?,
        _ => 0.0,
    };
    Ok(Bar {
        start_time: parse_timestamp(field(record, 0, "timestamp")?)?,
        open: parse_number(field(record, 1, "open")?, "open")?,
        high: parse_number(field(record, 2, "high")?, "high")?,
        low: parse_number(field(record, 3, "low")?, "low")?,
        close: parse_number(field(record, 4, "close")?, "close")?,
        volume,
    })
}

fn parse_tick(record: &csv::StringRecord) -> Result<Tick, TsiTraderError> {
    Ok(Tick {
        timestamp: parse_timestamp(field(record, 0, "timestamp")?)?,
        price: parse_price(field(record, 1, "price")?)?,
    })
}

impl MarketDataPort for CsvMarketData {
    fn fetch_history(
        &self,
        bar_width_minutes: u32,
        min_bars: usize,
    ) -> Result<Vec<Bar>, TsiTraderError> {
        let mut rdr = Self::reader(&self.history_path)?;
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TsiTraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            let bar = parse_bar(&record)?;
            if bucket_start(bar.start_time, bar_width_minutes) != bar.start_time {
                return Err(TsiTraderError::Data {
                    reason: format!(
                        "bar at {} is not aligned to {}-minute boundaries",
                        bar.start_time, bar_width_minutes
                    ),
                });
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.start_time);
        bars.dedup_by_key(|b| b.start_time);

        if bars.len() < min_bars {
            tracing::warn!(
                have = bars.len(),
                want = min_bars,
                path = %self.history_path.display(),
                "history shorter than recommended warm-up"
            );
        }
        Ok(bars)
    }

    fn stream_ticks(&self, sink: Sender<Tick>) -> Result<(), TsiTraderError> {
        let Some(path) = &self.ticks_path else {
            return Err(TsiTraderError::Data {
                reason: "no ticks file configured".into(),
            });
        };
        let mut rdr = Self::reader(path)?;

        for result in rdr.records() {
            let record = result.map_err(|e| TsiTraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            let tick = parse_tick(&record)?;
            if sink.send(tick).is_err() {
                tracing::debug!("tick consumer hung up, stopping replay");
                return Ok(());
            }
        }
        Ok(())
    }

    fn name(&self) -> String {
        format!("csv:{}", self.history_path.display())
    }
}
