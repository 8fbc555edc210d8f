//! OHLCV bar and tick representation, plus bar-boundary alignment.

use chrono::{NaiveDateTime, Timelike};

/// A single last-trade print from the market data source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

impl Tick {
    pub fn new(timestamp: NaiveDateTime, price: f64) -> Self {
        Self { timestamp, price }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub start_time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// A fresh bar opened by a single print: open = high = low = close.
    pub fn opened_at(start_time: NaiveDateTime, price: f64) -> Self {
        Self {
            start_time,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0.0,
        }
    }

    /// Fold another print into this bar.
    pub fn update(&mut self, price: f64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
    }

    /// low <= min(open, close) and high >= max(open, close)
    pub fn is_consistent(&self) -> bool {
        self.low <= self.open.min(self.close) && self.high >= self.open.max(self.close)
    }
}

/// Start of the bar bucket containing `timestamp`.
///
/// Buckets are aligned on the minute-of-hour: the minute is floored to a
/// multiple of `width_minutes` and seconds/sub-seconds are zeroed. Widths are
/// expected to divide 60 (enforced by config validation).
pub fn bucket_start(timestamp: NaiveDateTime, width_minutes: u32) -> NaiveDateTime {
    let width = width_minutes.max(1);
    let minute = (timestamp.minute() / width) * width;
    timestamp
        .with_nanosecond(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_minute(minute))
        .unwrap_or(timestamp)
}
