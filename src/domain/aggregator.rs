//! Streaming tick-to-bar aggregation.
//!
//! Bars close lazily: the in-progress bar is only finalised when a tick from a
//! later bucket arrives. There is no wall-clock closer, so during a quiet
//! period the last bar stays open (and bar-close exits cannot fire) until the
//! next print.

use chrono::NaiveDateTime;

use super::bar::{bucket_start, Bar, Tick};

/// Emitted when a tick from a new bucket finalises the previous bar.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedBarEvent {
    pub bar: Bar,
}

/// What ingesting one tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Non-finite price or older than the in-progress bucket; state untouched.
    Dropped,
    /// Folded into (or opened) the in-progress bar.
    Updated,
    /// Opened a new bucket, finalising the previous bar.
    Closed(ClosedBarEvent),
}

impl TickOutcome {
    pub fn is_dropped(&self) -> bool {
        matches!(self, TickOutcome::Dropped)
    }

    pub fn closed_bar(self) -> Option<Bar> {
        match self {
            TickOutcome::Closed(event) => Some(event.bar),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BarAggregator {
    width_minutes: u32,
    current: Option<Bar>,
}

impl BarAggregator {
    pub fn new(width_minutes: u32) -> Self {
        Self {
            width_minutes,
            current: None,
        }
    }

    pub fn width_minutes(&self) -> u32 {
        self.width_minutes
    }

    /// The bar currently being built, if any.
    pub fn in_progress(&self) -> Option<&Bar> {
        self.current.as_ref()
    }

    /// Fold a tick into the in-progress bar.
    ///
    /// Non-finite prices and ticks older than the in-progress bucket are
    /// dropped without touching state.
    pub fn ingest_tick(&mut self, tick: Tick) -> TickOutcome {
        if !tick.price.is_finite() {
            tracing::trace!(timestamp = %tick.timestamp, "dropping tick with non-finite price");
            return TickOutcome::Dropped;
        }

        let bucket = bucket_start(tick.timestamp, self.width_minutes);

        match self.current.as_mut() {
            Some(bar) if bar.start_time == bucket => {
                bar.update(tick.price);
                TickOutcome::Updated
            }
            Some(bar) if bucket < bar.start_time => {
                tracing::warn!(
                    timestamp = %tick.timestamp,
                    bar_start = %bar.start_time,
                    "dropping out-of-order tick"
                );
                TickOutcome::Dropped
            }
            _ => self.open_bar(bucket, tick.price),
        }
    }

    fn open_bar(&mut self, bucket: NaiveDateTime, price: f64) -> TickOutcome {
        tracing::debug!(bar_start = %bucket, price, "opening bar");
        match self.current.replace(Bar::opened_at(bucket, price)) {
            Some(bar) => TickOutcome::Closed(ClosedBarEvent { bar }),
            None => TickOutcome::Updated,
        }
    }
}
