//! Market data source port: historical backfill plus a live tick stream.

use crossbeam_channel::Sender;

use crate::domain::bar::{Bar, Tick};
use crate::domain::error::TsiTraderError;

pub trait MarketDataPort: Sync {
    /// Closed bars of `bar_width_minutes`, oldest first. Implementations should
    /// return at least `min_bars` when the venue has them.
    fn fetch_history(&self, bar_width_minutes: u32, min_bars: usize)
        -> Result<Vec<Bar>, TsiTraderError>;

    /// Push ticks into `sink` in non-decreasing timestamp order until the
    /// stream ends. A hung-up receiver means shutdown and returns `Ok`; losing
    /// the upstream connection returns `TsiTraderError::Connectivity`.
    fn stream_ticks(&self, sink: Sender<Tick>) -> Result<(), TsiTraderError>;

    /// Human-readable name used in logs and errors.
    fn name(&self) -> String;
}
