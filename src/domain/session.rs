//! The owned trading aggregate: aggregator, indicator cache and signal engine.
//!
//! All mutable engine state lives here and is threaded through the event loop
//! by `&mut`. Ticks must be fed in arrival order.

use chrono::NaiveDateTime;

use super::aggregator::{BarAggregator, TickOutcome};
use super::bar::{Bar, Tick};
use super::config::StrategyConfig;
use super::execution::FillResult;
use super::indicator_cache::{IndicatorCache, IndicatorParams, IndicatorSnapshot};
use super::position::{ClosedTrade, PositionState};
use super::signal_engine::{FillOutcome, Intent, SignalEngine};

#[derive(Debug, Clone)]
pub struct TradingSession {
    aggregator: BarAggregator,
    cache: IndicatorCache,
    engine: SignalEngine,
    closed_trades: Vec<ClosedTrade>,
    bars_closed: usize,
    last_tick_time: Option<NaiveDateTime>,
}

impl TradingSession {
    pub fn new(config: &StrategyConfig) -> Self {
        TradingSession {
            aggregator: BarAggregator::new(config.bar_width_minutes),
            cache: IndicatorCache::new(IndicatorParams::from(config)),
            engine: SignalEngine::new(config.tsi_threshold, config.quantity),
            closed_trades: Vec::new(),
            bars_closed: 0,
            last_tick_time: None,
        }
    }

    /// Seed the indicator cache with backfilled bars.
    pub fn warm_up(&mut self, history: Vec<Bar>) {
        let count = history.len();
        self.cache.seed(history);
        match self.cache.current_snapshot() {
            Some(s) => tracing::info!(
                bars = count,
                ma = s.moving_average,
                tsi = ?s.oscillator_value,
                sar = ?s.stop_value,
                "warm-up complete"
            ),
            None => tracing::warn!(
                bars = count,
                required = self.cache.params().ma_period,
                "indicators not available: insufficient history"
            ),
        }
    }

    /// Process one tick: close a bar if the tick opens a new bucket (running
    /// the exit check on it), then run the entry check on the tick itself.
    /// Ticks the aggregator drops reach neither the engine nor the clock.
    pub fn on_tick(&mut self, tick: Tick) -> Vec<Intent> {
        let mut intents = Vec::new();

        let closed = match self.aggregator.ingest_tick(tick) {
            TickOutcome::Dropped => return intents,
            TickOutcome::Updated => None,
            TickOutcome::Closed(event) => Some(event.bar),
        };

        if let Some(bar) = closed {
            self.bars_closed += 1;
            tracing::info!(
                start = %bar.start_time,
                open = bar.open,
                high = bar.high,
                low = bar.low,
                close = bar.close,
                "bar closed"
            );
            self.cache.on_bar_closed(bar.clone());
            if let Some(intent) = self.engine.on_bar_close(&bar, self.cache.current_snapshot()) {
                intents.push(intent);
            }
        }

        self.last_tick_time = Some(tick.timestamp);
        if let Some(intent) = self.engine.on_tick(&tick, self.cache.current_snapshot()) {
            intents.push(intent);
        }
        intents
    }

    /// Apply the gateway's answer for the in-flight order.
    pub fn apply_fill(&mut self, result: &FillResult, time: NaiveDateTime) -> FillOutcome {
        let outcome = self.engine.apply_fill(result, time);
        if let FillOutcome::Exited(trade) = &outcome {
            self.closed_trades.push(trade.clone());
            tracing::info!(
                pnl = trade.pnl,
                total_pnl = self.total_pnl(),
                trades = self.closed_trades.len(),
                "trade recorded"
            );
        }
        outcome
    }

    pub fn snapshot(&self) -> Option<&IndicatorSnapshot> {
        self.cache.current_snapshot()
    }

    pub fn state(&self) -> &PositionState {
        self.engine.state()
    }

    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    pub fn cache(&self) -> &IndicatorCache {
        &self.cache
    }

    pub fn in_progress_bar(&self) -> Option<&Bar> {
        self.aggregator.in_progress()
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.closed_trades
    }

    pub fn bars_closed(&self) -> usize {
        self.bars_closed
    }

    pub fn last_tick_time(&self) -> Option<NaiveDateTime> {
        self.last_tick_time
    }

    pub fn total_pnl(&self) -> f64 {
        self.closed_trades.iter().map(|t| t.pnl).sum()
    }

    pub fn quantity(&self) -> f64 {
        self.engine.quantity()
    }

    pub fn bar_width_minutes(&self) -> u32 {
        self.aggregator.width_minutes()
    }
}
