//! Short-only position state machine.
//!
//! Entries are evaluated on every tick (price crossing down through the moving
//! average while the average falls and the oscillator sits below the
//! threshold). Exits are evaluated only on bar closes (closed bar high reaching
//! the trend-reversal stop). State changes only when the execution gateway
//! confirms a fill; while an order is in flight no new intent is emitted.

use chrono::NaiveDateTime;

use super::bar::{Bar, Tick};
use super::execution::{FillResult, FillStatus, OrderRequest, OrderSide};
use super::indicator_cache::IndicatorSnapshot;
use super::position::{ClosedTrade, PositionState};

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    EntryShort {
        price: f64,
        time: NaiveDateTime,
    },
    ExitShort {
        bar_high: f64,
        stop: f64,
        time: NaiveDateTime,
    },
}

impl Intent {
    pub fn side(&self) -> OrderSide {
        match self {
            Intent::EntryShort { .. } => OrderSide::Sell,
            Intent::ExitShort { .. } => OrderSide::Buy,
        }
    }

    /// Price the intent was triggered at (tick price for entries, bar high for exits).
    pub fn reference_price(&self) -> f64 {
        match self {
            Intent::EntryShort { price, .. } => *price,
            Intent::ExitShort { bar_high, .. } => *bar_high,
        }
    }

    pub fn order(&self, quantity: f64) -> OrderRequest {
        OrderRequest {
            side: self.side(),
            quantity,
            reference_price: self.reference_price(),
        }
    }
}

/// Remembers which side of the reference line the previous tick was on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossoverTracker {
    was_above: Option<bool>,
}

impl CrossoverTracker {
    pub fn was_above(&self) -> Option<bool> {
        self.was_above
    }

    /// Record the current relation; true only on an above -> not-above transition.
    /// The first observation never signals.
    pub fn observe(&mut self, above: bool) -> bool {
        let crossed_down = self.was_above == Some(true) && !above;
        self.was_above = Some(above);
        crossed_down
    }
}

/// What applying a fill result did to the position.
#[derive(Debug, Clone, PartialEq)]
pub enum FillOutcome {
    Entered { entry_price: f64 },
    Exited(ClosedTrade),
    NotFilled { intent: Intent, status: FillStatus },
    NoPendingOrder,
    /// A fill arrived for an intent that no longer matches the position.
    Mismatched { intent: Intent, state: PositionState },
}

#[derive(Debug, Clone)]
pub struct SignalEngine {
    threshold: f64,
    quantity: f64,
    state: PositionState,
    tracker: CrossoverTracker,
    pending: Option<Intent>,
}

impl SignalEngine {
    pub fn new(threshold: f64, quantity: f64) -> Self {
        Self {
            threshold,
            quantity,
            state: PositionState::Flat,
            tracker: CrossoverTracker::default(),
            pending: None,
        }
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn tracker(&self) -> &CrossoverTracker {
        &self.tracker
    }

    pub fn pending(&self) -> Option<&Intent> {
        self.pending.as_ref()
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    /// Tick-level entry evaluation. Only acts while flat with a snapshot.
    pub fn on_tick(&mut self, tick: &Tick, snapshot: Option<&IndicatorSnapshot>) -> Option<Intent> {
        if !self.state.is_flat() || !tick.price.is_finite() {
            return None;
        }
        let snapshot = snapshot?;

        let above = tick.price > snapshot.moving_average;
        let first = self.tracker.was_above().is_none();
        let crossed_down = self.tracker.observe(above);
        if first || !crossed_down {
            return None;
        }

        let falling = snapshot.moving_average_slope.is_some_and(|s| s < 0.0);
        let weak = snapshot.oscillator_value.is_some_and(|v| v < self.threshold);
        tracing::info!(
            price = tick.price,
            ma = snapshot.moving_average,
            slope = ?snapshot.moving_average_slope,
            tsi = ?snapshot.oscillator_value,
            ma_falling = falling,
            tsi_below_threshold = weak,
            "price crossed below moving average"
        );

        if !(falling && weak) {
            return None;
        }
        if let Some(pending) = &self.pending {
            tracing::debug!(?pending, "entry suppressed while order in flight");
            return None;
        }

        let intent = Intent::EntryShort {
            price: tick.price,
            time: tick.timestamp,
        };
        tracing::info!(price = tick.price, "entry short signal");
        self.pending = Some(intent.clone());
        Some(intent)
    }

    /// Bar-close exit evaluation. Only acts while short with a defined stop.
    pub fn on_bar_close(&mut self, bar: &Bar, snapshot: Option<&IndicatorSnapshot>) -> Option<Intent> {
        if !self.state.is_short() || self.pending.is_some() {
            return None;
        }
        let stop = snapshot?.stop_value?;

        if bar.high < stop {
            return None;
        }

        tracing::info!(high = bar.high, stop, "exit short signal: bar high reached stop");
        let intent = Intent::ExitShort {
            bar_high: bar.high,
            stop,
            time: bar.start_time,
        };
        self.pending = Some(intent.clone());
        Some(intent)
    }

    /// Resolve the in-flight order. Only a fill moves the state machine.
    pub fn apply_fill(&mut self, result: &FillResult, time: NaiveDateTime) -> FillOutcome {
        let Some(intent) = self.pending.take() else {
            tracing::warn!(status = ?result.status, "fill result with no order in flight");
            return FillOutcome::NoPendingOrder;
        };

        if !result.is_filled() {
            tracing::warn!(side = %intent.side(), status = ?result.status, "order not filled");
            return FillOutcome::NotFilled {
                intent,
                status: result.status,
            };
        }

        let fill_price = result.avg_fill_price.unwrap_or_else(|| {
            tracing::warn!("fill reported without price, using trigger price");
            intent.reference_price()
        });

        match (&intent, self.state.clone()) {
            (Intent::EntryShort { .. }, PositionState::Flat) => {
                tracing::info!(quantity = self.quantity, price = fill_price, "SELL filled");
                self.state = PositionState::Short {
                    entry_price: fill_price,
                    entry_time: time,
                };
                FillOutcome::Entered {
                    entry_price: fill_price,
                }
            }
            (
                Intent::ExitShort { .. },
                PositionState::Short {
                    entry_price,
                    entry_time,
                },
            ) => {
                let trade =
                    ClosedTrade::new(self.quantity, entry_price, fill_price, entry_time, time);
                tracing::info!(
                    quantity = self.quantity,
                    price = fill_price,
                    pnl = trade.pnl,
                    "BUY filled, short closed"
                );
                self.state = PositionState::Flat;
                FillOutcome::Exited(trade)
            }
            (_, state) => {
                tracing::error!(?intent, ?state, "fill does not match position state");
                FillOutcome::Mismatched {
                    intent: intent.clone(),
                    state,
                }
            }
        }
    }
}
