//! Short position state and realised trades.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub enum PositionState {
    Flat,
    Short {
        entry_price: f64,
        entry_time: NaiveDateTime,
    },
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }

    pub fn is_short(&self) -> bool {
        matches!(self, PositionState::Short { .. })
    }

    pub fn entry_price(&self) -> Option<f64> {
        match self {
            PositionState::Flat => None,
            PositionState::Short { entry_price, .. } => Some(*entry_price),
        }
    }

    /// Points gained per unit if the short were covered at `price`.
    pub fn unrealized_pnl(&self, price: f64) -> Option<f64> {
        self.entry_price().map(|entry| entry - price)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub quantity: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    /// entry_price - exit_price, in price points per unit.
    pub pnl: f64,
}

impl ClosedTrade {
    pub fn new(
        quantity: f64,
        entry_price: f64,
        exit_price: f64,
        entry_time: NaiveDateTime,
        exit_time: NaiveDateTime,
    ) -> Self {
        ClosedTrade {
            quantity,
            entry_price,
            exit_price,
            entry_time,
            exit_time,
            pnl: entry_price - exit_price,
        }
    }

    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}
