//! Order requests, fill results and fill-price helpers.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Sell,
    Buy,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Sell => write!(f, "SELL"),
            OrderSide::Buy => write!(f, "BUY"),
        }
    }
}

/// A market order submitted to the execution gateway.
///
/// `reference_price` is the price that triggered the intent; live venues
/// ignore it, simulated gateways fill around it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub side: OrderSide,
    pub quantity: f64,
    pub reference_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStatus {
    Filled,
    Rejected,
    Pending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillResult {
    pub status: FillStatus,
    pub avg_fill_price: Option<f64>,
}

impl FillResult {
    pub fn filled(price: f64) -> Self {
        Self {
            status: FillStatus::Filled,
            avg_fill_price: Some(price),
        }
    }

    pub fn rejected() -> Self {
        Self {
            status: FillStatus::Rejected,
            avg_fill_price: None,
        }
    }

    /// Not confirmed within the order timeout.
    pub fn pending() -> Self {
        Self {
            status: FillStatus::Pending,
            avg_fill_price: None,
        }
    }

    pub fn is_filled(&self) -> bool {
        self.status == FillStatus::Filled
    }
}

/// Short entry (sell short): execution_price = market_price * (1 - slippage_pct / 100)
pub fn apply_slippage_short_entry(market_price: f64, slippage_pct: f64) -> f64 {
    market_price * (1.0 - slippage_pct / 100.0)
}

/// Short exit (buy to cover): execution_price = market_price * (1 + slippage_pct / 100)
pub fn apply_slippage_short_exit(market_price: f64, slippage_pct: f64) -> f64 {
    market_price * (1.0 + slippage_pct / 100.0)
}

/// Adverse fill price for a market order on either side.
pub fn apply_slippage(side: OrderSide, market_price: f64, slippage_pct: f64) -> f64 {
    match side {
        OrderSide::Sell => apply_slippage_short_entry(market_price, slippage_pct),
        OrderSide::Buy => apply_slippage_short_exit(market_price, slippage_pct),
    }
}
