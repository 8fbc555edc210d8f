//! Execution gateway port.

use crossbeam_channel::Receiver;

use crate::domain::error::TsiTraderError;
use crate::domain::execution::{FillResult, OrderRequest};

pub trait ExecutionPort {
    /// Submit a market order. The returned receiver yields exactly one
    /// `FillResult`; if it disconnects without one the gateway connection is
    /// considered lost.
    fn place_market_order(
        &self,
        order: &OrderRequest,
    ) -> Result<Receiver<FillResult>, TsiTraderError>;
}
