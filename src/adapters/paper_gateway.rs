//! Simulated execution venue: every market order fills at the reference price
//! moved against the trader by `slippage_pct`, optionally after a delay.

use crossbeam_channel::{bounded, Receiver};
use std::thread;
use std::time::Duration;

use crate::domain::error::TsiTraderError;
use crate::domain::execution::{apply_slippage, FillResult, OrderRequest};
use crate::ports::execution_port::ExecutionPort;

#[derive(Debug, Clone)]
pub struct PaperGateway {
    slippage_pct: f64,
    latency: Duration,
}

impl PaperGateway {
    pub fn new(slippage_pct: f64, latency: Duration) -> Self {
        Self {
            slippage_pct,
            latency,
        }
    }
}

impl ExecutionPort for PaperGateway {
    fn place_market_order(
        &self,
        order: &OrderRequest,
    ) -> Result<Receiver<FillResult>, TsiTraderError> {
        if !order.reference_price.is_finite() || order.quantity <= 0.0 {
            tracing::warn!(?order, "paper gateway rejecting malformed order");
            let (tx, rx) = bounded(1);
            let _ = tx.send(FillResult::rejected());
            return Ok(rx);
        }

        let price = apply_slippage(order.side, order.reference_price, self.slippage_pct);
        let (tx, rx) = bounded(1);
        tracing::debug!(
            side = %order.side,
            quantity = order.quantity,
            reference = order.reference_price,
            fill = price,
            "paper order accepted"
        );

        if self.latency.is_zero() {
            let _ = tx.send(FillResult::filled(price));
        } else {
            let latency = self.latency;
            thread::Builder::new()
                .name("paper-fill".into())
                .spawn(move || {
                    thread::sleep(latency);
                    // Receiver may have given up after its timeout.
                    let _ = tx.send(FillResult::filled(price));
                })?;
        }
        Ok(rx)
    }
}
