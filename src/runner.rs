//! Event loop driving a [`TradingSession`] from a market data source and an
//! execution gateway.
//!
//! One producer thread pushes ticks into a bounded channel; the calling thread
//! is the only consumer and owns the session. While an order is in flight the
//! loop keeps ingesting ticks and waits on the fill receiver with a deadline.

use chrono::NaiveDateTime;
use crossbeam_channel::{after, bounded, never, select, tick, Receiver, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::domain::bar::Tick;
use crate::domain::error::TsiTraderError;
use crate::domain::execution::FillResult;
use crate::domain::position::PositionState;
use crate::domain::session::TradingSession;
use crate::domain::signal_engine::{FillOutcome, Intent};
use crate::ports::execution_port::ExecutionPort;
use crate::ports::market_data_port::MarketDataPort;

const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub order_timeout: Duration,
    pub channel_capacity: usize,
    /// Set to `true` from another thread to stop ingesting ticks.
    pub shutdown: Option<Arc<AtomicBool>>,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            order_timeout: Duration::from_millis(1000),
            channel_capacity: 1024,
            shutdown: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks: usize,
    pub bars_closed: usize,
    pub trades: usize,
    pub total_pnl: f64,
    pub final_state: PositionState,
}

struct InFlight {
    intent: Intent,
    fills: Receiver<FillResult>,
    deadline: Receiver<std::time::Instant>,
}

/// Warm up `session` from history, then replay the tick stream until it ends
/// or shutdown is requested.
pub fn run(
    session: &mut TradingSession,
    market_data: &dyn MarketDataPort,
    gateway: &dyn ExecutionPort,
    options: RunOptions,
) -> Result<RunSummary, TsiTraderError> {
    warm_up(session, market_data)?;

    let (tx, rx) = bounded(options.channel_capacity.max(1));
    tracing::info!(source = %market_data.name(), "starting tick stream");

    thread::scope(|scope| {
        let producer = scope.spawn(move || market_data.stream_ticks(tx));

        let consumed = consume(session, gateway, rx, &options);

        let produced = producer.join().map_err(|_| TsiTraderError::Connectivity {
            reason: format!("{} tick producer panicked", market_data.name()),
        })?;
        let ticks = consumed?;
        if let Err(e) = produced {
            tracing::error!(error = %e, "tick stream failed");
            return Err(e);
        }

        Ok(RunSummary {
            ticks,
            bars_closed: session.bars_closed(),
            trades: session.closed_trades().len(),
            total_pnl: session.total_pnl(),
            final_state: session.state().clone(),
        })
    })
}

fn warm_up(
    session: &mut TradingSession,
    market_data: &dyn MarketDataPort,
) -> Result<(), TsiTraderError> {
    let wanted = session.cache().params().retention;
    let history = market_data.fetch_history(session.bar_width_minutes(), wanted)?;
    if history.is_empty() {
        return Err(TsiTraderError::NoData {
            source_name: market_data.name(),
        });
    }
    let ma_period = session.cache().params().ma_period;
    if history.len() < ma_period {
        tracing::warn!(
            bars = history.len(),
            ma_period,
            "history shorter than the moving-average period; no decisions until enough bars close"
        );
    }
    session.warm_up(history);
    Ok(())
}

/// Consumer loop. Returns the number of ticks received. Dropping `ticks` on
/// return hangs up the producer.
fn consume(
    session: &mut TradingSession,
    gateway: &dyn ExecutionPort,
    ticks: Receiver<Tick>,
    options: &RunOptions,
) -> Result<usize, TsiTraderError> {
    let mut stream_open = true;
    let mut received = 0usize;
    let mut in_flight: Option<InFlight> = None;
    let poll = match options.shutdown {
        Some(_) => tick(SHUTDOWN_POLL),
        None => never(),
    };

    loop {
        if shutdown_requested(options) {
            if let Some(f) = &in_flight {
                tracing::warn!(intent = ?f.intent, "shutdown with order in flight");
            }
            tracing::info!(ticks = received, "shutdown requested, stopping ingestion");
            break;
        }
        if !stream_open && in_flight.is_none() {
            tracing::info!(ticks = received, "tick stream ended");
            break;
        }

        // A fill that is already waiting is applied before the next tick.
        if let Some(f) = &in_flight {
            match f.fills.try_recv() {
                Ok(result) => {
                    if let Some(f) = in_flight.take() {
                        resolve_fill(session, f, Some(result))?;
                    }
                    continue;
                }
                Err(TryRecvError::Disconnected) => {
                    if let Some(f) = in_flight.take() {
                        resolve_fill(session, f, None)?;
                    }
                }
                Err(TryRecvError::Empty) => {}
            }
        }

        let tick_rx = if stream_open { ticks.clone() } else { never() };
        let fills = in_flight
            .as_ref()
            .map(|f| f.fills.clone())
            .unwrap_or_else(never);
        let deadline = in_flight
            .as_ref()
            .map(|f| f.deadline.clone())
            .unwrap_or_else(never);

        select! {
            recv(tick_rx) -> msg => match msg {
                Ok(t) => {
                    received += 1;
                    for intent in session.on_tick(t) {
                        if let Some(f) = &in_flight {
                            tracing::warn!(?intent, pending = ?f.intent, "dropping intent while order in flight");
                            continue;
                        }
                        in_flight = Some(submit(gateway, intent, session.quantity(), options)?);
                    }
                }
                Err(_) => stream_open = false,
            },
            recv(fills) -> msg => {
                if let Some(f) = in_flight.take() {
                    resolve_fill(session, f, msg.ok())?;
                }
            },
            recv(deadline) -> _ => {
                if let Some(f) = in_flight.take() {
                    tracing::warn!(
                        intent = ?f.intent,
                        timeout_ms = options.order_timeout.as_millis() as u64,
                        "order not confirmed before timeout"
                    );
                    let time = fill_time(session, &f.intent);
                    log_outcome(&session.apply_fill(&FillResult::pending(), time));
                }
            },
            recv(poll) -> _ => {},
        }
    }
    Ok(received)
}

/// Apply the gateway's answer; `None` means the gateway hung up without one.
fn resolve_fill(
    session: &mut TradingSession,
    in_flight: InFlight,
    result: Option<FillResult>,
) -> Result<(), TsiTraderError> {
    let Some(result) = result else {
        tracing::error!(intent = ?in_flight.intent, "gateway dropped the order without a result");
        return Err(TsiTraderError::Connectivity {
            reason: "execution gateway disconnected".into(),
        });
    };
    let time = fill_time(session, &in_flight.intent);
    log_outcome(&session.apply_fill(&result, time));
    Ok(())
}

fn submit(
    gateway: &dyn ExecutionPort,
    intent: Intent,
    quantity: f64,
    options: &RunOptions,
) -> Result<InFlight, TsiTraderError> {
    let order = intent.order(quantity);
    tracing::info!(
        side = %order.side,
        quantity = order.quantity,
        reference = order.reference_price,
        "submitting market order"
    );
    let fills = gateway.place_market_order(&order).inspect_err(|e| {
        tracing::error!(error = %e, "order submission failed");
    })?;
    Ok(InFlight {
        intent,
        fills,
        deadline: after(options.order_timeout),
    })
}

fn fill_time(session: &TradingSession, intent: &Intent) -> NaiveDateTime {
    session.last_tick_time().unwrap_or(match intent {
        Intent::EntryShort { time, .. } | Intent::ExitShort { time, .. } => *time,
    })
}

fn log_outcome(outcome: &FillOutcome) {
    match outcome {
        FillOutcome::Entered { entry_price } => {
            tracing::info!(entry_price, "position is now SHORT")
        }
        FillOutcome::Exited(trade) => tracing::info!(
            entry = trade.entry_price,
            exit = trade.exit_price,
            pnl = trade.pnl,
            "position is now FLAT"
        ),
        FillOutcome::NotFilled { status, .. } => {
            tracing::warn!(?status, "order not filled, position unchanged")
        }
        FillOutcome::Mismatched { intent, state } => {
            tracing::error!(?intent, ?state, "fill ignored, intent does not match position")
        }
        FillOutcome::NoPendingOrder => {}
    }
}

fn shutdown_requested(options: &RunOptions) -> bool {
    options
        .shutdown
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::SeqCst))
}
