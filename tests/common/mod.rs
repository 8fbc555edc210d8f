#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::collections::VecDeque;
use std::sync::Mutex;
use tsitrader::domain::bar::{Bar, Tick};
use tsitrader::domain::config::StrategyConfig;
use tsitrader::domain::error::TsiTraderError;
use tsitrader::domain::execution::{FillResult, OrderRequest};
use tsitrader::ports::execution_port::ExecutionPort;
use tsitrader::ports::market_data_port::MarketDataPort;

pub fn t(minutes: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 2, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::minutes(minutes)
}

pub fn tick(minutes: i64, price: f64) -> Tick {
    Tick::new(t(minutes), price)
}

/// Small periods so a handful of bars produce a full snapshot.
pub fn small_config() -> StrategyConfig {
    StrategyConfig {
        bar_width_minutes: 5,
        ma_period: 3,
        tsi_fast: 2,
        tsi_slow: 3,
        tsi_threshold: -10.0,
        psar_af_start: 0.02,
        psar_af_max: 0.2,
        quantity: 1.0,
        retention_margin: 10,
        retention_bars: None,
    }
}

/// Six 5-minute bars closing 110, 108, ... 100: falling MA (102), TSI at -100.
pub fn falling_history() -> Vec<Bar> {
    (0..6)
        .map(|i| {
            let close = 110.0 - i as f64 * 2.0;
            Bar {
                start_time: t(5 * i),
                open: close + 1.0,
                high: close + 1.5,
                low: close - 0.5,
                close,
                volume: 0.0,
            }
        })
        .collect()
}

/// Crosses below the MA (entry at 101), rallies to 140 and closes that bar
/// with a tick in the next bucket (exit on bar high 140).
pub fn round_trip_ticks() -> Vec<Tick> {
    vec![
        tick(30, 103.0),
        tick(31, 101.0),
        tick(32, 140.0),
        tick(35, 139.0),
    ]
}

pub struct MockMarketData {
    pub history: Vec<Bar>,
    pub ticks: Vec<Tick>,
    pub fail_after_stream: bool,
}

impl MockMarketData {
    pub fn new(history: Vec<Bar>, ticks: Vec<Tick>) -> Self {
        Self {
            history,
            ticks,
            fail_after_stream: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail_after_stream = true;
        self
    }
}

impl MarketDataPort for MockMarketData {
    fn fetch_history(
        &self,
        _bar_width_minutes: u32,
        _min_bars: usize,
    ) -> Result<Vec<Bar>, TsiTraderError> {
        Ok(self.history.clone())
    }

    fn stream_ticks(&self, sink: Sender<Tick>) -> Result<(), TsiTraderError> {
        for tick in &self.ticks {
            if sink.send(*tick).is_err() {
                return Ok(());
            }
        }
        if self.fail_after_stream {
            return Err(TsiTraderError::Connectivity {
                reason: "mock feed dropped".into(),
            });
        }
        Ok(())
    }

    fn name(&self) -> String {
        "mock".to_string()
    }
}

pub enum Scripted {
    Reply(FillResult),
    /// Keep the order open and never answer.
    Silent,
    /// Drop the sender without answering.
    Disconnect,
}

/// Answers orders from a script; once the script runs out every order fills
/// at its reference price.
pub struct ScriptedGateway {
    script: Mutex<VecDeque<Scripted>>,
    orders: Mutex<Vec<OrderRequest>>,
    held: Mutex<Vec<Sender<FillResult>>>,
}

impl ScriptedGateway {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            orders: Mutex::new(Vec::new()),
            held: Mutex::new(Vec::new()),
        }
    }

    pub fn filling() -> Self {
        Self::new(Vec::new())
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }
}

impl ExecutionPort for ScriptedGateway {
    fn place_market_order(
        &self,
        order: &OrderRequest,
    ) -> Result<Receiver<FillResult>, TsiTraderError> {
        self.orders.lock().unwrap().push(order.clone());
        let (tx, rx) = bounded(1);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(result)) => tx.send(result).unwrap(),
            Some(Scripted::Silent) => self.held.lock().unwrap().push(tx),
            Some(Scripted::Disconnect) => drop(tx),
            None => tx.send(FillResult::filled(order.reference_price)).unwrap(),
        }
        Ok(rx)
    }
}
