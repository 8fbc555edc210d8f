//! Event loop tests: warm-up, order round trips, non-fills and fatal errors.

mod common;

use approx::assert_relative_eq;
use common::*;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tsitrader::adapters::paper_gateway::PaperGateway;
use tsitrader::domain::error::TsiTraderError;
use tsitrader::domain::execution::{FillResult, OrderSide};
use tsitrader::domain::position::PositionState;
use tsitrader::domain::session::TradingSession;
use tsitrader::runner::{run, RunOptions};

fn options(timeout_ms: u64) -> RunOptions {
    RunOptions {
        order_timeout: Duration::from_millis(timeout_ms),
        channel_capacity: 8,
        shutdown: None,
    }
}

mod round_trips {
    use super::*;

    #[test]
    fn entry_then_exit_records_one_trade() {
        let mut session = TradingSession::new(&small_config());
        let data = MockMarketData::new(falling_history(), round_trip_ticks());
        let gateway = ScriptedGateway::filling();

        let summary = run(&mut session, &data, &gateway, options(1000)).unwrap();

        assert_eq!(summary.ticks, 4);
        assert_eq!(summary.bars_closed, 1);
        assert_eq!(summary.trades, 1);
        assert_eq!(summary.final_state, PositionState::Flat);
        assert_relative_eq!(summary.total_pnl, 101.0 - 140.0, epsilon = 1e-9);

        let orders = gateway.orders();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].side, OrderSide::Sell);
        assert_eq!(orders[0].reference_price, 101.0);
        assert_eq!(orders[1].side, OrderSide::Buy);
        assert_eq!(orders[1].reference_price, 140.0);

        let trade = &session.closed_trades()[0];
        assert_eq!(trade.entry_time, t(31));
        assert_eq!(trade.exit_time, t(35));
    }

    #[test]
    fn paper_gateway_slippage_flows_into_pnl() {
        let mut session = TradingSession::new(&small_config());
        let data = MockMarketData::new(falling_history(), round_trip_ticks());
        let gateway = PaperGateway::new(1.0, Duration::ZERO);

        let summary = run(&mut session, &data, &gateway, options(1000)).unwrap();

        assert_eq!(summary.trades, 1);
        let trade = &session.closed_trades()[0];
        assert_relative_eq!(trade.entry_price, 99.99, epsilon = 1e-9);
        assert_relative_eq!(trade.exit_price, 141.4, epsilon = 1e-9);
        assert_relative_eq!(summary.total_pnl, 99.99 - 141.4, epsilon = 1e-9);
    }

    #[test]
    fn paper_gateway_with_latency_still_fills() {
        let mut session = TradingSession::new(&small_config());
        let data = MockMarketData::new(falling_history(), round_trip_ticks()[..2].to_vec());
        let gateway = PaperGateway::new(0.0, Duration::from_millis(20));

        let summary = run(&mut session, &data, &gateway, options(5000)).unwrap();

        assert_eq!(summary.final_state.entry_price(), Some(101.0));
    }

    #[test]
    fn position_left_open_when_stream_ends_short() {
        let mut session = TradingSession::new(&small_config());
        let data = MockMarketData::new(falling_history(), round_trip_ticks()[..2].to_vec());
        let gateway = ScriptedGateway::filling();

        let summary = run(&mut session, &data, &gateway, options(1000)).unwrap();

        assert!(summary.final_state.is_short());
        assert_eq!(summary.trades, 0);
    }
}

mod non_fills {
    use super::*;

    #[test]
    fn rejected_entry_keeps_position_flat() {
        let mut session = TradingSession::new(&small_config());
        let data = MockMarketData::new(falling_history(), round_trip_ticks()[..2].to_vec());
        let gateway = ScriptedGateway::new(vec![Scripted::Reply(FillResult::rejected())]);

        let summary = run(&mut session, &data, &gateway, options(1000)).unwrap();

        assert_eq!(summary.final_state, PositionState::Flat);
        assert_eq!(gateway.orders().len(), 1);
        assert!(session.engine().pending().is_none());
    }

    #[test]
    fn unanswered_order_times_out_as_pending() {
        let mut session = TradingSession::new(&small_config());
        let data = MockMarketData::new(falling_history(), round_trip_ticks()[..2].to_vec());
        let gateway = ScriptedGateway::new(vec![Scripted::Silent]);

        let summary = run(&mut session, &data, &gateway, options(30)).unwrap();

        assert_eq!(summary.final_state, PositionState::Flat);
        assert!(session.engine().pending().is_none());
    }

    #[test]
    fn entry_can_retry_after_rejection() {
        let mut session = TradingSession::new(&small_config());
        let ticks = vec![
            tick(30, 103.0),
            tick(31, 101.0),
            tick(32, 103.0),
            tick(33, 101.5),
        ];
        let data = MockMarketData::new(falling_history(), ticks);
        let gateway = ScriptedGateway::new(vec![Scripted::Reply(FillResult::rejected())]);

        let summary = run(&mut session, &data, &gateway, options(1000)).unwrap();

        assert_eq!(gateway.orders().len(), 2);
        assert_eq!(summary.final_state.entry_price(), Some(101.5));
    }
}

mod failures {
    use super::*;

    #[test]
    fn empty_history_is_no_data() {
        let mut session = TradingSession::new(&small_config());
        let data = MockMarketData::new(Vec::new(), round_trip_ticks());
        let gateway = ScriptedGateway::filling();

        let err = run(&mut session, &data, &gateway, options(1000)).unwrap_err();
        assert!(matches!(err, TsiTraderError::NoData { .. }));
        assert!(gateway.orders().is_empty());
    }

    #[test]
    fn short_history_runs_without_decisions() {
        let mut session = TradingSession::new(&small_config());
        let data = MockMarketData::new(falling_history()[..2].to_vec(), round_trip_ticks());
        let gateway = ScriptedGateway::filling();

        let summary = run(&mut session, &data, &gateway, options(1000)).unwrap();

        assert!(gateway.orders().is_empty());
        assert_eq!(summary.ticks, 4);
        assert_eq!(summary.final_state, PositionState::Flat);
    }

    #[test]
    fn producer_error_is_fatal() {
        let mut session = TradingSession::new(&small_config());
        let data = MockMarketData::new(falling_history(), vec![tick(30, 103.0)]).failing();
        let gateway = ScriptedGateway::filling();

        let err = run(&mut session, &data, &gateway, options(1000)).unwrap_err();
        assert!(matches!(err, TsiTraderError::Connectivity { .. }));
    }

    #[test]
    fn gateway_disconnect_is_fatal() {
        let mut session = TradingSession::new(&small_config());
        let data = MockMarketData::new(falling_history(), round_trip_ticks());
        let gateway = ScriptedGateway::new(vec![Scripted::Disconnect]);

        let err = run(&mut session, &data, &gateway, options(1000)).unwrap_err();
        assert!(matches!(err, TsiTraderError::Connectivity { .. }));
    }

    #[test]
    fn nan_ticks_are_counted_but_ignored() {
        let mut session = TradingSession::new(&small_config());
        let ticks = vec![tick(30, f64::NAN), tick(31, f64::NAN)];
        let data = MockMarketData::new(falling_history(), ticks);
        let gateway = ScriptedGateway::filling();

        let summary = run(&mut session, &data, &gateway, options(1000)).unwrap();

        assert_eq!(summary.ticks, 2);
        assert!(session.in_progress_bar().is_none());
    }
}

mod shutdown {
    use super::*;

    #[test]
    fn preset_flag_stops_before_ingesting() {
        let mut session = TradingSession::new(&small_config());
        let data = MockMarketData::new(falling_history(), round_trip_ticks());
        let gateway = ScriptedGateway::filling();
        let opts = RunOptions {
            shutdown: Some(Arc::new(AtomicBool::new(true))),
            ..options(1000)
        };

        let summary = run(&mut session, &data, &gateway, opts).unwrap();

        assert_eq!(summary.ticks, 0);
        assert!(gateway.orders().is_empty());
        // Warm-up still happened.
        assert!(session.snapshot().is_some());
    }
}
