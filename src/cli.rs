//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::adapters::csv_market_data::CsvMarketData;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_gateway::PaperGateway;
use crate::domain::config::{DataSettings, ExecutionSettings, LoggingConfig, StrategyConfig};
use crate::domain::config_validation::{validate_execution_config, validate_strategy_config};
use crate::domain::error::TsiTraderError;
use crate::domain::indicator::IndicatorType;
use crate::domain::position::{ClosedTrade, PositionState};
use crate::domain::session::TradingSession;
use crate::logging::init_logging;
use crate::ports::market_data_port::MarketDataPort;
use crate::runner::{self, RunOptions, RunSummary};

#[derive(Parser, Debug)]
#[command(name = "tsitrader", about = "Short-only SMA/TSI/PSAR signal engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Warm up from history and replay ticks through the paper gateway
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [data] history_path
        #[arg(long)]
        history: Option<PathBuf>,
        /// Overrides [data] ticks_path
        #[arg(long)]
        ticks: Option<PathBuf>,
    },
    /// Validate a configuration file and print the resolved values
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the indicator snapshot after warming up from history
    Indicators {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        history: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run {
            config,
            history,
            ticks,
        } => run_engine(&config, history, ticks),
        Command::Validate { config } => run_validate(&config),
        Command::Indicators { config, history } => run_indicators(&config, history),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, TsiTraderError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_strategy_config(&adapter)?;
    validate_execution_config(&adapter)?;
    Ok(adapter)
}

fn resolve_path(
    override_path: Option<PathBuf>,
    configured: Option<PathBuf>,
    key: &str,
) -> Result<PathBuf, TsiTraderError> {
    override_path
        .or(configured)
        .ok_or_else(|| TsiTraderError::ConfigMissing {
            section: "data".into(),
            key: key.into(),
        })
}

/// Process-wide flag raised by Ctrl-C. The handler can only be installed once,
/// so every run shares the same flag.
fn shutdown_flag() -> Arc<AtomicBool> {
    static FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();
    FLAG.get_or_init(|| {
        let flag = Arc::new(AtomicBool::new(false));
        let handler_flag = Arc::clone(&flag);
        if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst)) {
            tracing::warn!(error = %e, "could not install Ctrl-C handler");
        }
        flag
    })
    .clone()
}

fn run_engine(
    config_path: &PathBuf,
    history: Option<PathBuf>,
    ticks: Option<PathBuf>,
) -> Result<(), TsiTraderError> {
    let adapter = load_config(config_path)?;
    init_logging(&LoggingConfig::from_config(&adapter));
    tracing::info!(config = %config_path.display(), "configuration loaded");

    let strategy = StrategyConfig::from_config(&adapter);
    let execution = ExecutionSettings::from_config(&adapter);
    let data = DataSettings::from_config(&adapter);

    let history_path = resolve_path(history, data.history_path, "history_path")?;
    let ticks_path = resolve_path(ticks, data.ticks_path, "ticks_path")?;

    let market_data = CsvMarketData::new(history_path, Some(ticks_path));
    let gateway = PaperGateway::new(execution.slippage_pct, execution.latency);
    let mut session = TradingSession::new(&strategy);
    let shutdown = shutdown_flag();
    shutdown.store(false, Ordering::SeqCst);
    let options = RunOptions {
        order_timeout: execution.order_timeout,
        channel_capacity: data.channel_capacity,
        shutdown: Some(shutdown),
    };

    let summary = runner::run(&mut session, &market_data, &gateway, options)?;
    let last_price = session.in_progress_bar().map(|bar| bar.close);
    for line in summary_lines(&summary, session.closed_trades(), last_price) {
        println!("{line}");
    }
    Ok(())
}

/// `last_price` marks an open short to market; without it only the entry is shown.
fn summary_lines(
    summary: &RunSummary,
    trades: &[ClosedTrade],
    last_price: Option<f64>,
) -> Vec<String> {
    let mut lines = vec![
        format!("Ticks processed: {}", summary.ticks),
        format!("Bars closed:     {}", summary.bars_closed),
        format!("Trades:          {}", summary.trades),
    ];
    for (i, trade) in trades.iter().enumerate() {
        lines.push(format!(
            "  #{:<3} {} -> {}  entry {:.2}  exit {:.2}  pnl {:+.4}",
            i + 1,
            trade.entry_time,
            trade.exit_time,
            trade.entry_price,
            trade.exit_price,
            trade.pnl
        ));
    }
    if !trades.is_empty() {
        let wins = trades.iter().filter(|t| t.is_win()).count();
        lines.push(format!("Wins:            {}/{}", wins, trades.len()));
    }
    lines.push(format!("Total PnL:       {:+.4}", summary.total_pnl));
    let state = &summary.final_state;
    match (state, last_price.and_then(|p| state.unrealized_pnl(p))) {
        (PositionState::Flat, _) => lines.push("Final state:     FLAT".to_string()),
        (PositionState::Short { entry_price, .. }, Some(open_pnl)) => lines.push(format!(
            "Final state:     SHORT @ {:.2}  open pnl {:+.4}",
            entry_price, open_pnl
        )),
        (PositionState::Short { entry_price, .. }, None) => {
            lines.push(format!("Final state:     SHORT @ {:.2}", entry_price))
        }
    }
    lines
}

fn run_validate(config_path: &PathBuf) -> Result<(), TsiTraderError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;

    let strategy = StrategyConfig::from_config(&adapter);
    let execution = ExecutionSettings::from_config(&adapter);
    let data = DataSettings::from_config(&adapter);
    let logging = LoggingConfig::from_config(&adapter);

    println!("[strategy]");
    println!("  bar width:        {} min", strategy.bar_width_minutes);
    println!("  moving average:   {}", IndicatorType::Sma(strategy.ma_period));
    println!(
        "  oscillator:       {} threshold {}",
        IndicatorType::Tsi {
            fast: strategy.tsi_fast,
            slow: strategy.tsi_slow
        },
        strategy.tsi_threshold
    );
    println!(
        "  stop:             {}",
        IndicatorType::psar(strategy.psar_af_start, strategy.psar_af_max)
    );
    println!("  quantity:         {}", strategy.quantity);
    println!("  warm-up bars:     {}", strategy.min_history_bars());
    println!("  retention:        {}", strategy.retention_window());
    println!("[execution]");
    println!("  order timeout:    {:?}", execution.order_timeout);
    println!("  slippage:         {}%", execution.slippage_pct);
    println!("  latency:          {:?}", execution.latency);
    println!("[data]");
    println!("  history:          {}", display_path(&data.history_path));
    println!("  ticks:            {}", display_path(&data.ticks_path));
    println!("  channel capacity: {}", data.channel_capacity);
    println!("[logging]");
    println!("  level:            {}", logging.level);
    println!("  format:           {:?}", logging.format);
    eprintln!("Config is valid");
    Ok(())
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unset>".to_string())
}

fn run_indicators(config_path: &PathBuf, history: Option<PathBuf>) -> Result<(), TsiTraderError> {
    let adapter = load_config(config_path)?;
    init_logging(&LoggingConfig::from_config(&adapter));

    let strategy = StrategyConfig::from_config(&adapter);
    let data = DataSettings::from_config(&adapter);
    let history_path = resolve_path(history, data.history_path, "history_path")?;

    let market_data = CsvMarketData::new(history_path, None);
    let bars = market_data.fetch_history(strategy.bar_width_minutes, strategy.min_history_bars())?;
    if bars.is_empty() {
        return Err(TsiTraderError::NoData {
            source_name: market_data.name(),
        });
    }

    let mut session = TradingSession::new(&strategy);
    session.warm_up(bars);

    let cache = session.cache();
    if let Some(bar) = cache.last_bar() {
        println!("Last closed bar: {} close {:.2}", bar.start_time, bar.close);
    }
    println!("Bars retained:   {}", cache.series().len());
    match session.snapshot() {
        Some(snap) => {
            print_row(
                IndicatorType::Sma(strategy.ma_period),
                Some(snap.moving_average),
            );
            print_row(
                IndicatorType::SmaSlope(strategy.ma_period),
                snap.moving_average_slope,
            );
            print_row(
                IndicatorType::Tsi {
                    fast: strategy.tsi_fast,
                    slow: strategy.tsi_slow,
                },
                snap.oscillator_value,
            );
            print_row(
                IndicatorType::psar(strategy.psar_af_start, strategy.psar_af_max),
                snap.stop_value,
            );
        }
        None => println!(
            "Indicators unavailable: need at least {} bars",
            strategy.ma_period
        ),
    }
    Ok(())
}

fn print_row(indicator: IndicatorType, value: Option<f64>) {
    let value = value
        .map(|v| format!("{:.4}", v))
        .unwrap_or_else(|| "n/a".to_string());
    println!("{:<16} {}", indicator.to_string(), value);
}
