//! Typed engine configuration resolved from a [`ConfigPort`].
//!
//! Values are read with defaults matching the reference BTC 5-minute setup;
//! call [`crate::domain::config_validation`] first to reject bad input.

use std::path::PathBuf;
use std::time::Duration;

use crate::ports::config_port::ConfigPort;

pub const DEFAULT_RETENTION_MARGIN: usize = 100;

/// Pure numeric parameters consumed by the aggregator, cache and engine.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub bar_width_minutes: u32,
    pub ma_period: usize,
    pub tsi_fast: usize,
    pub tsi_slow: usize,
    pub tsi_threshold: f64,
    pub psar_af_start: f64,
    pub psar_af_max: f64,
    pub quantity: f64,
    pub retention_margin: usize,
    pub retention_bars: Option<usize>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            bar_width_minutes: 5,
            ma_period: 70,
            tsi_fast: 13,
            tsi_slow: 25,
            tsi_threshold: -10.0,
            psar_af_start: 0.02,
            psar_af_max: 0.2,
            quantity: 0.1,
            retention_margin: DEFAULT_RETENTION_MARGIN,
            retention_bars: None,
        }
    }
}

impl StrategyConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let d = StrategyConfig::default();
        StrategyConfig {
            bar_width_minutes: config.get_int("strategy", "bar_width_minutes", d.bar_width_minutes as i64)
                as u32,
            ma_period: config.get_int("strategy", "ma_period", d.ma_period as i64) as usize,
            tsi_fast: config.get_int("strategy", "tsi_fast", d.tsi_fast as i64) as usize,
            tsi_slow: config.get_int("strategy", "tsi_slow", d.tsi_slow as i64) as usize,
            tsi_threshold: config.get_double("strategy", "tsi_threshold", d.tsi_threshold),
            psar_af_start: config.get_double("strategy", "psar_af_start", d.psar_af_start),
            psar_af_max: config.get_double("strategy", "psar_af_max", d.psar_af_max),
            quantity: config.get_double("strategy", "quantity", d.quantity),
            retention_margin: config.get_int(
                "strategy",
                "retention_margin",
                d.retention_margin as i64,
            ) as usize,
            retention_bars: config
                .get_string("strategy", "retention_bars")
                .and_then(|s| s.trim().parse::<usize>().ok()),
        }
    }

    /// Bars that must be backfilled before live data is trusted.
    pub fn min_history_bars(&self) -> usize {
        self.ma_period + self.tsi_slow + self.retention_margin
    }

    /// Closed bars kept for indicator recomputation.
    pub fn retention_window(&self) -> usize {
        self.retention_bars.unwrap_or_else(|| self.min_history_bars())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSettings {
    pub order_timeout: Duration,
    pub slippage_pct: f64,
    pub latency: Duration,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        ExecutionSettings {
            order_timeout: Duration::from_millis(1000),
            slippage_pct: 0.0,
            latency: Duration::ZERO,
        }
    }
}

impl ExecutionSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        ExecutionSettings {
            order_timeout: config.get_millis("execution", "order_timeout_ms", 1000),
            slippage_pct: config.get_double("execution", "slippage_pct", 0.0),
            latency: config.get_millis("execution", "latency_ms", 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub history_path: Option<PathBuf>,
    pub ticks_path: Option<PathBuf>,
    pub channel_capacity: usize,
}

impl DataSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        DataSettings {
            history_path: config.get_string("data", "history_path").map(PathBuf::from),
            ticks_path: config.get_string("data", "ticks_path").map(PathBuf::from),
            channel_capacity: config.get_int("data", "channel_capacity", 1024).max(1) as usize,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let format = match config
            .get_string("logging", "format")
            .map(|s| s.trim().to_lowercase())
            .as_deref()
        {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        LoggingConfig {
            level: config
                .get_string("logging", "level")
                .unwrap_or_else(|| "info".to_string()),
            format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    #[test]
    fn defaults_when_sections_missing() {
        let adapter = FileConfigAdapter::from_string("[strategy]\n").unwrap();
        let cfg = StrategyConfig::from_config(&adapter);
        assert_eq!(cfg, StrategyConfig::default());
        assert_eq!(cfg.min_history_bars(), 70 + 25 + 100);
        assert_eq!(cfg.retention_window(), 195);
    }

    #[test]
    fn reads_strategy_values() {
        let adapter = FileConfigAdapter::from_string(
            "[strategy]\nbar_width_minutes = 15\nma_period = 20\ntsi_fast = 5\ntsi_slow = 8\n\
             tsi_threshold = -25\npsar_af_start = 0.01\npsar_af_max = 0.1\nquantity = 2\n\
             retention_margin = 10\n",
        )
        .unwrap();
        let cfg = StrategyConfig::from_config(&adapter);
        assert_eq!(cfg.bar_width_minutes, 15);
        assert_eq!(cfg.ma_period, 20);
        assert_eq!(cfg.tsi_fast, 5);
        assert_eq!(cfg.tsi_slow, 8);
        assert_eq!(cfg.tsi_threshold, -25.0);
        assert_eq!(cfg.psar_af_start, 0.01);
        assert_eq!(cfg.psar_af_max, 0.1);
        assert_eq!(cfg.quantity, 2.0);
        assert_eq!(cfg.retention_window(), 38);
    }

    #[test]
    fn explicit_retention_overrides_margin() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nretention_bars = 500\n").unwrap();
        assert_eq!(StrategyConfig::from_config(&adapter).retention_window(), 500);
    }

    #[test]
    fn execution_settings_in_millis() {
        let adapter = FileConfigAdapter::from_string(
            "[execution]\norder_timeout_ms = 250\nslippage_pct = 0.1\nlatency_ms = 5\n",
        )
        .unwrap();
        let exec = ExecutionSettings::from_config(&adapter);
        assert_eq!(exec.order_timeout, Duration::from_millis(250));
        assert_eq!(exec.slippage_pct, 0.1);
        assert_eq!(exec.latency, Duration::from_millis(5));
    }

    #[test]
    fn data_settings_paths() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\nhistory_path = /tmp/h.csv\nticks_path = /tmp/t.csv\n",
        )
        .unwrap();
        let data = DataSettings::from_config(&adapter);
        assert_eq!(data.history_path, Some(PathBuf::from("/tmp/h.csv")));
        assert_eq!(data.ticks_path, Some(PathBuf::from("/tmp/t.csv")));
        assert_eq!(data.channel_capacity, 1024);
    }

    #[test]
    fn logging_format_parsing() {
        let adapter =
            FileConfigAdapter::from_string("[logging]\nlevel = debug\nformat = JSON\n").unwrap();
        let logging = LoggingConfig::from_config(&adapter);
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.format, LogFormat::Json);

        let adapter = FileConfigAdapter::from_string("[logging]\n").unwrap();
        assert_eq!(LoggingConfig::from_config(&adapter), LoggingConfig::default());
    }
}
