//! Configuration validation.
//!
//! Validates all config fields before the engine starts.

use crate::domain::error::TsiTraderError;
use crate::ports::config_port::ConfigPort;

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TsiTraderError> {
    validate_bar_width(config)?;
    validate_periods(config)?;
    validate_threshold(config)?;
    validate_acceleration(config)?;
    validate_quantity(config)?;
    validate_retention(config)?;
    Ok(())
}

pub fn validate_execution_config(config: &dyn ConfigPort) -> Result<(), TsiTraderError> {
    let timeout = config.get_int("execution", "order_timeout_ms", 1000);
    if timeout <= 0 {
        return Err(invalid(
            "execution",
            "order_timeout_ms",
            "order_timeout_ms must be positive",
        ));
    }
    let slippage = config.get_double("execution", "slippage_pct", 0.0);
    if slippage < 0.0 {
        return Err(invalid(
            "execution",
            "slippage_pct",
            "slippage_pct must be non-negative",
        ));
    }
    if config.get_int("execution", "latency_ms", 0) < 0 {
        return Err(invalid(
            "execution",
            "latency_ms",
            "latency_ms must be non-negative",
        ));
    }
    if config.get_int("data", "channel_capacity", 1024) <= 0 {
        return Err(invalid(
            "data",
            "channel_capacity",
            "channel_capacity must be positive",
        ));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> TsiTraderError {
    TsiTraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_bar_width(config: &dyn ConfigPort) -> Result<(), TsiTraderError> {
    let width = config.get_int("strategy", "bar_width_minutes", 5);
    if !(1..=60).contains(&width) || 60 % width != 0 {
        return Err(invalid(
            "strategy",
            "bar_width_minutes",
            "bar_width_minutes must divide 60 (1, 2, 3, 4, 5, 6, 10, 12, 15, 20, 30 or 60)",
        ));
    }
    Ok(())
}

fn validate_periods(config: &dyn ConfigPort) -> Result<(), TsiTraderError> {
    for (key, default) in [("ma_period", 70), ("tsi_fast", 13), ("tsi_slow", 25)] {
        if config.get_int("strategy", key, default) < 1 {
            return Err(invalid(
                "strategy",
                key,
                &format!("{} must be at least 1", key),
            ));
        }
    }
    Ok(())
}

fn validate_threshold(config: &dyn ConfigPort) -> Result<(), TsiTraderError> {
    let value = config.get_double("strategy", "tsi_threshold", -10.0);
    if !(-100.0..=100.0).contains(&value) {
        return Err(invalid(
            "strategy",
            "tsi_threshold",
            "tsi_threshold must be between -100 and 100",
        ));
    }
    Ok(())
}

fn validate_acceleration(config: &dyn ConfigPort) -> Result<(), TsiTraderError> {
    let start = config.get_double("strategy", "psar_af_start", 0.02);
    let max = config.get_double("strategy", "psar_af_max", 0.2);
    if start <= 0.0 {
        return Err(invalid(
            "strategy",
            "psar_af_start",
            "psar_af_start must be positive",
        ));
    }
    if max < start {
        return Err(invalid(
            "strategy",
            "psar_af_max",
            "psar_af_max must be at least psar_af_start",
        ));
    }
    Ok(())
}

fn validate_quantity(config: &dyn ConfigPort) -> Result<(), TsiTraderError> {
    let value = config.get_double("strategy", "quantity", 0.1);
    if value <= 0.0 {
        return Err(invalid(
            "strategy",
            "quantity",
            "quantity must be positive",
        ));
    }
    Ok(())
}

fn validate_retention(config: &dyn ConfigPort) -> Result<(), TsiTraderError> {
    if config.get_int("strategy", "retention_margin", 100) < 0 {
        return Err(invalid(
            "strategy",
            "retention_margin",
            "retention_margin must be non-negative",
        ));
    }

    let Some(raw) = config.get_string("strategy", "retention_bars") else {
        return Ok(());
    };
    let ma_period = config.get_int("strategy", "ma_period", 70);
    match raw.trim().parse::<i64>() {
        Ok(bars) if bars > ma_period => Ok(()),
        Ok(_) => Err(invalid(
            "strategy",
            "retention_bars",
            "retention_bars must exceed ma_period",
        )),
        Err(_) => Err(invalid(
            "strategy",
            "retention_bars",
            "retention_bars must be an integer",
        )),
    }
}
