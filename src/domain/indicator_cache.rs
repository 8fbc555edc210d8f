//! Indicator snapshot maintained over the retained bar series.
//!
//! Every closed bar triggers a full recompute over the retention window. The
//! window bounds the cost; the EMA and PSAR recurrences could be carried
//! forward incrementally if that ever matters.

use super::bar::Bar;
use super::bar_series::BarSeries;
use super::config::StrategyConfig;
use super::indicator::psar::calculate_psar;
use super::indicator::sma::{calculate_sma, calculate_sma_slope};
use super::indicator::tsi::calculate_tsi;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub ma_period: usize,
    pub tsi_fast: usize,
    pub tsi_slow: usize,
    pub psar_af_start: f64,
    pub psar_af_max: f64,
    pub retention: usize,
}

impl From<&StrategyConfig> for IndicatorParams {
    fn from(cfg: &StrategyConfig) -> Self {
        IndicatorParams {
            ma_period: cfg.ma_period,
            tsi_fast: cfg.tsi_fast,
            tsi_slow: cfg.tsi_slow,
            psar_af_start: cfg.psar_af_start,
            psar_af_max: cfg.psar_af_max,
            retention: cfg.retention_window(),
        }
    }
}

/// Indicator values as of the last closed bar.
///
/// The moving average is always defined when a snapshot exists; the other
/// fields are `None` when undefined and must be treated as "no signal".
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub moving_average: f64,
    pub moving_average_slope: Option<f64>,
    pub oscillator_value: Option<f64>,
    pub stop_value: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct IndicatorCache {
    params: IndicatorParams,
    series: BarSeries,
    snapshot: Option<IndicatorSnapshot>,
}

impl IndicatorCache {
    pub fn new(params: IndicatorParams) -> Self {
        let series = BarSeries::new(params.retention);
        Self {
            params,
            series,
            snapshot: None,
        }
    }

    /// Load backfilled bars, then recompute once.
    pub fn seed<I: IntoIterator<Item = Bar>>(&mut self, bars: I) {
        for bar in bars {
            self.series.push(bar);
        }
        self.recompute();
    }

    /// Append a freshly closed bar and recompute the snapshot.
    pub fn on_bar_closed(&mut self, bar: Bar) -> Option<&IndicatorSnapshot> {
        if self.series.push(bar) {
            self.recompute();
        }
        self.snapshot.as_ref()
    }

    pub fn current_snapshot(&self) -> Option<&IndicatorSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    pub fn last_bar(&self) -> Option<&Bar> {
        self.series.last()
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    fn recompute(&mut self) {
        if self.series.len() < self.params.ma_period {
            self.snapshot = None;
            return;
        }

        let p = &self.params;
        let bars = self.series.as_slice();
        let sma = calculate_sma(bars, p.ma_period);
        let slope = calculate_sma_slope(&sma);
        let tsi = calculate_tsi(bars, p.tsi_fast, p.tsi_slow);
        let psar = calculate_psar(bars, p.psar_af_start, p.psar_af_max);

        self.snapshot = sma.latest().map(|moving_average| IndicatorSnapshot {
            moving_average,
            moving_average_slope: slope.latest(),
            oscillator_value: tsi.latest(),
            stop_value: psar.latest(),
        });

        if let Some(s) = &self.snapshot {
            tracing::debug!(
                ma = s.moving_average,
                slope = ?s.moving_average_slope,
                tsi = ?s.oscillator_value,
                sar = ?s.stop_value,
                bars = self.series.len(),
                "indicators updated"
            );
        }
    }
}
