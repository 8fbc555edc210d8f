//! Simple Moving Average and its slope.
//!
//! SMA[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are invalid.
//! Slope[i] = SMA[i] - SMA[i-1], valid only where both points are valid.

use crate::domain::bar::Bar;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

pub fn calculate_sma(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Sma(period));
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        sum += bar.close;
        if i >= period {
            sum -= bars[i - period].close;
        }

        if i + 1 < period {
            values.push(IndicatorPoint::invalid(bar.start_time));
        } else {
            values.push(IndicatorPoint::valid(bar.start_time, sum / period as f64));
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}

pub fn calculate_sma_slope(sma: &IndicatorSeries) -> IndicatorSeries {
    let period = match sma.indicator_type {
        IndicatorType::Sma(p) => p,
        _ => 0,
    };

    let values = sma
        .values
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let prev = if i == 0 { None } else { sma.values[i - 1].get() };
            match (prev, point.get()) {
                (Some(prev), Some(curr)) => IndicatorPoint::valid(point.time, curr - prev),
                _ => IndicatorPoint::invalid(point.time),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::SmaSlope(period),
        values,
    }
}
