//! True Strength Index momentum oscillator.
//!
//! m[i] = C[i] - C[i-1] (undefined at i = 0).
//! TSI = 100 * EMA_fast(EMA_slow(m)) / EMA_fast(EMA_slow(|m|))
//!
//! Each EMA seeds with its first input and then follows
//! ema[i] = ema[i-1] + a * (x[i] - ema[i-1]), a = 2/(n+1).
//! A zero denominator (no movement at all) yields an invalid point.

use crate::domain::bar::Bar;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

/// Incremental exponential smoothing seeded by the first sample.
#[derive(Debug, Clone, Copy)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            alpha: 2.0 / (period as f64 + 1.0),
            value: None,
        }
    }

    pub fn update(&mut self, x: f64) -> f64 {
        let next = match self.value {
            None => x,
            Some(prev) => prev + self.alpha * (x - prev),
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

pub fn calculate_tsi(bars: &[Bar], fast: usize, slow: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Tsi { fast, slow };
    if fast == 0 || slow == 0 || bars.is_empty() {
        return IndicatorSeries::empty(indicator_type);
    }

    let mut num_slow = Ema::new(slow);
    let mut num_fast = Ema::new(fast);
    let mut den_slow = Ema::new(slow);
    let mut den_fast = Ema::new(fast);

    let mut values = Vec::with_capacity(bars.len());
    values.push(IndicatorPoint::invalid(bars[0].start_time));

    for pair in bars.windows(2) {
        let momentum = pair[1].close - pair[0].close;
        let num = num_fast.update(num_slow.update(momentum));
        let den = den_fast.update(den_slow.update(momentum.abs()));

        let tsi = 100.0 * (num / den);
        if den > 0.0 && tsi.is_finite() {
            values.push(IndicatorPoint::valid(pair[1].start_time, tsi.clamp(-100.0, 100.0)));
        } else {
            values.push(IndicatorPoint::invalid(pair[1].start_time));
        }
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}
