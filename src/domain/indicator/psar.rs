//! Parabolic SAR trend-reversal stop.
//!
//! Seed: SAR[0] = H[0], EP = L[0], uptrend, AF = af_start.
//! Step: SAR = SAR[i-1] + AF * (EP - SAR[i-1]), then
//! - uptrend: capped at min(L[i-1], L[i-2]); flips down when L[i] < SAR
//! - downtrend: floored at max(H[i-1], H[i-2]); flips up when H[i] > SAR
//!
//! On a flip SAR jumps to the prior EP, EP reseeds from the flipping bar and AF
//! resets. A new extreme without a flip bumps AF by af_start, capped at af_max.

use crate::domain::bar::Bar;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

/// Step state for the stop recurrence.
#[derive(Debug, Clone, Copy)]
pub struct PsarState {
    pub sar: f64,
    pub extreme: f64,
    pub af: f64,
    pub trend: Trend,
}

impl PsarState {
    pub fn seed(first: &Bar, af_start: f64) -> Self {
        Self {
            sar: first.high,
            extreme: first.low,
            af: af_start,
            trend: Trend::Up,
        }
    }

    /// Advance one bar. `prev` and `prev2` are the one and two bars before `bar`
    /// (`prev2` falls back to `prev` on the second bar).
    pub fn step(&mut self, bar: &Bar, prev: &Bar, prev2: &Bar, af_start: f64, af_max: f64) {
        let projected = self.sar + self.af * (self.extreme - self.sar);

        match self.trend {
            Trend::Up => {
                self.sar = projected.min(prev.low).min(prev2.low);
                if bar.low < self.sar {
                    self.trend = Trend::Down;
                    self.sar = self.extreme;
                    self.extreme = bar.low;
                    self.af = af_start;
                } else if bar.high > self.extreme {
                    self.extreme = bar.high;
                    self.af = (self.af + af_start).min(af_max);
                }
            }
            Trend::Down => {
                self.sar = projected.max(prev.high).max(prev2.high);
                if bar.high > self.sar {
                    self.trend = Trend::Up;
                    self.sar = self.extreme;
                    self.extreme = bar.high;
                    self.af = af_start;
                } else if bar.low < self.extreme {
                    self.extreme = bar.low;
                    self.af = (self.af + af_start).min(af_max);
                }
            }
        }
    }
}

pub fn calculate_psar(bars: &[Bar], af_start: f64, af_max: f64) -> IndicatorSeries {
    let indicator_type = IndicatorType::psar(af_start, af_max);
    let Some(first) = bars.first() else {
        return IndicatorSeries::empty(indicator_type);
    };

    let mut state = PsarState::seed(first, af_start);
    let mut values = Vec::with_capacity(bars.len());
    values.push(IndicatorPoint::valid(first.start_time, state.sar));

    for i in 1..bars.len() {
        let prev2 = if i >= 2 { &bars[i - 2] } else { &bars[i - 1] };
        state.step(&bars[i], &bars[i - 1], prev2, af_start, af_max);
        values.push(IndicatorPoint::valid(bars[i].start_time, state.sar));
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::make_hl_bars;
    use approx::assert_relative_eq;

    #[test]
    fn seeds_from_first_high() {
        let bars = make_hl_bars(&[(105.0, 95.0)]);
        let series = calculate_psar(&bars, 0.02, 0.2);
        assert_eq!(series.values.len(), 1);
        assert_eq!(series.values[0].get(), Some(105.0));
    }

    #[test]
    fn second_bar_flips_when_low_breaks_capped_stop() {
        // Seed: sar 105, ep 95. Step: 105 + 0.02*(95-105) = 104.8, capped at
        // prev low 95 -> 95. Bar low 94 < 95 => flip down, sar = ep = 95.
        let bars = make_hl_bars(&[(105.0, 95.0), (100.0, 94.0)]);
        let series = calculate_psar(&bars, 0.02, 0.2);
        assert_relative_eq!(series.values[1].value, 95.0);
    }

    #[test]
    fn downtrend_stop_floored_at_recent_highs() {
        let bars = make_hl_bars(&[(105.0, 95.0), (100.0, 94.0), (99.0, 90.0), (98.0, 88.0)]);
        let series = calculate_psar(&bars, 0.02, 0.2);
        // bar 2: downtrend, sar 95 + 0.02*(94-95) = 94.98 floored at max(100, 105) = 105
        assert_relative_eq!(series.values[2].value, 105.0);
        // bar 3: ep fell to 90 on bar 2 (af 0.04); 105 + 0.04*(90-105) = 104.4
        // floored at max(99, 100) = 100 -> 104.4
        assert_relative_eq!(series.values[3].value, 104.4, epsilon = 1e-9);
    }

    #[test]
    fn uptrend_flips_to_downtrend_on_break() {
        let mut bars = vec![(101.0, 99.0), (102.0, 100.0)];
        for i in 0..10 {
            let base = 102.0 + i as f64;
            bars.push((base + 1.0, base - 1.0));
        }
        bars.push((105.0, 80.0));
        let bars = make_hl_bars(&bars);

        let af_start = 0.02;
        let mut state = PsarState::seed(&bars[0], af_start);
        for i in 1..bars.len() {
            let prev2 = if i >= 2 { &bars[i - 2] } else { &bars[i - 1] };
            state.step(&bars[i], &bars[i - 1], prev2, af_start, 0.2);
        }
        assert_eq!(state.trend, Trend::Down);
        assert_relative_eq!(state.extreme, 80.0);
        assert_relative_eq!(state.af, af_start);
    }

    #[test]
    fn acceleration_factor_capped() {
        let mut bars = vec![(11.0, 9.0)];
        // Steadily falling bars keep the downtrend and set new lows every bar.
        for i in 0..40 {
            let base = 9.0 - i as f64 * 0.1;
            bars.push((base + 0.05, base - 0.5));
        }
        let bars = make_hl_bars(&bars);
        let mut state = PsarState::seed(&bars[0], 0.02);
        for i in 1..bars.len() {
            let prev2 = if i >= 2 { &bars[i - 2] } else { &bars[i - 1] };
            state.step(&bars[i], &bars[i - 1], prev2, 0.02, 0.2);
            assert!(state.af <= 0.2 + 1e-12);
        }
        assert_eq!(state.trend, Trend::Down);
        assert_relative_eq!(state.af, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn every_point_is_valid() {
        let bars = make_hl_bars(&[(10.0, 9.0), (11.0, 10.0), (12.0, 10.5), (11.5, 9.5)]);
        let series = calculate_psar(&bars, 0.02, 0.2);
        assert!(series.values.iter().all(|p| p.valid));
    }

    #[test]
    fn empty_bars() {
        assert!(calculate_psar(&[], 0.02, 0.2).values.is_empty());
    }
}
