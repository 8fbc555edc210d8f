//! Bounded series of closed bars.

use std::collections::VecDeque;

use super::bar::Bar;

/// Closed bars in strictly increasing `start_time` order, capped at `retention` bars.
#[derive(Debug, Clone)]
pub struct BarSeries {
    bars: VecDeque<Bar>,
    retention: usize,
}

impl BarSeries {
    pub fn new(retention: usize) -> Self {
        let retention = retention.max(1);
        Self {
            bars: VecDeque::with_capacity(retention + 1),
            retention,
        }
    }

    /// Append a closed bar, evicting the oldest beyond the retention window.
    ///
    /// A bar with the same start time as the latest one replaces it (a live
    /// bar supersedes a partial backfilled bar). Older bars are rejected and
    /// `false` is returned.
    pub fn push(&mut self, bar: Bar) -> bool {
        match self.bars.back_mut() {
            Some(last) if bar.start_time == last.start_time => {
                tracing::debug!(bar_start = %bar.start_time, "replacing bar with same start time");
                *last = bar;
                return true;
            }
            Some(last) if bar.start_time < last.start_time => {
                tracing::warn!(
                    bar_start = %bar.start_time,
                    last_start = %last.start_time,
                    "rejecting bar older than series tail"
                );
                return false;
            }
            _ => {}
        }

        self.bars.push_back(bar);
        while self.bars.len() > self.retention {
            self.bars.pop_front();
        }
        true
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.back()
    }

    /// Contiguous view of the retained bars, oldest first.
    pub fn as_slice(&mut self) -> &[Bar] {
        self.bars.make_contiguous()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn minute(m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, m, 0)
            .unwrap()
    }

    fn bar(m: u32, close: f64) -> Bar {
        Bar::opened_at(minute(m), close)
    }

    #[test]
    fn push_appends_in_order() {
        let mut series = BarSeries::new(10);
        assert!(series.push(bar(0, 1.0)));
        assert!(series.push(bar(5, 2.0)));
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().close, 2.0);
    }

    #[test]
    fn evicts_oldest_beyond_retention() {
        let mut series = BarSeries::new(3);
        for (i, m) in [0, 5, 10, 15, 20].iter().enumerate() {
            series.push(bar(*m, i as f64));
        }
        assert_eq!(series.len(), 3);
        let closes: Vec<f64> = series.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn same_start_replaces_tail() {
        let mut series = BarSeries::new(5);
        series.push(bar(0, 1.0));
        series.push(bar(5, 2.0));
        assert!(series.push(bar(5, 7.0)));
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().close, 7.0);
    }

    #[test]
    fn older_bar_is_rejected() {
        let mut series = BarSeries::new(5);
        series.push(bar(10, 1.0));
        assert!(!series.push(bar(5, 2.0)));
        assert_eq!(series.len(), 1);
        assert_eq!(series.last().unwrap().close, 1.0);
    }

    #[test]
    fn slice_is_oldest_first() {
        let mut series = BarSeries::new(2);
        series.push(bar(0, 1.0));
        series.push(bar(5, 2.0));
        series.push(bar(10, 3.0));
        let slice = series.as_slice();
        assert_eq!(slice[0].start_time, minute(5));
        assert_eq!(slice[1].start_time, minute(10));
    }

    #[test]
    fn zero_retention_is_clamped_to_one() {
        let mut series = BarSeries::new(0);
        series.push(bar(0, 1.0));
        series.push(bar(5, 2.0));
        assert_eq!(series.retention(), 1);
        assert_eq!(series.len(), 1);
    }
}
