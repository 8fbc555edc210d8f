//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values, one point per bar
//!
//! Every calculator is a pure function over a bar slice. Points that cannot be
//! computed (warmup, zero denominators) are marked invalid instead of faulting.

pub mod psar;
pub mod sma;
pub mod tsi;

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub time: NaiveDateTime,
    pub valid: bool,
    pub value: f64,
}

impl IndicatorPoint {
    pub fn valid(time: NaiveDateTime, value: f64) -> Self {
        Self {
            time,
            valid: true,
            value,
        }
    }

    pub fn invalid(time: NaiveDateTime) -> Self {
        Self {
            time,
            valid: false,
            value: 0.0,
        }
    }

    pub fn get(&self) -> Option<f64> {
        self.valid.then_some(self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    SmaSlope(usize),
    Tsi {
        fast: usize,
        slow: usize,
    },
    Psar {
        af_start_x1000: u32,
        af_max_x1000: u32,
    },
}

impl IndicatorType {
    pub fn psar(af_start: f64, af_max: f64) -> Self {
        IndicatorType::Psar {
            af_start_x1000: (af_start * 1000.0).round() as u32,
            af_max_x1000: (af_max * 1000.0).round() as u32,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        Self {
            indicator_type,
            values: Vec::new(),
        }
    }

    /// Value at the last point, if that point is valid.
    pub fn latest(&self) -> Option<f64> {
        self.values.last().and_then(IndicatorPoint::get)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::SmaSlope(period) => write!(f, "SMA_SLOPE({})", period),
            IndicatorType::Tsi { fast, slow } => write!(f, "TSI({},{})", fast, slow),
            IndicatorType::Psar {
                af_start_x1000,
                af_max_x1000,
            } => {
                let start = *af_start_x1000 as f64 / 1000.0;
                let max = *af_max_x1000 as f64 / 1000.0;
                write!(f, "PSAR({},{})", start, max)
            }
        }
    }
}
