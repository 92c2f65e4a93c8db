//! Canonical bar representation.

use std::collections::{BTreeMap, BTreeSet};

/// OHLCV fields as delivered alongside an indicator value; any subset may be present.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ohlcv {
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl Ohlcv {
    pub fn is_empty(&self) -> bool {
        self.open.is_none()
            && self.high.is_none()
            && self.low.is_none()
            && self.close.is_none()
            && self.volume.is_none()
    }

    /// Copy each field from `other` only where this one is unset.
    pub fn fill_unset_from(&mut self, other: &Ohlcv) {
        self.open = self.open.or(other.open);
        self.high = self.high.or(other.high);
        self.low = self.low.or(other.low);
        self.close = self.close.or(other.close);
        self.volume = self.volume.or(other.volume);
    }

    pub fn fields(&self) -> [(&'static str, Option<f64>); 5] {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    /// Epoch milliseconds; unique within a series.
    pub timestamp: i64,
    pub ohlcv: Ohlcv,
    pub indicators: BTreeMap<String, f64>,
}

impl Bar {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            ohlcv: Ohlcv::default(),
            indicators: BTreeMap::new(),
        }
    }

    /// Indicator value by key, `None` when absent or non-finite.
    pub fn value(&self, key: &str) -> Option<f64> {
        self.indicators.get(key).copied().filter(|v| v.is_finite())
    }

    /// The `price` indicator, falling back to the candle close.
    pub fn price(&self) -> Option<f64> {
        self.value(crate::domain::indicator::PRICE)
            .or(self.ohlcv.close.filter(|v| v.is_finite()))
    }
}

/// Bars in strictly increasing timestamp order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Sorts by timestamp and keeps the most recent `limit` bars.
    ///
    /// Callers guarantee timestamps are unique.
    pub fn from_bars(mut bars: Vec<Bar>, limit: usize) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        if bars.len() > limit {
            bars.drain(..bars.len() - limit);
        }
        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn bars_mut(&mut self) -> &mut [Bar] {
        &mut self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The freshest bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Union of indicator keys across all bars, sorted.
    pub fn indicator_keys(&self) -> BTreeSet<String> {
        self.bars
            .iter()
            .flat_map(|b| b.indicators.keys().cloned())
            .collect()
    }

    /// Values of one indicator across the series, `None` where absent or non-finite.
    pub fn column(&self, key: &str) -> Vec<Option<f64>> {
        self.bars.iter().map(|b| b.value(key)).collect()
    }
}
