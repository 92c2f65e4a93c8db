//! Higher-timeframe trend context.

use crate::domain::bar::BarSeries;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendContext {
    pub ema_now: f64,
    pub ema_previous: Option<f64>,
    pub slope: f64,
}

impl TrendContext {
    /// slope = (now - prev) / prev, 0.0 when prev is zero, absent or non-finite.
    pub fn new(ema_now: f64, ema_previous: Option<f64>) -> Self {
        let slope = match ema_previous {
            Some(prev) if prev != 0.0 && prev.is_finite() && ema_now.is_finite() => {
                (ema_now - prev) / prev
            }
            _ => 0.0,
        };
        Self {
            ema_now,
            ema_previous,
            slope,
        }
    }

    /// Trend EMA from the last bar, previous EMA from the bar before it.
    ///
    /// `None` when the freshest bar carries no finite value for `key`.
    pub fn from_series(series: &BarSeries, key: &str) -> Option<Self> {
        let bars = series.bars();
        let now = bars.last()?.value(key)?;
        let previous = bars
            .len()
            .checked_sub(2)
            .and_then(|i| bars[i].value(key));
        Some(Self::new(now, previous))
    }
}
