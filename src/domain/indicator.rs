//! Indicator identities and the requests sent to an indicator source.
//!
//! - `IndicatorKind`: indicator identity + parameters
//! - `IndicatorRequest`: a kind bound to the id its results are keyed under
//! - bar keys read by the decision engine

use std::fmt;

pub const PRICE: &str = "price";
pub const ATR: &str = "atr";
pub const DONCHIAN: &str = "don";
pub const DON_UPPER: &str = "don_upper";
pub const DON_LOWER: &str = "don_lower";
pub const EMA_FAST: &str = "ema_fast";
pub const EMA_SLOW: &str = "ema_slow";
pub const RSI: &str = "rsi";
pub const MACD: &str = "macd";
pub const MACD_HIST: &str = "macd_hist";
pub const CANDLE: &str = "candle";
pub const TREND_EMA: &str = "trend_ema";
pub const TREND_SLOPE: &str = "trend_slope";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Price,
    Candle,
    Atr(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Donchian(usize),
}

impl IndicatorKind {
    /// Endpoint name understood by the indicator provider.
    pub fn endpoint(&self) -> &'static str {
        match self {
            IndicatorKind::Price => "price",
            IndicatorKind::Candle => "candle",
            IndicatorKind::Atr(_) => "atr",
            IndicatorKind::Ema(_) => "ema",
            IndicatorKind::Rsi(_) => "rsi",
            IndicatorKind::Macd { .. } => "macd",
            IndicatorKind::Donchian(_) => "donchianchannels",
        }
    }

    /// Numeric parameters as provider-side `(name, value)` pairs.
    pub fn params(&self) -> Vec<(&'static str, usize)> {
        match *self {
            IndicatorKind::Price | IndicatorKind::Candle => vec![],
            IndicatorKind::Atr(period)
            | IndicatorKind::Ema(period)
            | IndicatorKind::Rsi(period)
            | IndicatorKind::Donchian(period) => vec![("period", period)],
            IndicatorKind::Macd { fast, slow, signal } => vec![
                ("optInFastPeriod", fast),
                ("optInSlowPeriod", slow),
                ("optInSignalPeriod", signal),
            ],
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Price => write!(f, "PRICE"),
            IndicatorKind::Candle => write!(f, "CANDLE"),
            IndicatorKind::Atr(period) => write!(f, "ATR({})", period),
            IndicatorKind::Ema(period) => write!(f, "EMA({})", period),
            IndicatorKind::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorKind::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorKind::Donchian(period) => write!(f, "DONCHIAN({})", period),
        }
    }
}

/// One indicator to fetch, keyed by `id` in the merged bars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorRequest {
    pub id: String,
    pub kind: IndicatorKind,
    /// Bars back from the live candle; 1 selects the last closed candle.
    pub backtrack: usize,
}

impl IndicatorRequest {
    pub fn new(id: &str, kind: IndicatorKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            backtrack: 0,
        }
    }

    pub fn closed(id: &str, kind: IndicatorKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            backtrack: 1,
        }
    }
}

impl fmt::Display for IndicatorRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.backtrack > 0 {
            write!(f, "{} = {} [backtrack {}]", self.id, self.kind, self.backtrack)
        } else {
            write!(f, "{} = {}", self.id, self.kind)
        }
    }
}
