//! Signal decision engine.
//!
//! Two rule sets share one entry point, [`decide`]:
//!
//! - Breakout: Donchian breakout on the trigger timeframe, gated by ATR
//!   volatility and confirmed by the side of the trend-timeframe EMA.
//! - Confluence: EMA cross + MACD histogram + RSI on one timeframe, gated by
//!   ATR volatility.
//!
//! The volatility gate is evaluated first in both modes and short-circuits to
//! `flat`. Missing or non-finite inputs compare as false, never as errors.

use crate::domain::bar::Bar;
use crate::domain::indicator::{self as keys, IndicatorKind, IndicatorRequest};
use crate::domain::trend::TrendContext;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Long,
    Short,
    Flat,
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bias::Long => write!(f, "long"),
            Bias::Short => write!(f, "short"),
            Bias::Flat => write!(f, "flat"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Reason {
    #[serde(rename = "don-breakout-long")]
    DonBreakoutLong,
    #[serde(rename = "don-breakout-short")]
    DonBreakoutShort,
    #[serde(rename = "volatility-gate")]
    VolatilityGate,
    #[serde(rename = "trend-momentum-long")]
    TrendMomentumLong,
    #[serde(rename = "trend-momentum-short")]
    TrendMomentumShort,
    #[serde(rename = "vol-gate")]
    VolGate,
    #[serde(rename = "no-setup")]
    NoSetup,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::DonBreakoutLong => "don-breakout-long",
            Reason::DonBreakoutShort => "don-breakout-short",
            Reason::VolatilityGate => "volatility-gate",
            Reason::TrendMomentumLong => "trend-momentum-long",
            Reason::TrendMomentumShort => "trend-momentum-short",
            Reason::VolGate => "vol-gate",
            Reason::NoSetup => "no-setup",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub bias: Bias,
    pub reason: Reason,
}

impl Decision {
    fn flat(reason: Reason) -> Self {
        Self {
            bias: Bias::Flat,
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutParams {
    pub donchian_period: usize,
    pub atr_period: usize,
    pub atr_min_pct: f64,
    pub trend_ema_period: usize,
    pub slope_epsilon: f64,
}

impl Default for BreakoutParams {
    fn default() -> Self {
        Self {
            donchian_period: 20,
            atr_period: 14,
            atr_min_pct: 0.003,
            trend_ema_period: 200,
            slope_epsilon: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfluenceParams {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub macd_epsilon: f64,
    pub rsi_period: usize,
    pub rsi_high: f64,
    pub rsi_low: f64,
    pub atr_period: usize,
    pub atr_min_pct: f64,
}

impl Default for ConfluenceParams {
    fn default() -> Self {
        Self {
            ema_fast: 20,
            ema_slow: 50,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            macd_epsilon: 0.0,
            rsi_period: 14,
            rsi_high: 55.0,
            rsi_low: 45.0,
            atr_period: 14,
            atr_min_pct: 0.003,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecisionMode {
    Breakout(BreakoutParams),
    Confluence(ConfluenceParams),
}

impl DecisionMode {
    pub fn name(&self) -> &'static str {
        match self {
            DecisionMode::Breakout(_) => "breakout",
            DecisionMode::Confluence(_) => "confluence",
        }
    }

    pub fn uses_trend_timeframe(&self) -> bool {
        matches!(self, DecisionMode::Breakout(_))
    }

    /// Indicators fetched on the trigger timeframe.
    pub fn trigger_requests(&self) -> Vec<IndicatorRequest> {
        match self {
            DecisionMode::Breakout(p) => vec![
                IndicatorRequest::closed(keys::DONCHIAN, IndicatorKind::Donchian(p.donchian_period)),
                IndicatorRequest::closed(keys::ATR, IndicatorKind::Atr(p.atr_period)),
                IndicatorRequest::new(keys::PRICE, IndicatorKind::Price),
                IndicatorRequest::new(keys::CANDLE, IndicatorKind::Candle),
            ],
            DecisionMode::Confluence(p) => vec![
                IndicatorRequest::new(keys::CANDLE, IndicatorKind::Candle),
                IndicatorRequest::new(keys::EMA_FAST, IndicatorKind::Ema(p.ema_fast)),
                IndicatorRequest::new(keys::EMA_SLOW, IndicatorKind::Ema(p.ema_slow)),
                IndicatorRequest::new(
                    keys::MACD,
                    IndicatorKind::Macd {
                        fast: p.macd_fast,
                        slow: p.macd_slow,
                        signal: p.macd_signal,
                    },
                ),
                IndicatorRequest::new(keys::RSI, IndicatorKind::Rsi(p.rsi_period)),
                IndicatorRequest::new(keys::ATR, IndicatorKind::Atr(p.atr_period)),
            ],
        }
    }

    /// Indicators fetched on the trend timeframe; empty for single-timeframe modes.
    pub fn trend_requests(&self) -> Vec<IndicatorRequest> {
        match self {
            DecisionMode::Breakout(p) => vec![IndicatorRequest::new(
                keys::TREND_EMA,
                IndicatorKind::Ema(p.trend_ema_period),
            )],
            DecisionMode::Confluence(_) => vec![],
        }
    }

    /// Trigger-series keys the rules read; a snapshot without them is incomplete.
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            DecisionMode::Breakout(_) => &[keys::ATR, keys::DON_UPPER, keys::DON_LOWER],
            DecisionMode::Confluence(_) => &[
                keys::EMA_FAST,
                keys::EMA_SLOW,
                keys::MACD_HIST,
                keys::RSI,
                keys::ATR,
            ],
        }
    }
}

/// atr / price >= min_pct; fails when either input is missing or price is zero.
pub fn volatility_gate(atr: f64, price: f64, min_pct: f64) -> bool {
    if price == 0.0 || !price.is_finite() || !atr.is_finite() {
        return false;
    }
    atr / price >= min_pct
}

/// Inputs for the breakout rules, NaN where missing.
#[derive(Debug, Clone, Copy)]
pub struct BreakoutInputs {
    pub price: f64,
    pub atr: f64,
    pub don_upper: f64,
    pub don_lower: f64,
}

impl BreakoutInputs {
    pub fn from_bar(bar: &Bar) -> Self {
        Self {
            price: bar.price().unwrap_or(f64::NAN),
            atr: bar.value(keys::ATR).unwrap_or(f64::NAN),
            don_upper: bar.value(keys::DON_UPPER).unwrap_or(f64::NAN),
            don_lower: bar.value(keys::DON_LOWER).unwrap_or(f64::NAN),
        }
    }
}

/// Inputs for the confluence rules, NaN where missing.
#[derive(Debug, Clone, Copy)]
pub struct ConfluenceInputs {
    pub price: f64,
    pub atr: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub macd_hist: f64,
    pub rsi: f64,
}

impl ConfluenceInputs {
    pub fn from_bar(bar: &Bar) -> Self {
        Self {
            price: bar.price().unwrap_or(f64::NAN),
            atr: bar.value(keys::ATR).unwrap_or(f64::NAN),
            ema_fast: bar.value(keys::EMA_FAST).unwrap_or(f64::NAN),
            ema_slow: bar.value(keys::EMA_SLOW).unwrap_or(f64::NAN),
            macd_hist: bar.value(keys::MACD_HIST).unwrap_or(f64::NAN),
            rsi: bar.value(keys::RSI).unwrap_or(f64::NAN),
        }
    }
}

pub fn decide_breakout(
    inputs: &BreakoutInputs,
    trend: Option<&TrendContext>,
    params: &BreakoutParams,
) -> Decision {
    if !volatility_gate(inputs.atr, inputs.price, params.atr_min_pct) {
        return Decision::flat(Reason::VolatilityGate);
    }

    let trend_ema = trend.map_or(f64::NAN, |t| t.ema_now);
    let slope = trend.map_or(0.0, |t| t.slope);
    let slope_ok = slope.abs() >= params.slope_epsilon;

    let up = inputs.price > trend_ema;
    let down = inputs.price < trend_ema;
    let breakout_up = inputs.price >= inputs.don_upper;
    let breakout_down = inputs.price <= inputs.don_lower;

    if slope_ok && up && breakout_up {
        Decision {
            bias: Bias::Long,
            reason: Reason::DonBreakoutLong,
        }
    } else if slope_ok && down && breakout_down {
        Decision {
            bias: Bias::Short,
            reason: Reason::DonBreakoutShort,
        }
    } else {
        Decision::flat(Reason::NoSetup)
    }
}

pub fn decide_confluence(inputs: &ConfluenceInputs, params: &ConfluenceParams) -> Decision {
    if !volatility_gate(inputs.atr, inputs.price, params.atr_min_pct) {
        return Decision::flat(Reason::VolGate);
    }

    let up = inputs.ema_fast > inputs.ema_slow;
    let down = inputs.ema_fast < inputs.ema_slow;
    let bull = inputs.macd_hist > params.macd_epsilon;
    let bear = inputs.macd_hist < -params.macd_epsilon;

    if up && bull && inputs.rsi > params.rsi_high {
        Decision {
            bias: Bias::Long,
            reason: Reason::TrendMomentumLong,
        }
    } else if down && bear && inputs.rsi < params.rsi_low {
        Decision {
            bias: Bias::Short,
            reason: Reason::TrendMomentumShort,
        }
    } else {
        Decision::flat(Reason::NoSetup)
    }
}

/// Evaluates the freshest bar under the configured mode.
///
/// `trend` is ignored by single-timeframe modes.
pub fn decide(fresh: &Bar, trend: Option<&TrendContext>, mode: &DecisionMode) -> Decision {
    let decision = match mode {
        DecisionMode::Breakout(params) => {
            decide_breakout(&BreakoutInputs::from_bar(fresh), trend, params)
        }
        DecisionMode::Confluence(params) => {
            decide_confluence(&ConfluenceInputs::from_bar(fresh), params)
        }
    };
    tracing::debug!(
        mode = mode.name(),
        bias = %decision.bias,
        reason = %decision.reason,
        "decision evaluated"
    );
    decision
}
