//! Configuration validation.
//!
//! Validates every field before the first network call.

use crate::domain::decision::{BreakoutParams, ConfluenceParams, DecisionMode};
use crate::domain::error::FeedError;
use crate::domain::settings::FeedConfig;

pub fn validate_feed_config(config: &FeedConfig) -> Result<(), FeedError> {
    validate_symbol(config)?;
    validate_timeframes(config)?;
    validate_limit(config)?;
    validate_file_name(config)?;
    match &config.mode {
        DecisionMode::Breakout(p) => validate_breakout(p)?,
        DecisionMode::Confluence(p) => validate_confluence(p)?,
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> FeedError {
    FeedError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn missing(section: &str, key: &str) -> FeedError {
    FeedError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn validate_symbol(config: &FeedConfig) -> Result<(), FeedError> {
    if config.symbol.is_empty() {
        return Err(missing("feed", "symbol"));
    }
    if config.exchange.is_empty() {
        return Err(missing("feed", "exchange"));
    }
    Ok(())
}

fn validate_timeframes(config: &FeedConfig) -> Result<(), FeedError> {
    if config.trigger_tf.is_empty() {
        return Err(missing("feed", "trigger_tf"));
    }
    if config.mode.uses_trend_timeframe() && config.trend_tf.is_empty() {
        return Err(missing("feed", "trend_tf"));
    }
    Ok(())
}

fn validate_limit(config: &FeedConfig) -> Result<(), FeedError> {
    let minimum = if config.mode.uses_trend_timeframe() { 2 } else { 1 };
    if config.limit < minimum {
        return Err(invalid(
            "feed",
            "limit",
            &format!("limit must be at least {minimum}"),
        ));
    }
    Ok(())
}

fn validate_file_name(config: &FeedConfig) -> Result<(), FeedError> {
    if config.file_name.is_empty() {
        return Err(missing("feed", "file_name"));
    }
    Ok(())
}

fn validate_period(key: &str, value: usize) -> Result<(), FeedError> {
    if value == 0 {
        return Err(invalid(
            "strategy",
            key,
            &format!("{key} must be a positive integer"),
        ));
    }
    Ok(())
}

fn validate_atr_min_pct(value: f64) -> Result<(), FeedError> {
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "strategy",
            "atr_min_pct",
            "atr_min_pct must be in [0, 1)",
        ));
    }
    Ok(())
}

fn validate_epsilon(key: &str, value: f64) -> Result<(), FeedError> {
    if value < 0.0 || !value.is_finite() {
        return Err(invalid("strategy", key, &format!("{key} must be non-negative")));
    }
    Ok(())
}

fn validate_breakout(p: &BreakoutParams) -> Result<(), FeedError> {
    validate_period("donchian_period", p.donchian_period)?;
    validate_period("atr_period", p.atr_period)?;
    validate_period("trend_ema_period", p.trend_ema_period)?;
    validate_atr_min_pct(p.atr_min_pct)?;
    validate_epsilon("slope_epsilon", p.slope_epsilon)?;
    Ok(())
}

fn validate_confluence(p: &ConfluenceParams) -> Result<(), FeedError> {
    validate_period("ema_fast", p.ema_fast)?;
    validate_period("ema_slow", p.ema_slow)?;
    validate_period("macd_fast", p.macd_fast)?;
    validate_period("macd_slow", p.macd_slow)?;
    validate_period("macd_signal", p.macd_signal)?;
    validate_period("rsi_period", p.rsi_period)?;
    validate_period("atr_period", p.atr_period)?;
    if p.ema_fast >= p.ema_slow {
        return Err(invalid(
            "strategy",
            "ema_fast",
            "ema_fast must be shorter than ema_slow",
        ));
    }
    if p.macd_fast >= p.macd_slow {
        return Err(invalid(
            "strategy",
            "macd_fast",
            "macd_fast must be shorter than macd_slow",
        ));
    }
    validate_epsilon("macd_epsilon", p.macd_epsilon)?;
    validate_atr_min_pct(p.atr_min_pct)?;
    if !(0.0..=100.0).contains(&p.rsi_low) || !(0.0..=100.0).contains(&p.rsi_high) {
        return Err(invalid(
            "strategy",
            "rsi_high",
            "rsi thresholds must be between 0 and 100",
        ));
    }
    if p.rsi_low > p.rsi_high {
        return Err(invalid(
            "strategy",
            "rsi_low",
            "rsi_low must not exceed rsi_high",
        ));
    }
    Ok(())
}
