//! Snapshot builder: the single document published per run.

use crate::domain::bar::{Bar, BarSeries};
use crate::domain::decision::{Bias, Decision, Reason};
use crate::domain::error::FeedError;
use crate::domain::indicator::{TREND_EMA, TREND_SLOPE};
use crate::domain::settings::FeedConfig;
use crate::domain::trend::TrendContext;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Top-level keys an indicator may not shadow when flattened.
const RESERVED_KEYS: [&str; 17] = [
    "timestamp",
    "datetime_utc",
    "symbol",
    "granularity",
    "price",
    "high",
    "low",
    "vol",
    "finalBias",
    "biasReason",
    "last_candles",
    "settings",
    "funding_rate",
    "open_interest",
    "order_book",
    "ttl_sec",
    "generated_at",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleRow {
    pub ts: i64,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub timestamp: i64,
    pub datetime_utc: String,
    pub symbol: String,
    pub granularity: String,
    pub price: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub vol: Option<f64>,
    #[serde(flatten)]
    pub indicators: BTreeMap<String, Option<f64>>,
    #[serde(rename = "finalBias")]
    pub final_bias: Bias,
    #[serde(rename = "biasReason")]
    pub bias_reason: Reason,
    pub last_candles: Vec<CandleRow>,
    pub settings: BTreeMap<String, Value>,
    pub funding_rate: Option<f64>,
    pub open_interest: Option<f64>,
    pub order_book: Option<Value>,
    pub ttl_sec: u64,
    pub generated_at: String,
}

impl Snapshot {
    pub fn to_json_pretty(&self) -> Result<String, FeedError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// NaN and infinities never reach the document.
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn iso_millis(ts: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ts).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn candle_row(bar: &Bar, keys: &[String]) -> CandleRow {
    let mut fields: BTreeMap<String, Option<f64>> = bar
        .ohlcv
        .fields()
        .into_iter()
        .map(|(name, v)| (name.to_string(), finite(v)))
        .collect();
    for key in keys {
        fields
            .entry(key.clone())
            .or_insert_with(|| bar.value(key));
    }
    CandleRow {
        ts: bar.timestamp,
        fields,
    }
}

/// Everything a snapshot is assembled from.
pub struct SnapshotInput<'a> {
    pub config: &'a FeedConfig,
    pub series: &'a BarSeries,
    pub trend: Option<&'a TrendContext>,
    pub decision: Decision,
    pub generated_at: DateTime<Utc>,
}

pub fn build_snapshot(input: SnapshotInput<'_>) -> Result<Snapshot, FeedError> {
    let SnapshotInput {
        config,
        series,
        trend,
        decision,
        generated_at,
    } = input;

    let missing = |field: &str| FeedError::MissingField {
        field: field.to_string(),
    };

    let symbol = config.published_symbol();
    if symbol.is_empty() {
        return Err(missing("symbol"));
    }
    if config.trigger_tf.is_empty() {
        return Err(missing("granularity"));
    }

    let fresh = series.last().ok_or_else(|| missing("timestamp"))?;
    let datetime_utc = iso_millis(fresh.timestamp).ok_or_else(|| missing("datetime_utc"))?;

    let known = series.indicator_keys();
    for key in config.mode.required_keys() {
        if !known.contains(*key) {
            return Err(missing(key));
        }
    }

    let row_keys: Vec<String> = known.into_iter().collect();
    let keys: Vec<&String> = row_keys
        .iter()
        .filter(|k| !RESERVED_KEYS.contains(&k.as_str()))
        .collect();

    let mut indicators: BTreeMap<String, Option<f64>> =
        keys.iter().map(|k| ((*k).clone(), fresh.value(k))).collect();
    if config.mode.uses_trend_timeframe() {
        indicators.insert(TREND_EMA.to_string(), trend.and_then(|t| finite(Some(t.ema_now))));
        indicators.insert(TREND_SLOPE.to_string(), trend.and_then(|t| finite(Some(t.slope))));
    }

    let last_candles = series
        .bars()
        .iter()
        .map(|b| candle_row(b, &row_keys))
        .collect();

    Ok(Snapshot {
        timestamp: fresh.timestamp,
        datetime_utc,
        symbol,
        granularity: config.trigger_tf.clone(),
        price: finite(fresh.price()),
        high: finite(fresh.ohlcv.high),
        low: finite(fresh.ohlcv.low),
        vol: finite(fresh.ohlcv.volume),
        indicators,
        final_bias: decision.bias,
        bias_reason: decision.reason,
        last_candles,
        settings: config.settings_map(),
        funding_rate: None,
        open_interest: None,
        order_book: None,
        ttl_sec: config.ttl_sec,
        generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}
