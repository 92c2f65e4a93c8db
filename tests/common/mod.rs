#![allow(dead_code)]

use biasfeed::adapters::file_config_adapter::FileConfigAdapter;
use biasfeed::domain::error::FeedError;
use biasfeed::domain::sample::RawIndicatorRecord;
use biasfeed::domain::settings::FeedConfig;
use biasfeed::domain::snapshot::Snapshot;
use biasfeed::ports::indicator_source::{FetchRequest, IndicatorSource};
use biasfeed::ports::publisher::Publisher;
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::HashMap;

/// Trigger-bar timestamp shared by the fixtures, in seconds.
pub const T0: i64 = 1_700_000_100;
pub const M15: i64 = 15 * 60;
pub const H4: i64 = 4 * 60 * 60;

pub struct FakeIndicatorSource {
    pub batches: HashMap<String, Vec<RawIndicatorRecord>>,
    pub errors: HashMap<String, String>,
    pub requests: RefCell<Vec<FetchRequest>>,
}

impl FakeIndicatorSource {
    pub fn new() -> Self {
        Self {
            batches: HashMap::new(),
            errors: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_batch(mut self, timeframe: &str, records: Vec<RawIndicatorRecord>) -> Self {
        self.batches.insert(timeframe.to_string(), records);
        self
    }

    pub fn with_error(mut self, timeframe: &str, reason: &str) -> Self {
        self.errors.insert(timeframe.to_string(), reason.to_string());
        self
    }

    pub fn requested_timeframes(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|r| r.timeframe.clone())
            .collect()
    }
}

impl IndicatorSource for FakeIndicatorSource {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<RawIndicatorRecord>, FeedError> {
        self.requests.borrow_mut().push(request.clone());
        if let Some(reason) = self.errors.get(&request.timeframe) {
            return Err(FeedError::SourceUnavailable {
                reason: reason.clone(),
            });
        }
        Ok(self
            .batches
            .get(&request.timeframe)
            .cloned()
            .unwrap_or_default())
    }
}

pub struct RecordingPublisher {
    pub published: RefCell<Vec<Snapshot>>,
    pub fail_with: Option<String>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            published: RefCell::new(Vec::new()),
            fail_with: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            published: RefCell::new(Vec::new()),
            fail_with: Some(reason.to_string()),
        }
    }

    pub fn count(&self) -> usize {
        self.published.borrow().len()
    }

    pub fn last_json(&self) -> Value {
        let published = self.published.borrow();
        let snapshot = published.last().expect("nothing published");
        serde_json::to_value(snapshot).unwrap()
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, snapshot: &Snapshot) -> Result<String, FeedError> {
        if let Some(reason) = &self.fail_with {
            return Err(FeedError::PublishFailure {
                reason: reason.clone(),
            });
        }
        self.published.borrow_mut().push(snapshot.clone());
        Ok(format!("memory://{}", snapshot.generated_at))
    }
}

pub fn feed_config(ini: &str) -> FeedConfig {
    let adapter = FileConfigAdapter::from_string(ini).unwrap();
    FeedConfig::from_port(&adapter).unwrap()
}

pub fn record(id: &str, result: Value) -> RawIndicatorRecord {
    RawIndicatorRecord::new(id, result)
}

pub fn candle(ts: i64, close: f64) -> RawIndicatorRecord {
    record(
        "candle",
        json!({
            "timestamp": ts,
            "open": close - 0.5,
            "high": close + 1.0,
            "low": close - 1.0,
            "close": close,
            "volume": 1200.0
        }),
    )
}

/// Breakout trigger batch: the fresh bar carries price, the closed bar
/// carries Donchian and ATR (backtrack 1).
pub fn breakout_trigger(price: f64, atr: f64, upper: f64, lower: f64) -> Vec<RawIndicatorRecord> {
    let closed = T0 - M15;
    vec![
        record(
            "don",
            json!({"value": {"upper": upper, "lower": lower}, "timestamp": closed, "backtrack": 1}),
        ),
        record("atr", json!({"value": atr, "timestamp": closed, "backtrack": 1})),
        record("price", json!({"value": price, "timestamp": T0})),
        candle(closed, upper - 1.0),
        candle(T0, price),
    ]
}

/// Trend batch in the vector shape: two 4h EMA points ending at `ema_now`.
pub fn trend_batch(ema_previous: f64, ema_now: f64) -> Vec<RawIndicatorRecord> {
    vec![record(
        "trend_ema",
        json!({"value": [ema_previous, ema_now], "timestamp": [T0 - H4, T0]}),
    )]
}

pub fn confluence_trigger(
    close: f64,
    ema_fast: f64,
    ema_slow: f64,
    macd_hist: f64,
    rsi: f64,
    atr: f64,
) -> Vec<RawIndicatorRecord> {
    vec![
        candle(T0, close),
        record("ema_fast", json!({"value": ema_fast, "timestamp": T0})),
        record("ema_slow", json!({"value": ema_slow, "timestamp": T0})),
        record(
            "macd",
            json!({
                "valueMACD": 1.0,
                "valueMACDSignal": 1.0 - macd_hist,
                "valueMACDHist": macd_hist,
                "timestamp": T0
            }),
        ),
        record("rsi", json!({"value": rsi, "timestamp": T0})),
        record("atr", json!({"value": atr, "timestamp": T0})),
    ]
}

/// Records as they appear in a replay fixture file.
pub fn replay_batch(records: &[RawIndicatorRecord]) -> Value {
    Value::Array(
        records
            .iter()
            .map(|r| json!({"id": r.id, "result": r.result}))
            .collect(),
    )
}
