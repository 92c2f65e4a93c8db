//! Indicator ingestion shapes.
//!
//! Raw records arrive either as a single timestamped observation (scalar) or
//! as parallel arrays covering the most recent N points (vector). Both are
//! classified once into [`IndicatorPayload`] and flattened into
//! [`IndicatorSample`]s; nothing downstream branches on shape.

use crate::domain::bar::Ohlcv;
use crate::domain::error::FeedError;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Timestamp field names, in lookup order.
const TIMESTAMP_FIELDS: [&str; 4] = ["timestampMs", "ts", "timestamp", "time"];
const OHLCV_FIELDS: [&str; 5] = ["open", "high", "low", "close", "volume"];
const IGNORED_FIELDS: [&str; 1] = ["backtrack"];

/// Integer timestamps below this are epoch seconds.
const SECONDS_CUTOFF: i64 = 100_000_000_000;

/// One indicator result as returned by a source, shape unknown.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawIndicatorRecord {
    pub id: String,
    pub result: Value,
}

impl RawIndicatorRecord {
    pub fn new(id: &str, result: Value) -> Self {
        Self {
            id: id.to_string(),
            result,
        }
    }
}

/// One normalised observation. `value` is `None` for OHLCV-only records.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSample {
    pub timestamp: i64,
    pub indicator_id: String,
    pub value: Option<f64>,
    pub ohlcv: Ohlcv,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarSample {
    pub id: String,
    pub timestamp: i64,
    pub outputs: Vec<(String, f64)>,
    pub ohlcv: Ohlcv,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorSample {
    pub id: String,
    pub timestamps: Vec<i64>,
    pub outputs: Vec<(String, Vec<Option<f64>>)>,
    pub ohlcv: Vec<(&'static str, Vec<Option<f64>>)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorPayload {
    Scalar(ScalarSample),
    Vector(VectorSample),
}

impl IndicatorPayload {
    pub fn classify(record: &RawIndicatorRecord) -> Result<Self, FeedError> {
        let malformed = |reason: &str| FeedError::MalformedShape {
            id: record.id.clone(),
            reason: reason.to_string(),
        };

        let obj = record
            .result
            .as_object()
            .ok_or_else(|| malformed("result is not an object"))?;

        let ts_value = TIMESTAMP_FIELDS
            .iter()
            .find_map(|f| obj.get(*f))
            .ok_or_else(|| malformed("no timestamp field"))?;

        match ts_value {
            Value::Array(items) => {
                let timestamps = items
                    .iter()
                    .map(parse_timestamp)
                    .collect::<Option<Vec<i64>>>()
                    .ok_or_else(|| malformed("non-integer entry in timestamp array"))?;
                Self::vector(&record.id, obj, timestamps).ok_or_else(|| malformed("no data arrays"))
            }
            other => {
                let timestamp =
                    parse_timestamp(other).ok_or_else(|| malformed("timestamp is not an integer"))?;
                Self::scalar(&record.id, obj, timestamp)
                    .ok_or_else(|| malformed("no numeric value or OHLCV fields"))
            }
        }
    }

    fn scalar(id: &str, obj: &Map<String, Value>, timestamp: i64) -> Option<Self> {
        let mut outputs = Vec::new();
        let mut ohlcv = Ohlcv::default();

        for (field, value) in obj {
            if is_timestamp(field) || IGNORED_FIELDS.contains(&field.as_str()) {
                continue;
            }
            if let Some(slot) = ohlcv_slot(&mut ohlcv, field) {
                *slot = value.as_f64();
                continue;
            }
            match value {
                Value::Object(members) if field == "value" => {
                    for (member, v) in members {
                        if let Some(n) = v.as_f64() {
                            outputs.push((output_key(id, member), n));
                        }
                    }
                }
                _ => {
                    if let Some(n) = value.as_f64() {
                        outputs.push((output_key(id, field), n));
                    }
                }
            }
        }

        if outputs.is_empty() && ohlcv.is_empty() {
            return None;
        }
        Some(IndicatorPayload::Scalar(ScalarSample {
            id: id.to_string(),
            timestamp,
            outputs,
            ohlcv,
        }))
    }

    fn vector(id: &str, obj: &Map<String, Value>, timestamps: Vec<i64>) -> Option<Self> {
        let mut outputs = Vec::new();
        let mut ohlcv = Vec::new();

        for (field, value) in obj {
            if is_timestamp(field) || IGNORED_FIELDS.contains(&field.as_str()) {
                continue;
            }
            let items = match value {
                Value::Array(items) => items,
                Value::Object(members) if field == "value" => {
                    for (member, v) in members {
                        if let Value::Array(items) = v {
                            let column = items.iter().map(Value::as_f64).collect();
                            outputs.push((output_key(id, member), column));
                        }
                    }
                    continue;
                }
                _ => continue,
            };
            let column: Vec<Option<f64>> = items.iter().map(Value::as_f64).collect();
            if let Some(name) = OHLCV_FIELDS.iter().find(|f| **f == field.as_str()) {
                ohlcv.push((*name, column));
            } else {
                outputs.push((output_key(id, field), column));
            }
        }

        if outputs.is_empty() && ohlcv.is_empty() {
            return None;
        }
        Some(IndicatorPayload::Vector(VectorSample {
            id: id.to_string(),
            timestamps,
            outputs,
            ohlcv,
        }))
    }

    /// Flattens the payload into per-timestamp samples.
    pub fn into_samples(self) -> Vec<IndicatorSample> {
        match self {
            IndicatorPayload::Scalar(s) => contributions(&s.id, s.timestamp, s.outputs, s.ohlcv),
            IndicatorPayload::Vector(v) => {
                let mut samples = Vec::new();
                for (i, &timestamp) in v.timestamps.iter().enumerate() {
                    let mut ohlcv = Ohlcv::default();
                    for (name, column) in &v.ohlcv {
                        if let Some(slot) = ohlcv_slot(&mut ohlcv, name) {
                            *slot = column.get(i).copied().flatten();
                        }
                    }
                    let outputs: Vec<(String, f64)> = v
                        .outputs
                        .iter()
                        .filter_map(|(key, column)| {
                            column.get(i).copied().flatten().map(|n| (key.clone(), n))
                        })
                        .collect();
                    if outputs.is_empty() && ohlcv.is_empty() {
                        continue;
                    }
                    samples.extend(contributions(&v.id, timestamp, outputs, ohlcv));
                }
                samples
            }
        }
    }
}

fn contributions(
    id: &str,
    timestamp: i64,
    outputs: Vec<(String, f64)>,
    ohlcv: Ohlcv,
) -> Vec<IndicatorSample> {
    if outputs.is_empty() {
        return vec![IndicatorSample {
            timestamp,
            indicator_id: id.to_string(),
            value: None,
            ohlcv,
        }];
    }
    outputs
        .into_iter()
        .map(|(key, value)| IndicatorSample {
            timestamp,
            indicator_id: key,
            value: Some(value),
            ohlcv,
        })
        .collect()
}

/// Classifies and flattens a batch; malformed records are logged and dropped.
pub fn normalize_records(records: &[RawIndicatorRecord]) -> Vec<IndicatorSample> {
    let mut samples = Vec::new();
    for record in records {
        match IndicatorPayload::classify(record) {
            Ok(payload) => samples.extend(payload.into_samples()),
            Err(e) => tracing::warn!(error = %e, "dropping indicator record"),
        }
    }
    samples
}

fn is_timestamp(field: &str) -> bool {
    TIMESTAMP_FIELDS.contains(&field)
}

fn ohlcv_slot<'a>(ohlcv: &'a mut Ohlcv, field: &str) -> Option<&'a mut Option<f64>> {
    match field {
        "open" => Some(&mut ohlcv.open),
        "high" => Some(&mut ohlcv.high),
        "low" => Some(&mut ohlcv.low),
        "close" => Some(&mut ohlcv.close),
        "volume" => Some(&mut ohlcv.volume),
        _ => None,
    }
}

fn parse_timestamp(value: &Value) -> Option<i64> {
    let raw = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        })?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    if raw.abs() < SECONDS_CUTOFF {
        Some(raw * 1000)
    } else {
        Some(raw)
    }
}

/// Bar key for an output field of indicator `id`.
///
/// `value` maps to `id`; `valueXyz` and other fields map to `id_<snake>`
/// unless the snake form already carries the `id` prefix.
pub fn output_key(id: &str, field: &str) -> String {
    if field == "value" {
        return id.to_string();
    }
    let suffix = field.strip_prefix("value").filter(|s| !s.is_empty()).unwrap_or(field);
    let snake = to_snake_case(suffix);
    if snake == id || snake.starts_with(&format!("{id}_")) {
        snake
    } else {
        format!("{id}_{snake}")
    }
}

fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase() || prev.is_ascii_digit() || (prev.is_ascii_uppercase() && next_lower)
            {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}
