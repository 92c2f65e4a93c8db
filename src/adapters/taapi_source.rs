//! TAAPI bulk endpoint indicator source.
//!
//! One POST to `<base_url>/bulk` per timeframe. Every indicator asks for the
//! configured number of recent results with timestamps, so responses arrive
//! in the vector shape.

use crate::adapters::http::{self, AttemptError, RetryPolicy};
use crate::domain::error::FeedError;
use crate::domain::sample::RawIndicatorRecord;
use crate::domain::settings::SourceSettings;
use crate::ports::indicator_source::{FetchRequest, IndicatorSource};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};

#[derive(Debug, Deserialize)]
struct BulkResponse {
    data: Vec<BulkItem>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    id: String,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    errors: Vec<Value>,
}

pub struct TaapiSource {
    client: Client,
    base_url: String,
    secret: String,
    retry: RetryPolicy,
}

impl TaapiSource {
    pub fn new(settings: &SourceSettings, secret: String) -> Result<Self, FeedError> {
        let client = http::build_client(settings.timeout).map_err(|e| FeedError::SourceUnavailable {
            reason: format!("failed to build HTTP client: {e}"),
        })?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            secret,
            retry: RetryPolicy {
                max_attempts: settings.max_attempts,
                delay: settings.retry_delay,
            },
        })
    }

    pub fn bulk_body(secret: &str, request: &FetchRequest) -> Value {
        let indicators: Vec<Value> = request
            .indicators
            .iter()
            .map(|ind| {
                let mut entry = Map::new();
                entry.insert("id".into(), json!(ind.id));
                entry.insert("indicator".into(), json!(ind.kind.endpoint()));
                for (name, value) in ind.kind.params() {
                    entry.insert(name.into(), json!(value));
                }
                entry.insert("backtrack".into(), json!(ind.backtrack));
                if request.results > 1 {
                    entry.insert("results".into(), json!(request.results));
                }
                entry.insert("addResultTimestamp".into(), json!(true));
                Value::Object(entry)
            })
            .collect();

        json!({
            "secret": secret,
            "construct": {
                "exchange": request.exchange,
                "symbol": request.symbol,
                "interval": request.timeframe,
                "indicators": indicators,
            }
        })
    }

    /// Extracts records; items reporting errors are logged and skipped.
    pub fn parse_bulk(body: Value) -> Result<Vec<RawIndicatorRecord>, FeedError> {
        let response: BulkResponse =
            serde_json::from_value(body).map_err(|e| FeedError::SourceUnavailable {
                reason: format!("unexpected bulk response: {e}"),
            })?;

        let mut records = Vec::with_capacity(response.data.len());
        for item in response.data {
            if !item.errors.is_empty() {
                tracing::warn!(id = %item.id, errors = ?item.errors, "indicator returned errors");
                continue;
            }
            records.push(RawIndicatorRecord {
                id: item.id,
                result: item.result,
            });
        }
        Ok(records)
    }
}

impl IndicatorSource for TaapiSource {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<RawIndicatorRecord>, FeedError> {
        let url = format!("{}/bulk", self.base_url);
        let body = Self::bulk_body(&self.secret, request);

        tracing::info!(
            symbol = %request.symbol,
            timeframe = %request.timeframe,
            indicators = request.indicators.len(),
            "fetching indicators"
        );

        let json = self
            .retry
            .run("taapi bulk", |_| {
                let response = http::send(self.client.post(&url).json(&body))?;
                response
                    .json::<Value>()
                    .map_err(|e| AttemptError::Transient(format!("invalid JSON body: {e}")))
            })
            .map_err(|e| FeedError::SourceUnavailable {
                reason: e.message().to_string(),
            })?;

        Self::parse_bulk(json)
    }
}
