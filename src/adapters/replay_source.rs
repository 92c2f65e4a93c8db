//! JSON fixture indicator source for offline runs.
//!
//! File layout: `{ "<timeframe>": [ {"id": ..., "result": {...}}, ... ] }`.

use crate::domain::error::FeedError;
use crate::domain::sample::RawIndicatorRecord;
use crate::ports::indicator_source::{FetchRequest, IndicatorSource};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub struct ReplaySource {
    batches: HashMap<String, Vec<RawIndicatorRecord>>,
}

impl ReplaySource {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| FeedError::SourceUnavailable {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, FeedError> {
        let batches = serde_json::from_str(content).map_err(|e| FeedError::SourceUnavailable {
            reason: format!("invalid replay file: {e}"),
        })?;
        Ok(Self { batches })
    }
}

impl IndicatorSource for ReplaySource {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<RawIndicatorRecord>, FeedError> {
        let records = self
            .batches
            .get(&request.timeframe)
            .cloned()
            .unwrap_or_default();
        tracing::info!(
            timeframe = %request.timeframe,
            records = records.len(),
            "replaying indicator batch"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn request(timeframe: &str) -> FetchRequest {
        FetchRequest {
            exchange: "binance".into(),
            symbol: "BTC/USDT".into(),
            timeframe: timeframe.into(),
            indicators: vec![],
            results: 50,
        }
    }

    const FIXTURE: &str = r#"{
        "15m": [{"id": "atr", "result": {"value": 1.0, "timestamp": 1700000000}}],
        "4h": [{"id": "trend_ema", "result": {"value": [94.0, 95.0], "timestamp": [1699985600, 1700000000]}}]
    }"#;

    #[test]
    fn returns_batch_for_timeframe() {
        let source = ReplaySource::from_json(FIXTURE).unwrap();
        let records = source.fetch(&request("4h")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "trend_ema");
    }

    #[test]
    fn unknown_timeframe_is_empty() {
        let source = ReplaySource::from_json(FIXTURE).unwrap();
        assert!(source.fetch(&request("1d")).unwrap().is_empty());
    }

    #[test]
    fn from_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();
        let source = ReplaySource::from_file(file.path()).unwrap();
        assert_eq!(source.fetch(&request("15m")).unwrap().len(), 1);
    }

    #[test]
    fn invalid_file_is_source_unavailable() {
        assert!(matches!(
            ReplaySource::from_json("not json"),
            Err(FeedError::SourceUnavailable { .. })
        ));
        assert!(ReplaySource::from_file("/nonexistent/replay.json").is_err());
    }
}
