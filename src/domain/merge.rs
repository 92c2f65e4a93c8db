//! Bar merger.
//!
//! Attributes every sample to exactly one bar keyed by timestamp. Indicator
//! values are written per key; OHLCV fields are first-writer-wins because
//! every indicator repeats the same candle and the earliest source is kept.

use crate::domain::bar::{Bar, BarSeries};
use crate::domain::error::FeedError;
use crate::domain::sample::{IndicatorSample, RawIndicatorRecord, normalize_records};
use std::collections::BTreeMap;

/// Identifies the series being merged, for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct MergeTarget<'a> {
    pub symbol: &'a str,
    pub timeframe: &'a str,
}

/// Merges normalised samples into a series capped at `limit` bars.
pub fn merge_samples<'s, I>(
    samples: I,
    limit: usize,
    target: MergeTarget<'_>,
) -> Result<BarSeries, FeedError>
where
    I: IntoIterator<Item = &'s IndicatorSample>,
{
    let mut bars: BTreeMap<i64, Bar> = BTreeMap::new();

    for sample in samples {
        let bar = bars
            .entry(sample.timestamp)
            .or_insert_with(|| Bar::new(sample.timestamp));
        if let Some(value) = sample.value {
            bar.indicators.insert(sample.indicator_id.clone(), value);
        }
        bar.ohlcv.fill_unset_from(&sample.ohlcv);
    }

    if bars.is_empty() {
        return Err(FeedError::NoUsableData {
            symbol: target.symbol.to_string(),
            timeframe: target.timeframe.to_string(),
        });
    }

    let series = BarSeries::from_bars(bars.into_values().collect(), limit);
    tracing::debug!(
        symbol = target.symbol,
        timeframe = target.timeframe,
        bars = series.len(),
        "merged indicator samples"
    );
    Ok(series)
}

/// Classifies raw records of either shape and merges them.
pub fn merge_records(
    records: &[RawIndicatorRecord],
    limit: usize,
    target: MergeTarget<'_>,
) -> Result<BarSeries, FeedError> {
    let samples = normalize_records(records);
    merge_samples(&samples, limit, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Ohlcv;
    use serde_json::json;

    const TARGET: MergeTarget<'static> = MergeTarget {
        symbol: "BTC/USDT",
        timeframe: "15m",
    };

    fn sample(ts: i64, id: &str, value: f64) -> IndicatorSample {
        IndicatorSample {
            timestamp: ts,
            indicator_id: id.to_string(),
            value: Some(value),
            ohlcv: Ohlcv::default(),
        }
    }

    #[test]
    fn one_bar_per_timestamp() {
        let samples = vec![
            sample(2_000, "atr", 1.0),
            sample(1_000, "atr", 0.9),
            sample(2_000, "rsi", 55.0),
        ];
        let series = merge_samples(&samples, 10, TARGET).unwrap();
        assert_eq!(series.len(), 2);
        let last = series.last().unwrap();
        assert_eq!(last.timestamp, 2_000);
        assert_eq!(last.value("atr"), Some(1.0));
        assert_eq!(last.value("rsi"), Some(55.0));
    }

    #[test]
    fn ohlcv_first_writer_wins() {
        let mut a = sample(1_000, "atr", 1.0);
        a.ohlcv.close = Some(100.0);
        let mut b = sample(1_000, "rsi", 50.0);
        b.ohlcv.close = Some(999.0);
        b.ohlcv.high = Some(105.0);

        let series = merge_samples(&[a, b], 10, TARGET).unwrap();
        let bar = series.last().unwrap();
        assert_eq!(bar.ohlcv.close, Some(100.0));
        assert_eq!(bar.ohlcv.high, Some(105.0));
    }

    #[test]
    fn limit_keeps_most_recent() {
        let samples: Vec<IndicatorSample> =
            (1..=5).map(|i| sample(i * 1_000, "atr", i as f64)).collect();
        let series = merge_samples(&samples, 3, TARGET).unwrap();
        let ts: Vec<i64> = series.bars().iter().map(|b| b.timestamp).collect();
        assert_eq!(ts, vec![3_000, 4_000, 5_000]);
    }

    #[test]
    fn empty_input_is_no_usable_data() {
        let err = merge_samples(&Vec::<IndicatorSample>::new(), 10, TARGET).unwrap_err();
        assert!(matches!(
            err,
            FeedError::NoUsableData { symbol, timeframe } if symbol == "BTC/USDT" && timeframe == "15m"
        ));
    }

    #[test]
    fn all_malformed_records_is_no_usable_data() {
        let records = vec![
            RawIndicatorRecord::new("price", json!({"value": 101.0})),
            RawIndicatorRecord::new("atr", json!(null)),
        ];
        let err = merge_records(&records, 10, TARGET).unwrap_err();
        assert!(matches!(err, FeedError::NoUsableData { .. }));
    }

    #[test]
    fn vector_and_scalar_shapes_merge_identically() {
        let vector = vec![RawIndicatorRecord::new(
            "ema_fast",
            json!({"value": [10.0, 11.0], "timestamp": [1_000_000, 2_000_000], "close": [9.5, 10.5]}),
        )];
        let scalar = vec![
            RawIndicatorRecord::new(
                "ema_fast",
                json!({"value": 10.0, "timestamp": 1_000_000, "close": 9.5}),
            ),
            RawIndicatorRecord::new(
                "ema_fast",
                json!({"value": 11.0, "timestamp": 2_000_000, "close": 10.5}),
            ),
        ];
        let a = merge_records(&vector, 10, TARGET).unwrap();
        let b = merge_records(&scalar, 10, TARGET).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn nested_value_object_merges_in_both_shapes() {
        let vector = vec![RawIndicatorRecord::new(
            "don",
            json!({
                "value": {"upper": [100.0, 101.0], "lower": [90.0, 91.0]},
                "timestamp": [1_700_000_000, 1_700_000_900]
            }),
        )];
        let scalar = vec![
            RawIndicatorRecord::new(
                "don",
                json!({"value": {"upper": 100.0, "lower": 90.0}, "timestamp": 1_700_000_000}),
            ),
            RawIndicatorRecord::new(
                "don",
                json!({"value": {"upper": 101.0, "lower": 91.0}, "timestamp": 1_700_000_900}),
            ),
        ];
        let a = merge_records(&vector, 10, TARGET).unwrap();
        let b = merge_records(&scalar, 10, TARGET).unwrap();
        assert_eq!(a.column("don_upper"), vec![Some(100.0), Some(101.0)]);
        assert_eq!(a.column("don_lower"), vec![Some(90.0), Some(91.0)]);
        assert_eq!(a, b);
    }
}
