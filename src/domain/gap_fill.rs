//! Gap filler: forward-fill then backward-fill of missing indicator values.
//!
//! A value is missing when the key is absent from a bar or the stored value
//! is NaN/infinite. Keys with no valid value anywhere are left untouched.

use crate::domain::bar::BarSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Fill,
    /// Gaps stay as explicit nulls in the snapshot.
    LeaveGaps,
}

impl FillMode {
    pub fn from_flag(enabled: bool) -> Self {
        if enabled { FillMode::Fill } else { FillMode::LeaveGaps }
    }
}

/// Forward-fills then backward-fills one column.
pub fn fill_column(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let valid = |v: &Option<f64>| v.filter(|x| x.is_finite());

    let mut out: Vec<Option<f64>> = Vec::with_capacity(values.len());
    let mut last = None;
    for v in values {
        if let Some(x) = valid(v) {
            last = Some(x);
        }
        out.push(last);
    }

    let mut next = None;
    for slot in out.iter_mut().rev() {
        if slot.is_some() {
            next = *slot;
        } else {
            *slot = next;
        }
    }
    out
}

/// Repairs `keys` in place; an empty `keys` slice means every indicator key.
///
/// Returns the number of values written.
pub fn fill_gaps(series: &mut BarSeries, keys: &[String], mode: FillMode) -> usize {
    if mode == FillMode::LeaveGaps {
        return 0;
    }

    let keys: Vec<String> = if keys.is_empty() {
        series.indicator_keys().into_iter().collect()
    } else {
        keys.to_vec()
    };

    let mut written = 0;
    for key in &keys {
        let column = series.column(key);
        let filled = fill_column(&column);
        for ((bar, before), after) in series.bars_mut().iter_mut().zip(&column).zip(filled) {
            if before.is_none() {
                if let Some(v) = after {
                    bar.indicators.insert(key.clone(), v);
                    written += 1;
                }
            }
        }
    }

    if written > 0 {
        tracing::debug!(written, keys = keys.len(), "filled indicator gaps");
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;

    fn series_with(key: &str, values: &[Option<f64>]) -> BarSeries {
        let bars = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut bar = Bar::new(i as i64 * 1_000);
                if let Some(x) = v {
                    bar.indicators.insert(key.to_string(), *x);
                }
                bar
            })
            .collect();
        BarSeries::from_bars(bars, 100)
    }

    #[test]
    fn forward_then_backward() {
        let filled = fill_column(&[None, None, Some(5.0), None, Some(8.0)]);
        assert_eq!(
            filled,
            vec![Some(5.0), Some(5.0), Some(5.0), Some(5.0), Some(8.0)]
        );
    }

    #[test]
    fn all_missing_stays_missing() {
        assert_eq!(fill_column(&[None, None, None]), vec![None, None, None]);
    }

    #[test]
    fn non_finite_counts_as_missing() {
        let filled = fill_column(&[Some(1.0), Some(f64::NAN), Some(f64::INFINITY)]);
        assert_eq!(filled, vec![Some(1.0), Some(1.0), Some(1.0)]);
    }

    #[test]
    fn fill_gaps_repairs_absent_keys() {
        let mut series = series_with("atr", &[None, Some(2.0), None]);
        let written = fill_gaps(&mut series, &[], FillMode::Fill);
        assert_eq!(written, 2);
        assert_eq!(series.column("atr"), vec![Some(2.0), Some(2.0), Some(2.0)]);
    }

    #[test]
    fn fill_gaps_replaces_nan() {
        let mut series = series_with("rsi", &[Some(40.0), Some(f64::NAN)]);
        fill_gaps(&mut series, &["rsi".to_string()], FillMode::Fill);
        assert_eq!(series.bars()[1].indicators.get("rsi"), Some(&40.0));
    }

    #[test]
    fn leave_gaps_mode_is_a_no_op() {
        let mut series = series_with("atr", &[None, Some(2.0), None]);
        let before = series.clone();
        assert_eq!(fill_gaps(&mut series, &[], FillMode::LeaveGaps), 0);
        assert_eq!(series, before);
    }

    #[test]
    fn unknown_key_is_not_invented() {
        let mut series = series_with("atr", &[Some(1.0), Some(2.0)]);
        fill_gaps(&mut series, &["rsi".to_string()], FillMode::Fill);
        assert!(series.bars().iter().all(|b| !b.indicators.contains_key("rsi")));
    }

    #[test]
    fn only_selected_keys_are_filled() {
        let mut a = Bar::new(0);
        a.indicators.insert("atr".into(), 1.0);
        a.indicators.insert("rsi".into(), 50.0);
        let b = Bar::new(1_000);
        let mut series = BarSeries::from_bars(vec![a, b], 10);
        fill_gaps(&mut series, &["atr".to_string()], FillMode::Fill);
        assert_eq!(series.bars()[1].value("atr"), Some(1.0));
        assert_eq!(series.bars()[1].value("rsi"), None);
    }
}
