//! Value readouts for the graph header and the cursor

use gs_data::{Sample, ValueRenderer};

/// Header text for a value, `"N/A"` when there is none
pub fn format_display_value(value: Option<f64>, render: Option<&ValueRenderer>) -> String {
    match (value, render) {
        (Some(value), Some(render)) if value.is_finite() => render(value),
        (Some(value), None) if value.is_finite() => format!("{:.2}", value),
        _ => "N/A".to_string(),
    }
}

/// Value shown for a cursor at `timestamp_ms`
///
/// The cursor reads the committed sample nearest to it. When that sample
/// lies within `snap_ms` of the live sample, the live value is shown
/// instead, since the committed buffer lags behind it.
pub fn cursor_readout(committed: &[Sample], current: Option<Sample>, timestamp_ms: f64, snap_ms: f64) -> Option<f64> {
    let nearest = nearest_sample(committed, timestamp_ms);
    match (nearest, current) {
        (Some(sample), Some(current)) if ((sample.timestamp - current.timestamp).abs() as f64) < snap_ms => {
            Some(current.value)
        }
        (Some(sample), _) => Some(sample.value),
        (None, Some(current)) => Some(current.value),
        (None, None) => None,
    }
}

fn nearest_sample(samples: &[Sample], timestamp_ms: f64) -> Option<Sample> {
    let index = samples.partition_point(|s| (s.timestamp as f64) < timestamp_ms);
    let after = samples.get(index);
    let before = index.checked_sub(1).and_then(|i| samples.get(i));
    match (before, after) {
        (Some(b), Some(a)) => {
            if timestamp_ms - b.timestamp as f64 <= a.timestamp as f64 - timestamp_ms {
                Some(*b)
            } else {
                Some(*a)
            }
        }
        (Some(s), None) | (None, Some(s)) => Some(*s),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_missing_value_is_na() {
        assert_eq!(format_display_value(None, None), "N/A");
        assert_eq!(format_display_value(Some(f64::NAN), None), "N/A");
        assert_eq!(format_display_value(Some(1.234), None), "1.23");

        let render: ValueRenderer = Arc::new(|v| format!("{:.1} m/min", v));
        assert_eq!(format_display_value(Some(12.04), Some(&render)), "12.0 m/min");
        assert_eq!(format_display_value(None, Some(&render)), "N/A");
    }

    #[test]
    fn test_cursor_reads_nearest_committed_sample() {
        let committed = vec![Sample::new(0, 1.0), Sample::new(10_000, 2.0), Sample::new(20_000, 3.0)];
        assert_eq!(cursor_readout(&committed, None, 4_000.0, 1_000.0), Some(1.0));
        assert_eq!(cursor_readout(&committed, None, 6_000.0, 1_000.0), Some(2.0));
        assert_eq!(cursor_readout(&committed, None, 99_000.0, 1_000.0), Some(3.0));
        assert_eq!(cursor_readout(&[], None, 0.0, 1_000.0), None);
    }

    #[test]
    fn test_cursor_near_live_sample_shows_live_value() {
        let committed = vec![Sample::new(0, 1.0), Sample::new(10_000, 2.0)];
        let current = Some(Sample::new(10_400, 2.7));
        assert_eq!(cursor_readout(&committed, current, 9_900.0, 1_000.0), Some(2.7));
        assert_eq!(cursor_readout(&committed, current, 100.0, 1_000.0), Some(1.0));
        assert_eq!(cursor_readout(&[], current, 100.0, 1_000.0), Some(2.7));
    }
}
