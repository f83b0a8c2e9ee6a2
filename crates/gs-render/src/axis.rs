//! Axis tick placement and labels
//!
//! Tick spacing on the time axis depends only on the visible span, so every
//! graph in a sync group shows the same grid for the same window.

use chrono::{Local, TimeZone};
use std::collections::HashSet;
use std::fmt::Display;

const SECOND: f64 = 1_000.0;
const MINUTE: f64 = 60.0 * SECOND;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;

/// Spacing between time ticks for a visible span, in milliseconds
pub fn tick_step(span_ms: f64) -> f64 {
    if span_ms <= 10.0 * SECOND {
        SECOND
    } else if span_ms <= 30.0 * SECOND {
        5.0 * SECOND
    } else if span_ms <= MINUTE {
        10.0 * SECOND
    } else if span_ms <= 5.0 * MINUTE {
        30.0 * SECOND
    } else if span_ms <= 10.0 * MINUTE {
        MINUTE
    } else if span_ms <= 30.0 * MINUTE {
        2.0 * MINUTE
    } else if span_ms <= HOUR {
        5.0 * MINUTE
    } else if span_ms <= 6.0 * HOUR {
        30.0 * MINUTE
    } else {
        HOUR
    }
}

/// Tick positions inside `[min, max]`, aligned to multiples of the step
pub fn tick_splits(min: f64, max: f64) -> Vec<f64> {
    if !(min.is_finite() && max.is_finite()) || max < min {
        return Vec::new();
    }
    let step = tick_step(max - min);
    let mut ticks = Vec::new();
    let mut t = (min / step).ceil() * step;
    while t <= max {
        ticks.push(t);
        t += step;
    }
    ticks
}

/// Label layout for a visible span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLabel {
    /// `HH:MM:SS`
    Seconds,
    /// `HH:MM`
    Minutes,
    /// `Mon D HH:MM`
    DateTime,
}

impl TimeLabel {
    pub fn for_span(span_ms: f64) -> Self {
        if span_ms <= 5.0 * MINUTE {
            TimeLabel::Seconds
        } else if span_ms <= DAY {
            TimeLabel::Minutes
        } else {
            TimeLabel::DateTime
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            TimeLabel::Seconds => "%H:%M:%S",
            TimeLabel::Minutes => "%H:%M",
            TimeLabel::DateTime => "%b %-d %H:%M",
        }
    }
}

/// Label for the tick at `timestamp_ms` given the visible span
pub fn format_tick<Tz>(timestamp_ms: f64, span_ms: f64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match tz.timestamp_millis_opt(timestamp_ms as i64).single() {
        Some(time) => time.format(TimeLabel::for_span(span_ms).pattern()).to_string(),
        None => String::new(),
    }
}

/// [`format_tick`] in the local time zone
pub fn format_tick_local(timestamp_ms: f64, span_ms: f64) -> String {
    format_tick(timestamp_ms, span_ms, &Local)
}

/// Value-axis labels
///
/// Uses `render` when it yields distinct labels, otherwise the smallest
/// precision between 0 and 4 decimals that keeps the labels distinct.
pub fn y_tick_labels(ticks: &[f64], render: Option<&dyn Fn(f64) -> String>) -> Vec<String> {
    if let Some(render) = render {
        let rendered: Vec<String> = ticks.iter().map(|&v| render(v)).collect();
        if all_distinct(&rendered) {
            return rendered;
        }
    }
    for precision in 0..=4usize {
        let labels: Vec<String> = ticks.iter().map(|v| format!("{:.*}", precision, v)).collect();
        if all_distinct(&labels) {
            return labels;
        }
    }
    ticks.iter().map(|v| format!("{:.4}", v)).collect()
}

fn all_distinct(labels: &[String]) -> bool {
    let mut seen = HashSet::with_capacity(labels.len());
    labels.iter().all(|label| seen.insert(label.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_tick_step_ranges() {
        assert_eq!(tick_step(10.0 * SECOND), SECOND);
        assert_eq!(tick_step(25.0 * SECOND), 5.0 * SECOND);
        assert_eq!(tick_step(MINUTE), 10.0 * SECOND);
        assert_eq!(tick_step(4.0 * MINUTE), 30.0 * SECOND);
        assert_eq!(tick_step(10.0 * MINUTE), MINUTE);
        assert_eq!(tick_step(30.0 * MINUTE), 2.0 * MINUTE);
        assert_eq!(tick_step(HOUR), 5.0 * MINUTE);
        assert_eq!(tick_step(6.0 * HOUR), 30.0 * MINUTE);
        assert_eq!(tick_step(3.0 * DAY), HOUR);
    }

    #[test]
    fn test_splits_are_aligned_and_inside() {
        let ticks = tick_splits(1_500.0, 6_000.0);
        assert_eq!(ticks, vec![2_000.0, 3_000.0, 4_000.0, 5_000.0, 6_000.0]);

        let ticks = tick_splits(0.0, 20.0 * MINUTE);
        assert_eq!(ticks.len(), 11);
        assert!(ticks.iter().all(|t| t % (2.0 * MINUTE) == 0.0));

        assert!(tick_splits(10.0, 5.0).is_empty());
        assert!(tick_splits(f64::NAN, 5.0).is_empty());
    }

    #[test]
    fn test_label_layouts() {
        // 2024-03-05 13:04:05 UTC
        let ts = 1_709_643_845_000.0;
        assert_eq!(format_tick(ts, 30.0 * SECOND, &Utc), "13:04:05");
        assert_eq!(format_tick(ts, 5.0 * MINUTE, &Utc), "13:04:05");
        assert_eq!(format_tick(ts, HOUR, &Utc), "13:04");
        assert_eq!(format_tick(ts, DAY, &Utc), "13:04");
        assert_eq!(format_tick(ts, 2.0 * DAY, &Utc), "Mar 5 13:04");
    }

    #[test]
    fn test_y_labels_pick_smallest_distinct_precision() {
        assert_eq!(y_tick_labels(&[0.0, 1.0, 2.0], None), vec!["0", "1", "2"]);
        assert_eq!(y_tick_labels(&[0.0, 0.5, 1.0], None), vec!["0.0", "0.5", "1.0"]);
        assert_eq!(y_tick_labels(&[0.1, 0.12], None), vec!["0.10", "0.12"]);
    }

    #[test]
    fn test_y_labels_prefer_distinct_renderer() {
        let unit = |v: f64| format!("{:.0} mm", v);
        assert_eq!(y_tick_labels(&[1.0, 2.0], Some(&unit)), vec!["1 mm", "2 mm"]);
        // Renderer collapses the labels, so the precision search takes over
        assert_eq!(y_tick_labels(&[1.0, 1.01], Some(&unit)), vec!["1.00", "1.01"]);
    }
}
