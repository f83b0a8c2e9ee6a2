//! X window computation per mode

use gs_core::{TimeWindow, ZoomRange};

/// Shown for "All" before any data exists
const EMPTY_ALL_SPAN_MS: f64 = 24.0 * 60.0 * 60.0 * 1_000.0;

/// Smallest span a computed window is widened to
const MIN_SPAN_MS: f64 = 1_000.0;

/// Window for a live graph ending at `end`
///
/// `clamp_to_start` keeps a freshly built chart from opening on empty
/// space before the first sample.
pub fn live_window(window: TimeWindow, first: Option<i64>, end: i64, clamp_to_start: bool) -> ZoomRange {
    let end = end as f64;
    let range = match (window.duration_ms(), first) {
        (None, Some(first)) => ZoomRange::new(first as f64, end),
        (None, None) => ZoomRange::new(end - EMPTY_ALL_SPAN_MS, end),
        (Some(ms), Some(first)) if clamp_to_start => ZoomRange::new((end - ms as f64).max(first as f64), end),
        (Some(ms), _) => ZoomRange::new(end - ms as f64, end),
    };
    widen(range)
}

/// Window for a historical graph anchored at `end`
pub fn historical_window(window: TimeWindow, first: Option<i64>, end: i64) -> ZoomRange {
    let end = end as f64;
    let range = match (window.duration_ms(), first) {
        (None, Some(first)) => ZoomRange::new(first as f64, end),
        (None, None) => ZoomRange::new(end - EMPTY_ALL_SPAN_MS, end),
        (Some(ms), _) => ZoomRange::new(end - ms as f64, end),
    };
    widen(range)
}

/// Apply the "show from" floor and keep the span positive
pub fn with_floor(range: ZoomRange, show_from: Option<i64>) -> ZoomRange {
    widen(range.clamp_min(show_from.map(|t| t as f64)))
}

fn widen(range: ZoomRange) -> ZoomRange {
    if range.span() < MIN_SPAN_MS {
        ZoomRange::new(range.max - MIN_SPAN_MS, range.max)
    } else {
        range
    }
}
