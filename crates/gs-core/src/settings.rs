//! Tunable settings for sync groups and graphs

use serde::{Deserialize, Serialize};

use crate::window::{TimeWindow, TimeWindowPreset};

/// Settings shared by every graph in a sync group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// A graph's own request is ignored for this long after it changed the state
    pub echo_debounce_ms: f64,

    /// Zoom requests inside this window after the first one are coalesced
    pub zoom_throttle_window_ms: f64,

    /// Delay before a coalesced zoom request is released
    pub zoom_coalesce_delay_ms: f64,

    /// Time window a freshly created group starts with
    pub default_time_window: TimeWindow,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            echo_debounce_ms: 100.0,
            zoom_throttle_window_ms: 100.0,
            zoom_coalesce_delay_ms: 50.0,
            default_time_window: TimeWindow::default(),
        }
    }
}

/// Per-graph behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Duration of one point-arrival interpolation
    pub animation_duration_ms: f64,

    /// Horizontal travel before a touch drag counts as a pan
    pub drag_threshold_px: f32,

    /// Smallest per-move delta that actually shifts the scale
    pub drag_min_step_px: f32,

    /// Touch drags must be recognised within this long of touch start
    pub drag_recognition_ms: f64,

    /// Outgoing zoom notifications wait this long for the gesture to settle
    pub zoom_notify_debounce_ms: f64,

    /// A cursor this close to the live sample shows the live value
    pub cursor_snap_ms: f64,

    /// Time-window presets offered by the controls
    pub time_window_presets: Vec<TimeWindowPreset>,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            animation_duration_ms: 1_000.0,
            drag_threshold_px: 20.0,
            drag_min_step_px: 2.0,
            drag_recognition_ms: 500.0,
            zoom_notify_debounce_ms: 33.0,
            cursor_snap_ms: 1_000.0,
            time_window_presets: TimeWindowPreset::defaults(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: SyncSettings =
            serde_json::from_str(r#"{ "default_time_window": "5m" }"#).unwrap();
        assert_eq!(settings.default_time_window, TimeWindow::minutes(5));
        assert_eq!(settings.echo_debounce_ms, 100.0);

        let graph: GraphSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(graph, GraphSettings::default());
    }
}
