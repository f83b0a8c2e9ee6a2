//! Graph configuration

use gs_core::TimeWindow;
use serde::{Deserialize, Serialize};

/// Static description of one graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Title shown above the plot and in exports
    pub title: String,

    /// Unit symbol appended to readouts
    pub unit: Option<String>,

    /// Machine whose markers are drawn on this graph
    pub machine_id: Option<String>,

    /// Window used until the sync group says otherwise
    pub default_time_window: TimeWindow,

    /// Width of series lines in pixels
    pub line_width: f32,

    /// Draw markers at committed samples
    pub show_points: bool,
}

impl GraphConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_machine(mut self, machine_id: impl Into<String>) -> Self {
        self.machine_id = Some(machine_id.into());
        self
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            title: "Graph".to_string(),
            unit: None,
            machine_id: None,
            default_time_window: TimeWindow::default(),
            line_width: 2.0,
            show_points: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_fills_missing_fields() {
        let config: GraphConfig =
            serde_json::from_str(r#"{ "title": "Press", "default_time_window": "5m" }"#).unwrap();
        assert_eq!(config.title, "Press");
        assert_eq!(config.default_time_window, TimeWindow::minutes(5));
        assert_eq!(config.line_width, 2.0);
        assert!(config.show_points);
        assert!(config.unit.is_none());
    }
}
