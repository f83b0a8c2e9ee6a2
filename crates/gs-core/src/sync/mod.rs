//! Cross-graph synchronization
//!
//! One [`SyncHub`] exists per sync group. Graphs never mutate the shared
//! [`SyncState`] directly: they submit [`SyncAction`]s tagged with their
//! [`Origin`], and the hub applies accepted requests as one batch on the
//! next frame tick.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::mode::GraphMode;
use crate::window::{TimeWindow, ZoomRange};

mod hub;
mod subscriber;

pub use hub::{SubmitOutcome, SyncHub, SyncSnapshot};
pub use subscriber::SyncSubscriber;

/// Stable identity of a graph inside a group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphId(String);

impl GraphId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random identity
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GraphId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Who asked for a change
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
    /// A graph in the group
    Graph(GraphId),
    /// The group-level controls
    Control,
}

/// A requested change to the shared state
#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    /// Pick a new time window; clears any zoom
    SetTimeWindow(TimeWindow),
    /// A zoom or pan from a graph; `live_end` seeds the freeze timestamp
    Zoom { range: ZoomRange, live_end: i64 },
    /// Return every graph to live data
    SwitchToLive,
    /// Freeze every graph; `None` lets each graph freeze at its own live end
    SwitchToHistorical { freeze: Option<i64> },
    /// Hide data before this timestamp
    SetShowFrom(Option<i64>),
}

impl SyncAction {
    pub fn is_zoom(&self) -> bool {
        matches!(self, SyncAction::Zoom { .. })
    }
}

/// The state every graph in a group agrees on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    pub time_window: TimeWindow,
    pub mode: GraphMode,
    pub is_live: bool,
    pub zoom_range: Option<ZoomRange>,
    pub historical_freeze_timestamp: Option<i64>,
    pub show_from_timestamp: Option<i64>,
}

impl SyncState {
    pub fn new(time_window: TimeWindow) -> Self {
        Self {
            time_window,
            mode: GraphMode::Live,
            is_live: true,
            zoom_range: None,
            historical_freeze_timestamp: None,
            show_from_timestamp: None,
        }
    }

    /// Apply one action in place
    pub fn apply(&mut self, action: &SyncAction) {
        match action {
            SyncAction::SetTimeWindow(window) => {
                self.time_window = *window;
                self.zoom_range = None;
                if window.is_all() {
                    // "All" only makes sense against the live, growing dataset
                    self.mode = GraphMode::Live;
                    self.is_live = true;
                    self.historical_freeze_timestamp = None;
                } else if self.is_live {
                    self.mode = GraphMode::Live;
                } else {
                    self.mode = GraphMode::Historical;
                }
            }
            SyncAction::Zoom { range, live_end } => {
                self.zoom_range = Some(*range);
                self.mode = GraphMode::Manual;
                self.is_live = false;
                self.historical_freeze_timestamp.get_or_insert(*live_end);
            }
            SyncAction::SwitchToLive => {
                self.mode = GraphMode::Live;
                self.is_live = true;
                self.zoom_range = None;
                self.historical_freeze_timestamp = None;
            }
            SyncAction::SwitchToHistorical { freeze } => {
                match self.mode {
                    GraphMode::Historical => return,
                    GraphMode::Live => self.historical_freeze_timestamp = *freeze,
                    // The zoom-time freeze only survives when no freeze is given
                    GraphMode::Manual => {
                        self.historical_freeze_timestamp = freeze.or(self.historical_freeze_timestamp);
                    }
                }
                self.mode = GraphMode::Historical;
                self.is_live = false;
                self.zoom_range = None;
            }
            SyncAction::SetShowFrom(timestamp) => {
                self.show_from_timestamp = *timestamp;
            }
        }
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new(TimeWindow::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_forces_live() {
        let mut state = SyncState::default();
        state.apply(&SyncAction::SwitchToHistorical { freeze: Some(1_000) });
        assert!(!state.is_live);

        state.apply(&SyncAction::SetTimeWindow(TimeWindow::All));
        assert!(state.is_live);
        assert_eq!(state.mode, GraphMode::Live);
        assert_eq!(state.historical_freeze_timestamp, None);
    }

    #[test]
    fn test_window_change_preserves_branch() {
        let mut state = SyncState::default();
        state.apply(&SyncAction::SwitchToHistorical { freeze: Some(1_000) });
        state.apply(&SyncAction::SetTimeWindow(TimeWindow::minutes(5)));
        assert_eq!(state.mode, GraphMode::Historical);
        assert_eq!(state.historical_freeze_timestamp, Some(1_000));
    }

    #[test]
    fn test_zoom_then_preset_goes_historical() {
        let mut state = SyncState::default();
        state.apply(&SyncAction::Zoom {
            range: ZoomRange::new(0.0, 10.0),
            live_end: 500,
        });
        assert_eq!(state.mode, GraphMode::Manual);
        assert_eq!(state.historical_freeze_timestamp, Some(500));

        state.apply(&SyncAction::SetTimeWindow(TimeWindow::minutes(1)));
        assert_eq!(state.mode, GraphMode::Historical);
        assert_eq!(state.zoom_range, None);
        assert_eq!(state.historical_freeze_timestamp, Some(500));
    }

    #[test]
    fn test_historical_after_zoom_freezes_at_switch() {
        let mut state = SyncState::default();
        state.apply(&SyncAction::Zoom {
            range: ZoomRange::new(0.0, 10.0),
            live_end: 500,
        });
        state.apply(&SyncAction::SwitchToHistorical { freeze: Some(9_000) });
        assert_eq!(state.mode, GraphMode::Historical);
        assert_eq!(state.historical_freeze_timestamp, Some(9_000));
    }

    #[test]
    fn test_is_live_tracks_mode() {
        let mut state = SyncState::default();
        let actions = [
            SyncAction::Zoom { range: ZoomRange::new(0.0, 1.0), live_end: 1 },
            SyncAction::SetTimeWindow(TimeWindow::minutes(1)),
            SyncAction::SwitchToLive,
            SyncAction::SwitchToHistorical { freeze: None },
            SyncAction::SetTimeWindow(TimeWindow::All),
        ];
        for action in actions.iter().cycle().take(25) {
            state.apply(action);
            assert_eq!(state.is_live, state.mode == GraphMode::Live);
            assert_eq!(state.zoom_range.is_some(), state.mode == GraphMode::Manual);
        }
    }
}
