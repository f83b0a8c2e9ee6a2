//! Group-level controls
//!
//! The control surface is what the rest of the application sees of a sync
//! group: the shared window and live flag, and the actions that change
//! them. Every action is submitted to the hub as [`Origin::Control`], so it
//! is never mistaken for a graph's own echo.

use gs_core::events::events::ExportCompleted;
use gs_core::{EventBus, Origin, SubmitOutcome, SyncAction, SyncHub, TimeWindow, TimeWindowPreset};
use gs_data::{DataError, ExportRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What the controls display
#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    pub time_window: TimeWindow,
    pub is_live: bool,
    pub show_from_timestamp: Option<i64>,
    pub presets: Vec<TimeWindowPreset>,
}

/// Actions and state of one sync group
#[derive(Clone)]
pub struct ControlSurface {
    group_id: String,
    hub: Arc<SyncHub>,
    registry: ExportRegistry,
    presets: Vec<TimeWindowPreset>,
    events: Option<Arc<EventBus>>,
}

impl ControlSurface {
    pub fn new(group_id: impl Into<String>, hub: Arc<SyncHub>, registry: ExportRegistry) -> Self {
        Self {
            group_id: group_id.into(),
            hub,
            registry,
            presets: TimeWindowPreset::defaults(),
            events: None,
        }
    }

    pub fn with_presets(mut self, presets: Vec<TimeWindowPreset>) -> Self {
        self.presets = presets;
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn state(&self) -> ControlState {
        let state = self.hub.state();
        ControlState {
            time_window: state.time_window,
            is_live: state.is_live,
            show_from_timestamp: state.show_from_timestamp,
            presets: self.presets.clone(),
        }
    }

    pub fn on_time_window_change(&self, window: TimeWindow) -> SubmitOutcome {
        self.submit(SyncAction::SetTimeWindow(window))
    }

    pub fn on_switch_to_live(&self) -> SubmitOutcome {
        self.submit(SyncAction::SwitchToLive)
    }

    /// Freeze the group at `freeze`, or let each graph use its own live end
    pub fn on_switch_to_historical(&self, freeze: Option<i64>) -> SubmitOutcome {
        self.submit(SyncAction::SwitchToHistorical { freeze })
    }

    pub fn on_show_from_change(&self, timestamp: Option<i64>) -> SubmitOutcome {
        self.submit(SyncAction::SetShowFrom(timestamp))
    }

    /// Write every registered graph into one CSV inside `dir`
    pub fn on_export(&self, dir: &Path) -> Result<(PathBuf, usize), DataError> {
        let now = self.hub.clock().now_ms() as i64;
        match self.registry.export_to_dir(dir, &self.group_id, now) {
            Ok((path, rows)) => {
                if let Some(events) = &self.events {
                    events.publish(ExportCompleted {
                        group_id: self.group_id.clone(),
                        row_count: rows,
                    });
                }
                Ok((path, rows))
            }
            Err(err) => {
                tracing::warn!("Export of group {} failed: {}", self.group_id, err);
                Err(err)
            }
        }
    }

    fn submit(&self, action: SyncAction) -> SubmitOutcome {
        tracing::debug!("Group {} control: {:?}", self.group_id, action);
        self.hub.submit(Origin::Control, action)
    }
}
