//! Per-graph mode state machine
//!
//! A graph is always in exactly one of [`GraphMode::Live`],
//! [`GraphMode::Historical`] or [`GraphMode::Manual`]. The machine owns the
//! freeze timestamp and the manual scale baseline so that the invariants
//! tying them to the mode cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::window::{TimeWindow, YRange, ZoomRange};

/// Which data-window computation a graph applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GraphMode {
    /// Follows the newest arriving data
    #[default]
    Live,
    /// Anchored to a frozen end timestamp
    Historical,
    /// User-controlled zoom/pan, exempt from automatic rescaling
    Manual,
}

impl GraphMode {
    pub fn is_live(&self) -> bool {
        matches!(self, GraphMode::Live)
    }
}

/// Scale captured when a graph enters manual mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualScale {
    pub x: ZoomRange,
    pub y: YRange,
}

/// Result of a transition request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeTransition {
    pub from: GraphMode,
    pub to: GraphMode,
    /// Any in-flight point animation must stop
    pub cancel_animation: bool,
    /// Buffered data must be reprocessed from scratch
    pub reset_processed_count: bool,
    /// The X/Y scale must be recomputed for the new mode
    pub recompute_view: bool,
}

impl ModeTransition {
    fn unchanged(mode: GraphMode) -> Self {
        Self {
            from: mode,
            to: mode,
            cancel_animation: false,
            reset_processed_count: false,
            recompute_view: false,
        }
    }

    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Live / Historical / Manual state machine for one graph
#[derive(Debug, Clone, Default)]
pub struct ModeMachine {
    mode: GraphMode,
    freeze_timestamp: Option<i64>,
    manual_scale: Option<ManualScale>,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> GraphMode {
        self.mode
    }

    pub fn freeze_timestamp(&self) -> Option<i64> {
        self.freeze_timestamp
    }

    pub fn manual_scale(&self) -> Option<ManualScale> {
        self.manual_scale
    }

    /// Any user or programmatic zoom/pan
    ///
    /// The freeze timestamp is kept so a later preset selection can return
    /// to the historical branch anchored where the user left live data.
    pub fn enter_manual(&mut self, scale: ManualScale, live_end: i64) -> ModeTransition {
        let from = self.mode;
        self.mode = GraphMode::Manual;
        self.manual_scale = Some(scale);
        if self.freeze_timestamp.is_none() {
            self.freeze_timestamp = Some(live_end);
        }
        if from != GraphMode::Manual {
            tracing::debug!("Graph mode {:?} -> Manual", from);
        }
        ModeTransition {
            from,
            to: GraphMode::Manual,
            cancel_animation: true,
            reset_processed_count: from == GraphMode::Live,
            recompute_view: false,
        }
    }

    /// Explicit "switch to historical"
    ///
    /// Freezes at `freeze_at` whether the graph was live or manual, and
    /// discards any manual scale.
    pub fn switch_to_historical(&mut self, freeze_at: i64) -> ModeTransition {
        if self.mode == GraphMode::Historical {
            return ModeTransition::unchanged(self.mode);
        }
        self.freeze_timestamp = Some(freeze_at);
        self.enter_historical()
    }

    fn enter_historical(&mut self) -> ModeTransition {
        let from = self.mode;
        self.mode = GraphMode::Historical;
        self.manual_scale = None;
        tracing::debug!("Graph mode {:?} -> Historical (freeze at {:?})", from, self.freeze_timestamp);
        ModeTransition {
            from,
            to: GraphMode::Historical,
            cancel_animation: true,
            reset_processed_count: true,
            recompute_view: true,
        }
    }

    /// Explicit "switch to live"
    pub fn switch_to_live(&mut self) -> ModeTransition {
        let from = self.mode;
        if from == GraphMode::Live {
            return ModeTransition::unchanged(from);
        }
        self.mode = GraphMode::Live;
        self.freeze_timestamp = None;
        self.manual_scale = None;
        tracing::debug!("Graph mode {:?} -> Live", from);
        ModeTransition {
            from,
            to: GraphMode::Live,
            cancel_animation: true,
            reset_processed_count: true,
            recompute_view: true,
        }
    }

    /// A time-window preset was chosen
    ///
    /// `All` always returns to live. Any other window leaves manual mode for
    /// the historical branch; live and historical keep their branch and a
    /// historical graph keeps its original freeze.
    pub fn select_time_window(&mut self, window: TimeWindow, live_end: i64) -> ModeTransition {
        if window.is_all() {
            let mut transition = self.switch_to_live();
            transition.recompute_view = true;
            return transition;
        }
        match self.mode {
            GraphMode::Manual => {
                // Anchored where the user left live data
                self.freeze_timestamp.get_or_insert(live_end);
                self.enter_historical()
            }
            mode => ModeTransition {
                recompute_view: true,
                cancel_animation: true,
                ..ModeTransition::unchanged(mode)
            },
        }
    }

    /// Returns the freeze timestamp to use for a historical end, if any
    pub fn historical_end(&self) -> Option<i64> {
        match self.mode {
            GraphMode::Live => None,
            GraphMode::Historical | GraphMode::Manual => self.freeze_timestamp,
        }
    }
}
