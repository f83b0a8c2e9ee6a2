//! Synchronized graph views
//!
//! A [`GraphView`] renders one machine's series through a rendering
//! boundary. Graphs joined to a [`GraphGroup`] share their time window,
//! mode and zoom through the group's sync hub.

mod animation;
mod autorange;
mod controls;
mod gesture;
pub mod graph;
mod group;
mod lifecycle;
mod markers;
mod readout;

pub use animation::{AnimationEngine, AnimationFrame, AnimationState};
pub use autorange::autorange;
pub use controls::{ControlState, ControlSurface};
pub use gesture::{GestureContext, GestureEvent, GestureOutput, GestureTranslator, Point};
pub use graph::{GraphConfig, GraphView};
pub use group::GraphGroup;
pub use lifecycle::{ChartLifecycle, LifecycleDecision, RecreateReason};
pub use markers::{place_markers, MarkerPlacement};
pub use readout::{cursor_readout, format_display_value};
