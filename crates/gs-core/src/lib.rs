//! Core functionality for synchronized machine graphs
//!
//! This crate provides the shared abstractions every graph in a sync group
//! agrees on: time windows, graph modes, the injected frame clock, the
//! synchronization hub and the process-wide event bus.

pub mod clock;
pub mod events;
pub mod mode;
pub mod settings;
pub mod sync;
pub mod window;

// Re-export commonly used types
pub use clock::{Clock, FrameTimer, ManualClock, SystemClock};
pub use events::EventBus;
pub use mode::{GraphMode, ModeMachine, ModeTransition};
pub use settings::{GraphSettings, SyncSettings};
pub use sync::{
    GraphId, Origin, SubmitOutcome, SyncAction, SyncHub, SyncState, SyncSubscriber,
};
pub use window::{TimeWindow, TimeWindowPreset, YRange, ZoomRange};
