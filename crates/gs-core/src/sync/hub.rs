//! Synchronization hub implementation

use super::{Origin, SyncAction, SyncState, SyncSubscriber};
use crate::clock::{Clock, FrameTimer};
use crate::settings::SyncSettings;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};

/// Versioned copy of the shared state
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSnapshot {
    /// Incremented every time an applied batch changed the state
    pub version: u64,
    pub state: SyncState,
}

/// What happened to a submitted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Accepted; applied on the next frame tick
    Queued(u64),
    /// Accepted into the throttled zoom slot; released after the coalesce delay
    Coalesced(u64),
    /// The same origin changed the state too recently
    RejectedEcho,
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, SubmitOutcome::RejectedEcho)
    }
}

#[derive(Debug, Clone)]
struct SyncRequest {
    id: u64,
    origin: Origin,
    action: SyncAction,
}

/// Hub state stored internally
#[derive(Debug)]
struct HubState {
    state: SyncState,
    version: u64,
    next_request_id: u64,
    last_applied_id: u64,
    last_change_source: Option<Origin>,
    last_change_at: f64,
    pending: Vec<SyncRequest>,
    zoom_window_started_at: Option<f64>,
    coalesced_zoom: Option<SyncRequest>,
    zoom_timer: FrameTimer,
}

impl HubState {
    fn allocate_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }
}

/// Shared state arbiter for one sync group
pub struct SyncHub {
    settings: SyncSettings,
    clock: Arc<dyn Clock>,
    state: Mutex<HubState>,
    subscribers: RwLock<Vec<Weak<dyn SyncSubscriber>>>,
}

impl SyncHub {
    /// Create a hub starting from the settings' default time window
    pub fn new(settings: SyncSettings, clock: Arc<dyn Clock>) -> Self {
        let initial = SyncState::new(settings.default_time_window);
        Self::with_state(settings, clock, initial)
    }

    /// Create a hub with an explicit initial state
    pub fn with_state(settings: SyncSettings, clock: Arc<dyn Clock>, initial: SyncState) -> Self {
        Self {
            settings,
            clock,
            state: Mutex::new(HubState {
                state: initial,
                version: 0,
                next_request_id: 0,
                last_applied_id: 0,
                last_change_source: None,
                last_change_at: f64::NEG_INFINITY,
                pending: Vec::new(),
                zoom_window_started_at: None,
                coalesced_zoom: None,
                zoom_timer: FrameTimer::new(),
            }),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Submit a change request
    ///
    /// Nothing is applied here; accepted requests wait for [`SyncHub::tick`].
    pub fn submit(&self, origin: Origin, action: SyncAction) -> SubmitOutcome {
        let now = self.clock.now_ms();
        let mut hub = self.state.lock();

        if action.is_zoom() {
            return self.submit_zoom(&mut hub, origin, action, now);
        }

        let is_echo = origin != Origin::Control
            && hub.last_change_source.as_ref() == Some(&origin)
            && now - hub.last_change_at < self.settings.echo_debounce_ms;
        if is_echo {
            tracing::debug!("Rejected echo request {:?} from {:?}", action, origin);
            return SubmitOutcome::RejectedEcho;
        }

        let id = hub.allocate_id();
        hub.last_change_source = Some(origin.clone());
        hub.last_change_at = now;
        hub.pending.push(SyncRequest { id, origin, action });
        SubmitOutcome::Queued(id)
    }

    /// Zoom requests are throttled rather than echo-checked: the first in a
    /// window goes straight to the queue, later ones share a single slot
    /// whose timer is replaced on every call.
    ///
    /// "Straight to the queue" still means applied on the next [`SyncHub::tick`],
    /// like every other request.
    fn submit_zoom(&self, hub: &mut HubState, origin: Origin, action: SyncAction, now: f64) -> SubmitOutcome {
        let id = hub.allocate_id();
        hub.last_change_source = Some(origin.clone());
        hub.last_change_at = now;
        let request = SyncRequest { id, origin, action };

        let in_window = hub
            .zoom_window_started_at
            .map_or(false, |start| now - start < self.settings.zoom_throttle_window_ms);

        if in_window {
            hub.coalesced_zoom = Some(request);
            hub.zoom_timer.schedule(now, self.settings.zoom_coalesce_delay_ms);
            SubmitOutcome::Coalesced(id)
        } else {
            hub.zoom_window_started_at = Some(now);
            hub.pending.push(request);
            SubmitOutcome::Queued(id)
        }
    }

    /// Apply everything that is due, as one atomic batch
    ///
    /// Returns `true` when the shared state changed. Subscribers are told
    /// once per changing tick.
    pub fn tick(&self) -> bool {
        let now = self.clock.now_ms();
        let snapshot = {
            let mut hub = self.state.lock();

            if hub.zoom_timer.fire_if_due(now) {
                if let Some(request) = hub.coalesced_zoom.take() {
                    hub.pending.push(request);
                }
            }
            if hub.pending.is_empty() {
                return false;
            }

            let mut batch = std::mem::take(&mut hub.pending);
            batch.sort_by_key(|request| request.id);

            let before = hub.state.clone();
            for request in batch {
                if request.id <= hub.last_applied_id {
                    tracing::debug!(
                        "Dropped stale request {} from {:?} (last applied {})",
                        request.id,
                        request.origin,
                        hub.last_applied_id
                    );
                    continue;
                }
                hub.state.apply(&request.action);
                hub.last_applied_id = request.id;
            }

            if hub.state == before {
                return false;
            }
            hub.version += 1;
            tracing::debug!("Sync state v{}: {:?}", hub.version, hub.state);
            SyncSnapshot {
                version: hub.version,
                state: hub.state.clone(),
            }
        };

        self.notify_subscribers(&snapshot);
        true
    }

    /// Current versioned state
    pub fn snapshot(&self) -> SyncSnapshot {
        let hub = self.state.lock();
        SyncSnapshot {
            version: hub.version,
            state: hub.state.clone(),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state.lock().state.clone()
    }

    pub fn version(&self) -> u64 {
        self.state.lock().version
    }

    /// Requests waiting for a tick, including a coalesced zoom
    pub fn has_pending(&self) -> bool {
        let hub = self.state.lock();
        !hub.pending.is_empty() || hub.coalesced_zoom.is_some()
    }

    /// Add a subscriber
    pub fn add_subscriber(&self, subscriber: Arc<dyn SyncSubscriber>) {
        self.subscribers.write().push(Arc::downgrade(&subscriber));
    }

    /// Notify all subscribers of a state change
    fn notify_subscribers(&self, snapshot: &SyncSnapshot) {
        let mut subscribers = self.subscribers.write();

        // Remove any dead weak references
        subscribers.retain(|weak| weak.strong_count() > 0);

        for weak in subscribers.iter() {
            if let Some(subscriber) = weak.upgrade() {
                subscriber.on_sync_change(snapshot);
            }
        }
    }
}
