//! Named time points attached to a machine
//!
//! Markers are kept per machine, capped at [`MAX_MARKERS_PER_MACHINE`] with
//! the oldest entries dropped first, optionally persisted to a JSON file and
//! announced on the process-wide event bus so every graph showing the same
//! machine re-reads them.

mod storage;

pub use storage::MarkerStorage;

use ahash::AHashMap;
use gs_core::events::events::MarkersChanged;
use gs_core::EventBus;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::series::Rgba;
use crate::DataError;

/// Markers kept per machine before the oldest are trimmed
pub const MAX_MARKERS_PER_MACHINE: usize = 200;

/// A named point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub timestamp: i64,
    pub name: String,
    /// Series value at the marker, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
}

impl Marker {
    pub fn new(timestamp: i64, name: impl Into<String>) -> Self {
        Self {
            timestamp,
            name: name.into(),
            value: None,
            color: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = Some(color);
        self
    }
}

/// Shared per-machine marker lists
#[derive(Clone)]
pub struct MarkerStore {
    markers: Arc<RwLock<AHashMap<String, Vec<Marker>>>>,
    storage: Option<MarkerStorage>,
    events: Option<Arc<EventBus>>,
}

impl MarkerStore {
    /// In-memory store
    pub fn new() -> Self {
        Self {
            markers: Arc::new(RwLock::new(AHashMap::new())),
            storage: None,
            events: None,
        }
    }

    /// Store backed by a JSON file, loading whatever is already there
    pub fn with_storage(storage: MarkerStorage) -> Result<Self, DataError> {
        let loaded = storage.load()?;
        let mut markers = AHashMap::with_capacity(loaded.len());
        for (machine_id, mut list) in loaded {
            trim_to_max(&mut list);
            markers.insert(machine_id, list);
        }
        tracing::info!("Loaded markers for {} machines from {}", markers.len(), storage.path().display());
        Ok(Self {
            markers: Arc::new(RwLock::new(markers)),
            storage: Some(storage),
            events: None,
        })
    }

    /// Announce every change on `bus`
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    /// Markers of one machine in insertion order
    pub fn markers(&self, machine_id: &str) -> Vec<Marker> {
        self.markers.read().get(machine_id).cloned().unwrap_or_default()
    }

    pub fn add_marker(&self, machine_id: &str, marker: Marker) {
        let count = {
            let mut markers = self.markers.write();
            let list = markers.entry(machine_id.to_string()).or_default();
            list.push(marker);
            trim_to_max(list);
            list.len()
        };
        self.changed(machine_id, count);
    }

    /// Remove every marker at exactly `timestamp`
    pub fn remove_marker(&self, machine_id: &str, timestamp: i64) {
        let count = {
            let mut markers = self.markers.write();
            let list = markers.entry(machine_id.to_string()).or_default();
            list.retain(|m| m.timestamp != timestamp);
            list.len()
        };
        self.changed(machine_id, count);
    }

    pub fn clear_markers(&self, machine_id: &str) {
        self.markers.write().insert(machine_id.to_string(), Vec::new());
        self.changed(machine_id, 0);
    }

    /// Write the current lists to storage, if any
    pub fn save(&self) -> Result<(), DataError> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        let snapshot: BTreeMap<String, Vec<Marker>> = self
            .markers
            .read()
            .iter()
            .map(|(id, list)| (id.clone(), list.clone()))
            .collect();
        storage.save(&snapshot)
    }

    fn changed(&self, machine_id: &str, marker_count: usize) {
        if let Err(e) = self.save() {
            tracing::warn!("Failed to persist markers for {}: {}", machine_id, e);
        }
        if let Some(bus) = &self.events {
            bus.publish(MarkersChanged {
                machine_id: machine_id.to_string(),
                marker_count,
            });
        }
    }
}

impl Default for MarkerStore {
    fn default() -> Self {
        Self::new()
    }
}

fn trim_to_max(list: &mut Vec<Marker>) {
    if list.len() > MAX_MARKERS_PER_MACHINE {
        let excess = list.len() - MAX_MARKERS_PER_MACHINE;
        list.drain(..excess);
    }
}
