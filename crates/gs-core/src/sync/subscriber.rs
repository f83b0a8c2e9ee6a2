//! Sync subscriber trait

use super::SyncSnapshot;

/// Trait for components that need to respond to sync state changes
pub trait SyncSubscriber: Send + Sync {
    /// Called once per frame tick in which the shared state changed
    fn on_sync_change(&self, snapshot: &SyncSnapshot);
}
