//! Chart lifecycle controller
//!
//! Decides whether the boundary has to be rebuilt or can simply be fed.
//! New samples never force a rebuild; a change in the visible series, a
//! resized container or a missing boundary does.

use gs_render::{BoundaryFactory, BoundaryHandle, ChartSpec, RenderError, Size};
use std::fmt;

/// Why a boundary is being rebuilt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecreateReason {
    /// No boundary exists yet
    Initial,
    /// The set of visible series changed
    VisibilityChanged,
    /// Series were added, removed or replaced
    SeriesChanged,
    /// The container was resized since the boundary was built
    ContainerResized,
}

impl fmt::Display for RecreateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RecreateReason::Initial => "initial",
            RecreateReason::VisibilityChanged => "visibility changed",
            RecreateReason::SeriesChanged => "series changed",
            RecreateReason::ContainerResized => "container resized",
        };
        f.write_str(text)
    }
}

/// Outcome of [`ChartLifecycle::decide`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleDecision {
    /// Nothing to render, or waiting for a layout/data change before retrying
    Idle,
    Recreate(RecreateReason),
    Feed,
}

/// Owns the boundary of one graph
#[derive(Debug, Default)]
pub struct ChartLifecycle {
    handle: Option<BoundaryHandle>,
    /// Visible series the boundary was built for
    identity: Vec<String>,
    built_size: Option<Size>,
    container: Size,
    pending: Option<RecreateReason>,
    /// Last construction failed; wait for new input before retrying
    blocked: bool,
}

impl ChartLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container(&self) -> Size {
        self.container
    }

    pub fn is_built(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<&BoundaryHandle> {
        self.handle.as_ref()
    }

    pub fn handle_mut(&mut self) -> Option<&mut BoundaryHandle> {
        self.handle.as_mut()
    }

    pub fn set_container_size(&mut self, size: Size) {
        if size == self.container {
            return;
        }
        self.container = size;
        self.blocked = false;
        if self.handle.is_some() && self.built_size != Some(size) {
            self.pending.get_or_insert(RecreateReason::ContainerResized);
        }
    }

    /// New data arrived; a blocked build may be retried
    pub fn data_changed(&mut self) {
        self.blocked = false;
    }

    /// Force a rebuild on the next decision
    pub fn invalidate(&mut self, reason: RecreateReason) {
        self.pending = Some(reason);
        self.blocked = false;
    }

    pub fn decide(&self, identity: &[String], has_data: bool) -> LifecycleDecision {
        if !has_data || self.blocked {
            return LifecycleDecision::Idle;
        }
        if self.handle.is_none() {
            return LifecycleDecision::Recreate(self.pending.unwrap_or(RecreateReason::Initial));
        }
        if let Some(reason) = self.pending {
            return LifecycleDecision::Recreate(reason);
        }
        if identity != self.identity.as_slice() {
            return LifecycleDecision::Recreate(RecreateReason::VisibilityChanged);
        }
        LifecycleDecision::Feed
    }

    /// Tear down any existing boundary and build a new one
    ///
    /// On failure nothing is left alive and further attempts wait for
    /// [`ChartLifecycle::data_changed`] or a new container size.
    pub fn build(&mut self, factory: &dyn BoundaryFactory, spec: &ChartSpec, identity: Vec<String>) -> Result<(), RenderError> {
        self.teardown();
        match BoundaryHandle::create(factory, spec, self.container) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.identity = identity;
                self.built_size = Some(self.container);
                self.pending = None;
                self.blocked = false;
                Ok(())
            }
            Err(err) => {
                match &err {
                    RenderError::ZeroSizedContainer { .. } | RenderError::NoData => {
                        tracing::debug!("Skipped boundary for graph {}: {}", spec.graph_id, err);
                    }
                    RenderError::Construction(_) => {
                        tracing::warn!("Failed to build boundary for graph {}: {}", spec.graph_id, err);
                    }
                }
                self.blocked = true;
                Err(err)
            }
        }
    }

    /// Destroy the boundary, returning whether one existed
    pub fn teardown(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.release();
                self.built_size = None;
                true
            }
            None => false,
        }
    }
}
