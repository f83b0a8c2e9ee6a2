//! Boundary that records every call instead of drawing

use gs_core::{YRange, ZoomRange};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::boundary::{BoundaryFactory, RenderBoundary};
use crate::{AlignedData, ChartSpec, RenderError, Scale, Size};

/// One observed boundary call
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryCall {
    Created { graph_id: String, columns: usize, scale: Scale },
    SetData { graph_id: String, data: AlignedData },
    SetXScale { graph_id: String, range: ZoomRange },
    SetYScale { graph_id: String, range: YRange },
    Destroyed { graph_id: String },
}

/// Shared, append-only call log
#[derive(Debug, Clone, Default)]
pub struct BoundaryLog {
    calls: Arc<Mutex<Vec<BoundaryCall>>>,
}

impl BoundaryLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: BoundaryCall) {
        self.calls.lock().push(call);
    }

    pub fn calls(&self) -> Vec<BoundaryCall> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    pub fn count(&self, predicate: impl Fn(&BoundaryCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| predicate(c)).count()
    }

    /// Most recent data handed to any boundary
    pub fn last_data(&self) -> Option<AlignedData> {
        self.calls.lock().iter().rev().find_map(|c| match c {
            BoundaryCall::SetData { data, .. } => Some(data.clone()),
            _ => None,
        })
    }

    /// Most recent X range set on any boundary
    pub fn last_x_scale(&self) -> Option<ZoomRange> {
        self.calls.lock().iter().rev().find_map(|c| match c {
            BoundaryCall::SetXScale { range, .. } => Some(*range),
            _ => None,
        })
    }

    /// Most recent Y range set on any boundary
    pub fn last_y_scale(&self) -> Option<YRange> {
        self.calls.lock().iter().rev().find_map(|c| match c {
            BoundaryCall::SetYScale { range, .. } => Some(*range),
            _ => None,
        })
    }
}

/// Boundary that logs instead of painting
pub struct RecordingBoundary {
    graph_id: String,
    scale: Scale,
    log: BoundaryLog,
}

impl RecordingBoundary {
    pub fn new(spec: &ChartSpec, log: BoundaryLog) -> Self {
        log.push(BoundaryCall::Created {
            graph_id: spec.graph_id.clone(),
            columns: spec.data.columns.len(),
            scale: spec.initial_scale,
        });
        log.push(BoundaryCall::SetData {
            graph_id: spec.graph_id.clone(),
            data: spec.data.clone(),
        });
        Self {
            graph_id: spec.graph_id.clone(),
            scale: spec.initial_scale,
            log,
        }
    }
}

impl RenderBoundary for RecordingBoundary {
    fn set_data(&mut self, data: &AlignedData) {
        self.log.push(BoundaryCall::SetData {
            graph_id: self.graph_id.clone(),
            data: data.clone(),
        });
    }

    fn set_x_scale(&mut self, range: ZoomRange) {
        self.scale.x = range;
        self.log.push(BoundaryCall::SetXScale {
            graph_id: self.graph_id.clone(),
            range,
        });
    }

    fn set_y_scale(&mut self, range: YRange) {
        self.scale.y = range;
        self.log.push(BoundaryCall::SetYScale {
            graph_id: self.graph_id.clone(),
            range,
        });
    }

    fn scale(&self) -> Scale {
        self.scale
    }

    fn destroy(&mut self) {
        self.log.push(BoundaryCall::Destroyed {
            graph_id: self.graph_id.clone(),
        });
    }
}

/// Factory producing [`RecordingBoundary`]s that share one log
#[derive(Debug, Default)]
pub struct RecordingFactory {
    log: BoundaryLog,
    created: AtomicUsize,
    failure: Option<String>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory whose every construction fails
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn log(&self) -> &BoundaryLog {
        &self.log
    }

    /// Number of boundaries built so far
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl BoundaryFactory for RecordingFactory {
    fn create(&self, spec: &ChartSpec, _container: Size) -> Result<Box<dyn RenderBoundary>, RenderError> {
        if let Some(message) = &self.failure {
            return Err(RenderError::Construction(message.clone()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingBoundary::new(spec, self.log.clone())))
    }
}
