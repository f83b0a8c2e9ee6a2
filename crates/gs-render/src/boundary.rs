//! Boundary traits and the owning handle

use gs_core::{YRange, ZoomRange};

use crate::{AlignedData, ChartSpec, RenderError, Scale, Size};

/// A live chart object owned by one graph
pub trait RenderBoundary: Send {
    /// Replace the rendered data
    fn set_data(&mut self, data: &AlignedData);

    /// Set the horizontal range
    fn set_x_scale(&mut self, range: ZoomRange);

    /// Set the vertical range
    fn set_y_scale(&mut self, range: YRange);

    /// Current ranges
    fn scale(&self) -> Scale;

    /// Release everything the boundary holds
    fn destroy(&mut self);
}

/// Builds boundaries for a host UI
pub trait BoundaryFactory: Send + Sync {
    /// Construct a boundary inside a container of the given size
    fn create(&self, spec: &ChartSpec, container: Size) -> Result<Box<dyn RenderBoundary>, RenderError>;
}

/// Owns a boundary and destroys it exactly once
///
/// Dropping the handle destroys the boundary, so every exit path of the
/// lifecycle releases it.
pub struct BoundaryHandle {
    graph_id: String,
    boundary: Option<Box<dyn RenderBoundary>>,
}

impl BoundaryHandle {
    /// Build through `factory`, refusing zero-sized containers up front
    pub fn create(factory: &dyn BoundaryFactory, spec: &ChartSpec, container: Size) -> Result<Self, RenderError> {
        if container.is_zero() {
            return Err(RenderError::ZeroSizedContainer {
                width: container.width,
                height: container.height,
            });
        }
        if spec.data.is_empty() {
            return Err(RenderError::NoData);
        }
        let boundary = factory.create(spec, container)?;
        tracing::debug!("Created boundary for graph {} ({} columns)", spec.graph_id, spec.data.columns.len());
        Ok(Self {
            graph_id: spec.graph_id.clone(),
            boundary: Some(boundary),
        })
    }

    pub fn graph_id(&self) -> &str {
        &self.graph_id
    }

    pub fn set_data(&mut self, data: &AlignedData) {
        if let Some(boundary) = self.boundary.as_mut() {
            boundary.set_data(data);
        }
    }

    pub fn set_x_scale(&mut self, range: ZoomRange) {
        if let Some(boundary) = self.boundary.as_mut() {
            boundary.set_x_scale(range);
        }
    }

    pub fn set_y_scale(&mut self, range: YRange) {
        if let Some(boundary) = self.boundary.as_mut() {
            boundary.set_y_scale(range);
        }
    }

    pub fn scale(&self) -> Option<Scale> {
        self.boundary.as_ref().map(|b| b.scale())
    }

    /// Destroy now rather than on drop
    pub fn release(mut self) {
        self.destroy_inner();
    }

    fn destroy_inner(&mut self) {
        if let Some(mut boundary) = self.boundary.take() {
            boundary.destroy();
            tracing::debug!("Destroyed boundary for graph {}", self.graph_id);
        }
    }
}

impl Drop for BoundaryHandle {
    fn drop(&mut self) {
        self.destroy_inner();
    }
}

impl std::fmt::Debug for BoundaryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundaryHandle")
            .field("graph_id", &self.graph_id)
            .field("alive", &self.boundary.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{BoundaryCall, RecordingFactory};
    use crate::SeriesStyle;
    use gs_data::Rgba;

    fn spec(rows: usize) -> ChartSpec {
        ChartSpec {
            graph_id: "g".to_string(),
            title: "G".to_string(),
            styles: vec![SeriesStyle {
                label: "v".to_string(),
                color: Rgba::BLACK,
                width: 2.0,
                dash: None,
                show_points: true,
            }],
            data: AlignedData {
                x: (0..rows).map(|i| i as f64).collect(),
                columns: vec![(0..rows).map(|i| Some(i as f64)).collect()],
                real_points: rows,
            },
            initial_scale: Scale {
                x: ZoomRange::new(0.0, 10.0),
                y: YRange::new(0.0, 1.0),
            },
        }
    }

    #[test]
    fn test_drop_destroys_once() {
        let factory = RecordingFactory::new();
        let handle = BoundaryHandle::create(&factory, &spec(3), Size::new(100.0, 50.0)).unwrap();
        drop(handle);
        assert_eq!(factory.log().count(|c| matches!(c, BoundaryCall::Destroyed { .. })), 1);
    }

    #[test]
    fn test_release_then_drop_destroys_once() {
        let factory = RecordingFactory::new();
        let handle = BoundaryHandle::create(&factory, &spec(3), Size::new(100.0, 50.0)).unwrap();
        handle.release();
        assert_eq!(factory.log().count(|c| matches!(c, BoundaryCall::Destroyed { .. })), 1);
    }

    #[test]
    fn test_zero_size_is_refused() {
        let factory = RecordingFactory::new();
        let err = BoundaryHandle::create(&factory, &spec(3), Size::new(0.0, 50.0)).unwrap_err();
        assert!(matches!(err, RenderError::ZeroSizedContainer { .. }));
        assert_eq!(factory.created(), 0);

        let err = BoundaryHandle::create(&factory, &spec(0), Size::new(10.0, 50.0)).unwrap_err();
        assert_eq!(err, RenderError::NoData);
    }

    #[test]
    fn test_failed_construction_leaves_nothing_to_destroy() {
        let factory = RecordingFactory::failing("boom");
        let result = BoundaryHandle::create(&factory, &spec(2), Size::new(10.0, 10.0));
        assert!(matches!(result, Err(RenderError::Construction(_))));
        assert_eq!(factory.log().count(|c| matches!(c, BoundaryCall::Destroyed { .. })), 0);
    }
}
