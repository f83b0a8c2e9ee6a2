//! Rendering boundary abstraction
//!
//! A graph never paints pixels itself. It hands a [`ChartSpec`] to a
//! [`BoundaryFactory`], keeps the resulting boundary inside a
//! [`BoundaryHandle`] and drives it with aligned data and scales.

pub mod axis;
pub mod boundary;
pub mod recording;

use gs_core::{YRange, ZoomRange};
use gs_data::{AlignedSeries, Rgba};
use thiserror::Error;

pub use boundary::{BoundaryFactory, BoundaryHandle, RenderBoundary};
pub use recording::{BoundaryCall, BoundaryLog, RecordingBoundary, RecordingFactory};

/// Errors raised while constructing a boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Container has zero size ({width}x{height})")]
    ZeroSizedContainer { width: f32, height: f32 },

    #[error("No data to render")]
    NoData,

    #[error("Boundary construction failed: {0}")]
    Construction(String),
}

/// Measured container size in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_zero(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Column-oriented data handed to a boundary
///
/// `x` holds the timestamps; `columns` holds one entry per rendered series
/// followed by one per visible overlay line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedData {
    pub x: Vec<f64>,
    pub columns: Vec<Vec<Option<f64>>>,
    /// Rows below this index are committed; later rows are interpolated
    pub real_points: usize,
}

impl AlignedData {
    pub fn from_aligned(aligned: &AlignedSeries, real_points: usize) -> Self {
        Self {
            x: aligned.timestamps.iter().map(|&t| t as f64).collect(),
            columns: aligned.columns.clone(),
            real_points: real_points.min(aligned.timestamps.len()),
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Whether the row at `index` should be drawn as a committed point
    pub fn is_real(&self, index: usize) -> bool {
        index < self.real_points
    }
}

/// Current X and Y ranges of a chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: ZoomRange,
    pub y: YRange,
}

/// How one column is drawn
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStyle {
    pub label: String,
    pub color: Rgba,
    pub width: f32,
    pub dash: Option<Vec<f32>>,
    /// Draw markers at committed points
    pub show_points: bool,
}

/// Everything a factory needs to build a boundary
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub graph_id: String,
    pub title: String,
    /// One style per column in `data.columns`
    pub styles: Vec<SeriesStyle>,
    pub data: AlignedData,
    pub initial_scale: Scale,
}
