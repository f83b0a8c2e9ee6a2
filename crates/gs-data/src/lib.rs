//! Series data, alignment and the marker/export adapters

pub mod align;
pub mod export;
pub mod markers;
pub mod series;

use thiserror::Error;

// Re-exports
pub use align::{align, AlignedSeries};
pub use export::{ExportRegistry, GraphExportSnapshot, ValueRenderer};
pub use markers::{Marker, MarkerStorage, MarkerStore, MAX_MARKERS_PER_MACHINE};
pub use series::{OverlayKind, OverlayLine, Rgba, Sample, SeriesData, TimeSeries, TimeSeriesConfig};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Invalid color '{0}'")]
    InvalidColor(String),

    #[error("Unknown series: {0}")]
    UnknownSeries(String),

    #[error("Nothing to export")]
    NothingToExport,
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}
