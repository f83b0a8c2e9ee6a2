//! Marker overlay placement

use gs_core::{YRange, ZoomRange};
use gs_data::Marker;

/// Where a marker sits inside the plotting area
///
/// Ratios run from the left and the bottom edge respectively.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPlacement {
    pub marker: Marker,
    pub x_ratio: f64,
    /// `None` when the marker carries no value or the Y range is flat
    pub y_ratio: Option<f64>,
}

/// Placements for the markers inside the visible window
pub fn place_markers(markers: &[Marker], window: ZoomRange, y: YRange) -> Vec<MarkerPlacement> {
    if !window.is_valid() {
        return Vec::new();
    }
    markers
        .iter()
        .filter(|m| window.contains(m.timestamp as f64))
        .map(|marker| {
            let x_ratio = ((marker.timestamp as f64 - window.min) / window.span()).clamp(0.0, 1.0);
            let y_ratio = marker
                .value
                .filter(|_| y.span() > 0.0)
                .map(|value| (value - y.min) / y.span());
            MarkerPlacement {
                marker: marker.clone(),
                x_ratio,
                y_ratio,
            }
        })
        .collect()
}
