//! egui_plot rendering boundary
//!
//! Boundaries only record what a graph asked for. The painter reads the
//! same surfaces during the egui frame and draws them with egui_plot.

use ahash::AHashMap;
use egui::Color32;
use egui_plot::{Line, LineStyle, MarkerShape, PlotPoints, PlotUi, Points};
use gs_data::Rgba;
use gs_render::{AlignedData, BoundaryFactory, ChartSpec, RenderBoundary, RenderError, Scale, SeriesStyle, Size};
use parking_lot::RwLock;
use std::sync::Arc;

/// What one boundary currently shows
#[derive(Debug, Clone)]
pub struct PlotSurface {
    pub styles: Vec<SeriesStyle>,
    pub data: AlignedData,
    pub scale: Scale,
}

type Surfaces = Arc<RwLock<AHashMap<String, PlotSurface>>>;

/// Builds boundaries that draw into egui_plot
#[derive(Clone, Default)]
pub struct PlotFactory {
    surfaces: Surfaces,
}

impl PlotFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the surface of `graph_id`, if its boundary is alive
    pub fn surface(&self, graph_id: &str) -> Option<PlotSurface> {
        self.surfaces.read().get(graph_id).cloned()
    }
}

impl BoundaryFactory for PlotFactory {
    fn create(&self, spec: &ChartSpec, _container: Size) -> Result<Box<dyn RenderBoundary>, RenderError> {
        if spec.styles.len() != spec.data.columns.len() {
            return Err(RenderError::Construction(format!(
                "{} styles for {} columns",
                spec.styles.len(),
                spec.data.columns.len()
            )));
        }
        self.surfaces.write().insert(
            spec.graph_id.clone(),
            PlotSurface {
                styles: spec.styles.clone(),
                data: spec.data.clone(),
                scale: spec.initial_scale,
            },
        );
        Ok(Box::new(PlotBoundary {
            graph_id: spec.graph_id.clone(),
            surfaces: Arc::clone(&self.surfaces),
        }))
    }
}

struct PlotBoundary {
    graph_id: String,
    surfaces: Surfaces,
}

impl PlotBoundary {
    fn update(&self, f: impl FnOnce(&mut PlotSurface)) {
        if let Some(surface) = self.surfaces.write().get_mut(&self.graph_id) {
            f(surface);
        }
    }
}

impl RenderBoundary for PlotBoundary {
    fn set_data(&mut self, data: &AlignedData) {
        self.update(|s| s.data = data.clone());
    }

    fn set_x_scale(&mut self, range: gs_core::ZoomRange) {
        self.update(|s| s.scale.x = range);
    }

    fn set_y_scale(&mut self, range: gs_core::YRange) {
        self.update(|s| s.scale.y = range);
    }

    fn scale(&self) -> Scale {
        self.surfaces
            .read()
            .get(&self.graph_id)
            .map(|s| s.scale)
            .unwrap_or(Scale {
                x: gs_core::ZoomRange::new(0.0, 1.0),
                y: gs_core::YRange::default(),
            })
    }

    fn destroy(&mut self) {
        self.surfaces.write().remove(&self.graph_id);
    }
}

pub fn color32(color: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

/// Draw every column of `surface`
pub fn draw_surface(plot_ui: &mut PlotUi, surface: &PlotSurface) {
    let data = &surface.data;
    for (column, style) in data.columns.iter().zip(&surface.styles) {
        let points: Vec<[f64; 2]> = data
            .x
            .iter()
            .zip(column)
            .filter_map(|(&x, value)| value.map(|y| [x, y]))
            .collect();
        let color = color32(style.color);
        let line_style = match &style.dash {
            Some(dash) => LineStyle::Dashed {
                length: dash.first().copied().unwrap_or(5.0),
            },
            None => LineStyle::Solid,
        };
        plot_ui.line(
            Line::new(PlotPoints::new(points))
                .color(color)
                .width(style.width)
                .style(line_style)
                .name(&style.label),
        );

        if style.show_points {
            let real: Vec<[f64; 2]> = data
                .x
                .iter()
                .zip(column)
                .take(data.real_points)
                .filter_map(|(&x, value)| value.map(|y| [x, y]))
                .collect();
            plot_ui.points(
                Points::new(PlotPoints::new(real))
                    .shape(MarkerShape::Circle)
                    .radius(style.width + 1.0)
                    .color(color),
            );
        }
    }
}
