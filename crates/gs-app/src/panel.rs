//! One graph on screen
//!
//! Translates egui input into neutral gesture events and draws whatever
//! the graph's boundary currently holds.

use egui::{PointerButton, Pos2, Ui};
use egui_plot::{Legend, Plot, PlotBounds, VLine};
use gs_core::{GraphId, ZoomRange};
use gs_data::{Marker, MarkerStore};
use gs_render::axis::format_tick_local;
use gs_render::Size;
use gs_views::{GestureEvent, GraphView, Point};

use crate::plot::{color32, draw_surface, PlotFactory};

const PLOT_HEIGHT: f32 = 220.0;

const MARKER_COLOR: egui::Color32 = egui::Color32::from_rgb(0xf5, 0x9e, 0x0b);

/// Half the finger distance a synthetic pinch starts from
const PINCH_HALF_SPAN: f32 = 50.0;

pub struct GraphPanel {
    graph_id: GraphId,
    machine_id: String,
    /// Finger distance of a pinch synthesized from zoom input
    pinch_distance: Option<f32>,
}

impl GraphPanel {
    pub fn new(graph_id: GraphId, machine_id: impl Into<String>) -> Self {
        Self {
            graph_id,
            machine_id: machine_id.into(),
            pinch_distance: None,
        }
    }

    pub fn graph_id(&self) -> &GraphId {
        &self.graph_id
    }

    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    pub fn ui(
        &mut self,
        ui: &mut Ui,
        graph: &mut GraphView,
        factory: &PlotFactory,
        markers: &[Marker],
        marker_store: &MarkerStore,
        now_ms: f64,
    ) {
        self.header(ui, graph);
        graph.set_container_size(Size::new(ui.available_width(), PLOT_HEIGHT));

        let Some(surface) = factory.surface(graph.id().as_str()) else {
            ui.allocate_ui(egui::vec2(ui.available_width(), PLOT_HEIGHT), |ui| {
                ui.centered_and_justified(|ui| ui.weak("Waiting for data"));
            });
            return;
        };

        let scale = surface.scale;
        let span = scale.x.span();
        let placements = graph.visible_markers(markers);
        let plot = Plot::new(("graph", graph.id().as_str()))
            .height(PLOT_HEIGHT)
            .legend(Legend::default())
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_double_click_reset(false)
            .allow_boxed_zoom(true)
            .x_axis_formatter(move |x, _chars, _range| format_tick_local(x, span));

        let response = plot.show(ui, |plot_ui| {
            plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                [scale.x.min, scale.y.min],
                [scale.x.max, scale.y.max],
            ));
            draw_surface(plot_ui, &surface);
            for placement in &placements {
                let marker = &placement.marker;
                plot_ui.vline(
                    VLine::new(marker.timestamp as f64)
                        .color(marker.color.map_or(MARKER_COLOR, color32))
                        .name(&marker.name),
                );
            }
            plot_ui.pointer_coordinate().map(|p| p.x)
        });

        graph.set_cursor(response.inner);

        if response.response.double_clicked() {
            if let Some(x) = response.inner {
                self.add_marker(graph, marker_store, x, markers.len());
            }
        }

        let frame = *response.transform.frame();
        let bounds = response.transform.bounds();
        let selection = ZoomRange::new(bounds.min()[0], bounds.max()[0]);
        for event in self.gestures(ui, &response.response, selection, now_ms) {
            graph.handle_gesture(event, frame.left(), frame.width());
        }
    }

    fn header(&self, ui: &mut Ui, graph: &mut GraphView) {
        ui.horizontal(|ui| {
            ui.strong(&graph.config().title);
            ui.label(graph.display_text());
            ui.weak(format!("{:?}", graph.mode()));
        });

        let titles: Vec<String> = graph
            .series()
            .iter()
            .enumerate()
            .map(|(i, s)| s.display_title(i))
            .collect();
        if titles.len() < 2 {
            return;
        }
        ui.horizontal(|ui| {
            for (index, title) in titles.iter().enumerate() {
                let mut visible = graph.is_visible(index);
                let enabled = !graph.is_last_visible(index);
                let changed = ui.add_enabled(enabled, egui::Checkbox::new(&mut visible, title)).changed();
                if changed {
                    graph.toggle_series(index);
                }
            }
        });
    }

    fn add_marker(&self, graph: &GraphView, store: &MarkerStore, x: f64, existing: usize) {
        let timestamp = x.round() as i64;
        let mut marker = Marker::new(timestamp, format!("Marker {}", existing + 1));
        if let Some(value) = graph.cursor_value(x) {
            marker = marker.with_value(value);
        }
        store.add_marker(&self.machine_id, marker);
        if let Err(err) = store.save() {
            tracing::warn!("Failed to save markers for {}: {}", self.machine_id, err);
        }
    }

    /// Gesture events for this frame's input over the plot
    fn gestures(&mut self, ui: &Ui, response: &egui::Response, selection: ZoomRange, now_ms: f64) -> Vec<GestureEvent> {
        let mut events = Vec::new();

        if response.drag_started_by(PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                events.push(GestureEvent::DragStart { pos: point(pos), time_ms: now_ms });
            }
        } else if response.dragged_by(PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                events.push(GestureEvent::DragMove { pos: point(pos), time_ms: now_ms });
            }
        }
        if response.drag_released_by(PointerButton::Primary) {
            events.push(GestureEvent::DragEnd);
        }

        // egui_plot runs its box zoom on the secondary button
        if response.drag_started_by(PointerButton::Secondary) {
            events.push(GestureEvent::PointerDown { primary: true });
        }
        if response.drag_released_by(PointerButton::Secondary) {
            events.push(GestureEvent::PointerUp { selection: Some(selection) });
        }

        let zoom = ui.input(|i| i.zoom_delta());
        let zooming = response.hovered() && (zoom - 1.0).abs() > f32::EPSILON;
        match (zooming, response.hover_pos()) {
            (true, Some(center)) => {
                let distance = match self.pinch_distance {
                    Some(distance) => distance,
                    None => {
                        events.push(GestureEvent::PinchStart {
                            a: point(center - egui::vec2(PINCH_HALF_SPAN, 0.0)),
                            b: point(center + egui::vec2(PINCH_HALF_SPAN, 0.0)),
                            time_ms: now_ms,
                        });
                        PINCH_HALF_SPAN * 2.0
                    }
                } * zoom;
                self.pinch_distance = Some(distance);
                let half = egui::vec2(distance / 2.0, 0.0);
                events.push(GestureEvent::PinchMove {
                    a: point(center - half),
                    b: point(center + half),
                });
            }
            _ => {
                if self.pinch_distance.take().is_some() {
                    events.push(GestureEvent::PinchEnd { remaining: None, time_ms: now_ms });
                }
            }
        }
        events
    }
}

fn point(pos: Pos2) -> Point {
    Point::new(pos.x, pos.y)
}
