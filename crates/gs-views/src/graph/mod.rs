//! One synchronized graph
//!
//! A [`GraphView`] owns everything that is private to a single graph: its
//! mode machine, the point animation, the gesture translator and the
//! boundary lifecycle. Everything shared with the rest of its group goes
//! through the [`SyncHub`]. Local requests take the same path as hub
//! broadcasts: they are applied to a copy of the last seen [`SyncState`]
//! and the resulting difference drives the graph.

mod config;
mod visible;
pub mod window;

pub use config::GraphConfig;

use gs_core::events::events::{GraphCreated, GraphDestroyed};
use gs_core::mode::ManualScale;
use gs_core::{
    Clock, EventBus, FrameTimer, GraphId, GraphMode, GraphSettings, ModeMachine, ModeTransition, Origin,
    SyncAction, SyncHub, SyncState, TimeWindow, YRange, ZoomRange,
};
use gs_data::{GraphExportSnapshot, Marker, Sample, SeriesData, ValueRenderer};
use gs_render::{AlignedData, BoundaryFactory, ChartSpec, Scale, Size};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::animation::AnimationEngine;
use crate::autorange::autorange;
use crate::gesture::{GestureContext, GestureEvent, GestureOutput, GestureTranslator};
use crate::lifecycle::{ChartLifecycle, LifecycleDecision, RecreateReason};
use crate::markers::{place_markers, MarkerPlacement};
use crate::readout::{cursor_readout, format_display_value};
use visible::VisibleSet;
use window::{historical_window, live_window, with_floor};

/// Same-length data counts as changed once a value moved by more than this
const VALUE_EPSILON: f64 = 0.001;

/// A graph bound to a rendering boundary and, optionally, a sync group
pub struct GraphView {
    id: GraphId,
    config: GraphConfig,
    settings: GraphSettings,
    clock: Arc<dyn Clock>,
    factory: Arc<dyn BoundaryFactory>,
    hub: Option<Arc<SyncHub>>,
    events: Option<Arc<EventBus>>,
    render_value: Option<ValueRenderer>,

    series: Arc<Vec<SeriesData>>,
    /// Read by the export registry
    shared_series: Arc<RwLock<Arc<Vec<SeriesData>>>>,
    visible: Vec<bool>,
    /// Data or mode changed since the boundary was last fed
    dirty: bool,

    lifecycle: ChartLifecycle,
    mode: ModeMachine,
    animation: AnimationEngine,
    gestures: GestureTranslator,

    time_window: TimeWindow,
    show_from: Option<i64>,
    sync_freeze: Option<i64>,
    last_sync: SyncState,
    last_sync_version: Option<u64>,

    processed_count: usize,
    start_timestamp: Option<i64>,
    last_tail: Option<Sample>,
    zoom_notify: FrameTimer,
    pending_zoom: Option<ZoomRange>,
    cursor: Option<f64>,
}

impl GraphView {
    pub fn new(id: GraphId, config: GraphConfig, factory: Arc<dyn BoundaryFactory>, clock: Arc<dyn Clock>) -> Self {
        let settings = GraphSettings::default();
        let time_window = config.default_time_window;
        let series = Arc::new(Vec::new());
        Self {
            id,
            animation: AnimationEngine::new(settings.animation_duration_ms),
            gestures: GestureTranslator::new(&settings),
            config,
            settings,
            clock,
            factory,
            hub: None,
            events: None,
            render_value: None,
            shared_series: Arc::new(RwLock::new(Arc::clone(&series))),
            series,
            visible: Vec::new(),
            dirty: false,
            lifecycle: ChartLifecycle::new(),
            mode: ModeMachine::new(),
            time_window,
            show_from: None,
            sync_freeze: None,
            last_sync: SyncState::new(time_window),
            last_sync_version: None,
            processed_count: 0,
            start_timestamp: None,
            last_tail: None,
            zoom_notify: FrameTimer::new(),
            pending_zoom: None,
            cursor: None,
        }
    }

    pub fn with_settings(mut self, settings: GraphSettings) -> Self {
        self.animation = AnimationEngine::new(settings.animation_duration_ms);
        self.gestures = GestureTranslator::new(&settings);
        self.settings = settings;
        self
    }

    pub fn with_hub(mut self, hub: Arc<SyncHub>) -> Self {
        self.attach_hub(hub);
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn with_value_renderer(mut self, render: ValueRenderer) -> Self {
        self.render_value = Some(render);
        self
    }

    /// Join a sync group and adopt its current state
    pub fn attach_hub(&mut self, hub: Arc<SyncHub>) {
        self.hub = Some(hub);
        self.last_sync_version = None;
        self.sync_from_hub();
    }

    pub fn id(&self) -> &GraphId {
        &self.id
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    pub fn mode(&self) -> GraphMode {
        self.mode.mode()
    }

    pub fn is_live(&self) -> bool {
        self.mode.mode().is_live()
    }

    pub fn time_window(&self) -> TimeWindow {
        self.time_window
    }

    pub fn show_from(&self) -> Option<i64> {
        self.show_from
    }

    pub fn manual_scale(&self) -> Option<ManualScale> {
        match self.mode.mode() {
            GraphMode::Manual => self.mode.manual_scale(),
            _ => None,
        }
    }

    pub fn series(&self) -> &[SeriesData] {
        &self.series
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    pub fn processed_count(&self) -> usize {
        self.processed_count
    }

    pub fn real_points(&self) -> usize {
        self.animation.real_points()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_animating()
    }

    pub fn start_timestamp(&self) -> Option<i64> {
        self.start_timestamp
    }

    pub fn is_built(&self) -> bool {
        self.lifecycle.is_built()
    }

    /// Current boundary scale, if a boundary exists
    pub fn scale(&self) -> Option<Scale> {
        self.lifecycle.handle().and_then(|h| h.scale())
    }

    /// Replace the graph's series
    ///
    /// Visibility is kept per series id. Changing the set of ids rebuilds the
    /// boundary; new samples on the same ids only feed it.
    pub fn set_data(&mut self, series: Vec<SeriesData>) {
        let ids_changed = series.len() != self.series.len()
            || series.iter().zip(self.series.iter()).any(|(new, old)| new.id != old.id);
        if ids_changed {
            let old = &self.series;
            let visible = &self.visible;
            let mut flags: Vec<bool> = series
                .iter()
                .map(|s| {
                    old.iter()
                        .position(|o| o.id == s.id)
                        .map_or(true, |i| visible.get(i).copied().unwrap_or(true))
                })
                .collect();
            if !flags.is_empty() && !flags.iter().any(|&v| v) {
                flags[0] = true;
            }
            self.visible = flags;
            if self.lifecycle.is_built() {
                self.lifecycle.invalidate(RecreateReason::SeriesChanged);
            }
        }

        let series = Arc::new(series);
        *self.shared_series.write() = Arc::clone(&series);
        self.series = series;
        self.dirty = true;
        self.lifecycle.data_changed();
    }

    pub fn set_container_size(&mut self, size: Size) {
        self.lifecycle.set_container_size(size);
    }

    /// Whether `index` is the only visible series and so cannot be hidden
    pub fn is_last_visible(&self, index: usize) -> bool {
        self.is_visible(index) && self.visible.iter().filter(|&&v| v).count() == 1
    }

    /// Show or hide one series
    ///
    /// Hiding the last visible series is refused and returns `false`.
    pub fn toggle_series(&mut self, index: usize) -> bool {
        if index >= self.visible.len() {
            return false;
        }
        if self.is_last_visible(index) {
            tracing::debug!("Graph {} keeps its last visible series", self.id);
            return false;
        }
        self.visible[index] = !self.visible[index];
        self.animation.cancel();
        self.processed_count = 0;
        self.lifecycle.invalidate(RecreateReason::VisibilityChanged);
        true
    }

    /// Advance one frame
    pub fn tick(&mut self, now_ms: f64) {
        self.sync_from_hub();
        self.flush_zoom_notify(now_ms);

        let series = Arc::clone(&self.series);
        let Some(set) = VisibleSet::new(&series, &self.visible) else {
            self.teardown_without_data();
            return;
        };

        match self.lifecycle.decide(&set.identity(), set.has_data()) {
            LifecycleDecision::Idle => {
                if !set.has_data() {
                    self.teardown_without_data();
                }
            }
            LifecycleDecision::Recreate(reason) => self.recreate(reason, &set),
            LifecycleDecision::Feed => match self.mode.mode() {
                GraphMode::Live => self.step_live(now_ms, &set),
                GraphMode::Historical | GraphMode::Manual => self.step_frozen(&set),
            },
        }
    }

    fn teardown_without_data(&mut self) {
        if self.lifecycle.teardown() {
            self.animation.reset();
            self.processed_count = 0;
            self.publish_destroyed("no data");
        }
    }

    fn recreate(&mut self, reason: RecreateReason, set: &VisibleSet<'_>) {
        let had_boundary = self.lifecycle.is_built();
        self.animation.reset();
        self.processed_count = 0;
        self.last_tail = None;

        let primary = set.primary_samples();
        self.start_timestamp = set.first_timestamp();
        let x = self.window_for(set, true);
        let y = match self.manual_scale() {
            Some(manual) => manual.y,
            None => autorange(&set.columns(primary), Some(x), &set.overlay_values()),
        };
        let spec = ChartSpec {
            graph_id: self.id.to_string(),
            title: self.config.title.clone(),
            styles: set.styles(&self.config),
            data: AlignedData::from_aligned(&set.aligned(primary), usize::MAX),
            initial_scale: Scale { x, y },
        };

        if self.lifecycle.build(self.factory.as_ref(), &spec, set.identity()).is_err() {
            if had_boundary {
                self.publish_destroyed(&reason.to_string());
            }
            return;
        }
        self.animation.commit_immediately(primary);
        self.processed_count = primary.len();
        self.dirty = false;
        tracing::debug!("Graph {} built its boundary ({})", self.id, reason);

        if let Some(events) = &self.events {
            if had_boundary {
                events.publish(GraphDestroyed {
                    graph_id: self.id.to_string(),
                    reason: reason.to_string(),
                });
            }
            events.publish(GraphCreated {
                graph_id: self.id.to_string(),
                series_count: set.identity().len(),
            });
        }
    }

    fn step_live(&mut self, now_ms: f64, set: &VisibleSet<'_>) {
        let target = set.primary_samples();

        // Full reprocess after a mode switch, a toggle or a source reset
        if self.processed_count == 0 || target.len() < self.animation.rendered().len() {
            self.animation.commit_immediately(target);
            self.processed_count = target.len();
            self.start_timestamp = set.first_timestamp();
            self.last_tail = None;
            self.dirty = false;
            self.push_line(set, target, false);
            return;
        }

        if !self.animation.is_animating() && target.len() > self.animation.rendered().len() {
            self.animation.start(target, now_ms);
        }
        if let Some(frame) = self.animation.tick(now_ms) {
            let line = self.animation.frame_samples(&frame);
            self.push_line(set, &line, !frame.completed);
            if frame.completed {
                self.processed_count = self.animation.rendered().len();
                if frame.remaining > 0 {
                    self.animation.start(target, now_ms);
                }
            }
            return;
        }

        if !self.dirty {
            return;
        }
        self.dirty = false;

        if values_differ(target, self.animation.rendered()) {
            self.animation.commit_immediately(target);
            self.push_line(set, target, false);
            return;
        }

        // Newer uncommitted reading drawn as a provisional tail
        let rendered_end = self.animation.rendered().last().map(|s| s.timestamp);
        if let Some(current) = set.current() {
            let newer = rendered_end.map_or(true, |end| current.timestamp > end);
            if newer && self.last_tail != Some(current) {
                let mut line = self.animation.rendered().to_vec();
                line.push(current);
                self.last_tail = Some(current);
                self.push_line(set, &line, true);
            }
        }
    }

    fn step_frozen(&mut self, set: &VisibleSet<'_>) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        let target = set.primary_samples();
        self.animation.commit_immediately(target);
        self.processed_count = target.len();
        self.push_line(set, target, false);
    }

    /// Feed `line` as the primary series; a live graph also follows its end
    fn push_line(&mut self, set: &VisibleSet<'_>, line: &[Sample], provisional: bool) {
        let aligned = set.aligned(line);
        let real_points = if provisional {
            let committed_end = self.animation.rendered().last().map(|s| s.timestamp);
            aligned.timestamps.partition_point(|&t| Some(t) <= committed_end)
        } else {
            aligned.len()
        };
        let data = AlignedData::from_aligned(&aligned, real_points);

        let follow = if self.mode.mode().is_live() {
            let end = line.last().map_or_else(|| self.live_end(), |s| s.timestamp);
            let first = self.start_timestamp.or_else(|| set.first_timestamp());
            let x = with_floor(live_window(self.time_window, first, end, false), self.show_from);
            let y = autorange(&set.columns(line), Some(x), &set.overlay_values());
            Some((x, y))
        } else {
            None
        };

        if let Some(handle) = self.lifecycle.handle_mut() {
            handle.set_data(&data);
            if let Some((x, y)) = follow {
                handle.set_x_scale(x);
                handle.set_y_scale(y);
            }
        }
    }

    /// X window for the current mode
    fn window_for(&self, set: &VisibleSet<'_>, initial: bool) -> ZoomRange {
        let first = set.first_timestamp();
        let range = match (self.mode.mode(), self.mode.manual_scale()) {
            (GraphMode::Manual, Some(manual)) => return manual.x,
            (GraphMode::Live, _) => {
                let end = set.live_end().unwrap_or_else(|| self.clock.now_ms() as i64);
                live_window(self.time_window, first, end, initial)
            }
            _ => historical_window(self.time_window, first, self.historical_end()),
        };
        with_floor(range, self.show_from)
    }

    fn recompute_view(&mut self) {
        if !self.lifecycle.is_built() {
            return;
        }
        let series = Arc::clone(&self.series);
        let Some(set) = VisibleSet::new(&series, &self.visible) else {
            return;
        };
        let (x, y) = match self.manual_scale() {
            Some(manual) => (manual.x, manual.y),
            None => {
                let x = self.window_for(&set, false);
                let y = autorange(&set.columns(set.primary_samples()), Some(x), &set.overlay_values());
                (x, y)
            }
        };
        if let Some(handle) = self.lifecycle.handle_mut() {
            handle.set_x_scale(x);
            handle.set_y_scale(y);
        }
    }

    fn apply_transition(&mut self, transition: ModeTransition) -> bool {
        if transition.changed() {
            tracing::info!("Graph {} {:?} -> {:?}", self.id, transition.from, transition.to);
        }
        if transition.cancel_animation {
            self.animation.cancel();
            self.dirty = true;
        }
        if transition.reset_processed_count {
            self.processed_count = 0;
            self.last_tail = None;
        }
        transition.recompute_view
    }

    /// Y range for an explicit X range
    fn autorange_in(&self, range: ZoomRange) -> YRange {
        let series = Arc::clone(&self.series);
        match VisibleSet::new(&series, &self.visible) {
            Some(set) => autorange(&set.columns(set.primary_samples()), Some(range), &set.overlay_values()),
            None => YRange::default(),
        }
    }

    /// Translate a gesture on the plotting area at `left..left + width`
    pub fn handle_gesture(&mut self, event: GestureEvent, left: f32, width: f32) -> GestureOutput {
        let ctx = GestureContext {
            x_range: self.visible_window().unwrap_or(ZoomRange::new(0.0, 1.0)),
            left,
            width,
        };
        let output = self.gestures.handle(event, &ctx);
        if let GestureOutput::Pan(range) | GestureOutput::Zoom(range) = output {
            if self.lifecycle.is_built() {
                self.apply_user_zoom(range);
            }
        }
        output
    }

    /// Programmatic zoom; behaves exactly like a gesture
    pub fn zoom_to(&mut self, range: ZoomRange) -> bool {
        if !range.is_valid() {
            return false;
        }
        self.apply_user_zoom(range);
        true
    }

    fn apply_user_zoom(&mut self, range: ZoomRange) {
        let y = self.autorange_in(range);
        if let Some(handle) = self.lifecycle.handle_mut() {
            handle.set_x_scale(range);
            handle.set_y_scale(y);
        }

        let freeze = self
            .sync_freeze
            .or_else(|| self.mode.freeze_timestamp())
            .unwrap_or_else(|| self.live_end());
        let transition = self.mode.enter_manual(ManualScale { x: range, y }, freeze);
        self.apply_transition(transition);
        self.last_sync.apply(&SyncAction::Zoom { range, live_end: freeze });
        self.sync_freeze = self.last_sync.historical_freeze_timestamp;

        self.pending_zoom = Some(range);
        self.zoom_notify.schedule(self.clock.now_ms(), self.settings.zoom_notify_debounce_ms);
    }

    fn flush_zoom_notify(&mut self, now_ms: f64) {
        if !self.zoom_notify.fire_if_due(now_ms) {
            return;
        }
        let Some(range) = self.pending_zoom.take() else {
            return;
        };
        if let Some(hub) = &self.hub {
            let live_end = self.historical_end();
            let outcome = hub.submit(Origin::Graph(self.id.clone()), SyncAction::Zoom { range, live_end });
            tracing::debug!("Graph {} zoom notify: {:?}", self.id, outcome);
        }
    }

    pub fn set_time_window(&mut self, window: TimeWindow) -> bool {
        self.request(SyncAction::SetTimeWindow(window))
    }

    pub fn switch_to_live(&mut self) -> bool {
        self.request(SyncAction::SwitchToLive)
    }

    /// Freeze at this graph's live end
    pub fn switch_to_historical(&mut self) -> bool {
        let freeze = self.live_end();
        self.request(SyncAction::SwitchToHistorical { freeze: Some(freeze) })
    }

    pub fn set_show_from(&mut self, timestamp: Option<i64>) -> bool {
        self.request(SyncAction::SetShowFrom(timestamp))
    }

    /// Ask the group for a change and apply it locally once accepted
    fn request(&mut self, action: SyncAction) -> bool {
        if let Some(hub) = &self.hub {
            let outcome = hub.submit(Origin::Graph(self.id.clone()), action.clone());
            if !outcome.is_accepted() {
                return false;
            }
        }
        // A zoom still waiting to be announced is superseded
        self.pending_zoom = None;
        self.zoom_notify.cancel();

        let mut predicted = self.last_sync.clone();
        predicted.apply(&action);
        self.apply_sync_state(&predicted);
        true
    }

    fn sync_from_hub(&mut self) {
        let Some(hub) = &self.hub else {
            return;
        };
        let snapshot = hub.snapshot();
        if self.last_sync_version == Some(snapshot.version) {
            return;
        }
        self.last_sync_version = Some(snapshot.version);
        self.apply_sync_state(&snapshot.state);
    }

    /// Bring this graph in line with a group state
    ///
    /// Only the fields that differ from the last state seen are acted on, so
    /// applying the same state twice changes nothing.
    pub fn apply_sync_state(&mut self, state: &SyncState) {
        if *state == self.last_sync {
            return;
        }
        let previous = std::mem::replace(&mut self.last_sync, state.clone());
        self.sync_freeze = state.historical_freeze_timestamp;
        let freeze = state.historical_freeze_timestamp.unwrap_or_else(|| self.live_end());

        let mut recompute = false;
        if state.show_from_timestamp != previous.show_from_timestamp {
            self.show_from = state.show_from_timestamp;
            recompute = true;
        }
        if state.time_window != previous.time_window {
            self.time_window = state.time_window;
            let transition = self.mode.select_time_window(state.time_window, freeze);
            recompute |= self.apply_transition(transition);
        }

        let transition = match state.mode {
            GraphMode::Live => Some(self.mode.switch_to_live()),
            GraphMode::Historical => Some(self.mode.switch_to_historical(freeze)),
            GraphMode::Manual => match state.zoom_range {
                Some(range) if self.accepts_remote_zoom(range) => {
                    let y = self.autorange_in(range);
                    if let Some(handle) = self.lifecycle.handle_mut() {
                        handle.set_x_scale(range);
                        handle.set_y_scale(y);
                    }
                    Some(self.mode.enter_manual(ManualScale { x: range, y }, freeze))
                }
                _ => None,
            },
        };
        if let Some(transition) = transition {
            recompute |= self.apply_transition(transition);
        }

        if self.mode.mode() == GraphMode::Manual {
            self.animation.cancel();
            self.processed_count = 0;
        } else if recompute {
            self.recompute_view();
        }
    }

    /// A broadcast zoom is ignored while this graph has its own in flight
    fn accepts_remote_zoom(&self, range: ZoomRange) -> bool {
        !self.gestures.is_active()
            && self.pending_zoom.is_none()
            && self.manual_scale().map_or(true, |manual| manual.x != range)
    }

    /// Newest timestamp among the visible series, committed or current
    pub fn latest_timestamp(&self) -> Option<i64> {
        VisibleSet::new(&self.series, &self.visible).and_then(|set| set.live_end())
    }

    /// [`GraphView::latest_timestamp`], or the clock when there is no data
    pub fn live_end(&self) -> i64 {
        self.latest_timestamp().unwrap_or_else(|| self.clock.now_ms() as i64)
    }

    /// End of the historical window: group freeze, own freeze, live end
    pub fn historical_end(&self) -> i64 {
        self.sync_freeze
            .or_else(|| self.mode.historical_end())
            .unwrap_or_else(|| self.live_end())
    }

    /// X range currently shown
    pub fn visible_window(&self) -> Option<ZoomRange> {
        if let Some(scale) = self.scale() {
            return Some(scale.x);
        }
        let set = VisibleSet::new(&self.series, &self.visible)?;
        set.has_data().then(|| self.window_for(&set, true))
    }

    pub fn set_cursor(&mut self, timestamp_ms: Option<f64>) {
        self.cursor = timestamp_ms;
    }

    /// Primary series value under a cursor at `timestamp_ms`
    pub fn cursor_value(&self, timestamp_ms: f64) -> Option<f64> {
        let set = VisibleSet::new(&self.series, &self.visible)?;
        cursor_readout(set.primary_samples(), set.current(), timestamp_ms, self.settings.cursor_snap_ms)
    }

    /// Cursor value, or the newest value without a cursor
    pub fn display_value(&self) -> Option<f64> {
        if let Some(value) = self.cursor.and_then(|t| self.cursor_value(t)) {
            return Some(value);
        }
        let set = VisibleSet::new(&self.series, &self.visible)?;
        set.current()
            .or_else(|| set.primary_samples().last().copied())
            .map(|s| s.value)
    }

    /// Header readout including the unit
    pub fn display_text(&self) -> String {
        let value = self.display_value();
        let text = format_display_value(value, self.render_value.as_ref());
        match (&self.config.unit, value) {
            (Some(unit), Some(_)) => format!("{} {}", text, unit),
            _ => text,
        }
    }

    /// Placements of `markers` inside the visible window
    pub fn visible_markers(&self, markers: &[Marker]) -> Vec<MarkerPlacement> {
        match self.scale() {
            Some(scale) => place_markers(markers, scale.x, scale.y),
            None => Vec::new(),
        }
    }

    /// Everything needed to export this graph; all series, hidden ones too
    pub fn export_snapshot(&self) -> GraphExportSnapshot {
        GraphExportSnapshot {
            graph_title: self.config.title.clone(),
            series: self.series.to_vec(),
            unit: self.config.unit.clone(),
            render_value: self.render_value.clone(),
        }
    }

    /// Snapshot closure for an export registry
    ///
    /// The closure yields `None` once the graph has been dropped.
    pub fn export_source(&self) -> impl Fn() -> Option<GraphExportSnapshot> + Send + Sync + 'static {
        let cell = Arc::downgrade(&self.shared_series);
        let title = self.config.title.clone();
        let unit = self.config.unit.clone();
        let render_value = self.render_value.clone();
        move || {
            let cell = cell.upgrade()?;
            let series: Vec<SeriesData> = cell.read().iter().cloned().collect();
            Some(GraphExportSnapshot {
                graph_title: title.clone(),
                series,
                unit: unit.clone(),
                render_value: render_value.clone(),
            })
        }
    }

    fn publish_destroyed(&self, reason: &str) {
        tracing::debug!("Graph {} tore down its boundary ({})", self.id, reason);
        if let Some(events) = &self.events {
            events.publish(GraphDestroyed {
                graph_id: self.id.to_string(),
                reason: reason.to_string(),
            });
        }
    }
}

impl std::fmt::Debug for GraphView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphView")
            .field("id", &self.id)
            .field("mode", &self.mode.mode())
            .field("time_window", &self.time_window)
            .field("series", &self.series.len())
            .field("built", &self.lifecycle.is_built())
            .finish()
    }
}

fn values_differ(a: &[Sample], b: &[Sample]) -> bool {
    a.len() != b.len()
        || a.iter()
            .zip(b)
            .any(|(x, y)| x.timestamp != y.timestamp || (x.value - y.value).abs() > VALUE_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_core::ManualClock;
    use gs_data::TimeSeries;
    use gs_render::{BoundaryCall, RecordingFactory};

    fn series(id: &str, points: &[(i64, f64)]) -> SeriesData {
        SeriesData::new(id).with_series(TimeSeries::from_samples(points.iter().map(|&(t, v)| Sample::new(t, v))))
    }

    fn graph(factory: Arc<RecordingFactory>) -> GraphView {
        let clock = Arc::new(ManualClock::new(100_000.0));
        let mut graph = GraphView::new(GraphId::new("g"), GraphConfig::new("Speed"), factory, clock);
        graph.set_container_size(Size::new(400.0, 200.0));
        graph
    }

    #[test]
    fn test_nothing_rendered_without_data() {
        let factory = Arc::new(RecordingFactory::new());
        let mut graph = graph(factory.clone());
        graph.tick(0.0);
        graph.set_data(vec![SeriesData::new("empty")]);
        graph.tick(16.0);
        assert!(!graph.is_built());
        assert_eq!(factory.created(), 0);
        assert_eq!(graph.display_text(), "N/A");
    }

    #[test]
    fn test_visibility_survives_reordering() {
        let factory = Arc::new(RecordingFactory::new());
        let mut graph = graph(factory);
        graph.set_data(vec![series("a", &[(0, 1.0)]), series("b", &[(0, 2.0)])]);
        assert!(graph.toggle_series(1));
        assert!(graph.is_last_visible(0));

        graph.set_data(vec![series("b", &[(0, 2.0)]), series("a", &[(0, 1.0)]), series("c", &[])]);
        assert!(!graph.is_visible(0));
        assert!(graph.is_visible(1));
        assert!(graph.is_visible(2));
    }

    #[test]
    fn test_local_switches_without_a_hub() {
        let factory = Arc::new(RecordingFactory::new());
        let mut graph = graph(factory.clone());
        graph.set_data(vec![series("a", &[(90_000, 1.0), (95_000, 2.0)])]);
        graph.tick(0.0);
        assert!(graph.is_built());

        assert!(graph.switch_to_historical());
        assert_eq!(graph.mode(), GraphMode::Historical);
        assert_eq!(graph.historical_end(), 95_000);

        assert!(graph.set_time_window(TimeWindow::seconds(2)));
        assert_eq!(factory.log().last_x_scale(), Some(ZoomRange::new(93_000.0, 95_000.0)));

        assert!(graph.switch_to_live());
        assert_eq!(graph.mode(), GraphMode::Live);
        assert_eq!(graph.processed_count(), 0);
    }

    #[test]
    fn test_same_length_value_change_refeeds_without_animation() {
        let factory = Arc::new(RecordingFactory::new());
        let mut graph = graph(factory.clone());
        graph.set_data(vec![series("a", &[(0, 1.0), (1_000, 2.0)])]);
        graph.tick(0.0);

        graph.set_data(vec![series("a", &[(0, 1.0), (1_000, 2.5)])]);
        graph.tick(16.0);
        assert!(!graph.is_animating());
        let data = factory.log().last_data().unwrap();
        assert_eq!(data.columns[0], vec![Some(1.0), Some(2.5)]);

        // A change below the epsilon is ignored
        factory.log().clear();
        graph.set_data(vec![series("a", &[(0, 1.0), (1_000, 2.5004)])]);
        graph.tick(32.0);
        assert_eq!(factory.log().count(|c| matches!(c, BoundaryCall::SetData { .. })), 0);
    }

    #[test]
    fn test_live_tail_is_provisional() {
        let factory = Arc::new(RecordingFactory::new());
        let mut graph = graph(factory.clone());
        let mut data = TimeSeries::from_samples([Sample::new(0, 1.0), Sample::new(1_000, 2.0)]);
        graph.set_data(vec![SeriesData::new("a").with_series(data.clone())]);
        graph.tick(0.0);

        data.set_current(Some(Sample::new(1_400, 2.4)));
        graph.set_data(vec![SeriesData::new("a").with_series(data)]);
        graph.tick(16.0);

        let fed = factory.log().last_data().unwrap();
        assert_eq!(fed.x, vec![0.0, 1_000.0, 1_400.0]);
        assert_eq!(fed.real_points, 2);
        assert_eq!(factory.log().last_x_scale().map(|r| r.max), Some(1_400.0));
        assert_eq!(graph.display_value(), Some(2.4));
    }

    #[test]
    fn test_markers_follow_the_scale() {
        let factory = Arc::new(RecordingFactory::new());
        let mut graph = graph(factory);
        assert!(graph.visible_markers(&[Marker::new(0, "m")]).is_empty());

        graph.set_data(vec![series("a", &[(0, 0.0), (10_000, 10.0)])]);
        graph.tick(0.0);
        graph.zoom_to(ZoomRange::new(0.0, 10_000.0));
        let placed = graph.visible_markers(&[Marker::new(5_000, "half"), Marker::new(20_000, "later")]);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].x_ratio, 0.5);
    }

    #[test]
    fn test_export_source_outlives_nothing() {
        let factory = Arc::new(RecordingFactory::new());
        let mut graph = graph(factory);
        graph.set_data(vec![series("a", &[(0, 1.0)]), series("b", &[(0, 2.0)])]);
        graph.toggle_series(1);

        let source = graph.export_source();
        let snapshot = source().unwrap();
        assert_eq!(snapshot.graph_title, "Speed");
        assert_eq!(snapshot.series.len(), 2);

        drop(graph);
        assert!(source().is_none());
    }
}
