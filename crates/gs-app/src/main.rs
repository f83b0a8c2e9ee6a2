//! Main application entry point

use ahash::AHashMap;
use anyhow::{Context as _, Result};
use eframe::egui;
use gs_core::events::events::MarkersChanged;
use gs_core::events::typed_handler;
use gs_core::sync::SyncSnapshot;
use gs_core::{Clock, EventBus, GraphId, SyncSubscriber, SystemClock};
use gs_data::{DataError, Marker, MarkerStorage, MarkerStore, OverlayLine, Rgba, SeriesData, TimeSeries};
use gs_render::axis::format_tick_local;
use gs_views::{GraphConfig, GraphGroup, GraphView};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod panel;
mod plot;
mod settings;
mod stream;

use panel::GraphPanel;
use plot::PlotFactory;
use settings::{AppSettings, MachineSettings};
use stream::Reading;

const THRESHOLD_COLOR: Rgba = Rgba::rgb(0xef, 0x44, 0x44);
const TARGET_COLOR: Rgba = Rgba::rgb(0x10, 0xb9, 0x81);

/// Asks egui for a frame whenever the group state changes
struct RepaintOnSync {
    ctx: egui::Context,
}

impl SyncSubscriber for RepaintOnSync {
    fn on_sync_change(&self, _snapshot: &SyncSnapshot) {
        self.ctx.request_repaint();
    }
}

/// Series of one machine as the stream delivered them
struct MachineBuffer {
    graph_id: GraphId,
    series: Vec<SeriesData>,
    changed: bool,
}

impl MachineBuffer {
    fn new(graph_id: GraphId, machine: &MachineSettings) -> Self {
        let series = machine
            .streams
            .iter()
            .enumerate()
            .map(|(index, stream)| {
                let mut data = SeriesData::new(stream.id.clone())
                    .with_title(stream.title.clone())
                    .with_series(TimeSeries::new());
                if index == 0 {
                    if let Some(value) = machine.threshold {
                        data = data.with_overlay(OverlayLine::threshold(value, THRESHOLD_COLOR));
                    }
                    if let Some(value) = machine.target {
                        data = data.with_overlay(OverlayLine::target(value, TARGET_COLOR));
                    }
                }
                data
            })
            .collect();
        Self {
            graph_id,
            series,
            changed: false,
        }
    }

    fn apply(&mut self, stream_id: &str, commit: bool, sample: gs_data::Sample) {
        let Some(series) = self
            .series
            .iter_mut()
            .find(|s| s.id == stream_id)
            .and_then(|s| s.series.as_mut())
        else {
            tracing::debug!("Reading for unknown stream {}", stream_id);
            return;
        };
        if commit {
            series.push(sample);
            series.set_current(None);
        } else {
            series.set_current(Some(sample));
        }
        self.changed = true;
    }
}

/// Main application state
struct GraphSyncApp {
    settings: AppSettings,
    clock: Arc<SystemClock>,
    factory: PlotFactory,
    group: GraphGroup,
    panels: Vec<GraphPanel>,
    machines: AHashMap<String, MachineBuffer>,
    readings: UnboundedReceiver<Reading>,

    markers: MarkerStore,
    marker_cache: AHashMap<String, Vec<Marker>>,
    markers_dirty: Arc<AtomicBool>,

    /// Held so the hub's weak reference stays alive
    _repaint: Arc<RepaintOnSync>,
    /// Keeps the machine tasks running
    _runtime: tokio::runtime::Runtime,
    status: Option<String>,
}

impl GraphSyncApp {
    fn new(
        cc: &eframe::CreationContext<'_>,
        settings: AppSettings,
        runtime: tokio::runtime::Runtime,
        markers: MarkerStore,
        events: Arc<EventBus>,
    ) -> Self {
        let clock = Arc::new(SystemClock);
        let factory = PlotFactory::new();
        let mut group = GraphGroup::new("machines", settings.sync.clone(), clock.clone())
            .with_presets(settings.graph.time_window_presets.clone())
            .with_event_bus(Arc::clone(&events));

        let repaint = Arc::new(RepaintOnSync { ctx: cc.egui_ctx.clone() });
        group.hub().add_subscriber(repaint.clone());

        let markers_dirty = Arc::new(AtomicBool::new(true));
        {
            let dirty = Arc::clone(&markers_dirty);
            let ctx = cc.egui_ctx.clone();
            events.subscribe::<MarkersChanged>(typed_handler(move |e: &MarkersChanged| {
                tracing::debug!("Markers of {} changed ({} total)", e.machine_id, e.marker_count);
                dirty.store(true, Ordering::SeqCst);
                ctx.request_repaint();
            }));
        }

        let mut panels = Vec::new();
        let mut machines = AHashMap::new();
        for machine in &settings.machines {
            let graph_id = GraphId::new(machine.id.clone());
            let mut config = GraphConfig::new(machine.title.clone()).with_machine(machine.id.clone());
            config.default_time_window = settings.sync.default_time_window;
            if let Some(unit) = &machine.unit {
                config = config.with_unit(unit.clone());
            }
            let factory_handle: Arc<dyn gs_render::BoundaryFactory> = Arc::new(factory.clone());
            let graph = GraphView::new(graph_id.clone(), config, factory_handle, clock.clone())
                .with_settings(settings.graph.clone());
            group.add_graph(graph);
            panels.push(GraphPanel::new(graph_id.clone(), machine.id.clone()));
            machines.insert(machine.id.clone(), MachineBuffer::new(graph_id, machine));
        }

        let (sender, readings) = mpsc::unbounded_channel();
        stream::spawn_machines(
            runtime.handle(),
            &settings.machines,
            settings.sample_interval_ms,
            settings.current_interval_ms,
            sender,
        );
        info!("Started {} graphs in group {}", group.len(), group.id());

        Self {
            settings,
            clock,
            factory,
            group,
            panels,
            machines,
            readings,
            markers,
            marker_cache: AHashMap::new(),
            markers_dirty,
            _repaint: repaint,
            _runtime: runtime,
            status: None,
        }
    }

    /// Move everything the machines sent since the last frame into the graphs
    fn drain_readings(&mut self) {
        while let Ok(reading) = self.readings.try_recv() {
            let (machine_id, stream_id, sample, commit) = match reading {
                Reading::Commit { machine_id, stream_id, sample } => (machine_id, stream_id, sample, true),
                Reading::Current { machine_id, stream_id, sample } => (machine_id, stream_id, sample, false),
            };
            if let Some(buffer) = self.machines.get_mut(&machine_id) {
                buffer.apply(&stream_id, commit, sample);
            }
        }

        for buffer in self.machines.values_mut() {
            if !std::mem::take(&mut buffer.changed) {
                continue;
            }
            if let Some(graph) = self.group.graph_mut(&buffer.graph_id) {
                graph.set_data(buffer.series.clone());
            }
        }
    }

    fn refresh_markers(&mut self) {
        if !self.markers_dirty.swap(false, Ordering::SeqCst) {
            return;
        }
        for machine in &self.settings.machines {
            self.marker_cache.insert(machine.id.clone(), self.markers.markers(&machine.id));
        }
    }

    fn controls_ui(&mut self, ui: &mut egui::Ui) {
        let state = self.group.controls().state();
        ui.horizontal(|ui| {
            ui.label("Window");
            let selected = state
                .presets
                .iter()
                .find(|p| p.window == state.time_window)
                .map(|p| p.label.clone())
                .unwrap_or_else(|| state.time_window.to_string());
            egui::ComboBox::from_id_source("time_window")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for preset in &state.presets {
                        if ui
                            .selectable_label(preset.window == state.time_window, &preset.label)
                            .clicked()
                        {
                            self.group.set_time_window(preset.window);
                        }
                    }
                });

            ui.separator();
            if state.is_live {
                if ui.button("Switch to historical").clicked() {
                    self.group.switch_to_historical();
                }
            } else if ui.button("Switch to live").clicked() {
                self.group.switch_to_live();
            }

            ui.separator();
            match state.show_from_timestamp {
                Some(from) => {
                    ui.label(format!("From {}", format_tick_local(from as f64, 0.0)));
                    if ui.button("Show all data").clicked() {
                        self.group.set_show_from(None);
                    }
                }
                None => {
                    if ui.button("Show from now").clicked() {
                        self.group.set_show_from(Some(self.clock.now_ms() as i64));
                    }
                }
            }

            ui.separator();
            if ui.button("Export CSV").clicked() {
                self.status = Some(self.export());
            }
            if let Some(status) = &self.status {
                ui.weak(status);
            }
        });
    }

    fn export(&self) -> String {
        let dir = &self.settings.export_dir;
        if let Err(err) = std::fs::create_dir_all(dir) {
            tracing::warn!("Cannot create export directory {}: {}", dir.display(), err);
            return format!("Export failed: {}", err);
        }
        match self.group.export(dir) {
            Ok((path, rows)) => format!("Exported {} rows to {}", rows, path.display()),
            Err(DataError::NothingToExport) => "Nothing to export".to_string(),
            Err(err) => format!("Export failed: {}", err),
        }
    }
}

impl eframe::App for GraphSyncApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_readings();
        self.refresh_markers();
        let now = self.clock.now_ms();
        self.group.tick(now);

        egui::TopBottomPanel::top("controls").show(ctx, |ui| self.controls_ui(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                for panel in &mut self.panels {
                    let Some(graph) = self.group.graph_mut(panel.graph_id()) else {
                        continue;
                    };
                    let markers = self
                        .marker_cache
                        .get(panel.machine_id())
                        .map(Vec::as_slice)
                        .unwrap_or(&[]);
                    panel.ui(ui, graph, &self.factory, markers, &self.markers, now);
                    ui.separator();
                }
            });
        });

        // Animations and the live window advance every frame
        ctx.request_repaint_after(Duration::from_millis(16));
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = AppSettings::from_env()?;
    info!("Starting graphsync with {} machines", settings.machines.len());

    let events = Arc::new(EventBus::new());
    let markers = match &settings.markers_path {
        Some(path) => MarkerStore::with_storage(MarkerStorage::new(path.clone()))
            .with_context(|| format!("Failed to load markers from {}", path.display()))?,
        None => MarkerStore::new(),
    }
    .with_event_bus(Arc::clone(&events));

    let runtime = tokio::runtime::Runtime::new().context("Failed to start the tokio runtime")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([640.0, 480.0]),
        default_theme: eframe::Theme::Dark,
        persist_window: false,
        ..Default::default()
    };

    eframe::run_native(
        "GraphSync",
        options,
        Box::new(move |cc| Box::new(GraphSyncApp::new(cc, settings, runtime, markers, events))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
