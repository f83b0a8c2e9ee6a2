//! A sync group of graphs

use gs_core::{Clock, EventBus, GraphId, SubmitOutcome, SyncHub, SyncSettings, TimeWindow, TimeWindowPreset};
use gs_data::{DataError, ExportRegistry};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::controls::ControlSurface;
use crate::graph::GraphView;

/// Graphs sharing one time window, mode and zoom
pub struct GraphGroup {
    id: String,
    hub: Arc<SyncHub>,
    graphs: IndexMap<GraphId, GraphView>,
    registry: ExportRegistry,
    controls: ControlSurface,
    events: Option<Arc<EventBus>>,
}

impl GraphGroup {
    pub fn new(id: impl Into<String>, settings: SyncSettings, clock: Arc<dyn Clock>) -> Self {
        let id = id.into();
        let hub = Arc::new(SyncHub::new(settings, clock));
        let registry = ExportRegistry::new();
        let controls = ControlSurface::new(id.clone(), Arc::clone(&hub), registry.clone());
        Self {
            id,
            hub,
            graphs: IndexMap::new(),
            registry,
            controls,
            events: None,
        }
    }

    pub fn with_presets(mut self, presets: Vec<TimeWindowPreset>) -> Self {
        self.controls = self.controls.with_presets(presets);
        self
    }

    /// Events from the controls and every graph added afterwards
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.controls = self.controls.with_event_bus(Arc::clone(&bus));
        self.events = Some(bus);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn hub(&self) -> &Arc<SyncHub> {
        &self.hub
    }

    pub fn controls(&self) -> &ControlSurface {
        &self.controls
    }

    pub fn registry(&self) -> &ExportRegistry {
        &self.registry
    }

    /// Join a graph to the group; a graph with the same id is replaced
    pub fn add_graph(&mut self, mut graph: GraphView) -> Option<GraphView> {
        if let Some(events) = &self.events {
            graph = graph.with_event_bus(Arc::clone(events));
        }
        graph.attach_hub(Arc::clone(&self.hub));
        self.registry.register(graph.id().to_string(), graph.export_source());
        tracing::info!("Graph {} joined group {}", graph.id(), self.id);
        self.graphs.insert(graph.id().clone(), graph)
    }

    pub fn remove_graph(&mut self, id: &GraphId) -> Option<GraphView> {
        self.registry.unregister(id.as_str());
        let removed = self.graphs.shift_remove(id);
        if removed.is_some() {
            tracing::info!("Graph {} left group {}", id, self.id);
        }
        removed
    }

    pub fn graph(&self, id: &GraphId) -> Option<&GraphView> {
        self.graphs.get(id)
    }

    pub fn graph_mut(&mut self, id: &GraphId) -> Option<&mut GraphView> {
        self.graphs.get_mut(id)
    }

    pub fn graphs(&self) -> impl Iterator<Item = &GraphView> {
        self.graphs.values()
    }

    pub fn graphs_mut(&mut self) -> impl Iterator<Item = &mut GraphView> {
        self.graphs.values_mut()
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Apply pending sync requests, then advance every graph
    pub fn tick(&mut self, now_ms: f64) {
        self.hub.tick();
        for graph in self.graphs.values_mut() {
            graph.tick(now_ms);
        }
    }

    /// Newest data timestamp across the group
    pub fn latest_timestamp(&self) -> Option<i64> {
        self.graphs.values().filter_map(GraphView::latest_timestamp).max()
    }

    pub fn set_time_window(&self, window: TimeWindow) -> SubmitOutcome {
        self.controls.on_time_window_change(window)
    }

    pub fn switch_to_live(&self) -> SubmitOutcome {
        self.controls.on_switch_to_live()
    }

    /// Freeze every graph at the group's newest data
    pub fn switch_to_historical(&self) -> SubmitOutcome {
        self.controls.on_switch_to_historical(self.latest_timestamp())
    }

    pub fn set_show_from(&self, timestamp: Option<i64>) -> SubmitOutcome {
        self.controls.on_show_from_change(timestamp)
    }

    pub fn export(&self, dir: &Path) -> Result<(PathBuf, usize), DataError> {
        self.controls.on_export(dir)
    }
}

impl std::fmt::Debug for GraphGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphGroup")
            .field("id", &self.id)
            .field("graphs", &self.graphs.keys().collect::<Vec<_>>())
            .field("state", &self.hub.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphConfig;
    use gs_core::{GraphMode, ManualClock};
    use gs_data::{Sample, SeriesData, TimeSeries};
    use gs_render::{RecordingFactory, Size};

    fn graph(id: &str, clock: Arc<ManualClock>, factory: Arc<RecordingFactory>, end: i64) -> GraphView {
        let mut graph = GraphView::new(GraphId::new(id), GraphConfig::new(id), factory, clock);
        graph.set_container_size(Size::new(300.0, 100.0));
        graph.set_data(vec![SeriesData::new("v").with_series(TimeSeries::from_samples([
            Sample::new(end - 1_000, 1.0),
            Sample::new(end, 2.0),
        ]))]);
        graph
    }

    #[test]
    fn test_historical_switch_shares_one_freeze() {
        let clock = Arc::new(ManualClock::new(0.0));
        let factory = Arc::new(RecordingFactory::new());
        let mut group = GraphGroup::new("line", SyncSettings::default(), clock.clone());
        group.add_graph(graph("a", clock.clone(), factory.clone(), 10_000));
        group.add_graph(graph("b", clock.clone(), factory.clone(), 12_000));
        group.tick(clock.now_ms());

        assert!(group.switch_to_historical().is_accepted());
        group.tick(clock.advance(16.0));

        for graph in group.graphs() {
            assert_eq!(graph.mode(), GraphMode::Historical);
            assert_eq!(graph.historical_end(), 12_000);
        }
    }

    #[test]
    fn test_remove_unregisters_export() {
        let clock = Arc::new(ManualClock::new(0.0));
        let factory = Arc::new(RecordingFactory::new());
        let mut group = GraphGroup::new("line", SyncSettings::default(), clock.clone());
        assert!(group.add_graph(graph("a", clock.clone(), factory.clone(), 1_000)).is_none());
        assert!(group.add_graph(graph("b", clock.clone(), factory, 1_000)).is_none());
        assert_eq!(group.registry().graph_ids(), vec!["a".to_string(), "b".to_string()]);

        assert!(group.remove_graph(&GraphId::new("a")).is_some());
        assert_eq!(group.registry().graph_ids(), vec!["b".to_string()]);
        assert_eq!(group.len(), 1);
    }
}
