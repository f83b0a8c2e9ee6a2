//! End-to-end behavior of graphs in a sync group

use gs_core::sync::SyncSnapshot;
use gs_core::{Clock, GraphId, GraphMode, ManualClock, SyncSettings, SyncSubscriber, TimeWindow, YRange, ZoomRange};
use gs_data::{align, Sample, SeriesData, TimeSeries};
use gs_render::{BoundaryCall, RecordingFactory, Size};
use gs_views::{autorange, GestureEvent, GestureOutput, GraphConfig, GraphGroup, GraphView, Point};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn series(id: &str, points: &[(i64, f64)]) -> SeriesData {
    SeriesData::new(id).with_series(TimeSeries::from_samples(points.iter().map(|&(t, v)| Sample::new(t, v))))
}

fn graph(id: &str, factory: &Arc<RecordingFactory>, clock: &Arc<ManualClock>) -> GraphView {
    let mut graph = GraphView::new(GraphId::new(id), GraphConfig::new(id), factory.clone(), clock.clone());
    graph.set_container_size(Size::new(300.0, 100.0));
    graph
}

fn last_point(factory: &RecordingFactory) -> (f64, Option<f64>, usize) {
    let data = factory.log().last_data().expect("data was fed");
    let x = *data.x.last().expect("non-empty data");
    let value = *data.columns[0].last().expect("non-empty column");
    (x, value, data.real_points)
}

#[test]
fn test_alignment_is_deterministic() {
    let a = [Sample::new(0, 1.0), Sample::new(20, 2.0), Sample::new(10, 3.0)];
    let b = [Sample::new(10, 4.0), Sample::new(30, 5.0)];
    let first = align(&[&a[..], &b[..]]);
    let second = align(&[&a[..], &b[..]]);
    assert_eq!(first, second);
    assert_eq!(first.timestamps, vec![0, 10, 20, 30]);
}

#[test]
fn test_flat_series_outside_window_autoranges_to_padded_bounds() {
    let flat = [Sample::new(0, 10.0), Sample::new(1, 10.0), Sample::new(2, 10.0)];
    let range = autorange(&[&flat[..]], Some(ZoomRange::new(1_000.0, 2_000.0)), &[]);
    assert_eq!(range, YRange::new(9.0, 11.0));
    assert!(range.min.is_finite() && range.max.is_finite());
}

#[test]
fn test_steady_stream_animates_only_new_points() {
    let clock = Arc::new(ManualClock::new(1_000.0));
    let factory = Arc::new(RecordingFactory::new());
    let mut graph = graph("speed", &factory, &clock);

    graph.set_data(vec![series("v", &[(0, 5.0), (1_000, 6.0)])]);
    graph.tick(clock.now_ms());

    // Initial load shows both points without interpolating
    assert_eq!(factory.created(), 1);
    assert!(!graph.is_animating());
    assert_eq!(graph.real_points(), 2);
    assert_eq!(factory.log().count(|c| matches!(c, BoundaryCall::SetData { .. })), 1);
    assert_eq!(last_point(&factory), (1_000.0, Some(6.0), 2));

    graph.set_data(vec![series("v", &[(0, 5.0), (1_000, 6.0), (2_000, 7.0)])]);
    let mut frames = Vec::new();
    for now in [2_000.0, 2_250.0, 2_500.0, 2_750.0, 3_000.0] {
        clock.set(now);
        graph.tick(now);
        frames.push(last_point(&factory));
    }

    let values: Vec<f64> = frames.iter().filter_map(|&(_, v, _)| v).collect();
    assert_eq!(values, vec![6.0, 6.25, 6.5, 6.75, 7.0]);
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    for &(_, _, real) in &frames[..4] {
        assert_eq!(real, 2);
    }
    assert_eq!(frames[4], (2_000.0, Some(7.0), 3));
    assert!(!graph.is_animating());
    assert_eq!(graph.processed_count(), 3);

    // No boundary was rebuilt for new samples
    assert_eq!(factory.created(), 1);
}

#[test]
fn test_zoom_then_historical_freezes_at_switch() {
    let clock = Arc::new(ManualClock::new(2_000.0));
    let factory = Arc::new(RecordingFactory::new());
    let mut group = GraphGroup::new("line", SyncSettings::default(), clock.clone());
    let id = GraphId::new("speed");

    let mut view = graph("speed", &factory, &clock);
    view.set_data(vec![series("v", &[(0, 1.0), (1_000, 2.0), (2_000, 3.0)])]);
    group.add_graph(view);
    group.tick(clock.now_ms());

    let view = group.graph_mut(&id).expect("graph joined");
    assert_eq!(view.scale().map(|s| s.x), Some(ZoomRange::new(0.0, 2_000.0)));
    let start = GestureEvent::PinchStart {
        a: Point::new(100.0, 50.0),
        b: Point::new(200.0, 50.0),
        time_ms: 2_000.0,
    };
    let spread = GestureEvent::PinchMove {
        a: Point::new(50.0, 50.0),
        b: Point::new(250.0, 50.0),
    };
    assert_eq!(view.handle_gesture(start, 0.0, 300.0), GestureOutput::None);
    assert_eq!(
        view.handle_gesture(spread, 0.0, 300.0),
        GestureOutput::Zoom(ZoomRange::new(500.0, 1_500.0))
    );
    view.handle_gesture(GestureEvent::PinchEnd { remaining: None, time_ms: 2_040.0 }, 0.0, 300.0);
    assert_eq!(view.mode(), GraphMode::Manual);
    assert!(view.manual_scale().is_some());

    // Debounced zoom notify goes out
    group.tick(clock.advance(50.0));
    assert!(group.hub().has_pending());

    assert!(group.switch_to_historical().is_accepted());
    group
        .graph_mut(&id)
        .expect("graph joined")
        .set_data(vec![series("v", &[(0, 1.0), (1_000, 2.0), (2_000, 3.0), (3_000, 4.0)])]);
    group.tick(clock.advance(16.0));

    let view = group.graph(&id).expect("graph joined");
    assert_eq!(view.mode(), GraphMode::Historical);
    assert!(view.manual_scale().is_none());
    assert_eq!(view.historical_end(), 2_000);
    let x = view.scale().expect("built").x;
    assert_eq!(x.max, 2_000.0);
    assert_eq!(x.span(), 30.0 * 60.0 * 1_000.0);
    assert_eq!(group.hub().state().historical_freeze_timestamp, Some(2_000));
}

#[test]
fn test_historical_after_zoom_freezes_at_newest_data() {
    let clock = Arc::new(ManualClock::new(2_000.0));
    let factory = Arc::new(RecordingFactory::new());
    let mut group = GraphGroup::new("line", SyncSettings::default(), clock.clone());
    let id = GraphId::new("speed");

    let mut view = graph("speed", &factory, &clock);
    view.set_data(vec![series("v", &[(0, 1.0), (1_000, 2.0), (2_000, 3.0)])]);
    group.add_graph(view);
    group.tick(clock.now_ms());

    assert!(group.graph_mut(&id).expect("graph joined").zoom_to(ZoomRange::new(500.0, 1_500.0)));
    group.tick(clock.advance(50.0));
    group.tick(clock.advance(16.0));
    assert_eq!(group.hub().state().mode, GraphMode::Manual);
    assert_eq!(group.hub().state().historical_freeze_timestamp, Some(2_000));

    // Data keeps arriving while the user looks at the zoomed range
    group
        .graph_mut(&id)
        .expect("graph joined")
        .set_data(vec![series("v", &[(0, 1.0), (1_000, 2.0), (2_000, 3.0), (9_000, 4.0)])]);
    group.tick(clock.advance(16.0));

    assert!(group.switch_to_historical().is_accepted());
    group.tick(clock.advance(16.0));

    let view = group.graph(&id).expect("graph joined");
    assert_eq!(view.mode(), GraphMode::Historical);
    assert!(view.manual_scale().is_none());
    assert_eq!(view.historical_end(), 9_000);
    assert_eq!(view.scale().expect("built").x.max, 9_000.0);
    assert_eq!(group.hub().state().historical_freeze_timestamp, Some(9_000));
}

fn pair(clock: &Arc<ManualClock>) -> (GraphGroup, GraphId, GraphId) {
    let factory = Arc::new(RecordingFactory::new());
    let mut group = GraphGroup::new("line", SyncSettings::default(), clock.clone());
    for id in ["a", "b"] {
        let mut view = graph(id, &factory, clock);
        view.set_data(vec![series("v", &[(0, 1.0), (1_000, 2.0), (2_000, 3.0)])]);
        group.add_graph(view);
    }
    group.tick(clock.now_ms());
    (group, GraphId::new("a"), GraphId::new("b"))
}

/// Start a horizontal drag on `view`, then move it `dx` pixels past recognition
fn drag_by(view: &mut GraphView, dx: f32, time_ms: f64) -> GestureOutput {
    view.handle_gesture(GestureEvent::DragStart { pos: Point::new(50.0, 50.0), time_ms }, 0.0, 200.0);
    let recognized = GestureEvent::DragMove {
        pos: Point::new(75.0, 50.0),
        time_ms: time_ms + 10.0,
    };
    assert_eq!(view.handle_gesture(recognized, 0.0, 200.0), GestureOutput::None);
    let step = GestureEvent::DragMove {
        pos: Point::new(75.0 + dx, 50.0),
        time_ms: time_ms + 20.0,
    };
    view.handle_gesture(step, 0.0, 200.0)
}

#[test]
fn test_pan_on_one_graph_moves_the_group() {
    let clock = Arc::new(ManualClock::new(2_000.0));
    let (mut group, a, b) = pair(&clock);
    assert_eq!(
        group.graph(&b).and_then(|g| g.scale()).map(|s| s.x),
        Some(ZoomRange::new(0.0, 2_000.0))
    );

    // 30 px right at 10 ms/px
    let view = group.graph_mut(&a).expect("graph joined");
    assert_eq!(drag_by(view, 30.0, 2_000.0), GestureOutput::Pan(ZoomRange::new(-300.0, 1_700.0)));
    view.handle_gesture(GestureEvent::DragEnd, 0.0, 200.0);

    // Past the notify debounce, then the hub applies on the next frame
    group.tick(clock.advance(50.0));
    group.tick(clock.advance(16.0));

    for id in [&a, &b] {
        let view = group.graph(id).expect("graph joined");
        assert_eq!(view.mode(), GraphMode::Manual, "{}", id.as_str());
        assert_eq!(view.scale().map(|s| s.x), Some(ZoomRange::new(-300.0, 1_700.0)));
    }
    assert_eq!(group.hub().state().zoom_range, Some(ZoomRange::new(-300.0, 1_700.0)));
}

#[test]
fn test_remote_zoom_waits_for_local_gesture() {
    let clock = Arc::new(ManualClock::new(2_000.0));
    let (mut group, a, b) = pair(&clock);

    assert!(group.graph_mut(&b).expect("graph joined").zoom_to(ZoomRange::new(500.0, 1_500.0)));
    group.tick(clock.advance(50.0));
    assert!(group.hub().has_pending());

    // A is mid-drag when B's zoom is broadcast
    let view = group.graph_mut(&a).expect("graph joined");
    assert_eq!(drag_by(view, 30.0, 2_050.0), GestureOutput::Pan(ZoomRange::new(-300.0, 1_700.0)));
    group.tick(clock.advance(16.0));

    assert_eq!(group.hub().state().zoom_range, Some(ZoomRange::new(500.0, 1_500.0)));
    let view = group.graph(&a).expect("graph joined");
    assert_eq!(view.mode(), GraphMode::Manual);
    assert_eq!(view.scale().map(|s| s.x), Some(ZoomRange::new(-300.0, 1_700.0)));
    assert_eq!(view.manual_scale().map(|m| m.x), Some(ZoomRange::new(-300.0, 1_700.0)));
    assert_eq!(
        group.graph(&b).and_then(|g| g.scale()).map(|s| s.x),
        Some(ZoomRange::new(500.0, 1_500.0))
    );
}

#[test]
fn test_historical_end_ignores_new_data_until_live() {
    let clock = Arc::new(ManualClock::new(2_000.0));
    let factory = Arc::new(RecordingFactory::new());
    let mut group = GraphGroup::new("line", SyncSettings::default(), clock.clone());
    let id = GraphId::new("speed");

    let mut view = graph("speed", &factory, &clock);
    view.set_data(vec![series("v", &[(1_000, 1.0), (2_000, 2.0)])]);
    group.add_graph(view);
    group.tick(clock.now_ms());

    group.switch_to_historical();
    group.tick(clock.advance(16.0));

    let mut points = vec![(1_000, 1.0), (2_000, 2.0)];
    for step in 1..=3 {
        points.push((2_000 + step * 1_000, step as f64));
        group.graph_mut(&id).expect("graph joined").set_data(vec![series("v", &points)]);
        group.tick(clock.advance(1_000.0));

        let view = group.graph(&id).expect("graph joined");
        assert_eq!(view.historical_end(), 2_000);
        assert_eq!(view.scale().map(|s| s.x.max), Some(2_000.0));
        assert!(!view.is_animating());
    }

    group.switch_to_live();
    group.tick(clock.advance(16.0));
    let view = group.graph(&id).expect("graph joined");
    assert_eq!(view.mode(), GraphMode::Live);
    assert_eq!(view.scale().map(|s| s.x.max), Some(5_000.0));
}

#[test]
fn test_hiding_a_series_recreates_and_keeps_the_last() {
    let clock = Arc::new(ManualClock::new(1_000.0));
    let factory = Arc::new(RecordingFactory::new());
    let mut view = graph("temps", &factory, &clock);
    view.set_data(vec![
        series("a", &[(0, 1.0), (1_000, 2.0)]),
        series("b", &[(0, 3.0), (1_000, 4.0)]),
    ]);
    view.tick(clock.now_ms());
    assert_eq!(factory.created(), 1);

    assert!(view.toggle_series(1));
    view.tick(clock.advance(16.0));

    assert_eq!(factory.created(), 2);
    assert_eq!(factory.log().count(|c| matches!(c, BoundaryCall::Destroyed { .. })), 1);
    let columns: Vec<usize> = factory
        .log()
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            BoundaryCall::Created { columns, .. } => Some(columns),
            _ => None,
        })
        .collect();
    assert_eq!(columns, vec![2, 1]);
    assert!(view.is_visible(0));
    assert!(!view.is_visible(1));

    assert!(view.is_last_visible(0));
    assert!(!view.toggle_series(0));
    view.tick(clock.advance(16.0));
    assert_eq!(factory.created(), 2);
}

struct CountingSubscriber(AtomicUsize);

impl SyncSubscriber for CountingSubscriber {
    fn on_sync_change(&self, _snapshot: &SyncSnapshot) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_repeated_state_changes_nothing() {
    let clock = Arc::new(ManualClock::new(2_000.0));
    let factory = Arc::new(RecordingFactory::new());
    let mut group = GraphGroup::new("line", SyncSettings::default(), clock.clone());
    let id = GraphId::new("speed");
    let subscriber = Arc::new(CountingSubscriber(AtomicUsize::new(0)));
    group.hub().add_subscriber(subscriber.clone());

    let mut view = graph("speed", &factory, &clock);
    view.set_data(vec![series("v", &[(0, 1.0), (1_000, 2.0), (2_000, 3.0)])]);
    group.add_graph(view);
    group.tick(clock.now_ms());

    group.set_time_window(TimeWindow::seconds(1));
    group.tick(clock.advance(16.0));
    assert_eq!(subscriber.0.load(Ordering::SeqCst), 1);
    assert_eq!(
        group.graph(&id).and_then(|g| g.scale()).map(|s| s.x),
        Some(ZoomRange::new(1_000.0, 2_000.0))
    );
    let calls = factory.log().calls().len();

    group.set_time_window(TimeWindow::seconds(1));
    group.tick(clock.advance(16.0));
    let state = group.hub().state();
    let view = group.graph_mut(&id).expect("graph joined");
    view.apply_sync_state(&state);
    view.apply_sync_state(&state);

    assert_eq!(subscriber.0.load(Ordering::SeqCst), 1);
    assert_eq!(group.hub().version(), 1);
    assert_eq!(factory.log().calls().len(), calls);
}

#[test]
fn test_every_transition_lands_in_one_mode() {
    let clock = Arc::new(ManualClock::new(2_000.0));
    let factory = Arc::new(RecordingFactory::new());
    let mut group = GraphGroup::new("line", SyncSettings::default(), clock.clone());
    let id = GraphId::new("speed");

    let mut view = graph("speed", &factory, &clock);
    view.set_data(vec![series("v", &[(0, 1.0), (1_000, 2.0), (2_000, 3.0)])]);
    group.add_graph(view);
    group.tick(clock.now_ms());
    assert_eq!(group.graph(&id).map(GraphView::mode), Some(GraphMode::Live));

    group
        .graph_mut(&id)
        .expect("graph joined")
        .zoom_to(ZoomRange::new(500.0, 1_500.0));
    group.tick(clock.advance(50.0));
    group.tick(clock.advance(16.0));
    assert_eq!(group.graph(&id).map(GraphView::mode), Some(GraphMode::Manual));
    assert_eq!(group.hub().state().mode, GraphMode::Manual);

    // A preset leaves manual mode for the historical branch
    group.set_time_window(TimeWindow::minutes(5));
    group.tick(clock.advance(16.0));
    assert_eq!(group.graph(&id).map(GraphView::mode), Some(GraphMode::Historical));
    assert!(!group.controls().state().is_live);

    // "All" always returns to live
    group.set_time_window(TimeWindow::All);
    group.tick(clock.advance(16.0));
    assert_eq!(group.graph(&id).map(GraphView::mode), Some(GraphMode::Live));
    assert!(group.controls().state().is_live);
}
