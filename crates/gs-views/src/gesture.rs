//! Pointer and touch gestures to scale changes
//!
//! The translator sees toolkit-neutral events. A host maps its own pointer
//! and touch callbacks onto [`GestureEvent`] and applies whatever
//! [`GestureOutput`] comes back.

use gs_core::{GraphSettings, ZoomRange};

/// A vertical travel at or above this cancels horizontal drag recognition
const DRAG_MAX_VERTICAL_PX: f32 = 10.0;

/// Horizontal travel must exceed this multiple of the vertical travel
const DRAG_DOMINANCE: f32 = 4.0;

/// Screen position in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Toolkit-neutral input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// One finger or pointer went down
    DragStart { pos: Point, time_ms: f64 },
    DragMove { pos: Point, time_ms: f64 },
    /// All fingers lifted
    DragEnd,
    PinchStart { a: Point, b: Point, time_ms: f64 },
    PinchMove { a: Point, b: Point },
    /// A pinch finger lifted; `remaining` is the finger still down, if any
    PinchEnd { remaining: Option<Point>, time_ms: f64 },
    /// Mouse button pressed over the plot
    PointerDown { primary: bool },
    /// Mouse button released, with the range of the box the boundary drew
    PointerUp { selection: Option<ZoomRange> },
    Wheel,
}

/// What the host should do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutput {
    None,
    /// Shift the X range
    Pan(ZoomRange),
    /// Replace the X range
    Zoom(ZoomRange),
    /// The boundary's own box zoom may run
    BoxZoomArmed,
    /// Swallow the event so the page does not scroll
    ConsumeScroll,
}

/// Where the plot sits on screen and what it currently shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureContext {
    pub x_range: ZoomRange,
    /// Left edge of the plotting area
    pub left: f32,
    /// Width of the plotting area
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Unknown,
    Horizontal,
}

/// Turns gesture sequences into pan/zoom ranges
#[derive(Debug, Clone)]
pub struct GestureTranslator {
    drag_threshold_px: f32,
    drag_min_step_px: f32,
    drag_recognition_ms: f64,

    touch_start: Option<(Point, f64)>,
    direction: Direction,
    dragging: bool,
    last_drag_x: f32,
    pinching: bool,
    last_pinch_distance: f32,
    pinch_center: Point,
    box_zoom_armed: bool,
}

impl GestureTranslator {
    pub fn new(settings: &GraphSettings) -> Self {
        Self {
            drag_threshold_px: settings.drag_threshold_px,
            drag_min_step_px: settings.drag_min_step_px,
            drag_recognition_ms: settings.drag_recognition_ms,
            touch_start: None,
            direction: Direction::Unknown,
            dragging: false,
            last_drag_x: 0.0,
            pinching: false,
            last_pinch_distance: 0.0,
            pinch_center: Point::default(),
            box_zoom_armed: false,
        }
    }

    /// A drag or pinch is in progress
    pub fn is_active(&self) -> bool {
        self.dragging || self.pinching
    }

    pub fn is_box_zoom_armed(&self) -> bool {
        self.box_zoom_armed
    }

    pub fn handle(&mut self, event: GestureEvent, ctx: &GestureContext) -> GestureOutput {
        match event {
            GestureEvent::DragStart { pos, time_ms } => {
                self.touch_start = Some((pos, time_ms));
                self.direction = Direction::Unknown;
                self.dragging = false;
                GestureOutput::None
            }
            GestureEvent::DragMove { pos, time_ms } => self.drag_move(pos, time_ms, ctx),
            GestureEvent::DragEnd => {
                self.reset();
                GestureOutput::None
            }
            GestureEvent::PinchStart { a, b, time_ms } => {
                self.pinching = true;
                self.dragging = false;
                self.direction = Direction::Horizontal;
                self.last_pinch_distance = a.distance(b);
                self.pinch_center = a.midpoint(b);
                self.touch_start = Some((a, time_ms));
                GestureOutput::None
            }
            GestureEvent::PinchMove { a, b } => self.pinch_move(a, b, ctx),
            GestureEvent::PinchEnd { remaining, time_ms } => {
                match remaining {
                    Some(pos) if self.pinching => {
                        // The finger left behind may start a fresh drag
                        self.pinching = false;
                        self.dragging = false;
                        self.direction = Direction::Unknown;
                        self.touch_start = Some((pos, time_ms));
                    }
                    Some(_) => {}
                    None => self.reset(),
                }
                GestureOutput::None
            }
            GestureEvent::PointerDown { primary } => {
                if primary {
                    self.box_zoom_armed = true;
                    GestureOutput::BoxZoomArmed
                } else {
                    GestureOutput::None
                }
            }
            GestureEvent::PointerUp { selection } => {
                let armed = std::mem::take(&mut self.box_zoom_armed);
                match selection {
                    Some(range) if armed && range.is_valid() => GestureOutput::Zoom(range),
                    _ => GestureOutput::None,
                }
            }
            GestureEvent::Wheel => GestureOutput::ConsumeScroll,
        }
    }

    fn drag_move(&mut self, pos: Point, time_ms: f64, ctx: &GestureContext) -> GestureOutput {
        let Some((start, started_at)) = self.touch_start else {
            return GestureOutput::None;
        };
        if self.pinching {
            return GestureOutput::None;
        }

        if self.direction == Direction::Unknown {
            let dx = (pos.x - start.x).abs();
            let dy = (pos.y - start.y).abs();
            let elapsed = time_ms - started_at;
            if dx > self.drag_threshold_px
                && dy < DRAG_MAX_VERTICAL_PX
                && dx > dy * DRAG_DOMINANCE
                && elapsed < self.drag_recognition_ms
            {
                self.direction = Direction::Horizontal;
                self.dragging = true;
                self.last_drag_x = pos.x;
            }
            return GestureOutput::None;
        }

        if !self.dragging || ctx.width <= 0.0 {
            return GestureOutput::None;
        }
        let delta_px = pos.x - self.last_drag_x;
        if delta_px.abs() <= self.drag_min_step_px {
            return GestureOutput::None;
        }
        self.last_drag_x = pos.x;

        let ms_per_px = ctx.x_range.span() / ctx.width as f64;
        GestureOutput::Pan(ctx.x_range.shifted(-(delta_px as f64) * ms_per_px))
    }

    fn pinch_move(&mut self, a: Point, b: Point, ctx: &GestureContext) -> GestureOutput {
        if !self.pinching || self.last_pinch_distance <= 0.0 || ctx.width <= 0.0 {
            return GestureOutput::None;
        }
        let distance = a.distance(b);
        if distance <= 0.0 {
            return GestureOutput::None;
        }
        let factor = (distance / self.last_pinch_distance) as f64;
        self.last_pinch_distance = distance;

        let relative = ((self.pinch_center.x - ctx.left) / ctx.width) as f64;
        let center = ctx.x_range.min + ctx.x_range.span() * relative;
        let zoomed = ctx.x_range.scaled_around(center, factor);
        if zoomed.is_valid() {
            GestureOutput::Zoom(zoomed)
        } else {
            GestureOutput::None
        }
    }

    fn reset(&mut self) {
        self.touch_start = None;
        self.direction = Direction::Unknown;
        self.dragging = false;
        self.pinching = false;
        self.last_pinch_distance = 0.0;
    }
}
