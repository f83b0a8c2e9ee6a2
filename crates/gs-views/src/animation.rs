//! Point-arrival interpolation
//!
//! New committed samples are not cut in. Each one slides from the previous
//! rendered point to its own position over a fixed duration, one point at a
//! time. The engine keeps no timers of its own: the owner calls
//! [`AnimationEngine::tick`] once per frame with the injected clock's time.

use gs_data::Sample;

/// The step currently in flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub start_ms: f64,
    pub from: Sample,
    pub to: Sample,
    /// Index the target point will occupy in the rendered line
    pub target_index: usize,
    target_len: usize,
}

/// Output of one animation frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    pub timestamp: f64,
    pub value: f64,
    /// Clamped to `[0, 1]`
    pub progress: f64,
    /// The target point has been committed to the rendered line
    pub completed: bool,
    /// Target points still waiting for their own step
    pub remaining: usize,
}

/// One-point-at-a-time interpolator
#[derive(Debug, Clone)]
pub struct AnimationEngine {
    duration_ms: f64,
    state: Option<AnimationState>,
    rendered: Vec<Sample>,
    real_points: usize,
}

impl AnimationEngine {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            duration_ms,
            state: None,
            rendered: Vec::new(),
            real_points: 0,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&AnimationState> {
        self.state.as_ref()
    }

    /// Committed rendered line, without the in-flight point
    pub fn rendered(&self) -> &[Sample] {
        &self.rendered
    }

    /// Number of rendered points drawn as real markers
    pub fn real_points(&self) -> usize {
        self.real_points
    }

    /// Begin sliding in the next target point
    ///
    /// Returns `false` when `target` has no point beyond the rendered line,
    /// which covers a source that was reset or shrank. Any step already in
    /// flight is dropped.
    pub fn start(&mut self, target: &[Sample], now_ms: f64) -> bool {
        let index = self.rendered.len();
        let Some(&to) = target.get(index) else {
            return false;
        };
        let from = self.rendered.last().copied().unwrap_or(to);
        if self.state.is_some() {
            tracing::debug!("Replacing in-flight animation step");
        }
        self.state = Some(AnimationState {
            start_ms: now_ms,
            from,
            to,
            target_index: index,
            target_len: target.len(),
        });
        true
    }

    /// Advance the step in flight
    pub fn tick(&mut self, now_ms: f64) -> Option<AnimationFrame> {
        let state = self.state?;
        let progress = if self.duration_ms > 0.0 {
            ((now_ms - state.start_ms) / self.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };

        if progress >= 1.0 {
            self.state = None;
            self.rendered.push(state.to);
            self.real_points = self.rendered.len();
            return Some(AnimationFrame {
                timestamp: state.to.timestamp as f64,
                value: state.to.value,
                progress: 1.0,
                completed: true,
                remaining: state.target_len.saturating_sub(self.rendered.len()),
            });
        }

        Some(AnimationFrame {
            timestamp: lerp(state.from.timestamp as f64, state.to.timestamp as f64, progress),
            value: lerp(state.from.value, state.to.value, progress),
            progress,
            completed: false,
            remaining: state.target_len.saturating_sub(state.target_index + 1),
        })
    }

    /// Stop the step in flight; the rendered line keeps what it had
    pub fn cancel(&mut self) -> bool {
        self.state.take().is_some()
    }

    /// Replace the rendered line without interpolating
    pub fn commit_immediately(&mut self, target: &[Sample]) {
        self.state = None;
        self.rendered.clear();
        self.rendered.extend_from_slice(target);
        self.real_points = self.rendered.len();
    }

    /// Forget everything, as after the boundary was recreated
    pub fn reset(&mut self) {
        self.state = None;
        self.rendered.clear();
        self.real_points = 0;
    }

    /// Rendered line plus the in-flight point of `frame`
    pub fn frame_samples(&self, frame: &AnimationFrame) -> Vec<Sample> {
        let mut samples = Vec::with_capacity(self.rendered.len() + 1);
        samples.extend_from_slice(&self.rendered);
        if !frame.completed {
            samples.push(Sample::new(frame.timestamp.round() as i64, frame.value));
        }
        samples
    }
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}
