//! Time windows and axis ranges

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const SECOND_MS: i64 = 1_000;
const MINUTE_MS: i64 = 60 * SECOND_MS;
const HOUR_MS: i64 = 60 * MINUTE_MS;

/// How much history a graph shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeWindow {
    /// A trailing window of this many milliseconds
    Duration(i64),
    /// Everything since the first sample
    All,
}

impl TimeWindow {
    pub fn minutes(minutes: i64) -> Self {
        TimeWindow::Duration(minutes * MINUTE_MS)
    }

    pub fn seconds(seconds: i64) -> Self {
        TimeWindow::Duration(seconds * SECOND_MS)
    }

    /// Window length in milliseconds, `None` for [`TimeWindow::All`]
    pub fn duration_ms(&self) -> Option<i64> {
        match self {
            TimeWindow::Duration(ms) => Some(*ms),
            TimeWindow::All => None,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, TimeWindow::All)
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow::minutes(30)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TimeWindow::All => write!(f, "all"),
            TimeWindow::Duration(ms) if ms > 0 && ms % HOUR_MS == 0 => write!(f, "{}h", ms / HOUR_MS),
            TimeWindow::Duration(ms) if ms > 0 && ms % MINUTE_MS == 0 => write!(f, "{}m", ms / MINUTE_MS),
            TimeWindow::Duration(ms) if ms > 0 && ms % SECOND_MS == 0 => write!(f, "{}s", ms / SECOND_MS),
            TimeWindow::Duration(ms) => write!(f, "{}ms", ms),
        }
    }
}

/// Error returned when a time window string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time window '{0}'")]
pub struct ParseTimeWindowError(String);

impl FromStr for TimeWindow {
    type Err = ParseTimeWindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(TimeWindow::All);
        }
        let duration: Duration = humantime::parse_duration(trimmed)
            .map_err(|_| ParseTimeWindowError(s.to_string()))?;
        let ms = i64::try_from(duration.as_millis()).map_err(|_| ParseTimeWindowError(s.to_string()))?;
        if ms == 0 {
            return Err(ParseTimeWindowError(s.to_string()));
        }
        Ok(TimeWindow::Duration(ms))
    }
}

impl TryFrom<String> for TimeWindow {
    type Error = ParseTimeWindowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeWindow> for String {
    fn from(window: TimeWindow) -> Self {
        window.to_string()
    }
}

/// A selectable time window with its label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindowPreset {
    pub label: String,
    pub window: TimeWindow,
}

impl TimeWindowPreset {
    pub fn new(window: TimeWindow) -> Self {
        let label = match window {
            TimeWindow::All => "Show All".to_string(),
            other => other.to_string(),
        };
        Self { label, window }
    }

    /// The presets offered by the graph controls
    pub fn defaults() -> Vec<TimeWindowPreset> {
        [
            TimeWindow::seconds(10),
            TimeWindow::seconds(30),
            TimeWindow::minutes(1),
            TimeWindow::minutes(5),
            TimeWindow::minutes(10),
            TimeWindow::minutes(30),
            TimeWindow::minutes(60),
            TimeWindow::minutes(6 * 60),
            TimeWindow::minutes(24 * 60),
            TimeWindow::All,
        ]
        .into_iter()
        .map(TimeWindowPreset::new)
        .collect()
    }
}

/// Horizontal range in timestamp milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
}

impl ZoomRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.min && t <= self.max
    }

    /// Finite and strictly increasing
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.max > self.min
    }

    /// Translate both bounds by `delta`
    pub fn shifted(&self, delta: f64) -> Self {
        Self::new(self.min + delta, self.max + delta)
    }

    /// Divide the span by `factor`, keeping `center` at the same relative position
    pub fn scaled_around(&self, center: f64, factor: f64) -> Self {
        let span = self.span();
        if span <= 0.0 || factor <= 0.0 || !factor.is_finite() {
            return *self;
        }
        let new_span = span / factor;
        let left_ratio = (center - self.min) / span;
        let right_ratio = (self.max - center) / span;
        Self::new(center - new_span * left_ratio, center + new_span * right_ratio)
    }

    /// Raise the lower bound to `floor` when it is below it
    pub fn clamp_min(&self, floor: Option<f64>) -> Self {
        match floor {
            Some(floor) if floor > self.min && floor < self.max => Self::new(floor, self.max),
            _ => *self,
        }
    }
}

/// Vertical value range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YRange {
    pub min: f64,
    pub max: f64,
}

impl YRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

impl Default for YRange {
    fn default() -> Self {
        Self::new(-1.0, 1.0)
    }
}
