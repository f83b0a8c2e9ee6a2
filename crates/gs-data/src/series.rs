//! Time series buffers and renderable series descriptions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::DataError;

/// One timestamped reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Epoch milliseconds
    pub timestamp: i64,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Sampling policy of the committed buffer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSeriesConfig {
    /// Minimum spacing between committed samples
    pub sample_interval_ms: i64,
    /// How far back the committed buffer reaches
    pub retention_ms: i64,
}

impl TimeSeriesConfig {
    /// Number of committed samples kept before the oldest are dropped
    pub fn capacity(&self) -> usize {
        let interval = self.sample_interval_ms.max(1);
        let slots = (self.retention_ms + interval - 1) / interval;
        slots.max(1) as usize
    }
}

impl Default for TimeSeriesConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1_000,
            retention_ms: 60 * 60 * 1_000,
        }
    }
}

/// Append-only series with an optional newer "current" sample
///
/// `long` holds committed samples with non-decreasing timestamps. `current`
/// is the most recent reading, which may not have been committed yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    long: Vec<Sample>,
    current: Option<Sample>,
    config: TimeSeriesConfig,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TimeSeriesConfig) -> Self {
        Self {
            long: Vec::new(),
            current: None,
            config,
        }
    }

    /// Build a series from already committed samples
    pub fn from_samples(samples: impl IntoIterator<Item = Sample>) -> Self {
        let mut series = Self::new();
        for sample in samples {
            series.push(sample);
        }
        series
    }

    /// Record a reading from the data source
    ///
    /// The reading always becomes `current`; it is committed to `long` only
    /// once the configured sample interval has passed since the last commit.
    pub fn insert(&mut self, sample: Sample) {
        self.current = Some(sample);
        let due = match self.long.last() {
            Some(last) => sample.timestamp - last.timestamp >= self.config.sample_interval_ms,
            None => true,
        };
        if due {
            self.push(sample);
        }
    }

    /// Commit a sample directly
    ///
    /// Samples older than the last committed one are dropped; returns whether
    /// the sample was kept.
    pub fn push(&mut self, sample: Sample) -> bool {
        if let Some(last) = self.long.last() {
            if sample.timestamp < last.timestamp {
                tracing::debug!(
                    "Dropped out-of-order sample at {} (last committed {})",
                    sample.timestamp,
                    last.timestamp
                );
                return false;
            }
        }
        self.long.push(sample);

        let capacity = self.config.capacity();
        if self.long.len() > capacity {
            let excess = self.long.len() - capacity;
            self.long.drain(..excess);
        }
        true
    }

    pub fn set_current(&mut self, sample: Option<Sample>) {
        self.current = sample;
    }

    /// Drop everything, as a data-source reset would
    pub fn clear(&mut self) {
        self.long.clear();
        self.current = None;
    }

    pub fn long(&self) -> &[Sample] {
        &self.long
    }

    pub fn current(&self) -> Option<Sample> {
        self.current
    }

    pub fn config(&self) -> &TimeSeriesConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.long.len()
    }

    pub fn is_empty(&self) -> bool {
        self.long.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<i64> {
        self.long.first().map(|s| s.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.long.last().map(|s| s.timestamp)
    }

    /// Latest known timestamp, committed or current
    pub fn live_end(&self) -> Option<i64> {
        match (self.last_timestamp(), self.current.map(|c| c.timestamp)) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }
}

/// RGBA colour, written as `#rrggbb` or `#rrggbbaa`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);

    /// Colours handed out to series without an explicit colour
    pub const PALETTE: [Rgba; 5] = [
        Rgba::rgb(0x3b, 0x82, 0xf6),
        Rgba::rgb(0xef, 0x44, 0x44),
        Rgba::rgb(0x10, 0xb9, 0x81),
        Rgba::rgb(0xf5, 0x9e, 0x0b),
        Rgba::rgb(0x8b, 0x5c, 0xf6),
    ];

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn palette(index: usize) -> Self {
        Self::PALETTE[index % Self::PALETTE.len()]
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Rgba {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DataError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a,
        })
    }
}

impl TryFrom<String> for Rgba {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Kind of static reference line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    /// A limit; drawn dashed by default
    Threshold,
    /// A set point the value should follow
    Target,
}

/// Horizontal reference line drawn on top of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayLine {
    pub kind: OverlayKind,
    pub value: f64,
    pub color: Rgba,
    /// Dash pattern in pixels; `None` draws a solid line
    pub dash: Option<Vec<f32>>,
    pub visible: bool,
    pub label: Option<String>,
    pub width: f32,
}

impl OverlayLine {
    pub fn threshold(value: f64, color: Rgba) -> Self {
        Self {
            kind: OverlayKind::Threshold,
            value,
            color,
            dash: Some(vec![5.0, 5.0]),
            visible: true,
            label: None,
            width: 1.0,
        }
    }

    pub fn target(value: f64, color: Rgba) -> Self {
        Self {
            kind: OverlayKind::Target,
            value,
            color,
            dash: None,
            visible: true,
            label: None,
            width: 1.0,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// One renderable line and its reference lines
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesData {
    /// Stable identity, used to detect visibility changes
    pub id: String,
    pub series: Option<TimeSeries>,
    pub title: Option<String>,
    pub color: Option<Rgba>,
    pub overlay_lines: Vec<OverlayLine>,
}

impl SeriesData {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            series: None,
            title: None,
            color: None,
            overlay_lines: Vec::new(),
        }
    }

    pub fn with_series(mut self, series: TimeSeries) -> Self {
        self.series = Some(series);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_overlay(mut self, line: OverlayLine) -> Self {
        self.overlay_lines.push(line);
        self
    }

    /// Title shown in legends and exports
    pub fn display_title(&self, index: usize) -> String {
        self.title.clone().unwrap_or_else(|| format!("Series {}", index + 1))
    }

    /// Explicit colour, or the palette entry for this position
    pub fn display_color(&self, index: usize) -> Rgba {
        self.color.unwrap_or_else(|| Rgba::palette(index))
    }

    /// Committed samples, empty when there is no series
    pub fn samples(&self) -> &[Sample] {
        match &self.series {
            Some(series) => series.long(),
            None => &[],
        }
    }

    pub fn visible_overlays(&self) -> impl Iterator<Item = &OverlayLine> {
        self.overlay_lines.iter().filter(|line| line.visible)
    }
}
