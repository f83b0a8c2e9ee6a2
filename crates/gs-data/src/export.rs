//! Export adapter
//!
//! Each mounted graph registers a closure producing its current
//! [`GraphExportSnapshot`]. A group export walks the registry in
//! registration order and writes one CSV row per committed sample.

use chrono::{SecondsFormat, TimeZone, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::series::SeriesData;
use crate::DataError;

/// Formats a value for display, e.g. with a fixed precision
pub type ValueRenderer = Arc<dyn Fn(f64) -> String + Send + Sync>;

type SnapshotFn = Box<dyn Fn() -> Option<GraphExportSnapshot> + Send + Sync>;

/// Everything needed to export one graph
#[derive(Clone)]
pub struct GraphExportSnapshot {
    pub graph_title: String,
    pub series: Vec<SeriesData>,
    /// Unit symbol, e.g. "°C"
    pub unit: Option<String>,
    pub render_value: Option<ValueRenderer>,
}

impl fmt::Debug for GraphExportSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphExportSnapshot")
            .field("graph_title", &self.graph_title)
            .field("series", &self.series.len())
            .field("unit", &self.unit)
            .finish()
    }
}

/// Graph id to snapshot closure, in registration order
#[derive(Clone, Default)]
pub struct ExportRegistry {
    entries: Arc<RwLock<IndexMap<String, SnapshotFn>>>,
}

impl ExportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the snapshot function of a graph
    pub fn register<F>(&self, graph_id: impl Into<String>, snapshot: F)
    where
        F: Fn() -> Option<GraphExportSnapshot> + Send + Sync + 'static,
    {
        let graph_id = graph_id.into();
        tracing::debug!("Registered export snapshot for graph {}", graph_id);
        self.entries.write().insert(graph_id, Box::new(snapshot));
    }

    pub fn unregister(&self, graph_id: &str) -> bool {
        self.entries.write().shift_remove(graph_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn graph_ids(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Call every registered closure
    pub fn collect(&self) -> Vec<(String, GraphExportSnapshot)> {
        self.entries
            .read()
            .iter()
            .filter_map(|(id, snapshot)| snapshot().map(|s| (id.clone(), s)))
            .collect()
    }

    /// Write all registered graphs as CSV; returns the number of data rows
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize, DataError> {
        let snapshots = self.collect();
        let has_data = snapshots
            .iter()
            .any(|(_, s)| s.series.iter().any(|series| !series.samples().is_empty()));
        if !has_data {
            return Err(DataError::NothingToExport);
        }

        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["graph", "series", "timestamp", "iso_time", "value", "display", "unit"])?;

        let mut rows = 0;
        for (_, snapshot) in &snapshots {
            let unit = snapshot.unit.as_deref().unwrap_or("");
            for (index, series) in snapshot.series.iter().enumerate() {
                if series.series.is_none() {
                    continue;
                }
                let title = series.display_title(index);
                for sample in series.samples() {
                    let display = match &snapshot.render_value {
                        Some(render) => render(sample.value),
                        None => sample.value.to_string(),
                    };
                    let timestamp = sample.timestamp.to_string();
                    let iso = iso_time(sample.timestamp);
                    let value = sample.value.to_string();
                    csv.write_record([
                        snapshot.graph_title.as_str(),
                        title.as_str(),
                        timestamp.as_str(),
                        iso.as_str(),
                        value.as_str(),
                        display.as_str(),
                        unit,
                    ])?;
                    rows += 1;
                }
            }
        }
        csv.flush()?;
        Ok(rows)
    }

    /// Write `<group_id>_<timestamp>.csv` into `dir`
    pub fn export_to_dir(&self, dir: &Path, group_id: &str, now_ms: i64) -> Result<(PathBuf, usize), DataError> {
        let stamp = Utc
            .timestamp_millis_opt(now_ms)
            .single()
            .map(|t| t.format("%Y-%m-%dT%H-%M-%S").to_string())
            .unwrap_or_else(|| now_ms.to_string());
        let path = dir.join(format!("{}_{}.csv", sanitize(group_id), stamp));

        let file = File::create(&path)?;
        let rows = match self.export_csv(BufWriter::new(file)) {
            Ok(rows) => rows,
            Err(e) => {
                let _ = std::fs::remove_file(&path);
                return Err(e);
            }
        };
        tracing::info!("Exported {} rows to {}", rows, path.display());
        Ok((path, rows))
    }
}

fn iso_time(timestamp: i64) -> String {
    Utc.timestamp_millis_opt(timestamp)
        .single()
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
