//! Application settings

use anyhow::{Context, Result};
use gs_core::{GraphSettings, SyncSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a JSON settings file
pub const SETTINGS_ENV: &str = "GRAPHSYNC_SETTINGS";

/// Everything the binary can be configured with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub sync: SyncSettings,
    pub graph: GraphSettings,

    /// Machines shown, one graph each
    pub machines: Vec<MachineSettings>,

    /// Committed samples per machine are produced this often
    pub sample_interval_ms: u64,

    /// Live readings between commits are produced this often
    pub current_interval_ms: u64,

    /// Directory CSV exports are written to
    pub export_dir: PathBuf,

    /// Marker persistence file; markers are kept in memory when unset
    pub markers_path: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            sync: SyncSettings::default(),
            graph: GraphSettings::default(),
            machines: vec![
                MachineSettings {
                    id: "press-1".to_string(),
                    title: "Press 1 pressure".to_string(),
                    unit: Some("bar".to_string()),
                    threshold: Some(118.0),
                    target: None,
                    streams: vec![StreamSettings::new("pressure", "Pressure", 100.0, 15.0, 40.0)],
                },
                MachineSettings {
                    id: "oven-1".to_string(),
                    title: "Oven 1 temperature".to_string(),
                    unit: Some("°C".to_string()),
                    threshold: None,
                    target: Some(220.0),
                    streams: vec![
                        StreamSettings::new("top", "Top", 220.0, 6.0, 90.0),
                        StreamSettings::new("bottom", "Bottom", 205.0, 4.0, 120.0),
                    ],
                },
            ],
            sample_interval_ms: 1_000,
            current_interval_ms: 250,
            export_dir: PathBuf::from("exports"),
            markers_path: None,
        }
    }
}

/// One machine and the signals it reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSettings {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub target: Option<f64>,
    pub streams: Vec<StreamSettings>,
}

/// A simulated signal: a slow wave around `base`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSettings {
    pub id: String,
    pub title: String,
    pub base: f64,
    pub amplitude: f64,
    pub period_s: f64,
}

impl StreamSettings {
    pub fn new(id: &str, title: &str, base: f64, amplitude: f64, period_s: f64) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            base,
            amplitude,
            period_s,
        }
    }
}

impl AppSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Settings from [`SETTINGS_ENV`], or the defaults when it is unset
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(SETTINGS_ENV) {
            Some(path) => {
                let path = PathBuf::from(path);
                tracing::info!("Loading settings from {}", path.display());
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }
}
