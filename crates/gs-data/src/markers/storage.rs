//! JSON persistence for marker lists

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::Marker;
use crate::DataError;

const FORMAT_VERSION: u32 = 1;

/// On-disk layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct MarkerFile {
    version: u32,
    markers_by_machine: BTreeMap<String, Vec<Marker>>,
}

/// Marker lists stored in one JSON file
#[derive(Debug, Clone)]
pub struct MarkerStorage {
    path: PathBuf,
}

impl MarkerStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every machine's markers; a missing file is an empty store
    pub fn load(&self) -> Result<BTreeMap<String, Vec<Marker>>, DataError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let file: MarkerFile = serde_json::from_reader(reader)?;
        if file.version != FORMAT_VERSION {
            tracing::warn!(
                "Marker file {} has version {}, expected {}",
                self.path.display(),
                file.version,
                FORMAT_VERSION
            );
        }
        Ok(file.markers_by_machine)
    }

    /// Replace the file contents
    ///
    /// Writes to a sibling temporary file first so a crash never leaves a
    /// truncated store behind.
    pub fn save(&self, markers_by_machine: &BTreeMap<String, Vec<Marker>>) -> Result<(), DataError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(
                &mut writer,
                &MarkerFile {
                    version: FORMAT_VERSION,
                    markers_by_machine: markers_by_machine.clone(),
                },
            )?;
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
