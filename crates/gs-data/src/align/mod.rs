//! Series alignment
//!
//! Merges independently sampled series onto one shared timestamp axis.
//! Missing values stay missing; nothing is interpolated.

use std::collections::BTreeMap;

use crate::series::{OverlayLine, Sample};

/// Several series sharing one sorted, unique timestamp axis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedSeries {
    pub timestamps: Vec<i64>,
    /// One column per input, each `timestamps.len()` long
    pub columns: Vec<Vec<Option<f64>>>,
}

/// Align `inputs` onto the union of their timestamps
///
/// When a series holds the same timestamp more than once the later sample
/// wins.
pub fn align(inputs: &[&[Sample]]) -> AlignedSeries {
    let mut rows: BTreeMap<i64, Vec<Option<f64>>> = BTreeMap::new();
    for (column, samples) in inputs.iter().enumerate() {
        for sample in samples.iter() {
            let row = rows.entry(sample.timestamp).or_insert_with(|| vec![None; inputs.len()]);
            row[column] = Some(sample.value);
        }
    }

    let mut aligned = AlignedSeries {
        timestamps: Vec::with_capacity(rows.len()),
        columns: vec![Vec::with_capacity(rows.len()); inputs.len()],
    };
    for (timestamp, row) in rows {
        aligned.timestamps.push(timestamp);
        for (column, value) in aligned.columns.iter_mut().zip(row) {
            column.push(value);
        }
    }
    aligned
}

impl AlignedSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Append a constant column for every visible overlay line
    pub fn with_overlay_columns<'a>(mut self, lines: impl IntoIterator<Item = &'a OverlayLine>) -> Self {
        let rows = self.timestamps.len();
        for line in lines.into_iter().filter(|line| line.visible) {
            self.columns.push(vec![Some(line.value); rows]);
        }
        self
    }
}
