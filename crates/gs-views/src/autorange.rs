//! Vertical autorange

use gs_core::{YRange, ZoomRange};
use gs_data::Sample;

/// Fraction of the data span added above and below
const PADDING: f64 = 0.1;

/// Y range for the samples visible inside `window`
///
/// Values outside the window are ignored unless none remain, in which case
/// every value of every series is used. `overlay_values` always take part.
/// Degenerate input never produces NaN or a zero-height range.
pub fn autorange(series: &[&[Sample]], window: Option<ZoomRange>, overlay_values: &[f64]) -> YRange {
    let in_window = |s: &&Sample| window.map_or(true, |w| w.contains(s.timestamp as f64));

    let mut bounds = Bounds::default();
    for samples in series {
        samples.iter().filter(in_window).for_each(|s| bounds.include(s.value));
    }
    if bounds.is_empty() {
        for samples in series {
            samples.iter().for_each(|s| bounds.include(s.value));
        }
    }
    overlay_values.iter().for_each(|&v| bounds.include(v));

    bounds.padded()
}

/// Running min/max over finite values
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: f64,
    max: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Bounds {
    fn include(&mut self, value: f64) {
        if value.is_finite() {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
    }

    fn is_empty(&self) -> bool {
        self.min > self.max
    }

    fn padded(&self) -> YRange {
        if self.is_empty() {
            return YRange::default();
        }
        let range = self.max - self.min;
        if range > 0.0 {
            let pad = range * PADDING;
            return YRange::new(self.min - pad, self.max + pad);
        }
        let pad = self.max.abs() * PADDING;
        if pad > 0.0 {
            YRange::new(self.min - pad, self.max + pad)
        } else {
            YRange::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(points: &[(i64, f64)]) -> Vec<Sample> {
        points.iter().map(|&(t, v)| Sample::new(t, v)).collect()
    }

    #[test]
    fn test_pads_by_ten_percent() {
        let a = samples(&[(0, 0.0), (1, 10.0)]);
        let range = autorange(&[&a], None, &[]);
        assert_eq!(range, YRange::new(-1.0, 11.0));
    }

    #[test]
    fn test_only_window_values_count() {
        let a = samples(&[(0, 100.0), (10, 1.0), (20, 3.0)]);
        let range = autorange(&[&a], Some(ZoomRange::new(5.0, 25.0)), &[]);
        assert!((range.min - 0.8).abs() < 1e-9);
        assert!((range.max - 3.2).abs() < 1e-9);
    }

    #[test]
    fn test_empty_window_falls_back_to_everything() {
        let a = samples(&[(0, 10.0), (1, 10.0), (2, 10.0)]);
        let range = autorange(&[&a], Some(ZoomRange::new(100.0, 200.0)), &[]);
        assert_eq!(range, YRange::new(9.0, 11.0));
        assert!(range.min.is_finite() && range.max.is_finite());
    }

    #[test]
    fn test_zero_values_default() {
        let a = samples(&[(0, 0.0), (1, 0.0)]);
        assert_eq!(autorange(&[&a], None, &[]), YRange::new(-1.0, 1.0));
        assert_eq!(autorange(&[], None, &[]), YRange::new(-1.0, 1.0));
    }

    #[test]
    fn test_overlays_widen_the_range() {
        let a = samples(&[(0, 1.0), (1, 2.0)]);
        let range = autorange(&[&a], None, &[12.0]);
        assert!((range.min - -0.1).abs() < 1e-9);
        assert!((range.max - 13.1).abs() < 1e-9);
    }

    #[test]
    fn test_multiple_series_and_nan() {
        let a = samples(&[(0, 1.0), (1, f64::NAN)]);
        let b = samples(&[(0, -4.0), (5, 6.0)]);
        let range = autorange(&[&a, &b], None, &[]);
        assert_eq!(range, YRange::new(-5.0, 7.0));
    }
}
