//! The visible slice of a graph's series

use gs_data::{align, AlignedSeries, OverlayKind, OverlayLine, Sample, SeriesData};
use gs_render::SeriesStyle;

use super::GraphConfig;

/// Visible series of one frame, with the primary series picked out
///
/// The primary series drives animation and the live window. It is the
/// first visible series that has committed data.
pub(crate) struct VisibleSet<'a> {
    series: &'a [SeriesData],
    indices: Vec<usize>,
    primary: usize,
}

impl<'a> VisibleSet<'a> {
    /// `None` when the graph has no series at all
    pub(crate) fn new(series: &'a [SeriesData], visible: &[bool]) -> Option<Self> {
        if series.is_empty() {
            return None;
        }
        let mut indices: Vec<usize> = (0..series.len())
            .filter(|&i| visible.get(i).copied().unwrap_or(true))
            .collect();
        if indices.is_empty() {
            indices.push(0);
        }
        let primary = indices
            .iter()
            .copied()
            .find(|&i| !series[i].samples().is_empty())
            .unwrap_or(indices[0]);
        Some(Self {
            series,
            indices,
            primary,
        })
    }

    pub(crate) fn has_data(&self) -> bool {
        !self.primary_samples().is_empty()
    }

    pub(crate) fn identity(&self) -> Vec<String> {
        self.indices.iter().map(|&i| self.series[i].id.clone()).collect()
    }

    pub(crate) fn primary_samples(&self) -> &'a [Sample] {
        self.series[self.primary].samples()
    }

    pub(crate) fn current(&self) -> Option<Sample> {
        self.series[self.primary].series.as_ref().and_then(|s| s.current())
    }

    pub(crate) fn first_timestamp(&self) -> Option<i64> {
        self.primary_samples().first().map(|s| s.timestamp)
    }

    pub(crate) fn live_end(&self) -> Option<i64> {
        self.indices
            .iter()
            .filter_map(|&i| self.series[i].series.as_ref().and_then(|s| s.live_end()))
            .max()
    }

    pub(crate) fn overlays(&self) -> impl Iterator<Item = &'a OverlayLine> + '_ {
        let series = self.series;
        self.indices.iter().flat_map(move |&i| series[i].visible_overlays())
    }

    pub(crate) fn overlay_values(&self) -> Vec<f64> {
        self.overlays().map(|line| line.value).collect()
    }

    /// One sample slice per visible series, `line` standing in for the primary
    pub(crate) fn columns<'b>(&'b self, line: &'b [Sample]) -> Vec<&'b [Sample]> {
        self.indices
            .iter()
            .map(|&i| if i == self.primary { line } else { self.series[i].samples() })
            .collect()
    }

    pub(crate) fn aligned(&self, line: &[Sample]) -> AlignedSeries {
        align(&self.columns(line)).with_overlay_columns(self.overlays())
    }

    /// Styles in column order: series first, then overlay lines
    pub(crate) fn styles(&self, config: &GraphConfig) -> Vec<SeriesStyle> {
        let series = self.indices.iter().map(|&i| {
            let data = &self.series[i];
            SeriesStyle {
                label: data.display_title(i),
                color: data.display_color(i),
                width: config.line_width,
                dash: None,
                show_points: config.show_points,
            }
        });
        let overlays = self.overlays().map(|line| SeriesStyle {
            label: line.label.clone().unwrap_or_else(|| match line.kind {
                OverlayKind::Threshold => "Threshold".to_string(),
                OverlayKind::Target => "Target".to_string(),
            }),
            color: line.color,
            width: line.width,
            dash: line.dash.clone(),
            show_points: false,
        });
        series.chain(overlays).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_data::{Rgba, TimeSeries};

    fn series(id: &str, points: &[(i64, f64)]) -> SeriesData {
        SeriesData::new(id).with_series(TimeSeries::from_samples(points.iter().map(|&(t, v)| Sample::new(t, v))))
    }

    #[test]
    fn test_primary_skips_empty_series() {
        let all = vec![SeriesData::new("empty"), series("b", &[(0, 1.0)])];
        let set = VisibleSet::new(&all, &[true, true]).unwrap();
        assert_eq!(set.primary_samples().len(), 1);
        assert_eq!(set.identity(), vec!["empty".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_hidden_everything_falls_back_to_first() {
        let all = vec![series("a", &[(0, 1.0)]), series("b", &[(0, 2.0)])];
        let set = VisibleSet::new(&all, &[false, false]).unwrap();
        assert_eq!(set.identity(), vec!["a".to_string()]);
        assert!(VisibleSet::new(&[], &[]).is_none());
    }

    #[test]
    fn test_columns_follow_visibility_then_overlays() {
        let all = vec![
            series("a", &[(0, 1.0), (10, 2.0)]).with_overlay(OverlayLine::threshold(5.0, Rgba::BLACK)),
            series("b", &[(5, 3.0)]),
        ];
        let set = VisibleSet::new(&all, &[true, false]).unwrap();
        let aligned = set.aligned(set.primary_samples());
        assert_eq!(aligned.timestamps, vec![0, 10]);
        assert_eq!(aligned.columns.len(), 2);
        assert_eq!(aligned.columns[1], vec![Some(5.0), Some(5.0)]);

        let styles = set.styles(&GraphConfig::default());
        assert_eq!(styles.len(), 2);
        assert_eq!(styles[1].label, "Threshold");
        assert_eq!(styles[1].dash, Some(vec![5.0, 5.0]));
        assert_eq!(set.overlay_values(), vec![5.0]);
    }
}
