use core::fmt::Debug;
use std::path::{Path, PathBuf};

use dyn_clone::{DynClone, clone_trait_object};
use eyre::Result;
use serde::{Deserialize, Serialize};

use crate::{
    metrics::{DerivedTables, EfficiencyRow, SpeedupRow},
    result::ResultRow,
};

/// Read-only inputs every view is built from
#[derive(Debug, Clone, Copy)]
pub struct PlotData<'a> {
    pub rows: &'a [ResultRow],
    pub speedup: &'a [SpeedupRow],
    pub efficiency: &'a [EfficiencyRow],
}

impl<'a> PlotData<'a> {
    pub fn new(rows: &'a [ResultRow], derived: &'a DerivedTables) -> Self {
        Self {
            rows,
            speedup: &derived.speedup,
            efficiency: &derived.efficiency,
        }
    }
}

#[typetag::serde(tag = "type")]
pub trait Plot: Debug + DynClone + Send + Sync {
    /// Artifact name, without extension
    fn name(&self) -> &'static str;
    /// Selects, filters and aggregates the tables into a drawable chart
    ///
    /// Arguments:
    /// * `data` - The raw results table and both derived tables
    fn chart(&self, data: &PlotData<'_>) -> Result<ChartSpec>;
}
clone_trait_object!(Plot);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SeriesStyle {
    /// Line through the points, with a marker on each
    #[default]
    Line,
    /// Markers only
    Scatter,
    /// Dashed line without markers, for ideal/reference curves
    Reference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub style: SeriesStyle,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    pub fn new(label: impl Into<String>, style: SeriesStyle, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            style,
            points,
        }
    }

    pub fn line(label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self::new(label, SeriesStyle::Line, points)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub label: String,
    pub log_scale: bool,
}

impl Axis {
    pub fn linear(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            log_scale: false,
        }
    }

    pub fn log(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            log_scale: true,
        }
    }
}

/// Everything the renderer needs to draw one view
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub series: Vec<Series>,
}

impl ChartSpec {
    pub fn new(title: impl Into<String>, x_axis: Axis, y_axis: Axis) -> Self {
        Self {
            title: title.into(),
            x_axis,
            y_axis,
            series: Vec::new(),
        }
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn series(&self, label: &str) -> Option<&Series> {
        self.series.iter().find(|x| x.label == label)
    }

    /// Data bounds over all points, as `((x_min, x_max), (y_min, y_max))`
    pub fn bounds(&self) -> Option<((f64, f64), (f64, f64))> {
        let mut points = self.series.iter().flat_map(|x| x.points.iter());
        let &(x, y) = points.next()?;
        Some(points.fold(((x, x), (y, y)), |((x0, x1), (y0, y1)), &(x, y)| {
            ((x0.min(x), x1.max(x)), (y0.min(y), y1.max(y)))
        }))
    }
}

/// Vector output only: charts carry their text as `<text>` elements, so no font
/// rasterizer is linked
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Svg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
        }
    }
}

pub fn artifact_path(plot_dir: &Path, name: &str, format: ImageFormat) -> PathBuf {
    plot_dir.join(format!("{name}.{}", format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_every_series() {
        let spec = ChartSpec::new("t", Axis::linear("x"), Axis::log("y"))
            .with_series(Series::line("a", vec![(1.0, 5.0), (4.0, 2.0)]))
            .with_series(Series::new("b", SeriesStyle::Scatter, vec![(8.0, 0.5)]));
        assert_eq!(spec.bounds(), Some(((1.0, 8.0), (0.5, 5.0))));
        assert_eq!(spec.series("b").unwrap().style, SeriesStyle::Scatter);
        assert!(spec.series("c").is_none());
    }

    #[test]
    fn empty_chart_has_no_bounds() {
        let spec = ChartSpec::new("t", Axis::linear("x"), Axis::linear("y"))
            .with_series(Series::line("empty", Vec::new()));
        assert_eq!(spec.bounds(), None);
    }

    #[test]
    fn artifact_names_follow_format() {
        let dir = Path::new("out");
        assert_eq!(
            artifact_path(dir, "speedup_analysis", ImageFormat::Svg),
            PathBuf::from("out/speedup_analysis.svg")
        );
        assert_eq!(
            artifact_path(dir, "density_impact", ImageFormat::default()),
            PathBuf::from("out/density_impact.svg")
        );
    }
}
