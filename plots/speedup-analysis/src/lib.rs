use common::{
    plot::{Axis, ChartSpec, Plot, PlotData, Series, SeriesStyle},
    result::Implementation,
};
use eyre::{Result, bail};
use plot_common::parallelism_series;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Speedup over the Serial run against thread/process count, for one problem size
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedupAnalysis {
    pub vertices: u64,
    pub implementations: Vec<Implementation>,
    /// Overlay the ideal `speedup = parallelism` line
    pub reference_line: bool,
}

impl Default for SpeedupAnalysis {
    fn default() -> Self {
        Self {
            vertices: 1000,
            implementations: vec![Implementation::OpenMp, Implementation::Mpi],
            reference_line: true,
        }
    }
}

#[typetag::serde]
impl Plot for SpeedupAnalysis {
    fn name(&self) -> &'static str {
        "speedup_analysis"
    }

    fn chart(&self, data: &PlotData<'_>) -> Result<ChartSpec> {
        let mut spec = ChartSpec::new(
            format!("Speedup Analysis (N={})", self.vertices),
            Axis::linear("Number of Threads/Processes"),
            Axis::linear("Speedup"),
        );

        let mut max_parallelism = 1f64;
        for implementation in &self.implementations {
            if *implementation == Implementation::Serial {
                bail!("Serial runs are the speedup baseline and cannot be plotted");
            }
            let points = parallelism_series(
                data.speedup,
                |row| row.implementation == *implementation && row.vertices == self.vertices,
                |x| x.speedup,
            );
            if points.is_empty() {
                warn!("No {implementation} speedup rows for N={}", self.vertices);
            }
            max_parallelism = points.iter().map(|p| p.0).fold(max_parallelism, f64::max);

            // MPI runs use a single process count per instance, so they are drawn as markers
            let style = match implementation {
                Implementation::Mpi => SeriesStyle::Scatter,
                _ => SeriesStyle::Line,
            };
            spec = spec.with_series(Series::new(implementation.name(), style, points));
        }

        if self.reference_line {
            spec = spec.with_series(Series::new(
                "Linear Speedup",
                SeriesStyle::Reference,
                vec![(1.0, 1.0), (max_parallelism, max_parallelism)],
            ));
        }
        Ok(spec)
    }
}
