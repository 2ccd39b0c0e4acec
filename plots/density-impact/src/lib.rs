use common::{
    plot::{Axis, ChartSpec, Plot, PlotData, Series},
    result::Implementation,
    util::same_density,
};
use eyre::Result;
use plot_common::parallelism_series;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityImpact {
    pub vertices: u64,
    pub densities: Vec<f64>,
}

impl Default for DensityImpact {
    fn default() -> Self {
        Self {
            vertices: 1000,
            densities: vec![0.1, 0.3, 0.5],
        }
    }
}

#[typetag::serde]
impl Plot for DensityImpact {
    fn name(&self) -> &'static str {
        "density_impact"
    }

    fn chart(&self, data: &PlotData<'_>) -> Result<ChartSpec> {
        let mut spec = ChartSpec::new(
            format!(
                "Impact of Graph Density on OpenMP Performance (N={})",
                self.vertices
            ),
            Axis::linear("Number of Threads"),
            Axis::linear("Execution Time (ms)"),
        );
        for &density in &self.densities {
            let points = parallelism_series(
                data.rows,
                |row| {
                    row.implementation == Implementation::OpenMp
                        && row.vertices == self.vertices
                        && same_density(row.density, density)
                },
                |row| row.time_ms,
            );
            if points.is_empty() {
                warn!("No OpenMP rows for N={} density={density}", self.vertices);
            }
            spec = spec.with_series(Series::line(format!("Density={density}"), points));
        }
        Ok(spec)
    }
}
