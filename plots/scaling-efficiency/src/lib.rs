use common::{
    plot::{Axis, ChartSpec, Plot, PlotData, Series},
    result::Implementation,
};
use eyre::Result;
use plot_common::{parallelism_series, size_label};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// OpenMP parallel efficiency against thread count, one line per problem size
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingEfficiency {
    pub vertices: Vec<u64>,
}

impl Default for ScalingEfficiency {
    fn default() -> Self {
        Self {
            vertices: vec![200, 500, 1000],
        }
    }
}

#[typetag::serde]
impl Plot for ScalingEfficiency {
    fn name(&self) -> &'static str {
        "scaling_efficiency"
    }

    fn chart(&self, data: &PlotData<'_>) -> Result<ChartSpec> {
        let mut spec = ChartSpec::new(
            "Strong Scaling Efficiency (OpenMP)",
            Axis::linear("Number of Threads"),
            Axis::linear("Parallel Efficiency (%)"),
        );
        for &vertices in &self.vertices {
            let points = parallelism_series(
                data.efficiency,
                |row| row.implementation == Implementation::OpenMp && row.vertices == vertices,
                |x| x.efficiency_pct,
            );
            if points.is_empty() {
                warn!("No efficiency rows for N={vertices}");
            }
            spec = spec.with_series(Series::line(size_label(vertices), points));
        }
        Ok(spec)
    }
}
