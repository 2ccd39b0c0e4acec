use common::{
    plot::{Axis, ChartSpec, Plot, PlotData, Series},
    result::Implementation,
};
use eyre::Result;
use plot_common::grouped_means;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Mean execution time against problem size on log-log axes, one line per implementation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionTime {
    pub implementations: Vec<Implementation>,
    /// OpenMP runs are only taken at this thread count
    pub openmp_threads: u32,
}

impl Default for ExecutionTime {
    fn default() -> Self {
        Self {
            implementations: Implementation::ALL.to_vec(),
            openmp_threads: 8,
        }
    }
}

#[typetag::serde]
impl Plot for ExecutionTime {
    fn name(&self) -> &'static str {
        "execution_time"
    }

    fn chart(&self, data: &PlotData<'_>) -> Result<ChartSpec> {
        let mut spec = ChartSpec::new(
            "Execution Time vs Problem Size",
            Axis::log("Number of Vertices (N)"),
            Axis::log("Execution Time (ms)"),
        );
        for &implementation in &self.implementations {
            let means = grouped_means(
                data.rows
                    .iter()
                    .filter(|row| row.implementation == implementation)
                    .filter(|row| {
                        implementation != Implementation::OpenMp
                            || row.parallelism == self.openmp_threads
                    })
                    .map(|row| (row.vertices, row.time_ms)),
            );
            if means.is_empty() {
                warn!("No {implementation} rows for execution time");
            }
            let points = means
                .into_iter()
                .map(|(vertices, time)| (vertices as f64, time))
                .collect();
            spec = spec.with_series(Series::line(implementation.name(), points));
        }
        Ok(spec)
    }
}
