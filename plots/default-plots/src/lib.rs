use common::plot::Plot;
pub use density_impact::DensityImpact;
pub use execution_time::ExecutionTime;
pub use scaling_efficiency::ScalingEfficiency;
pub use speedup_analysis::SpeedupAnalysis;

/// The four standard views with their default parameters
pub fn default_plots() -> Vec<Box<dyn Plot>> {
    vec![
        Box::new(SpeedupAnalysis::default()),
        Box::new(ScalingEfficiency::default()),
        Box::new(ExecutionTime::default()),
        Box::new(DensityImpact::default()),
    ]
}

/// Makes sure every plot crate is linked so its typetag registration is visible to config parsing
pub fn init_plots() -> serde_json::Result<()> {
    for plot in default_plots() {
        serde_json::to_string(&plot)?;
    }
    Ok(())
}
