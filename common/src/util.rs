/// Tolerance used when matching densities given in a config against table values
const DENSITY_TOLERANCE: f64 = 1e-9;

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

pub fn same_density(a: f64, b: f64) -> bool {
    (a - b).abs() < DENSITY_TOLERANCE
}

pub fn format_tick(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{value:.0}")
    } else if value.abs() < 1.0 {
        format!("{value:.3}")
    } else {
        format!("{value:.2}")
    }
}
