use std::collections::BTreeMap;

use common::{
    metrics::{EfficiencyRow, SpeedupRow},
    result::ResultRow,
    util::mean,
};
use itertools::Itertools;

/// Points ordered by x, ties kept in table order
pub fn sorted_points(points: impl IntoIterator<Item = (f64, f64)>) -> Vec<(f64, f64)> {
    points
        .into_iter()
        .sorted_by(|a, b| a.0.total_cmp(&b.0))
        .collect()
}

/// Something that carries the raw measurement it was derived from
pub trait HasRow {
    fn row(&self) -> &ResultRow;
}

impl HasRow for ResultRow {
    fn row(&self) -> &ResultRow {
        self
    }
}

impl HasRow for SpeedupRow {
    fn row(&self) -> &ResultRow {
        &self.row
    }
}

impl HasRow for EfficiencyRow {
    fn row(&self) -> &ResultRow {
        &self.row
    }
}

/// Parallelism against `value`, for the rows that pass `filter`, sorted by parallelism
pub fn parallelism_series<T: HasRow>(
    rows: &[T],
    filter: impl Fn(&ResultRow) -> bool,
    value: impl Fn(&T) -> f64,
) -> Vec<(f64, f64)> {
    sorted_points(
        rows.iter()
            .filter(|x| filter(x.row()))
            .map(|x| (x.row().parallelism as f64, value(x))),
    )
}

/// Mean of the values grouped by key, ordered by key
pub fn grouped_means<K: Ord>(items: impl IntoIterator<Item = (K, f64)>) -> Vec<(K, f64)> {
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for (key, value) in items {
        groups.entry(key).or_default().push(value);
    }
    groups
        .into_iter()
        .filter_map(|(key, values)| mean(&values).map(|m| (key, m)))
        .collect()
}

pub fn size_label(vertices: u64) -> String {
    format!("N={vertices}")
}
