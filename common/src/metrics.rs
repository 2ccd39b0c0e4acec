use core::fmt;
use std::{
    collections::{HashMap, hash_map::Entry},
    hash::{Hash, Hasher},
    io::Write,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::result::{
    COL_DENSITY, COL_IMPLEMENTATION, COL_PARALLELISM, COL_TIME, COL_VERTICES, Implementation,
    ResultRow,
};

/// Identifies a problem instance independent of how it was executed
#[derive(Debug, Clone, Copy)]
pub struct BaselineKey {
    pub vertices: u64,
    pub density: f64,
}

impl BaselineKey {
    pub fn of(row: &ResultRow) -> Self {
        Self {
            vertices: row.vertices,
            density: row.density,
        }
    }
}

// Densities come straight from the parsed table, so bitwise equality is what we want
impl PartialEq for BaselineKey {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices && self.density.to_bits() == other.density.to_bits()
    }
}

impl Eq for BaselineKey {}

impl Hash for BaselineKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.vertices.hash(state);
        self.density.to_bits().hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineKind {
    /// The Serial run of an instance
    Serial,
    /// The single threaded OpenMP run of an instance
    OpenMpSingleThread,
}

impl fmt::Display for BaselineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => f.write_str("Serial"),
            Self::OpenMpSingleThread => f.write_str("OpenMP single thread"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DeriveError {
    #[error("Duplicate {kind} baseline for vertices={vertices}, density={density}")]
    DuplicateBaseline {
        kind: BaselineKind,
        vertices: u64,
        density: f64,
    },
    #[error(
        "No {kind} baseline for {implementation} run with vertices={vertices}, density={density}, parallelism={parallelism}"
    )]
    MissingBaseline {
        kind: BaselineKind,
        implementation: Implementation,
        vertices: u64,
        density: f64,
        parallelism: u32,
    },
}

/// What to do with a row whose baseline does not exist
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingBaselinePolicy {
    /// Fail the whole metric family
    #[default]
    Abort,
    /// Drop the row and log a warning
    Skip,
}

/// Precomputed [`BaselineKey`] to time lookup for one kind of baseline
#[derive(Debug, Clone)]
pub struct BaselineIndex {
    kind: BaselineKind,
    times: HashMap<BaselineKey, f64>,
}

impl BaselineIndex {
    pub fn serial(rows: &[ResultRow]) -> Result<Self, DeriveError> {
        Self::build(BaselineKind::Serial, rows, |row| {
            row.implementation == Implementation::Serial
        })
    }

    pub fn openmp_single_thread(rows: &[ResultRow]) -> Result<Self, DeriveError> {
        Self::build(BaselineKind::OpenMpSingleThread, rows, |row| {
            row.implementation == Implementation::OpenMp && row.parallelism == 1
        })
    }

    fn build(
        kind: BaselineKind,
        rows: &[ResultRow],
        is_baseline: impl Fn(&ResultRow) -> bool,
    ) -> Result<Self, DeriveError> {
        let mut times = HashMap::new();
        for row in rows.iter().filter(|row| is_baseline(row)) {
            match times.entry(BaselineKey::of(row)) {
                Entry::Occupied(_) => {
                    return Err(DeriveError::DuplicateBaseline {
                        kind,
                        vertices: row.vertices,
                        density: row.density,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(row.time_ms);
                }
            }
        }
        debug!("Built {kind} baseline index with {} entries", times.len());
        Ok(Self { kind, times })
    }

    pub fn get(&self, key: &BaselineKey) -> Option<f64> {
        self.times.get(key).copied()
    }

    /// Baseline time for the instance `row` ran on
    pub fn lookup(&self, row: &ResultRow) -> Result<f64, DeriveError> {
        self.get(&BaselineKey::of(row))
            .ok_or(DeriveError::MissingBaseline {
                kind: self.kind,
                implementation: row.implementation,
                vertices: row.vertices,
                density: row.density,
                parallelism: row.parallelism,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedupRow {
    pub row: ResultRow,
    pub speedup: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfficiencyRow {
    pub row: ResultRow,
    pub efficiency_pct: f64,
}

pub fn speedup(serial_time_ms: f64, row: &ResultRow) -> f64 {
    serial_time_ms / row.time_ms
}

pub fn efficiency_pct(single_thread_time_ms: f64, row: &ResultRow) -> f64 {
    single_thread_time_ms / (row.time_ms * row.parallelism as f64) * 100.0
}

fn derive_rows<T>(
    rows: &[ResultRow],
    index: &BaselineIndex,
    policy: MissingBaselinePolicy,
    include: impl Fn(&ResultRow) -> bool,
    make: impl Fn(f64, &ResultRow) -> T,
) -> Result<Vec<T>, DeriveError> {
    let mut derived = Vec::new();
    for row in rows.iter().filter(|row| include(row)) {
        match index.lookup(row) {
            Ok(baseline) => derived.push(make(baseline, row)),
            Err(err) => match policy {
                MissingBaselinePolicy::Abort => return Err(err),
                MissingBaselinePolicy::Skip => warn!("Skipping row: {err}"),
            },
        }
    }
    Ok(derived)
}

/// One [`SpeedupRow`] per non-Serial row, in table order
pub fn derive_speedup(
    rows: &[ResultRow],
    policy: MissingBaselinePolicy,
) -> Result<Vec<SpeedupRow>, DeriveError> {
    let index = BaselineIndex::serial(rows)?;
    derive_rows(
        rows,
        &index,
        policy,
        |row| row.implementation != Implementation::Serial,
        |baseline, row| SpeedupRow {
            row: *row,
            speedup: speedup(baseline, row),
        },
    )
}

/// One [`EfficiencyRow`] per OpenMP row, in table order
pub fn derive_efficiency(
    rows: &[ResultRow],
    policy: MissingBaselinePolicy,
) -> Result<Vec<EfficiencyRow>, DeriveError> {
    let index = BaselineIndex::openmp_single_thread(rows)?;
    derive_rows(
        rows,
        &index,
        policy,
        |row| row.implementation == Implementation::OpenMp,
        |baseline, row| EfficiencyRow {
            row: *row,
            efficiency_pct: efficiency_pct(baseline, row),
        },
    )
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DerivedTables {
    pub speedup: Vec<SpeedupRow>,
    pub efficiency: Vec<EfficiencyRow>,
}

impl DerivedTables {
    pub fn derive(rows: &[ResultRow], policy: MissingBaselinePolicy) -> Result<Self, DeriveError> {
        let speedup = derive_speedup(rows, policy)?;
        let efficiency = derive_efficiency(rows, policy)?;
        debug!(
            "Derived {} speedup and {} efficiency rows",
            speedup.len(),
            efficiency.len()
        );
        Ok(Self {
            speedup,
            efficiency,
        })
    }

    pub fn write_speedup<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        write_table(
            writer,
            "Speedup",
            self.speedup.iter().map(|x| (&x.row, x.speedup)),
        )
    }

    pub fn write_efficiency<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        write_table(
            writer,
            "Efficiency(%)",
            self.efficiency.iter().map(|x| (&x.row, x.efficiency_pct)),
        )
    }
}

fn write_table<'a, W: Write>(
    writer: W,
    metric: &str,
    rows: impl Iterator<Item = (&'a ResultRow, f64)>,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record([
        COL_IMPLEMENTATION,
        COL_VERTICES,
        COL_DENSITY,
        COL_PARALLELISM,
        COL_TIME,
        metric,
    ])?;
    for (row, value) in rows {
        writer.write_record([
            row.implementation.to_string(),
            row.vertices.to_string(),
            row.density.to_string(),
            row.parallelism.to_string(),
            row.time_ms.to_string(),
            format!("{value:.4}"),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn row(implementation: Implementation, vertices: u64, density: f64, parallelism: u32, time_ms: f64) -> ResultRow {
        ResultRow {
            implementation,
            vertices,
            density,
            parallelism,
            time_ms,
        }
    }

    fn sample_table() -> Vec<ResultRow> {
        use Implementation::*;
        vec![
            row(Serial, 1000, 0.3, 1, 500.0),
            row(Serial, 500, 0.1, 1, 240.0),
            row(OpenMp, 1000, 0.3, 1, 480.0),
            row(OpenMp, 1000, 0.3, 4, 150.0),
            row(OpenMp, 500, 0.1, 1, 200.0),
            row(OpenMp, 500, 0.1, 4, 60.0),
            row(Mpi, 1000, 0.3, 4, 170.0),
        ]
    }

    #[test]
    fn speedup_against_serial_baseline() {
        let rows = sample_table();
        let speedup = derive_speedup(&rows, MissingBaselinePolicy::Abort).unwrap();
        let openmp = speedup
            .iter()
            .find(|x| x.row == rows[3])
            .unwrap();
        assert!((openmp.speedup - 500.0 / 150.0).abs() < 1e-12);
        assert!((openmp.speedup - 3.333).abs() < 1e-3);
    }

    #[test]
    fn serial_rows_never_get_a_speedup() {
        let rows = sample_table();
        let speedup = derive_speedup(&rows, MissingBaselinePolicy::Abort).unwrap();
        assert_eq!(speedup.len(), 5);
        assert!(
            speedup
                .iter()
                .all(|x| x.row.implementation != Implementation::Serial)
        );
        // table order is preserved
        assert_eq!(speedup[0].row, rows[2]);
        assert_eq!(speedup[4].row, rows[6]);
    }

    #[test]
    fn efficiency_against_single_thread_openmp() {
        let rows = sample_table();
        let efficiency = derive_efficiency(&rows, MissingBaselinePolicy::Abort).unwrap();
        assert_eq!(efficiency.len(), 4);
        let four_threads = efficiency.iter().find(|x| x.row == rows[5]).unwrap();
        assert!((four_threads.efficiency_pct - 200.0 / (60.0 * 4.0) * 100.0).abs() < 1e-12);
        assert!((four_threads.efficiency_pct - 83.33).abs() < 1e-2);
    }

    #[test]
    fn single_thread_row_is_fully_efficient() {
        let rows = sample_table();
        let efficiency = derive_efficiency(&rows, MissingBaselinePolicy::Abort).unwrap();
        for x in efficiency.iter().filter(|x| x.row.parallelism == 1) {
            assert_eq!(x.efficiency_pct, 100.0);
        }
    }

    #[test]
    fn super_linear_efficiency_is_not_clamped() {
        let rows = vec![
            row(Implementation::OpenMp, 200, 0.5, 1, 100.0),
            row(Implementation::OpenMp, 200, 0.5, 2, 40.0),
        ];
        let efficiency = derive_efficiency(&rows, MissingBaselinePolicy::Abort).unwrap();
        assert_eq!(efficiency[1].efficiency_pct, 125.0);
    }

    #[test]
    fn missing_serial_baseline_aborts() {
        let mut rows = sample_table();
        rows.push(row(Implementation::Mpi, 9999, 0.9, 2, 10.0));
        let err = derive_speedup(&rows, MissingBaselinePolicy::Abort).unwrap_err();
        assert_eq!(
            err,
            DeriveError::MissingBaseline {
                kind: BaselineKind::Serial,
                implementation: Implementation::Mpi,
                vertices: 9999,
                density: 0.9,
                parallelism: 2,
            }
        );
    }

    #[test]
    fn lookup_without_serial_row_fails() {
        let index = BaselineIndex::serial(&sample_table()).unwrap();
        assert_eq!(index.kind, BaselineKind::Serial);
        assert_eq!(index.times.len(), 2);
        let unknown = row(Implementation::OpenMp, 9999, 0.9, 4, 1.0);
        assert!(matches!(
            index.lookup(&unknown),
            Err(DeriveError::MissingBaseline { vertices: 9999, .. })
        ));
        assert_eq!(
            index.get(&BaselineKey {
                vertices: 1000,
                density: 0.3
            }),
            Some(500.0)
        );
    }

    #[test]
    fn missing_baseline_is_skipped_when_asked() {
        let mut rows = sample_table();
        rows.push(row(Implementation::Mpi, 9999, 0.9, 2, 10.0));
        rows.push(row(Implementation::OpenMp, 9999, 0.9, 2, 10.0));
        let tables = DerivedTables::derive(&rows, MissingBaselinePolicy::Skip).unwrap();
        assert_eq!(tables.speedup.len(), 5);
        assert_eq!(tables.efficiency.len(), 4);
        assert!(tables.speedup.iter().all(|x| x.row.vertices != 9999));
    }

    #[test]
    fn missing_single_thread_baseline_aborts_efficiency() {
        let rows = vec![
            row(Implementation::Serial, 200, 0.1, 1, 100.0),
            row(Implementation::OpenMp, 200, 0.1, 2, 60.0),
        ];
        assert!(derive_speedup(&rows, MissingBaselinePolicy::Abort).is_ok());
        assert!(matches!(
            derive_efficiency(&rows, MissingBaselinePolicy::Abort),
            Err(DeriveError::MissingBaseline {
                kind: BaselineKind::OpenMpSingleThread,
                ..
            })
        ));
    }

    #[test]
    fn duplicate_baselines_are_rejected() {
        let mut rows = sample_table();
        rows.push(row(Implementation::Serial, 1000, 0.3, 1, 510.0));
        assert_eq!(
            BaselineIndex::serial(&rows).unwrap_err(),
            DeriveError::DuplicateBaseline {
                kind: BaselineKind::Serial,
                vertices: 1000,
                density: 0.3,
            }
        );
        // Duplicates are fatal regardless of the missing baseline policy
        assert!(DerivedTables::derive(&rows, MissingBaselinePolicy::Skip).is_err());

        let mut rows = sample_table();
        rows.push(row(Implementation::OpenMp, 500, 0.1, 1, 190.0));
        assert!(matches!(
            BaselineIndex::openmp_single_thread(&rows),
            Err(DeriveError::DuplicateBaseline {
                kind: BaselineKind::OpenMpSingleThread,
                ..
            })
        ));
    }

    #[test]
    fn writes_derived_tables_as_csv() {
        let tables = DerivedTables::derive(&sample_table(), MissingBaselinePolicy::Abort).unwrap();
        let mut out = Vec::new();
        tables.write_speedup(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Implementation,Vertices,Density,Threads/Processes,Time(ms),Speedup")
        );
        assert_eq!(lines.nth(1), Some("OpenMP,1000,0.3,4,150,3.3333"));

        let mut out = Vec::new();
        tables.write_efficiency(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Implementation,Vertices,Density,Threads/Processes,Time(ms),Efficiency(%)\n"));
        assert!(text.contains("OpenMP,500,0.1,4,60,83.3333"));
    }

    fn arb_table() -> impl Strategy<Value = Vec<ResultRow>> {
        let sizes = prop::sample::subsequence(vec![100u64, 200, 500, 1000], 1..=4);
        let densities = prop::sample::subsequence(vec![0.1f64, 0.3, 0.5], 1..=3);
        (sizes, densities, prop::collection::vec(0.1f64..10_000.0, 48)).prop_map(
            |(sizes, densities, times)| {
                let mut times = times.into_iter().cycle();
                let mut rows = Vec::new();
                for &vertices in &sizes {
                    for &density in &densities {
                        rows.push(row(Implementation::Serial, vertices, density, 1, times.next().unwrap()));
                        for threads in [1, 2, 4, 8] {
                            rows.push(row(Implementation::OpenMp, vertices, density, threads, times.next().unwrap()));
                        }
                        rows.push(row(Implementation::Mpi, vertices, density, 4, times.next().unwrap()));
                    }
                }
                rows
            },
        )
    }

    proptest! {
        #[test]
        fn derived_metrics_are_positive(rows in arb_table()) {
            let tables = DerivedTables::derive(&rows, MissingBaselinePolicy::Abort).unwrap();
            prop_assert!(tables.speedup.iter().all(|x| x.speedup > 0.0));
            prop_assert!(tables.efficiency.iter().all(|x| x.efficiency_pct > 0.0));
            prop_assert_eq!(
                tables.speedup.len(),
                rows.iter().filter(|x| x.implementation != Implementation::Serial).count()
            );
        }

        #[test]
        fn derivation_is_deterministic(rows in arb_table()) {
            let first = DerivedTables::derive(&rows, MissingBaselinePolicy::Abort).unwrap();
            let second = DerivedTables::derive(&rows, MissingBaselinePolicy::Abort).unwrap();
            for (a, b) in first.speedup.iter().zip(&second.speedup) {
                prop_assert_eq!(a.speedup.to_bits(), b.speedup.to_bits());
            }
            for (a, b) in first.efficiency.iter().zip(&second.efficiency) {
                prop_assert_eq!(a.efficiency_pct.to_bits(), b.efficiency_pct.to_bits());
            }
            prop_assert_eq!(first, second);
        }
    }
}
