use core::fmt;
use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const COL_IMPLEMENTATION: &str = "Implementation";
pub const COL_VERTICES: &str = "Vertices";
pub const COL_DENSITY: &str = "Density";
pub const COL_PARALLELISM: &str = "Threads/Processes";
pub const COL_TIME: &str = "Time(ms)";

/// Columns every results table must carry, matched by header name
pub const REQUIRED_COLUMNS: &[&str] = &[
    COL_IMPLEMENTATION,
    COL_VERTICES,
    COL_DENSITY,
    COL_PARALLELISM,
    COL_TIME,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Implementation {
    Serial,
    #[serde(rename = "OpenMP")]
    OpenMp,
    #[serde(rename = "MPI")]
    Mpi,
}

impl Implementation {
    pub const ALL: [Implementation; 3] = [Self::Serial, Self::OpenMp, Self::Mpi];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Serial => "Serial",
            Self::OpenMp => "OpenMP",
            Self::Mpi => "MPI",
        }
    }
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One measured run of the benchmark
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultRow {
    pub implementation: Implementation,
    pub vertices: u64,
    pub density: f64,
    /// Thread count for OpenMP, process count for MPI, always 1 for Serial
    pub parallelism: u32,
    pub time_ms: f64,
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Could not open results table {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed results table")]
    Csv(#[from] csv::Error),
    #[error("Missing column '{0}' in results table")]
    MissingColumn(&'static str),
    #[error("Could not convert row at line {line}")]
    Row {
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error("Invalid value for '{column}' at line {line}: {reason}")]
    Invalid {
        line: u64,
        column: &'static str,
        reason: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Implementation")]
    implementation: Implementation,
    #[serde(rename = "Vertices")]
    vertices: u64,
    #[serde(rename = "Density")]
    density: f64,
    #[serde(rename = "Threads/Processes")]
    parallelism: u32,
    #[serde(rename = "Time(ms)")]
    time_ms: f64,
    #[serde(rename = "Success", default)]
    success: Option<bool>,
}

impl RawRecord {
    fn validate(self, line: u64) -> Result<ResultRow, SchemaError> {
        let invalid = |column, reason: &str| SchemaError::Invalid {
            line,
            column,
            reason: reason.to_owned(),
        };

        if self.vertices == 0 {
            return Err(invalid(COL_VERTICES, "must be positive"));
        }
        if !self.density.is_finite() || self.density <= 0.0 || self.density > 1.0 {
            return Err(invalid(COL_DENSITY, "must be in (0, 1]"));
        }
        if self.parallelism == 0 {
            return Err(invalid(COL_PARALLELISM, "must be positive"));
        }
        if self.implementation == Implementation::Serial && self.parallelism != 1 {
            return Err(invalid(COL_PARALLELISM, "must be 1 for Serial runs"));
        }
        if !self.time_ms.is_finite() || self.time_ms <= 0.0 {
            return Err(invalid(COL_TIME, "must be a positive number"));
        }

        Ok(ResultRow {
            implementation: self.implementation,
            vertices: self.vertices,
            density: self.density,
            parallelism: self.parallelism,
            time_ms: self.time_ms,
        })
    }
}

pub fn load_results(path: &Path) -> Result<Vec<ResultRow>, SchemaError> {
    debug!("Loading results from {}", path.display());
    let file = File::open(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_results(file)
}

/// Parses a results table, preserving row order. Failed runs (`Success` = false) are dropped.
pub fn read_results<R: Read>(reader: R) -> Result<Vec<ResultRow>, SchemaError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(SchemaError::MissingColumn(column));
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let record: RawRecord = record
            .deserialize(Some(&headers))
            .map_err(|source| SchemaError::Row { line, source })?;
        if record.success == Some(false) {
            warn!(
                "Skipping failed {} run (vertices={}, density={}, parallelism={})",
                record.implementation, record.vertices, record.density, record.parallelism
            );
            continue;
        }
        rows.push(record.validate(line)?);
    }

    debug!("Loaded {} result rows", rows.len());
    Ok(rows)
}
