// PARCELPLOT: Scaling Analysis and Figure Generation for Parcel-Merge MPI Benchmarks
// Copyright (C) 2024-2025 The parcelplot developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Row-oriented CSV tables with named columns, one row per repeated run.
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// How the cell values of a table are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// Timings: any floating-point value.
    Float,
    /// Call counts: must parse as integers.
    Int,
}

/// A fully loaded data table, stored column-major.
#[derive(Debug, Clone)]
pub struct DataTable {
    path: PathBuf,
    headers: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl DataTable {
    pub fn read(path: impl AsRef<Path>, kind: ValueKind) -> Result<DataTable> {
        let path = path.as_ref().to_path_buf();
        let mut reader = csv::Reader::from_path(&path)?;
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|header| header.trim().to_string())
            .collect();
        let mut columns = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            for (idx, field) in record.iter().enumerate().take(headers.len()) {
                let value =
                    parse_value(field.trim(), kind).ok_or_else(|| Error::InvalidValue {
                        series: headers[idx].clone(),
                        value: field.to_string(),
                        path: path.clone(),
                    })?;
                columns[idx].push(value);
            }
        }
        Ok(DataTable {
            path,
            headers,
            columns,
        })
    }

    /// Number of repeated runs (rows) in the table.
    pub fn num_runs(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// All runs of the named column. A request for an absent series is a
    /// fatal configuration error naming the series.
    pub fn column(&self, series: &str) -> Result<&[f64]> {
        let idx = self
            .headers
            .iter()
            .position(|header| header == series)
            .ok_or_else(|| Error::MissingSeries {
                series: series.to_string(),
                path: self.path.clone(),
            })?;
        Ok(&self.columns[idx])
    }
}

fn parse_value(field: &str, kind: ValueKind) -> Option<f64> {
    match kind {
        ValueKind::Float => field.parse::<f64>().ok(),
        ValueKind::Int => field.parse::<i64>().ok().map(|value| value as f64),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn load_timing_table() {
        let table = DataTable::read(
            "./src/test/agg/archer2-cray-p2p-random-nx-32-ny-32-nz-32-nodes-1-timings.csv",
            ValueKind::Float,
        )
        .unwrap();
        assert_eq!(table.num_runs(), 2);
        assert_eq!(table.column("parcel merge (total)").unwrap(), &[10.0, 20.0]);
        assert_eq!(table.column("find nearest").unwrap(), &[1.0, 3.0]);
    }

    #[test]
    fn missing_series_names_the_series() {
        let table = DataTable::read(
            "./src/test/agg/archer2-cray-p2p-random-nx-32-ny-32-nz-32-nodes-1-timings.csv",
            ValueKind::Float,
        )
        .unwrap();
        let err = table.column("build graphs").unwrap_err();
        assert!(matches!(err, Error::MissingSeries { series, .. } if series == "build graphs"));
    }

    #[test]
    fn int_kind_rejects_fractional_values() {
        let err = DataTable::read("./src/test/agg/fractional-ncalls.csv", ValueKind::Int)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { value, .. } if value == "12.5"));
    }
}
