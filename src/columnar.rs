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
//! Whitespace-delimited numeric tables: OSU micro-benchmark output and the
//! `.asc` simulation statistics files. `#`-prefixed lines are comments.
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::{Error, Result};

/// Contents of one columnar file.
#[derive(Debug, Clone, PartialEq)]
pub enum Columnar {
    /// A regular table, row-major, all rows of equal width.
    Table(Vec<Vec<f64>>),
    /// The file degenerated to a single scalar. This is a recognized case
    /// meaning "no data to plot", not an error.
    Scalar(f64),
}

impl Columnar {
    pub fn read(path: impl AsRef<Path>) -> Result<Columnar> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut rows: Vec<Vec<f64>> = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let row = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<std::result::Result<Vec<f64>, _>>()
                .map_err(|_| malformed(path, line))?;
            if let Some(first) = rows.first() {
                if row.len() != first.len() {
                    return Err(malformed(path, line));
                }
            }
            rows.push(row);
        }
        if rows.len() == 1 && rows[0].len() == 1 {
            return Ok(Columnar::Scalar(rows[0][0]));
        }
        Ok(Columnar::Table(rows))
    }

    /// Column `idx` of a regular table; `None` for the scalar case or when
    /// the table is too narrow.
    pub fn column(&self, idx: usize) -> Option<Vec<f64>> {
        match self {
            Columnar::Scalar(_) => None,
            Columnar::Table(rows) => rows
                .iter()
                .map(|row| row.get(idx).copied())
                .collect::<Option<Vec<f64>>>(),
        }
    }
}

fn malformed(path: &Path, line: &str) -> Error {
    Error::MalformedRow {
        path: PathBuf::from(path),
        line: line.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn read_osu_table() {
        let data = Columnar::read("./src/test/osu/archer2-osu-runs/archer2-nodes-1-osu_bw")
            .unwrap();
        let sizes = data.column(0).unwrap();
        let bandwidth = data.column(1).unwrap();
        assert_eq!(sizes, vec![1.0, 2.0, 4.0]);
        assert_eq!(bandwidth, vec![0.5, 1.1, 2.3]);
    }

    #[test]
    fn scalar_file_is_no_data() {
        let data = Columnar::read("./src/test/osu/archer2-osu-runs/archer2-nodes-2-osu_bw")
            .unwrap();
        assert_eq!(data, Columnar::Scalar(42.0));
        assert_eq!(data.column(1), None);
    }

    #[test]
    fn malformed_row_is_fatal() {
        let err = Columnar::read("./src/test/osu/malformed").unwrap_err();
        assert!(matches!(err, Error::MalformedRow { line, .. } if line.contains("oops")));
    }

    #[test]
    fn three_column_statistics() {
        let data = Columnar::read("./src/test/osu/stats.asc").unwrap();
        assert_eq!(data.column(2).unwrap(), vec![75.0, 50.0]);
    }
}
