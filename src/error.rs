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
//! Error taxonomy shared by the catalog, the data loaders, and the figure
//! generators. Every variant is a fatal configuration or data error; the
//! binaries report it once and exit non-zero.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("path {0:?} does not exist")]
    MissingDirectory(PathBuf),
    #[error("data '{series}' not in data set {path:?}")]
    MissingSeries { series: String, path: PathBuf },
    #[error("only {available} runs available, but {requested} were requested")]
    NotEnoughRuns { requested: usize, available: usize },
    #[error("malformed grid token '{0}'")]
    MalformedGrid(String),
    #[error("malformed node count '{0}'")]
    MalformedNodeCount(String),
    #[error("malformed tasks-per-node value '{value}' in {path:?}")]
    MalformedTasksPerNode { value: String, path: PathBuf },
    #[error("no communication method called '{0}'")]
    UnknownCommMethod(String),
    #[error("not enough {what}: {needed} configurations discovered, but only {available} available")]
    NotEnoughSymbols {
        what: &'static str,
        needed: usize,
        available: usize,
    },
    #[error("malformed numeric row in {path:?}: '{line}'")]
    MalformedRow { path: PathBuf, line: String },
    #[error("invalid value '{value}' for column '{series}' in {path:?}")]
    InvalidValue {
        series: String,
        value: String,
        path: PathBuf,
    },
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
