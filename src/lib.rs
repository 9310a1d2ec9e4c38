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
//! Library for cataloguing and analysing parcel-merge MPI benchmark
//! measurements, and for generating the comparison figures.
pub mod aggregate;
pub mod catalog;
pub mod columnar;
pub mod error;
pub mod pattern;
pub mod render;
pub mod table;

pub mod prelude {
    pub use super::{
        aggregate::{strong_efficiency, GroupData, Measure, RunSelection},
        catalog::{Catalog, CommMethod, ConfigKey, GridShape, GroupQuery, MachineEntry, RunGroup},
        columnar::Columnar,
        error::{Error, Result},
        pattern::FilePattern,
        render::{LabelMode, MarkerKind, Palette, RenderConfig},
        table::{DataTable, ValueKind},
    };
}
