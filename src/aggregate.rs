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
//! Per-node-count summary statistics over the repeated-run tables of one
//! run group, and the derived strong-scaling efficiency transform.
use std::collections::BTreeMap;

use statrs::statistics::Statistics;

use crate::{
    catalog::{Catalog, RunGroup},
    error::{Error, Result},
    table::{DataTable, ValueKind},
};

/// Reduction of the repeated runs at one node count to two scalars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum_macros::EnumString)]
pub enum Measure {
    /// Population mean and standard deviation.
    #[strum(serialize = "mean-std")]
    MeanStd,
    /// Smallest and largest observed value.
    #[strum(serialize = "min-max")]
    MinMax,
}

/// How many of the most recent runs to aggregate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunSelection {
    All,
    Last(usize),
}

impl RunSelection {
    /// Command-line convention: any value below one selects all runs.
    pub fn from_flag(nruns: i64) -> RunSelection {
        if nruns < 1 {
            RunSelection::All
        } else {
            RunSelection::Last(nruns as usize)
        }
    }
}

/// Aggregated data of one run group: two per-series sequences of summary
/// values, index-aligned with the group's node-count sequence.
#[derive(Debug, Clone, Default)]
pub struct GroupData {
    /// Mean (or minimum) per node count, keyed by series name.
    pub primary: BTreeMap<String, Vec<f64>>,
    /// Standard deviation (or maximum) per node count.
    pub secondary: BTreeMap<String, Vec<f64>>,
}

/// Loads the per-node-count tables of `group` and reduces every requested
/// series with `measure`. Missing series and run-count shortfalls are fatal.
pub fn collect(
    group: &RunGroup,
    suffix: &str,
    series: &[String],
    kind: ValueKind,
    measure: Measure,
    runs: RunSelection,
) -> Result<GroupData> {
    let mut data = GroupData::default();
    for name in series {
        data.primary.insert(name.clone(), Vec::with_capacity(group.nodes.len()));
        data.secondary.insert(name.clone(), Vec::with_capacity(group.nodes.len()));
    }

    for &node in &group.nodes {
        let table = DataTable::read(group.data_file(node, suffix), kind)?;
        // verify the complete series list before using any value
        for name in series {
            table.column(name)?;
        }
        for name in series {
            let values = recent(table.column(name)?, runs)?;
            let (first, second) = match measure {
                Measure::MeanStd => (values.iter().mean(), values.iter().population_std_dev()),
                Measure::MinMax => (
                    Statistics::min(values.iter()),
                    Statistics::max(values.iter()),
                ),
            };
            data.primary.get_mut(name).expect("series preallocated").push(first);
            data.secondary.get_mut(name).expect("series preallocated").push(second);
        }
    }
    Ok(data)
}

/// Timing aggregation: floating-point values, population mean and standard
/// deviation.
pub fn timings(
    catalog: &Catalog,
    group: &RunGroup,
    series: &[String],
    runs: RunSelection,
) -> Result<GroupData> {
    collect(
        group,
        catalog.timing_suffix(),
        series,
        ValueKind::Float,
        Measure::MeanStd,
        runs,
    )
}

/// Call-count aggregation: integer values, min/max over all runs.
pub fn comm_stats(catalog: &Catalog, group: &RunGroup, series: &[String]) -> Result<GroupData> {
    collect(
        group,
        catalog.ncalls_suffix(),
        series,
        ValueKind::Int,
        Measure::MinMax,
        RunSelection::All,
    )
}

/// Strong-scaling parallel efficiency over an ascending node sequence:
/// `S(p) = T(1) / T(p)`, `E(p) = S(p) / p`, with the first node count as
/// the baseline.
pub fn strong_efficiency(nodes: &[u32], times: &[f64]) -> Vec<f64> {
    assert_eq!(nodes.len(), times.len());
    let Some((&n0, &t0)) = nodes.first().zip(times.first()) else {
        return Vec::new();
    };
    nodes
        .iter()
        .zip(times)
        .map(|(&n, &t)| (t0 / t) / (f64::from(n) / f64::from(n0)))
        .collect()
}

fn recent(values: &[f64], runs: RunSelection) -> Result<&[f64]> {
    match runs {
        RunSelection::All => Ok(values),
        RunSelection::Last(n) => {
            if n > values.len() {
                return Err(Error::NotEnoughRuns {
                    requested: n,
                    available: values.len(),
                });
            }
            Ok(&values[values.len() - n..])
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::{CommMethod, ConfigKey, GridShape};

    fn fixture_group() -> RunGroup {
        RunGroup {
            key: ConfigKey {
                machine: "archer2".to_string(),
                compiler: "cray".to_string(),
                comm: CommMethod::P2p,
                test_case: "random".to_string(),
                grid: GridShape {
                    nx: 32,
                    ny: 32,
                    nz: 32,
                },
            },
            dir: "./src/test/agg".into(),
            nodes: vec![1, 2, 4],
        }
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn mean_std_over_node_sequence() {
        let series = vec!["parcel merge (total)".to_string()];
        let data = collect(
            &fixture_group(),
            "-timings.csv",
            &series,
            ValueKind::Float,
            Measure::MeanStd,
            RunSelection::All,
        )
        .unwrap();
        assert_close(&data.primary["parcel merge (total)"], &[15.0, 15.0, 15.0]);
        assert_close(&data.secondary["parcel merge (total)"], &[5.0, 5.0, 5.0]);
    }

    #[test]
    fn min_max_over_call_counts() {
        let series = vec!["MPI P2P put".to_string(), "MPI P2P get".to_string()];
        let data = collect(
            &fixture_group(),
            "-ncalls.csv",
            &series,
            ValueKind::Int,
            Measure::MinMax,
            RunSelection::All,
        )
        .unwrap();
        assert_close(&data.primary["MPI P2P put"], &[100.0, 100.0, 100.0]);
        assert_close(&data.secondary["MPI P2P put"], &[200.0, 200.0, 200.0]);
        assert_close(&data.primary["MPI P2P get"], &[7.0, 7.0, 7.0]);
        assert_close(&data.secondary["MPI P2P get"], &[9.0, 9.0, 9.0]);
    }

    #[test]
    fn recent_runs_cap() {
        // only the last row contributes, so the deviation collapses to zero
        let series = vec!["parcel merge (total)".to_string()];
        let data = collect(
            &fixture_group(),
            "-timings.csv",
            &series,
            ValueKind::Float,
            Measure::MeanStd,
            RunSelection::Last(1),
        )
        .unwrap();
        assert_close(&data.primary["parcel merge (total)"], &[20.0, 20.0, 20.0]);
        assert_close(&data.secondary["parcel merge (total)"], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn run_count_shortfall_is_fatal() {
        let series = vec!["parcel merge (total)".to_string()];
        let err = collect(
            &fixture_group(),
            "-timings.csv",
            &series,
            ValueKind::Float,
            Measure::MeanStd,
            RunSelection::Last(3),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::NotEnoughRuns {
                requested: 3,
                available: 2
            }
        ));
    }

    #[test]
    fn missing_series_is_fatal() {
        let series = vec!["resolve graphs".to_string()];
        let err = collect(
            &fixture_group(),
            "-timings.csv",
            &series,
            ValueKind::Float,
            Measure::MeanStd,
            RunSelection::All,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingSeries { series, .. } if series == "resolve graphs"));
    }

    #[test]
    fn strong_efficiency_against_single_node_baseline() {
        let eff = strong_efficiency(&[1, 2, 4], &[100.0, 60.0, 40.0]);
        assert_close(&eff, &[1.0, 5.0 / 6.0, 0.625]);
    }

    #[test]
    fn run_selection_flag_convention() {
        assert_eq!(RunSelection::from_flag(-1), RunSelection::All);
        assert_eq!(RunSelection::from_flag(5), RunSelection::Last(5));
    }
}
