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
//! The benchmark configuration catalog: a grouped, deduplicated, node-sorted
//! view of a directory tree of benchmark result files.
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    fs,
    path::{Path, PathBuf},
};

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::{Error, Result},
    pattern::{ncalls_suffix, timing_suffix, FilePattern},
};

/// Communication methods the benchmark runs with.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum_macros::EnumString,
    clap::ValueEnum,
)]
#[strum(serialize_all = "lowercase")]
pub enum CommMethod {
    P2p,
    Rma,
    Shmem,
}

impl CommMethod {
    /// Panel title used in the multi-panel figures.
    pub fn title(&self) -> &'static str {
        match self {
            CommMethod::P2p => "MPI P2P + MPI P2P",
            CommMethod::Rma => "MPI P2P + MPI-3 RMA",
            CommMethod::Shmem => "MPI P2P + SHMEM",
        }
    }

    /// Short label of the one-sided method itself.
    pub fn method_label(&self) -> &'static str {
        match self {
            CommMethod::P2p => "MPI-3 P2P",
            CommMethod::Rma => "MPI-3 RMA",
            CommMethod::Shmem => "SHMEM",
        }
    }

    /// The call-count columns recorded for this method.
    pub fn stat_series(&self) -> [&'static str; 2] {
        match self {
            CommMethod::P2p => ["MPI P2P put", "MPI P2P get"],
            CommMethod::Rma => ["MPI RMA put", "MPI RMA get"],
            CommMethod::Shmem => ["SHMEM put", "SHMEM get"],
        }
    }
}

lazy_static! {
    static ref GRID_TOKEN: Regex = Regex::new(r"^nx-(\d+)-ny-(\d+)-nz-(\d+)$").unwrap();
    static ref NTASKS_PER_NODE: Regex = Regex::new(r"--ntasks-per-node=(\d+)").unwrap();
    static ref TASKS_PER_NODE: Regex = Regex::new(r"--tasks-per-node=(\d+)").unwrap();
}

/// A grid configuration. The derived order is lexicographic on the integer
/// triple, so grids sort numerically and never by token string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridShape {
    pub nx: u32,
    pub ny: u32,
    pub nz: u32,
}

impl GridShape {
    /// Parses the `nx-<int>-ny-<int>-nz-<int>` grid token.
    pub fn parse_token(token: &str) -> Result<GridShape> {
        let caps = GRID_TOKEN
            .captures(token)
            .ok_or_else(|| Error::MalformedGrid(token.to_string()))?;
        let field = |i: usize| {
            caps[i]
                .parse::<u32>()
                .map_err(|_| Error::MalformedGrid(token.to_string()))
        };
        Ok(GridShape {
            nx: field(1)?,
            ny: field(2)?,
            nz: field(3)?,
        })
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nx-{}-ny-{}-nz-{}", self.nx, self.ny, self.nz)
    }
}

/// Composite identifier of one benchmark configuration. Immutable once
/// parsed; the catalog is keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigKey {
    pub machine: String,
    pub compiler: String,
    pub comm: CommMethod,
    pub test_case: String,
    pub grid: GridShape,
}

impl ConfigKey {
    /// Base filename template; append the node count and a data suffix to
    /// obtain the per-node-count file name.
    pub fn basename(&self) -> String {
        format!("{self}-nodes-")
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.machine, self.compiler, self.comm, self.test_case, self.grid
        )
    }
}

/// One configuration's worth of collected runs.
#[derive(Debug, Clone)]
pub struct RunGroup {
    pub key: ConfigKey,
    /// Directory the group was first discovered in.
    pub dir: PathBuf,
    /// Node counts with data files; strictly ascending and duplicate-free
    /// once the scan has finished.
    pub nodes: Vec<u32>,
}

impl RunGroup {
    /// Path of the data file for one node count.
    pub fn data_file(&self, node: u32, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{node}{suffix}", self.key.basename()))
    }
}

/// Everything discovered about one machine.
#[derive(Debug, Clone, Default)]
pub struct MachineEntry {
    pub compilers: BTreeSet<String>,
    pub comms: BTreeSet<CommMethod>,
    pub grids: BTreeSet<GridShape>,
    pub groups: BTreeMap<ConfigKey, RunGroup>,
    /// Parsed from a matching submission script, when one exists.
    pub tasks_per_node: Option<u32>,
}

impl MachineEntry {
    /// Grid shapes in ascending numeric order.
    pub fn sorted_grids(&self) -> Vec<GridShape> {
        self.grids.iter().copied().collect()
    }
}

/// Exact-match group lookup. Replaces the substring tag matching of earlier
/// tooling, where one grid token could accidentally be a prefix of another.
#[derive(Clone, Debug)]
pub struct GroupQuery {
    pub machine: String,
    pub compiler: String,
    pub comm: CommMethod,
    pub grid: Option<GridShape>,
}

/// The full configuration catalog of one scan. Built once, read-only
/// afterwards; identical inputs produce an identical catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub test_case: String,
    pub use_subcomm: bool,
    pub machines: BTreeMap<String, MachineEntry>,
}

impl Catalog {
    /// Scans `<root>/<test case>/<suite>` for every requested compiler suite
    /// and accumulates all matching benchmark files into the catalog. A
    /// missing suite directory is fatal: the caller asked to analyze data
    /// that was never produced.
    pub fn scan(
        root: impl AsRef<Path>,
        compiler_suites: &[String],
        test_case: &str,
        use_subcomm: bool,
    ) -> Result<Catalog> {
        let root = root.as_ref();
        let pattern = FilePattern::new(test_case, use_subcomm);
        let mut machines: BTreeMap<String, MachineEntry> = BTreeMap::new();
        let mut submit_scripts: Vec<PathBuf> = Vec::new();

        for suite in compiler_suites {
            let dir = root.join(test_case).join(suite);
            if !dir.exists() {
                return Err(Error::MissingDirectory(dir));
            }

            // sorted entries keep the catalog independent of readdir order
            let mut entries: Vec<String> = fs::read_dir(&dir)?
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| entry.file_name().into_string().ok())
                .collect();
            entries.sort();

            for fname in entries {
                if let Some(parsed) = pattern.parse(&fname)? {
                    let entry = machines.entry(parsed.machine.clone()).or_default();
                    entry.compilers.insert(parsed.compiler.clone());
                    entry.comms.insert(parsed.comm);
                    entry.grids.insert(parsed.grid);

                    let key = ConfigKey {
                        machine: parsed.machine,
                        compiler: parsed.compiler,
                        comm: parsed.comm,
                        test_case: test_case.to_string(),
                        grid: parsed.grid,
                    };
                    entry
                        .groups
                        .entry(key.clone())
                        .or_insert_with(|| RunGroup {
                            key,
                            dir: dir.clone(),
                            nodes: Vec::new(),
                        })
                        .nodes
                        .push(parsed.nodes);
                } else if fname.contains("submit") {
                    submit_scripts.push(dir.join(fname));
                }
            }
        }

        // attribute submission scripts only after all machines are known, so
        // the result does not depend on the order directories were listed in
        for script in &submit_scripts {
            let Some(tasks) = tasks_per_node(script)? else {
                continue;
            };
            let fname = script
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            for (machine, entry) in machines.iter_mut() {
                // first match wins per machine
                if fname.contains(machine.as_str()) && entry.tasks_per_node.is_none() {
                    entry.tasks_per_node = Some(tasks);
                }
            }
        }

        for entry in machines.values_mut() {
            for group in entry.groups.values_mut() {
                group.nodes.sort_unstable();
                group.nodes.dedup();
            }
        }

        let catalog = Catalog {
            test_case: test_case.to_string(),
            use_subcomm,
            machines,
        };
        catalog.log_summary();
        Ok(catalog)
    }

    pub fn timing_suffix(&self) -> &'static str {
        timing_suffix(self.use_subcomm)
    }

    pub fn ncalls_suffix(&self) -> &'static str {
        ncalls_suffix(self.use_subcomm)
    }

    /// All groups matching the query exactly, in ascending grid order.
    pub fn groups(&self, query: &GroupQuery) -> Vec<&RunGroup> {
        let Some(entry) = self.machines.get(&query.machine) else {
            return Vec::new();
        };
        // the group map is keyed by ConfigKey, so values already come out
        // ordered by (compiler, comm, grid)
        entry
            .groups
            .values()
            .filter(|group| {
                group.key.compiler == query.compiler
                    && group.key.comm == query.comm
                    && query.grid.map_or(true, |grid| group.key.grid == grid)
            })
            .collect()
    }

    /// Diagnostic summary of the discovered configuration space.
    fn log_summary(&self) {
        log::info!(
            "Found {} different machines with the following configurations:",
            self.machines.len()
        );
        for (machine, entry) in &self.machines {
            let list = |items: Vec<String>| items.join(", ");
            log::info!("* {machine}:");
            log::info!(
                "    {} compiler(s): {}",
                entry.compilers.len(),
                list(entry.compilers.iter().cloned().collect())
            );
            log::info!(
                "    {} comm method(s): {}",
                entry.comms.len(),
                list(entry.comms.iter().map(|c| c.to_string()).collect())
            );
            log::info!(
                "    {} grid configuration(s): {}",
                entry.grids.len(),
                list(entry.grids.iter().map(|g| g.to_string()).collect())
            );
            match entry.tasks_per_node {
                Some(tasks) => log::info!("    number of tasks per node: {tasks}"),
                None => log::info!("    number of tasks per node: unknown"),
            }
        }
    }
}

/// Extracts the tasks-per-node value from a submission script, trying the
/// two flag spellings in order. `None` when the script mentions neither.
fn tasks_per_node(path: &Path) -> Result<Option<u32>> {
    let content = fs::read_to_string(path)?;
    for line in content.lines() {
        let caps = NTASKS_PER_NODE
            .captures(line)
            .or_else(|| TASKS_PER_NODE.captures(line));
        if let Some(caps) = caps {
            let tasks = caps[1]
                .parse::<u32>()
                .map_err(|_| Error::MalformedTasksPerNode {
                    value: caps[1].to_string(),
                    path: path.to_path_buf(),
                })?;
            return Ok(Some(tasks));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod test {
    use super::*;

    const SCAN_ROOT: &str = "./src/test/scan";

    fn scan() -> Catalog {
        Catalog::scan(
            SCAN_ROOT,
            &["cray".to_string(), "gnu".to_string()],
            "random",
            false,
        )
        .unwrap()
    }

    #[test]
    fn comm_method_labels_round_trip() {
        assert_eq!("p2p".parse::<CommMethod>().unwrap(), CommMethod::P2p);
        assert_eq!("rma".parse::<CommMethod>().unwrap(), CommMethod::Rma);
        assert_eq!(CommMethod::Shmem.to_string(), "shmem");
        assert!("gaspi".parse::<CommMethod>().is_err());
    }

    #[test]
    fn grid_order_is_numeric() {
        let small = GridShape::parse_token("nx-8-ny-8-nz-8").unwrap();
        let large = GridShape::parse_token("nx-16-ny-16-nz-16").unwrap();
        assert!(small < large);
        assert_eq!(small.to_string(), "nx-8-ny-8-nz-8");
    }

    #[test]
    fn malformed_grid_token_is_fatal() {
        assert!(matches!(
            GridShape::parse_token("nx-8-ny-8"),
            Err(Error::MalformedGrid(_))
        ));
    }

    #[test]
    fn nodes_are_sorted_and_deduplicated() {
        // node 1 exists in both suite directories for the same group, so the
        // raw sequence holds a duplicate before the scan finishes
        let catalog = scan();
        let query = GroupQuery {
            machine: "archer2".to_string(),
            compiler: "cray".to_string(),
            comm: CommMethod::P2p,
            grid: Some(GridShape {
                nx: 32,
                ny: 32,
                nz: 32,
            }),
        };
        let groups = catalog.groups(&query);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].nodes, vec![1, 2, 4]);
    }

    #[test]
    fn missing_suite_directory_is_fatal() {
        let err = Catalog::scan(SCAN_ROOT, &["intel".to_string()], "random", false).unwrap_err();
        assert!(matches!(err, Error::MissingDirectory(_)));
    }

    #[test]
    fn tasks_per_node_both_spellings() {
        let catalog = scan();
        assert_eq!(catalog.machines["archer2"].tasks_per_node, Some(128));
        assert_eq!(catalog.machines["cirrus"].tasks_per_node, Some(36));
    }

    #[test]
    fn grids_listed_in_numeric_order() {
        let catalog = scan();
        let grids = catalog.machines["archer2"].sorted_grids();
        let sizes: Vec<u32> = grids.iter().map(|g| g.nx).collect();
        let mut sorted = sizes.clone();
        sorted.sort_unstable();
        assert_eq!(sizes, sorted);
    }

    #[test]
    fn exact_query_does_not_cross_configurations() {
        let catalog = scan();
        // rma groups exist for archer2-gnu; asking for cray-rma must be empty
        let query = GroupQuery {
            machine: "archer2".to_string(),
            compiler: "cray".to_string(),
            comm: CommMethod::Rma,
            grid: None,
        };
        assert!(catalog.groups(&query).is_empty());

        let query = GroupQuery {
            machine: "archer2".to_string(),
            compiler: "gnu".to_string(),
            comm: CommMethod::Rma,
            grid: None,
        };
        let groups = catalog.groups(&query);
        assert_eq!(groups.len(), 2);
        // ascending grid order
        assert!(groups[0].key.grid < groups[1].key.grid);
    }

    #[test]
    fn rescanning_is_idempotent() {
        let a = scan();
        let b = scan();
        assert_eq!(a.machines.len(), b.machines.len());
        for (machine, entry) in &a.machines {
            let other = &b.machines[machine];
            assert_eq!(entry.compilers, other.compilers);
            assert_eq!(entry.grids, other.grids);
            assert_eq!(
                entry.groups.keys().collect::<Vec<_>>(),
                other.groups.keys().collect::<Vec<_>>()
            );
        }
    }
}
