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
//! Parser for the benchmark result naming convention
//! `<machine>-<compiler>-<comm>-<test case>-<grid token>-nodes-<N><suffix>`.
use regex::Regex;

use crate::{
    catalog::{CommMethod, GridShape},
    error::{Error, Result},
};

/// Suffix of the per-node-count timing tables.
pub fn timing_suffix(use_subcomm: bool) -> &'static str {
    if use_subcomm {
        "-subcomm-timings.csv"
    } else {
        "-timings.csv"
    }
}

/// Suffix of the per-node-count call-count tables.
pub fn ncalls_suffix(use_subcomm: bool) -> &'static str {
    if use_subcomm {
        "-subcomm-ncalls.csv"
    } else {
        "-ncalls.csv"
    }
}

/// Structured fields recovered from one benchmark result filename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedName {
    pub machine: String,
    pub compiler: String,
    pub comm: CommMethod,
    pub grid: GridShape,
    pub nodes: u32,
}

/// Compiled naming-convention pattern, parameterized by the test case and
/// the subcomm-variant suffix.
#[derive(Debug)]
pub struct FilePattern {
    re: Regex,
}

impl FilePattern {
    pub fn new(test_case: &str, use_subcomm: bool) -> FilePattern {
        let re = Regex::new(&format!(
            r"^(\w+)-(\w+)-(\w+)-{tc}-(nx-\d+-ny-\d+-nz-\d+)-nodes-(\d+){suffix}$",
            tc = regex::escape(test_case),
            suffix = regex::escape(timing_suffix(use_subcomm)),
        ))
        .expect("naming-convention pattern is well-formed");
        FilePattern { re }
    }

    /// Matches `fname` against the naming convention.
    ///
    /// Returns `Ok(None)` for filenames that do not match the outer pattern
    /// at all (submission scripts, sibling data files, unrelated artifacts).
    /// A filename that matches the outer pattern but fails a field parse is
    /// an error: partially malformed names must never be dropped silently.
    pub fn parse(&self, fname: &str) -> Result<Option<ParsedName>> {
        let Some(caps) = self.re.captures(fname) else {
            return Ok(None);
        };
        let comm = caps[3]
            .parse::<CommMethod>()
            .map_err(|_| Error::UnknownCommMethod(caps[3].to_string()))?;
        let grid = GridShape::parse_token(&caps[4])?;
        let nodes = caps[5]
            .parse::<u32>()
            .map_err(|_| Error::MalformedNodeCount(caps[5].to_string()))?;
        Ok(Some(ParsedName {
            machine: caps[1].to_string(),
            compiler: caps[2].to_string(),
            comm,
            grid,
            nodes,
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_well_formed_name() {
        let pattern = FilePattern::new("random", false);
        let parsed = pattern
            .parse("archer2-cray-p2p-random-nx-32-ny-32-nz-64-nodes-16-timings.csv")
            .unwrap()
            .unwrap();
        assert_eq!(
            parsed,
            ParsedName {
                machine: "archer2".to_string(),
                compiler: "cray".to_string(),
                comm: CommMethod::P2p,
                grid: GridShape {
                    nx: 32,
                    ny: 32,
                    nz: 64
                },
                nodes: 16,
            }
        );
    }

    #[test]
    fn parse_subcomm_variant() {
        let pattern = FilePattern::new("read-early", true);
        let parsed = pattern
            .parse("cirrus-gnu-shmem-read-early-nx-8-ny-8-nz-8-nodes-2-subcomm-timings.csv")
            .unwrap()
            .unwrap();
        assert_eq!(parsed.machine, "cirrus");
        assert_eq!(parsed.comm, CommMethod::Shmem);
        assert_eq!(parsed.nodes, 2);

        // the plain suffix must not match the subcomm pattern
        let plain = pattern
            .parse("cirrus-gnu-shmem-read-early-nx-8-ny-8-nz-8-nodes-2-timings.csv")
            .unwrap();
        assert!(plain.is_none());
    }

    #[test]
    fn irrelevant_names_report_no_match() {
        let pattern = FilePattern::new("random", false);
        for fname in [
            "archer2-submit.sh",
            "archer2-cray-p2p-random-nx-32-ny-32-nz-32-nodes-16-ncalls.csv",
            "archer2-cray-p2p-read-late-nx-32-ny-32-nz-32-nodes-16-timings.csv",
            "notes.txt",
            "archer2-cray-p2p-random-nx-32-ny-32-nz-32-nodes-16-timings.csv.bak",
        ] {
            assert!(pattern.parse(fname).unwrap().is_none(), "{fname}");
        }
    }

    #[test]
    fn unknown_comm_method_is_fatal() {
        let pattern = FilePattern::new("random", false);
        let err = pattern
            .parse("archer2-cray-gaspi-random-nx-8-ny-8-nz-8-nodes-1-timings.csv")
            .unwrap_err();
        assert!(matches!(err, Error::UnknownCommMethod(m) if m == "gaspi"));
    }

    #[test]
    fn node_count_overflow_is_fatal() {
        let pattern = FilePattern::new("random", false);
        let err = pattern
            .parse("archer2-cray-p2p-random-nx-8-ny-8-nz-8-nodes-99999999999-timings.csv")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedNodeCount(_)));
    }
}
