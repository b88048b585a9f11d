//! Per-security-tag PID census.
//!
//! Every confined snap process is placed in the pids cgroup named after its
//! security tag. The member list is read from:
//! - `<pids_cgroup_dir>/<security-tag>/cgroup.procs`
//!
//! A missing cgroup means nothing was ever started (or everything exited and
//! the group was removed), so it reads as an empty census.
//!
//! Parsing is fail-fast: one malformed line invalidates the whole read. A
//! skipped line would undercount the processes that block a refresh.

use srg_common::{ProcessId, SecurityTag};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::trace;

/// Name of the member list inside each cgroup directory.
const PROCS_FILE: &str = "cgroup.procs";

/// Errors while reading a census.
#[derive(Debug, Error)]
pub enum CensusError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse pid {text:?}")]
    Parse { text: String },
}

/// Source of live PIDs per security tag.
pub trait ProcessCensus {
    fn pids_of(&self, tag: &SecurityTag) -> Result<Vec<ProcessId>, CensusError>;
}

impl<T: ProcessCensus + ?Sized> ProcessCensus for &T {
    fn pids_of(&self, tag: &SecurityTag) -> Result<Vec<ProcessId>, CensusError> {
        (**self).pids_of(tag)
    }
}

/// Census backed by the pids cgroup hierarchy.
#[derive(Debug, Clone)]
pub struct PidsCgroup {
    root: PathBuf,
}

impl PidsCgroup {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the member list for a security tag.
    pub fn procs_path(&self, tag: &SecurityTag) -> PathBuf {
        self.root.join(tag.as_str()).join(PROCS_FILE)
    }
}

impl ProcessCensus for PidsCgroup {
    fn pids_of(&self, tag: &SecurityTag) -> Result<Vec<ProcessId>, CensusError> {
        let path = self.procs_path(tag);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                trace!(tag = %tag, "no pids cgroup");
                return Ok(Vec::new());
            }
            Err(source) => return Err(CensusError::Io { path, source }),
        };

        let pids = parse_pids(BufReader::new(file)).map_err(|err| match err {
            CensusError::Io { source, .. } => CensusError::Io {
                path: path.clone(),
                source,
            },
            other => other,
        })?;
        trace!(tag = %tag, count = pids.len(), "read pids cgroup");
        Ok(pids)
    }
}

/// In-memory census for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct StaticCensus {
    pids: HashMap<SecurityTag, Vec<ProcessId>>,
}

impl StaticCensus {
    pub fn with_pids(mut self, tag: SecurityTag, pids: &[u32]) -> Self {
        self.pids
            .entry(tag)
            .or_default()
            .extend(pids.iter().copied().map(ProcessId));
        self
    }
}

impl ProcessCensus for StaticCensus {
    fn pids_of(&self, tag: &SecurityTag) -> Result<Vec<ProcessId>, CensusError> {
        Ok(self.pids.get(tag).cloned().unwrap_or_default())
    }
}

/// Parse one line as a process identifier.
///
/// Zero and negative values are rejected along with non-numeric text.
pub fn parse_pid(text: &str) -> Result<ProcessId, CensusError> {
    match text.parse::<u32>() {
        Ok(pid) if pid > 0 => Ok(ProcessId(pid)),
        _ => Err(CensusError::Parse {
            text: text.to_string(),
        }),
    }
}

/// Parse a list of PIDs, one per line.
pub fn parse_pids(reader: impl BufRead) -> Result<Vec<ProcessId>, CensusError> {
    let mut pids = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|source| CensusError::Io {
            path: PathBuf::new(),
            source,
        })?;
        pids.push(parse_pid(&line)?);
    }
    Ok(pids)
}
