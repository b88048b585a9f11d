//! Process collection from kernel accounting.
//!
//! Submodules:
//! - `pids`: per-security-tag PID census from the pids cgroup hierarchy

pub mod pids;

pub use pids::{parse_pid, parse_pids, CensusError, PidsCgroup, ProcessCensus, StaticCensus};
