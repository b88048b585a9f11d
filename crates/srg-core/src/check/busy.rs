//! Busy report for a snap that cannot be refreshed yet.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use srg_common::ProcessId;
use std::fmt;

/// A snap has apps or hooks with live processes.
///
/// Names and PIDs are sorted, and PIDs are deduplicated, so two reports for
/// the same state compare and print identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusySnapError {
    snap_name: String,
    busy_apps: Vec<String>,
    busy_hooks: Vec<String>,
    pids: Vec<ProcessId>,
}

impl BusySnapError {
    pub fn new(
        snap_name: impl Into<String>,
        mut busy_apps: Vec<String>,
        mut busy_hooks: Vec<String>,
        mut pids: Vec<ProcessId>,
    ) -> Self {
        busy_apps.sort();
        busy_hooks.sort();
        pids.sort_unstable();
        pids.dedup();
        Self {
            snap_name: snap_name.into(),
            busy_apps,
            busy_hooks,
            pids,
        }
    }

    pub fn snap_name(&self) -> &str {
        &self.snap_name
    }

    pub fn busy_apps(&self) -> &[String] {
        &self.busy_apps
    }

    pub fn busy_hooks(&self) -> &[String] {
        &self.busy_hooks
    }

    /// Every PID that blocks the refresh, ascending.
    pub fn pids(&self) -> &[ProcessId] {
        &self.pids
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BusySnapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let apps = self.busy_apps.join(", ");
        let hooks = self.busy_hooks.join(", ");
        match (self.busy_apps.is_empty(), self.busy_hooks.is_empty()) {
            (false, false) => write!(
                f,
                "snap {:?} has running apps ({apps}) and hooks ({hooks})",
                self.snap_name
            ),
            (false, true) => write!(f, "snap {:?} has running apps ({apps})", self.snap_name),
            (true, false) => write!(f, "snap {:?} has running hooks ({hooks})", self.snap_name),
            (true, true) => write!(f, "snap {:?} has running apps or hooks", self.snap_name),
        }
    }
}

impl std::error::Error for BusySnapError {}

impl Serialize for BusySnapError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BusySnapError", 5)?;
        state.serialize_field("snap", &self.snap_name)?;
        state.serialize_field("apps", &self.busy_apps)?;
        state.serialize_field("hooks", &self.busy_hooks)?;
        state.serialize_field("pids", &self.pids)?;
        state.serialize_field("message", &self.message())?;
        state.end()
    }
}
