//! "Nothing running" checks run before and during a snap refresh.
//!
//! Two call sites use the same engine with different policies:
//! - Soft check: early and advisory. Services are ignored because they will
//!   be stopped by the refresh itself.
//! - Hard check: late and authoritative, run after services were stopped and
//!   new launches were barred. Only services that endure refreshes are ignored.
//!
//! Hooks are never exempt. The snap lock is held while the census is taken
//! and released on every return path.

mod busy;

pub use busy::BusySnapError;

use crate::collect::pids::{CensusError, ProcessCensus};
use crate::lock::{LockDir, LockError};
use crate::logging::event_names;
use serde::{Deserialize, Serialize};
use srg_common::{AppInfo, HookInfo, ProcessId, SnapInfo};
use thiserror::Error;
use tracing::{debug, info};

/// Which units may keep running during a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckPolicy {
    Soft,
    Hard,
}

impl CheckPolicy {
    /// Whether an app's processes are ignored under this policy.
    pub fn app_may_run(self, app: &AppInfo) -> bool {
        match self {
            CheckPolicy::Soft => app.is_service(),
            CheckPolicy::Hard => app.endures_refresh(),
        }
    }

    pub fn hook_may_run(self, _hook: &HookInfo) -> bool {
        false
    }
}

impl std::fmt::Display for CheckPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckPolicy::Soft => write!(f, "soft"),
            CheckPolicy::Hard => write!(f, "hard"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Busy(BusySnapError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Census(#[from] CensusError),
}

impl CheckError {
    /// The busy report, if the check found running processes.
    pub fn busy(&self) -> Option<&BusySnapError> {
        match self {
            CheckError::Busy(busy) => Some(busy),
            _ => None,
        }
    }
}

/// Runs refresh checks against a process census under the snap lock.
#[derive(Debug, Clone)]
pub struct RefreshChecker<C> {
    census: C,
    locks: LockDir,
}

impl<C: ProcessCensus> RefreshChecker<C> {
    pub fn new(census: C, locks: LockDir) -> Self {
        Self { census, locks }
    }

    pub fn soft_check(&self, info: &SnapInfo) -> Result<(), CheckError> {
        self.check(info, CheckPolicy::Soft)
    }

    pub fn hard_check(&self, info: &SnapInfo) -> Result<(), CheckError> {
        self.check(info, CheckPolicy::Hard)
    }

    pub fn check(&self, info: &SnapInfo, policy: CheckPolicy) -> Result<(), CheckError> {
        debug!(event = event_names::CHECK_STARTED, snap = %info.name, %policy, "refresh check started");
        let _lock = self.locks.lock(&info.name)?;

        let mut busy_apps = Vec::new();
        let mut busy_hooks = Vec::new();
        let mut pids: Vec<ProcessId> = Vec::new();

        for (name, app) in &info.apps {
            if policy.app_may_run(app) {
                debug!(event = event_names::CHECK_UNIT_EXEMPT, snap = %info.name, app = %name, %policy, "app exempt");
                continue;
            }
            let found = self.census.pids_of(&info.app_security_tag(name))?;
            if !found.is_empty() {
                debug!(event = event_names::CHECK_UNIT_BUSY, snap = %info.name, app = %name, count = found.len(), "app running");
                busy_apps.push(name.clone());
                pids.extend(found);
            }
        }

        for (name, hook) in &info.hooks {
            if policy.hook_may_run(hook) {
                continue;
            }
            let found = self.census.pids_of(&info.hook_security_tag(name))?;
            if !found.is_empty() {
                debug!(event = event_names::CHECK_UNIT_BUSY, snap = %info.name, hook = %name, count = found.len(), "hook running");
                busy_hooks.push(name.clone());
                pids.extend(found);
            }
        }

        if busy_apps.is_empty() && busy_hooks.is_empty() {
            info!(event = event_names::CHECK_CLEAR, snap = %info.name, %policy, "nothing running");
            return Ok(());
        }

        let busy = BusySnapError::new(info.name.clone(), busy_apps, busy_hooks, pids);
        info!(
            event = event_names::CHECK_BUSY,
            snap = %info.name,
            %policy,
            pids = ?busy.pids(),
            "{}",
            busy
        );
        Err(CheckError::Busy(busy))
    }
}
